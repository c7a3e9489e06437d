//! Zero-cost wrappers for safe indexing.

wrap_usize! {
    #[doc = "DAG node indices."]
    NodeIdx
    #[doc = "Range over DAG nodes."]
    range: NodeRange
    #[doc = "Set of DAG nodes."]
    set: NodeSet
    #[doc = "Hash map from DAG nodes to something."]
    hash map: NodeHMap
    #[doc = "Total map from DAG nodes to something."]
    map: NodeMap with iter: NodeMapIter
}

wrap_usize! {
    #[doc = "Trace indices, relative to a sample."]
    TrcIdx
    #[doc = "Range over traces."]
    range: TrcRange
    #[doc = "Set of traces."]
    set: TrcSet
    #[doc = "Hash map from traces to something."]
    hash map: TrcHMap
    #[doc = "Total map from traces to something."]
    map: TrcMap with iter: TrcMapIter
}

wrap_usize! {
    #[doc = "Atomic proposition indices."]
    PrpIdx
    #[doc = "Range over atomic propositions."]
    range: PrpRange
    #[doc = "Set of atomic propositions."]
    set: PrpSet
    #[doc = "Hash map from atomic propositions to something."]
    hash map: PrpHMap
    #[doc = "Total map from atomic propositions to something."]
    map: PrpMap with iter: PrpMapIter
}
