//! Sample tracers: the semantics of the DAG on the traces of a sample.
//!
//! For each node and trace, a tracer declares one variable per position for
//! the any-path valuation and one for the all-path valuation (a single one
//! in collapsed domains). The equations of an atom or of an operator are
//! asserted under the condition that the node is labeled with it and, for
//! operators, that the operands are its children.

use crate::{
    common::*,
    dag::{Dag, Label},
    domain::Domain,
    expr::{self, Expr},
    logic::Logic,
    ops::{equations, Operator, Values, Word},
    trace::Trace,
};

/// Semantics of the DAG on a sample.
pub struct Tracer<L: Logic> {
    /// Name of the sample, used in variable names.
    name: &'static str,
    /// True for the positive sample.
    positive: bool,
    /// Traces.
    traces: TrcMap<Trace<L::Field>>,
    /// Offset of each trace in the block of a node.
    offsets: TrcMap<usize>,
    /// Size of the block of a node: total number of letters.
    stride: usize,
    /// Any-path valuations, one block per node.
    any: Vec<Expr>,
    /// All-path valuations, empty in collapsed domains.
    all: Vec<Expr>,
    /// Encoding of each node.
    nodes: NodeMap<Encoding>,
}

impl<L: Logic> Tracer<L> {
    /// Constructor.
    pub fn new(name: &'static str, positive: bool, traces: Vec<Trace<L::Field>>) -> Self {
        let mut offsets = TrcMap::with_capacity(traces.len());
        let mut stride = 0;
        for trace in &traces {
            offsets.push(stride);
            stride += trace.size()
        }
        Tracer {
            name,
            positive,
            traces: traces.into(),
            offsets,
            stride,
            any: vec![],
            all: vec![],
            nodes: NodeMap::new(),
        }
    }

    /// Name of the sample.
    pub fn name(&self) -> &'static str {
        self.name
    }
    /// True for the positive sample.
    pub fn is_positive(&self) -> bool {
        self.positive
    }
    /// Traces.
    pub fn traces(&self) -> &TrcMap<Trace<L::Field>> {
        &self.traces
    }
    /// Number of traces.
    pub fn len(&self) -> usize {
        self.traces.len()
    }
    /// True if there are no traces.
    pub fn is_empty(&self) -> bool {
        self.traces.len() == 0
    }

    /// Name of a valuation variable.
    fn var_name(&self, trc: TrcIdx, node: NodeIdx, t: usize, any: bool) -> String {
        let suffix = if L::Dom::COLLAPSED {
            ""
        } else if any {
            "_any"
        } else {
            "_all"
        };
        format!("y_{}_{}_{}_{}{}", self.name, trc, node, t, suffix)
    }

    /// Valuations of a node on a trace.
    pub fn values(&self, node: NodeIdx, trc: TrcIdx) -> Values {
        let start = *node * self.stride + self.offsets[trc];
        let end = start + self.traces[trc].size();
        let any = &self.any[start..end];
        let all = if L::Dom::COLLAPSED {
            any
        } else {
            &self.all[start..end]
        };
        Values { any, all }
    }

    /// Word of a trace.
    fn word(&self, trc: TrcIdx, dag: &Dag) -> Word {
        let trace = &self.traces[trc];
        Word {
            size: trace.size(),
            rep: trace.rep,
            max_period: dag.max_period(),
        }
    }

    /// Encoding of a node.
    pub fn encoding(&self, node: NodeIdx) -> &Encoding {
        &self.nodes[node]
    }
    /// Encodings of all the nodes.
    pub fn encodings(&self) -> impl Iterator<Item = &Encoding> {
        self.nodes.iter()
    }

    /// Encodes the semantics of the next node of the DAG.
    pub fn grow(&mut self, logic: &L, dag: &Dag) -> Res<NodeIdx> {
        let node = self.nodes.next_index();
        if *node >= dag.len() {
            bail!("tracer cannot grow past the {} node(s) of the DAG", dag.len())
        }
        let mut enc = Encoding::new();

        for trc in self.traces.index_iter().map(|(trc, _)| trc).collect::<Vec<_>>() {
            for t in 0..self.traces[trc].size() {
                let any = self.var_name(trc, node, t, true);
                enc.declare(any.clone(), L::Dom::SORT);
                self.any.push(expr::var(any));
                if !L::Dom::COLLAPSED {
                    let all = self.var_name(trc, node, t, false);
                    enc.declare(all.clone(), L::Dom::SORT);
                    self.all.push(expr::var(all))
                }
            }
        }

        self.atom_equations(logic, dag, node, &mut enc)?;
        if *node > 0 {
            self.op_equations(dag, node, &mut enc)
        }

        log! { @debug
            "{} sample, node {}: {} declarations, {} assertions",
            self.name, node, enc.decls.len(), enc.asserts.len()
        }
        self.nodes.push(enc);
        Ok(node)
    }

    /// Atom case: the valuations are the ones of the atom on each letter.
    fn atom_equations(&self, logic: &L, dag: &Dag, node: NodeIdx, enc: &mut Encoding) -> Res<()> {
        for atom in PrpRange::zero_to(logic.atom_count()) {
            let label = dag.label_var(Label::Atom(atom), node);
            for (trc, trace) in self.traces.index_iter() {
                let vals = self.values(node, trc);
                let mut conj = Vec::with_capacity(2 * trace.size());
                for (t, letter) in trace.letters.iter().enumerate() {
                    let (any, all) = logic.atom(atom, letter)?;
                    conj.push(expr::eq(vals.any[t].clone(), any));
                    if !L::Dom::COLLAPSED {
                        conj.push(expr::eq(vals.all[t].clone(), all))
                    }
                }
                enc.assert(expr::implies(label.clone(), expr::and(conj)))
            }
        }
        Ok(())
    }

    /// Inductive case: operator equations for each choice of children.
    fn op_equations(&self, dag: &Dag, node: NodeIdx, enc: &mut Encoding) {
        let bounds = dag.bounds(node);
        for op in &Operator::ALL {
            let label = dag.label_var(Label::Op(*op), node);
            for (trc, _) in self.traces.index_iter() {
                let word = self.word(trc, dag);
                let vals = self.values(node, trc);
                for lft in NodeRange::zero_to(*node) {
                    let lft_var = Dag::left_var(node, lft);
                    if op.arity() == 1 {
                        let eqs = equations::<L::Dom>(
                            *op,
                            vals,
                            self.values(lft, trc),
                            None,
                            &word,
                            &bounds,
                        );
                        enc.assert(expr::implies(
                            expr::and(vec![label.clone(), lft_var.clone()]),
                            eqs,
                        ));
                        continue;
                    }
                    for rgt in NodeRange::zero_to(*node) {
                        let eqs = equations::<L::Dom>(
                            *op,
                            vals,
                            self.values(lft, trc),
                            Some(self.values(rgt, trc)),
                            &word,
                            &bounds,
                        );
                        enc.assert(expr::implies(
                            expr::and(vec![
                                label.clone(),
                                lft_var.clone(),
                                Dag::right_var(node, rgt),
                            ]),
                            eqs,
                        ))
                    }
                }
            }
        }
    }

    /// Valuation variable constraining the classification of a trace by the
    /// formula rooted at `root`: all-path for positive traces, any-path for
    /// negative ones.
    fn root_var(&self, trc: TrcIdx, root: NodeIdx) -> String {
        self.var_name(trc, root, 0, !self.positive)
    }

    /// For each trace, the constraint stating it is classified correctly by
    /// the formula rooted at `root`.
    pub fn root_constraints(&self, root: NodeIdx) -> Vec<Expr> {
        let mut res = Vec::with_capacity(self.len());
        for (trc, _) in self.traces.index_iter() {
            let val = expr::var(self.root_var(trc, root));
            res.push(if self.positive {
                L::Dom::holds(val)
            } else {
                L::Dom::fails(val)
            })
        }
        res
    }

    /// Names of the variables needed to classify the traces.
    pub fn root_names(&self, root: NodeIdx) -> Vec<String> {
        let mut res = Vec::with_capacity(2 * self.len());
        for (trc, _) in self.traces.index_iter() {
            res.push(self.var_name(trc, root, 0, true));
            if !L::Dom::COLLAPSED {
                res.push(self.var_name(trc, root, 0, false))
            }
        }
        res
    }

    /// For each trace, true if it is classified correctly in a model.
    pub fn classify(&self, root: NodeIdx, model: &Model) -> Res<TrcMap<bool>> {
        let get = |name: String| match model.get(&name) {
            Some(val) => Ok(val),
            None => Err(Error::from(format!("no value for {} in model", name))),
        };
        let mut res = TrcMap::with_capacity(self.len());
        for (trc, _) in self.traces.index_iter() {
            let any = get(self.var_name(trc, root, 0, true))?;
            let all = get(self.var_name(trc, root, 0, false))?;
            res.push(is_correct(self.positive, any, all)?)
        }
        Ok(res)
    }
}

/// True if a trace is classified correctly, given the any-path and all-path
/// values of the formula on its first position.
///
/// Truth values decide directly. Robustness values decide by the sign of
/// their midpoint: the formula accepts a trace when `any + all > 0` and
/// rejects it when `any + all < 0`.
pub fn is_correct(positive: bool, any: &Val, all: &Val) -> Res<bool> {
    match (any.to_rat(), all.to_rat()) {
        (Some(any), Some(all)) => {
            let mid = any + all;
            Ok(if positive {
                mid.is_positive()
            } else {
                mid.is_negative()
            })
        }
        (None, None) => Ok(if positive { all.holds() } else { !any.holds() }),
        _ => bail!("cannot classify with values {} and {}", any, all),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::logic::{Ltl, Sltl};

    fn ltl_tracer(traces: &[&str]) -> (Ltl, Tracer<Ltl>) {
        let ltl = Ltl::new(2);
        let traces = traces
            .iter()
            .map(|s| ltl.parse_trace(s).unwrap())
            .collect();
        (ltl, Tracer::new("pos", true, traces))
    }

    #[test]
    fn arena_layout() {
        let (ltl, mut tracer) = ltl_tracer(&["1,0;0,1:0", "1,1;0,0;1,0:1"]);
        let mut dag = Dag::new(2, 3, 3);
        dag.grow();
        dag.grow();
        assert_eq!(tracer.grow(&ltl, &dag).unwrap(), NodeIdx::new(0));
        assert_eq!(tracer.grow(&ltl, &dag).unwrap(), NodeIdx::new(1));
        assert!(tracer.grow(&ltl, &dag).is_err());

        let vals = tracer.values(NodeIdx::new(1), TrcIdx::new(1));
        assert_eq!(vals.any.len(), 3);
        assert_eq!(vals.any[2].to_string(), "y_pos_1_1_2");
        assert_eq!(vals.all[2], vals.any[2]);
        assert_eq!(
            tracer.encoding(NodeIdx::new(0)).decls.len(),
            5,
            "one variable per position"
        );
    }

    #[test]
    fn atom_guards() {
        let (ltl, mut tracer) = ltl_tracer(&["1,0;0,1:0"]);
        let mut dag = Dag::new(2, 2, 2);
        dag.grow();
        tracer.grow(&ltl, &dag).unwrap();
        let asserts: Vec<_> = tracer
            .encoding(NodeIdx::new(0))
            .asserts
            .iter()
            .map(|e| e.to_string())
            .collect();
        assert_eq!(
            asserts,
            vec![
                "(=> x_0_0 (and y_pos_0_0_0 (not y_pos_0_0_1)))",
                "(=> x_1_0 (and (not y_pos_0_0_0) y_pos_0_0_1))",
            ]
        );
    }

    #[test]
    fn roots_and_classification() {
        let ltl = Ltl::new(1);
        let traces = vec![ltl.parse_trace("1").unwrap(), ltl.parse_trace("0").unwrap()];
        let mut tracer: Tracer<Ltl> = Tracer::new("neg", false, traces);
        let mut dag = Dag::new(1, 1, 1);
        dag.grow();
        tracer.grow(&ltl, &dag).unwrap();
        let roots = tracer.root_constraints(NodeIdx::new(0));
        assert_eq!(roots[0].to_string(), "(not y_neg_0_0_0)");

        let mut model = Model::new();
        let _ = model.insert("y_neg_0_0_0".into(), Val::B(true));
        let _ = model.insert("y_neg_1_0_0".into(), Val::B(false));
        let classif = tracer.classify(NodeIdx::new(0), &model).unwrap();
        assert_eq!(classif[TrcIdx::new(0)], false);
        assert_eq!(classif[TrcIdx::new(1)], true);
    }

    #[test]
    fn robustness_families() {
        let sltl = Sltl::of_strs(&["<(s0,c0)"]).unwrap();
        let traces = vec![sltl.parse_trace("1;2").unwrap()];
        let mut tracer: Tracer<Sltl> = Tracer::new("pos", true, traces);
        let mut dag = Dag::new(1, 2, 2);
        dag.grow();
        tracer.grow(&sltl, &dag).unwrap();
        let vals = tracer.values(NodeIdx::new(0), TrcIdx::new(0));
        assert_eq!(vals.any[1].to_string(), "y_pos_0_0_1_any");
        assert_eq!(vals.all[1].to_string(), "y_pos_0_0_1_all");
        assert_eq!(
            tracer.root_constraints(NodeIdx::new(0))[0].to_string(),
            "(> y_pos_0_0_0_all 0.0)"
        );
        assert_eq!(
            tracer.root_names(NodeIdx::new(0)),
            vec!["y_pos_0_0_0_any", "y_pos_0_0_0_all"]
        );
    }

    fn real(n: i64) -> Val {
        Val::R(Rat::from_integer(Int::from(n)))
    }

    #[test]
    fn robustness_classification() {
        let sltl = Sltl::of_strs(&["<(s0,c0)"]).unwrap();
        let mut dag = Dag::new(1, 1, 1);
        dag.grow();
        for positive in &[true, false] {
            let (name, prefix) = if *positive { ("pos", "y_pos") } else { ("neg", "y_neg") };
            let traces = vec![sltl.parse_trace("1").unwrap(), sltl.parse_trace("2").unwrap()];
            let mut tracer: Tracer<Sltl> = Tracer::new(name, *positive, traces);
            tracer.grow(&sltl, &dag).unwrap();

            let mut model = Model::new();
            // Midpoint 1 on the first trace, -1 on the second one.
            for (trc, any, all) in &[(0, 3, -1), (1, 1, -3)] {
                let _ = model.insert(format!("{}_{}_0_0_any", prefix, trc), real(*any));
                let _ = model.insert(format!("{}_{}_0_0_all", prefix, trc), real(*all));
            }
            let classif = tracer.classify(NodeIdx::new(0), &model).unwrap();
            assert_eq!(classif[TrcIdx::new(0)], *positive);
            assert_eq!(classif[TrcIdx::new(1)], !*positive);
        }
    }

    #[test]
    fn correctness_of_values() {
        assert!(is_correct(true, &real(3), &real(-1)).unwrap());
        assert!(!is_correct(false, &real(3), &real(-1)).unwrap());
        // Null midpoint, neither accepted nor rejected.
        assert!(!is_correct(true, &real(1), &real(-1)).unwrap());
        assert!(!is_correct(false, &real(1), &real(-1)).unwrap());
        assert!(is_correct(true, &Val::B(true), &Val::B(true)).unwrap());
        assert!(is_correct(false, &Val::B(false), &Val::B(false)).unwrap());
        assert!(is_correct(true, &Val::B(true), &real(1)).is_err());
    }
}
