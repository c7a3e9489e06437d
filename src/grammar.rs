//! Grammars restricting the shape of the synthesized formulas.
//!
//! A grammar is a list of productions `N := alt | alt | ...`, the left-hand
//! side of the first production is the start symbol. An alternative is
//!
//! - `p<k>`, proposition `k`,
//! - `atom`, any proposition,
//! - a unary operator symbol (`!`, `X`, `F`, `G`) and a nonterminal,
//! - a binary operator symbol (`||`, `&&`, `=>`, `U`) and two nonterminals.
//!
//! For instance `S := G T | S && S` and `T := p0 | ! T`.
//!
//! Node `i` derives from nonterminal `N` when `g_<N>_<i>` is true, where
//! `<N>` is the index of the nonterminal. The encoding of node `i` states
//! that deriving from `N` implies one of the alternatives of `N` matches the
//! label and the children of the node.

use crate::{
    common::*,
    dag::{Dag, Label},
    expr::{self, Expr},
    ops::Operator,
};

/// An alternative of a production.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alt {
    /// A specific proposition.
    Prop(PrpIdx),
    /// Any proposition.
    Atom,
    /// A unary operator and the nonterminal of its operand.
    Unary(Operator, usize),
    /// A binary operator and the nonterminals of its operands.
    Binary(Operator, usize, usize),
}

/// A grammar.
#[derive(Debug, Clone)]
pub struct Grammar {
    /// Names of the nonterminals, the first one is the start symbol.
    names: Vec<String>,
    /// Alternatives of each nonterminal.
    alts: Vec<Vec<Alt>>,
    /// Encoding of each node.
    nodes: NodeMap<Encoding>,
}

impl Grammar {
    /// Parses some productions, `atoms` is the number of atoms.
    pub fn parse<S: AsRef<str>>(lines: &[S], atoms: usize) -> Res<Self> {
        // Nonterminals first, so that alternatives can refer to productions
        // that come later.
        let mut names: Vec<String> = vec![];
        let mut rhs = Vec::with_capacity(lines.len());
        for line in lines {
            let line = line.as_ref().trim();
            let (lhs, alts) = match line.find(":=") {
                Some(pos) => (line[..pos].trim(), line[pos + 2..].trim()),
                None => bail!("expected `:=` in production `{}`", line),
            };
            if lhs.is_empty() || lhs.contains(char::is_whitespace) {
                bail!("illegal nonterminal `{}` in production `{}`", lhs, line)
            }
            let idx = match names.iter().position(|name| name == lhs) {
                Some(idx) => idx,
                None => {
                    names.push(lhs.into());
                    names.len() - 1
                }
            };
            rhs.push((idx, alts))
        }
        if names.is_empty() {
            bail!("grammar has no productions")
        }

        let mut grammar = Grammar {
            alts: vec![vec![]; names.len()],
            names,
            nodes: NodeMap::new(),
        };
        for (nt, alts) in rhs {
            let tokens: Vec<&str> = alts.split_whitespace().collect();
            for alt in tokens.split(|token| *token == "|") {
                let alt = grammar
                    .parse_alt(alt, atoms)
                    .chain_err(|| format!("in production of `{}`", grammar.names[nt]))?;
                grammar.alts[nt].push(alt)
            }
        }
        Ok(grammar)
    }

    /// Parses an alternative.
    fn parse_alt(&self, tokens: &[&str], atoms: usize) -> Res<Alt> {
        let alt = tokens.join(" ");
        let nt = |token: &str| -> Res<usize> {
            match self.names.iter().position(|name| name == token) {
                Some(idx) => Ok(idx),
                None => bail!("unknown nonterminal `{}`", token),
            }
        };
        let res = match tokens {
            ["atom"] => Alt::Atom,
            [prop] if prop.starts_with('p') && prop.len() > 1 => {
                let idx = prop[1..]
                    .parse::<usize>()
                    .chain_err(|| format!("illegal proposition `{}`", prop))?;
                if idx >= atoms {
                    bail!("proposition `{}` does not exist, only {} atom(s)", prop, atoms)
                }
                Alt::Prop(PrpIdx::new(idx))
            }
            [op, args @ ..] => {
                let op = match Operator::of_symbol(op) {
                    Some(op) => op,
                    None => bail!("unknown operator `{}` in `{}`", op, alt),
                };
                match (op.arity(), args) {
                    (1, [arg]) => Alt::Unary(op, nt(arg)?),
                    (2, [lhs, rhs]) => Alt::Binary(op, nt(lhs)?, nt(rhs)?),
                    (arity, _) => bail!(
                        "operator `{}` expects {} nonterminal(s) in `{}`",
                        op,
                        arity,
                        alt
                    ),
                }
            }
            [] => bail!("empty alternative"),
        };
        Ok(res)
    }

    /// Number of nonterminals.
    pub fn len(&self) -> usize {
        self.names.len()
    }
    /// True if there are no nonterminals, never the case for parsed grammars.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
    /// Alternatives of a nonterminal.
    pub fn alts(&self, nt: usize) -> &[Alt] {
        &self.alts[nt]
    }

    /// Name of the variable stating node `node` derives from `nt`.
    pub fn var_name(nt: usize, node: NodeIdx) -> String {
        format!("g_{}_{}", nt, node)
    }
    fn var(nt: usize, node: NodeIdx) -> Expr {
        expr::var(Self::var_name(nt, node))
    }

    /// Encoding of a node.
    pub fn encoding(&self, node: NodeIdx) -> &Encoding {
        &self.nodes[node]
    }
    /// Encodings of all the nodes.
    pub fn encodings(&self) -> impl Iterator<Item = &Encoding> {
        self.nodes.iter()
    }

    /// Some child of `node` on one side derives from `nt`.
    fn child_derives(node: NodeIdx, nt: usize, left: bool) -> Expr {
        let disj = NodeRange::zero_to(*node)
            .map(|child| {
                let side = if left {
                    Dag::left_var(node, child)
                } else {
                    Dag::right_var(node, child)
                };
                expr::and(vec![side, Self::var(nt, child)])
            })
            .collect();
        expr::or(disj)
    }

    /// Encodes the next node of the DAG.
    pub fn grow(&mut self, dag: &Dag) -> Res<NodeIdx> {
        let node = self.nodes.next_index();
        if *node >= dag.len() {
            bail!("grammar cannot grow past the {} node(s) of the DAG", dag.len())
        }
        let mut enc = Encoding::new();
        for (nt, alts) in self.alts.iter().enumerate() {
            enc.declare(Self::var_name(nt, node), "Bool");
            let mut disj = Vec::with_capacity(alts.len());
            for alt in alts {
                let matches = match *alt {
                    Alt::Prop(prop) => dag.label_var(Label::Atom(prop), node),
                    Alt::Atom => expr::or(
                        PrpRange::zero_to(dag.atoms())
                            .map(|prop| dag.label_var(Label::Atom(prop), node))
                            .collect(),
                    ),
                    Alt::Unary(op, arg) => expr::and(vec![
                        dag.label_var(Label::Op(op), node),
                        Self::child_derives(node, arg, true),
                    ]),
                    Alt::Binary(op, lhs, rhs) => expr::and(vec![
                        dag.label_var(Label::Op(op), node),
                        Self::child_derives(node, lhs, true),
                        Self::child_derives(node, rhs, false),
                    ]),
                };
                disj.push(matches)
            }
            enc.assert(expr::implies(Self::var(nt, node), expr::or(disj)))
        }
        log! { @debug
            "grammar, node {}: {} assertions", node, enc.asserts.len()
        }
        self.nodes.push(enc);
        Ok(node)
    }

    /// The root derives from the start symbol.
    pub fn make_start(&self, root: NodeIdx) -> Expr {
        Self::var(0, root)
    }

    /// Names of the variables of a node, for decoding.
    pub fn model_names(&self, root: NodeIdx) -> Vec<String> {
        let mut names = Vec::with_capacity(self.len() * (*root + 1));
        for node in NodeRange::zero_to(*root + 1) {
            for nt in 0..self.len() {
                names.push(Self::var_name(nt, node))
            }
        }
        names
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn parsing() {
        let grammar =
            Grammar::parse(&["S := G T | S && S | atom | S || T", "T := p1 | ! T"], 2).unwrap();
        assert_eq!(grammar.len(), 2);
        assert_eq!(
            grammar.alts(0),
            &[
                Alt::Unary(Operator::Globally, 1),
                Alt::Binary(Operator::And, 0, 0),
                Alt::Atom,
                Alt::Binary(Operator::Or, 0, 1),
            ]
        );
        assert_eq!(
            grammar.alts(1),
            &[Alt::Prop(PrpIdx::new(1)), Alt::Unary(Operator::Not, 1)]
        );
    }

    #[test]
    fn bad_grammars() {
        let empty: [&str; 0] = [];
        assert!(Grammar::parse(&empty, 1).is_err());
        assert!(Grammar::parse(&["S -> p0"], 1).is_err());
        assert!(Grammar::parse(&["S := p1"], 1).is_err());
        assert!(Grammar::parse(&["S := G"], 1).is_err());
        assert!(Grammar::parse(&["S := U S"], 1).is_err());
        assert!(Grammar::parse(&["S := X T"], 1).is_err());
        assert!(Grammar::parse(&["S := ? S"], 1).is_err());
        assert!(Grammar::parse(&["S := p0 |"], 1).is_err());
    }

    #[test]
    fn encoding() {
        let mut grammar = Grammar::parse(&["S := X T", "T := p0"], 1).unwrap();
        let mut dag = Dag::new(1, 2, 2);
        dag.grow();
        dag.grow();
        assert_eq!(grammar.grow(&dag).unwrap(), NodeIdx::new(0));
        assert_eq!(grammar.grow(&dag).unwrap(), NodeIdx::new(1));
        assert!(grammar.grow(&dag).is_err());

        // Node 0 has no children, it cannot derive from `S`.
        let node_0: Vec<_> = grammar
            .encoding(NodeIdx::new(0))
            .asserts
            .iter()
            .map(|e| e.to_string())
            .collect();
        assert_eq!(node_0, vec!["(not g_0_0)", "(=> g_1_0 x_0_0)"]);

        let node_1: Vec<_> = grammar
            .encoding(NodeIdx::new(1))
            .asserts
            .iter()
            .map(|e| e.to_string())
            .collect();
        assert_eq!(
            node_1,
            vec!["(=> g_0_1 (and x_5_1 (and l_1_0 g_1_0)))", "(=> g_1_1 x_0_1)"]
        );
        assert_eq!(grammar.make_start(NodeIdx::new(1)).to_string(), "g_0_1");
        assert_eq!(grammar.model_names(NodeIdx::new(1)).len(), 4);
    }
}
