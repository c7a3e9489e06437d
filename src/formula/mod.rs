//! Formulas decoded from a model of the DAG encoding.
//!
//! Decoding starts from the root and follows the children chosen in the
//! model. Nodes live in an arena indexed by DAG node: a node that is the
//! child of several parents is decoded once and shared. Printing follows the
//! sharing, so shared subformulas appear once per occurrence in the output.

use std::fmt;

use crate::{
    common::*,
    dag::{Dag, Label},
    logic::Logic,
    ops::Operator,
};

pub mod eval;

/// A decoded node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    /// Label.
    pub label: Label,
    /// Left child, if any.
    pub lhs: Option<NodeIdx>,
    /// Right child, if any.
    pub rhs: Option<NodeIdx>,
    /// Parameters `(a, b)` of timed operators, `(0, 0)` otherwise.
    pub params: (usize, usize),
}

/// A decoded formula.
#[derive(Debug, Clone)]
pub struct Formula {
    /// Arena of nodes, `None` for DAG nodes the formula does not use.
    nodes: NodeMap<Option<Node>>,
    /// Root.
    root: NodeIdx,
    /// String representation of the atoms.
    atoms: PrpMap<String>,
    /// Size of the largest trace.
    max_size: usize,
    /// Maximal period of the sample.
    max_period: usize,
}

impl Formula {
    /// Decodes the formula rooted at `root` in a model.
    ///
    /// The model must define the variables of [`Dag::model_names`][names],
    /// and the constants of the logic if any.
    ///
    /// [names]: ../dag/struct.Dag.html#method.model_names
    /// (model_names function of Dag)
    pub fn decode<L: Logic>(logic: &L, dag: &Dag, root: NodeIdx, model: &Model) -> Res<Self> {
        let atoms: Vec<String> = PrpRange::zero_to(logic.atom_count())
            .map(|atom| logic.atom_str(atom, model))
            .collect();
        let mut formula = Formula {
            nodes: vec![None; *root + 1].into(),
            root,
            atoms: atoms.into(),
            max_size: dag.max_size(),
            max_period: dag.max_period(),
        };
        formula
            .decode_node(dag, root, model)
            .chain_err(|| format!("while decoding the formula rooted at node {}", root))?;
        Ok(formula)
    }

    /// Decodes a node and its descendants, unless already decoded.
    fn decode_node(&mut self, dag: &Dag, node: NodeIdx, model: &Model) -> Res<()> {
        if self.nodes[node].is_some() {
            return Ok(());
        }
        let label = dag.label_in(node, model)?;
        let (mut lhs, mut rhs, mut params) = (None, None, (0, 0));

        if let Some(op) = label.op() {
            let (lft, rgt) = dag.children_in(node, model);
            let lft = match lft {
                Some(lft) => lft,
                None => bail!("{} node {} has no left child", op.name(), node),
            };
            self.decode_node(dag, lft, model)?;
            lhs = Some(lft);
            if op.arity() == 2 {
                let rgt = match rgt {
                    Some(rgt) => rgt,
                    None => bail!("{} node {} has no right child", op.name(), node),
                };
                self.decode_node(dag, rgt, model)?;
                rhs = Some(rgt)
            }
            if op.is_timed() {
                params = dag.params_in(node, model)?
            }
        }

        self.nodes[node] = Some(Node {
            label,
            lhs,
            rhs,
            params,
        });
        Ok(())
    }

    /// Root of the formula.
    pub fn root(&self) -> NodeIdx {
        self.root
    }

    /// Node of the arena, if decoded.
    fn get(&self, node: NodeIdx) -> Option<&Node> {
        if *node < self.nodes.len() {
            self.nodes[node].as_ref()
        } else {
            None
        }
    }

    /// A node of the formula.
    pub fn node(&self, node: NodeIdx) -> Res<&Node> {
        match self.get(node) {
            Some(node) => Ok(node),
            None => bail!("node {} is not part of the formula", node),
        }
    }

    /// Number of DAG nodes the formula uses.
    pub fn dag_size(&self) -> usize {
        self.nodes.iter().filter(|node| node.is_some()).count()
    }

    /// Size of the formula as a tree: shared nodes count once per
    /// occurrence.
    pub fn tree_size(&self) -> usize {
        let mut size = 0;
        let mut stack = vec![self.root];
        while let Some(node) = stack.pop() {
            size += 1;
            if let Some(node) = self.get(node) {
                stack.extend(node.lhs);
                stack.extend(node.rhs)
            }
        }
        size
    }

    /// Size of the largest trace of the sample the formula was learned on.
    pub fn max_size(&self) -> usize {
        self.max_size
    }
    /// Maximal period of the sample the formula was learned on.
    pub fn max_period(&self) -> usize {
        self.max_period
    }

    /// Bounds `[lb, ub)` of a timed node, `ub` is `None` for infinity.
    pub fn bounds(&self, (a, b): (usize, usize)) -> (usize, Option<usize>) {
        let ub = if b > 0 {
            Some((a + self.max_size).saturating_sub(b))
        } else {
            None
        };
        (a, ub)
    }

    /// Writes the bounds of a timed node, nothing if they are `[0, inf)`.
    fn write_bounds(&self, fmt: &mut fmt::Formatter, params: (usize, usize)) -> fmt::Result {
        if params == (0, 0) {
            return Ok(());
        }
        match self.bounds(params) {
            (lb, Some(ub)) => write!(fmt, "[{},{})", lb, ub),
            (lb, None) => write!(fmt, "[{},inf)", lb),
        }
    }

    fn write_node(&self, fmt: &mut fmt::Formatter, node: Option<NodeIdx>) -> fmt::Result {
        let node = match node.and_then(|node| self.get(node)) {
            Some(node) => node,
            None => return write!(fmt, "?"),
        };
        let op = match node.label {
            Label::Atom(atom) => return fmt.write_str(&self.atoms[atom]),
            Label::Op(op) => op,
        };
        let (lhs, rhs) = (node.lhs, node.rhs);
        match op {
            Operator::Not | Operator::Next => {
                write!(fmt, "{}", op.symbol())?;
                self.write_node(fmt, lhs)
            }
            Operator::Finally | Operator::Globally => {
                write!(fmt, "{}", op.symbol())?;
                self.write_bounds(fmt, node.params)?;
                self.write_node(fmt, lhs)
            }
            Operator::Or | Operator::And | Operator::Implies => {
                write!(fmt, "(")?;
                self.write_node(fmt, lhs)?;
                write!(fmt, "{}", op.symbol())?;
                self.write_node(fmt, rhs)?;
                write!(fmt, ")")
            }
            Operator::Until => {
                write!(fmt, "(")?;
                self.write_node(fmt, lhs)?;
                write!(fmt, "){}", op.symbol())?;
                self.write_bounds(fmt, node.params)?;
                write!(fmt, "(")?;
                self.write_node(fmt, rhs)?;
                write!(fmt, ")")
            }
        }
    }
}

impl fmt::Display for Formula {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        self.write_node(fmt, Some(self.root))
    }
}

#[cfg(test)]
pub mod test {
    use super::*;
    use crate::logic::Ltl;

    /// Model labeling the DAG nodes, in order.
    ///
    /// Each element is the label, the children, and the parameters.
    pub fn model_of(
        dag: &Dag,
        nodes: &[(Label, Option<usize>, Option<usize>, (usize, usize))],
    ) -> Model {
        let mut model = Model::new();
        for (idx, (label, lhs, rhs, (a, b))) in nodes.iter().enumerate() {
            let node = NodeIdx::new(idx);
            for other in dag.labels() {
                let _ = model.insert(dag.label_name(other, node), Val::B(other == *label));
            }
            for child in NodeRange::zero_to(idx) {
                let _ = model.insert(
                    Dag::left_name(node, child),
                    Val::B(*lhs == Some(*child)),
                );
                let _ = model.insert(
                    Dag::right_name(node, child),
                    Val::B(*rhs == Some(*child)),
                );
            }
            let _ = model.insert(Dag::a_name(node), Val::I(Int::from(*a)));
            let _ = model.insert(Dag::b_name(node), Val::I(Int::from(*b)));
        }
        model
    }

    pub fn p(idx: usize) -> Label {
        Label::Atom(PrpIdx::new(idx))
    }
    pub fn op(op: Operator) -> Label {
        Label::Op(op)
    }

    #[test]
    fn shared_subformula() {
        let ltl = Ltl::new(2);
        let dag = Dag::new(2, 4, 4);
        let model = model_of(
            &dag,
            &[
                (p(0), None, None, (0, 0)),
                (op(Operator::Next), Some(0), None, (0, 0)),
                (op(Operator::Or), Some(1), Some(1), (0, 0)),
                (op(Operator::And), Some(2), Some(0), (0, 0)),
            ],
        );
        let formula = Formula::decode(&ltl, &dag, NodeIdx::new(3), &model).unwrap();
        assert_eq!(formula.to_string(), "((Xp0||Xp0)&&p0)");
        assert_eq!(formula.dag_size(), 4);
        assert_eq!(formula.tree_size(), 7);
    }

    #[test]
    fn timed_operators() {
        let ltl = Ltl::new(2);
        let dag = Dag::new(2, 4, 6);
        let model = model_of(
            &dag,
            &[
                (p(1), None, None, (0, 0)),
                (op(Operator::Finally), Some(0), None, (1, 2)),
                (op(Operator::Globally), Some(1), None, (0, 0)),
                (op(Operator::Until), Some(2), Some(0), (2, 0)),
            ],
        );
        let formula = Formula::decode(&ltl, &dag, NodeIdx::new(3), &model).unwrap();
        assert_eq!(formula.to_string(), "(GF[1,3)p1)U[2,inf)(p1)");
        let formula = Formula::decode(&ltl, &dag, NodeIdx::new(1), &model).unwrap();
        assert_eq!(formula.to_string(), "F[1,3)p1");
        assert_eq!(formula.dag_size(), 2);
    }

    #[test]
    fn unused_nodes() {
        let ltl = Ltl::new(1);
        let dag = Dag::new(1, 2, 2);
        let model = model_of(
            &dag,
            &[
                (p(0), None, None, (0, 0)),
                (p(0), None, None, (0, 0)),
                (op(Operator::Not), Some(1), None, (0, 0)),
            ],
        );
        let formula = Formula::decode(&ltl, &dag, NodeIdx::new(2), &model).unwrap();
        assert_eq!(formula.to_string(), "!p0");
        assert_eq!(formula.dag_size(), 2);
        assert!(formula.node(NodeIdx::new(0)).is_err());
        assert_eq!(formula.node(NodeIdx::new(1)).unwrap().label, p(0));
    }

    #[test]
    fn broken_models() {
        let ltl = Ltl::new(1);
        let dag = Dag::new(1, 2, 2);
        // `or` with no right child.
        let model = model_of(
            &dag,
            &[
                (p(0), None, None, (0, 0)),
                (op(Operator::Or), Some(0), None, (0, 0)),
            ],
        );
        assert!(Formula::decode(&ltl, &dag, NodeIdx::new(1), &model).is_err());
        assert!(Formula::decode(&ltl, &dag, NodeIdx::new(1), &Model::new()).is_err());
    }
}
