//! DAG of node choices.
//!
//! Node `i` picks exactly one label, an atom or an operator, through the
//! boolean variables `x_<label>_<i>`. Operator nodes pick their left child
//! with `l_<i>_<j>` and their right child with `r_<i>_<j>`, for `j < i`.
//! Timed operators carry the integer parameters `a_<i>` and `b_<i>`.
//!
//! Labels are numbered atoms first, then operators in the order of
//! [`Operator::ALL`][all].
//!
//! [all]: ../ops/enum.Operator.html#associatedconstant.ALL
//! (ALL constant of the Operator enum)

use std::fmt;

use crate::{
    common::*,
    expr::{self, Expr},
    ops::{make_bounds, Bounds, Operator},
};

/// Label of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Label {
    /// An atom.
    Atom(PrpIdx),
    /// An operator.
    Op(Operator),
}
impl Label {
    /// Operator, if any.
    pub fn op(self) -> Option<Operator> {
        match self {
            Label::Atom(_) => None,
            Label::Op(op) => Some(op),
        }
    }
}
impl fmt::Display for Label {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Label::Atom(atom) => write!(fmt, "p{}", atom),
            Label::Op(op) => write!(fmt, "{}", op.name()),
        }
    }
}

/// Structure of the DAG.
pub struct Dag {
    /// Number of atoms.
    atoms: usize,
    /// Size of the largest trace.
    max_size: usize,
    /// Maximal period of the sample.
    max_period: usize,
    /// Encoding of each node.
    nodes: NodeMap<Encoding>,
}

impl Dag {
    /// Constructor.
    pub fn new(atoms: usize, max_size: usize, max_period: usize) -> Self {
        Dag {
            atoms,
            max_size,
            max_period,
            nodes: NodeMap::new(),
        }
    }

    /// Number of nodes.
    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }
    /// True if there are no nodes.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.len() == 0
    }
    /// Number of atoms.
    #[inline]
    pub fn atoms(&self) -> usize {
        self.atoms
    }
    /// Size of the largest trace.
    #[inline]
    pub fn max_size(&self) -> usize {
        self.max_size
    }
    /// Maximal period of the sample.
    #[inline]
    pub fn max_period(&self) -> usize {
        self.max_period
    }

    /// All the labels.
    pub fn labels(&self) -> Vec<Label> {
        PrpRange::zero_to(self.atoms)
            .map(Label::Atom)
            .chain(Operator::ALL.iter().map(|op| Label::Op(*op)))
            .collect()
    }
    /// Operator labels.
    fn op_labels<F>(&self, filter: F) -> Vec<Label>
    where
        F: Fn(Operator) -> bool,
    {
        Operator::ALL
            .iter()
            .cloned()
            .filter(|op| filter(*op))
            .map(Label::Op)
            .collect()
    }

    /// Index of a label, used in variable names.
    pub fn label_idx(&self, label: Label) -> usize {
        match label {
            Label::Atom(atom) => *atom,
            Label::Op(op) => {
                self.atoms
                    + Operator::ALL
                        .iter()
                        .position(|o| *o == op)
                        .unwrap_or(Operator::ALL.len())
            }
        }
    }

    /// Name of the label variable of a node.
    pub fn label_name(&self, label: Label, node: NodeIdx) -> String {
        format!("x_{}_{}", self.label_idx(label), node)
    }
    /// Label variable of a node.
    pub fn label_var(&self, label: Label, node: NodeIdx) -> Expr {
        expr::var(self.label_name(label, node))
    }
    /// Disjunction of some label variables of a node.
    fn any_label(&self, labels: &[Label], node: NodeIdx) -> Expr {
        expr::or(labels.iter().map(|l| self.label_var(*l, node)).collect())
    }

    /// Name of the variable stating `child` is the left child of `node`.
    pub fn left_name(node: NodeIdx, child: NodeIdx) -> String {
        format!("l_{}_{}", node, child)
    }
    /// Variable stating `child` is the left child of `node`.
    pub fn left_var(node: NodeIdx, child: NodeIdx) -> Expr {
        expr::var(Self::left_name(node, child))
    }
    /// Name of the variable stating `child` is the right child of `node`.
    pub fn right_name(node: NodeIdx, child: NodeIdx) -> String {
        format!("r_{}_{}", node, child)
    }
    /// Variable stating `child` is the right child of `node`.
    pub fn right_var(node: NodeIdx, child: NodeIdx) -> Expr {
        expr::var(Self::right_name(node, child))
    }
    /// Name of the first parameter of a node.
    pub fn a_name(node: NodeIdx) -> String {
        format!("a_{}", node)
    }
    /// Name of the second parameter of a node.
    pub fn b_name(node: NodeIdx) -> String {
        format!("b_{}", node)
    }

    /// Bounds of a node, in terms of its parameters.
    pub fn bounds(&self, node: NodeIdx) -> Bounds {
        make_bounds(
            expr::var(Self::a_name(node)),
            expr::var(Self::b_name(node)),
            self.max_size,
            self.max_period,
        )
    }

    /// Encoding of a node.
    pub fn encoding(&self, node: NodeIdx) -> &Encoding {
        &self.nodes[node]
    }
    /// Encodings of all the nodes.
    pub fn encodings(&self) -> impl Iterator<Item = &Encoding> {
        self.nodes.iter()
    }

    /// Adds a node, returns its index.
    pub fn grow(&mut self) -> NodeIdx {
        let node = self.nodes.next_index();
        let mut enc = Encoding::new();
        let labels = self.labels();

        for label in &labels {
            enc.declare(self.label_name(*label, node), "Bool")
        }
        for child in NodeRange::zero_to(*node) {
            enc.declare(Self::left_name(node, child), "Bool");
            enc.declare(Self::right_name(node, child), "Bool")
        }
        enc.declare(Self::a_name(node), "Int");
        enc.declare(Self::b_name(node), "Int");

        // Exactly one label.
        enc.assert(self.any_label(&labels, node));
        for (cnt, l1) in labels.iter().enumerate() {
            for l2 in &labels[cnt + 1..] {
                enc.assert(expr::or(vec![
                    expr::not(self.label_var(*l1, node)),
                    expr::not(self.label_var(*l2, node)),
                ]))
            }
        }

        let unary = self.op_labels(|op| op.arity() == 1);
        let binary = self.op_labels(|op| op.arity() == 2);
        let with_left: Vec<_> = unary.iter().chain(binary.iter()).cloned().collect();

        if *node == 0 {
            // No children to choose from.
            for label in &with_left {
                enc.assert(expr::not(self.label_var(*label, node)))
            }
        } else {
            let child_vars: [fn(NodeIdx, NodeIdx) -> Expr; 2] = [Self::left_var, Self::right_var];
            for child_var in &child_vars {
                let vars: Vec<_> = NodeRange::zero_to(*node)
                    .map(|child| child_var(node, child))
                    .collect();
                for (cnt, v1) in vars.iter().enumerate() {
                    for v2 in &vars[cnt + 1..] {
                        enc.assert(expr::or(vec![expr::not(v1.clone()), expr::not(v2.clone())]))
                    }
                }
            }
            let lefts = NodeRange::zero_to(*node)
                .map(|child| Self::left_var(node, child))
                .collect();
            let rights = NodeRange::zero_to(*node)
                .map(|child| Self::right_var(node, child))
                .collect();
            enc.assert(expr::eq(expr::or(lefts), self.any_label(&with_left, node)));
            enc.assert(expr::eq(expr::or(rights), self.any_label(&binary, node)))
        }

        // Parameters.
        let timed = self.any_label(&self.op_labels(Operator::is_timed), node);
        let (a, b) = (expr::var(Self::a_name(node)), expr::var(Self::b_name(node)));
        enc.assert(expr::implies(timed.clone(), self.bounds(node).side));
        enc.assert(expr::implies(
            expr::not(timed),
            expr::and(vec![expr::eq(a, expr::int(0)), expr::eq(b, expr::int(0))]),
        ));

        self.nodes.push(enc);
        node
    }

    /// Every node below `root` has a parent.
    pub fn parent_exists(&self, root: NodeIdx) -> Expr {
        let mut conj = Vec::with_capacity(*root);
        for child in NodeRange::zero_to(*root) {
            let mut parents = Vec::with_capacity(2 * (*root - *child));
            for parent in (*child + 1)..=*root {
                let parent = NodeIdx::new(parent);
                parents.push(Self::left_var(parent, child));
                parents.push(Self::right_var(parent, child))
            }
            conj.push(expr::or(parents))
        }
        expr::and(conj)
    }

    /// Names of the variables needed to decode the nodes up to `root`.
    pub fn model_names(&self, root: NodeIdx) -> Vec<String> {
        let labels = self.labels();
        let mut names = vec![];
        for node in NodeRange::zero_to(*root + 1) {
            for label in &labels {
                names.push(self.label_name(*label, node))
            }
            for child in NodeRange::zero_to(*node) {
                names.push(Self::left_name(node, child));
                names.push(Self::right_name(node, child))
            }
            names.push(Self::a_name(node));
            names.push(Self::b_name(node))
        }
        names
    }

    /// Label of a node in a model.
    pub fn label_in(&self, node: NodeIdx, model: &Model) -> Res<Label> {
        for label in self.labels() {
            if is_true(model, &self.label_name(label, node)) {
                return Ok(label);
            }
        }
        bail!("model does not label node {}", node)
    }

    /// Left and right children of a node in a model.
    pub fn children_in(&self, node: NodeIdx, model: &Model) -> (Option<NodeIdx>, Option<NodeIdx>) {
        let find = |name: fn(NodeIdx, NodeIdx) -> String| {
            NodeRange::zero_to(*node).find(|child| is_true(model, &name(node, *child)))
        };
        (find(Self::left_name), find(Self::right_name))
    }

    /// Parameters of a node in a model.
    pub fn params_in(&self, node: NodeIdx, model: &Model) -> Res<(usize, usize)> {
        let get = |name: String| -> Res<usize> {
            use num::ToPrimitive;
            match model.get(&name).and_then(Val::to_int) {
                Some(int) => int
                    .to_usize()
                    .ok_or_else(|| format!("illegal value {} for {}", int, name).into()),
                None => bail!("no value for {} in model", name),
            }
        };
        Ok((get(Self::a_name(node))?, get(Self::b_name(node))?))
    }
}

/// True if a variable is `true` in a model.
fn is_true(model: &Model, name: &str) -> bool {
    model.get(name).and_then(Val::to_bool).unwrap_or(false)
}
