//! Temporal operators and their semantic equations.
//!
//! [`equations`] relates the values of a node to the values of its operands
//! on one ultimately-periodic word, for every position of the word.
//!
//! [`equations`]: fn.equations.html (equations function)

use std::fmt;

use crate::{
    domain::Domain,
    expr::{self, Expr},
};

pub mod bounds;

pub use self::bounds::{in_bounds, make_bounds, walk, Bounds};

/// Formula operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Operator {
    /// Negation.
    Not,
    /// Disjunction.
    Or,
    /// Conjunction.
    And,
    /// Implication.
    Implies,
    /// Next.
    Next,
    /// Bounded eventually.
    Finally,
    /// Bounded always.
    Globally,
    /// Bounded until.
    Until,
}
impl Operator {
    /// All the operators, in label order.
    pub const ALL: [Operator; 8] = [
        Operator::Not,
        Operator::Or,
        Operator::And,
        Operator::Implies,
        Operator::Next,
        Operator::Finally,
        Operator::Globally,
        Operator::Until,
    ];

    /// Number of operands.
    pub fn arity(self) -> usize {
        match self {
            Operator::Not | Operator::Next | Operator::Finally | Operator::Globally => 1,
            Operator::Or | Operator::And | Operator::Implies | Operator::Until => 2,
        }
    }

    /// True for the operators with time bounds.
    pub fn is_timed(self) -> bool {
        matches!(
            self,
            Operator::Finally | Operator::Globally | Operator::Until
        )
    }

    /// Name used in variable names.
    pub fn name(self) -> &'static str {
        match self {
            Operator::Not => "not",
            Operator::Or => "or",
            Operator::And => "and",
            Operator::Implies => "impl",
            Operator::Next => "next",
            Operator::Finally => "fin",
            Operator::Globally => "glob",
            Operator::Until => "until",
        }
    }

    /// Concrete syntax.
    pub fn symbol(self) -> &'static str {
        match self {
            Operator::Not => "!",
            Operator::Or => "||",
            Operator::And => "&&",
            Operator::Implies => "=>",
            Operator::Next => "X",
            Operator::Finally => "F",
            Operator::Globally => "G",
            Operator::Until => "U",
        }
    }

    /// Operator of some concrete syntax.
    pub fn of_symbol(s: &str) -> Option<Operator> {
        Self::ALL.iter().cloned().find(|op| op.symbol() == s)
    }
}
impl fmt::Display for Operator {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        fmt.write_str(self.symbol())
    }
}

/// Values of a node on a word, one per position.
#[derive(Debug, Clone, Copy)]
pub struct Values<'a> {
    /// Any-path valuation.
    pub any: &'a [Expr],
    /// All-path valuation, same as `any` in collapsed domains.
    pub all: &'a [Expr],
}
impl<'a> Values<'a> {
    /// One of the valuations.
    fn get(&self, any: bool) -> &'a [Expr] {
        if any {
            self.any
        } else {
            self.all
        }
    }
}

/// An ultimately-periodic word, as seen by the equations.
#[derive(Debug, Clone, Copy)]
pub struct Word {
    /// Number of letters.
    pub size: usize,
    /// Start of the loop.
    pub rep: usize,
    /// Maximal period of the sample, positions are unrolled up to
    /// `t + max_period` from position `t`.
    pub max_period: usize,
}

/// Value of `op` at `t`, for one of the valuations.
fn value<D: Domain>(
    op: Operator,
    t: usize,
    any: bool,
    lhs: Values,
    rhs: Option<Values>,
    word: &Word,
    bounds: &Bounds,
) -> Expr {
    let (size, rep) = (word.size, word.rep);
    // Negation swaps the valuations.
    let lhs_same = lhs.get(any);
    let lhs_dual = lhs.get(!any);
    let rhs_same = rhs.map(|rhs| rhs.get(any)).unwrap_or(lhs_same);

    let filter = |positions: &[usize]| -> Vec<Expr> {
        positions
            .iter()
            .map(|pos| {
                in_bounds(
                    *pos,
                    t,
                    &bounds.lb,
                    &bounds.ub,
                    size,
                    rep,
                    t + word.max_period,
                )
            })
            .collect()
    };

    match op {
        Operator::Not => D::neg(lhs_dual[t].clone()),
        Operator::Next => lhs_same[self::bounds::next(t, size, rep)].clone(),
        Operator::Or => D::max(lhs_same[t].clone(), rhs_same[t].clone()),
        Operator::And => D::min(lhs_same[t].clone(), rhs_same[t].clone()),
        Operator::Implies => D::max(D::neg(lhs_dual[t].clone()), rhs_same[t].clone()),

        Operator::Finally | Operator::Globally => {
            let positions = walk(t, size, rep);
            let args: Vec<_> = positions.iter().map(|s| lhs_same[*s].clone()).collect();
            let filter = filter(&positions);
            let start = args[0].clone();
            if op == Operator::Finally {
                expr::reduce_filtered(D::max, &args, start, &filter, expr::fls())
            } else {
                expr::reduce_filtered(D::min, &args, start, &filter, expr::fls())
            }
        }

        Operator::Until => {
            let positions = walk(t, size, rep);
            let mut args = Vec::with_capacity(positions.len());
            for (idx, s) in positions.iter().enumerate() {
                let now = rhs_same[*s].clone();
                if idx == 0 {
                    args.push(now)
                } else {
                    let before: Vec<_> = positions[1..idx]
                        .iter()
                        .map(|q| lhs_same[*q].clone())
                        .collect();
                    let first = lhs_same[positions[0]].clone();
                    args.push(D::min(now, expr::reduce(D::min, &before, first)))
                }
            }
            let filter = filter(&positions);
            let start = args[0].clone();
            expr::reduce_filtered(D::max, &args, start, &filter, expr::fls())
        }
    }
}

/// Equations defining the values of a node labeled `op`, for all the
/// positions of a word.
///
/// `rhs` is ignored for unary operators, `bounds` for untimed ones.
pub fn equations<D: Domain>(
    op: Operator,
    node: Values,
    lhs: Values,
    rhs: Option<Values>,
    word: &Word,
    bounds: &Bounds,
) -> Expr {
    let mut conj = Vec::with_capacity(if D::COLLAPSED { 1 } else { 2 } * word.size);
    for t in 0..word.size {
        let any = value::<D>(op, t, true, lhs, rhs, word, bounds);
        conj.push(expr::eq(node.any[t].clone(), any));
        if !D::COLLAPSED {
            let all = value::<D>(op, t, false, lhs, rhs, word, bounds);
            conj.push(expr::eq(node.all[t].clone(), all))
        }
    }
    expr::and(conj)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        common::*,
        dag::{Dag, Label},
        domain::Boolean,
        formula::{
            test::{model_of, p},
            Formula,
        },
        logic::{Logic, Ltl, Sltl},
        trace::Trace,
    };
    use rand::{Rng, SeedableRng};

    /// Values of `op(y)` at each position, with concrete bounds `[lb, ub)`.
    fn unary(op: Operator, y: &[bool], rep: usize, lb: i64, ub: i64) -> Vec<bool> {
        let size = y.len();
        let y_vals: Vec<_> = y.iter().map(|b| expr::bool(*b)).collect();
        let bounds = Bounds {
            lb: expr::var("lb"),
            ub: expr::var("ub"),
            side: expr::tru(),
        };
        let word = Word {
            size,
            rep,
            max_period: size,
        };
        let lhs = Values {
            any: &y_vals,
            all: &y_vals,
        };
        let mut model = Model::new();
        let _ = model.insert("lb".into(), Val::I(Int::from(lb)));
        let _ = model.insert("ub".into(), Val::I(Int::from(ub)));
        (0..size)
            .map(|t| {
                let value = value::<Boolean>(op, t, true, lhs, None, &word, &bounds);
                expr::eval(&value, &model).unwrap().to_bool().unwrap()
            })
            .collect()
    }

    #[test]
    fn equations_are_per_position() {
        let x: Vec<_> = (0..3).map(|t| expr::var(format!("x{}", t))).collect();
        let y: Vec<_> = (0..3).map(|t| expr::var(format!("y{}", t))).collect();
        let bounds = make_bounds(expr::int(0), expr::int(0), 3, 3);
        let word = Word {
            size: 3,
            rep: 1,
            max_period: 3,
        };
        let node = Values { any: &x, all: &x };
        let lhs = Values { any: &y, all: &y };
        let eqs = equations::<Boolean>(Operator::Not, node, lhs, None, &word, &bounds);
        assert_eq!(
            eqs.to_string(),
            "(and (= x0 (not y0)) (= x1 (not y1)) (= x2 (not y2)))"
        );
    }

    #[test]
    fn next_wraps_to_loop() {
        // y = 1 0 0 looping on the second letter.
        assert_eq!(
            unary(Operator::Next, &[true, false, true], 1, 0, 3),
            vec![false, true, false]
        );
    }

    #[test]
    fn finally_and_globally() {
        let y = [false, true, false];
        // Unbounded.
        assert_eq!(
            unary(Operator::Finally, &y, 0, 0, 3),
            vec![true, true, true]
        );
        assert_eq!(
            unary(Operator::Globally, &y, 0, 0, 3),
            vec![false, false, false]
        );
        // Only the current position.
        assert_eq!(unary(Operator::Finally, &y, 0, 0, 1), vec![false, true, false]);
        // Exactly two steps ahead, loop on the last letter.
        assert_eq!(
            unary(Operator::Finally, &y, 2, 2, 3),
            vec![false, false, false]
        );
        assert_eq!(unary(Operator::Finally, &[true, false, true], 2, 2, 3), vec![true, true, true]);
    }

    #[test]
    fn symbols() {
        for op in &Operator::ALL {
            assert_eq!(Operator::of_symbol(op.symbol()), Some(*op))
        }
        assert_eq!(Operator::of_symbol("?"), None);
        assert_eq!(Operator::Until.arity(), 2);
        assert!(Operator::Until.is_timed());
        assert!(!Operator::Next.is_timed());
    }

    /// Checks the equations of `op` against the evaluation of the formula
    /// `op(p0, p1)` with parameters `(a, b)`, on every position of a trace.
    fn agree<L: Logic>(
        logic: &L,
        trace: &Trace<L::Field>,
        consts: &Model,
        op: Operator,
        (a, b): (usize, usize),
    ) {
        let (size, rep) = (trace.size(), trace.rep);
        let dag = Dag::new(2, size, size);
        let rhs = if op.arity() == 2 { Some(1) } else { None };
        let mut model = model_of(
            &dag,
            &[
                (p(0), None, None, (0, 0)),
                (p(1), None, None, (0, 0)),
                (Label::Op(op), Some(0), rhs, (a, b)),
            ],
        );
        for (name, val) in consts {
            let _ = model.insert(name.clone(), val.clone());
        }
        let formula = Formula::decode(logic, &dag, NodeIdx::new(2), &model).unwrap();
        let concrete = formula.valuation(logic, trace, &model).unwrap();

        let mut atoms = vec![];
        for atom in 0..2 {
            let (mut any, mut all) = (vec![], vec![]);
            for letter in &trace.letters {
                let (any_val, all_val) = logic.atom(PrpIdx::new(atom), letter).unwrap();
                any.push(any_val);
                all.push(all_val)
            }
            atoms.push((any, all))
        }
        let lhs = Values {
            any: &atoms[0].0,
            all: &atoms[0].1,
        };
        let rhs = Values {
            any: &atoms[1].0,
            all: &atoms[1].1,
        };
        let word = Word {
            size,
            rep,
            max_period: size,
        };
        let bounds = make_bounds(expr::int(a), expr::int(b), size, size);

        for t in 0..size {
            for any in &[true, false] {
                let symbolic = value::<L::Dom>(op, t, *any, lhs, Some(rhs), &word, &bounds);
                let symbolic = expr::eval(&symbolic, &model).unwrap();
                let concrete = if *any {
                    &concrete.any[t]
                } else {
                    &concrete.all[t]
                };
                assert!(
                    symbolic.to_bool() == concrete.to_bool()
                        && symbolic.to_rat() == concrete.to_rat(),
                    "{} at {} ({}): {} vs {}, [{}, {}), rep {}",
                    formula,
                    t,
                    if *any { "any" } else { "all" },
                    symbolic,
                    concrete,
                    a,
                    a + size - b,
                    rep
                )
            }
        }
    }

    #[test]
    fn equations_agree_with_evaluation() {
        let mut rng = rand_xorshift::XorShiftRng::seed_from_u64(42);
        let ltl = Ltl::new(2);
        let sltl = Sltl::of_strs(&["<(s0,c0)", ">(s1,c1)"]).unwrap();
        for _ in 0..100 {
            let size = rng.gen_range(1..6);
            let rep = rng.gen_range(0..size);
            let a = rng.gen_range(0..size);
            let b = rng.gen_range(a..size);

            let letters: Vec<_> = (0..size)
                .map(|_| format!("{},{}", rng.gen_range(0..2), rng.gen_range(0..2)))
                .collect();
            let ltl_trace = ltl
                .parse_trace(&format!("{}:{}", letters.join(";"), rep))
                .unwrap();

            let letters: Vec<_> = (0..size)
                .map(|_| {
                    let lo = rng.gen_range(-5..5);
                    let hi = lo + rng.gen_range(0..4);
                    format!("[{},{}],{}", lo, hi, rng.gen_range(-5..5))
                })
                .collect();
            let sltl_trace = sltl
                .parse_trace(&format!("{}:{}", letters.join(";"), rep))
                .unwrap();
            let mut consts = Model::new();
            for name in &["c_0", "c_1"] {
                let val = Rat::from_integer(Int::from(rng.gen_range(-5..5)));
                let _ = consts.insert(name.to_string(), Val::R(val));
            }

            for op in &Operator::ALL {
                agree(&ltl, &ltl_trace, &Model::new(), *op, (a, b));
                agree(&sltl, &sltl_trace, &consts, *op, (a, b))
            }
        }
    }
}
