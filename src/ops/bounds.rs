//! Time intervals of the timed operators.
//!
//! A timed operator at node `i` carries two integer parameters `a_i` and
//! `b_i`. Its interval is `[a, a + max_size - b)`, relative to the current
//! position. The side condition prunes the parameters that do not describe a
//! valid interval.

use crate::expr::{self, Expr};

/// Bounds of a timed operator.
#[derive(Debug, Clone)]
pub struct Bounds {
    /// Lower bound, inclusive.
    pub lb: Expr,
    /// Upper bound, exclusive.
    pub ub: Expr,
    /// Validity of the parameters.
    pub side: Expr,
}

/// Builds the bounds `[a, a + max_size - b)` and their side condition
/// `0 <= a`, `0 <= b`, `lb < ub`, `ub <= max_period`.
pub fn make_bounds(a: Expr, b: Expr, max_size: usize, max_period: usize) -> Bounds {
    let lb = a.clone();
    let ub = expr::sub(vec![
        expr::add(vec![a.clone(), expr::int(max_size)]),
        b.clone(),
    ]);
    let side = expr::and(vec![
        expr::le(expr::int(0), a),
        expr::le(expr::int(0), b),
        expr::lt(lb.clone(), ub.clone()),
        expr::le(ub.clone(), expr::int(max_period)),
    ]);
    Bounds { lb, ub, side }
}

/// Unrolled positions of a letter, below some horizon.
///
/// Yields `pos`, `pos + period`, `pos + 2 * period`... while under `horizon`.
/// Letters in the prefix (before `rep`) only occur once.
fn unrolled(pos: usize, size: usize, rep: usize, horizon: usize) -> impl Iterator<Item = usize> {
    let period = size - rep;
    let count = if pos < rep { 1 } else { usize::MAX };
    (0..count)
        .map(move |cnt| pos + cnt * period)
        .take_while(move |unrolled| *unrolled < horizon)
}

/// Constraint stating that letter `pos` occurs in `[t + lb, t + ub)` when
/// the word is unrolled up to `horizon`.
pub fn in_bounds(
    pos: usize,
    t: usize,
    lb: &Expr,
    ub: &Expr,
    size: usize,
    rep: usize,
    horizon: usize,
) -> Expr {
    let disjuncts = unrolled(pos, size, rep, horizon)
        .map(|unrolled| {
            let delta = unrolled as i64 - t as i64;
            expr::and(vec![
                expr::le(lb.clone(), expr::int(delta)),
                expr::lt(expr::int(delta), ub.clone()),
            ])
        })
        .collect();
    expr::or(disjuncts)
}

/// Concrete version of [`in_bounds`].
///
/// [`in_bounds`]: fn.in_bounds.html (in_bounds function)
pub fn in_bounds_concrete(
    pos: usize,
    t: usize,
    lb: i64,
    ub: i64,
    size: usize,
    rep: usize,
    horizon: usize,
) -> bool {
    unrolled(pos, size, rep, horizon).any(|unrolled| {
        let delta = unrolled as i64 - t as i64;
        lb <= delta && delta < ub
    })
}

/// Positions visited from `t` in one full pass over the word: `t` up to the
/// last letter, then back to `rep` and up to `t - 1` if `t` is in the loop.
pub fn walk(t: usize, size: usize, rep: usize) -> Vec<usize> {
    let stop = if t <= rep { size - 1 } else { t - 1 };
    let mut res = Vec::with_capacity(size);
    let mut pos = t;
    loop {
        res.push(pos);
        if pos == stop {
            break;
        }
        pos = if pos < size - 1 { pos + 1 } else { rep }
    }
    res
}

/// Position following `t`.
pub fn next(t: usize, size: usize, rep: usize) -> usize {
    if t < size - 1 {
        t + 1
    } else {
        rep
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::common::*;
    use rand::{Rng, SeedableRng};

    fn holds(e: &Expr, a: i64, b: i64) -> bool {
        let mut model = Model::new();
        let _ = model.insert("a".into(), Val::I(Int::from(a)));
        let _ = model.insert("b".into(), Val::I(Int::from(b)));
        crate::expr::eval(e, &model)
            .expect("evaluation failed")
            .to_bool()
            .expect("non-boolean value")
    }

    #[test]
    fn side_condition() {
        let bounds = make_bounds(expr::var("a"), expr::var("b"), 5, 8);
        assert!(holds(&bounds.side, 0, 0));
        assert!(holds(&bounds.side, 3, 0));
        assert!(holds(&bounds.side, 0, 4));
        // Empty interval.
        assert!(!holds(&bounds.side, 0, 5));
        // Upper bound past the period.
        assert!(!holds(&bounds.side, 4, 0));
        assert!(!holds(&bounds.side, -1, 0));
        assert!(!holds(&bounds.side, 0, -1));

        let bounds = make_bounds(expr::var("a"), expr::var("b"), 5, 3);
        assert!(!holds(&bounds.side, 0, 0));
        assert!(holds(&bounds.side, 0, 2));
    }

    #[test]
    fn walks() {
        assert_eq!(walk(0, 4, 1), vec![0, 1, 2, 3]);
        assert_eq!(walk(1, 4, 1), vec![1, 2, 3]);
        assert_eq!(walk(2, 4, 1), vec![2, 3, 1]);
        assert_eq!(walk(3, 4, 3), vec![3]);
        assert_eq!(next(3, 4, 1), 1);
        assert_eq!(next(2, 4, 1), 3);
    }

    #[test]
    fn symbolic_agrees_with_concrete() {
        let (size, rep, horizon) = (5, 2, 11);
        for t in 0..size {
            for pos in walk(t, size, rep) {
                let e = in_bounds(pos, t, &expr::var("a"), &expr::var("b"), size, rep, horizon);
                for lb in 0..6 {
                    for ub in lb..8 {
                        assert_eq!(
                            holds(&e, lb, ub),
                            in_bounds_concrete(pos, t, lb, ub, size, rep, horizon),
                        )
                    }
                }
            }
        }
    }

    #[test]
    fn prefix_letters_occur_once() {
        // Letter 0 is in the prefix, it is never reached again.
        assert!(in_bounds_concrete(0, 0, 0, 1, 3, 1, 100));
        assert!(!in_bounds_concrete(0, 0, 1, 50, 3, 1, 100));
        // Letter 1 loops with period 2.
        assert!(in_bounds_concrete(1, 0, 5, 6, 3, 1, 100));
        assert!(!in_bounds_concrete(1, 0, 2, 3, 3, 1, 100));
    }

    #[test]
    fn shift_by_period() {
        let mut rng = rand_xorshift::XorShiftRng::seed_from_u64(42);
        for _ in 0..2_000 {
            let size = rng.gen_range(1..8);
            let rep = rng.gen_range(0..size);
            let period = size - rep;
            let t = rng.gen_range(rep..size + 3 * period);
            let pos = rng.gen_range(rep..size);
            let lb = rng.gen_range(0..12);
            let ub = lb + rng.gen_range(1..12);
            let horizon = t + rng.gen_range(1..20);
            let p = period as i64;
            assert_eq!(
                in_bounds_concrete(pos, t, lb, ub, size, rep, horizon),
                in_bounds_concrete(pos, t, lb + p, ub + p, size, rep, horizon + period),
                "pos: {}, t: {}, [{}, {}), size: {}, rep: {}, horizon: {}",
                pos,
                t,
                lb,
                ub,
                size,
                rep,
                horizon
            )
        }
    }
}
