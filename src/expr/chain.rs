//! Chain-reduce: folds over lists of expressions.
//!
//! Each step of a fold is bound with a `let`, so the size of the resulting
//! expression is linear in the number of elements even when the merge
//! function mentions its arguments several times (robustness max/min are
//! `ite`s).

use std::sync::atomic::{AtomicUsize, Ordering};

use super::{ite, let_in, or, var, Expr, RExpr};

/// Counter for fresh `let`-bound names.
#[allow(non_upper_case_globals)]
static fresh_id: AtomicUsize = AtomicUsize::new(0);

/// A fresh name with some prefix.
fn fresh(pref: &str) -> String {
    format!("{}!{}", pref, fresh_id.fetch_add(1, Ordering::Relaxed))
}

/// True if an expression is a constant or a variable.
fn is_atomic(expr: &Expr) -> bool {
    !matches!(expr.get(), RExpr::App { .. } | RExpr::Let { .. })
}

/// Binds an expression to a fresh name in `binds`, unless it's atomic.
fn bind(pref: &str, expr: Expr, binds: &mut Vec<(String, Expr)>) -> Expr {
    if is_atomic(&expr) {
        expr
    } else {
        let name = fresh(pref);
        binds.push((name.clone(), expr));
        var(name)
    }
}

/// Nests some levels of bindings around a body.
fn nest(levels: Vec<Vec<(String, Expr)>>, body: Expr) -> Expr {
    levels
        .into_iter()
        .rev()
        .fold(body, |body, binds| let_in(binds, body))
}

/// Folds `merge` over `start` and then `args`, left to right.
///
/// Returns `start` when `args` is empty.
pub fn reduce<F>(merge: F, args: &[Expr], start: Expr) -> Expr
where
    F: Fn(Expr, Expr) -> Expr,
{
    let mut levels = Vec::with_capacity(args.len());
    let mut acc = start;
    let mut args = args.iter().peekable();
    while let Some(arg) = args.next() {
        let next = merge(acc, arg.clone());
        if args.peek().is_none() {
            acc = next;
            break;
        }
        let mut binds = Vec::with_capacity(1);
        acc = bind("acc", next, &mut binds);
        levels.push(binds)
    }
    nest(levels, acc)
}

/// Folds `merge` over the elements of `args` whose `filter` holds.
///
/// `start` is merged in front of these elements only if `started` holds;
/// if no filter holds, the result is `start`. So with `started` false,
/// `start` is the value of the fold over an empty selection.
///
/// Returns `start` when `args` is empty.
pub fn reduce_filtered<F>(
    merge: F,
    args: &[Expr],
    start: Expr,
    filter: &[Expr],
    started: Expr,
) -> Expr
where
    F: Fn(Expr, Expr) -> Expr,
{
    debug_assert_eq! { args.len(), filter.len() }

    let steps: Vec<_> = args
        .iter()
        .zip(filter.iter())
        .filter(|(_, filter)| filter.bool_val() != Some(false))
        .collect();
    let mut levels = Vec::with_capacity(steps.len());
    let (mut acc, mut on) = (start, started);
    let count = steps.len();

    for (cnt, (arg, filter)) in steps.into_iter().enumerate() {
        let merged = ite(on.clone(), merge(acc.clone(), arg.clone()), arg.clone());
        let next_acc = ite(filter.clone(), merged, acc);
        if cnt + 1 == count {
            acc = next_acc;
            break;
        }
        let next_on = or(vec![on, filter.clone()]);
        let mut binds = Vec::with_capacity(2);
        acc = bind("acc", next_acc, &mut binds);
        on = bind("on", next_on, &mut binds);
        levels.push(binds)
    }

    nest(levels, acc)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::common::*;
    use crate::expr::{self, eval};

    fn max(lhs: Expr, rhs: Expr) -> Expr {
        expr::ite(expr::ge(lhs.clone(), rhs.clone()), lhs, rhs)
    }
    fn int_of(expr: &Expr, model: &Model) -> Int {
        eval(expr, model)
            .expect("evaluation failed")
            .to_int()
            .expect("non-integer value")
    }

    #[test]
    fn empty_returns_start() {
        let start = expr::var("start");
        assert_eq!(reduce(max, &[], start.clone()), start);
        assert_eq!(
            reduce_filtered(max, &[], start.clone(), &[], expr::fls()),
            start
        );
    }

    #[test]
    fn unconditional() {
        let args: Vec<_> = ["x", "y", "z"].iter().map(|s| expr::var(*s)).collect();
        let res = reduce(max, &args, expr::int(0));
        let mut model = Model::new();
        for (name, val) in &[("x", 3), ("y", 7), ("z", -2)] {
            let _ = model.insert(name.to_string(), Val::I(Int::from(*val)));
        }
        assert_eq!(int_of(&res, &model), Int::from(7));
        let res = reduce(max, &args, expr::int(10));
        assert_eq!(int_of(&res, &model), Int::from(10));
    }

    #[test]
    fn filtered() {
        let args: Vec<_> = [4, 9, 1].iter().map(|i| expr::int(*i)).collect();
        let filter: Vec<_> = ["f0", "f1", "f2"].iter().map(|s| expr::var(*s)).collect();
        let res = reduce_filtered(max, &args, expr::int(-5), &filter, expr::fls());

        let check = |bits: [bool; 3], expected: i64| {
            let mut model = Model::new();
            for (idx, bit) in bits.iter().enumerate() {
                let _ = model.insert(format!("f{}", idx), Val::B(*bit));
            }
            assert_eq!(int_of(&res, &model), Int::from(expected), "{:?}", bits)
        };
        check([false, false, false], -5);
        check([true, false, false], 4);
        check([true, false, true], 4);
        check([false, false, true], 1);
        check([true, true, true], 9);

        // With `started`, the start value takes part in the fold.
        let res = reduce_filtered(max, &args, expr::int(5), &filter, expr::tru());
        let mut model = Model::new();
        for idx in 0..3 {
            let _ = model.insert(format!("f{}", idx), Val::B(idx == 2));
        }
        assert_eq!(int_of(&res, &model), Int::from(5));
    }

    #[test]
    fn constant_filters_fold_away() {
        let args: Vec<_> = ["x", "y"].iter().map(|s| expr::var(*s)).collect();
        let res = reduce_filtered(
            max,
            &args,
            expr::int(0),
            &[expr::fls(), expr::fls()],
            expr::fls(),
        );
        assert_eq!(res, expr::int(0));
    }
}
