//! Evaluation of expressions in a model.

use crate::common::*;

use super::{Expr, Op, RExpr};

/// Evaluates an expression in a model.
///
/// Fails on unknown variables and ill-typed applications.
pub fn eval(expr: &Expr, model: &Model) -> Res<Val> {
    let mut env = Vec::new();
    eval_in(expr, model, &mut env)
}

fn eval_in(expr: &Expr, model: &Model, env: &mut Vec<(String, Val)>) -> Res<Val> {
    match expr.get() {
        RExpr::Var(name) => env
            .iter()
            .rev()
            .find(|(bound, _)| bound == name)
            .map(|(_, val)| val.clone())
            .or_else(|| model.get(name).cloned())
            .ok_or_else(|| format!("no value for variable `{}`", name).into()),
        RExpr::Bool(b) => Ok(Val::B(*b)),
        RExpr::Int(i) => Ok(Val::I(i.clone())),
        RExpr::Real(r) => Ok(Val::R(r.clone())),
        RExpr::Let { binds, body } => {
            let mut vals = Vec::with_capacity(binds.len());
            for (name, bound) in binds {
                vals.push((name.clone(), eval_in(bound, model, env)?))
            }
            let len = env.len();
            env.extend(vals);
            let res = eval_in(body, model, env);
            env.truncate(len);
            res
        }
        RExpr::App { op, args } => {
            let mut vals = Vec::with_capacity(args.len());
            for arg in args {
                vals.push(eval_in(arg, model, env)?)
            }
            apply(*op, vals).chain_err(|| format!("while evaluating `{}`", expr))
        }
    }
}

fn bools(vals: &[Val]) -> Res<Vec<bool>> {
    vals.iter()
        .map(|val| {
            val.to_bool()
                .ok_or_else(|| format!("expected boolean, got {}", val).into())
        })
        .collect()
}

fn rats(vals: &[Val]) -> Res<Vec<Rat>> {
    vals.iter()
        .map(|val| {
            val.to_rat()
                .ok_or_else(|| format!("expected number, got {}", val).into())
        })
        .collect()
}

/// Numeric result, integer if all the inputs are.
fn numeric(vals: &[Val], res: Rat) -> Val {
    if vals.iter().all(|val| matches!(val, Val::I(_))) && res.is_integer() {
        Val::I(res.to_integer())
    } else {
        Val::R(res)
    }
}

fn apply(op: Op, vals: Vec<Val>) -> Res<Val> {
    macro_rules! arity {
        ($n:expr) => {
            if vals.len() != $n {
                bail!("`{}` expects {} arguments, got {}", op, $n, vals.len())
            }
        };
    }

    let res = match op {
        Op::Not => {
            arity!(1);
            Val::B(!bools(&vals)?[0])
        }
        Op::And => Val::B(bools(&vals)?.into_iter().all(|b| b)),
        Op::Or => Val::B(bools(&vals)?.into_iter().any(|b| b)),
        Op::Impl => {
            arity!(2);
            let b = bools(&vals)?;
            Val::B(!b[0] || b[1])
        }
        Op::Ite => {
            arity!(3);
            let mut vals = vals.into_iter();
            let cnd = vals.next().and_then(|val| val.to_bool());
            match (cnd, vals.next(), vals.next()) {
                (Some(true), Some(thn), _) => thn,
                (Some(false), _, Some(els)) => els,
                _ => bail!("ill-typed `ite`"),
            }
        }
        Op::Eq => {
            arity!(2);
            match (vals[0].to_bool(), vals[1].to_bool()) {
                (Some(b1), Some(b2)) => Val::B(b1 == b2),
                _ => {
                    let r = rats(&vals)?;
                    Val::B(r[0] == r[1])
                }
            }
        }
        Op::Le | Op::Lt | Op::Ge | Op::Gt => {
            arity!(2);
            let r = rats(&vals)?;
            Val::B(match op {
                Op::Le => r[0] <= r[1],
                Op::Lt => r[0] < r[1],
                Op::Ge => r[0] >= r[1],
                _ => r[0] > r[1],
            })
        }
        Op::Add | Op::Mul => {
            let r = rats(&vals)?;
            let res = if op == Op::Add {
                r.into_iter().fold(Rat::zero(), |acc, r| acc + r)
            } else {
                r.into_iter().fold(Rat::one(), |acc, r| acc * r)
            };
            numeric(&vals, res)
        }
        Op::Sub => {
            let r = rats(&vals)?;
            let mut r = r.into_iter();
            let res = match r.next() {
                None => bail!("nullary subtraction"),
                Some(first) if vals.len() == 1 => -first,
                Some(first) => r.fold(first, |acc, r| acc - r),
            };
            numeric(&vals, res)
        }
    };
    Ok(res)
}
