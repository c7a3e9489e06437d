//! Concrete evaluation of decoded formulas on traces.
//!
//! Mirrors the equations of the encoding on concrete values, so that the
//! classification of a trace by a decoded formula can be checked without
//! the solver.

use crate::{
    common::*,
    dag::Label,
    expr,
    formula::Formula,
    logic::Logic,
    ops::{
        bounds::{in_bounds_concrete, next, walk},
        Operator,
    },
    trace::Trace,
    tracer::is_correct,
};

/// Any-path and all-path values of a node, one per position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Valuation {
    /// Any-path values.
    pub any: Vec<Val>,
    /// All-path values.
    pub all: Vec<Val>,
}
impl Valuation {
    fn get(&self, any: bool) -> &[Val] {
        if any {
            &self.any
        } else {
            &self.all
        }
    }
}

/// Concrete context of an evaluation.
struct Ctx<'a, L: Logic> {
    logic: &'a L,
    trace: &'a Trace<L::Field>,
    model: &'a Model,
    memo: NodeHMap<Valuation>,
}

impl Formula {
    /// Valuation of the formula on a trace.
    ///
    /// The model gives the values of the constants of the logic, if any.
    pub fn valuation<L: Logic>(
        &self,
        logic: &L,
        trace: &Trace<L::Field>,
        model: &Model,
    ) -> Res<Valuation> {
        let mut ctx = Ctx {
            logic,
            trace,
            model,
            memo: NodeHMap::with_capacity(self.dag_size()),
        };
        self.valuation_of(self.root(), &mut ctx)
    }

    /// Any-path and all-path values of the formula on the first position of
    /// a trace.
    pub fn eval<L: Logic>(
        &self,
        logic: &L,
        trace: &Trace<L::Field>,
        model: &Model,
    ) -> Res<(Val, Val)> {
        let valuation = self.valuation(logic, trace, model)?;
        match (valuation.any.into_iter().next(), valuation.all.into_iter().next()) {
            (Some(any), Some(all)) => Ok((any, all)),
            _ => bail!("cannot evaluate a formula on an empty trace"),
        }
    }

    /// True if a trace is classified as expected, see
    /// [`is_correct`](../tracer/fn.is_correct.html).
    pub fn classifies<L: Logic>(
        &self,
        logic: &L,
        trace: &Trace<L::Field>,
        model: &Model,
        positive: bool,
    ) -> Res<bool> {
        let (any, all) = self.eval(logic, trace, model)?;
        is_correct(positive, &any, &all)
    }

    fn valuation_of<L: Logic>(&self, node: NodeIdx, ctx: &mut Ctx<L>) -> Res<Valuation> {
        if let Some(valuation) = ctx.memo.get(&node) {
            return Ok(valuation.clone());
        }
        let info = self.node(node)?.clone();
        let size = ctx.trace.size();

        let valuation = match info.label {
            Label::Atom(atom) => {
                let mut valuation = Valuation {
                    any: Vec::with_capacity(size),
                    all: Vec::with_capacity(size),
                };
                for letter in &ctx.trace.letters {
                    let (any, all) = ctx.logic.atom(atom, letter)?;
                    valuation.any.push(expr::eval(&any, ctx.model)?);
                    valuation.all.push(expr::eval(&all, ctx.model)?)
                }
                valuation
            }
            Label::Op(op) => {
                let lhs = match info.lhs {
                    Some(lhs) => self.valuation_of(lhs, ctx)?,
                    None => bail!("{} node {} has no left child", op.name(), node),
                };
                let rhs = match info.rhs {
                    Some(rhs) => Some(self.valuation_of(rhs, ctx)?),
                    None if op.arity() == 2 => {
                        bail!("{} node {} has no right child", op.name(), node)
                    }
                    None => None,
                };
                let (a, b) = info.params;
                let bounds = (a as i64, (a + self.max_size()) as i64 - b as i64);
                let mut valuation = Valuation {
                    any: Vec::with_capacity(size),
                    all: Vec::with_capacity(size),
                };
                for t in 0..size {
                    valuation
                        .any
                        .push(self.value(op, t, true, &lhs, rhs.as_ref(), ctx.trace, bounds)?);
                    valuation
                        .all
                        .push(self.value(op, t, false, &lhs, rhs.as_ref(), ctx.trace, bounds)?)
                }
                valuation
            }
        };

        let _ = ctx.memo.insert(node, valuation.clone());
        Ok(valuation)
    }

    /// Concrete value of `op` at `t`.
    #[allow(clippy::too_many_arguments)]
    fn value<F>(
        &self,
        op: Operator,
        t: usize,
        any: bool,
        lhs: &Valuation,
        rhs: Option<&Valuation>,
        trace: &Trace<F>,
        (lb, ub): (i64, i64),
    ) -> Res<Val> {
        let (size, rep) = (trace.size(), trace.rep);
        let lhs_same = lhs.get(any);
        let lhs_dual = lhs.get(!any);
        let rhs_same = rhs.map(|rhs| rhs.get(any)).unwrap_or(lhs_same);
        let horizon = t + self.max_period();
        let in_bounds = |pos: usize| in_bounds_concrete(pos, t, lb, ub, size, rep, horizon);

        // Merges the arguments in bounds, first argument if there are none.
        let filtered = |positions: &[usize], args: Vec<Val>, max: bool| -> Res<Val> {
            let mut res: Option<Val> = None;
            for (pos, arg) in positions.iter().zip(args.iter()) {
                if !in_bounds(*pos) {
                    continue;
                }
                res = Some(match res {
                    None => arg.clone(),
                    Some(acc) if max => acc.max(arg.clone())?,
                    Some(acc) => acc.min(arg.clone())?,
                })
            }
            match res {
                Some(res) => Ok(res),
                None => Ok(args[0].clone()),
            }
        };

        let res = match op {
            Operator::Not => lhs_dual[t].neg(),
            Operator::Next => lhs_same[next(t, size, rep)].clone(),
            Operator::Or => lhs_same[t].clone().max(rhs_same[t].clone())?,
            Operator::And => lhs_same[t].clone().min(rhs_same[t].clone())?,
            Operator::Implies => lhs_dual[t].neg().max(rhs_same[t].clone())?,
            Operator::Finally | Operator::Globally => {
                let positions = walk(t, size, rep);
                let args = positions.iter().map(|s| lhs_same[*s].clone()).collect();
                filtered(&positions, args, op == Operator::Finally)?
            }
            Operator::Until => {
                let positions = walk(t, size, rep);
                let mut args = Vec::with_capacity(positions.len());
                // Minimum of the left operand from `t` to the previous
                // position.
                let mut before: Option<Val> = None;
                for s in &positions {
                    let now = rhs_same[*s].clone();
                    args.push(match before.clone() {
                        None => now,
                        Some(before) => now.min(before)?,
                    });
                    let here = lhs_same[*s].clone();
                    before = Some(match before {
                        None => here,
                        Some(before) => before.min(here)?,
                    })
                }
                filtered(&positions, args, true)?
            }
        };
        Ok(res)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        dag::Dag,
        formula::test::{model_of, op, p},
        logic::{Ltl, Sltl},
    };

    fn ltl_formula(
        nodes: &[(Label, Option<usize>, Option<usize>, (usize, usize))],
        max_size: usize,
        max_period: usize,
    ) -> (Ltl, Formula) {
        let ltl = Ltl::new(2);
        let dag = Dag::new(2, max_size, max_period);
        let model = model_of(&dag, nodes);
        let root = NodeIdx::new(nodes.len() - 1);
        let formula = Formula::decode(&ltl, &dag, root, &model).unwrap();
        (ltl, formula)
    }

    fn bools(valuation: &Valuation) -> Vec<bool> {
        valuation.any.iter().map(|val| val.holds()).collect()
    }

    #[test]
    fn untimed() {
        let (ltl, formula) = ltl_formula(
            &[
                (p(0), None, None, (0, 0)),
                (p(1), None, None, (0, 0)),
                (op(Operator::Next), Some(0), None, (0, 0)),
                (op(Operator::Implies), Some(2), Some(1), (0, 0)),
            ],
            3,
            3,
        );
        let trace = ltl.parse_trace("1,0;0,0;1,1:1").unwrap();
        let valuation = formula.valuation(&ltl, &trace, &Model::new()).unwrap();
        // X p0 is 0,1,0 (last letter loops to position 1).
        assert_eq!(bools(&valuation), vec![true, false, true]);
        assert_eq!(valuation.any, valuation.all);
    }

    #[test]
    fn globally_on_loops() {
        let (ltl, formula) = ltl_formula(
            &[
                (p(0), None, None, (0, 0)),
                (op(Operator::Globally), Some(0), None, (0, 0)),
            ],
            3,
            3,
        );
        let model = Model::new();
        let trace = ltl.parse_trace("0,0;1,0;1,0:1").unwrap();
        let valuation = formula.valuation(&ltl, &trace, &model).unwrap();
        assert_eq!(bools(&valuation), vec![false, true, true]);
        assert!(!formula.classifies(&ltl, &trace, &model, true).unwrap());
        assert!(formula.classifies(&ltl, &trace, &model, false).unwrap());
    }

    #[test]
    fn bounded_finally() {
        // F[1,2)p0 is X p0.
        let (ltl, formula) = ltl_formula(
            &[
                (p(0), None, None, (0, 0)),
                (op(Operator::Finally), Some(0), None, (1, 2)),
            ],
            3,
            3,
        );
        let trace = ltl.parse_trace("1,0;0,0;1,0:0").unwrap();
        let valuation = formula.valuation(&ltl, &trace, &Model::new()).unwrap();
        assert_eq!(bools(&valuation), vec![false, true, true]);
    }

    #[test]
    fn until() {
        let (ltl, formula) = ltl_formula(
            &[
                (p(0), None, None, (0, 0)),
                (p(1), None, None, (0, 0)),
                (op(Operator::Until), Some(0), Some(1), (0, 0)),
            ],
            4,
            4,
        );
        let trace = ltl.parse_trace("1,0;1,0;0,1;0,0:3").unwrap();
        let valuation = formula.valuation(&ltl, &trace, &Model::new()).unwrap();
        assert_eq!(bools(&valuation), vec![true, true, true, false]);
        let trace = ltl.parse_trace("1,0;0,0;0,1;0,0:3").unwrap();
        let valuation = formula.valuation(&ltl, &trace, &Model::new()).unwrap();
        assert_eq!(bools(&valuation), vec![false, false, true, false]);
    }

    #[test]
    fn robustness() {
        let sltl = Sltl::of_strs(&["<(s0,c0)"]).unwrap();
        let dag = Dag::new(1, 2, 2);
        let mut model = model_of(
            &dag,
            &[
                (p(0), None, None, (0, 0)),
                (op(Operator::Finally), Some(0), None, (0, 0)),
            ],
        );
        let _ = model.insert("c_0".into(), Val::R(Rat::from_integer(Int::from(3))));
        let formula = Formula::decode(&sltl, &dag, NodeIdx::new(1), &model).unwrap();
        assert_eq!(formula.to_string(), "F(s0<c0(3))");
        let trace = sltl.parse_trace("[1,4];5:0").unwrap();
        let (any, all) = formula.eval(&sltl, &trace, &model).unwrap();
        // s0 < 3: any-path 3 - 1 at position 0, all-path max(3 - 4, 3 - 5).
        assert_eq!(any, Val::R(Rat::from_integer(Int::from(2))));
        assert_eq!(all, Val::R(Rat::from_integer(Int::from(-1))));
        // Midpoint 1/2.
        assert!(formula.classifies(&sltl, &trace, &model, true).unwrap());
        assert!(!formula.classifies(&sltl, &trace, &model, false).unwrap());
    }
}
