//! Classification scores and score goals.
//!
//! The score of a formula is computed from the weighted true positives `TP`
//! and true negatives `TN`, and the total weights `P` and `N` of the
//! samples.
//!
//! | score    | value                 |
//! |:--------:|:----------------------|
//! | `count`  | `(TP + TN) / (P + N)` |
//! | `ratio`  | `(TP/P + TN/N) / 2`   |
//! | `linear` | `min(TP/P, TN/N)`     |
//! | `quadra` | `(TP/P) * (TN/N)`     |
//!
//! When optimizing, the solver maximizes an integer objective ordering
//! formulas as the score does: the weight of the correctly classified traces
//! for `count`, the scaled sum `N * TP + P * TN` for `ratio`, the minimum of
//! both scaled terms for `linear` and the product `TP * TN` for `quadra`.
//! The score reported is always recomputed from the classification of the
//! decoded formula.

use std::{fmt, str::FromStr};

use crate::{
    common::*,
    expr::{self, Expr},
};

/// Classification scores.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Score {
    /// Weight of the correctly classified traces over the total weight.
    Count,
    /// Mean of the positive and negative ratios.
    Ratio,
    /// Minimum of the positive and negative ratios.
    Linear,
    /// Product of the positive and negative ratios.
    Quadra,
}

impl Score {
    /// All the scores.
    pub const ALL: [Score; 4] = [Score::Count, Score::Ratio, Score::Linear, Score::Quadra];

    /// Name of the score.
    pub fn name(self) -> &'static str {
        match self {
            Score::Count => "count",
            Score::Ratio => "ratio",
            Score::Linear => "linear",
            Score::Quadra => "quadra",
        }
    }

    /// Value of the score on a classification, between `0` and `1`.
    pub fn compute(self, classif: &Classification) -> f64 {
        let (tp, tn) = (classif.tp as f64, classif.tn as f64);
        let (p, n) = (classif.p as f64, classif.n as f64);
        let ratio = |num: f64, den: f64| if den > 0.0 { num / den } else { 1.0 };
        match self {
            Score::Count => ratio(tp + tn, p + n),
            Score::Ratio => (ratio(tp, p) + ratio(tn, n)) / 2.0,
            Score::Linear => ratio(tp, p).min(ratio(tn, n)),
            Score::Quadra => ratio(tp, p) * ratio(tn, n),
        }
    }

    /// Registers the objective of the score in an engine.
    ///
    /// `pos` and `neg` are the conditions for each trace to be classified
    /// correctly, with the weight of the trace.
    pub fn objective<E: SolveEngine>(
        self,
        engine: &mut E,
        pos: &[(Expr, usize)],
        neg: &[(Expr, usize)],
    ) -> Res<()> {
        let total = |sample: &[(Expr, usize)]| sample.iter().map(|(_, w)| *w).sum::<usize>();
        let (p, n) = (total(pos), total(neg));

        // Scaling is meaningless if one of the samples is empty.
        if self == Score::Count || p == 0 || n == 0 {
            for (cond, weight) in pos.iter().chain(neg.iter()) {
                engine.add_soft(cond, *weight)?
            }
            return Ok(());
        }

        let weighted = |sample: &[(Expr, usize)]| {
            expr::add(
                sample
                    .iter()
                    .map(|(cond, w)| expr::ite(cond.clone(), expr::int(*w), expr::int(0)))
                    .collect(),
            )
        };
        let objective = if self == Score::Quadra {
            // `P * N` is constant.
            expr::mul(vec![weighted(pos), weighted(neg)])
        } else {
            let tp = expr::mul(vec![expr::int(n), weighted(pos)]);
            let tn = expr::mul(vec![expr::int(p), weighted(neg)]);
            match self {
                Score::Linear => expr::ite(expr::le(tp.clone(), tn.clone()), tp, tn),
                _ => expr::add(vec![tp, tn]),
            }
        };
        engine.add_maximize(&objective)
    }
}

impl fmt::Display for Score {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        fmt.write_str(self.name())
    }
}

impl FromStr for Score {
    type Err = Error;
    fn from_str(s: &str) -> Res<Self> {
        match Score::ALL.iter().find(|score| score.name() == s) {
            Some(score) => Ok(*score),
            None => bail!(
                "unknown score `{}`, expected one of count, ratio, linear, quadra",
                s
            ),
        }
    }
}

/// Weighted classification of the samples by a formula.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Classification {
    /// Weight of the positive traces classified correctly.
    pub tp: usize,
    /// Weight of the negative traces classified correctly.
    pub tn: usize,
    /// Weight of the positive traces.
    pub p: usize,
    /// Weight of the negative traces.
    pub n: usize,
    /// Negative traces the formula accepts.
    pub false_pos: Vec<TrcIdx>,
    /// Positive traces the formula rejects.
    pub false_neg: Vec<TrcIdx>,
}

impl Classification {
    /// Empty classification.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the classification of a trace.
    pub fn add(&mut self, positive: bool, trc: TrcIdx, weight: usize, correct: bool) {
        match (positive, correct) {
            (true, true) => self.tp += weight,
            (false, true) => self.tn += weight,
            (true, false) => self.false_neg.push(trc),
            (false, false) => self.false_pos.push(trc),
        }
        if positive {
            self.p += weight
        } else {
            self.n += weight
        }
    }

    /// True if all traces are classified correctly.
    pub fn is_perfect(&self) -> bool {
        self.false_pos.is_empty() && self.false_neg.is_empty()
    }
}

/// Score goal: `base + per_trace * traces + per_node * size` for a sample
/// with `traces` traces and a DAG with `size` nodes.
///
/// Written as a sum of terms `<n>`, `<n>T` and `<n>I`, for instance
/// `0.9+0.01T-0.1I`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreGoal {
    /// Constant part.
    pub base: f64,
    /// Coefficient of the number of traces.
    pub per_trace: f64,
    /// Coefficient of the size of the DAG.
    pub per_node: f64,
}

impl Default for ScoreGoal {
    fn default() -> Self {
        ScoreGoal {
            base: 1.0,
            per_trace: 0.0,
            per_node: 0.0,
        }
    }
}

impl ScoreGoal {
    /// Goal for some number of traces and DAG size.
    pub fn goal(&self, traces: usize, size: usize) -> f64 {
        self.base + self.per_trace * traces as f64 + self.per_node * size as f64
    }

    /// False if the goal is above `1`, which no score reaches.
    pub fn is_reachable(&self, traces: usize, size: usize) -> bool {
        self.goal(traces, size) <= 1.0 + 1e-9
    }

    /// True if the goal is to classify everything correctly, regardless of
    /// the sample and the DAG.
    pub fn is_trivial(&self) -> bool {
        self.base >= 1.0 && self.per_trace == 0.0 && self.per_node == 0.0
    }
}

impl FromStr for ScoreGoal {
    type Err = Error;
    fn from_str(s: &str) -> Res<Self> {
        let mut goal = ScoreGoal {
            base: 0.0,
            per_trace: 0.0,
            per_node: 0.0,
        };
        let s = s.trim();
        if s.is_empty() {
            bail!("empty score goal")
        }

        // Splits on signs, keeping them with the term they start.
        let mut terms = vec![];
        let mut start = 0;
        for (idx, c) in s.char_indices() {
            if (c == '+' || c == '-') && idx > 0 {
                terms.push(&s[start..idx]);
                start = idx
            }
        }
        terms.push(&s[start..]);

        for term in terms {
            let (sign, body) = match term.chars().next() {
                Some('+') => (1.0, &term[1..]),
                Some('-') => (-1.0, &term[1..]),
                _ => (1.0, term),
            };
            let body = body.trim();
            let (num, coef) = if let Some(num) = body.strip_suffix('T') {
                (num, &mut goal.per_trace)
            } else if let Some(num) = body.strip_suffix('I') {
                (num, &mut goal.per_node)
            } else {
                (body, &mut goal.base)
            };
            match num.trim().parse::<f64>() {
                Ok(val) if val.is_finite() => *coef += sign * val,
                _ => bail!("invalid goal term `{}` in `{}`", term, s),
            }
        }
        Ok(goal)
    }
}

impl fmt::Display for ScoreGoal {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        let mut empty = true;
        for (coef, suffix) in &[
            (self.base, ""),
            (self.per_trace, "T"),
            (self.per_node, "I"),
        ] {
            if *coef == 0.0 {
                continue;
            }
            if *coef > 0.0 && !empty {
                write!(fmt, "+")?
            }
            write!(fmt, "{}{}", coef, suffix)?;
            empty = false
        }
        if empty {
            write!(fmt, "0")?
        }
        Ok(())
    }
}
