//! Solver-related types and the solving engine abstraction.

use std::{fmt, io::BufRead, str::FromStr};

use rsmt2::parse::{ExprParser, IdentParser, SmtParser, ValueParser};

use crate::{common::*, expr, expr::Expr};

/// A concrete value from a model.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Val {
    /// Boolean.
    B(bool),
    /// Integer.
    I(Int),
    /// Rational.
    R(Rat),
}
impl Val {
    /// Boolean value, if any.
    pub fn to_bool(&self) -> Option<bool> {
        match self {
            Val::B(b) => Some(*b),
            _ => None,
        }
    }
    /// Numeric value, as a rational.
    pub fn to_rat(&self) -> Option<Rat> {
        match self {
            Val::B(_) => None,
            Val::I(i) => Some(Rat::from_integer(i.clone())),
            Val::R(r) => Some(r.clone()),
        }
    }
    /// Integer value, if any.
    pub fn to_int(&self) -> Option<Int> {
        match self {
            Val::I(i) => Some(i.clone()),
            Val::R(r) if r.is_integer() => Some(r.to_integer()),
            _ => None,
        }
    }

    /// Negation: boolean not, numeric opposite.
    pub fn neg(&self) -> Val {
        match self {
            Val::B(b) => Val::B(!b),
            Val::I(i) => Val::I(-i),
            Val::R(r) => Val::R(-r),
        }
    }
    /// Maximum: boolean or, numeric max.
    pub fn max(self, other: Val) -> Res<Val> {
        self.merge(other, true)
    }
    /// Minimum: boolean and, numeric min.
    pub fn min(self, other: Val) -> Res<Val> {
        self.merge(other, false)
    }
    fn merge(self, other: Val, max: bool) -> Res<Val> {
        match (self, other) {
            (Val::B(b1), Val::B(b2)) => Ok(Val::B(if max { b1 || b2 } else { b1 && b2 })),
            (Val::B(b), other) | (other, Val::B(b)) => {
                bail!("cannot merge boolean {} with numeric {}", b, other)
            }
            (v1, v2) => {
                let (r1, r2) = (v1.to_rat(), v2.to_rat());
                if (r1 >= r2) == max {
                    Ok(v1)
                } else {
                    Ok(v2)
                }
            }
        }
    }

    /// True if the value is `true` or strictly positive.
    pub fn holds(&self) -> bool {
        match self {
            Val::B(b) => *b,
            Val::I(i) => i.is_positive(),
            Val::R(r) => r.is_positive(),
        }
    }

    /// Human-friendly representation, `3/2` instead of `(/ 3.0 2.0)`.
    pub fn pretty(&self) -> String {
        match self {
            Val::B(b) => b.to_string(),
            Val::I(i) => i.to_string(),
            Val::R(r) => r.to_string(),
        }
    }
}
impl fmt::Display for Val {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Val::B(b) => write!(fmt, "{}", b),
            Val::I(i) => {
                if i.is_negative() {
                    write!(fmt, "(- {})", -i)
                } else {
                    write!(fmt, "{}", i)
                }
            }
            Val::R(r) => {
                let (num, den) = (r.numer().abs(), r.denom());
                let abs = if den.is_one() {
                    format!("{}.0", num)
                } else {
                    format!("(/ {}.0 {}.0)", num, den)
                };
                if r.is_negative() {
                    write!(fmt, "(- {})", abs)
                } else {
                    write!(fmt, "{}", abs)
                }
            }
        }
    }
}
impl From<bool> for Val {
    fn from(b: bool) -> Val {
        Val::B(b)
    }
}
impl From<Int> for Val {
    fn from(i: Int) -> Val {
        Val::I(i)
    }
}
impl From<Rat> for Val {
    fn from(r: Rat) -> Val {
        Val::R(r)
    }
}

/// Parses a decimal number such as `7`, `-2` or `1.25`.
pub fn parse_decimal(s: &str) -> Option<Rat> {
    let (neg, s) = match s.strip_prefix('-') {
        Some(s) => (true, s),
        None => (false, s),
    };
    let (int, dec) = match s.find('.') {
        Some(pos) => (&s[..pos], &s[pos + 1..]),
        None => (s, ""),
    };
    if int.is_empty() || !int.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if !dec.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let num: Int = format!("{}{}", int, dec).parse().ok()?;
    let den = num::pow(Int::from(10), dec.len());
    let res = Rat::new(num, den);
    Some(if neg { -res } else { res })
}

/// A model: values of the variables asked for.
pub type Model = HashMap<String, Val>;

/// Parser for the output of the SMT solver.
///
/// Parses idents and expressions as strings, and values as [`Val`]s with
/// the parser of `rsmt2`.
#[derive(Clone, Copy)]
pub struct Parser;

impl<'a> IdentParser<String, (), &'a str> for Parser {
    fn parse_ident(self, input: &'a str) -> SmtRes<String> {
        Ok(input.into())
    }
    fn parse_type(self, _: &'a str) -> SmtRes<()> {
        Ok(())
    }
}

impl<'a> ExprParser<String, (), &'a str> for Parser {
    fn parse_expr(self, input: &'a str, _: ()) -> SmtRes<String> {
        Ok(input.into())
    }
}

impl<'a, Br> ValueParser<Val, &'a mut SmtParser<Br>> for Parser
where
    Br: BufRead,
{
    fn parse_value(self, input: &'a mut SmtParser<Br>) -> SmtRes<Val> {
        if let Some(val) = input.try_int::<_, _, ::num::bigint::ParseBigIntError>(|int, pos| {
            let int = Int::from_str(int)?;
            Ok(if !pos { -int } else { int })
        })? {
            Ok(Val::I(val))
        } else if let Some(val) = input.try_bool()? {
            Ok(Val::B(val))
        } else if let Some(val) = input.try_rat::<_, _, String>(|num, den, pos| {
            let (num, den) = match (parse_decimal(num), parse_decimal(den)) {
                (Some(num), Some(den)) if !den.is_zero() => (num, den),
                _ => return Err(format!("illegal rational `{}/{}`", num, den)),
            };
            let rat = num / den;
            Ok(if !pos { -rat } else { rat })
        })? {
            Ok(Val::R(val))
        } else {
            input.fail_with("unexpected value")
        }
    }
}

/// Declarations and assertions of one encoding step.
#[derive(Debug, Clone, Default)]
pub struct Encoding {
    /// Constants to declare, with their sort.
    pub decls: Vec<(String, &'static str)>,
    /// Constraints.
    pub asserts: Vec<Expr>,
}
impl Encoding {
    /// Empty encoding.
    pub fn new() -> Self {
        Self::default()
    }
    /// Adds a declaration.
    pub fn declare<S: Into<String>>(&mut self, name: S, sort: &'static str) {
        self.decls.push((name.into(), sort))
    }
    /// Adds an assertion, ignores `true`.
    pub fn assert(&mut self, expr: Expr) {
        if expr.bool_val() != Some(true) {
            self.asserts.push(expr)
        }
    }
}

/// Result of a check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckRes {
    /// Satisfiable, a model is available.
    Sat,
    /// Unsatisfiable.
    Unsat,
    /// The engine gave up.
    Unknown,
}

/// Solving engine: satisfiability and optimization.
pub trait SolveEngine {
    /// Declares a constant.
    fn declare(&mut self, name: &str, sort: &str) -> Res<()>;
    /// Asserts a constraint in the current scope.
    fn add(&mut self, expr: &Expr) -> Res<()>;
    /// Adds a soft constraint with a weight.
    fn add_soft(&mut self, expr: &Expr, weight: usize) -> Res<()>;
    /// Registers an integer objective to maximize.
    fn add_maximize(&mut self, expr: &Expr) -> Res<()>;
    /// Checks satisfiability, optimizing the objectives if any.
    fn check(&mut self) -> Res<CheckRes>;
    /// Values of some variables, after a `Sat` check.
    fn get_model(&mut self, names: &[String]) -> Res<Model>;
    /// Opens a scope.
    fn push(&mut self) -> Res<()>;
    /// Closes a scope.
    fn pop(&mut self) -> Res<()>;

    /// Declares and asserts an encoding.
    fn encode(&mut self, encoding: &Encoding) -> Res<()> {
        for (name, sort) in &encoding.decls {
            self.declare(name, sort)?
        }
        for expr in &encoding.asserts {
            self.add(expr)?
        }
        Ok(())
    }
}

/// Solving engine over an `rsmt2` solver.
///
/// Objectives are maximized by strengthening: after a satisfiable check the
/// engine asks for a strictly better objective value until the solver says
/// unsat, and then asserts the optimum in the current scope. So only plain
/// `check-sat` is needed from the solver.
pub struct Engine {
    /// Underlying solver.
    solver: Solver<Parser>,
    /// Objective terms, summed.
    objective: Vec<Expr>,
    /// Length of the objective when scopes were opened.
    scopes: Vec<usize>,
}
impl Engine {
    /// Constructor.
    pub fn new(solver: Solver<Parser>) -> Self {
        Engine {
            solver,
            objective: vec![],
            scopes: vec![],
        }
    }

    /// Spawns a solver and wraps it.
    pub fn spawn(conf: &SmtConf, name: &str, out_dir: &str) -> Res<Self> {
        let solver = conf.spawn(name, Parser, out_dir)?;
        Ok(Self::new(solver))
    }

    /// Kills the underlying solver.
    pub fn kill(mut self) -> Res<()> {
        self.solver.kill().chain_err(|| "while killing solver")
    }

    /// Value of an integer expression in the current model.
    fn value_of(&mut self, expr: &Expr) -> Res<Int> {
        let expr = expr.to_string();
        let values: Vec<(String, Val)> = self.solver.get_values(&[expr.clone()])?;
        for (_, val) in values {
            if let Some(int) = val.to_int() {
                return Ok(int);
            }
            bail!("objective `{}` has non-integer value {}", expr, val)
        }
        bail!("solver did not provide the value of `{}`", expr)
    }

    fn check_sat(&mut self) -> Res<CheckRes> {
        let res = match self.solver.check_sat_or_unk()? {
            Some(true) => CheckRes::Sat,
            Some(false) => CheckRes::Unsat,
            None => CheckRes::Unknown,
        };
        Ok(res)
    }
}

impl SolveEngine for Engine {
    fn declare(&mut self, name: &str, sort: &str) -> Res<()> {
        self.solver.declare_const(name, sort)?;
        Ok(())
    }

    fn add(&mut self, expr: &Expr) -> Res<()> {
        self.solver.assert(&expr.to_string())?;
        Ok(())
    }

    fn add_soft(&mut self, expr: &Expr, weight: usize) -> Res<()> {
        let term = expr::ite(expr.clone(), expr::int(weight), expr::int(0));
        self.objective.push(term);
        Ok(())
    }

    fn add_maximize(&mut self, expr: &Expr) -> Res<()> {
        self.objective.push(expr.clone());
        Ok(())
    }

    fn check(&mut self) -> Res<CheckRes> {
        let first = self.check_sat()?;
        if first != CheckRes::Sat || self.objective.is_empty() {
            return Ok(first);
        }

        let objective = expr::add(self.objective.clone());
        let mut best = self.value_of(&objective)?;
        log! { @debug "objective at {}", best }

        self.solver.push(1)?;
        loop {
            self.add(&expr::gt(objective.clone(), expr::int(best.clone())))?;
            match self.check_sat()? {
                CheckRes::Sat => {
                    best = self.value_of(&objective)?;
                    log! { @debug "objective improved to {}", best }
                }
                CheckRes::Unsat => break,
                CheckRes::Unknown => {
                    warn!("solver gave up while optimizing, keeping objective {}", best);
                    break;
                }
            }
        }
        self.solver.pop(1)?;

        self.add(&expr::ge(objective, expr::int(best)))?;
        self.check_sat()
    }

    fn get_model(&mut self, names: &[String]) -> Res<Model> {
        let mut model = Model::with_capacity(names.len());
        if names.is_empty() {
            return Ok(model);
        }
        let values: Vec<(String, Val)> = self.solver.get_values(names)?;
        for (name, val) in values {
            let _ = model.insert(name, val);
        }
        Ok(model)
    }

    fn push(&mut self) -> Res<()> {
        self.scopes.push(self.objective.len());
        self.solver.push(1)?;
        Ok(())
    }

    fn pop(&mut self) -> Res<()> {
        if let Some(len) = self.scopes.pop() {
            self.objective.truncate(len)
        }
        self.solver.pop(1)?;
        Ok(())
    }
}
