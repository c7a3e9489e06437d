//! Hash-consed SMT-LIB expressions.
//!
//! Constructors fold constants where it is cheap, so that encodings over
//! concrete trace values stay small.

use std::fmt;

use crate::common::*;

pub mod chain;
pub mod eval;

pub use self::chain::{reduce, reduce_filtered};
pub use self::eval::eval;

hashconsing::consign! {
    /// Expression factory.
    let factory = consign(1_000) for RExpr ;
}

/// A hash-consed expression.
pub type Expr = HConsed<RExpr>;

/// Operators.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub enum Op {
    /// Negation.
    Not,
    /// Conjunction.
    And,
    /// Disjunction.
    Or,
    /// Implication.
    Impl,
    /// If-then-else.
    Ite,
    /// Equal to.
    Eq,
    /// Less than or equal to.
    Le,
    /// Less than.
    Lt,
    /// Greater than or equal to.
    Ge,
    /// Greater than.
    Gt,
    /// Addition.
    Add,
    /// Subtraction, opposite if unary.
    Sub,
    /// Multiplication.
    Mul,
}
impl Op {
    /// String representation.
    pub fn as_str(self) -> &'static str {
        use self::Op::*;
        match self {
            Not => "not",
            And => "and",
            Or => "or",
            Impl => "=>",
            Ite => "ite",
            Eq => "=",
            Le => "<=",
            Lt => "<",
            Ge => ">=",
            Gt => ">",
            Add => "+",
            Sub => "-",
            Mul => "*",
        }
    }
}
impl fmt::Display for Op {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        fmt.write_str(self.as_str())
    }
}

/// Expressions.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub enum RExpr {
    /// A variable.
    Var(String),
    /// A boolean constant.
    Bool(bool),
    /// An integer constant.
    Int(Int),
    /// A real constant.
    Real(Rat),
    /// An operator application.
    App {
        /// The operator.
        op: Op,
        /// The arguments.
        args: Vec<Expr>,
    },
    /// Parallel let-bindings.
    Let {
        /// Bindings.
        binds: Vec<(String, Expr)>,
        /// Body.
        body: Expr,
    },
}
impl RExpr {
    /// Boolean value of a constant.
    pub fn bool_val(&self) -> Option<bool> {
        match self {
            RExpr::Bool(b) => Some(*b),
            _ => None,
        }
    }
    /// Numeric value of a constant.
    pub fn num_val(&self) -> Option<Val> {
        match self {
            RExpr::Int(i) => Some(Val::I(i.clone())),
            RExpr::Real(r) => Some(Val::R(r.clone())),
            _ => None,
        }
    }
    /// Variable name, if any.
    pub fn var_name(&self) -> Option<&str> {
        match self {
            RExpr::Var(name) => Some(name),
            _ => None,
        }
    }
}

impl fmt::Display for RExpr {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        match self {
            RExpr::Var(name) => fmt.write_str(name),
            RExpr::Bool(b) => write!(fmt, "{}", b),
            RExpr::Int(i) => write!(fmt, "{}", Val::I(i.clone())),
            RExpr::Real(r) => write!(fmt, "{}", Val::R(r.clone())),
            RExpr::App { op, args } => {
                write!(fmt, "({}", op)?;
                for arg in args {
                    write!(fmt, " {}", arg)?
                }
                write!(fmt, ")")
            }
            RExpr::Let { binds, body } => {
                write!(fmt, "(let (")?;
                for (name, expr) in binds {
                    write!(fmt, " ({} {})", name, expr)?
                }
                write!(fmt, " ) {})", body)
            }
        }
    }
}

/// Creates an expression.
#[inline]
pub fn mk(expr: RExpr) -> Expr {
    factory.mk(expr)
}

/// Creates a variable.
#[inline]
pub fn var<S: Into<String>>(name: S) -> Expr {
    mk(RExpr::Var(name.into()))
}
/// Creates a boolean.
#[inline]
pub fn bool(b: bool) -> Expr {
    mk(RExpr::Bool(b))
}
/// Creates `true`.
#[inline]
pub fn tru() -> Expr {
    bool(true)
}
/// Creates `false`.
#[inline]
pub fn fls() -> Expr {
    bool(false)
}
/// Creates an integer constant.
#[inline]
pub fn int<I: Into<Int>>(i: I) -> Expr {
    mk(RExpr::Int(i.into()))
}
/// Creates a real constant.
#[inline]
pub fn real<R: Into<Rat>>(r: R) -> Expr {
    mk(RExpr::Real(r.into()))
}
/// Creates a numeric constant from a value.
fn num(val: Val) -> Expr {
    match val {
        Val::B(b) => bool(b),
        Val::I(i) => int(i),
        Val::R(r) => real(r),
    }
}

/// Creates an application, no simplification.
#[inline]
pub fn app(op: Op, args: Vec<Expr>) -> Expr {
    mk(RExpr::App { op, args })
}

/// Negation.
pub fn not(e: Expr) -> Expr {
    if let Some(b) = e.bool_val() {
        return bool(!b);
    }
    if let RExpr::App { op: Op::Not, args } = e.get() {
        if args.len() == 1 {
            return args[0].clone();
        }
    }
    app(Op::Not, vec![e])
}

/// Conjunction, drops `true`s and short-circuits on `false`.
pub fn and(args: Vec<Expr>) -> Expr {
    let mut kept = Vec::with_capacity(args.len());
    for arg in args {
        match arg.bool_val() {
            Some(true) => (),
            Some(false) => return fls(),
            None => kept.push(arg),
        }
    }
    match kept.len() {
        0 => tru(),
        1 => kept.pop().unwrap_or_else(tru),
        _ => app(Op::And, kept),
    }
}

/// Disjunction, drops `false`s and short-circuits on `true`.
pub fn or(args: Vec<Expr>) -> Expr {
    let mut kept = Vec::with_capacity(args.len());
    for arg in args {
        match arg.bool_val() {
            Some(false) => (),
            Some(true) => return tru(),
            None => kept.push(arg),
        }
    }
    match kept.len() {
        0 => fls(),
        1 => kept.pop().unwrap_or_else(fls),
        _ => app(Op::Or, kept),
    }
}

/// Implication.
pub fn implies(lhs: Expr, rhs: Expr) -> Expr {
    match (lhs.bool_val(), rhs.bool_val()) {
        (Some(false), _) | (_, Some(true)) => tru(),
        (Some(true), _) => rhs,
        (_, Some(false)) => not(lhs),
        _ => app(Op::Impl, vec![lhs, rhs]),
    }
}

/// If-then-else.
pub fn ite(cnd: Expr, thn: Expr, els: Expr) -> Expr {
    match cnd.bool_val() {
        Some(true) => thn,
        Some(false) => els,
        None if thn == els => thn,
        None => app(Op::Ite, vec![cnd, thn, els]),
    }
}

/// Compares two numeric constants.
fn cmp_consts(lhs: &Expr, rhs: &Expr) -> Option<::std::cmp::Ordering> {
    let (lhs, rhs) = (lhs.num_val()?.to_rat()?, rhs.num_val()?.to_rat()?);
    Some(lhs.cmp(&rhs))
}

/// Equality.
pub fn eq(lhs: Expr, rhs: Expr) -> Expr {
    if lhs == rhs {
        return tru();
    }
    match (lhs.bool_val(), rhs.bool_val()) {
        (Some(b1), Some(b2)) => return bool(b1 == b2),
        (Some(true), None) => return rhs,
        (None, Some(true)) => return lhs,
        (Some(false), None) => return not(rhs),
        (None, Some(false)) => return not(lhs),
        (None, None) => (),
    }
    if let Some(ord) = cmp_consts(&lhs, &rhs) {
        return bool(ord == ::std::cmp::Ordering::Equal);
    }
    app(Op::Eq, vec![lhs, rhs])
}

macro_rules! comparison {
    ($( $(#[$meta:meta])* $fun:ident => $op:ident, $test:expr ;)*) => {$(
        $(#[$meta])*
        pub fn $fun(lhs: Expr, rhs: Expr) -> Expr {
            if let Some(ord) = cmp_consts(&lhs, &rhs) {
                let test: fn(::std::cmp::Ordering) -> bool = $test;
                bool(test(ord))
            } else {
                app(Op::$op, vec![lhs, rhs])
            }
        }
    )*};
}
comparison! {
    /// Less than or equal to.
    le => Le, |ord| ord != ::std::cmp::Ordering::Greater ;
    /// Less than.
    lt => Lt, |ord| ord == ::std::cmp::Ordering::Less ;
    /// Greater than or equal to.
    ge => Ge, |ord| ord != ::std::cmp::Ordering::Less ;
    /// Greater than.
    gt => Gt, |ord| ord == ::std::cmp::Ordering::Greater ;
}

/// Folds numeric constants with some function, if all arguments are constants.
fn fold_consts<F>(args: &[Expr], f: F) -> Option<Expr>
where
    F: Fn(Rat, Rat) -> Rat,
{
    let mut real = false;
    let mut vals = Vec::with_capacity(args.len());
    for arg in args {
        match arg.get() {
            RExpr::Int(i) => vals.push(Rat::from_integer(i.clone())),
            RExpr::Real(r) => {
                real = true;
                vals.push(r.clone())
            }
            _ => return None,
        }
    }
    let mut vals = vals.into_iter();
    let first = vals.next()?;
    let res = vals.fold(first, f);
    Some(if real {
        num(Val::R(res))
    } else {
        num(Val::I(res.to_integer()))
    })
}

/// Addition.
pub fn add(args: Vec<Expr>) -> Expr {
    if let Some(res) = fold_consts(&args, |a, b| a + b) {
        return res;
    }
    match args.len() {
        0 => int(0),
        1 => args[0].clone(),
        _ => app(Op::Add, args),
    }
}

/// Subtraction.
pub fn sub(args: Vec<Expr>) -> Expr {
    if args.len() == 1 {
        return neg(args[0].clone());
    }
    if let Some(res) = fold_consts(&args, |a, b| a - b) {
        return res;
    }
    app(Op::Sub, args)
}

/// Opposite.
pub fn neg(e: Expr) -> Expr {
    match e.get() {
        RExpr::Int(i) => int(-i),
        RExpr::Real(r) => real(-r),
        _ => app(Op::Sub, vec![e]),
    }
}

/// Multiplication.
pub fn mul(args: Vec<Expr>) -> Expr {
    if let Some(res) = fold_consts(&args, |a, b| a * b) {
        return res;
    }
    match args.len() {
        1 => args[0].clone(),
        _ => app(Op::Mul, args),
    }
}

/// Parallel let-binding, returns the body if there are no bindings.
pub fn let_in(binds: Vec<(String, Expr)>, body: Expr) -> Expr {
    if binds.is_empty() {
        body
    } else {
        mk(RExpr::Let { binds, body })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn folding() {
        let x = var("x");
        assert_eq!(and(vec![tru(), x.clone()]), x);
        assert_eq!(and(vec![fls(), x.clone()]), fls());
        assert_eq!(and(vec![]), tru());
        assert_eq!(or(vec![fls(), fls()]), fls());
        assert_eq!(not(not(x.clone())), x);
        assert_eq!(ite(tru(), int(1), int(2)), int(1));
        assert_eq!(add(vec![int(1), int(2)]), int(3));
        assert_eq!(sub(vec![int(1), int(3)]), int(-2));
        assert_eq!(lt(int(1), real(Rat::from_integer(Int::from(2)))), tru());
        assert_eq!(eq(x.clone(), tru()), x);
        assert_eq!(implies(fls(), x.clone()), tru());
    }

    #[test]
    fn printing() {
        let (x, y) = (var("x"), var("y"));
        let e = and(vec![x.clone(), not(y.clone())]);
        assert_eq!(e.to_string(), "(and x (not y))");
        let e = let_in(vec![("a".into(), add(vec![x, int(-2)]))], gt(var("a"), y));
        assert_eq!(e.to_string(), "(let ( (a (+ x (- 2))) ) (> a y))");
        assert_eq!(real(Rat::new(Int::from(1), Int::from(2))).to_string(), "(/ 1.0 2.0)");
    }
}
