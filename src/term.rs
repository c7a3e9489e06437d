//! Arithmetic terms over signals, the atoms of SLTL.
//!
//! Terms are written in prefix notation: `s<k>` is signal `k`, `c<k>` is
//! the learned constant `k`, and `+(l,r)`, `-(l,r)`, `*(l,r)` are
//! arithmetic applications. An atom compares two terms: `<(l,r)`, `>(l,r)`,
//! `=(l,r)` or `!(l,r)`.
//!
//! Signals are intervals, so terms evaluate to intervals. An atom has an
//! all-path robustness (worst case over the intervals) and an any-path one
//! (best case).

use std::fmt;

use crate::{
    common::*,
    domain::{Domain, Robustness},
    expr::{self, Expr},
    trace::{split_top, Interval},
};

/// Name of the SMT constant of a learned constant.
pub fn const_name(idx: usize) -> String {
    format!("c_{}", idx)
}

/// Arithmetic operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arith {
    /// Addition.
    Add,
    /// Subtraction.
    Sub,
    /// Multiplication.
    Mul,
}

/// Comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cmp {
    /// Less than.
    Lt,
    /// Greater than.
    Gt,
    /// Equal.
    Eq,
    /// Different.
    Ne,
}

/// Arithmetic terms.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Term {
    /// A signal.
    Signal(usize),
    /// A learned constant.
    Const(usize),
    /// An application.
    App {
        /// Operator.
        op: Arith,
        /// Left operand.
        lhs: Box<Term>,
        /// Right operand.
        rhs: Box<Term>,
    },
}

/// Splits `op(lhs,rhs)` into its three parts.
fn split_app(s: &str) -> Res<(&str, &str, &str)> {
    let open = match s.find('(') {
        Some(pos) => pos,
        None => bail!("expected `(` in `{}`", s),
    };
    let (op, args) = (s[..open].trim(), s[open + 1..].trim());
    let args = match args.strip_suffix(')') {
        Some(args) => args,
        None => bail!("expected `)` at the end of `{}`", s),
    };
    match split_top(args, ',').as_slice() {
        [lhs, rhs] => Ok((op, lhs.trim(), rhs.trim())),
        _ => bail!("expected two arguments in `{}`", s),
    }
}

/// Parses the index of a leaf such as `s3`.
fn leaf_idx(s: &str) -> Res<usize> {
    s[1..]
        .parse::<usize>()
        .chain_err(|| format!("illegal index in `{}`", s))
}

impl Term {
    /// Parses a term.
    pub fn parse(s: &str) -> Res<Term> {
        let s = s.trim();
        if s.starts_with('s') && !s.contains('(') {
            return Ok(Term::Signal(leaf_idx(s)?));
        }
        if s.starts_with('c') && !s.contains('(') {
            return Ok(Term::Const(leaf_idx(s)?));
        }
        let (op, lhs, rhs) = split_app(s)?;
        let op = match op {
            "+" => Arith::Add,
            "-" => Arith::Sub,
            "*" => Arith::Mul,
            _ => bail!("unknown arithmetic operator `{}`", op),
        };
        Ok(Term::App {
            op,
            lhs: Box::new(Term::parse(lhs)?),
            rhs: Box::new(Term::parse(rhs)?),
        })
    }

    /// Largest signal index mentioned, if any.
    pub fn max_signal(&self) -> Option<usize> {
        match self {
            Term::Signal(idx) => Some(*idx),
            Term::Const(_) => None,
            Term::App { lhs, rhs, .. } => lhs.max_signal().max(rhs.max_signal()),
        }
    }

    /// Largest constant index mentioned, if any.
    pub fn max_const(&self) -> Option<usize> {
        match self {
            Term::Signal(_) => None,
            Term::Const(idx) => Some(*idx),
            Term::App { lhs, rhs, .. } => lhs.max_const().max(rhs.max_const()),
        }
    }

    /// Lower and upper bounds of the term on a letter.
    pub fn bounds(&self, letter: &[Interval]) -> Res<(Expr, Expr)> {
        match self {
            Term::Signal(idx) => match letter.get(*idx) {
                Some((lo, hi)) => Ok((expr::real(lo.clone()), expr::real(hi.clone()))),
                None => bail!("signal s{} is not defined by a letter of width {}", idx, letter.len()),
            },
            Term::Const(idx) => {
                let c = expr::var(const_name(*idx));
                Ok((c.clone(), c))
            }
            Term::App { op, lhs, rhs } => {
                let (l_lo, l_hi) = lhs.bounds(letter)?;
                let (r_lo, r_hi) = rhs.bounds(letter)?;
                let res = match op {
                    Arith::Add => (
                        expr::add(vec![l_lo, r_lo]),
                        expr::add(vec![l_hi, r_hi]),
                    ),
                    Arith::Sub => (
                        expr::sub(vec![l_lo, r_hi]),
                        expr::sub(vec![l_hi, r_lo]),
                    ),
                    Arith::Mul => {
                        let products = [
                            expr::mul(vec![l_lo.clone(), r_lo.clone()]),
                            expr::mul(vec![l_lo, r_hi.clone()]),
                            expr::mul(vec![l_hi.clone(), r_lo]),
                            expr::mul(vec![l_hi, r_hi]),
                        ];
                        let lo = products[1..]
                            .iter()
                            .fold(products[0].clone(), |acc, p| Robustness::min(acc, p.clone()));
                        let hi = products[1..]
                            .iter()
                            .fold(products[0].clone(), |acc, p| Robustness::max(acc, p.clone()));
                        (lo, hi)
                    }
                };
                Ok(res)
            }
        }
    }

    /// Writes the term with the values of the constants in a model.
    pub fn write<W: fmt::Write>(&self, w: &mut W, model: &Model) -> fmt::Result {
        match self {
            Term::Signal(idx) => write!(w, "s{}", idx),
            Term::Const(idx) => match model.get(&const_name(*idx)) {
                Some(val) => write!(w, "c{}({})", idx, val.pretty()),
                None => write!(w, "c{}", idx),
            },
            Term::App { op, lhs, rhs } => {
                write!(w, "(")?;
                lhs.write(w, model)?;
                let op = match op {
                    Arith::Add => '+',
                    Arith::Sub => '-',
                    Arith::Mul => '*',
                };
                write!(w, "{}", op)?;
                rhs.write(w, model)?;
                write!(w, ")")
            }
        }
    }
}

/// An SLTL atom.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Atom {
    /// Comparison.
    pub cmp: Cmp,
    /// Left term.
    pub lhs: Term,
    /// Right term.
    pub rhs: Term,
}
impl Atom {
    /// Parses an atom.
    pub fn parse(s: &str) -> Res<Atom> {
        let (cmp, lhs, rhs) = split_app(s.trim())?;
        let cmp = match cmp {
            "<" => Cmp::Lt,
            ">" => Cmp::Gt,
            "=" => Cmp::Eq,
            "!" => Cmp::Ne,
            _ => bail!("unknown comparison `{}`", cmp),
        };
        Ok(Atom {
            cmp,
            lhs: Term::parse(lhs)?,
            rhs: Term::parse(rhs)?,
        })
    }

    /// Largest signal index mentioned, if any.
    pub fn max_signal(&self) -> Option<usize> {
        self.lhs.max_signal().max(self.rhs.max_signal())
    }
    /// Largest constant index mentioned, if any.
    pub fn max_const(&self) -> Option<usize> {
        self.lhs.max_const().max(self.rhs.max_const())
    }

    /// Robustness on a letter, all-path if `forall`, any-path otherwise.
    pub fn robustness(&self, letter: &[Interval], forall: bool) -> Res<Expr> {
        let (l_lo, l_hi) = self.lhs.bounds(letter)?;
        let (r_lo, r_hi) = self.rhs.bounds(letter)?;
        let (lt, gt) = if forall {
            (expr::sub(vec![r_lo, l_hi]), expr::sub(vec![l_lo, r_hi]))
        } else {
            (expr::sub(vec![r_hi, l_lo]), expr::sub(vec![l_hi, r_lo]))
        };
        let res = match self.cmp {
            Cmp::Lt => lt,
            Cmp::Gt => gt,
            Cmp::Eq => Robustness::min(lt, gt),
            Cmp::Ne => Robustness::max(lt, gt),
        };
        Ok(res)
    }

    /// String representation with the values of the constants in a model.
    pub fn to_string_in(&self, model: &Model) -> String {
        let mut s = String::new();
        let _ = self.write(&mut s, model);
        s
    }
    fn write<W: fmt::Write>(&self, w: &mut W, model: &Model) -> fmt::Result {
        write!(w, "(")?;
        self.lhs.write(w, model)?;
        let cmp = match self.cmp {
            Cmp::Lt => '<',
            Cmp::Gt => '>',
            Cmp::Eq => '=',
            Cmp::Ne => '!',
        };
        write!(w, "{}", cmp)?;
        self.rhs.write(w, model)?;
        write!(w, ")")
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn rat(n: i64) -> Rat {
        Rat::from_integer(Int::from(n))
    }
    fn val_of(e: &Expr, model: &Model) -> Rat {
        expr::eval(e, model).unwrap().to_rat().unwrap()
    }

    #[test]
    fn parsing() {
        let atom = Atom::parse("<(+(s0,c1),*(s1,-(c0,s2)))").unwrap();
        assert_eq!(atom.cmp, Cmp::Lt);
        assert_eq!(atom.max_signal(), Some(2));
        assert_eq!(atom.max_const(), Some(1));
        assert!(Atom::parse("?(s0,s1)").is_err());
        assert!(Atom::parse("<(s0)").is_err());
        assert!(Atom::parse("<(s0,x1)").is_err());
        assert!(Term::parse("sx").is_err());
    }

    #[test]
    fn interval_robustness() {
        // s0 in [1, 3], s1 in [4, 5].
        let letter = vec![(rat(1), rat(3)), (rat(4), rat(5))];
        let model = Model::new();
        let atom = Atom::parse("<(s0,s1)").unwrap();
        assert_eq!(val_of(&atom.robustness(&letter, true).unwrap(), &model), rat(1));
        assert_eq!(val_of(&atom.robustness(&letter, false).unwrap(), &model), rat(4));
        let atom = Atom::parse(">(s0,s1)").unwrap();
        assert_eq!(val_of(&atom.robustness(&letter, true).unwrap(), &model), rat(-4));
        assert_eq!(val_of(&atom.robustness(&letter, false).unwrap(), &model), rat(-1));
        // s0 - s1 in [-4, -1]; times s0 in [-12, -1].
        let atom = Atom::parse(">(*(-(s0,s1),s0),s1)").unwrap();
        assert_eq!(val_of(&atom.robustness(&letter, true).unwrap(), &model), rat(-17));
    }

    #[test]
    fn constants() {
        let letter = vec![(rat(2), rat(2))];
        let atom = Atom::parse("<(s0,c0)").unwrap();
        let mut model = Model::new();
        let _ = model.insert(const_name(0), Val::R(rat(5)));
        assert_eq!(val_of(&atom.robustness(&letter, true).unwrap(), &model), rat(3));
        assert_eq!(atom.to_string_in(&model), "(s0<c0(5))");
        assert_eq!(atom.to_string_in(&Model::new()), "(s0<c0)");
    }
}
