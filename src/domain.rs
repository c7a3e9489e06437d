//! Valuation domains.
//!
//! The temporal operator equations are written once, over a domain
//! providing negation, max and min. In the boolean domain these are `not`,
//! `or` and `and`, and the any-path and all-path valuations coincide. In the
//! robustness domain they are numeric and the two valuations differ.

use crate::expr::{self, Expr};

/// A valuation domain.
pub trait Domain {
    /// SMT sort of the values.
    const SORT: &'static str;
    /// True if any-path and all-path valuations are the same.
    const COLLAPSED: bool;
    /// Name, for logging.
    const NAME: &'static str;

    /// Negation.
    fn neg(e: Expr) -> Expr;
    /// Maximum.
    fn max(lhs: Expr, rhs: Expr) -> Expr;
    /// Minimum.
    fn min(lhs: Expr, rhs: Expr) -> Expr;
    /// Constraint stating that a value means satisfaction.
    fn holds(e: Expr) -> Expr;
    /// Constraint stating that a value means violation.
    fn fails(e: Expr) -> Expr;
}

/// Boolean domain, used for LTL.
#[derive(Debug, Clone, Copy)]
pub struct Boolean;
impl Domain for Boolean {
    const SORT: &'static str = "Bool";
    const COLLAPSED: bool = true;
    const NAME: &'static str = "boolean";

    fn neg(e: Expr) -> Expr {
        expr::not(e)
    }
    fn max(lhs: Expr, rhs: Expr) -> Expr {
        expr::or(vec![lhs, rhs])
    }
    fn min(lhs: Expr, rhs: Expr) -> Expr {
        expr::and(vec![lhs, rhs])
    }
    fn holds(e: Expr) -> Expr {
        e
    }
    fn fails(e: Expr) -> Expr {
        expr::not(e)
    }
}

/// Real-valued robustness domain, used for SLTL.
///
/// Positive robustness means satisfaction.
#[derive(Debug, Clone, Copy)]
pub struct Robustness;
impl Robustness {
    fn zero() -> Expr {
        expr::real(crate::common::Rat::from_integer(0.into()))
    }
}
impl Domain for Robustness {
    const SORT: &'static str = "Real";
    const COLLAPSED: bool = false;
    const NAME: &'static str = "robustness";

    fn neg(e: Expr) -> Expr {
        expr::neg(e)
    }
    fn max(lhs: Expr, rhs: Expr) -> Expr {
        if lhs == rhs {
            return lhs;
        }
        expr::ite(expr::ge(lhs.clone(), rhs.clone()), lhs, rhs)
    }
    fn min(lhs: Expr, rhs: Expr) -> Expr {
        if lhs == rhs {
            return lhs;
        }
        expr::ite(expr::le(lhs.clone(), rhs.clone()), lhs, rhs)
    }
    fn holds(e: Expr) -> Expr {
        expr::gt(e, Self::zero())
    }
    fn fails(e: Expr) -> Expr {
        expr::le(e, Self::zero())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::common::*;

    fn rat(n: i64) -> Expr {
        expr::real(Rat::from_integer(Int::from(n)))
    }

    #[test]
    fn robustness_folds_on_constants() {
        assert_eq!(Robustness::max(rat(2), rat(-1)), rat(2));
        assert_eq!(Robustness::min(rat(2), rat(-1)), rat(-1));
        assert_eq!(Robustness::neg(rat(2)), rat(-2));
        assert_eq!(Robustness::holds(rat(0)), expr::fls());
        assert_eq!(Robustness::fails(rat(0)), expr::tru());
    }

    #[test]
    fn boolean() {
        let x = expr::var("x");
        assert_eq!(Boolean::max(x.clone(), expr::fls()), x);
        assert_eq!(Boolean::min(x.clone(), expr::fls()), expr::fls());
        assert_eq!(Boolean::fails(Boolean::neg(x.clone())), x);
    }
}
