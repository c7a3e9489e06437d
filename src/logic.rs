//! Logics: LTL over boolean traces and SLTL over signal traces.
//!
//! A logic fixes the domain of the valuations, the fields of the letters,
//! and the meaning of the atoms on a letter.

use crate::{
    common::*,
    domain::{Boolean, Domain, Robustness},
    expr::{self, Expr},
    term::{const_name, Atom},
    trace::{self, Interval, Trace},
};

/// A logic.
pub trait Logic {
    /// Domain of the valuations.
    type Dom: Domain;
    /// Fields of the letters.
    type Field: Clone + ::std::fmt::Debug;

    /// Name, for logging.
    fn name(&self) -> &'static str;

    /// Parses a field of a letter.
    fn parse_field(&self, s: &str) -> Res<Self::Field>;

    /// Number of atoms.
    fn atom_count(&self) -> usize;

    /// Checks the traces can be used with this logic.
    fn check_traces(&self, traces: &[&Trace<Self::Field>]) -> Res<()>;

    /// Constants to declare, with their sort.
    fn decls(&self) -> Vec<(String, &'static str)>;

    /// Any-path and all-path values of an atom on a letter.
    fn atom(&self, atom: PrpIdx, letter: &[Self::Field]) -> Res<(Expr, Expr)>;

    /// String representation of an atom, in a model.
    fn atom_str(&self, atom: PrpIdx, model: &Model) -> String;

    /// Parses a trace.
    fn parse_trace(&self, s: &str) -> Res<Trace<Self::Field>> {
        Trace::parse(s, |field| self.parse_field(field))
    }
}

/// Plain LTL over boolean traces, atoms are the propositions.
#[derive(Debug, Clone)]
pub struct Ltl {
    /// Number of propositions.
    props: usize,
}
impl Ltl {
    /// Constructor.
    pub fn new(props: usize) -> Self {
        Ltl { props }
    }
}
impl Logic for Ltl {
    type Dom = Boolean;
    type Field = bool;

    fn name(&self) -> &'static str {
        "ltl"
    }

    fn parse_field(&self, s: &str) -> Res<bool> {
        trace::bool_field(s)
    }

    fn atom_count(&self) -> usize {
        self.props
    }

    fn check_traces(&self, traces: &[&Trace<bool>]) -> Res<()> {
        for trace in traces {
            if trace.width() != self.props {
                bail!(
                    "trace has {} proposition(s), expected {}",
                    trace.width(),
                    self.props
                )
            }
        }
        Ok(())
    }

    fn decls(&self) -> Vec<(String, &'static str)> {
        vec![]
    }

    fn atom(&self, atom: PrpIdx, letter: &[bool]) -> Res<(Expr, Expr)> {
        match letter.get(*atom) {
            Some(b) => {
                let val = expr::bool(*b);
                Ok((val.clone(), val))
            }
            None => bail!("proposition p{} is not defined by the letter", atom),
        }
    }

    fn atom_str(&self, atom: PrpIdx, _: &Model) -> String {
        format!("p{}", atom)
    }
}

/// Signal LTL, atoms are comparisons between arithmetic terms.
#[derive(Debug, Clone)]
pub struct Sltl {
    /// Atoms.
    atoms: PrpMap<Atom>,
    /// Number of learned constants.
    consts: usize,
}
impl Sltl {
    /// Constructor.
    pub fn new(atoms: Vec<Atom>) -> Self {
        let consts = atoms
            .iter()
            .filter_map(|atom| atom.max_const())
            .max()
            .map(|max| max + 1)
            .unwrap_or(0);
        Sltl {
            atoms: atoms.into(),
            consts,
        }
    }

    /// Parses some atoms.
    pub fn of_strs<S: AsRef<str>>(atoms: &[S]) -> Res<Self> {
        let mut parsed = Vec::with_capacity(atoms.len());
        for atom in atoms {
            parsed.push(Atom::parse(atom.as_ref())?)
        }
        Ok(Self::new(parsed))
    }

    /// Number of learned constants.
    pub fn const_count(&self) -> usize {
        self.consts
    }
}
impl Logic for Sltl {
    type Dom = Robustness;
    type Field = Interval;

    fn name(&self) -> &'static str {
        "sltl"
    }

    fn parse_field(&self, s: &str) -> Res<Interval> {
        trace::interval_field(s)
    }

    fn atom_count(&self) -> usize {
        self.atoms.len()
    }

    fn check_traces(&self, traces: &[&Trace<Interval>]) -> Res<()> {
        if self.atoms.len() == 0 {
            bail!("no atoms for signal traces")
        }
        let needed = self
            .atoms
            .iter()
            .filter_map(|atom| atom.max_signal())
            .max()
            .map(|max| max + 1)
            .unwrap_or(0);
        for trace in traces {
            if trace.width() < needed {
                bail!(
                    "trace has {} signal(s) but the atoms mention s{}",
                    trace.width(),
                    needed - 1
                )
            }
        }
        Ok(())
    }

    fn decls(&self) -> Vec<(String, &'static str)> {
        (0..self.consts)
            .map(|idx| (const_name(idx), Robustness::SORT))
            .collect()
    }

    fn atom(&self, atom: PrpIdx, letter: &[Interval]) -> Res<(Expr, Expr)> {
        let atom = &self.atoms[atom];
        Ok((atom.robustness(letter, false)?, atom.robustness(letter, true)?))
    }

    fn atom_str(&self, atom: PrpIdx, model: &Model) -> String {
        self.atoms[atom].to_string_in(model)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn ltl_atoms() {
        let ltl = Ltl::new(2);
        let trace = ltl.parse_trace("1,0;0,1").unwrap();
        assert!(ltl.check_traces(&[&trace]).is_ok());
        let (any, all) = ltl.atom(PrpIdx::new(1), &trace.letters[1]).unwrap();
        assert_eq!((any, all), (expr::tru(), expr::tru()));
        assert!(ltl.atom(PrpIdx::new(2), &trace.letters[1]).is_err());
        assert!(Ltl::new(3).check_traces(&[&trace]).is_err());
        assert_eq!(ltl.atom_str(PrpIdx::new(1), &Model::new()), "p1");
    }

    #[test]
    fn sltl_atoms() {
        let sltl = Sltl::of_strs(&["<(s0,c1)", ">(s1,s0)"]).unwrap();
        assert_eq!(sltl.atom_count(), 2);
        assert_eq!(sltl.const_count(), 2);
        assert_eq!(sltl.decls().len(), 2);
        assert_eq!(sltl.decls()[1], ("c_1".to_string(), "Real"));
        let trace = sltl.parse_trace("[0,1],2;1,3").unwrap();
        assert!(sltl.check_traces(&[&trace]).is_ok());
        let narrow = sltl.parse_trace("1;2").unwrap();
        assert!(sltl.check_traces(&[&narrow]).is_err());

        // s1 - s0 on [0,1],2: all-path 2 - 1, any-path 2 - 0.
        let (any, all) = sltl.atom(PrpIdx::new(1), &trace.letters[0]).unwrap();
        let model = Model::new();
        assert_eq!(expr::eval(&any, &model).unwrap().to_rat(), Some(Rat::from_integer(2.into())));
        assert_eq!(expr::eval(&all, &model).unwrap().to_rat(), Some(Rat::from_integer(1.into())));
    }
}
