//! Input files.
//!
//! An input file is a list of sections separated by `---` lines:
//!
//! 1. positive traces,
//! 2. negative traces,
//! 3. usable operators (ignored),
//! 4. depth (ignored),
//! 5. SLTL atoms, only in SLTL mode,
//! 6. productions of the grammar, optional.
//!
//! Blank lines and lines starting with `#` are skipped. Errors on traces and
//! atoms point at the line they come from.

use std::path::Path;

use crate::{
    common::*,
    grammar::Grammar,
    logic::{Logic, Ltl, Sltl},
    term::Atom,
    trace::{bool_field, Trace},
};

/// A non-empty line of an input file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    /// Line number, starting at `1`.
    pub line: usize,
    /// Trimmed content.
    pub text: String,
}

/// Parse error on a line, carrying the error chain as the message.
fn error_at(line: &Line, err: Error) -> Error {
    let msg = err
        .iter()
        .map(|err| err.to_string())
        .collect::<Vec<_>>()
        .join(", ");
    ErrorKind::ParseError(ParseErrorData::new(
        msg,
        &line.text,
        0,
        line.text.len(),
        Some(line.line),
    ))
    .into()
}

/// Sections of an input file.
#[derive(Debug, Clone, Default)]
pub struct Input {
    /// Positive traces.
    pub pos: Vec<Line>,
    /// Negative traces.
    pub neg: Vec<Line>,
    /// Usable operators.
    pub ops: Vec<Line>,
    /// Depth.
    pub depth: Vec<Line>,
    /// SLTL atoms.
    pub atoms: Vec<Line>,
    /// Productions of the grammar.
    pub grammar: Vec<Line>,
}

impl Input {
    /// Reads an input file.
    pub fn of_file<P: AsRef<Path>>(path: P, sltl: bool) -> Res<Self> {
        let path = path.as_ref();
        let text = ::std::fs::read_to_string(path)
            .chain_err(|| format!("while reading `{}`", path.display()))?;
        Self::parse(&text, sltl).chain_err(|| format!("while parsing `{}`", path.display()))
    }

    /// Splits some text in sections.
    pub fn parse(text: &str, sltl: bool) -> Res<Self> {
        let mut sections = vec![];
        let mut current = vec![];
        for (idx, line) in text.lines().enumerate() {
            let line = line.trim();
            if line == "---" {
                sections.push(::std::mem::take(&mut current));
            } else if !line.is_empty() && !line.starts_with('#') {
                current.push(Line {
                    line: idx + 1,
                    text: line.into(),
                })
            }
        }
        sections.push(current);

        let max = if sltl { 6 } else { 5 };
        if sections.len() > max {
            let line = sections[max]
                .first()
                .map(|line| format!(" starting at line {}", line.line))
                .unwrap_or_default();
            bail!(
                "unexpected section{}, {} input files have at most {} sections",
                line,
                if sltl { "SLTL" } else { "LTL" },
                max
            )
        }

        let mut sections = sections.into_iter();
        let mut input = Input {
            pos: sections.next().unwrap_or_default(),
            neg: sections.next().unwrap_or_default(),
            ops: sections.next().unwrap_or_default(),
            depth: sections.next().unwrap_or_default(),
            ..Input::default()
        };
        if sltl {
            input.atoms = sections.next().unwrap_or_default()
        }
        input.grammar = sections.next().unwrap_or_default();

        if !input.ops.is_empty() {
            log! { @verb "ignoring the usable operators section" }
        }
        if !input.depth.is_empty() {
            log! { @verb "ignoring the depth section" }
        }
        Ok(input)
    }

    /// Plain LTL logic of the sample, over as many propositions as the first
    /// trace has fields.
    pub fn ltl(&self) -> Res<Ltl> {
        match self.pos.iter().chain(self.neg.iter()).next() {
            Some(line) => {
                let trace = Trace::parse(&line.text, bool_field).map_err(|e| error_at(line, e))?;
                Ok(Ltl::new(trace.width()))
            }
            None => bail!("cannot learn anything from empty samples"),
        }
    }

    /// SLTL logic of the atoms section.
    pub fn sltl(&self) -> Res<Sltl> {
        if self.atoms.is_empty() {
            bail!("SLTL input without atoms")
        }
        let mut atoms = Vec::with_capacity(self.atoms.len());
        for line in &self.atoms {
            atoms.push(Atom::parse(&line.text).map_err(|e| error_at(line, e))?)
        }
        Ok(Sltl::new(atoms))
    }

    /// Parses the positive or the negative traces.
    pub fn traces<L: Logic>(&self, logic: &L, positive: bool) -> Res<Vec<Trace<L::Field>>> {
        let lines = if positive { &self.pos } else { &self.neg };
        let mut traces = Vec::with_capacity(lines.len());
        for line in lines {
            traces.push(logic.parse_trace(&line.text).map_err(|e| error_at(line, e))?)
        }
        Ok(traces)
    }

    /// Grammar of the input, if `active`.
    pub fn grammar(&self, active: bool, atoms: usize) -> Res<Option<Grammar>> {
        match (active, self.grammar.first()) {
            (false, None) => Ok(None),
            (false, Some(line)) => {
                log! { @verb "ignoring the grammar starting at line {}", line.line }
                Ok(None)
            }
            (true, None) => bail!("grammar mode is active but the input has no grammar"),
            (true, Some(first)) => {
                let lines: Vec<&str> = self.grammar.iter().map(|line| line.text.as_str()).collect();
                let grammar = Grammar::parse(&lines, atoms)
                    .chain_err(|| format!("in the grammar starting at line {}", first.line))?;
                Ok(Some(grammar))
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    static LTL: &str = "\
# positive
1,0;0,1:0
0,1:[2]
---
0,0
---
G,F,X,!,&,|,=>,U
---
3
---
S := G T
T := p0 | p1
";

    #[test]
    fn sections() {
        let input = Input::parse(LTL, false).unwrap();
        assert_eq!(
            input.pos,
            vec![
                Line {
                    line: 2,
                    text: "1,0;0,1:0".into()
                },
                Line {
                    line: 3,
                    text: "0,1:[2]".into()
                },
            ]
        );
        assert_eq!(input.neg.len(), 1);
        assert_eq!(input.ops.len(), 1);
        assert_eq!(input.depth.len(), 1);
        assert!(input.atoms.is_empty());
        assert_eq!(input.grammar.len(), 2);

        let ltl = input.ltl().unwrap();
        assert_eq!(ltl.atom_count(), 2);
        let pos = input.traces(&ltl, true).unwrap();
        assert_eq!(pos[0].rep, 0);
        assert_eq!(pos[1].weight, 2);
        let neg = input.traces(&ltl, false).unwrap();
        assert_eq!(neg[0].letters, vec![vec![false, false]]);

        assert!(input.grammar(false, 2).unwrap().is_none());
        assert_eq!(input.grammar(true, 2).unwrap().unwrap().len(), 2);
    }

    #[test]
    fn minimal_sections() {
        let input = Input::parse("1\n---\n0\n", false).unwrap();
        assert_eq!(input.pos.len(), 1);
        assert_eq!(input.neg.len(), 1);
        assert!(input.grammar(true, 1).is_err());

        let input = Input::parse("1\n", false).unwrap();
        assert!(input.neg.is_empty());
        assert!(Input::parse("", false).unwrap().ltl().is_err());
    }

    #[test]
    fn sltl_sections() {
        let text = "[0,1];2:0\n---\n3\n---\n---\n---\n<(s0,c0)\n>(+(s0,s0),s0)\n";
        let input = Input::parse(text, true).unwrap();
        let sltl = input.sltl().unwrap();
        assert_eq!(sltl.atom_count(), 2);
        assert_eq!(sltl.const_count(), 1);
        assert_eq!(input.traces(&sltl, true).unwrap()[0].size(), 2);
        // Same file in LTL mode: too many sections.
        assert!(Input::parse(&format!("{}---\nS := p0\n---\n", text), true).is_err());
        assert!(Input::parse("1\n---\n0\n---\n---\n---\nS := p0\n---\n", false).is_err());
    }

    #[test]
    fn located_errors() {
        let input = Input::parse("1,0\n\n# comment\n1,2\n---\n0,0:4\n", false).unwrap();
        let ltl = input.ltl().unwrap();
        let err = input.traces(&ltl, true).unwrap_err();
        assert!(err.is_parse_error());
        match err.kind() {
            ErrorKind::ParseError(data) => {
                assert_eq!(data.line, Some(4));
                assert_eq!(data.token, "1,2")
            }
            _ => panic!("expected a parse error"),
        }
        let err = input.traces(&ltl, false).unwrap_err();
        match err.kind() {
            ErrorKind::ParseError(data) => assert_eq!(data.line, Some(6)),
            _ => panic!("expected a parse error"),
        }

        let input = Input::parse("[0,1]\n---\n---\n---\n---\n<(s0)\n", true).unwrap();
        assert!(input.sltl().unwrap_err().is_parse_error());
    }
}
