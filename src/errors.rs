//! Error types.
//!
//! Unsatisfiability at some DAG size is not an error: it only makes the
//! synthesis loop grow the DAG. The solver answering `unknown` is one, see
//! [`ErrorKind::Unknown`][unknown].
//!
//! [unknown]: enum.ErrorKind.html#variant.Unknown
//! (Unknown variant of the ErrorKind enum)

use crate::common::{out_styles, ColorExt};

/// Parse error data.
#[derive(Debug)]
pub struct ParseErrorData {
    /// Error message.
    pub msg: String,
    /// Portion of the line *before* the error token.
    pub pref: String,
    /// Token that caused the error.
    pub token: String,
    /// Portion of the line *after* the error token.
    pub suff: String,
    /// Line of the error, relative to the portion of the input accessible by
    /// whoever constructed the error.
    pub line: Option<usize>,
}
impl ParseErrorData {
    /// Constructor, the token spans `[start, end)` in `line_str`.
    pub fn new<S: Into<String>>(
        msg: S,
        line_str: &str,
        start: usize,
        end: usize,
        line: Option<usize>,
    ) -> Self {
        let start = ::std::cmp::min(start, line_str.len());
        let end = ::std::cmp::max(start, ::std::cmp::min(end, line_str.len()));
        ParseErrorData {
            msg: msg.into(),
            pref: line_str[..start].into(),
            token: line_str[start..end].into(),
            suff: line_str[end..].into(),
            line,
        }
    }
}
impl_fmt! {
    ParseErrorData(self, fmt) {
        let styles = out_styles();
        let line_str = if let Some(line) = self.line {
            format!("{} ", line)
        } else {
            "".into()
        };
        write!(fmt, "{}", self.msg)?;
        if let Some(line) = self.line {
            writeln!(
                fmt,
                " at [{}]:",
                styles.emph(&format!("{}:{}", line, self.pref.len() + 1))
            )?
        } else {
            writeln!(fmt, ":")?
        }
        writeln!(fmt, "{0: ^1$}|", "", line_str.len())?;
        writeln!(
            fmt,
            "{}| {}{}{}",
            &line_str,
            styles.emph(&self.pref),
            styles.bad(&self.token),
            styles.emph(&self.suff)
        )?;
        write!(
            fmt,
            "{0: ^1$}| {0: ^2$}{3}",
            "",
            line_str.len(),
            self.pref.len(),
            styles.bad(&format!("{0:^>1$}", "", ::std::cmp::max(1, self.token.len())))
        )
    }
}

error_chain::error_chain! {
    types {
        Error, ErrorKind, ResultExt, Res;
    }

    links {
        SmtError(
            ::rsmt2::errors::Error, ::rsmt2::errors::ErrorKind
        ) #[doc = "Error at SMT level."];
    }

    foreign_links {
        Io(::std::io::Error) #[doc = "IO error."];
    }

    errors {
        #[doc = "Parse error."]
        ParseError(data: ParseErrorData) {
            description("parse error")
            display("{}", data)
        }
        #[doc = "Could not spawn z3."]
        Z3SpawnError {
            description("could not spawn z3")
            display("could not spawn z3")
        }
        #[doc = "The solver answered `unknown`."]
        Unknown {
            description("unknown")
            display("solver answered unknown")
        }
        #[doc = "The DAG reached the maximal size allowed without success."]
        SizeLimit(size: usize) {
            description("size limit reached")
            display("no formula of size at most {}", size)
        }
    }
}

impl Error {
    /// True if the kind of the error is [`ErrorKind::Unknown`][unknown].
    ///
    /// [unknown]: enum.ErrorKind.html#variant.Unknown
    /// (ErrorKind's Unknown variant)
    pub fn is_unknown(&self) -> bool {
        matches!(*self.kind(), ErrorKind::Unknown)
    }

    /// The size limit reached, if the error is a
    /// [`ErrorKind::SizeLimit`][limit].
    ///
    /// [limit]: enum.ErrorKind.html#variant.SizeLimit
    /// (ErrorKind's SizeLimit variant)
    pub fn size_limit(&self) -> Option<usize> {
        match *self.kind() {
            ErrorKind::SizeLimit(size) => Some(size),
            _ => None,
        }
    }

    /// True if the error is a parse error.
    pub fn is_parse_error(&self) -> bool {
        matches!(*self.kind(), ErrorKind::ParseError(_))
    }
}

/// Prints an error.
pub fn print_err(errs: &Error) {
    println!("({} \"", out_styles().bad("error"));
    for err in errs.iter() {
        for line in format!("{}", err).lines() {
            println!("  {}", line)
        }
    }
    println!("\")")
}
