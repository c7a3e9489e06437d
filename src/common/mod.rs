//! Base types and functions.

pub use std::io::{Read, Write};
pub use std::sync::RwLock;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::RwLockReadGuard;

pub use mylib::common::hash::*;

pub use hashconsing::{HConsed, HashConsign};

pub use rsmt2::{SmtRes, Solver};

pub use num::{One, Signed, Zero};

pub use crate::errors::*;

mod wrappers;

#[macro_use]
pub mod macros;
pub mod config;
pub mod profiling;
pub mod smt;

pub use self::config::*;
pub use self::profiling::{CanPrint, Profiler};
pub use self::smt::{parse_decimal, CheckRes, Encoding, Engine, Model, Parser, SolveEngine, Val};
pub use self::wrappers::*;

mod revision {
    include!(concat!(env!("OUT_DIR"), "/revision.rs"));
}
pub use self::revision::REVISION;

lazy_static! {
    /// Output styles, plain until [`init_output`] activates coloring.
    ///
    /// [`init_output`]: fn.init_output.html (init_output function)
    static ref styles: RwLock<Styles> = RwLock::new(Styles::new(false));
    static ref version_string: String = if let Some(rev) = REVISION {
        format!("{} ({})", clap::crate_version!(), rev)
    } else {
        clap::crate_version!().to_string()
    };
    /// Version with revision info.
    pub static ref version: &'static str = &version_string;
}

/// Verbosity of the logging macros.
static verbosity: AtomicUsize = AtomicUsize::new(0);

/// Sets the verbosity and the coloring of all the output.
pub fn init_output(verb: usize, color: bool) {
    verbosity.store(verb, Ordering::Relaxed);
    match styles.write() {
        Ok(mut s) => *s = Styles::new(color),
        Err(poisoned) => *poisoned.into_inner() = Styles::new(color),
    }
}

/// Current verbosity.
#[inline]
pub fn verb() -> usize {
    verbosity.load(Ordering::Relaxed)
}

/// Current output styles.
pub fn out_styles() -> RwLockReadGuard<'static, Styles> {
    match styles.read() {
        Ok(s) => s,
        Err(poisoned) => poisoned.into_inner(),
    }
}

// |===| Helpers.

/// Prints the stats if asked. Does nothing in bench mode.
#[cfg(feature = "bench")]
pub fn print_stats(_: &Config, _: &str, _: Profiler) {}
/// Prints the stats if asked. Does nothing in bench mode.
#[cfg(not(feature = "bench"))]
pub fn print_stats(conf: &Config, name: &str, profiler: Profiler) {
    if conf.stats {
        println!();
        profiler.print(name, "", &["encoding", "solving", "decoding"]);
        println!();
    }
}

/// Creates a directory if it doesn't exist.
pub fn mk_dir<P: AsRef<::std::path::Path>>(path: P) -> Res<()> {
    use std::fs::DirBuilder;
    DirBuilder::new().recursive(true).create(path)?;
    Ok(())
}

/// Greatest common divisor.
pub fn gcd(a: usize, b: usize) -> usize {
    if b == 0 {
        a
    } else {
        gcd(b, a % b)
    }
}

/// Least common multiple, `lcm(0, n) = n`.
pub fn lcm(a: usize, b: usize) -> usize {
    if a == 0 || b == 0 {
        a + b
    } else {
        a / gcd(a, b) * b
    }
}

// |===| Type and traits aliases.

/// Integers.
pub type Int = ::num::BigInt;
/// Rationals.
pub type Rat = ::num::BigRational;

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn lcm_of_periods() {
        assert_eq!(lcm(1, 1), 1);
        assert_eq!(lcm(2, 3), 6);
        assert_eq!(lcm(4, 6), 12);
        assert_eq!(lcm(0, 5), 5);
        assert_eq!(gcd(12, 18), 6);
    }
}
