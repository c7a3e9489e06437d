//! Macros.

/// Verbosity level of a log level identifier.
#[doc(hidden)]
#[macro_export]
macro_rules! log_level {
    (info) => {
        2
    };
    (verb) => {
        3
    };
    (debug) => {
        4
    };
}

/// Logs some lines at some level, each line prefixed with `; `.
///
/// Levels are `info` (`-v`), `verb` (`-vv`) and `debug` (`-vvv`). Lines are
/// separated by `;`.
///
/// ```
/// # #[macro_use] extern crate ltl_synth;
/// # fn main() {
/// let size = 3;
/// log! { @verb
///     "solving for size {}", size ;
///     "this line is only displayed with `-vv`"
/// }
/// # }
/// ```
#[macro_export]
#[cfg(not(feature = "bench"))]
macro_rules! log {
    ( @$lvl:ident $( $str:expr $(, $args:expr)* );* $(;)? ) => {
        if $crate::common::verb() >= $crate::log_level!($lvl) {
            $(
                for line in format!($str $(, $args)*).lines() {
                    println!("; {}", line)
                }
            )*
        }
    };
}
#[macro_export]
#[cfg(feature = "bench")]
macro_rules! log {
    ( $($tt:tt)* ) => {
        ()
    };
}

/// Prints a warning, unless in quiet mode (`-q`).
#[macro_export]
macro_rules! warn {
    ( $( $str:expr $(, $args:expr)* );* $(;)? ) => {{
        use $crate::common::ColorExt;
        if $crate::common::verb() > 0 {
            println!("; {}", $crate::common::out_styles().sad("|===| warning:"));
            $(
                for line in format!($str $(, $args)*).lines() {
                    println!("; {} {}", $crate::common::out_styles().sad("|"), line)
                }
            )*
            println!("; {}", $crate::common::out_styles().sad("|===|"))
        }
    }};
}

/// Profiling macro.
///
/// If passed `self`, assumes `self` has a `profiler` field.
#[macro_export]
#[cfg(not(feature = "bench"))]
macro_rules! profile {
    ( | $prof:ident | $stat:expr => add $e:expr ) => {
        $prof.stat_do($stat, |val| val + $e)
    };
    ( | $prof:ident | $meth:ident $( $scope:expr ),+ $(,)? ) => {
        $prof.$meth(vec![ $($scope),+ ])
    };
    ( $slf:ident $stat:expr => add $e:expr ) => {{
        let prof = &$slf.profiler;
        $crate::profile! { |prof| $stat => add $e }
    }};
    ( $slf:ident $meth:ident $( $scope:expr ),+ $(,)? ) => {{
        let prof = &$slf.profiler;
        $crate::profile! { |prof| $meth $($scope),+ }
    }};
}
#[macro_export]
#[cfg(feature = "bench")]
macro_rules! profile {
    ( $($tt:tt)* ) => {
        ()
    };
}
