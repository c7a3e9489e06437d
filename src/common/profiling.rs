#![doc = r#"Profiling stuff.

In `bench` mode, `Profiler` is a unit structure. Also, all macros are
deactivated, so all profiling is completely removed.
"#]

use std::time::{Duration, Instant};

use crate::common::*;

/// Extends duration with a pretty printing.
pub trait DurationExt {
    /// Nice string representation.
    fn to_str(&self) -> String;
}
impl DurationExt for Duration {
    fn to_str(&self) -> String {
        format!("{}.{:0>9}", self.as_secs(), self.subsec_nanos())
    }
}

/// Maps strings to counters.
pub type Stats = HashMap<String, usize>;

/// Provides a debug print function.
pub trait CanPrint {
    /// Debug print (multi-line).
    fn print(&self);
}
impl CanPrint for Stats {
    fn print(&self) {
        let styles = out_styles();
        let mut stats: Vec<_> = self.iter().collect();
        stats.sort();
        for (stat, count) in stats {
            let stat_len = ::std::cmp::min(30, stat.len());
            println!(
                ";   {0: >1$}{2}: {3: >5}",
                "",
                30 - stat_len,
                styles.emph(stat),
                count
            )
        }
    }
}

/// Profiling structure, only in `not(bench)`.
///
/// Scopes are flat: a scope is just a name. Internally, the structures are
/// wrapped in `RefCell`s so that mutation does not require `&mut self`.
#[cfg(not(feature = "bench"))]
pub struct Profiler {
    /// String-indexed durations, with the pending tick if any.
    map: ::std::cell::RefCell<HashMap<&'static str, (Option<Instant>, Duration)>>,
    /// Starting tick, for total time.
    start: Instant,
    /// Other statistics.
    stats: ::std::cell::RefCell<Stats>,
}
#[cfg(feature = "bench")]
pub struct Profiler;

impl Default for Profiler {
    fn default() -> Self {
        Self::new()
    }
}

impl Profiler {
    /// Constructor.
    #[cfg(not(feature = "bench"))]
    pub fn new() -> Self {
        use std::cell::RefCell;
        Profiler {
            map: RefCell::new(HashMap::new()),
            start: Instant::now(),
            stats: RefCell::new(HashMap::new()),
        }
    }
    #[cfg(feature = "bench")]
    pub fn new() -> Self {
        Profiler
    }

    /// Acts on a statistic.
    #[cfg(not(feature = "bench"))]
    pub fn stat_do<F, S>(&self, stat: S, f: F)
    where
        F: Fn(usize) -> usize,
        S: Into<String>,
    {
        let stat = stat.into();
        let mut map = self.stats.borrow_mut();
        let val = map.get(&stat).cloned().unwrap_or(0);
        let _ = map.insert(stat, f(val));
    }

    /// Ticks, the first scope is the only one that matters.
    #[cfg(not(feature = "bench"))]
    pub fn tick(&self, scope: Vec<&'static str>) {
        if let Some(&scope) = scope.first() {
            let mut map = self.map.borrow_mut();
            let time = map
                .entry(scope)
                .or_insert_with(|| (None, Duration::from_secs(0)));
            time.0 = Some(Instant::now())
        }
    }

    /// Registers the time since the last tick.
    ///
    /// Does nothing if there was no tick since the last time registration.
    #[cfg(not(feature = "bench"))]
    pub fn mark(&self, scope: Vec<&'static str>) {
        if let Some(&scope) = scope.first() {
            let mut map = self.map.borrow_mut();
            if let Some(&mut (ref mut tick, ref mut sum)) = map.get_mut(&scope) {
                if let Some(instant) = tick.take() {
                    *sum += Instant::now().duration_since(instant)
                }
            }
        }
    }

    /// Duration of a scope, zero if unknown.
    #[cfg(not(feature = "bench"))]
    pub fn duration(&self, scope: &str) -> Duration {
        self.map
            .borrow()
            .get(scope)
            .map(|&(_, time)| time)
            .unwrap_or_else(|| Duration::from_secs(0))
    }

    #[cfg(feature = "bench")]
    pub fn duration(&self, _: &str) -> Duration {
        Duration::from_secs(0)
    }

    /// Prints the profiling info, `order` lists the scopes to print first.
    #[cfg(not(feature = "bench"))]
    pub fn print(&self, name: &str, pref: &str, order: &[&str]) {
        let styles = out_styles();
        let total = Instant::now().duration_since(self.start);
        println!("; {}{} {}", pref, styles.emph(name), styles.happy("profile"));
        println!("; {}  total {}s", pref, total.to_str());

        let map = self.map.borrow();
        let mut scopes: Vec<_> = map.keys().cloned().collect();
        scopes.sort_by_key(|scope| {
            (
                order.iter().position(|s| s == scope).unwrap_or(order.len()),
                *scope,
            )
        });
        for scope in scopes {
            if let Some(&(_, time)) = map.get(scope) {
                println!("; {}  |- {}s {}", pref, time.to_str(), scope)
            }
        }

        let stats = self.stats.borrow();
        if !stats.is_empty() {
            println!("; {}  stats:", pref);
            stats.print()
        }
    }
}
