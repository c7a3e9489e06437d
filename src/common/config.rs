//! Global configuration.
//!
//! Built from the command line by [`Config::clap`][clap], each
//! sub-configuration adds its own arguments to the clap command.
//!
//! [clap]: struct.Config.html#method.clap (Config's clap method)

use std::path::PathBuf;

use ansi_term::{Colour, Style};
use clap::Arg;
use rsmt2::SmtConf as SolverConf;

use crate::{
    common::{mk_dir, out_styles, Solver},
    errors::*,
    score::{Score, ScoreGoal},
};

/// Clap command with static lifetime.
pub type App = ::clap::Command<'static>;
/// Clap `ArgMatches`.
pub type Matches = ::clap::ArgMatches;

/// Functions all sub-configurations must have.
pub trait SubConf {
    /// True if the options of the subconf need the output directory.
    fn need_out_dir(&self) -> bool;
}

/// Solver configuration.
#[derive(Debug, Clone)]
pub struct SmtConf {
    /// Command used to call z3.
    cmd: String,
    /// Smt logging flag.
    pub log: bool,
}
impl Default for SmtConf {
    fn default() -> Self {
        SmtConf {
            cmd: "z3".into(),
            log: false,
        }
    }
}
impl SubConf for SmtConf {
    fn need_out_dir(&self) -> bool {
        self.log
    }
}
impl SmtConf {
    /// Constructor.
    pub fn new<S: Into<String>>(cmd: S, log: bool) -> Self {
        SmtConf {
            cmd: cmd.into(),
            log,
        }
    }

    /// Command used to call z3.
    pub fn cmd(&self) -> &str {
        &self.cmd
    }

    /// Actual, `rsmt2` solver configuration.
    pub fn conf(&self) -> SolverConf {
        let mut conf = SolverConf::z3(self.cmd.clone());
        conf.models();
        conf
    }

    /// Spawns a solver.
    ///
    /// If logging is active, will log to `<out_dir>/<name>.smt2`.
    pub fn spawn<Parser>(&self, name: &str, parser: Parser, out_dir: &str) -> Res<Solver<Parser>> {
        let mut solver =
            Solver::new(self.conf(), parser).chain_err(|| ErrorKind::Z3SpawnError)?;
        if let Some(log) = self
            .log_file(name, out_dir)
            .chain_err(|| format!("while opening log file for {}", out_styles().emph(name)))?
        {
            solver.tee(log)?
        }
        Ok(solver)
    }

    /// Smt log file, if any.
    fn log_file(&self, name: &str, out_dir: &str) -> Res<Option<::std::fs::File>> {
        use std::fs::OpenOptions;
        if self.log {
            let mut path = PathBuf::from(out_dir);
            mk_dir(&path)?;
            path.push(name);
            path.set_extension("smt2");
            let file = OpenOptions::new()
                .write(true)
                .truncate(true)
                .create(true)
                .open(&path)
                .chain_err(|| {
                    format!("while creating smt log file {}", path.to_string_lossy())
                })?;
            Ok(Some(file))
        } else {
            Ok(None)
        }
    }

    /// Adds clap options to a clap `App`.
    pub fn add_args(app: App, mut order: usize) -> App {
        let mut order = || {
            order += 1;
            order
        };

        app.arg(
            Arg::new("z3_cmd")
                .long("z3")
                .help("sets the command used to call z3")
                .default_value("z3")
                .takes_value(true)
                .number_of_values(1)
                .display_order(order()),
        )
        .arg(
            Arg::new("smt_log")
                .long("smt_log")
                .help("(de)activates smt logging to the output directory")
                .validator(bool_validator)
                .value_name(bool_format)
                .default_value("no")
                .takes_value(true)
                .number_of_values(1)
                .display_order(order()),
        )
    }

    /// Creates itself from some matches.
    pub fn of_matches(matches: &Matches) -> Self {
        let cmd = matches
            .value_of("z3_cmd")
            .expect("unreachable(z3_cmd): default is provided")
            .to_string();
        let log = bool_of_matches(matches, "smt_log");
        SmtConf { cmd, log }
    }
}

/// Synthesis configuration.
#[derive(Debug, Clone)]
pub struct SynthConf {
    /// Input traces are signal traces.
    pub sltl: bool,
    /// Restrict formulas with the grammar of the input file.
    pub grammar: bool,
    /// Keep one solver context across iterations.
    pub incremental: bool,
    /// Classification score.
    pub score: Score,
    /// Score goal.
    pub goal: ScoreGoal,
    /// DAG size from which the best-scoring formula is accepted.
    pub optimized_run: Option<usize>,
    /// Maximal DAG size, no limit if `None`.
    pub max_size: Option<usize>,
}
impl Default for SynthConf {
    fn default() -> Self {
        SynthConf {
            sltl: false,
            grammar: false,
            incremental: false,
            score: Score::Count,
            goal: ScoreGoal::default(),
            optimized_run: None,
            max_size: None,
        }
    }
}
impl SubConf for SynthConf {
    fn need_out_dir(&self) -> bool {
        false
    }
}
impl SynthConf {
    /// True if scoring options are set in incremental mode, which ignores
    /// them.
    pub fn ignores_scoring(&self) -> bool {
        self.incremental && (self.optimized_run.is_some() || !self.goal.is_trivial())
    }

    /// Adds clap options to a clap `App`.
    pub fn add_args(app: App, mut order: usize) -> App {
        let mut order = || {
            order += 1;
            order
        };

        app.arg(
            Arg::new("sltl")
                .long("sltl")
                .help("input traces are signal traces, learn a signal LTL formula")
                .validator(bool_validator)
                .value_name(bool_format)
                .default_value("off")
                .takes_value(true)
                .number_of_values(1)
                .display_order(order()),
        )
        .arg(
            Arg::new("grammar")
                .long("grammar")
                .short('g')
                .help("restricts formulas using the grammar of the input file")
                .validator(bool_validator)
                .value_name(bool_format)
                .default_value("off")
                .takes_value(true)
                .number_of_values(1)
                .display_order(order()),
        )
        .arg(
            Arg::new("incremental")
                .long("incremental")
                .short('i')
                .help("keeps one solver context for the whole search (no scoring)")
                .validator(bool_validator)
                .value_name(bool_format)
                .default_value("off")
                .takes_value(true)
                .number_of_values(1)
                .display_order(order()),
        )
        .arg(
            Arg::new("score")
                .long("score")
                .help("classification score to optimize")
                .possible_values(["count", "ratio", "linear", "quadra"])
                .default_value("count")
                .takes_value(true)
                .number_of_values(1)
                .display_order(order()),
        )
        .arg(
            Arg::new("min")
                .long("min")
                .help(
                    "score goal, a sum of terms `<n>`, `<n>T` (per trace) \
                     and `<n>I` (per DAG node)",
                )
                .validator(|s: &str| s.parse::<ScoreGoal>().map_err(|e| e.to_string()))
                .value_name("GOAL")
                .default_value("1")
                .takes_value(true)
                .number_of_values(1)
                .display_order(order()),
        )
        .arg(
            Arg::new("max")
                .long("max")
                .help("DAG size from which the best-scoring formula is accepted, `0` for never")
                .validator(int_validator)
                .value_name("int")
                .default_value("0")
                .takes_value(true)
                .number_of_values(1)
                .display_order(order()),
        )
        .arg(
            Arg::new("max_size")
                .long("max_size")
                .help("maximal DAG size, `0` for no limit")
                .validator(int_validator)
                .value_name("int")
                .default_value("0")
                .takes_value(true)
                .number_of_values(1)
                .display_order(order()),
        )
    }

    /// Creates itself from some matches.
    pub fn of_matches(matches: &Matches) -> Res<Self> {
        let sltl = bool_of_matches(matches, "sltl");
        let grammar = bool_of_matches(matches, "grammar");
        let incremental = bool_of_matches(matches, "incremental");
        let score = matches
            .value_of("score")
            .expect("unreachable(score): default is provided")
            .parse::<Score>()?;
        let goal = matches
            .value_of("min")
            .expect("unreachable(min): default is provided")
            .parse::<ScoreGoal>()?;
        let optimized_run = match int_of_matches(matches, "max") {
            0 => None,
            n => Some(n),
        };
        let max_size = match int_of_matches(matches, "max_size") {
            0 => None,
            n => Some(n),
        };
        Ok(SynthConf {
            sltl,
            grammar,
            incremental,
            score,
            goal,
            optimized_run,
            max_size,
        })
    }
}

/// Global configuration.
pub struct Config {
    /// Input files.
    files: Vec<String>,
    /// Verbosity.
    pub verb: usize,
    /// Coloring flag.
    pub color: bool,
    /// Statistics flag.
    pub stats: bool,
    /// Output directory.
    out_dir: String,
    /// Report file.
    results: Option<String>,
    /// Styles, for coloring.
    styles: Styles,

    /// Solver configuration.
    pub solver: SmtConf,
    /// Synthesis configuration.
    pub synth: SynthConf,
}
impl ColorExt for Config {
    fn styles(&self) -> &Styles {
        &self.styles
    }
}
impl Config {
    /// Input files.
    #[inline]
    pub fn in_files(&self) -> &[String] {
        &self.files
    }
    /// Output directory.
    #[inline]
    pub fn out_dir(&self) -> &str {
        &self.out_dir
    }
    /// Report file.
    #[inline]
    pub fn results_file(&self) -> Option<&String> {
        self.results.as_ref()
    }

    /// Parses command-line arguments and generates the configuration.
    pub fn clap() -> Res<Self> {
        let matches = Self::app().get_matches();
        Self::of_matches(&matches)
    }

    /// Generates the configuration from some arguments, first one is the
    /// binary name.
    pub fn of_args<I, T>(args: I) -> Res<Self>
    where
        I: IntoIterator<Item = T>,
        T: Into<::std::ffi::OsString> + Clone,
    {
        let matches = Self::app()
            .try_get_matches_from(args)
            .map_err(|e| Error::from(e.to_string()))?;
        Self::of_matches(&matches)
    }

    /// Clap command with all the options.
    fn app() -> App {
        let mut app = App::new(clap::crate_name!());
        app = Self::add_args(app, 0);
        app = SynthConf::add_args(app, 100);
        app = SmtConf::add_args(app, 200);
        app
    }

    /// Creates itself from some matches.
    fn of_matches(matches: &Matches) -> Res<Self> {
        // Input files.
        let files = matches
            .values_of("input files")
            .map(|vals| vals.map(|s| s.to_string()).collect())
            .unwrap_or_else(Vec::new);

        // Verbosity, `1` by default so that warnings show.
        let mut verb = 1;
        for _ in 0..matches.occurrences_of("verb") {
            verb += 1
        }
        for _ in 0..matches.occurrences_of("quiet") {
            if verb > 0 {
                verb -= 1
            }
        }

        // Colors.
        let color = atty::is(atty::Stream::Stdout) && bool_of_matches(matches, "color");
        let styles = Styles::new(color);

        // Output directory.
        let out_dir = matches
            .value_of("out_dir")
            .expect("unreachable(out_dir): default is provided")
            .to_string();

        // Profiling.
        let stats = bool_of_matches(matches, "stats");

        // Report.
        let results = matches.value_of("results").map(|s| s.to_string());

        let solver = SmtConf::of_matches(matches);
        let synth = SynthConf::of_matches(matches)?;

        Ok(Config {
            files,
            verb,
            color,
            stats,
            out_dir,
            results,
            styles,
            solver,
            synth,
        })
    }

    /// Adds clap options to a clap App.
    pub fn add_args(app: App, mut order: usize) -> App {
        let mut order = || {
            order += 1;
            order
        };

        app.version(*crate::common::version)
            .about("Learns (S)LTL formulas separating positive traces from negative ones.")
            .arg(
                Arg::new("input files")
                    .help("sets the input files to use")
                    .index(1)
                    .multiple_values(true)
                    .display_order(order()),
            )
            .arg(
                Arg::new("verb")
                    .short('v')
                    .help("increases verbosity")
                    .takes_value(false)
                    .multiple_occurrences(true)
                    .display_order(order()),
            )
            .arg(
                Arg::new("quiet")
                    .short('q')
                    .help("decreases verbosity")
                    .takes_value(false)
                    .multiple_occurrences(true)
                    .display_order(order()),
            )
            .arg(
                Arg::new("color")
                    .long("color")
                    .short('c')
                    .help("(de)activates coloring (off if output is not a tty)")
                    .validator(bool_validator)
                    .value_name(bool_format)
                    .default_value("on")
                    .takes_value(true)
                    .number_of_values(1)
                    .display_order(order()),
            )
            .arg(
                Arg::new("out_dir")
                    .long("out_dir")
                    .short('o')
                    .help("sets the output directory")
                    .value_name("DIR")
                    .default_value("ltl_synth_out")
                    .takes_value(true)
                    .number_of_values(1)
                    .display_order(order()),
            )
            .arg(
                Arg::new("stats")
                    .long("stats")
                    .short('s')
                    .help("reports some statistics at the end of the run")
                    .validator(bool_validator)
                    .value_name(bool_format)
                    .default_value("no")
                    .takes_value(true)
                    .number_of_values(1)
                    .display_order(order()),
            )
            .arg(
                Arg::new("results")
                    .long("results")
                    .short('r')
                    .help("appends a tab-separated report line per input file")
                    .value_name("FILE")
                    .takes_value(true)
                    .number_of_values(1)
                    .display_order(order()),
            )
    }
}

/// Contains some styles for coloring.
#[derive(Debug, Clone)]
pub struct Styles {
    /// Emphasis style.
    emph: Style,
    /// Happy style.
    hap: Style,
    /// Sad style.
    sad: Style,
    /// Bad style.
    bad: Style,
}
impl Default for Styles {
    fn default() -> Self {
        Styles::new(true)
    }
}
impl ColorExt for Styles {
    fn styles(&self) -> &Styles {
        self
    }
}
impl Styles {
    /// Creates some styles.
    pub fn new(colored: bool) -> Self {
        Styles {
            emph: if colored {
                Style::new().bold()
            } else {
                Style::new()
            },
            hap: if colored {
                Colour::Green.normal().bold()
            } else {
                Style::new()
            },
            sad: if colored {
                Colour::Yellow.normal().bold()
            } else {
                Style::new()
            },
            bad: if colored {
                Colour::Red.normal().bold()
            } else {
                Style::new()
            },
        }
    }
}

/// Can color things.
pub trait ColorExt {
    /// The styles in the colorizer: emph, happy, sad, and bad.
    fn styles(&self) -> &Styles;
    /// String emphasis.
    #[inline]
    fn emph<S: AsRef<str>>(&self, s: S) -> String {
        format!("{}", self.styles().emph.paint(s.as_ref()))
    }
    /// Happy string.
    #[inline]
    fn happy<S: AsRef<str>>(&self, s: S) -> String {
        format!("{}", self.styles().hap.paint(s.as_ref()))
    }
    /// Sad string.
    #[inline]
    fn sad<S: AsRef<str>>(&self, s: S) -> String {
        format!("{}", self.styles().sad.paint(s.as_ref()))
    }
    /// Bad string.
    #[inline]
    fn bad<S: AsRef<str>>(&self, s: S) -> String {
        format!("{}", self.styles().bad.paint(s.as_ref()))
    }
}

/// Format for booleans.
pub static bool_format: &str = "on/true|no/off/false";

/// Boolean of a string.
pub fn bool_of_str(s: &str) -> Option<bool> {
    match s {
        "on" | "true" => Some(true),
        "no" | "off" | "false" => Some(false),
        _ => None,
    }
}

/// Boolean of some matches.
///
/// Assumes a default is provided and the input has been validated with
/// `bool_validator`.
pub fn bool_of_matches(matches: &Matches, key: &str) -> bool {
    matches
        .value_of(key)
        .and_then(bool_of_str)
        .expect("failed to retrieve boolean argument")
}

/// Integer of some matches.
///
/// Assumes a default is provided and the input has been validated with
/// `int_validator`.
pub fn int_of_matches(matches: &Matches, key: &str) -> usize {
    matches
        .value_of(key)
        .and_then(|s| s.parse::<usize>().ok())
        .expect("failed to retrieve integer argument")
}

/// Validates boolean input.
pub fn bool_validator(s: &str) -> Result<(), String> {
    if bool_of_str(s).is_some() {
        Ok(())
    } else {
        Err(format!("expected `{}`, got `{}`", bool_format, s))
    }
}

/// Validates integer input.
pub fn int_validator(s: &str) -> Result<(), String> {
    match s.parse::<usize>() {
        Ok(_) => Ok(()),
        Err(_) => Err(format!("expected an integer, got `{}`", s)),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn command_line() {
        let conf = Config::of_args(vec![
            "ltl-synth",
            "-v",
            "--score",
            "ratio",
            "--min",
            "0.9-0.1I",
            "--max",
            "4",
            "--incremental",
            "off",
            "a.trace",
            "b.trace",
        ])
        .expect("valid command line");
        assert_eq!(conf.in_files(), &["a.trace".to_string(), "b.trace".to_string()]);
        assert_eq!(conf.verb, 2);
        assert_eq!(conf.synth.score, Score::Ratio);
        assert_eq!(conf.synth.optimized_run, Some(4));
        assert_eq!(conf.synth.max_size, None);
        assert!(!conf.synth.sltl);
        assert!(!conf.synth.incremental);
        assert!(!conf.synth.ignores_scoring());
        assert_eq!(conf.solver.cmd(), "z3");

        let conf = Config::of_args(vec!["ltl-synth", "--incremental", "on", "--min", "0.9"])
            .expect("valid command line");
        assert!(conf.synth.ignores_scoring());
        let conf = Config::of_args(vec!["ltl-synth", "--incremental", "on"])
            .expect("valid command line");
        assert!(!conf.synth.ignores_scoring());
    }

    #[test]
    fn bad_command_line() {
        assert!(Config::of_args(vec!["ltl-synth", "--score", "best"]).is_err());
        assert!(Config::of_args(vec!["ltl-synth", "--max", "-3"]).is_err());
        assert!(Config::of_args(vec!["ltl-synth", "--sltl", "maybe"]).is_err());
    }

    #[test]
    fn booleans() {
        assert_eq!(bool_of_str("on"), Some(true));
        assert_eq!(bool_of_str("false"), Some(false));
        assert_eq!(bool_of_str("yes"), None);
        assert!(bool_validator("no").is_ok());
        assert!(int_validator("7").is_ok());
        assert!(int_validator("x").is_err());
    }
}
