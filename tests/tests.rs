//! Top-level tests on the input files in `rsc`.
#![allow(non_upper_case_globals)]

use std::fs::read_dir;

use ltl_synth::common::*;
use ltl_synth::read_and_work;

static ltl_files_dir: &str = "rsc/ltl";
static sltl_files_dir: &str = "rsc/sltl";
static grammar_files_dir: &str = "rsc/grammar";
static err_files_dir: &str = "rsc/error";

macro_rules! run {
    ($f:expr) => {
        if let Err(e) = $f {
            println!("Error:");
            for e in e.iter() {
                let mut pref = "> ";
                for line in format!("{}", e).lines() {
                    println!("{}{}", pref, line);
                    pref = "  "
                }
            }
            panic!("failure")
        }
    };
}

macro_rules! map_err {
    ($e:expr, $msg:expr) => {
        $e.map_err(|e| format!("{}:\n{}", $msg, e))?
    };
    ($e:expr, $($tt:tt)*) => {
        $e.map_err(|e| format!("{}:\n{}", format!($($tt)*), e))?
    };
}

/// True if z3 can be spawned.
fn has_z3() -> bool {
    match Engine::spawn(&SmtConf::default(), "has_z3", "ltl_synth_out") {
        Ok(engine) => {
            let _ = engine.kill();
            true
        }
        Err(_) => {
            println!("could not spawn z3, skipping");
            false
        }
    }
}

fn conf(args: &[&str]) -> Res<Config> {
    let mut all = vec!["ltl-synth"];
    all.extend_from_slice(args);
    Config::of_args(all)
}

#[test]
fn ltl() {
    if has_z3() {
        run!(run_sat(ltl_files_dir, &[]))
    }
}

#[test]
fn ltl_incremental() {
    if has_z3() {
        run!(run_sat(ltl_files_dir, &["--incremental", "on"]))
    }
}

#[test]
fn sltl() {
    if has_z3() {
        run!(run_sat(sltl_files_dir, &["--sltl", "on"]))
    }
}

#[test]
fn grammar() {
    if has_z3() {
        run!(run_sat(grammar_files_dir, &["--grammar", "on"]))
    }
}

#[test]
fn err() {
    // All the errors happen before the solver is spawned.
    run!(run_err())
}

/// Input files of a directory.
fn files_of(dir: &str) -> Res<Vec<::std::path::PathBuf>> {
    let entries = map_err!(read_dir(dir), format!("while reading `{}`", dir));
    let mut files = vec![];
    for entry in entries {
        let entry = map_err!(entry, "while reading entry");
        let file_name = format!("{}", entry.file_name().to_string_lossy());
        if map_err!(
            entry.file_type(),
            "while reading entry (file type of `{}`)",
            file_name
        )
        .is_file()
        {
            files.push(entry.path())
        }
    }
    files.sort();
    Ok(files)
}

fn run_sat(dir: &str, args: &[&str]) -> Res<()> {
    let conf = conf(args)?;
    for file in files_of(dir)? {
        println!("looking at `{}`", file.display());
        let res = read_and_work(&conf, &file)
            .chain_err(|| format!("while running on `{}`", file.display()))?;
        let formula = match res.formula.as_ref() {
            Some(formula) => formula,
            None => bail!("no formula for `{}`", file.display()),
        };
        println!("  {} (size {})", formula, res.size);
        if !res.classif.is_perfect() {
            bail!(
                "`{}` does not separate the traces of `{}`",
                formula,
                file.display()
            )
        }
    }
    Ok(())
}

fn run_err() -> Res<()> {
    let conf = conf(&["--grammar", "on"])?;
    for file in files_of(err_files_dir)? {
        println!("looking at `{}`", file.display());
        if read_and_work(&conf, &file).is_ok() {
            bail!("expected an error on `{}`", file.display())
        }
    }

    // Located errors on traces.
    for name in &["bad_field", "bad_repetition", "bad_width"] {
        let file = format!("{}/{}.trace", err_files_dir, name);
        match read_and_work(&conf, &file) {
            Err(e) if e.is_parse_error() => (),
            Err(e) => bail!(e.chain_err(|| format!("expected a parse error on `{}`", file))),
            Ok(_) => bail!("expected an error on `{}`", file),
        }
    }
    Ok(())
}
