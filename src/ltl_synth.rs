//! Learns LTL and signal LTL formulas separating positive traces from
//! negative ones.
//!
//! Synthesis encodes the formula as a DAG of at most `n` nodes, and the
//! semantics of that DAG on every trace of the sample, as SMT constraints.
//! The DAG grows one node at a time until the solver finds a formula that
//! classifies the sample well enough. The smallest such formula is printed
//! on the standard output.
//!
//! Input files are described in the [`parse`] module, grammars restricting
//! the shape of the formulas in the [`grammar`] module.
//!
//! [`parse`]: parse/index.html (parse module)
//! [`grammar`]: grammar/index.html (grammar module)

#![doc(test(attr(deny(warnings))))]
#![allow(non_upper_case_globals)]

#[macro_use]
extern crate lazy_static;
#[macro_use]
extern crate mylib;
#[macro_use]
extern crate error_chain;

pub mod errors;
#[macro_use]
pub mod common;
pub mod dag;
pub mod domain;
pub mod expr;
pub mod formula;
pub mod grammar;
pub mod logic;
pub mod ops;
pub mod parse;
pub mod score;
pub mod synth;
pub mod term;
pub mod trace;
pub mod tracer;

#[cfg(test)]
mod tests;

use std::path::Path;

use crate::{
    common::*,
    logic::Logic,
    parse::Input,
    synth::{SolverResult, Synth},
};

/// Runs on all the input files of a configuration.
///
/// Errors on a file are reported and do not prevent working on the next
/// files.
pub fn work(conf: &Config) -> Res<()> {
    if conf.in_files().is_empty() {
        bail!("no input file provided")
    }
    let mut failed = 0;
    for file in conf.in_files() {
        match read_and_work(conf, file) {
            Ok(res) => {
                if let Some(formula) = res.formula.as_ref() {
                    println!("{}", formula)
                }
                report(conf, file, &res)?
            }
            Err(e) => {
                if conf.in_files().len() == 1 {
                    return Err(e);
                }
                failed += 1;
                print_err(&e.chain_err(|| format!("while working on `{}`", conf.emph(file))))
            }
        }
    }
    if failed > 0 {
        bail!("failed on {} of {} input file(s)", failed, conf.in_files().len())
    }
    Ok(())
}

/// Synthesizes a formula for an input file.
pub fn read_and_work<P: AsRef<Path>>(conf: &Config, path: P) -> Res<SolverResult> {
    let path = path.as_ref();
    let name = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().to_string())
        .unwrap_or_else(|| "input".into());
    log! { @info "working on `{}`", path.display() }
    let input = Input::of_file(path, conf.synth.sltl)?;
    if conf.synth.sltl {
        let logic = input.sltl()?;
        synthesize(conf, &name, logic, &input)
    } else {
        let logic = input.ltl()?;
        synthesize(conf, &name, logic, &input)
    }
}

/// Synthesizes a formula for an input in some logic.
pub fn synthesize<L: Logic>(
    conf: &Config,
    name: &str,
    logic: L,
    input: &Input,
) -> Res<SolverResult> {
    let pos = input.traces(&logic, true)?;
    let neg = input.traces(&logic, false)?;
    let grammar = input.grammar(conf.synth.grammar, logic.atom_count())?;

    let engine = Engine::spawn(&conf.solver, name, conf.out_dir())?;
    let mut synth = Synth::new(logic, pos, neg, grammar, &conf.synth, engine)?;
    let res = synth.find();
    let profiler = synth.destroy()?;
    let res = res?;

    log! { @info
        "learned a formula of size {} in {:.3}s ({:.3}s solving)",
        res.size, res.time.as_secs_f64(), res.solver_time.as_secs_f64()
    }
    if !res.classif.is_perfect() {
        log! { @info
            "{} score {} (goal {})", conf.synth.score, res.score, res.goal ;
            "false positives: {}", idx_list(&res.classif.false_pos) ;
            "false negatives: {}", idx_list(&res.classif.false_neg)
        }
    }

    print_stats(conf, name, profiler);
    Ok(res)
}

/// Space-separated list of trace indices.
fn idx_list(idxs: &[TrcIdx]) -> String {
    if idxs.is_empty() {
        return "none".into();
    }
    idxs.iter()
        .map(|idx| idx.to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Appends the report line of a file to the results file, if any.
///
/// Columns are the file, the formula, the size of the DAG, the score, the
/// goal, the false positives and negatives, the total time and the solving
/// time in seconds.
fn report(conf: &Config, file: &str, res: &SolverResult) -> Res<()> {
    use std::fs::OpenOptions;
    let path = match conf.results_file() {
        Some(path) => path,
        None => return Ok(()),
    };
    let mut out = OpenOptions::new()
        .append(true)
        .create(true)
        .open(path)
        .chain_err(|| format!("while opening results file `{}`", path))?;
    let formula = res
        .formula
        .as_ref()
        .map(|formula| formula.to_string())
        .unwrap_or_else(|| "-".into());
    writeln!(
        out,
        "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{:.3}\t{:.3}",
        file,
        formula,
        res.size,
        res.score,
        res.goal,
        res.classif.false_pos.len(),
        res.classif.false_neg.len(),
        res.time.as_secs_f64(),
        res.solver_time.as_secs_f64(),
    )
    .chain_err(|| format!("while writing to results file `{}`", path))?;
    Ok(())
}
