//! Entry point for the binary.

use ltl_synth::common::*;

fn main() {
    let conf = match Config::clap() {
        Ok(conf) => conf,
        Err(errs) => {
            print_err(&errs);
            ::std::process::exit(2)
        }
    };
    init_output(conf.verb, conf.color);

    // Work and report error if any.
    if let Err(errs) = ::ltl_synth::work(&conf) {
        let errs = match *errs.kind() {
            ErrorKind::Z3SpawnError => format!(
                "could not spawn z3 using command `{}`\n\
                 make sure the z3 binary has that name and is in your path,\n\
                 or specify a different z3 command with option `{}`",
                conf.emph(conf.solver.cmd()),
                conf.emph("--z3")
            )
            .into(),
            _ => errs,
        };
        print_err(&errs);
        ::std::process::exit(2)
    } else {
        ::std::process::exit(0)
    }
}
