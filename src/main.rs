use std::{env::args, path::Path, process::exit, time::Duration};

use pretty_env_logger::formatted_builder;
use satyr::{
    parser::{self, parse_file},
    prelude::*,
    report::Report,
    solver::{
        Brancher, Budget, DpllSolver, FirstUnassigned, LoadError, MaxOccurrence, RandomOrder,
        Solver, Verdict,
    },
};

// Conventional SAT-competition exit codes.
const EXIT_SAT: i32 = 10;
const EXIT_UNSAT: i32 = 20;
const EXIT_TIMEOUT: i32 = 30;

fn usage_string() -> String {
    format!(
        "Usage: {} <brancher> <command>

brancher: max-occurrence, first-unassigned, random

command:
    check <file_name> [timeout_seconds] - solve the given CNF file",
        args().next().unwrap()
    )
}

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("Unknown brancher '{}'\n\n{}", name, usage_string()))]
    UnknownBrancher { name: String },
    #[snafu(display("Unknown command '{}'\n\n{}", name, usage_string()))]
    UnknownCommand { name: String },
    #[snafu(display("Failed to parse CNF"))]
    ParserError { source: parser::Error },
    #[snafu(display("Failed to load the formula"))]
    SolverError { source: LoadError },
    #[snafu(display("Invalid timeout '{}'", value))]
    InvalidTimeout {
        value: String,
        source: std::num::ParseIntError,
    },
    #[snafu(display("Required argument does not exist\n\n{}", usage_string()))]
    MissingArgument,
}

fn solve_path<B: Brancher + Default>(path: &Path, budget: &Budget) -> Result<Verdict, Error> {
    let formula = parse_file(path).context(ParserError)?;
    let solver = DpllSolver::<B>::new(formula).context(SolverError)?;
    Ok(solver.solve_within(budget))
}

fn dispatch_command<B: Brancher + Default>(args: Vec<String>) -> Result<(), Error> {
    match args.get(0).map(|s| s.as_str()) {
        Some("check") => {
            let path = args.get(1).context(MissingArgument)?;
            let budget = match args.get(2) {
                Some(value) => {
                    let seconds = value
                        .parse::<u64>()
                        .context(InvalidTimeout { value: value.clone() })?;
                    Budget::timeout(Duration::from_secs(seconds))
                }
                None => Budget::unlimited(),
            };

            match solve_path::<B>(path.as_ref(), &budget)? {
                Verdict::Sat(model) => {
                    println!("SAT");
                    println!("{}", model.dimacs());
                    exit(EXIT_SAT);
                }
                Verdict::Unsat => {
                    println!("UNSAT");
                    exit(EXIT_UNSAT);
                }
                Verdict::Timeout => {
                    println!("TIMEOUT");
                    exit(EXIT_TIMEOUT);
                }
            }
        }
        Some(name) => UnknownCommand {
            name: name.to_owned(),
        }
        .fail()?,
        None => MissingArgument.fail()?,
    }

    Ok(())
}

fn init_logger() {
    let mut builder = formatted_builder();

    if let Ok(s) = ::std::env::var("RUST_LOG") {
        builder.parse_filters(&s);
    } else {
        if cfg!(debug_assertions) {
            builder.parse_filters("satyr=debug");
        } else {
            builder.parse_filters("satyr=warn");
        }
    }

    builder.try_init().expect("Failed to initialize the logger");
}

fn main() -> Result<(), Report> {
    init_logger();

    let mut args = args();

    // drop arg[0]
    args.next();

    // brancher name
    let brancher_name = args.next();
    let remaining: Vec<_> = args.collect();

    match brancher_name.as_deref() {
        Some("max-occurrence") => dispatch_command::<MaxOccurrence>(remaining)?,
        Some("first-unassigned") => dispatch_command::<FirstUnassigned>(remaining)?,
        Some("random") => dispatch_command::<RandomOrder>(remaining)?,
        Some(name) => UnknownBrancher {
            name: name.to_owned(),
        }
        .fail()?,
        None => {
            println!("{}", usage_string());
        }
    }

    Ok(())
}
