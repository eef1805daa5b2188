//! Run a given lambda calculus program and print the result to standard
//! output, or start an interactive session when no program is given.
//!
//! Example usage:
//!
//!     cargo run -- \
//!         --src-filepath demos/church_arithmetic.lc \
//!         --max-iter 1000

use clap::Parser;
use rust_lambda_rewrite::end_to_end::{run_interpreter, InterpreterConfig};
use tracing::Level;

fn main() {
    let interpreter_config = InterpreterConfig::parse();

    let log_level = if interpreter_config.verbose {
        Level::DEBUG
    } else {
        Level::WARN
    };
    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .init();

    let interpreter_result = run_interpreter(&interpreter_config);

    match interpreter_result {
        Ok(execution_result) => {
            if !execution_result.is_empty() {
                println!("{}", execution_result);
            }
        }

        Err(run_error) => {
            eprintln!("{}", run_error);
            std::process::exit(1);
        }
    }
}
