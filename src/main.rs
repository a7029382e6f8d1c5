//! notedger CLI entry point
//!
//! All logic is delegated to the CLI module, which has already printed the
//! JSON error object when `run` fails.

use notedger::cli;

fn main() {
    if cli::run().is_err() {
        std::process::exit(1);
    }
}
