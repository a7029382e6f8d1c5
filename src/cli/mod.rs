//! CLI module for notedger
//!
//! Provides command-line interface for:
//! - init / keygen: set up a data directory and signing keys
//! - airdrop / balance: fund and inspect identities
//! - address: derive a note address without touching the ledger
//! - create / update / delete: signed note operations
//! - show / list: read notes

mod args;
mod commands;
mod config;
mod errors;
mod io;

pub use args::{Cli, Command, ConfigArg};
pub use commands::{
    address, airdrop, balance, create, delete, init, keygen, list, run, run_command, show, update,
};
pub use config::Config;
pub use errors::{CliError, CliErrorCode, CliResult};
pub use io::{read_keypair, write_error, write_keypair, write_response};
