//! CLI argument definitions using clap
//!
//! Commands:
//! - notedger init --config <path>
//! - notedger keygen --out <path>
//! - notedger airdrop --recipient <identity> --amount <n>
//! - notedger address --owner <identity> --title <title>
//! - notedger create --key <path> --title <title> --content <content>
//! - notedger update --key <path> --address <address> [--title] [--content]
//! - notedger delete --key <path> --address <address>
//! - notedger show --address <address>
//! - notedger list --owner <identity>
//! - notedger balance --identity <identity>

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// notedger - owner-scoped notes at derived addresses
#[derive(Parser, Debug)]
#[command(name = "notedger")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// Location of the configuration file, shared by every command
#[derive(Args, Debug, Clone)]
pub struct ConfigArg {
    /// Path to configuration file
    #[arg(long, default_value = "./notedger.json")]
    pub config: PathBuf,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Initialize a new data directory with an empty ledger
    Init {
        #[command(flatten)]
        config: ConfigArg,
    },

    /// Generate a signing key file
    Keygen {
        #[command(flatten)]
        config: ConfigArg,

        /// Where to write the key file
        #[arg(long)]
        out: PathBuf,

        /// Overwrite an existing key file
        #[arg(long)]
        force: bool,
    },

    /// Credit an identity's balance
    Airdrop {
        #[command(flatten)]
        config: ConfigArg,

        /// Identity to credit (base64)
        #[arg(long)]
        recipient: String,

        /// Amount in lamports
        #[arg(long)]
        amount: u64,
    },

    /// Derive the note address for an owner and title
    Address {
        #[command(flatten)]
        config: ConfigArg,

        /// Owner identity (base64)
        #[arg(long)]
        owner: String,

        #[arg(long)]
        title: String,
    },

    /// Create a note owned by the key's identity
    Create {
        #[command(flatten)]
        config: ConfigArg,

        /// Signing key file
        #[arg(long)]
        key: PathBuf,

        #[arg(long)]
        title: String,

        #[arg(long)]
        content: String,
    },

    /// Change a note's title and/or content
    Update {
        #[command(flatten)]
        config: ConfigArg,

        /// Signing key file
        #[arg(long)]
        key: PathBuf,

        /// Note address (base64)
        #[arg(long)]
        address: String,

        /// New title; moves the note to the new title's address
        #[arg(long)]
        title: Option<String>,

        #[arg(long)]
        content: Option<String>,
    },

    /// Delete a note and refund its deposit
    Delete {
        #[command(flatten)]
        config: ConfigArg,

        /// Signing key file
        #[arg(long)]
        key: PathBuf,

        /// Note address (base64)
        #[arg(long)]
        address: String,
    },

    /// Print one note
    Show {
        #[command(flatten)]
        config: ConfigArg,

        /// Note address (base64)
        #[arg(long)]
        address: String,
    },

    /// List the notes of one owner
    List {
        #[command(flatten)]
        config: ConfigArg,

        /// Owner identity (base64)
        #[arg(long)]
        owner: String,
    },

    /// Print an identity's balance
    Balance {
        #[command(flatten)]
        config: ConfigArg,

        /// Identity (base64)
        #[arg(long)]
        identity: String,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
