//! CLI command implementations
//!
//! Every command loads the configuration, opens the ledger snapshot,
//! performs one operation and, if the operation changed the ledger, writes
//! a new snapshot before reporting success. Commands that write hold the
//! ledger lock from load until the snapshot is replaced, so concurrent
//! invocations serialize. Commands return their JSON payload; [`run`]
//! prints it.

use std::fs;
use std::path::Path;
use std::time::Duration;

use chrono::Utc;
use serde::Serialize;
use serde_json::{json, Value};

use crate::address::Address;
use crate::identity::{Identity, Keypair};
use crate::notes::{Instruction, Invocation, NoteError, NoteProgram, SignedInvocation};
use crate::observability::{log_event_with_fields, Event, Logger};
use crate::storage::{self, Ledger, LedgerLock, MemoryLedger, SharedLedger, LEDGER_DIR};

use super::args::Command;
use super::config::Config;
use super::errors::{CliError, CliResult};
use super::io::{read_keypair, write_error, write_keypair, write_response};

/// How long a writing command waits for another to release the ledger
const LOCK_WAIT: Duration = Duration::from_secs(5);

/// Main CLI entry point
///
/// Parses arguments, dispatches, and prints exactly one JSON object.
/// This is the only function that main.rs should call.
pub fn run() -> CliResult<()> {
    let cli = super::args::Cli::parse_args();
    match run_command(cli.command) {
        Ok(data) => write_response(data),
        Err(e) => {
            write_error(e.code_str(), e.message())?;
            Err(e)
        }
    }
}

/// Run the appropriate command based on CLI args
pub fn run_command(cmd: Command) -> CliResult<Value> {
    match cmd {
        Command::Init { config } => init(&config.config),
        Command::Keygen { config, out, force } => keygen(&config.config, &out, force),
        Command::Airdrop {
            config,
            recipient,
            amount,
        } => airdrop(&config.config, &recipient, amount),
        Command::Address {
            config,
            owner,
            title,
        } => address(&config.config, &owner, &title),
        Command::Create {
            config,
            key,
            title,
            content,
        } => create(&config.config, &key, &title, &content),
        Command::Update {
            config,
            key,
            address,
            title,
            content,
        } => update(
            &config.config,
            &key,
            &address,
            title.as_deref(),
            content.as_deref(),
        ),
        Command::Delete {
            config,
            key,
            address,
        } => delete(&config.config, &key, &address),
        Command::Show { config, address } => show(&config.config, &address),
        Command::List { config, owner } => list(&config.config, &owner),
        Command::Balance { config, identity } => balance(&config.config, &identity),
    }
}

/// Create the ledger directory and an empty snapshot
pub fn init(config_path: &Path) -> CliResult<Value> {
    let config = load_config(config_path)?;
    let data_dir = config.data_path();

    if is_initialized(data_dir) {
        return Err(CliError::already_initialized());
    }

    let ledger_dir = data_dir.join(LEDGER_DIR);
    fs::create_dir_all(&ledger_dir).map_err(|e| {
        CliError::config_error(format!("Failed to create directory {:?}: {}", ledger_dir, e))
    })?;
    storage::persist_ledger(data_dir, &MemoryLedger::new())?;

    Ok(json!({"initialized": true, "data_dir": config.data_dir}))
}

/// Generate a key file
pub fn keygen(config_path: &Path, out: &Path, force: bool) -> CliResult<Value> {
    load_config(config_path)?;
    let keypair = Keypair::generate();
    write_keypair(out, &keypair, force)?;
    Ok(json!({"identity": keypair.identity(), "key_file": out.display().to_string()}))
}

/// Credit an identity. Stands in for a funding source.
pub fn airdrop(config_path: &Path, recipient: &str, amount: u64) -> CliResult<Value> {
    let recipient = parse_identity("recipient", recipient)?;
    let session = Session::open_for_write(config_path)?;

    let balance = {
        let mut ledger = session.ledger.write();
        ledger.credit(recipient, amount);
        ledger.balance(&recipient)
    };
    log_event_with_fields(
        Event::Airdrop,
        &[
            ("recipient", recipient.to_base64().as_str()),
            ("amount", amount.to_string().as_str()),
        ],
    );
    session.persist()?;

    Ok(json!({"recipient": recipient, "balance": balance}))
}

/// Derive the canonical address of `(owner, title)`
pub fn address(config_path: &Path, owner: &str, title: &str) -> CliResult<Value> {
    let config = load_config(config_path)?;
    let owner = parse_identity("owner", owner)?;
    let (address, bump) = config
        .deriver()?
        .note_address(&owner, title)
        .map_err(NoteError::from)?;
    Ok(json!({"address": address, "bump": bump}))
}

pub fn create(config_path: &Path, key: &Path, title: &str, content: &str) -> CliResult<Value> {
    let keypair = read_keypair(key)?;
    let session = Session::open_for_write(config_path)?;
    let signer = keypair.identity();

    let (address, _) = session
        .program
        .deriver()
        .note_address(&signer, title)
        .map_err(NoteError::from)?;

    let instruction = Instruction::CreateNote {
        title: title.to_string(),
        content: content.to_string(),
    };
    session.submit(&keypair, address, instruction)
}

pub fn update(
    config_path: &Path,
    key: &Path,
    address: &str,
    title: Option<&str>,
    content: Option<&str>,
) -> CliResult<Value> {
    let keypair = read_keypair(key)?;
    let address = parse_address(address)?;
    let session = Session::open_for_write(config_path)?;

    let instruction = Instruction::UpdateNote {
        new_title: title.map(str::to_string),
        new_content: content.map(str::to_string),
    };
    session.submit(&keypair, address, instruction)
}

pub fn delete(config_path: &Path, key: &Path, address: &str) -> CliResult<Value> {
    let keypair = read_keypair(key)?;
    let address = parse_address(address)?;
    let session = Session::open_for_write(config_path)?;
    session.submit(&keypair, address, Instruction::DeleteNote)
}

pub fn show(config_path: &Path, address: &str) -> CliResult<Value> {
    let address = parse_address(address)?;
    let session = Session::open(config_path)?;
    match session.program.fetch(&address)? {
        Some(note) => to_value(&note),
        None => Err(NoteError::NotFound { address }.into()),
    }
}

pub fn list(config_path: &Path, owner: &str) -> CliResult<Value> {
    let owner = parse_identity("owner", owner)?;
    let session = Session::open(config_path)?;

    let mut scan = session.program.list_by_owner(&owner);
    let notes = scan.by_ref().collect::<Result<Vec<_>, _>>()?;

    Ok(json!({
        "owner": owner,
        "count": notes.len(),
        "skipped": scan.skipped(),
        "notes": notes,
    }))
}

pub fn balance(config_path: &Path, identity: &str) -> CliResult<Value> {
    let identity = parse_identity("identity", identity)?;
    let session = Session::open(config_path)?;
    let balance = session.ledger.read().balance(&identity);
    Ok(json!({"identity": identity, "balance": balance}))
}

/// A loaded ledger and the program bound to it
struct Session {
    config: Config,
    ledger: SharedLedger<MemoryLedger>,
    program: NoteProgram<MemoryLedger>,
    // released on drop, after any persist
    _lock: Option<LedgerLock>,
}

impl Session {
    /// Read-only session. Snapshots are replaced by rename, so no lock.
    fn open(config_path: &Path) -> CliResult<Self> {
        Self::load(config_path, None)
    }

    /// Session that may persist; holds the ledger lock until dropped
    fn open_for_write(config_path: &Path) -> CliResult<Self> {
        Self::load(config_path, Some(LOCK_WAIT))
    }

    fn load(config_path: &Path, lock_wait: Option<Duration>) -> CliResult<Self> {
        let config = load_config(config_path)?;
        let data_dir = config.data_path();

        if !is_initialized(data_dir) {
            return Err(CliError::not_initialized());
        }

        let lock = match lock_wait {
            Some(wait) => Some(LedgerLock::acquire(data_dir, wait)?),
            None => None,
        };

        let ledger = match storage::load_ledger(data_dir) {
            Ok(ledger) => ledger,
            Err(e) => {
                log_event_with_fields(
                    Event::LedgerCorruption,
                    &[("error", e.to_string().as_str())],
                );
                return Err(e.into());
            }
        };
        log_event_with_fields(
            Event::LedgerLoaded,
            &[("accounts", ledger.account_count().to_string().as_str())],
        );

        let ledger = SharedLedger::new(ledger);
        let program = NoteProgram::new(
            ledger.clone(),
            config.deriver()?,
            config.rent(),
            config.decode_policy()?,
        );

        Ok(Self {
            config,
            ledger,
            program,
            _lock: lock,
        })
    }

    /// Sign, execute, and persist one invocation
    fn submit(
        &self,
        keypair: &Keypair,
        address: Address,
        instruction: Instruction,
    ) -> CliResult<Value> {
        let invocation = Invocation::new(address, keypair.identity(), instruction);
        let signed = SignedInvocation::sign(invocation, keypair);
        let outcome = self.program.submit(&signed, Utc::now().timestamp())?;
        self.persist()?;
        to_value(&outcome)
    }

    fn persist(&self) -> CliResult<()> {
        let snapshot = self.ledger.snapshot();
        let bytes = storage::persist_ledger(self.config.data_path(), &snapshot)?;
        log_event_with_fields(
            Event::LedgerPersisted,
            &[
                ("accounts", snapshot.account_count().to_string().as_str()),
                ("bytes", bytes.to_string().as_str()),
            ],
        );
        Ok(())
    }
}

fn load_config(config_path: &Path) -> CliResult<Config> {
    let config = Config::load(config_path)?;
    Logger::set_min_severity(config.log_severity()?);
    log_event_with_fields(Event::ConfigLoaded, &[("data_dir", config.data_dir.as_str())]);
    Ok(config)
}

/// Check if a data directory is initialized
fn is_initialized(data_dir: &Path) -> bool {
    storage::snapshot_path(data_dir).exists()
}

fn parse_identity(name: &str, text: &str) -> CliResult<Identity> {
    Identity::from_base64(text).map_err(|e| CliError::invalid_argument(name, e))
}

fn parse_address(text: &str) -> CliResult<Address> {
    Address::from_base64(text).map_err(|e| CliError::invalid_argument("address", e))
}

fn to_value<T: Serialize>(value: &T) -> CliResult<Value> {
    Ok(serde_json::to_value(value)?)
}
