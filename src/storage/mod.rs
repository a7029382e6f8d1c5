//! Ledger storage for notedger
//!
//! Holds the address-keyed account space the note engine operates on, and
//! the snapshot files that persist it between runs of the host shell.
//!
//! # Design Principles
//!
//! - Storage is injected through the [`Ledger`] trait, never a global
//! - Snapshots are whole-ledger, checksum-verified on every read
//! - A snapshot is replaced atomically (write temp, fsync, rename)
//! - Any corruption on load is fatal
//! - Writers hold an exclusive lock file from load until persist

mod errors;
mod frame;
mod ledger;
mod lock;
mod reader;
mod writer;

use std::path::Path;

pub use errors::{Severity, StorageError, StorageErrorCode, StorageResult};
pub use frame::LedgerFrame;
pub use ledger::{Account, Ledger, MemcmpFilter, MemoryLedger, SharedLedger};
pub use lock::{lock_path, LedgerLock, LOCK_FILE};
pub use reader::LedgerReader;
pub use writer::{snapshot_path, LedgerWriter, LEDGER_DIR};

/// Load the ledger persisted under `data_dir`.
///
/// A data directory without a snapshot yields an empty ledger.
pub fn load_ledger(data_dir: &Path) -> StorageResult<MemoryLedger> {
    let path = snapshot_path(data_dir);
    if !path.exists() {
        return Ok(MemoryLedger::new());
    }
    LedgerReader::open(&path)?.load_ledger()
}

/// Persist `ledger` under `data_dir`, replacing any previous snapshot.
pub fn persist_ledger(data_dir: &Path, ledger: &MemoryLedger) -> StorageResult<u64> {
    LedgerWriter::open(data_dir)?.persist(ledger)
}
