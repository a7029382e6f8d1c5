//! Snapshot writer with fsync enforcement
//!
//! A snapshot is never rewritten in place. The full ledger is written to a
//! temporary sibling, fsynced, then renamed over the previous snapshot, so a
//! crash leaves either the old or the new snapshot intact.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use super::errors::{StorageError, StorageResult};
use super::frame::LedgerFrame;
use super::ledger::{Ledger, MemoryLedger};

/// Directory under the data dir holding the snapshot
pub const LEDGER_DIR: &str = "ledger";

/// Snapshot file name
pub const SNAPSHOT_FILE: &str = "ledger.dat";

/// Returns `<data_dir>/ledger/ledger.dat`
pub fn snapshot_path(data_dir: &Path) -> PathBuf {
    data_dir.join(LEDGER_DIR).join(SNAPSHOT_FILE)
}

/// Writes complete ledger snapshots into a data directory
pub struct LedgerWriter {
    snapshot_path: PathBuf,
}

impl LedgerWriter {
    /// Prepare a writer, creating `<data_dir>/ledger` if needed.
    pub fn open(data_dir: &Path) -> StorageResult<Self> {
        let ledger_dir = data_dir.join(LEDGER_DIR);
        if !ledger_dir.exists() {
            fs::create_dir_all(&ledger_dir).map_err(|e| {
                StorageError::write_failed(
                    format!("Failed to create ledger directory: {}", ledger_dir.display()),
                    e,
                )
            })?;
        }

        Ok(Self {
            snapshot_path: snapshot_path(data_dir),
        })
    }

    pub fn path(&self) -> &Path {
        &self.snapshot_path
    }

    /// Persist the whole ledger. Returns the snapshot size in bytes.
    ///
    /// # Errors
    ///
    /// `LEDGER_STORAGE_WRITE_FAILED` if any write, fsync or rename fails.
    pub fn persist(&self, ledger: &MemoryLedger) -> StorageResult<u64> {
        let mut bytes = Vec::new();
        for (address, account) in ledger.accounts() {
            bytes.extend_from_slice(
                &LedgerFrame::Account {
                    address: *address,
                    account: account.clone(),
                }
                .serialize(),
            );
        }
        for (identity, amount) in ledger.balances() {
            bytes.extend_from_slice(
                &LedgerFrame::Balance {
                    identity: *identity,
                    amount: *amount,
                }
                .serialize(),
            );
        }

        let tmp_path = self.snapshot_path.with_extension("dat.tmp");
        {
            let mut file = OpenOptions::new()
                .create(true)
                .write(true)
                .truncate(true)
                .open(&tmp_path)
                .map_err(|e| {
                    StorageError::write_failed(
                        format!("Failed to open temporary snapshot: {}", tmp_path.display()),
                        e,
                    )
                })?;

            file.write_all(&bytes)
                .map_err(|e| StorageError::write_failed("Failed to write snapshot", e))?;

            // fsync before rename, mandatory for durability
            file.sync_all()
                .map_err(|e| StorageError::write_failed("fsync failed on snapshot", e))?;
        }

        fs::rename(&tmp_path, &self.snapshot_path).map_err(|e| {
            StorageError::write_failed(
                format!("Failed to install snapshot: {}", self.snapshot_path.display()),
                e,
            )
        })?;

        #[cfg(unix)]
        if let Some(dir) = self.snapshot_path.parent() {
            File::open(dir)
                .and_then(|d| d.sync_all())
                .map_err(|e| StorageError::write_failed("fsync failed on ledger directory", e))?;
        }

        Ok(bytes.len() as u64)
    }
}
