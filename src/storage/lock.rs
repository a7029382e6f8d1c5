//! Exclusive ledger lock
//!
//! A writer loads the whole snapshot, changes it in memory and writes it
//! back. Two writers overlapping would lose one of the commits, so every
//! writer holds `<data_dir>/ledger/ledger.lock` for that whole span. The
//! file is created with `create_new`, which fails if it already exists, and
//! removed when the [`LedgerLock`] is dropped.

use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

use super::errors::{StorageError, StorageResult};
use super::writer::LEDGER_DIR;

/// Lock file name
pub const LOCK_FILE: &str = "ledger.lock";

const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Returns `<data_dir>/ledger/ledger.lock`
pub fn lock_path(data_dir: &Path) -> PathBuf {
    data_dir.join(LEDGER_DIR).join(LOCK_FILE)
}

/// Held lock on a data directory's ledger
#[derive(Debug)]
pub struct LedgerLock {
    path: PathBuf,
}

impl LedgerLock {
    /// Take the lock, polling until `wait` elapses.
    ///
    /// # Errors
    ///
    /// `LEDGER_BUSY` if another holder keeps it for the whole wait,
    /// `LEDGER_STORAGE_IO_ERROR` if the lock file cannot be created.
    pub fn acquire(data_dir: &Path, wait: Duration) -> StorageResult<Self> {
        let path = lock_path(data_dir);
        let deadline = Instant::now() + wait;

        loop {
            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(mut file) => {
                    // holder pid is informational; the lock is the file itself
                    let _ = writeln!(file, "{}", std::process::id());
                    return Ok(Self { path });
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    if Instant::now() >= deadline {
                        let holder = fs::read_to_string(&path)
                            .ok()
                            .map(|pid| pid.trim().to_string())
                            .filter(|pid| !pid.is_empty());
                        return Err(StorageError::busy(&path, holder));
                    }
                    thread::sleep(POLL_INTERVAL);
                }
                Err(e) => {
                    return Err(StorageError::io_error(
                        format!("Failed to create lock file: {}", path.display()),
                        e,
                    ));
                }
            }
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for LedgerLock {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.path);
    }
}
