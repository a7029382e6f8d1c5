//! Ledger storage error types
//!
//! Error codes:
//! - LEDGER_STORAGE_IO_ERROR (ERROR severity)
//! - LEDGER_STORAGE_WRITE_FAILED (ERROR severity)
//! - LEDGER_DATA_CORRUPTION (FATAL severity)
//! - LEDGER_BUSY (ERROR severity)

use std::fmt;
use std::io;
use std::path::Path;

/// Severity of a storage failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Operation fails, process continues
    Error,
    /// The snapshot cannot be trusted; the process must not continue with it
    Fatal,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "ERROR"),
            Severity::Fatal => write!(f, "FATAL"),
        }
    }
}

/// Storage error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageErrorCode {
    /// Disk I/O failure while reading
    LedgerStorageIoError,
    /// Snapshot write or fsync failed
    LedgerStorageWriteFailed,
    /// Checksum or framing failure in a snapshot
    LedgerDataCorruption,
    /// Another process holds the ledger lock
    LedgerBusy,
}

impl StorageErrorCode {
    pub fn code(&self) -> &'static str {
        match self {
            StorageErrorCode::LedgerStorageIoError => "LEDGER_STORAGE_IO_ERROR",
            StorageErrorCode::LedgerStorageWriteFailed => "LEDGER_STORAGE_WRITE_FAILED",
            StorageErrorCode::LedgerDataCorruption => "LEDGER_DATA_CORRUPTION",
            StorageErrorCode::LedgerBusy => "LEDGER_BUSY",
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            StorageErrorCode::LedgerDataCorruption => Severity::Fatal,
            _ => Severity::Error,
        }
    }
}

impl fmt::Display for StorageErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Storage error with code, message and optional context
#[derive(Debug)]
pub struct StorageError {
    code: StorageErrorCode,
    message: String,
    details: Option<String>,
    source: Option<io::Error>,
}

impl StorageError {
    pub fn io_error(message: impl Into<String>, source: io::Error) -> Self {
        Self {
            code: StorageErrorCode::LedgerStorageIoError,
            message: message.into(),
            details: None,
            source: Some(source),
        }
    }

    pub fn write_failed(message: impl Into<String>, source: io::Error) -> Self {
        Self {
            code: StorageErrorCode::LedgerStorageWriteFailed,
            message: message.into(),
            details: None,
            source: Some(source),
        }
    }

    /// Corruption found at a byte offset of the snapshot file
    pub fn corruption_at_offset(offset: u64, reason: impl Into<String>) -> Self {
        Self {
            code: StorageErrorCode::LedgerDataCorruption,
            message: reason.into(),
            details: Some(format!("byte_offset: {}", offset)),
            source: None,
        }
    }

    /// The lock at `path` stayed held for the whole wait
    pub fn busy(path: &Path, holder: Option<String>) -> Self {
        Self {
            code: StorageErrorCode::LedgerBusy,
            message: format!(
                "Ledger is locked by another process; remove {} if no notedger process is running",
                path.display()
            ),
            details: holder.map(|pid| format!("holder_pid: {}", pid)),
            source: None,
        }
    }

    pub fn code(&self) -> StorageErrorCode {
        self.code
    }

    pub fn severity(&self) -> Severity {
        self.code.severity()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn details(&self) -> Option<&str> {
        self.details.as_deref()
    }

    pub fn is_fatal(&self) -> bool {
        self.severity() == Severity::Fatal
    }
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.code.severity(), self.code.code(), self.message)?;
        if let Some(ref details) = self.details {
            write!(f, " ({})", details)?;
        }
        Ok(())
    }
}

impl std::error::Error for StorageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source.as_ref().map(|e| e as &(dyn std::error::Error + 'static))
    }
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;
