//! CLI-specific error types
//!
//! Failures from the layers below keep their own code in the output so a
//! caller can tell `NOTE_NOT_FOUND` from `LEDGER_DATA_CORRUPTION`.

use std::fmt;
use std::io;

use crate::identity::IdentityError;
use crate::notes::NoteError;
use crate::storage::{Severity, StorageError};

/// CLI error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CliErrorCode {
    /// Configuration file error
    ConfigError,
    /// I/O error (stdout, key files)
    IoError,
    /// Already initialized
    AlreadyInitialized,
    /// Not initialized
    NotInitialized,
    /// Key file missing, malformed or already present
    KeyFileError,
    /// Argument could not be parsed
    InvalidArgument,
    /// A note operation was rejected
    Note(&'static str),
    /// The ledger snapshot could not be read or written
    Ledger(&'static str),
}

impl CliErrorCode {
    /// Get the error code string
    pub fn code(&self) -> &'static str {
        match self {
            Self::ConfigError => "CLI_CONFIG_ERROR",
            Self::IoError => "CLI_IO_ERROR",
            Self::AlreadyInitialized => "CLI_ALREADY_INITIALIZED",
            Self::NotInitialized => "CLI_NOT_INITIALIZED",
            Self::KeyFileError => "CLI_KEY_FILE_ERROR",
            Self::InvalidArgument => "CLI_INVALID_ARGUMENT",
            Self::Note(code) | Self::Ledger(code) => code,
        }
    }
}

/// CLI error
#[derive(Debug)]
pub struct CliError {
    code: CliErrorCode,
    message: String,
    fatal: bool,
}

impl CliError {
    /// Create a new CLI error
    pub fn new(code: CliErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            fatal: false,
        }
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::ConfigError, msg)
    }

    pub fn io_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::IoError, msg)
    }

    pub fn already_initialized() -> Self {
        Self::new(
            CliErrorCode::AlreadyInitialized,
            "Data directory already initialized",
        )
    }

    pub fn not_initialized() -> Self {
        Self::new(
            CliErrorCode::NotInitialized,
            "Data directory not initialized. Run 'notedger init' first.",
        )
    }

    pub fn key_file(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::KeyFileError, msg)
    }

    pub fn invalid_argument(name: &str, reason: impl fmt::Display) -> Self {
        Self::new(
            CliErrorCode::InvalidArgument,
            format!("Invalid --{}: {}", name, reason),
        )
    }

    /// Get the error code
    pub fn code(&self) -> &CliErrorCode {
        &self.code
    }

    /// Get the error code string
    pub fn code_str(&self) -> &'static str {
        self.code.code()
    }

    /// Get the error message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// True if the ledger on disk cannot be trusted
    pub fn is_fatal(&self) -> bool {
        self.fatal
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.code(), self.message)
    }
}

impl std::error::Error for CliError {}

impl From<io::Error> for CliError {
    fn from(e: io::Error) -> Self {
        Self::io_error(e.to_string())
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        Self::io_error(format!("JSON error: {}", e))
    }
}

impl From<NoteError> for CliError {
    fn from(e: NoteError) -> Self {
        Self::new(CliErrorCode::Note(e.code()), e.to_string())
    }
}

impl From<StorageError> for CliError {
    fn from(e: StorageError) -> Self {
        Self {
            code: CliErrorCode::Ledger(e.code().code()),
            message: e.to_string(),
            fatal: e.severity() == Severity::Fatal,
        }
    }
}

impl From<IdentityError> for CliError {
    fn from(e: IdentityError) -> Self {
        Self::new(CliErrorCode::InvalidArgument, e.to_string())
    }
}

/// CLI result type
pub type CliResult<T> = Result<T, CliError>;
