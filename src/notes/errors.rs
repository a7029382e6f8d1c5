//! # Note Errors
//!
//! Every failure of a note operation is a local, synchronous outcome. None
//! of them leaves partial state behind and none is retried internally.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

use super::layout::{LayoutError, MAX_CONTENT_LEN, MAX_TITLE_LEN};
use crate::address::{Address, DerivationError};

/// Result type for note operations
pub type NoteResult<T> = Result<T, NoteError>;

/// A length-bounded note field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Title,
    Content,
}

impl Field {
    /// Inclusive byte-length bounds
    pub fn bounds(&self) -> (usize, usize) {
        match self {
            Field::Title => (1, MAX_TITLE_LEN),
            Field::Content => (1, MAX_CONTENT_LEN),
        }
    }

    /// Check a value against this field's bounds (byte length, not chars)
    pub fn check(&self, value: &str) -> NoteResult<()> {
        let (min, max) = self.bounds();
        let len = value.len();
        if len < min || len > max {
            return Err(NoteError::InvalidLength {
                field: *self,
                len,
                min,
                max,
            });
        }
        Ok(())
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Field::Title => write!(f, "title"),
            Field::Content => write!(f, "content"),
        }
    }
}

/// Note operation errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NoteError {
    /// Seeds too long, or the bump search ran dry
    #[error("Address derivation failed: {0}")]
    AddressDerivationFailed(#[from] DerivationError),

    /// The supplied address is not the one the seeds and bump produce
    #[error("Address {address} does not match the note's derivation seeds")]
    AddressMismatch { address: Address },

    /// Create on a live slot
    #[error("Slot {address} is already occupied")]
    SlotOccupied { address: Address },

    /// Update or delete on an empty slot
    #[error("No note at {address}")]
    NotFound { address: Address },

    /// Caller did not authenticate as the stored owner.
    ///
    /// Carries nothing about the stored record.
    #[error("Unauthorized")]
    Unauthorized,

    /// A field violated its byte-length bounds
    #[error("{field} must be {min} to {max} bytes, got {len}")]
    InvalidLength {
        field: Field,
        len: usize,
        min: usize,
        max: usize,
    },

    /// Update named neither a new title nor new content
    #[error("Update must change the title or the content")]
    EmptyUpdate,

    /// Owner cannot cover the storage deposit
    #[error("Insufficient funds: {required} required, {available} available")]
    InsufficientFunds { required: u64, available: u64 },

    /// Slot data failed structural validation
    #[error("Cannot decode slot {address}: {reason}")]
    DecodeError { address: Address, reason: LayoutError },
}

impl NoteError {
    /// Stable error code
    pub fn code(&self) -> &'static str {
        match self {
            NoteError::AddressDerivationFailed(_) => "NOTE_ADDRESS_DERIVATION_FAILED",
            NoteError::AddressMismatch { .. } => "NOTE_ADDRESS_MISMATCH",
            NoteError::SlotOccupied { .. } => "NOTE_SLOT_OCCUPIED",
            NoteError::NotFound { .. } => "NOTE_NOT_FOUND",
            NoteError::Unauthorized => "NOTE_UNAUTHORIZED",
            NoteError::InvalidLength { .. } => "NOTE_INVALID_LENGTH",
            NoteError::EmptyUpdate => "NOTE_EMPTY_UPDATE",
            NoteError::InsufficientFunds { .. } => "NOTE_INSUFFICIENT_FUNDS",
            NoteError::DecodeError { .. } => "NOTE_DECODE_ERROR",
        }
    }

    /// True if the request itself was wrong, false if stored data is
    pub fn is_client_error(&self) -> bool {
        !matches!(self, NoteError::DecodeError { .. })
    }
}
