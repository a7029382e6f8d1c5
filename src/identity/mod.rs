//! Caller identities for notedger
//!
//! An identity is the 32-byte ed25519 verifying key of a signer. It is the
//! owner handle stored in every note and the subject every owner-gated
//! operation is checked against.
//!
//! # Invariants
//!
//! - Owner comparisons are constant-time (`Identity::ct_eq`)
//! - Textual form is unpadded URL-safe base64 of the raw key bytes

mod authenticator;
mod keypair;

pub use authenticator::{Authenticator, PreverifiedSigner, SignatureAuthenticator};
pub use keypair::{Keypair, SIGNATURE_LEN};

use std::fmt;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use subtle::ConstantTimeEq;
use thiserror::Error;

/// Width of an identity in bytes
pub const IDENTITY_LEN: usize = 32;

/// Result type for identity parsing
pub type IdentityResult<T> = Result<T, IdentityError>;

/// Errors raised while parsing identities and key material
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentityError {
    /// Text was not valid base64
    #[error("Invalid base64 encoding: {0}")]
    InvalidEncoding(String),

    /// Decoded bytes had the wrong width
    #[error("Expected {expected} bytes, got {actual}")]
    InvalidLength { expected: usize, actual: usize },
}

/// Decode a base64 string into a fixed 32-byte array.
pub(crate) fn decode_key_bytes(text: &str) -> IdentityResult<[u8; 32]> {
    let bytes = URL_SAFE_NO_PAD
        .decode(text.trim())
        .map_err(|e| IdentityError::InvalidEncoding(e.to_string()))?;
    let actual = bytes.len();
    bytes
        .try_into()
        .map_err(|_| IdentityError::InvalidLength {
            expected: IDENTITY_LEN,
            actual,
        })
}

/// Encode raw key bytes as unpadded URL-safe base64.
pub(crate) fn encode_key_bytes(bytes: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(bytes)
}

/// A signer's public identity
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Identity([u8; IDENTITY_LEN]);

impl Identity {
    /// Wrap raw verifying-key bytes
    pub const fn new(bytes: [u8; IDENTITY_LEN]) -> Self {
        Self(bytes)
    }

    /// Returns the raw key bytes
    pub fn as_bytes(&self) -> &[u8; IDENTITY_LEN] {
        &self.0
    }

    /// Parse from the base64 text form
    pub fn from_base64(text: &str) -> IdentityResult<Self> {
        decode_key_bytes(text).map(Self)
    }

    /// Render as base64 text
    pub fn to_base64(&self) -> String {
        encode_key_bytes(&self.0)
    }

    /// Constant-time equality, used for every ownership check
    pub fn ct_eq(&self, other: &Identity) -> bool {
        self.0.ct_eq(&other.0).into()
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_base64())
    }
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Identity({})", self.to_base64())
    }
}

impl Serialize for Identity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_base64())
    }
}

impl<'de> Deserialize<'de> for Identity {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Identity::from_base64(&text).map_err(serde::de::Error::custom)
    }
}
