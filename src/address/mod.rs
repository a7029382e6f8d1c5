//! Deterministic note addressing
//!
//! A note's address is a pure function of `(namespace, owner, title)` and
//! the deployment's program id. See [`AddressDeriver`] for the algorithm.

mod deriver;

pub use deriver::{AddressDeriver, DEFAULT_PROGRAM_ID, MAX_SEED_LEN, NOTE_NAMESPACE};

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

use crate::identity::{decode_key_bytes, encode_key_bytes, IdentityResult};

/// Width of an address in bytes
pub const ADDRESS_LEN: usize = 32;

/// Storage key of a note slot
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Address([u8; ADDRESS_LEN]);

impl Address {
    /// Wrap raw address bytes
    pub const fn new(bytes: [u8; ADDRESS_LEN]) -> Self {
        Self(bytes)
    }

    /// Returns the raw address bytes
    pub fn as_bytes(&self) -> &[u8; ADDRESS_LEN] {
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
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_base64())
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.to_base64())
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_base64())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Address::from_base64(&text).map_err(serde::de::Error::custom)
    }
}

/// Why an address could not be derived
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DerivationError {
    /// A seed component exceeded the per-seed limit
    #[error("seed too long: {len} bytes (max {max})")]
    SeedTooLong { len: usize, max: usize },

    /// The candidate for this bump is a valid identity point
    #[error("candidate for bump {bump} lies on the identity curve")]
    OnCurve { bump: u8 },

    /// Every bump from 255 down to 0 produced an on-curve candidate
    #[error("no valid bump found in 256 candidates")]
    Exhausted,
}
