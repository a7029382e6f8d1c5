//! Authentication capability for owner-gated operations
//!
//! The record store never checks signatures itself. Each operation is handed
//! an [`Authenticator`] that answers one question: did the caller prove
//! control of the claimed identity?

use ed25519_dalek::{Signature, VerifyingKey};

use super::keypair::SIGNATURE_LEN;
use super::Identity;

/// Proof-of-control check for a claimed identity
pub trait Authenticator {
    /// Returns true if the caller controls `claimed`
    fn verify(&self, claimed: &Identity) -> bool;
}

/// Verifies an ed25519 signature over an invocation message
#[derive(Debug, Clone)]
pub struct SignatureAuthenticator<'a> {
    message: &'a [u8],
    signature: [u8; SIGNATURE_LEN],
}

impl<'a> SignatureAuthenticator<'a> {
    /// Create an authenticator for one signed message
    pub fn new(message: &'a [u8], signature: [u8; SIGNATURE_LEN]) -> Self {
        Self { message, signature }
    }
}

impl Authenticator for SignatureAuthenticator<'_> {
    fn verify(&self, claimed: &Identity) -> bool {
        let key = match VerifyingKey::from_bytes(claimed.as_bytes()) {
            Ok(key) => key,
            Err(_) => return false,
        };
        let signature = Signature::from_bytes(&self.signature);
        key.verify_strict(self.message, &signature).is_ok()
    }
}

/// An identity whose signature the host has already checked
#[derive(Debug, Clone, Copy)]
pub struct PreverifiedSigner(pub Identity);

impl Authenticator for PreverifiedSigner {
    fn verify(&self, claimed: &Identity) -> bool {
        self.0.ct_eq(claimed)
    }
}
