//! Ed25519 signing keypairs

use ed25519_dalek::{Signer, SigningKey};
use rand::rngs::OsRng;

use super::{decode_key_bytes, encode_key_bytes, Identity, IdentityResult};

/// Width of an ed25519 signature in bytes
pub const SIGNATURE_LEN: usize = 64;

/// A signing keypair whose public half is an [`Identity`]
#[derive(Clone)]
pub struct Keypair {
    signing_key: SigningKey,
}

impl Keypair {
    /// Generate a fresh keypair from the OS RNG
    pub fn generate() -> Self {
        Self {
            signing_key: SigningKey::generate(&mut OsRng),
        }
    }

    /// Rebuild a keypair from its 32-byte secret
    pub fn from_secret_bytes(secret: [u8; 32]) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(&secret),
        }
    }

    /// Parse a keypair from the base64 secret used in key files
    pub fn from_base64(text: &str) -> IdentityResult<Self> {
        decode_key_bytes(text).map(Self::from_secret_bytes)
    }

    /// Secret key as base64, for key files
    pub fn secret_base64(&self) -> String {
        encode_key_bytes(&self.signing_key.to_bytes())
    }

    /// The public identity of this keypair
    pub fn identity(&self) -> Identity {
        Identity::new(self.signing_key.verifying_key().to_bytes())
    }

    /// Sign a message, returning the raw signature bytes
    pub fn sign(&self, message: &[u8]) -> [u8; SIGNATURE_LEN] {
        self.signing_key.sign(message).to_bytes()
    }
}

impl std::fmt::Debug for Keypair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // never print the secret half
        write!(f, "Keypair({})", self.identity())
    }
}
