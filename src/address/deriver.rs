//! Address derivation with bump search
//!
//! ```text
//! candidate(bump) = SHA-256(namespace || owner || title || [bump] || program_id || MARKER)
//! ```
//!
//! A candidate is only usable if it is NOT a valid ed25519 point: such an
//! address can never coincide with the key of a real identity, so no signer
//! can ever claim authority over it directly. The search walks `bump` from
//! 255 down to 0 and returns the first usable candidate together with the
//! bump that produced it.

use curve25519_dalek::edwards::CompressedEdwardsY;
use sha2::{Digest, Sha256};

use super::{Address, DerivationError, ADDRESS_LEN};
use crate::identity::Identity;

/// Namespace tag for note records
pub const NOTE_NAMESPACE: &[u8] = b"note";

/// Per-seed byte limit for namespace and title
pub const MAX_SEED_LEN: usize = 50;

/// Program id used when the configuration does not name one
pub const DEFAULT_PROGRAM_ID: [u8; 32] = *b"notedger::notes::program::v1::00";

/// Domain separator appended to every candidate hash
const DERIVATION_MARKER: &[u8] = b"ProgramDerivedAddress";

/// Pure, stateless deriver bound to one program id
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddressDeriver {
    program_id: [u8; 32],
}

impl Default for AddressDeriver {
    fn default() -> Self {
        Self::new(DEFAULT_PROGRAM_ID)
    }
}

impl AddressDeriver {
    /// Create a deriver for the given program id
    pub fn new(program_id: [u8; 32]) -> Self {
        Self { program_id }
    }

    /// Returns the program id this deriver is bound to
    pub fn program_id(&self) -> &[u8; 32] {
        &self.program_id
    }

    /// Find the canonical `(address, bump)` for the given seeds.
    ///
    /// # Errors
    ///
    /// `SeedTooLong` if `namespace` or `title` exceeds [`MAX_SEED_LEN`],
    /// `Exhausted` if all 256 candidates are on the curve.
    pub fn derive(
        &self,
        namespace: &[u8],
        owner: &Identity,
        title: &str,
    ) -> Result<(Address, u8), DerivationError> {
        check_seeds(namespace, title)?;

        (0..=u8::MAX)
            .rev()
            .find_map(|bump| {
                self.candidate(namespace, owner, title.as_bytes(), bump)
                    .map(|address| (address, bump))
            })
            .ok_or(DerivationError::Exhausted)
    }

    /// Compute the single candidate for an explicit bump.
    pub fn derive_with_bump(
        &self,
        namespace: &[u8],
        owner: &Identity,
        title: &str,
        bump: u8,
    ) -> Result<Address, DerivationError> {
        check_seeds(namespace, title)?;
        self.candidate(namespace, owner, title.as_bytes(), bump)
            .ok_or(DerivationError::OnCurve { bump })
    }

    /// Check that `expected` is the address produced by these seeds and bump.
    pub fn verify(
        &self,
        namespace: &[u8],
        owner: &Identity,
        title: &str,
        bump: u8,
        expected: &Address,
    ) -> bool {
        matches!(
            self.derive_with_bump(namespace, owner, title, bump),
            Ok(address) if address == *expected
        )
    }

    /// Canonical note address for `(owner, title)`
    pub fn note_address(
        &self,
        owner: &Identity,
        title: &str,
    ) -> Result<(Address, u8), DerivationError> {
        self.derive(NOTE_NAMESPACE, owner, title)
    }

    fn candidate(
        &self,
        namespace: &[u8],
        owner: &Identity,
        title: &[u8],
        bump: u8,
    ) -> Option<Address> {
        let mut hasher = Sha256::new();
        hasher.update(namespace);
        hasher.update(owner.as_bytes());
        hasher.update(title);
        hasher.update([bump]);
        hasher.update(self.program_id);
        hasher.update(DERIVATION_MARKER);

        let mut bytes = [0u8; ADDRESS_LEN];
        bytes.copy_from_slice(&hasher.finalize());

        if is_on_curve(&bytes) {
            None
        } else {
            Some(Address::new(bytes))
        }
    }
}

fn check_seeds(namespace: &[u8], title: &str) -> Result<(), DerivationError> {
    for len in [namespace.len(), title.len()] {
        if len > MAX_SEED_LEN {
            return Err(DerivationError::SeedTooLong {
                len,
                max: MAX_SEED_LEN,
            });
        }
    }
    Ok(())
}

fn is_on_curve(bytes: &[u8; ADDRESS_LEN]) -> bool {
    CompressedEdwardsY(*bytes).decompress().is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn owner(byte: u8) -> Identity {
        Identity::new([byte; 32])
    }

    #[test]
    fn test_derive_is_deterministic() {
        let deriver = AddressDeriver::default();
        let a = deriver.note_address(&owner(1), "My first note").unwrap();
        let b = deriver.note_address(&owner(1), "My first note").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_derived_address_is_off_curve() {
        let deriver = AddressDeriver::default();
        let (address, _) = deriver.note_address(&owner(1), "groceries").unwrap();
        assert!(!is_on_curve(address.as_bytes()));
    }

    #[test]
    fn test_bumps_above_canonical_are_on_curve() {
        let deriver = AddressDeriver::default();
        for title in ["a", "b", "c", "d", "e", "f", "g", "h"] {
            let (_, bump) = deriver.note_address(&owner(3), title).unwrap();
            for higher in bump.saturating_add(1)..=u8::MAX {
                if higher == bump {
                    continue;
                }
                assert_eq!(
                    deriver.derive_with_bump(NOTE_NAMESPACE, &owner(3), title, higher),
                    Err(DerivationError::OnCurve { bump: higher })
                );
            }
        }
    }

    #[test]
    fn test_verify_accepts_canonical_and_rejects_others() {
        let deriver = AddressDeriver::default();
        let (address, bump) = deriver.note_address(&owner(2), "todo").unwrap();

        assert!(deriver.verify(NOTE_NAMESPACE, &owner(2), "todo", bump, &address));
        assert!(!deriver.verify(NOTE_NAMESPACE, &owner(2), "todo!", bump, &address));
        assert!(!deriver.verify(NOTE_NAMESPACE, &owner(4), "todo", bump, &address));
        assert!(!deriver.verify(b"other", &owner(2), "todo", bump, &address));
    }

    #[test]
    fn test_title_limit_boundary() {
        let deriver = AddressDeriver::default();
        assert!(deriver.note_address(&owner(1), &"a".repeat(50)).is_ok());
        assert_eq!(
            deriver.note_address(&owner(1), &"a".repeat(51)),
            Err(DerivationError::SeedTooLong { len: 51, max: 50 })
        );
    }

    #[test]
    fn test_title_limit_counts_bytes() {
        // 17 three-byte characters = 51 bytes
        let deriver = AddressDeriver::default();
        let title = "€".repeat(17);
        assert_eq!(title.len(), 51);
        assert!(matches!(
            deriver.note_address(&owner(1), &title),
            Err(DerivationError::SeedTooLong { .. })
        ));
    }

    #[test]
    fn test_program_id_separates_address_spaces() {
        let a = AddressDeriver::default();
        let b = AddressDeriver::new([0xAB; 32]);
        let (addr_a, _) = a.note_address(&owner(1), "note").unwrap();
        let (addr_b, _) = b.note_address(&owner(1), "note").unwrap();
        assert_ne!(addr_a, addr_b);
    }

    #[test]
    fn test_namespace_separates_record_kinds() {
        let deriver = AddressDeriver::default();
        let (note, _) = deriver.derive(NOTE_NAMESPACE, &owner(1), "x").unwrap();
        let (other, _) = deriver.derive(b"profile", &owner(1), "x").unwrap();
        assert_ne!(note, other);
    }
}
