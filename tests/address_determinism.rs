//! Address Derivation Tests
//!
//! - Same seeds always produce the same `(address, bump)`
//! - Distinct owners or titles produce distinct addresses
//! - Derived addresses never decompress as ed25519 points
//! - Title seed is limited to 50 bytes

use std::collections::HashSet;

use curve25519_dalek::edwards::CompressedEdwardsY;
use notedger::address::{AddressDeriver, DerivationError, MAX_SEED_LEN, NOTE_NAMESPACE};
use notedger::identity::{Identity, Keypair};
use rand::distributions::Alphanumeric;
use rand::{thread_rng, Rng};

// =============================================================================
// Test Utilities
// =============================================================================

fn owner(byte: u8) -> Identity {
    Identity::new([byte; 32])
}

// =============================================================================
// Determinism
// =============================================================================

#[test]
fn test_derivation_is_deterministic_across_instances() {
    let alice = Keypair::generate().identity();

    let first = AddressDeriver::default()
        .note_address(&alice, "My first note")
        .unwrap();
    let second = AddressDeriver::default()
        .note_address(&alice, "My first note")
        .unwrap();

    assert_eq!(first, second);
}

#[test]
fn test_canonical_bump_roundtrips_through_verify() {
    let deriver = AddressDeriver::default();
    for byte in 0..16u8 {
        let who = owner(byte);
        let (address, bump) = deriver.note_address(&who, "title").unwrap();
        assert!(deriver.verify(NOTE_NAMESPACE, &who, "title", bump, &address));
        assert_eq!(
            deriver.derive_with_bump(NOTE_NAMESPACE, &who, "title", bump),
            Ok(address)
        );
    }
}

// =============================================================================
// Uniqueness
// =============================================================================

#[test]
fn test_distinct_seeds_give_distinct_addresses() {
    let deriver = AddressDeriver::default();
    let mut seen = HashSet::new();

    for byte in 0..8u8 {
        for title in ["a", "b", "groceries", "Groceries", "groceries "] {
            let (address, _) = deriver.note_address(&owner(byte), title).unwrap();
            assert!(seen.insert(address), "collision for {} / {}", byte, title);
        }
    }
}

#[test]
fn test_random_sample_has_no_collisions() {
    let deriver = AddressDeriver::default();
    let mut rng = thread_rng();
    let mut seeds = HashSet::new();
    let mut addresses = HashSet::new();

    for _ in 0..3_000 {
        let who = Identity::new(rng.gen());
        let len = rng.gen_range(0..=MAX_SEED_LEN);
        let title: String = (&mut rng)
            .sample_iter(&Alphanumeric)
            .take(len)
            .map(char::from)
            .collect();
        if !seeds.insert((who, title.clone())) {
            continue;
        }

        let (address, bump) = deriver.note_address(&who, &title).unwrap();
        assert!(
            addresses.insert(address),
            "collision for {} / {:?}",
            who.to_base64(),
            title
        );
        assert!(deriver.verify(NOTE_NAMESPACE, &who, &title, bump, &address));
        assert!(CompressedEdwardsY(*address.as_bytes()).decompress().is_none());
    }

    assert_eq!(addresses.len(), seeds.len());
}

#[test]
fn test_same_title_different_owner() {
    let deriver = AddressDeriver::default();
    let (a, _) = deriver.note_address(&owner(1), "shared").unwrap();
    let (b, _) = deriver.note_address(&owner(2), "shared").unwrap();
    assert_ne!(a, b);
}

// =============================================================================
// Off-curve
// =============================================================================

#[test]
fn test_derived_addresses_are_off_curve() {
    let deriver = AddressDeriver::default();
    for byte in 0..32u8 {
        let (address, _) = deriver.note_address(&owner(byte), "note").unwrap();
        assert!(
            CompressedEdwardsY(*address.as_bytes()).decompress().is_none(),
            "derived address must not be a valid identity"
        );
    }
}

// =============================================================================
// Seed Limits
// =============================================================================

#[test]
fn test_title_seed_boundary() {
    let deriver = AddressDeriver::default();
    let who = owner(3);

    assert!(deriver.note_address(&who, &"x".repeat(MAX_SEED_LEN)).is_ok());
    assert_eq!(
        deriver.note_address(&who, &"x".repeat(MAX_SEED_LEN + 1)),
        Err(DerivationError::SeedTooLong { len: 51, max: 50 })
    );
}

#[test]
fn test_program_id_scopes_address_space() {
    let who = owner(4);
    let (a, _) = AddressDeriver::new([1; 32]).note_address(&who, "t").unwrap();
    let (b, _) = AddressDeriver::new([2; 32]).note_address(&who, "t").unwrap();
    assert_ne!(a, b);
}
