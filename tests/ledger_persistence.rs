//! Ledger Persistence Tests
//!
//! - A persisted ledger loads back identical, notes included
//! - Any flipped byte in a snapshot is a fatal load failure
//! - A truncated snapshot is a fatal load failure
//! - A data directory without a snapshot loads as empty

use std::fs;

use notedger::address::AddressDeriver;
use notedger::identity::{Identity, PreverifiedSigner};
use notedger::notes::{RecordStore, RentSchedule};
use notedger::storage::{
    load_ledger, persist_ledger, snapshot_path, Ledger, LedgerReader, MemoryLedger, SharedLedger,
    StorageErrorCode,
};
use tempfile::TempDir;

// =============================================================================
// Test Utilities
// =============================================================================

fn create_temp_data_dir() -> TempDir {
    TempDir::new().expect("Failed to create temp dir")
}

/// Two owners, three notes, leftover balances
fn populated_ledger() -> MemoryLedger {
    let shared = SharedLedger::new(MemoryLedger::new());
    let store = RecordStore::new(
        shared.clone(),
        AddressDeriver::default(),
        RentSchedule::default(),
    );

    for (byte, titles) in [(1u8, vec!["a", "b"]), (2u8, vec!["c"])] {
        let owner = Identity::new([byte; 32]);
        shared.write().credit(owner, 50_000_000);
        for title in titles {
            let (address, bump) = store.deriver().note_address(&owner, title).unwrap();
            store
                .create(&address, bump, &owner, title, "body", 10, &PreverifiedSigner(owner))
                .unwrap();
        }
    }

    shared.snapshot()
}

// =============================================================================
// Round Trip
// =============================================================================

#[test]
fn test_persist_then_load_is_identical() {
    let temp_dir = create_temp_data_dir();
    let ledger = populated_ledger();

    let bytes = persist_ledger(temp_dir.path(), &ledger).unwrap();
    assert!(bytes > 0);

    let loaded = load_ledger(temp_dir.path()).unwrap();
    assert_eq!(loaded, ledger);
    assert_eq!(loaded.account_count(), 3);
}

#[test]
fn test_loaded_notes_remain_operable() {
    let temp_dir = create_temp_data_dir();
    persist_ledger(temp_dir.path(), &populated_ledger()).unwrap();

    let shared = SharedLedger::new(load_ledger(temp_dir.path()).unwrap());
    let store = RecordStore::new(shared, AddressDeriver::default(), RentSchedule::default());
    let alice = Identity::new([1; 32]);
    let (address, _) = store.deriver().note_address(&alice, "a").unwrap();

    let updated = store
        .update(&address, &alice, None, Some("edited"), 20, &PreverifiedSigner(alice))
        .unwrap();
    assert_eq!(updated.content, "edited");
    assert_eq!(updated.created_at, 10);
}

#[test]
fn test_persist_replaces_previous_snapshot() {
    let temp_dir = create_temp_data_dir();
    persist_ledger(temp_dir.path(), &populated_ledger()).unwrap();
    persist_ledger(temp_dir.path(), &MemoryLedger::new()).unwrap();

    assert_eq!(load_ledger(temp_dir.path()).unwrap(), MemoryLedger::new());
    assert_eq!(fs::read(snapshot_path(temp_dir.path())).unwrap().len(), 0);
}

#[test]
fn test_missing_snapshot_loads_empty() {
    let temp_dir = create_temp_data_dir();
    assert_eq!(load_ledger(temp_dir.path()).unwrap(), MemoryLedger::new());
}

// =============================================================================
// Corruption Is Never Ignored
// =============================================================================

#[test]
fn test_flipped_byte_is_fatal() {
    let temp_dir = create_temp_data_dir();
    persist_ledger(temp_dir.path(), &populated_ledger()).unwrap();
    let path = snapshot_path(temp_dir.path());

    let original = fs::read(&path).unwrap();
    for position in [0, 4, 100, original.len() / 2, original.len() - 1] {
        let mut contents = original.clone();
        contents[position] ^= 0xFF;
        fs::write(&path, &contents).unwrap();

        let err = load_ledger(temp_dir.path()).unwrap_err();
        assert_eq!(
            err.code(),
            StorageErrorCode::LedgerDataCorruption,
            "flip at {} must be detected",
            position
        );
        assert!(err.is_fatal());
    }
}

#[test]
fn test_truncated_snapshot_is_fatal() {
    let temp_dir = create_temp_data_dir();
    persist_ledger(temp_dir.path(), &populated_ledger()).unwrap();
    let path = snapshot_path(temp_dir.path());

    let contents = fs::read(&path).unwrap();
    fs::write(&path, &contents[..contents.len() - 3]).unwrap();

    let err = load_ledger(temp_dir.path()).unwrap_err();
    assert_eq!(err.code(), StorageErrorCode::LedgerDataCorruption);
}

#[test]
fn test_reader_reports_every_frame() {
    let temp_dir = create_temp_data_dir();
    let ledger = populated_ledger();
    persist_ledger(temp_dir.path(), &ledger).unwrap();

    let mut reader = LedgerReader::open(&snapshot_path(temp_dir.path())).unwrap();
    let frames = reader.read_all().unwrap();

    // three notes plus two owners with leftover balance
    assert_eq!(frames.len(), 5);
    assert_eq!(
        reader.current_offset(),
        fs::metadata(snapshot_path(temp_dir.path())).unwrap().len()
    );
}
