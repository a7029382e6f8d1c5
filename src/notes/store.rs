//! Record store: the per-address note state machine
//!
//! ```text
//! Empty --create--> Live --update--> Live --delete--> Empty
//! ```
//!
//! Every operation takes the ledger's write lock for its whole duration and
//! runs all of its checks before the first mutation, so an operation either
//! commits completely or leaves the ledger untouched.
//!
//! # Invariants
//!
//! - Authorization compares the caller with the stored owner field, never
//!   with anything derived from the caller-supplied address
//! - A live slot's address re-derives from its stored owner, title and bump
//! - `owner`, `created_at` never change after create
//! - `updated_at >= created_at`

use std::sync::Arc;

use serde::Serialize;

use super::errors::{Field, NoteError, NoteResult};
use super::layout::{Note, NoteRecord, NOTE_ACCOUNT_SPACE};
use super::rent::RentSchedule;
use crate::address::{Address, AddressDeriver, NOTE_NAMESPACE};
use crate::identity::{Authenticator, Identity};
use crate::observability::{log_event_with_fields, Event, NoteMetrics};
use crate::storage::{Account, Ledger, SharedLedger};

/// Deposit returned to the owner when a note is deleted
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Refund {
    pub address: Address,
    pub recipient: Identity,
    pub amount: u64,
}

/// Authoritative note state machine over a shared ledger
pub struct RecordStore<L> {
    ledger: SharedLedger<L>,
    deriver: AddressDeriver,
    rent: RentSchedule,
    metrics: Arc<NoteMetrics>,
}

impl<L: Ledger> RecordStore<L> {
    pub fn new(ledger: SharedLedger<L>, deriver: AddressDeriver, rent: RentSchedule) -> Self {
        Self {
            ledger,
            deriver,
            rent,
            metrics: Arc::new(NoteMetrics::new()),
        }
    }

    /// Share a metrics registry with other components
    pub fn with_metrics(mut self, metrics: Arc<NoteMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn ledger(&self) -> &SharedLedger<L> {
        &self.ledger
    }

    pub fn deriver(&self) -> &AddressDeriver {
        &self.deriver
    }

    pub fn rent(&self) -> &RentSchedule {
        &self.rent
    }

    pub fn metrics(&self) -> &Arc<NoteMetrics> {
        &self.metrics
    }

    /// Allocate a note at `address`.
    ///
    /// # Errors
    ///
    /// - `Unauthorized` if `auth` does not vouch for `owner`
    /// - `InvalidLength` if title or content is out of bounds
    /// - `AddressDerivationFailed` / `AddressMismatch` if `(owner, title, bump)`
    ///   does not produce `address`
    /// - `SlotOccupied` if a note already lives at `address`
    /// - `InsufficientFunds` if `owner` cannot cover the deposit
    #[allow(clippy::too_many_arguments)]
    pub fn create(
        &self,
        address: &Address,
        bump: u8,
        owner: &Identity,
        title: &str,
        content: &str,
        now: i64,
        auth: &dyn Authenticator,
    ) -> NoteResult<Note> {
        let result = self.create_inner(address, bump, owner, title, content, now, auth);
        match &result {
            Ok(note) => {
                self.metrics.increment_created();
                log_event_with_fields(
                    Event::NoteCreated,
                    &[
                        ("address", note.address.to_base64().as_str()),
                        ("owner", note.owner.to_base64().as_str()),
                        ("bump", note.bump.to_string().as_str()),
                    ],
                );
            }
            Err(e) => self.reject("create", address, e),
        }
        result
    }

    #[allow(clippy::too_many_arguments)]
    fn create_inner(
        &self,
        address: &Address,
        bump: u8,
        owner: &Identity,
        title: &str,
        content: &str,
        now: i64,
        auth: &dyn Authenticator,
    ) -> NoteResult<Note> {
        if !auth.verify(owner) {
            return Err(NoteError::Unauthorized);
        }
        Field::Title.check(title)?;
        Field::Content.check(content)?;

        let expected = self
            .deriver
            .derive_with_bump(NOTE_NAMESPACE, owner, title, bump)?;
        if expected != *address {
            return Err(NoteError::AddressMismatch { address: *address });
        }

        let mut ledger = self.ledger.write();

        if ledger.account(address).is_some() {
            return Err(NoteError::SlotOccupied { address: *address });
        }

        let deposit = self.rent.minimum_deposit(NOTE_ACCOUNT_SPACE);
        let available = ledger.balance(owner);
        if available < deposit {
            return Err(NoteError::InsufficientFunds {
                required: deposit,
                available,
            });
        }

        let record = NoteRecord {
            owner: *owner,
            title: title.to_string(),
            content: content.to_string(),
            created_at: now,
            updated_at: now,
            bump,
        };

        // all checks passed; commit
        ledger.set_balance(*owner, available - deposit);
        ledger.insert_account(*address, Account::new(deposit, record.encode()));

        Ok(record.into_note(*address))
    }

    /// Change a note's content and/or title.
    ///
    /// `None` leaves a field unchanged; at least one must be `Some`. A new
    /// title that differs from the stored one moves the note to the address
    /// derived from `(owner, new_title)` in the same commit; the old slot is
    /// vacated and the deposit moves with the note.
    ///
    /// # Errors
    ///
    /// `Unauthorized`, `EmptyUpdate`, `InvalidLength`, `NotFound`,
    /// `DecodeError`, `AddressMismatch`, and `SlotOccupied` when the rename
    /// target is live.
    pub fn update(
        &self,
        address: &Address,
        caller: &Identity,
        new_title: Option<&str>,
        new_content: Option<&str>,
        now: i64,
        auth: &dyn Authenticator,
    ) -> NoteResult<Note> {
        let result = self.update_inner(address, caller, new_title, new_content, now, auth);
        match &result {
            Ok(note) if note.address != *address => {
                self.metrics.increment_renamed();
                log_event_with_fields(
                    Event::NoteRenamed,
                    &[
                        ("from", address.to_base64().as_str()),
                        ("to", note.address.to_base64().as_str()),
                    ],
                );
            }
            Ok(note) => {
                self.metrics.increment_updated();
                log_event_with_fields(
                    Event::NoteUpdated,
                    &[("address", note.address.to_base64().as_str())],
                );
            }
            Err(e) => self.reject("update", address, e),
        }
        result
    }

    fn update_inner(
        &self,
        address: &Address,
        caller: &Identity,
        new_title: Option<&str>,
        new_content: Option<&str>,
        now: i64,
        auth: &dyn Authenticator,
    ) -> NoteResult<Note> {
        if !auth.verify(caller) {
            return Err(NoteError::Unauthorized);
        }
        if new_title.is_none() && new_content.is_none() {
            return Err(NoteError::EmptyUpdate);
        }
        if let Some(title) = new_title {
            Field::Title.check(title)?;
        }
        if let Some(content) = new_content {
            Field::Content.check(content)?;
        }

        let mut ledger = self.ledger.write();
        let (record, deposit) = self.load_owned(&*ledger, address, caller)?;

        let mut updated = record.clone();
        if let Some(content) = new_content {
            updated.content = content.to_string();
        }
        updated.updated_at = now.max(record.created_at);

        let rename = new_title.filter(|title| *title != record.title);
        let target = match rename {
            Some(title) => {
                let (new_address, new_bump) = self.deriver.note_address(&record.owner, title)?;
                if ledger.account(&new_address).is_some() {
                    return Err(NoteError::SlotOccupied {
                        address: new_address,
                    });
                }
                updated.title = title.to_string();
                updated.bump = new_bump;
                new_address
            }
            None => *address,
        };

        // all checks passed; commit
        if target != *address {
            ledger.remove_account(address);
        }
        ledger.insert_account(target, Account::new(deposit, updated.encode()));

        Ok(updated.into_note(target))
    }

    /// Delete a note and refund its deposit to the owner.
    ///
    /// # Errors
    ///
    /// `Unauthorized`, `NotFound`, `DecodeError`, `AddressMismatch`.
    pub fn delete(
        &self,
        address: &Address,
        caller: &Identity,
        auth: &dyn Authenticator,
    ) -> NoteResult<Refund> {
        let result = self.delete_inner(address, caller, auth);
        match &result {
            Ok(refund) => {
                self.metrics.record_deleted(refund.amount);
                log_event_with_fields(
                    Event::NoteDeleted,
                    &[
                        ("address", address.to_base64().as_str()),
                        ("refund", refund.amount.to_string().as_str()),
                    ],
                );
            }
            Err(e) => self.reject("delete", address, e),
        }
        result
    }

    fn delete_inner(
        &self,
        address: &Address,
        caller: &Identity,
        auth: &dyn Authenticator,
    ) -> NoteResult<Refund> {
        if !auth.verify(caller) {
            return Err(NoteError::Unauthorized);
        }

        let mut ledger = self.ledger.write();
        let (record, deposit) = self.load_owned(&*ledger, address, caller)?;

        ledger.remove_account(address);
        ledger.credit(record.owner, deposit);

        Ok(Refund {
            address: *address,
            recipient: record.owner,
            amount: deposit,
        })
    }

    /// Read one note. Reads are unrestricted.
    pub fn fetch(&self, address: &Address) -> NoteResult<Option<Note>> {
        let ledger = self.ledger.read();
        match ledger.account(address) {
            None => Ok(None),
            Some(account) => NoteRecord::decode(&account.data)
                .map(|record| Some(record.into_note(*address)))
                .map_err(|reason| NoteError::DecodeError {
                    address: *address,
                    reason,
                }),
        }
    }

    /// Decode the live note at `address` and check that `caller` owns it
    /// and that the address still matches its seeds.
    fn load_owned(
        &self,
        ledger: &L,
        address: &Address,
        caller: &Identity,
    ) -> NoteResult<(NoteRecord, u64)> {
        let account = ledger
            .account(address)
            .ok_or(NoteError::NotFound { address: *address })?;

        let record = NoteRecord::decode(&account.data).map_err(|reason| NoteError::DecodeError {
            address: *address,
            reason,
        })?;

        if !record.owner.ct_eq(caller) {
            return Err(NoteError::Unauthorized);
        }

        if !self.deriver.verify(
            NOTE_NAMESPACE,
            &record.owner,
            &record.title,
            record.bump,
            address,
        ) {
            return Err(NoteError::AddressMismatch { address: *address });
        }

        Ok((record, account.deposit))
    }

    pub(crate) fn reject(&self, operation: &str, address: &Address, error: &NoteError) {
        self.metrics.increment_rejected();
        log_event_with_fields(
            Event::OperationRejected,
            &[
                ("operation", operation),
                ("address", address.to_base64().as_str()),
                ("code", error.code()),
            ],
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::PreverifiedSigner;
    use crate::storage::MemoryLedger;

    const FUNDS: u64 = 1_000_000_000;

    fn store() -> RecordStore<MemoryLedger> {
        RecordStore::new(
            SharedLedger::new(MemoryLedger::new()),
            AddressDeriver::default(),
            RentSchedule::default(),
        )
    }

    fn funded(store: &RecordStore<MemoryLedger>, byte: u8) -> Identity {
        let who = Identity::new([byte; 32]);
        store.ledger().write().credit(who, FUNDS);
        who
    }

    fn create(store: &RecordStore<MemoryLedger>, owner: &Identity, title: &str) -> Note {
        let (address, bump) = store.deriver().note_address(owner, title).unwrap();
        store
            .create(&address, bump, owner, title, "body", 100, &PreverifiedSigner(*owner))
            .unwrap()
    }

    #[test]
    fn test_create_reserves_deposit() {
        let store = store();
        let owner = funded(&store, 1);
        let note = create(&store, &owner, "t");

        let deposit = RentSchedule::default().minimum_deposit(NOTE_ACCOUNT_SPACE);
        let ledger = store.ledger().read();
        assert_eq!(ledger.balance(&owner), FUNDS - deposit);
        assert_eq!(ledger.account(&note.address).unwrap().deposit, deposit);
    }

    #[test]
    fn test_create_requires_funds() {
        let store = store();
        let owner = Identity::new([1; 32]);
        let (address, bump) = store.deriver().note_address(&owner, "t").unwrap();
        let err = store
            .create(&address, bump, &owner, "t", "c", 0, &PreverifiedSigner(owner))
            .unwrap_err();
        assert!(matches!(err, NoteError::InsufficientFunds { available: 0, .. }));
        assert!(store.ledger().read().account(&address).is_none());
    }

    #[test]
    fn test_create_rejects_wrong_bump() {
        let store = store();
        let owner = funded(&store, 1);
        let (address, bump) = store.deriver().note_address(&owner, "t").unwrap();
        let err = store
            .create(&address, bump.wrapping_sub(1), &owner, "t", "c", 0, &PreverifiedSigner(owner))
            .unwrap_err();
        assert!(matches!(
            err,
            NoteError::AddressMismatch { .. } | NoteError::AddressDerivationFailed(_)
        ));
    }

    #[test]
    fn test_create_rejects_unauthenticated_owner() {
        let store = store();
        let owner = funded(&store, 1);
        let other = Identity::new([2; 32]);
        let (address, bump) = store.deriver().note_address(&owner, "t").unwrap();
        let err = store
            .create(&address, bump, &owner, "t", "c", 0, &PreverifiedSigner(other))
            .unwrap_err();
        assert_eq!(err, NoteError::Unauthorized);
    }

    #[test]
    fn test_update_clamps_updated_at() {
        let store = store();
        let owner = funded(&store, 1);
        let note = create(&store, &owner, "t");

        let updated = store
            .update(&note.address, &owner, None, Some("new"), 50, &PreverifiedSigner(owner))
            .unwrap();
        assert_eq!(updated.updated_at, note.created_at);
    }

    #[test]
    fn test_update_requires_a_change() {
        let store = store();
        let owner = funded(&store, 1);
        let note = create(&store, &owner, "t");
        assert_eq!(
            store.update(&note.address, &owner, None, None, 200, &PreverifiedSigner(owner)),
            Err(NoteError::EmptyUpdate)
        );
    }

    #[test]
    fn test_same_title_is_not_a_rename() {
        let store = store();
        let owner = funded(&store, 1);
        let note = create(&store, &owner, "t");
        let updated = store
            .update(&note.address, &owner, Some("t"), None, 200, &PreverifiedSigner(owner))
            .unwrap();
        assert_eq!(updated.address, note.address);
        assert_eq!(updated.updated_at, 200);
        assert_eq!(store.metrics().snapshot().notes_renamed, 0);
    }

    #[test]
    fn test_foreign_data_at_address_is_decode_error() {
        let store = store();
        let owner = funded(&store, 1);
        let address = Address::new([9; 32]);
        store
            .ledger()
            .write()
            .insert_account(address, Account::new(0, vec![0; 100]));

        assert!(matches!(
            store.delete(&address, &owner, &PreverifiedSigner(owner)),
            Err(NoteError::DecodeError { .. })
        ));
        assert!(matches!(store.fetch(&address), Err(NoteError::DecodeError { .. })));
    }

    #[test]
    fn test_note_planted_at_wrong_address_is_rejected() {
        let store = store();
        let owner = funded(&store, 1);
        let note = create(&store, &owner, "t");

        // copy a valid note image to an address its seeds do not produce
        let stolen = Address::new([4; 32]);
        let data = store.ledger().read().account(&note.address).unwrap().data.clone();
        store
            .ledger()
            .write()
            .insert_account(stolen, Account::new(0, data));

        assert_eq!(
            store.delete(&stolen, &owner, &PreverifiedSigner(owner)),
            Err(NoteError::AddressMismatch { address: stolen })
        );
    }

    #[test]
    fn test_rejections_are_counted() {
        let store = store();
        let owner = funded(&store, 1);
        let _ = store.delete(&Address::new([1; 32]), &owner, &PreverifiedSigner(owner));
        assert_eq!(store.metrics().snapshot().operations_rejected, 1);
    }
}
