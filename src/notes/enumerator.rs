//! Owner-scoped enumeration
//!
//! A scan copies every slot whose owner bytes match under the read lock,
//! then releases the lock and decodes lazily as the caller iterates. The
//! owner pre-filter is only an optimization: every candidate is still fully
//! decoded, and the decoded owner is checked again before it is yielded.
//!
//! Slots that fail to decode are handled by a [`DecodePolicy`]. With
//! `Skip` the scan logs, counts and moves on; with `Abort` it yields one
//! `DecodeError` and ends.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use super::errors::{NoteError, NoteResult};
use super::layout::{owner_filter, Note, NoteRecord};
use crate::address::Address;
use crate::identity::Identity;
use crate::observability::{log_event_with_fields, Event, NoteMetrics};
use crate::storage::{Ledger, SharedLedger};

/// What to do with a slot that passes the owner filter but does not decode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DecodePolicy {
    #[default]
    Skip,
    Abort,
}

impl DecodePolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            DecodePolicy::Skip => "skip",
            DecodePolicy::Abort => "abort",
        }
    }
}

impl fmt::Display for DecodePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DecodePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "skip" => Ok(DecodePolicy::Skip),
            "abort" => Ok(DecodePolicy::Abort),
            other => Err(format!(
                "unknown decode policy '{}', expected 'skip' or 'abort'",
                other
            )),
        }
    }
}

/// Lists notes by owner. Read-only.
pub struct Enumerator<L> {
    ledger: SharedLedger<L>,
    policy: DecodePolicy,
    metrics: Arc<NoteMetrics>,
}

impl<L: Ledger> Enumerator<L> {
    pub fn new(ledger: SharedLedger<L>, policy: DecodePolicy) -> Self {
        Self {
            ledger,
            policy,
            metrics: Arc::new(NoteMetrics::new()),
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<NoteMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn policy(&self) -> DecodePolicy {
        self.policy
    }

    /// Every live note owned by `owner`, in ledger order.
    pub fn list_by_owner(&self, owner: &Identity) -> OwnerScan {
        let candidates = self.ledger.read().scan(&[owner_filter(owner)]);
        self.metrics.increment_scans();

        OwnerScan {
            owner: *owner,
            candidates,
            position: 0,
            skipped: 0,
            finished: false,
            policy: self.policy,
            metrics: Arc::clone(&self.metrics),
        }
    }

    /// Drain a scan into a vector, stopping at the first error
    pub fn collect_by_owner(&self, owner: &Identity) -> NoteResult<Vec<Note>> {
        self.list_by_owner(owner).collect()
    }
}

/// Lazy, restartable sequence of one owner's notes
#[derive(Debug)]
pub struct OwnerScan {
    owner: Identity,
    candidates: Vec<(Address, Vec<u8>)>,
    position: usize,
    skipped: usize,
    finished: bool,
    policy: DecodePolicy,
    metrics: Arc<NoteMetrics>,
}

impl OwnerScan {
    /// Number of slots that matched the pre-filter
    pub fn candidates(&self) -> usize {
        self.candidates.len()
    }

    /// Number of slots skipped so far
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    /// Restart from the first candidate.
    ///
    /// Replays the same snapshot; writes committed after the scan was taken
    /// are not seen.
    pub fn rewind(&mut self) {
        self.position = 0;
        self.skipped = 0;
        self.finished = false;
    }

    fn skip(&mut self, address: &Address, reason: &str) {
        self.skipped += 1;
        self.metrics.increment_skipped();
        log_event_with_fields(
            Event::ScanSlotSkipped,
            &[("address", address.to_base64().as_str()), ("reason", reason)],
        );
    }

    fn finish(&mut self) {
        self.finished = true;
        log_event_with_fields(
            Event::ScanComplete,
            &[
                ("owner", self.owner.to_base64().as_str()),
                ("candidates", self.candidates.len().to_string().as_str()),
                ("skipped", self.skipped.to_string().as_str()),
            ],
        );
    }
}

impl Iterator for OwnerScan {
    type Item = NoteResult<Note>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.finished {
            let Some((address, data)) = self.candidates.get(self.position) else {
                self.finish();
                return None;
            };
            let address = *address;
            self.position += 1;

            match NoteRecord::decode(data) {
                Ok(record) if record.owner == self.owner => {
                    return Some(Ok(record.into_note(address)));
                }
                // matched the raw bytes but not the decoded owner
                Ok(_) => self.skip(&address, "owner mismatch after decode"),
                Err(reason) => match self.policy {
                    DecodePolicy::Skip => self.skip(&address, &reason.to_string()),
                    DecodePolicy::Abort => {
                        self.finished = true;
                        log_event_with_fields(
                            Event::ScanAborted,
                            &[
                                ("address", address.to_base64().as_str()),
                                ("reason", reason.to_string().as_str()),
                            ],
                        );
                        return Some(Err(NoteError::DecodeError { address, reason }));
                    }
                },
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notes::layout::{note_discriminator, OWNER_OFFSET};
    use crate::storage::{Account, MemoryLedger};

    fn record(owner: Identity, title: &str) -> NoteRecord {
        NoteRecord {
            owner,
            title: title.to_string(),
            content: "c".to_string(),
            created_at: 1,
            updated_at: 1,
            bump: 255,
        }
    }

    /// Right owner bytes at offset 8, garbage after
    fn spoofed(owner: &Identity) -> Vec<u8> {
        let mut data = vec![0xEE; 80];
        data[..8].copy_from_slice(&note_discriminator());
        data[OWNER_OFFSET..OWNER_OFFSET + 32].copy_from_slice(owner.as_bytes());
        data
    }

    fn ledger_with(entries: Vec<(u8, Vec<u8>)>) -> SharedLedger<MemoryLedger> {
        let mut ledger = MemoryLedger::new();
        for (byte, data) in entries {
            ledger.insert_account(Address::new([byte; 32]), Account::new(0, data));
        }
        SharedLedger::new(ledger)
    }

    #[test]
    fn test_policy_parse() {
        assert_eq!("skip".parse::<DecodePolicy>(), Ok(DecodePolicy::Skip));
        assert_eq!("abort".parse::<DecodePolicy>(), Ok(DecodePolicy::Abort));
        assert!("ignore".parse::<DecodePolicy>().is_err());
        assert_eq!(DecodePolicy::default(), DecodePolicy::Skip);
    }

    #[test]
    fn test_scan_filters_by_owner() {
        let alice = Identity::new([1; 32]);
        let bob = Identity::new([2; 32]);
        let ledger = ledger_with(vec![
            (10, record(alice, "a").encode()),
            (11, record(bob, "b").encode()),
            (12, record(alice, "c").encode()),
        ]);

        let notes = Enumerator::new(ledger, DecodePolicy::Skip)
            .collect_by_owner(&alice)
            .unwrap();
        let titles: Vec<_> = notes.iter().map(|n| n.title.as_str()).collect();
        assert_eq!(titles, vec!["a", "c"]);
    }

    #[test]
    fn test_skip_policy_counts_bad_slots() {
        let alice = Identity::new([1; 32]);
        let ledger = ledger_with(vec![
            (10, record(alice, "a").encode()),
            (11, spoofed(&alice)),
        ]);

        let enumerator = Enumerator::new(ledger, DecodePolicy::Skip);
        let mut scan = enumerator.list_by_owner(&alice);
        assert_eq!(scan.candidates(), 2);
        assert_eq!(scan.by_ref().filter(Result::is_ok).count(), 1);
        assert_eq!(scan.skipped(), 1);
    }

    #[test]
    fn test_abort_policy_stops_once() {
        let alice = Identity::new([1; 32]);
        let ledger = ledger_with(vec![
            (10, spoofed(&alice)),
            (11, record(alice, "a").encode()),
        ]);

        let mut scan = Enumerator::new(ledger, DecodePolicy::Abort).list_by_owner(&alice);
        assert!(matches!(scan.next(), Some(Err(NoteError::DecodeError { .. }))));
        assert!(scan.next().is_none());
    }

    #[test]
    fn test_rewind_replays_snapshot() {
        let alice = Identity::new([1; 32]);
        let ledger = ledger_with(vec![(10, record(alice, "a").encode())]);
        let enumerator = Enumerator::new(ledger.clone(), DecodePolicy::Skip);

        let mut scan = enumerator.list_by_owner(&alice);
        assert_eq!(scan.by_ref().count(), 1);

        ledger
            .write()
            .insert_account(Address::new([11; 32]), Account::new(0, record(alice, "b").encode()));

        scan.rewind();
        assert_eq!(scan.count(), 1);
        assert_eq!(enumerator.list_by_owner(&alice).count(), 2);
    }

    #[test]
    fn test_empty_owner_yields_nothing() {
        let ledger = ledger_with(vec![]);
        let enumerator = Enumerator::new(ledger, DecodePolicy::Abort);
        assert!(enumerator.collect_by_owner(&Identity::new([3; 32])).unwrap().is_empty());
    }
}
