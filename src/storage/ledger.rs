//! Ledger state: address-keyed accounts plus identity balances
//!
//! The record engine never touches a global. Every component is handed a
//! [`Ledger`] implementation, usually wrapped in a [`SharedLedger`] which
//! plays the role of the host's serializing executor: writers hold the
//! write lock for a whole operation, readers copy what they need under the
//! read lock and release it.

use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::address::Address;
use crate::identity::Identity;

/// Backing storage of one live slot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    /// Storage cost reserved from the payer when the slot was allocated
    pub deposit: u64,
    /// Encoded record bytes
    pub data: Vec<u8>,
}

impl Account {
    /// Create an account with the given deposit and data
    pub fn new(deposit: u64, data: Vec<u8>) -> Self {
        Self { deposit, data }
    }
}

/// Byte-range predicate: `data[offset..offset + bytes.len()] == bytes`
///
/// Lets a scanner drop non-matching slots without decoding them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemcmpFilter {
    pub offset: usize,
    pub bytes: Vec<u8>,
}

impl MemcmpFilter {
    /// Create a filter matching `bytes` at `offset`
    pub fn new(offset: usize, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            offset,
            bytes: bytes.into(),
        }
    }

    /// Returns true if `data` carries the pattern at the filter's offset
    pub fn matches(&self, data: &[u8]) -> bool {
        let end = match self.offset.checked_add(self.bytes.len()) {
            Some(end) => end,
            None => return false,
        };
        data.get(self.offset..end) == Some(self.bytes.as_slice())
    }
}

/// Storage abstraction consumed by the record store and the enumerator
pub trait Ledger {
    /// Account at `address`, if the slot is live
    fn account(&self, address: &Address) -> Option<&Account>;

    /// Store an account, returning the one it replaced
    fn insert_account(&mut self, address: Address, account: Account) -> Option<Account>;

    /// Vacate a slot, returning its account
    fn remove_account(&mut self, address: &Address) -> Option<Account>;

    /// Iterate all live accounts
    fn accounts(&self) -> Box<dyn Iterator<Item = (&Address, &Account)> + '_>;

    /// Spendable balance of an identity
    fn balance(&self, identity: &Identity) -> u64;

    /// Overwrite the balance of an identity
    fn set_balance(&mut self, identity: Identity, amount: u64);

    /// Add to an identity's balance
    fn credit(&mut self, identity: Identity, amount: u64) {
        let current = self.balance(&identity);
        self.set_balance(identity, current.saturating_add(amount));
    }

    /// Copy out every live slot whose data satisfies all filters
    fn scan(&self, filters: &[MemcmpFilter]) -> Vec<(Address, Vec<u8>)> {
        self.accounts()
            .filter(|(_, account)| filters.iter().all(|f| f.matches(&account.data)))
            .map(|(address, account)| (*address, account.data.clone()))
            .collect()
    }
}

/// In-memory ledger
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryLedger {
    accounts: BTreeMap<Address, Account>,
    balances: BTreeMap<Identity, u64>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live accounts
    pub fn account_count(&self) -> usize {
        self.accounts.len()
    }

    /// All non-zero balances
    pub fn balances(&self) -> impl Iterator<Item = (&Identity, &u64)> {
        self.balances.iter()
    }
}

impl Ledger for MemoryLedger {
    fn account(&self, address: &Address) -> Option<&Account> {
        self.accounts.get(address)
    }

    fn insert_account(&mut self, address: Address, account: Account) -> Option<Account> {
        self.accounts.insert(address, account)
    }

    fn remove_account(&mut self, address: &Address) -> Option<Account> {
        self.accounts.remove(address)
    }

    fn accounts(&self) -> Box<dyn Iterator<Item = (&Address, &Account)> + '_> {
        Box::new(self.accounts.iter())
    }

    fn balance(&self, identity: &Identity) -> u64 {
        self.balances.get(identity).copied().unwrap_or(0)
    }

    fn set_balance(&mut self, identity: Identity, amount: u64) {
        if amount == 0 {
            self.balances.remove(&identity);
        } else {
            self.balances.insert(identity, amount);
        }
    }
}

/// A ledger shared between the write path and readers
#[derive(Debug, Default)]
pub struct SharedLedger<L> {
    inner: Arc<RwLock<L>>,
}

impl<L> Clone for SharedLedger<L> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<L: Ledger> SharedLedger<L> {
    pub fn new(ledger: L) -> Self {
        Self {
            inner: Arc::new(RwLock::new(ledger)),
        }
    }

    /// Shared read access.
    ///
    /// Every mutation validates before it writes, so a panic mid-operation
    /// cannot leave partial state behind and poisoning is ignored.
    pub fn read(&self) -> RwLockReadGuard<'_, L> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Exclusive access for one atomic operation
    pub fn write(&self) -> RwLockWriteGuard<'_, L> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<L: Ledger + Clone> SharedLedger<L> {
    /// Clone the current committed state
    pub fn snapshot(&self) -> L {
        self.read().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(byte: u8) -> Address {
        Address::new([byte; 32])
    }

    #[test]
    fn test_memcmp_filter_matches_at_offset() {
        let filter = MemcmpFilter::new(2, vec![0xAA, 0xBB]);
        assert!(filter.matches(&[0, 0, 0xAA, 0xBB, 0]));
        assert!(!filter.matches(&[0xAA, 0xBB, 0, 0, 0]));
    }

    #[test]
    fn test_memcmp_filter_short_data_never_matches() {
        let filter = MemcmpFilter::new(8, vec![1; 32]);
        assert!(!filter.matches(&[1; 39]));
        assert!(filter.matches(&[1; 40]));
    }

    #[test]
    fn test_memcmp_filter_offset_overflow() {
        let filter = MemcmpFilter::new(usize::MAX, vec![1]);
        assert!(!filter.matches(&[1, 2, 3]));
    }

    #[test]
    fn test_scan_applies_all_filters() {
        let mut ledger = MemoryLedger::new();
        ledger.insert_account(addr(1), Account::new(10, vec![1, 2, 3]));
        ledger.insert_account(addr(2), Account::new(10, vec![1, 9, 3]));
        ledger.insert_account(addr(3), Account::new(10, vec![7, 2, 3]));

        let hits = ledger.scan(&[MemcmpFilter::new(0, vec![1]), MemcmpFilter::new(1, vec![2])]);
        assert_eq!(hits, vec![(addr(1), vec![1, 2, 3])]);

        assert_eq!(ledger.scan(&[]).len(), 3);
    }

    #[test]
    fn test_balances() {
        let mut ledger = MemoryLedger::new();
        let who = Identity::new([5; 32]);
        assert_eq!(ledger.balance(&who), 0);

        ledger.credit(who, 100);
        ledger.credit(who, 50);
        assert_eq!(ledger.balance(&who), 150);

        ledger.set_balance(who, 0);
        assert_eq!(ledger.balances().count(), 0);
    }

    #[test]
    fn test_shared_ledger_clones_share_state() {
        let shared = SharedLedger::new(MemoryLedger::new());
        let other = shared.clone();

        shared
            .write()
            .insert_account(addr(1), Account::new(1, vec![0]));

        assert!(other.read().account(&addr(1)).is_some());
        assert_eq!(other.snapshot().account_count(), 1);
    }
}
