//! notedger - owner-scoped notes at derived ledger addresses
//!
//! Each note lives at an address derived from `(owner, title)`. Only the
//! owner may change or delete it; anyone may read it.
//!
//! - `address`: deterministic address derivation with bump search
//! - `identity`: signer identities, keypairs, authenticators
//! - `notes`: slot layout, record store, enumerator, program surface
//! - `storage`: the injected ledger and its snapshot files
//! - `observability`: JSON logging, events, counters
//! - `cli`: the `notedger` binary

pub mod address;
pub mod cli;
pub mod identity;
pub mod notes;
pub mod observability;
pub mod storage;
