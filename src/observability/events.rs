//! Observable events
//!
//! Events are explicit and typed; each carries its own severity.

use std::fmt;

use super::logger::Severity;

/// Observable events in notedger
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Note lifecycle
    /// A note slot was allocated
    NoteCreated,
    /// A note's content changed in place
    NoteUpdated,
    /// A note moved to the address of its new title
    NoteRenamed,
    /// A note slot was vacated and its deposit refunded
    NoteDeleted,
    /// A create/update/delete failed its checks
    OperationRejected,

    // Enumeration
    /// An owner scan finished
    ScanComplete,
    /// An undecodable slot was skipped
    ScanSlotSkipped,
    /// An owner scan stopped on an undecodable slot
    ScanAborted,

    // Host shell
    /// Configuration loaded
    ConfigLoaded,
    /// Ledger snapshot loaded
    LedgerLoaded,
    /// Ledger snapshot written
    LedgerPersisted,
    /// Ledger snapshot failed verification
    LedgerCorruption,
    /// Balance credited out of thin air
    Airdrop,
}

impl Event {
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::NoteCreated => "NOTE_CREATED",
            Event::NoteUpdated => "NOTE_UPDATED",
            Event::NoteRenamed => "NOTE_RENAMED",
            Event::NoteDeleted => "NOTE_DELETED",
            Event::OperationRejected => "NOTE_OPERATION_REJECTED",

            Event::ScanComplete => "SCAN_COMPLETE",
            Event::ScanSlotSkipped => "SCAN_SLOT_SKIPPED",
            Event::ScanAborted => "SCAN_ABORTED",

            Event::ConfigLoaded => "CONFIG_LOADED",
            Event::LedgerLoaded => "LEDGER_LOADED",
            Event::LedgerPersisted => "LEDGER_PERSISTED",
            Event::LedgerCorruption => "LEDGER_CORRUPTION",
            Event::Airdrop => "LEDGER_AIRDROP",
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            Event::OperationRejected | Event::ScanSlotSkipped => Severity::Warn,
            Event::ScanAborted => Severity::Error,
            Event::LedgerCorruption => Severity::Fatal,
            _ => Severity::Info,
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
