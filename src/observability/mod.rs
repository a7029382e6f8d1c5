//! Observability for notedger
//!
//! - Structured logging (JSON lines on stderr)
//! - Typed events
//! - Operation counters
//!
//! Observability is read-only: it never changes the outcome of an
//! operation, and a failed log write is dropped.
//!
//! ```ignore
//! use notedger::observability::{log_event_with_fields, Event};
//!
//! log_event_with_fields(Event::NoteCreated, &[("title", "groceries")]);
//! ```

mod events;
mod logger;
mod metrics;

pub use events::Event;
pub use logger::{Logger, Severity};
pub use metrics::{MetricsSnapshot, NoteMetrics};

/// Log an event at its own severity
pub fn log_event(event: Event) {
    Logger::log(event.severity(), event.as_str(), &[]);
}

/// Log an event with fields at its own severity
pub fn log_event_with_fields(event: Event, fields: &[(&str, &str)]) {
    Logger::log(event.severity(), event.as_str(), fields);
}
