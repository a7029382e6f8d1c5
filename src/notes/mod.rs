//! # Notes
//!
//! Owner-scoped note records living at derived addresses.
//!
//! - `layout`: slot encoding and structural validation
//! - `store`: create / update / delete state machine
//! - `enumerator`: owner-filtered listing
//! - `program`: signed invocations and dispatch
//! - `rent`: storage deposits
//!
//! ```ignore
//! let program = NoteProgram::new(ledger, AddressDeriver::default(),
//!     RentSchedule::default(), DecodePolicy::Skip);
//! let (address, _) = program.deriver().note_address(&owner, "groceries")?;
//! let invocation = Invocation::new(address, owner, Instruction::CreateNote {
//!     title: "groceries".into(),
//!     content: "milk".into(),
//! });
//! program.submit(&SignedInvocation::sign(invocation, &keypair), now)?;
//! ```

mod enumerator;
mod errors;
mod layout;
mod program;
mod rent;
mod store;

pub use enumerator::{DecodePolicy, Enumerator, OwnerScan};
pub use errors::{Field, NoteError, NoteResult};
pub use layout::{
    note_discriminator, owner_filter, LayoutError, Note, NoteRecord, MAX_CONTENT_LEN,
    MAX_TITLE_LEN, NOTE_ACCOUNT_SPACE, OWNER_OFFSET,
};
pub use program::{Instruction, Invocation, NoteProgram, Outcome, SignedInvocation};
pub use rent::{RentSchedule, ACCOUNT_STORAGE_OVERHEAD};
pub use store::{RecordStore, Refund};
