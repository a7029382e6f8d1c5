//! Note program: the operation surface consumed by a submission layer
//!
//! An [`Invocation`] names the target address, the signing identity and
//! one [`Instruction`]. A submitter signs [`Invocation::message`] and hands
//! the result to [`NoteProgram::submit`], or authenticates the caller
//! itself and calls [`NoteProgram::invoke`].
//!
//! Message layout (all integers little endian):
//!
//! ```text
//! "notedger:v1" | address[32] | signer[32] | op:u8 | fields
//!
//! create  op=0  title:str content:str
//! update  op=1  new_title:opt<str> new_content:opt<str>
//! delete  op=2
//!
//! str      = len:u32 | utf8 bytes
//! opt<str> = 0 | 1 str
//! ```

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::enumerator::{DecodePolicy, Enumerator, OwnerScan};
use super::errors::{Field, NoteError, NoteResult};
use super::layout::Note;
use super::rent::RentSchedule;
use super::store::{RecordStore, Refund};
use crate::address::{Address, AddressDeriver};
use crate::identity::{
    Authenticator, Identity, Keypair, SignatureAuthenticator, SIGNATURE_LEN,
};
use crate::observability::{MetricsSnapshot, NoteMetrics};
use crate::storage::{Ledger, SharedLedger};

/// Domain tag prefixed to every signed message
const MESSAGE_DOMAIN: &[u8] = b"notedger:v1";

const OP_CREATE: u8 = 0;
const OP_UPDATE: u8 = 1;
const OP_DELETE: u8 = 2;

/// One state-changing operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Instruction {
    CreateNote {
        title: String,
        content: String,
    },
    UpdateNote {
        new_title: Option<String>,
        new_content: Option<String>,
    },
    DeleteNote,
}

impl Instruction {
    pub fn name(&self) -> &'static str {
        match self {
            Instruction::CreateNote { .. } => "create_note",
            Instruction::UpdateNote { .. } => "update_note",
            Instruction::DeleteNote => "delete_note",
        }
    }
}

/// An instruction addressed to a slot on behalf of a signer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invocation {
    pub address: Address,
    pub signer: Identity,
    pub instruction: Instruction,
}

impl Invocation {
    pub fn new(address: Address, signer: Identity, instruction: Instruction) -> Self {
        Self {
            address,
            signer,
            instruction,
        }
    }

    /// Canonical bytes a signer signs
    pub fn message(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(128);
        buf.extend_from_slice(MESSAGE_DOMAIN);
        buf.extend_from_slice(self.address.as_bytes());
        buf.extend_from_slice(self.signer.as_bytes());

        match &self.instruction {
            Instruction::CreateNote { title, content } => {
                buf.push(OP_CREATE);
                put_str(&mut buf, title);
                put_str(&mut buf, content);
            }
            Instruction::UpdateNote {
                new_title,
                new_content,
            } => {
                buf.push(OP_UPDATE);
                put_opt_str(&mut buf, new_title.as_deref());
                put_opt_str(&mut buf, new_content.as_deref());
            }
            Instruction::DeleteNote => buf.push(OP_DELETE),
        }
        buf
    }
}

fn put_str(buf: &mut Vec<u8>, value: &str) {
    buf.extend_from_slice(&(value.len() as u32).to_le_bytes());
    buf.extend_from_slice(value.as_bytes());
}

fn put_opt_str(buf: &mut Vec<u8>, value: Option<&str>) {
    match value {
        Some(value) => {
            buf.push(1);
            put_str(buf, value);
        }
        None => buf.push(0),
    }
}

/// An invocation plus the signer's ed25519 signature over its message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedInvocation {
    pub invocation: Invocation,
    pub signature: [u8; SIGNATURE_LEN],
}

impl SignedInvocation {
    /// Sign `invocation` with `keypair`.
    ///
    /// The keypair is not required to match `invocation.signer`; a mismatch
    /// is rejected at submission.
    pub fn sign(invocation: Invocation, keypair: &Keypair) -> Self {
        let signature = keypair.sign(&invocation.message());
        Self {
            invocation,
            signature,
        }
    }
}

/// Result of a committed operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Outcome {
    Created { note: Note },
    Updated { note: Note },
    Deleted { refund: Refund },
}

/// Record store and enumerator over one ledger, sharing one metrics registry
pub struct NoteProgram<L> {
    store: RecordStore<L>,
    enumerator: Enumerator<L>,
    metrics: Arc<NoteMetrics>,
}

impl<L: Ledger> NoteProgram<L> {
    pub fn new(
        ledger: SharedLedger<L>,
        deriver: AddressDeriver,
        rent: RentSchedule,
        policy: DecodePolicy,
    ) -> Self {
        let metrics = Arc::new(NoteMetrics::new());
        let store =
            RecordStore::new(ledger.clone(), deriver, rent).with_metrics(Arc::clone(&metrics));
        let enumerator = Enumerator::new(ledger, policy).with_metrics(Arc::clone(&metrics));
        Self {
            store,
            enumerator,
            metrics,
        }
    }

    pub fn store(&self) -> &RecordStore<L> {
        &self.store
    }

    pub fn enumerator(&self) -> &Enumerator<L> {
        &self.enumerator
    }

    pub fn deriver(&self) -> &AddressDeriver {
        self.store.deriver()
    }

    pub fn ledger(&self) -> &SharedLedger<L> {
        self.store.ledger()
    }

    /// Execute an invocation whose signer `auth` vouches for.
    ///
    /// Create discovers the canonical bump itself and requires
    /// `invocation.address` to be the canonical address of
    /// `(signer, title)`.
    pub fn invoke(
        &self,
        invocation: &Invocation,
        auth: &dyn Authenticator,
        now: i64,
    ) -> NoteResult<Outcome> {
        let address = &invocation.address;
        let signer = &invocation.signer;

        match &invocation.instruction {
            Instruction::CreateNote { title, content } => {
                let bump = self
                    .canonical_bump(address, signer, title, auth)
                    .map_err(|e| {
                        self.store.reject("create", address, &e);
                        e
                    })?;
                self.store
                    .create(address, bump, signer, title, content, now, auth)
                    .map(|note| Outcome::Created { note })
            }
            Instruction::UpdateNote {
                new_title,
                new_content,
            } => self
                .store
                .update(
                    address,
                    signer,
                    new_title.as_deref(),
                    new_content.as_deref(),
                    now,
                    auth,
                )
                .map(|note| Outcome::Updated { note }),
            Instruction::DeleteNote => self
                .store
                .delete(address, signer, auth)
                .map(|refund| Outcome::Deleted { refund }),
        }
    }

    fn canonical_bump(
        &self,
        address: &Address,
        signer: &Identity,
        title: &str,
        auth: &dyn Authenticator,
    ) -> NoteResult<u8> {
        if !auth.verify(signer) {
            return Err(NoteError::Unauthorized);
        }
        Field::Title.check(title)?;
        let (expected, bump) = self.deriver().note_address(signer, title)?;
        if expected != *address {
            return Err(NoteError::AddressMismatch { address: *address });
        }
        Ok(bump)
    }

    /// Verify the signature over the invocation message, then execute.
    pub fn submit(&self, signed: &SignedInvocation, now: i64) -> NoteResult<Outcome> {
        let message = signed.invocation.message();
        let auth = SignatureAuthenticator::new(&message, signed.signature);
        self.invoke(&signed.invocation, &auth, now)
    }

    /// Read one note
    pub fn fetch(&self, address: &Address) -> NoteResult<Option<Note>> {
        self.store.fetch(address)
    }

    /// Notes owned by `owner`
    pub fn list_by_owner(&self, owner: &Identity) -> OwnerScan {
        self.enumerator.list_by_owner(owner)
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }
}
