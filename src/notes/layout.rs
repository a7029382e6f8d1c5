//! Note slot layout
//!
//! ```text
//! offset  width   field
//! 0       8       type tag (sha256("account:Note")[..8])
//! 8       32      owner
//! 40      4 + n   title   (u32 LE length, UTF-8, 1..=50)
//! ..      4 + m   content (u32 LE length, UTF-8, 1..=500)
//! ..      8       created_at (i64 LE)
//! ..      8       updated_at (i64 LE)
//! ..      1       bump
//! ```
//!
//! Slots are allocated at [`NOTE_ACCOUNT_SPACE`] bytes and zero padded, so a
//! note can grow to its maximum size in place.

use std::io::{self, Cursor, Read};

use serde::Serialize;
use sha2::{Digest, Sha256};
use thiserror::Error;

use super::errors::Field;
use crate::address::Address;
use crate::identity::{Identity, IDENTITY_LEN};
use crate::storage::MemcmpFilter;

pub const DISCRIMINATOR_LEN: usize = 8;

/// Owner bytes start right after the type tag
pub const OWNER_OFFSET: usize = DISCRIMINATOR_LEN;

pub const MAX_TITLE_LEN: usize = 50;
pub const MAX_CONTENT_LEN: usize = 500;

/// Allocated size of a note slot
pub const NOTE_ACCOUNT_SPACE: usize =
    DISCRIMINATOR_LEN + IDENTITY_LEN + 4 + MAX_TITLE_LEN + 4 + MAX_CONTENT_LEN + 8 + 8 + 1;

/// Smallest structurally possible note: one-byte title and content
const MIN_ENCODED_LEN: usize = DISCRIMINATOR_LEN + IDENTITY_LEN + 4 + 1 + 4 + 1 + 8 + 8 + 1;

/// Type tag identifying note slots
pub fn note_discriminator() -> [u8; DISCRIMINATOR_LEN] {
    let digest = Sha256::digest(b"account:Note");
    let mut tag = [0u8; DISCRIMINATOR_LEN];
    tag.copy_from_slice(&digest[..DISCRIMINATOR_LEN]);
    tag
}

/// Pre-filter selecting slots whose owner field equals `owner`
pub fn owner_filter(owner: &Identity) -> MemcmpFilter {
    MemcmpFilter::new(OWNER_OFFSET, owner.as_bytes().to_vec())
}

/// Structural validation failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LayoutError {
    #[error("slot holds {len} bytes, fewer than the smallest note")]
    TooShort { len: usize },

    #[error("type tag does not identify a note")]
    DiscriminatorMismatch,

    #[error("{field} length {len} out of bounds")]
    FieldLength { field: Field, len: usize },

    #[error("{0} is not valid UTF-8")]
    InvalidUtf8(Field),

    #[error("updated_at {updated_at} precedes created_at {created_at}")]
    TimestampOrder { created_at: i64, updated_at: i64 },

    #[error("slot ends inside the {0} field")]
    Truncated(&'static str),
}

/// Persisted note fields
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteRecord {
    pub owner: Identity,
    pub title: String,
    pub content: String,
    pub created_at: i64,
    pub updated_at: i64,
    /// Address proof: the bump that makes the slot's address valid
    pub bump: u8,
}

/// Decoded note together with where it lives
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Note {
    pub address: Address,
    pub owner: Identity,
    pub title: String,
    pub content: String,
    pub created_at: i64,
    pub updated_at: i64,
    pub bump: u8,
}

impl NoteRecord {
    /// Attach the slot address
    pub fn into_note(self, address: Address) -> Note {
        Note {
            address,
            owner: self.owner,
            title: self.title,
            content: self.content,
            created_at: self.created_at,
            updated_at: self.updated_at,
            bump: self.bump,
        }
    }

    /// Encode into a zero-padded slot image.
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(NOTE_ACCOUNT_SPACE);
        buf.extend_from_slice(&note_discriminator());
        buf.extend_from_slice(self.owner.as_bytes());

        buf.extend_from_slice(&(self.title.len() as u32).to_le_bytes());
        buf.extend_from_slice(self.title.as_bytes());

        buf.extend_from_slice(&(self.content.len() as u32).to_le_bytes());
        buf.extend_from_slice(self.content.as_bytes());

        buf.extend_from_slice(&self.created_at.to_le_bytes());
        buf.extend_from_slice(&self.updated_at.to_le_bytes());
        buf.push(self.bump);

        if buf.len() < NOTE_ACCOUNT_SPACE {
            buf.resize(NOTE_ACCOUNT_SPACE, 0);
        }
        buf
    }

    /// Decode and structurally validate a slot image.
    pub fn decode(data: &[u8]) -> Result<Self, LayoutError> {
        if data.len() < MIN_ENCODED_LEN {
            return Err(LayoutError::TooShort { len: data.len() });
        }
        if data[..DISCRIMINATOR_LEN] != note_discriminator() {
            return Err(LayoutError::DiscriminatorMismatch);
        }

        let mut cursor = Cursor::new(&data[DISCRIMINATOR_LEN..]);

        let mut owner = [0u8; IDENTITY_LEN];
        read_exact(&mut cursor, &mut owner, "owner")?;

        let title = read_text(&mut cursor, Field::Title)?;
        let content = read_text(&mut cursor, Field::Content)?;

        let mut stamp = [0u8; 8];
        read_exact(&mut cursor, &mut stamp, "created_at")?;
        let created_at = i64::from_le_bytes(stamp);
        read_exact(&mut cursor, &mut stamp, "updated_at")?;
        let updated_at = i64::from_le_bytes(stamp);

        let mut bump = [0u8; 1];
        read_exact(&mut cursor, &mut bump, "bump")?;

        if updated_at < created_at {
            return Err(LayoutError::TimestampOrder {
                created_at,
                updated_at,
            });
        }

        Ok(Self {
            owner: Identity::new(owner),
            title,
            content,
            created_at,
            updated_at,
            bump: bump[0],
        })
    }
}

fn read_exact(
    cursor: &mut Cursor<&[u8]>,
    buf: &mut [u8],
    field: &'static str,
) -> Result<(), LayoutError> {
    cursor
        .read_exact(buf)
        .map_err(|_: io::Error| LayoutError::Truncated(field))
}

fn read_text(cursor: &mut Cursor<&[u8]>, field: Field) -> Result<String, LayoutError> {
    let name = match field {
        Field::Title => "title",
        Field::Content => "content",
    };

    let mut len_buf = [0u8; 4];
    read_exact(cursor, &mut len_buf, name)?;
    let len = u32::from_le_bytes(len_buf) as usize;

    // bounds first, so a corrupt length never drives the allocation
    let (min, max) = field.bounds();
    if len < min || len > max {
        return Err(LayoutError::FieldLength { field, len });
    }

    let mut buf = vec![0u8; len];
    read_exact(cursor, &mut buf, name)?;
    String::from_utf8(buf).map_err(|_| LayoutError::InvalidUtf8(field))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> NoteRecord {
        NoteRecord {
            owner: Identity::new([7; 32]),
            title: "My first note".to_string(),
            content: "This is the note content".to_string(),
            created_at: 1_700_000_000,
            updated_at: 1_700_000_000,
            bump: 254,
        }
    }

    #[test]
    fn test_space_matches_fixed_allocation() {
        assert_eq!(NOTE_ACCOUNT_SPACE, 615);
    }

    #[test]
    fn test_encoding_is_fixed_size() {
        assert_eq!(sample().encode().len(), NOTE_ACCOUNT_SPACE);

        let mut largest = sample();
        largest.title = "t".repeat(MAX_TITLE_LEN);
        largest.content = "c".repeat(MAX_CONTENT_LEN);
        assert_eq!(largest.encode().len(), NOTE_ACCOUNT_SPACE);
        assert_eq!(NoteRecord::decode(&largest.encode()).unwrap(), largest);
    }

    #[test]
    fn test_field_offsets() {
        let bytes = sample().encode();
        assert_eq!(&bytes[..8], &note_discriminator());
        assert_eq!(&bytes[OWNER_OFFSET..OWNER_OFFSET + 32], &[7u8; 32]);
        assert_eq!(&bytes[40..44], &13u32.to_le_bytes());
        assert_eq!(&bytes[44..57], b"My first note");
        // content length, content, two timestamps, bump
        let bump_offset = 57 + 4 + 24 + 8 + 8;
        assert_eq!(bytes[bump_offset], 254);
        assert!(bytes[bump_offset + 1..].iter().all(|b| *b == 0));
    }

    #[test]
    fn test_decode_roundtrip() {
        assert_eq!(NoteRecord::decode(&sample().encode()).unwrap(), sample());
    }

    #[test]
    fn test_owner_filter_matches_encoded_owner() {
        let bytes = sample().encode();
        assert!(owner_filter(&Identity::new([7; 32])).matches(&bytes));
        assert!(!owner_filter(&Identity::new([8; 32])).matches(&bytes));
    }

    #[test]
    fn test_decode_rejects_foreign_tag() {
        let mut bytes = sample().encode();
        bytes[0] ^= 0xFF;
        assert_eq!(NoteRecord::decode(&bytes), Err(LayoutError::DiscriminatorMismatch));
    }

    #[test]
    fn test_decode_rejects_short_data() {
        assert_eq!(
            NoteRecord::decode(&[0u8; 10]),
            Err(LayoutError::TooShort { len: 10 })
        );
    }

    #[test]
    fn test_decode_rejects_oversized_length_prefix() {
        let mut bytes = sample().encode();
        bytes[40..44].copy_from_slice(&u32::MAX.to_le_bytes());
        assert!(matches!(
            NoteRecord::decode(&bytes),
            Err(LayoutError::FieldLength {
                field: Field::Title,
                ..
            })
        ));
    }

    #[test]
    fn test_decode_rejects_bad_utf8() {
        let mut bytes = sample().encode();
        bytes[44] = 0xFF;
        assert_eq!(
            NoteRecord::decode(&bytes),
            Err(LayoutError::InvalidUtf8(Field::Title))
        );
    }

    #[test]
    fn test_decode_rejects_unpadded_truncation() {
        let bytes = sample().encode();
        // cut inside the timestamps
        let cut = 57 + 4 + 24 + 4;
        assert_eq!(
            NoteRecord::decode(&bytes[..cut]),
            Err(LayoutError::Truncated("created_at"))
        );
    }

    #[test]
    fn test_decode_rejects_time_travel() {
        let mut record = sample();
        record.updated_at = record.created_at - 1;
        assert!(matches!(
            NoteRecord::decode(&record.encode()),
            Err(LayoutError::TimestampOrder { .. })
        ));
    }
}
