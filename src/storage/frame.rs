//! Ledger snapshot frame format
//!
//! ```text
//! +------------------+
//! | Frame Length     | (u32 LE, whole frame including this field)
//! +------------------+
//! | Kind             | (u8: 0 = account, 1 = balance)
//! +------------------+
//! | Key              | (32 bytes: address or identity)
//! +------------------+
//! | Amount           | (u64 LE: deposit or balance)
//! +------------------+
//! | Data             | (u32 LE length + bytes, empty for balances)
//! +------------------+
//! | Checksum         | (u32 LE)
//! +------------------+
//! ```
//!
//! Checksum covers all bytes except the checksum itself.

use std::io::{self, Read};

use crc32fast::Hasher;

use super::ledger::Account;
use crate::address::Address;
use crate::identity::Identity;

const KIND_ACCOUNT: u8 = 0;
const KIND_BALANCE: u8 = 1;

/// len + kind + key + amount + data len + checksum
pub const MIN_FRAME_SIZE: usize = 4 + 1 + 32 + 8 + 4 + 4;

/// One persisted ledger entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerFrame {
    /// A live slot
    Account { address: Address, account: Account },
    /// A non-zero identity balance
    Balance { identity: Identity, amount: u64 },
}

fn frame_checksum(bytes: &[u8]) -> u32 {
    let mut hasher = Hasher::new();
    hasher.update(bytes);
    hasher.finalize()
}

impl LedgerFrame {
    fn serialize_body(&self) -> Vec<u8> {
        let (kind, key, amount, data): (u8, &[u8; 32], u64, &[u8]) = match self {
            LedgerFrame::Account { address, account } => {
                (KIND_ACCOUNT, address.as_bytes(), account.deposit, account.data.as_slice())
            }
            LedgerFrame::Balance { identity, amount } => {
                (KIND_BALANCE, identity.as_bytes(), *amount, &[] as &[u8])
            }
        };

        let mut buf = Vec::with_capacity(MIN_FRAME_SIZE + data.len());
        buf.push(kind);
        buf.extend_from_slice(key);
        buf.extend_from_slice(&amount.to_le_bytes());
        buf.extend_from_slice(&(data.len() as u32).to_le_bytes());
        buf.extend_from_slice(data);
        buf
    }

    /// Serialize the complete frame, checksum included.
    pub fn serialize(&self) -> Vec<u8> {
        let body = self.serialize_body();
        let frame_length = (4 + body.len() + 4) as u32;

        let mut frame = Vec::with_capacity(frame_length as usize);
        frame.extend_from_slice(&frame_length.to_le_bytes());
        frame.extend_from_slice(&body);
        let checksum = frame_checksum(&frame);
        frame.extend_from_slice(&checksum.to_le_bytes());

        frame
    }

    /// Deserialize one frame, verifying its checksum.
    ///
    /// Returns the frame and the number of bytes consumed.
    pub fn deserialize(data: &[u8]) -> io::Result<(Self, usize)> {
        if data.len() < MIN_FRAME_SIZE {
            return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "Frame too short"));
        }

        let frame_length = u32::from_le_bytes([data[0], data[1], data[2], data[3]]) as usize;

        if frame_length < MIN_FRAME_SIZE {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("Invalid frame length: {}", frame_length),
            ));
        }

        if data.len() < frame_length {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!(
                    "Frame truncated: expected {} bytes, got {}",
                    frame_length,
                    data.len()
                ),
            ));
        }

        let checksum_offset = frame_length - 4;
        let stored_checksum = u32::from_le_bytes([
            data[checksum_offset],
            data[checksum_offset + 1],
            data[checksum_offset + 2],
            data[checksum_offset + 3],
        ]);

        let computed_checksum = frame_checksum(&data[..checksum_offset]);
        if computed_checksum != stored_checksum {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!(
                    "Checksum mismatch: computed {:08x}, stored {:08x}",
                    computed_checksum, stored_checksum
                ),
            ));
        }

        let mut cursor = io::Cursor::new(&data[4..checksum_offset]);

        let mut kind = [0u8; 1];
        cursor.read_exact(&mut kind)?;

        let mut key = [0u8; 32];
        cursor.read_exact(&mut key)?;

        let mut amount = [0u8; 8];
        cursor.read_exact(&mut amount)?;
        let amount = u64::from_le_bytes(amount);

        let mut len_buf = [0u8; 4];
        cursor.read_exact(&mut len_buf)?;
        let data_len = u32::from_le_bytes(len_buf) as usize;
        if 4 + 1 + 32 + 8 + 4 + data_len != checksum_offset {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("Data length {} disagrees with frame length {}", data_len, frame_length),
            ));
        }
        let mut payload = vec![0u8; data_len];
        cursor.read_exact(&mut payload)?;

        let frame = match kind[0] {
            KIND_ACCOUNT => LedgerFrame::Account {
                address: Address::new(key),
                account: Account::new(amount, payload),
            },
            KIND_BALANCE if payload.is_empty() => LedgerFrame::Balance {
                identity: Identity::new(key),
                amount,
            },
            KIND_BALANCE => {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    "Balance frame carries data",
                ))
            }
            other => {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("Unknown frame kind: {}", other),
                ))
            }
        };

        Ok((frame, frame_length))
    }
}
