//! Snapshot reader with strict corruption detection
//!
//! Every frame is checksum-verified. Any framing or checksum failure aborts
//! the whole load; a partially trusted ledger is never returned.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use super::errors::{StorageError, StorageResult};
use super::frame::{LedgerFrame, MIN_FRAME_SIZE};
use super::ledger::{Ledger, MemoryLedger};

/// Sequential reader over a snapshot file
pub struct LedgerReader {
    snapshot_path: PathBuf,
    reader: BufReader<File>,
    current_offset: u64,
    file_size: u64,
}

impl LedgerReader {
    /// Opens a snapshot file for reading.
    pub fn open(snapshot_path: &Path) -> StorageResult<Self> {
        let file = File::open(snapshot_path).map_err(|e| {
            StorageError::io_error(
                format!("Failed to open snapshot: {}", snapshot_path.display()),
                e,
            )
        })?;

        let file_size = file
            .metadata()
            .map_err(|e| StorageError::io_error("Failed to read snapshot metadata", e))?
            .len();

        Ok(Self {
            snapshot_path: snapshot_path.to_path_buf(),
            reader: BufReader::new(file),
            current_offset: 0,
            file_size,
        })
    }

    pub fn path(&self) -> &Path {
        &self.snapshot_path
    }

    pub fn current_offset(&self) -> u64 {
        self.current_offset
    }

    /// Reads the next frame.
    ///
    /// - `Ok(Some(frame))` if a frame was read
    /// - `Ok(None)` at end of file
    /// - `Err(LEDGER_DATA_CORRUPTION)` on any framing or checksum failure
    pub fn read_next(&mut self) -> StorageResult<Option<LedgerFrame>> {
        if self.current_offset >= self.file_size {
            return Ok(None);
        }

        let remaining = self.file_size - self.current_offset;
        if remaining < MIN_FRAME_SIZE as u64 {
            return Err(StorageError::corruption_at_offset(
                self.current_offset,
                format!(
                    "Truncated snapshot: {} bytes remaining, minimum frame size is {}",
                    remaining, MIN_FRAME_SIZE
                ),
            ));
        }

        let mut len_buf = [0u8; 4];
        self.reader.read_exact(&mut len_buf).map_err(|e| {
            StorageError::corruption_at_offset(
                self.current_offset,
                format!("Failed to read frame length: {}", e),
            )
        })?;

        let frame_length = u32::from_le_bytes(len_buf) as u64;
        if frame_length < MIN_FRAME_SIZE as u64 || frame_length > remaining {
            return Err(StorageError::corruption_at_offset(
                self.current_offset,
                format!(
                    "Invalid frame length {} ({} bytes remaining)",
                    frame_length, remaining
                ),
            ));
        }

        let mut frame_buf = vec![0u8; frame_length as usize];
        frame_buf[0..4].copy_from_slice(&len_buf);
        self.reader.read_exact(&mut frame_buf[4..]).map_err(|e| {
            StorageError::corruption_at_offset(
                self.current_offset,
                format!("Failed to read frame body: {}", e),
            )
        })?;

        let (frame, consumed) = LedgerFrame::deserialize(&frame_buf)
            .map_err(|e| StorageError::corruption_at_offset(self.current_offset, e.to_string()))?;

        self.current_offset += consumed as u64;
        Ok(Some(frame))
    }

    /// Reads every frame; any corruption fails the whole read.
    pub fn read_all(&mut self) -> StorageResult<Vec<LedgerFrame>> {
        let mut frames = Vec::new();
        while let Some(frame) = self.read_next()? {
            frames.push(frame);
        }
        Ok(frames)
    }

    /// Rebuild a ledger from the snapshot.
    ///
    /// Duplicate keys are corruption: a snapshot holds each key exactly once.
    pub fn load_ledger(&mut self) -> StorageResult<MemoryLedger> {
        let mut ledger = MemoryLedger::new();
        loop {
            let offset = self.current_offset;
            let frame = match self.read_next()? {
                Some(frame) => frame,
                None => break,
            };
            match frame {
                LedgerFrame::Account { address, account } => {
                    if ledger.insert_account(address, account).is_some() {
                        return Err(StorageError::corruption_at_offset(
                            offset,
                            format!("Duplicate account frame for {}", address),
                        ));
                    }
                }
                LedgerFrame::Balance { identity, amount } => {
                    if ledger.balance(&identity) != 0 {
                        return Err(StorageError::corruption_at_offset(
                            offset,
                            format!("Duplicate balance frame for {}", identity),
                        ));
                    }
                    ledger.set_balance(identity, amount);
                }
            }
        }
        Ok(ledger)
    }
}
