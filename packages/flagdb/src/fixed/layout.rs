//! Record layout and offset arithmetic for fixed-record files.
//!
//! # File Layout
//!
//! ```text
//! [Record 0][Record 1] ... [Record N-1]      no header, no footer
//! ```
//!
//! Each record is exactly `8 + W` bytes:
//!
//! ```text
//! Offset  Size  Field
//! 0       8     key: i64 (big-endian)
//! 8       W     payload: opaque bytes
//! ```
//!
//! W is not stored anywhere in the file. Opening a file with a different
//! width silently shifts every record boundary.

use std::io::{ErrorKind, Read, Write};

use crate::error::{FlagError, Result};

/// Width of the key field in bytes.
pub const KEY_SIZE: usize = 8;

/// Offset arithmetic for records with a fixed payload width.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordLayout {
    payload_width: usize,
}

impl RecordLayout {
    pub fn new(payload_width: usize) -> Self {
        Self { payload_width }
    }

    /// Payload width W.
    #[inline]
    pub fn payload_width(&self) -> usize {
        self.payload_width
    }

    /// `8 + W`
    #[inline]
    pub fn record_size(&self) -> u64 {
        (KEY_SIZE + self.payload_width) as u64
    }

    /// Byte offset of record `index` (and of its key).
    ///
    /// An index whose offset does not fit in a `u64` is past the end of any
    /// file and fails with `Io(UnexpectedEof)`.
    #[inline]
    pub fn record_offset(&self, index: u64) -> Result<u64> {
        index
            .checked_mul(self.record_size())
            .ok_or_else(|| offset_overflow(index))
    }

    /// Byte offset of the payload of record `index`.
    #[inline]
    pub fn payload_offset(&self, index: u64) -> Result<u64> {
        self.record_offset(index)?
            .checked_add(KEY_SIZE as u64)
            .ok_or_else(|| offset_overflow(index))
    }

    /// Number of records in a file of `file_size` bytes.
    ///
    /// A size that is not a whole number of records means the file was
    /// truncated, written with another width, or is not a record file.
    pub fn record_count(&self, file_size: u64) -> Result<u64> {
        let record_size = self.record_size();
        if file_size % record_size != 0 {
            return Err(FlagError::Corrupted {
                size: file_size,
                record_size,
            });
        }
        Ok(file_size / record_size)
    }

    /// Check that a payload fits this layout exactly.
    pub fn check_payload(&self, payload: &[u8]) -> Result<()> {
        if payload.len() != self.payload_width {
            return Err(FlagError::InvalidPayload {
                expected: self.payload_width,
                actual: payload.len(),
            });
        }
        Ok(())
    }
}

pub(crate) fn offset_overflow(index: u64) -> FlagError {
    FlagError::Io(std::io::Error::new(
        ErrorKind::UnexpectedEof,
        format!("index {} is beyond any addressable offset", index),
    ))
}

/// A single key + payload record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub key: i64,
    pub payload: Vec<u8>,
}

impl Record {
    pub fn new(key: i64, payload: impl Into<Vec<u8>>) -> Self {
        Self {
            key,
            payload: payload.into(),
        }
    }

    /// Write record to writer (8-byte big-endian key, then payload).
    pub fn write_to<W: Write>(&self, w: &mut W) -> Result<()> {
        w.write_all(&self.key.to_be_bytes())?;
        w.write_all(&self.payload)?;
        Ok(())
    }

    /// Read one record of the given layout from reader.
    pub fn read_from<R: Read>(r: &mut R, layout: &RecordLayout) -> Result<Self> {
        let mut key = [0u8; KEY_SIZE];
        r.read_exact(&mut key)?;
        let mut payload = vec![0u8; layout.payload_width()];
        r.read_exact(&mut payload)?;
        Ok(Self {
            key: i64::from_be_bytes(key),
            payload,
        })
    }
}
