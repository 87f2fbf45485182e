//! Append-only log of big-endian `u32` values.
//!
//! ```text
//! [u32][u32][u32] ...      4 bytes each, no header
//! ```
//!
//! Values are appended unsorted and ordered on demand with the same
//! index-driven sort as [`FixDb`](crate::fixed::FixDb).

use std::fs::{File, OpenOptions};
use std::io::{BufReader, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, trace};

use crate::error::{FlagError, Result};
use crate::fixed::layout::offset_overflow;
use crate::sort::{self, SortableSeq};

/// Width of one value in bytes.
pub const VALUE_SIZE: u64 = 4;

#[derive(Debug)]
pub struct SliceLog {
    file: File,
    path: PathBuf,
    read_only: bool,
}

impl SliceLog {
    /// Open or create a log for read/write.
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path.as_ref())?;
        Self::attach(file, path.as_ref(), false)
    }

    /// Open an existing log for reading only.
    pub fn open_read_only(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        Self::attach(file, path.as_ref(), true)
    }

    fn attach(file: File, path: &Path, read_only: bool) -> Result<Self> {
        let log = Self {
            file,
            path: path.to_path_buf(),
            read_only,
        };
        let values = log.len()?;
        debug!(path = %log.path.display(), values, read_only, "opened slice log");
        Ok(log)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn ensure_writable(&self) -> Result<()> {
        if self.read_only {
            return Err(FlagError::ReadOnly);
        }
        Ok(())
    }

    /// Number of values.
    pub fn len(&self) -> Result<u64> {
        let size = self.file.metadata()?.len();
        if size % VALUE_SIZE != 0 {
            return Err(FlagError::Corrupted {
                size,
                record_size: VALUE_SIZE,
            });
        }
        Ok(size / VALUE_SIZE)
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Byte offset of value `index`.
    fn value_offset(index: u64) -> Result<u64> {
        index
            .checked_mul(VALUE_SIZE)
            .ok_or_else(|| offset_overflow(index))
    }

    /// Value at `index`. Fails with `Io` past the end.
    pub fn get(&mut self, index: u64) -> Result<u32> {
        self.file.seek(SeekFrom::Start(Self::value_offset(index)?))?;
        let mut buf = [0u8; VALUE_SIZE as usize];
        self.file.read_exact(&mut buf)?;
        Ok(u32::from_be_bytes(buf))
    }

    fn set(&mut self, index: u64, value: u32) -> Result<()> {
        self.file.seek(SeekFrom::Start(Self::value_offset(index)?))?;
        self.file.write_all(&value.to_be_bytes())?;
        Ok(())
    }

    /// Last value, or `None` for an empty log.
    pub fn last(&mut self) -> Result<Option<u32>> {
        match self.len()? {
            0 => Ok(None),
            n => self.get(n - 1).map(Some),
        }
    }

    pub fn append(&mut self, value: u32) -> Result<()> {
        self.ensure_writable()?;
        let end = self.len()?;
        self.set(end, value)
    }

    /// Append many values behind a single seek.
    pub fn append_batch(&mut self, values: &[u32]) -> Result<()> {
        self.ensure_writable()?;
        let end = Self::value_offset(self.len()?)?;
        self.file.seek(SeekFrom::Start(end))?;
        let mut writer = BufWriter::new(&self.file);
        for value in values {
            writer.write_all(&value.to_be_bytes())?;
        }
        writer.flush()?;
        trace!(count = values.len(), "appended batch");
        Ok(())
    }

    /// Up to `limit` values starting at element `offset`.
    ///
    /// Returns fewer (possibly none) when the log ends first.
    pub fn limit(&mut self, limit: usize, offset: u64) -> Result<Vec<u32>> {
        let available = self.len()?.saturating_sub(offset);
        let count = available.min(limit as u64) as usize;
        if count == 0 {
            return Ok(Vec::new());
        }

        self.file.seek(SeekFrom::Start(Self::value_offset(offset)?))?;
        let mut reader = BufReader::new(&self.file);
        let mut values = Vec::with_capacity(count);
        let mut buf = [0u8; VALUE_SIZE as usize];
        for _ in 0..count {
            reader.read_exact(&mut buf)?;
            values.push(u32::from_be_bytes(buf));
        }
        Ok(values)
    }

    /// Sort the log ascending, in place.
    pub fn sort(&mut self) -> Result<()> {
        self.ensure_writable()?;
        debug!(path = %self.path.display(), "sorting slice log");
        sort::sort(self)
    }

    /// Flush and release the file handle.
    pub fn release(self) -> Result<()> {
        if !self.read_only {
            self.file.sync_all()?;
        }
        Ok(())
    }
}

impl SortableSeq for SliceLog {
    fn seq_len(&mut self) -> Result<u64> {
        self.len()
    }

    fn less(&mut self, i: u64, j: u64) -> Result<bool> {
        Ok(self.get(i)? < self.get(j)?)
    }

    fn swap(&mut self, i: u64, j: u64) -> Result<()> {
        if i == j {
            return Ok(());
        }
        let value_i = self.get(i)?;
        let value_j = self.get(j)?;
        self.set(i, value_j)?;
        self.set(j, value_i)
    }
}
