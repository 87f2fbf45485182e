//! Byte-addressable flag file.
//!
//! One byte per id: the flag for `id` lives at byte offset `id`. Setting a
//! flag past the end grows the file, and the gap reads back as zeros.

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{FlagError, Result};

#[derive(Debug)]
pub struct FlagFile {
    file: File,
    path: PathBuf,
    read_only: bool,
}

impl FlagFile {
    /// Open or create a flag file for read/write.
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path.as_ref())?;
        Ok(Self::attach(file, path.as_ref(), false))
    }

    /// Open an existing flag file for reading only.
    pub fn open_read_only(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        Ok(Self::attach(file, path.as_ref(), true))
    }

    fn attach(file: File, path: &Path, read_only: bool) -> Self {
        debug!(path = %path.display(), read_only, "opened flag file");
        Self {
            file,
            path: path.to_path_buf(),
            read_only,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Set the flag byte for `id`.
    pub fn set(&mut self, id: u64, value: u8) -> Result<()> {
        if self.read_only {
            return Err(FlagError::ReadOnly);
        }
        self.file.seek(SeekFrom::Start(id))?;
        self.file.write_all(&[value])?;
        Ok(())
    }

    /// Flag byte for `id`. Fails with `Io` past the end of the file.
    pub fn get(&mut self, id: u64) -> Result<u8> {
        self.file.seek(SeekFrom::Start(id))?;
        let mut buf = [0u8; 1];
        self.file.read_exact(&mut buf)?;
        Ok(buf[0])
    }

    /// Number of addressable ids (file size).
    pub fn len(&self) -> Result<u64> {
        Ok(self.file.metadata()?.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Highest addressable id, or `None` for an empty file.
    pub fn last(&self) -> Result<Option<u64>> {
        Ok(self.len()?.checked_sub(1))
    }

    /// Flush and release the file handle.
    pub fn release(self) -> Result<()> {
        if !self.read_only {
            self.file.sync_all()?;
        }
        Ok(())
    }
}
