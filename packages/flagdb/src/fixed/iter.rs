//! Buffered sequential scans over a fixed-record file.
//!
//! Point accessors seek for every read; scans go through a large
//! `BufReader` instead so millions of small fixed reads share a handful of
//! system calls.

use std::fs::File;
use std::io::{BufReader, ErrorKind, Read};

use crate::error::Result;
use crate::fixed::layout::{Record, RecordLayout, KEY_SIZE};

/// Read the next key, or `None` on a clean end of file.
///
/// End of file after a partial key is an error: the file ends in the
/// middle of a record.
pub(crate) fn read_key_or_eof<R: Read>(r: &mut R) -> Result<Option<i64>> {
    let mut buf = [0u8; KEY_SIZE];
    let mut filled = 0;
    while filled < KEY_SIZE {
        match r.read(&mut buf[filled..]) {
            Ok(0) if filled == 0 => return Ok(None),
            Ok(0) => {
                return Err(std::io::Error::new(
                    ErrorKind::UnexpectedEof,
                    "file ends inside a record key",
                )
                .into())
            }
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => {}
            Err(e) => return Err(e.into()),
        }
    }
    Ok(Some(i64::from_be_bytes(buf)))
}

/// Owning iterator over every record in file order.
///
/// Created by [`FixDb::records`](crate::fixed::FixDb::records). Yields
/// `Err` at most once; after an error the iterator is exhausted.
pub struct Records<'a> {
    reader: BufReader<&'a File>,
    layout: RecordLayout,
    done: bool,
}

impl<'a> Records<'a> {
    /// `file` must already be positioned at the first record.
    pub(crate) fn new(file: &'a File, layout: RecordLayout, buffer_size: usize) -> Self {
        Self {
            reader: BufReader::with_capacity(buffer_size, file),
            layout,
            done: false,
        }
    }

    fn read_next(&mut self) -> Result<Option<Record>> {
        let Some(key) = read_key_or_eof(&mut self.reader)? else {
            return Ok(None);
        };
        let mut payload = vec![0u8; self.layout.payload_width()];
        self.reader.read_exact(&mut payload)?;
        Ok(Some(Record { key, payload }))
    }
}

impl Iterator for Records<'_> {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.read_next() {
            Ok(Some(record)) => Some(Ok(record)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}
