//! `FixDb`: a sorted file of fixed-size records.
//!
//! Lookups binary-search the file directly, using one seek and an 8-byte
//! read per probe. Records must be in non-decreasing key order for
//! `search`, `get`, `update` and `insert` to be correct; `append` breaks
//! that order and `sort` restores it.
//!
//! There is no locking and no multi-step atomicity. `update` is a search
//! followed by a write, and another writer on the same file could move the
//! record in between.

use std::fs::{File, OpenOptions};
use std::io::{BufReader, BufWriter, ErrorKind, Read, Seek, SeekFrom, Write};
use std::ops::ControlFlow;
use std::path::{Path, PathBuf};

use tracing::{debug, trace, warn};

use crate::config::FixDbConfig;
use crate::error::{FlagError, Result};
use crate::fixed::iter::{read_key_or_eof, Records};
use crate::fixed::layout::{Record, RecordLayout, KEY_SIZE};
use crate::sort::{self, SortableSeq};

/// Disk-backed store of `(i64 key, W-byte payload)` records.
#[derive(Debug)]
pub struct FixDb {
    file: File,
    path: PathBuf,
    config: FixDbConfig,
    layout: RecordLayout,
    read_only: bool,
}

impl FixDb {
    // ── Open / Close ───────────────────────────────────────────────

    /// Open or create a store with the default 24-byte payload width.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with(path, FixDbConfig::default())
    }

    /// Open or create a store for read/write.
    pub fn open_with(path: impl AsRef<Path>, config: FixDbConfig) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path.as_ref())?;
        Self::attach(file, path.as_ref(), config, false)
    }

    /// Open an existing store without write access.
    ///
    /// Mutating operations fail with [`FlagError::ReadOnly`].
    pub fn open_read_only(path: impl AsRef<Path>, config: FixDbConfig) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        Self::attach(file, path.as_ref(), config, true)
    }

    /// Open or create a store whose width is persisted in a JSON sidecar.
    ///
    /// If `<path>.json` exists its width wins over `config`. Otherwise the
    /// data file is opened with `config` and, once that succeeds, `config`
    /// is written there.
    pub fn open_with_sidecar(path: impl AsRef<Path>, config: FixDbConfig) -> Result<Self> {
        let path = path.as_ref();
        match FixDbConfig::read_from(path)? {
            Some(stored) => {
                if stored.payload_width != config.payload_width {
                    warn!(
                        path = %path.display(),
                        requested = config.payload_width,
                        stored = stored.payload_width,
                        "payload width differs from sidecar, using sidecar"
                    );
                }
                Self::open_with(path, config.payload_width(stored.payload_width))
            }
            None => {
                // Only a width the data file accepted is persisted.
                let db = Self::open_with(path, config)?;
                config.write_to(path)?;
                Ok(db)
            }
        }
    }

    fn attach(file: File, path: &Path, config: FixDbConfig, read_only: bool) -> Result<Self> {
        config.validate()?;
        let db = Self {
            file,
            path: path.to_path_buf(),
            layout: RecordLayout::new(config.payload_width),
            config,
            read_only,
        };
        // Refuse files that are not a whole number of records up front.
        let records = db.len()?;
        debug!(
            path = %db.path.display(),
            payload_width = config.payload_width,
            records,
            read_only,
            "opened fixed-record store"
        );
        Ok(db)
    }

    /// Flush to disk and release the file handle.
    pub fn close(self) -> Result<()> {
        if !self.read_only {
            self.file.sync_all()?;
        }
        debug!(path = %self.path.display(), "closed fixed-record store");
        Ok(())
    }

    /// Flush file contents and metadata to disk.
    pub fn sync(&self) -> Result<()> {
        self.file.sync_all()?;
        Ok(())
    }

    // ── Accessors ──────────────────────────────────────────────────

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn config(&self) -> &FixDbConfig {
        &self.config
    }

    pub fn layout(&self) -> RecordLayout {
        self.layout
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    /// Number of records (`file size / (8 + W)`).
    pub fn len(&self) -> Result<u64> {
        let size = self.file.metadata()?.len();
        self.layout.record_count(size)
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    fn ensure_writable(&self) -> Result<()> {
        if self.read_only {
            return Err(FlagError::ReadOnly);
        }
        Ok(())
    }

    // ── Raw Record Access ──────────────────────────────────────────

    /// Key of record `index`. Fails with `Io` past the last record.
    pub fn read_key(&mut self, index: u64) -> Result<i64> {
        self.file.seek(SeekFrom::Start(self.layout.record_offset(index)?))?;
        let mut buf = [0u8; KEY_SIZE];
        self.file.read_exact(&mut buf)?;
        Ok(i64::from_be_bytes(buf))
    }

    /// Payload of record `index`. Fails with `Io` past the last record.
    pub fn read_payload(&mut self, index: u64) -> Result<Vec<u8>> {
        self.file.seek(SeekFrom::Start(self.layout.payload_offset(index)?))?;
        let mut payload = vec![0u8; self.layout.payload_width()];
        self.file.read_exact(&mut payload)?;
        Ok(payload)
    }

    /// Whole record `index`.
    pub fn read_record(&mut self, index: u64) -> Result<Record> {
        self.file.seek(SeekFrom::Start(self.layout.record_offset(index)?))?;
        Record::read_from(&mut self.file, &self.layout)
    }

    /// Overwrite the payload of record `index`. The key is never touched.
    pub fn write_payload(&mut self, index: u64, payload: &[u8]) -> Result<()> {
        self.ensure_writable()?;
        self.layout.check_payload(payload)?;
        let len = self.len()?;
        if index >= len {
            return Err(out_of_range(index, len));
        }
        self.file.seek(SeekFrom::Start(self.layout.payload_offset(index)?))?;
        self.file.write_all(payload)?;
        Ok(())
    }

    /// Unchecked whole-record write; may extend the file by one record.
    fn write_record(&mut self, index: u64, record: &Record) -> Result<()> {
        self.file.seek(SeekFrom::Start(self.layout.record_offset(index)?))?;
        let mut buf = Vec::with_capacity(self.layout.record_size() as usize);
        record.write_to(&mut buf)?;
        self.file.write_all(&buf)?;
        Ok(())
    }

    // ── Search ─────────────────────────────────────────────────────

    /// Index of the first record whose key is `>= key`, or `len()` if none.
    pub fn lower_bound(&mut self, key: i64) -> Result<u64> {
        let (mut lo, mut hi) = (0u64, self.len()?);
        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            if self.read_key(mid)? < key {
                lo = mid + 1;
            } else {
                hi = mid;
            }
        }
        Ok(lo)
    }

    /// Index of a record with exactly `key`.
    ///
    /// With duplicate keys this is the first of them. Assumes the file is
    /// sorted; no validation is performed.
    pub fn search(&mut self, key: i64) -> Result<u64> {
        let index = self.lower_bound(key)?;
        if index == self.len()? {
            return Err(FlagError::NotFound(key));
        }
        if self.read_key(index)? != key {
            return Err(FlagError::NotFound(key));
        }
        trace!(key, index, "search hit");
        Ok(index)
    }

    pub fn contains(&mut self, key: i64) -> Result<bool> {
        match self.search(key) {
            Ok(_) => Ok(true),
            Err(FlagError::NotFound(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Payload stored under `key`.
    pub fn get(&mut self, key: i64) -> Result<Vec<u8>> {
        let index = self.search(key)?;
        self.read_payload(index)
    }

    // ── Mutation ───────────────────────────────────────────────────

    /// Replace the payload stored under `key`.
    ///
    /// Keys never change, so the sort order survives any update.
    pub fn update(&mut self, key: i64, payload: &[u8]) -> Result<()> {
        self.ensure_writable()?;
        self.layout.check_payload(payload)?;
        let index = self.search(key)?;
        trace!(key, index, "update payload");
        self.write_payload(index, payload)
    }

    /// Append one record at the end of the file.
    ///
    /// The file is unsorted afterwards unless `key` is `>=` every existing
    /// key; call [`sort`](Self::sort) before searching again.
    pub fn append(&mut self, key: i64, payload: &[u8]) -> Result<u64> {
        self.ensure_writable()?;
        self.layout.check_payload(payload)?;
        let index = self.len()?;
        self.write_record(index, &Record::new(key, payload))?;
        Ok(index)
    }

    /// Append many records with a single seek.
    ///
    /// Every payload is checked before anything is written.
    pub fn append_batch(&mut self, records: &[Record]) -> Result<()> {
        self.ensure_writable()?;
        for record in records {
            self.layout.check_payload(&record.payload)?;
        }
        let end = self.layout.record_offset(self.len()?)?;
        self.file.seek(SeekFrom::Start(end))?;

        let mut writer = BufWriter::with_capacity(self.config.read_buffer_size, &self.file);
        for record in records {
            record.write_to(&mut writer)?;
        }
        writer.flush()?;
        trace!(count = records.len(), "appended batch");
        Ok(())
    }

    /// Insert a record at its sorted position, shifting later records back
    /// by one slot. Equal keys go in front of existing ones.
    ///
    /// Returns the index of the new record. Costs a read and a write of
    /// every record after the insertion point.
    pub fn insert(&mut self, key: i64, payload: &[u8]) -> Result<u64> {
        self.ensure_writable()?;
        self.layout.check_payload(payload)?;

        let len = self.len()?;
        let index = self.lower_bound(key)?;
        self.shift_tail(index, len)?;
        self.write_record(index, &Record::new(key, payload))?;
        trace!(key, index, shifted = len - index, "inserted record");
        Ok(index)
    }

    /// Move records `from..len` to `from + 1..len + 1`, back to front, in
    /// chunks of whole records.
    fn shift_tail(&mut self, from: u64, len: u64) -> Result<()> {
        let record_size = self.layout.record_size();
        let start = self.layout.record_offset(from)?;
        let mut end = self.layout.record_offset(len)?;

        let per_chunk = (self.config.read_buffer_size as u64 / record_size).max(1);
        let mut buf = vec![0u8; (per_chunk * record_size) as usize];

        while end > start {
            let chunk = (end - start).min(buf.len() as u64);
            let src = end - chunk;
            let bytes = &mut buf[..chunk as usize];
            self.file.seek(SeekFrom::Start(src))?;
            self.file.read_exact(bytes)?;
            self.file.seek(SeekFrom::Start(src + record_size))?;
            self.file.write_all(bytes)?;
            end = src;
        }
        Ok(())
    }

    // ── Iteration ──────────────────────────────────────────────────

    /// Visit every record in file order.
    ///
    /// The visitor returns `ControlFlow::Break(())` to stop early, which
    /// still counts as success. Visitor errors and I/O errors (other than
    /// a clean end of file between records) abort the scan and are
    /// returned.
    pub fn iterate<F, E>(&mut self, mut visitor: F) -> std::result::Result<(), E>
    where
        F: FnMut(i64, &[u8]) -> std::result::Result<ControlFlow<()>, E>,
        E: From<FlagError>,
    {
        self.file
            .seek(SeekFrom::Start(0))
            .map_err(|e| E::from(FlagError::Io(e)))?;
        let mut reader = BufReader::with_capacity(self.config.read_buffer_size, &self.file);
        let mut payload = vec![0u8; self.layout.payload_width()];

        while let Some(key) = read_key_or_eof(&mut reader)? {
            reader
                .read_exact(&mut payload)
                .map_err(|e| E::from(FlagError::Io(e)))?;
            if let ControlFlow::Break(()) = visitor(key, &payload)? {
                break;
            }
        }
        Ok(())
    }

    /// Iterator over every record in file order.
    ///
    /// Borrows the store mutably, so no point access can move the file
    /// cursor while the scan is running.
    pub fn records(&mut self) -> Result<Records<'_>> {
        self.file.seek(SeekFrom::Start(0))?;
        Ok(Records::new(
            &self.file,
            self.layout,
            self.config.read_buffer_size,
        ))
    }

    // ── Sorting ────────────────────────────────────────────────────

    /// Reorder the whole file by ascending key.
    ///
    /// Every comparison reads two keys and every exchange reads and writes
    /// two full records, so this is a batch maintenance step, not something
    /// to run per write. The first I/O error stops the sort and is
    /// returned; the file is then partially reordered.
    pub fn sort(&mut self) -> Result<()> {
        self.ensure_writable()?;
        let records = self.len()?;
        debug!(path = %self.path.display(), records, "sorting fixed-record store");
        sort::sort(self)?;
        debug!(path = %self.path.display(), "sort complete");
        Ok(())
    }

    /// Whether keys are in non-decreasing order.
    pub fn is_sorted(&mut self) -> Result<bool> {
        sort::is_sorted(self)
    }
}

impl SortableSeq for FixDb {
    fn seq_len(&mut self) -> Result<u64> {
        self.len()
    }

    fn less(&mut self, i: u64, j: u64) -> Result<bool> {
        Ok(self.read_key(i)? < self.read_key(j)?)
    }

    fn swap(&mut self, i: u64, j: u64) -> Result<()> {
        if i == j {
            return Ok(());
        }
        let record_i = self.read_record(i)?;
        let record_j = self.read_record(j)?;
        self.write_record(i, &record_j)?;
        self.write_record(j, &record_i)
    }
}

fn out_of_range(index: u64, len: u64) -> FlagError {
    FlagError::Io(std::io::Error::new(
        ErrorKind::UnexpectedEof,
        format!("record index {} out of range (len {})", index, len),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn open_w1(dir: &TempDir) -> FixDb {
        FixDb::open_with(dir.path().join("test.fdb"), FixDbConfig::new(1)).unwrap()
    }

    fn keys(db: &mut FixDb) -> Vec<i64> {
        db.records().unwrap().map(|r| r.unwrap().key).collect()
    }

    #[test]
    fn open_creates_empty_file() {
        let dir = TempDir::new().unwrap();
        let db = FixDb::open(dir.path().join("new.fdb")).unwrap();
        assert_eq!(db.len().unwrap(), 0);
        assert!(db.is_empty().unwrap());
        assert_eq!(db.config().payload_width, 24);
        assert!(dir.path().join("new.fdb").exists());
    }

    #[test]
    fn open_rejects_partial_record() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.fdb");
        std::fs::write(&path, vec![0u8; 10]).unwrap();
        let err = FixDb::open_with(&path, FixDbConfig::new(1)).unwrap_err();
        assert!(matches!(err, FlagError::Corrupted { size: 10, record_size: 9 }));
    }

    #[test]
    fn search_on_empty_store_is_not_found() {
        let dir = TempDir::new().unwrap();
        let mut db = open_w1(&dir);
        assert!(matches!(db.search(1), Err(FlagError::NotFound(1))));
        assert_eq!(db.lower_bound(1).unwrap(), 0);
    }

    #[test]
    fn search_finds_every_key_and_rejects_gaps() {
        let dir = TempDir::new().unwrap();
        let mut db = open_w1(&dir);
        for (i, key) in [-10i64, -3, 0, 4, 9].iter().enumerate() {
            db.append(*key, &[i as u8]).unwrap();
        }

        assert_eq!(db.search(-10).unwrap(), 0);
        assert_eq!(db.search(0).unwrap(), 2);
        assert_eq!(db.search(9).unwrap(), 4);
        for absent in [-11, -4, 1, 5, 10] {
            assert!(db.search(absent).unwrap_err().is_not_found());
        }
        assert!(db.contains(4).unwrap());
        assert!(!db.contains(5).unwrap());
    }

    #[test]
    fn search_returns_first_duplicate() {
        let dir = TempDir::new().unwrap();
        let mut db = open_w1(&dir);
        for key in [1, 2, 2, 2, 3] {
            db.append(key, b"x").unwrap();
        }
        assert_eq!(db.search(2).unwrap(), 1);
    }

    #[test]
    fn update_changes_only_target_payload() {
        let dir = TempDir::new().unwrap();
        let mut db = open_w1(&dir);
        db.append(1, b"a").unwrap();
        db.append(2, b"b").unwrap();
        db.append(3, b"c").unwrap();

        db.update(2, b"z").unwrap();

        assert_eq!(db.get(1).unwrap(), b"a");
        assert_eq!(db.get(2).unwrap(), b"z");
        assert_eq!(db.get(3).unwrap(), b"c");
        assert_eq!(keys(&mut db), vec![1, 2, 3]);
    }

    #[test]
    fn update_missing_key_and_bad_payload() {
        let dir = TempDir::new().unwrap();
        let mut db = open_w1(&dir);
        db.append(1, b"a").unwrap();

        assert!(matches!(db.update(7, b"q"), Err(FlagError::NotFound(7))));
        assert!(matches!(
            db.update(1, b"too long"),
            Err(FlagError::InvalidPayload { expected: 1, actual: 8 })
        ));
        assert_eq!(db.get(1).unwrap(), b"a");
    }

    #[test]
    fn reads_past_end_fail_with_io() {
        let dir = TempDir::new().unwrap();
        let mut db = open_w1(&dir);
        db.append(1, b"a").unwrap();

        assert!(matches!(db.read_key(1), Err(FlagError::Io(_))));
        assert!(matches!(db.read_payload(1), Err(FlagError::Io(_))));
        assert!(matches!(db.write_payload(1, b"b"), Err(FlagError::Io(_))));
        assert_eq!(db.len().unwrap(), 1);
    }

    #[test]
    fn key_only_records() {
        let dir = TempDir::new().unwrap();
        let mut db = FixDb::open_with(dir.path().join("k.fdb"), FixDbConfig::new(0)).unwrap();
        for key in [9, 3, 6] {
            db.append(key, &[]).unwrap();
        }
        db.sort().unwrap();
        db.insert(4, &[]).unwrap();

        assert_eq!(keys(&mut db), vec![3, 4, 6, 9]);
        assert_eq!(db.search(6).unwrap(), 2);
        assert!(db.get(9).unwrap().is_empty());
        assert_eq!(std::fs::metadata(db.path()).unwrap().len(), 32);
    }

    #[test]
    fn unaddressable_index_fails_with_io() {
        let dir = TempDir::new().unwrap();
        let mut db = FixDb::open_with(dir.path().join("big.fdb"), FixDbConfig::new(24)).unwrap();
        db.append(7, &[0; 24]).unwrap();

        // Offset overflows u64; must not wrap around onto record 0.
        assert!(matches!(db.read_key(1 << 61), Err(FlagError::Io(_))));
        assert!(matches!(db.read_payload(1 << 61), Err(FlagError::Io(_))));
        assert!(matches!(db.read_record(u64::MAX), Err(FlagError::Io(_))));
        assert!(matches!(db.write_payload(1 << 61, &[1; 24]), Err(FlagError::Io(_))));
        assert_eq!(db.read_key(0).unwrap(), 7);
    }

    #[test]
    fn write_payload_roundtrip() {
        let dir = TempDir::new().unwrap();
        let mut db = FixDb::open_with(dir.path().join("w.fdb"), FixDbConfig::new(4)).unwrap();
        db.append(10, &[0; 4]).unwrap();
        db.append(20, &[0; 4]).unwrap();

        db.write_payload(1, &[0xde, 0xad, 0xbe, 0xef]).unwrap();
        assert_eq!(db.read_payload(1).unwrap(), vec![0xde, 0xad, 0xbe, 0xef]);
        assert_eq!(db.read_key(1).unwrap(), 20);
        assert_eq!(db.read_payload(0).unwrap(), vec![0; 4]);
    }

    #[test]
    fn iterate_visits_in_file_order() {
        let dir = TempDir::new().unwrap();
        let mut db = open_w1(&dir);
        db.append(1, b"a").unwrap();
        db.append(2, b"b").unwrap();
        db.append(3, b"c").unwrap();

        let mut seen = Vec::new();
        db.iterate(|key, payload| -> Result<ControlFlow<()>> {
            seen.push((key, payload[0]));
            Ok(ControlFlow::Continue(()))
        })
        .unwrap();
        assert_eq!(seen, vec![(1, b'a'), (2, b'b'), (3, b'c')]);
    }

    #[test]
    fn iterate_break_after_second_record() {
        let dir = TempDir::new().unwrap();
        let mut db = open_w1(&dir);
        db.append(1, b"a").unwrap();
        db.append(2, b"b").unwrap();
        db.append(3, b"c").unwrap();

        let mut calls = Vec::new();
        let result: Result<()> = db.iterate(|key, _| {
            calls.push(key);
            if calls.len() == 2 {
                Ok(ControlFlow::Break(()))
            } else {
                Ok(ControlFlow::Continue(()))
            }
        });
        assert!(result.is_ok());
        assert_eq!(calls, vec![1, 2]);
    }

    #[test]
    fn iterate_propagates_visitor_error() {
        let dir = TempDir::new().unwrap();
        let mut db = open_w1(&dir);
        db.append(1, b"a").unwrap();
        db.append(2, b"b").unwrap();

        let mut calls = 0;
        let err = db
            .iterate(|key, _| {
                calls += 1;
                Err(FlagError::NotFound(key))
            })
            .unwrap_err();
        assert!(matches!(err, FlagError::NotFound(1)));
        assert_eq!(calls, 1);
    }

    #[test]
    fn iterate_ignores_cursor_left_by_point_reads() {
        let dir = TempDir::new().unwrap();
        let mut db = open_w1(&dir);
        db.append(1, b"a").unwrap();
        db.append(2, b"b").unwrap();
        db.read_key(1).unwrap();

        let mut count = 0;
        db.iterate(|_, _| -> Result<ControlFlow<()>> {
            count += 1;
            Ok(ControlFlow::Continue(()))
        })
        .unwrap();
        assert_eq!(count, 2);
    }

    #[test]
    fn sort_moves_whole_records() {
        let dir = TempDir::new().unwrap();
        let mut db = open_w1(&dir);
        db.append(5, b"e").unwrap();
        db.append(1, b"a").unwrap();
        db.append(3, b"c").unwrap();
        assert!(!db.is_sorted().unwrap());

        db.sort().unwrap();

        let records: Vec<Record> = db.records().unwrap().map(|r| r.unwrap()).collect();
        assert_eq!(
            records,
            vec![
                Record::new(1, b"a".to_vec()),
                Record::new(3, b"c".to_vec()),
                Record::new(5, b"e".to_vec()),
            ]
        );
        assert!(db.is_sorted().unwrap());
    }

    #[test]
    fn insert_keeps_order() {
        let dir = TempDir::new().unwrap();
        let mut db = open_w1(&dir);
        assert_eq!(db.insert(5, b"e").unwrap(), 0);
        assert_eq!(db.insert(1, b"a").unwrap(), 0);
        assert_eq!(db.insert(9, b"i").unwrap(), 2);
        assert_eq!(db.insert(3, b"c").unwrap(), 1);

        assert_eq!(keys(&mut db), vec![1, 3, 5, 9]);
        assert_eq!(db.get(5).unwrap(), b"e");
        assert_eq!(db.get(9).unwrap(), b"i");
    }

    #[test]
    fn insert_shifts_across_chunk_boundaries() {
        let dir = TempDir::new().unwrap();
        // Two records per chunk forces several chunked moves.
        let config = FixDbConfig::new(1).read_buffer_size(18);
        let mut db = FixDb::open_with(dir.path().join("chunks.fdb"), config).unwrap();
        for key in (0..20).map(|k| k * 2) {
            db.append(key, &[key as u8]).unwrap();
        }

        assert_eq!(db.insert(7, &[7]).unwrap(), 4);

        let records: Vec<Record> = db.records().unwrap().map(|r| r.unwrap()).collect();
        assert_eq!(records.len(), 21);
        for record in &records {
            assert_eq!(record.payload, vec![record.key as u8]);
        }
        assert!(db.is_sorted().unwrap());
    }

    #[test]
    fn append_batch_validates_before_writing() {
        let dir = TempDir::new().unwrap();
        let mut db = open_w1(&dir);
        let bad = vec![Record::new(1, b"a".to_vec()), Record::new(2, b"bb".to_vec())];
        assert!(matches!(
            db.append_batch(&bad),
            Err(FlagError::InvalidPayload { .. })
        ));
        assert_eq!(db.len().unwrap(), 0);

        let good = vec![Record::new(2, b"b".to_vec()), Record::new(1, b"a".to_vec())];
        db.append_batch(&good).unwrap();
        assert_eq!(keys(&mut db), vec![2, 1]);
    }

    #[test]
    fn read_only_rejects_mutation() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ro.fdb");
        {
            let mut db = FixDb::open_with(&path, FixDbConfig::new(1)).unwrap();
            db.append(1, b"a").unwrap();
            db.close().unwrap();
        }

        let mut db = FixDb::open_read_only(&path, FixDbConfig::new(1)).unwrap();
        assert!(db.is_read_only());
        assert_eq!(db.get(1).unwrap(), b"a");
        assert!(matches!(db.update(1, b"b"), Err(FlagError::ReadOnly)));
        assert!(matches!(db.append(2, b"b"), Err(FlagError::ReadOnly)));
        assert!(matches!(db.insert(0, b"b"), Err(FlagError::ReadOnly)));
        assert!(matches!(db.sort(), Err(FlagError::ReadOnly)));
    }

    #[test]
    fn read_only_open_does_not_create() {
        let dir = TempDir::new().unwrap();
        let err = FixDb::open_read_only(dir.path().join("missing.fdb"), FixDbConfig::default())
            .unwrap_err();
        assert!(matches!(err, FlagError::Io(_)));
    }

    #[test]
    fn sidecar_width_wins_on_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("side.fdb");
        {
            let mut db = FixDb::open_with_sidecar(&path, FixDbConfig::new(2)).unwrap();
            db.append(1, b"ab").unwrap();
        }

        let mut db = FixDb::open_with_sidecar(&path, FixDbConfig::default()).unwrap();
        assert_eq!(db.config().payload_width, 2);
        assert_eq!(db.get(1).unwrap(), b"ab");
    }

    #[test]
    fn failed_sidecar_open_leaves_no_sidecar() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("side.fdb");
        {
            let mut db = FixDb::open_with(&path, FixDbConfig::new(4)).unwrap();
            db.append(1, b"aaaa").unwrap();
            db.append(2, b"bbbb").unwrap();
        }

        // 24 bytes is not a whole number of 32-byte records.
        let err = FixDb::open_with_sidecar(&path, FixDbConfig::new(24)).unwrap_err();
        assert!(matches!(err, FlagError::Corrupted { size: 24, record_size: 32 }));
        assert!(!FixDbConfig::sidecar_path(&path).exists());

        let mut db = FixDb::open_with_sidecar(&path, FixDbConfig::new(4)).unwrap();
        assert_eq!(db.get(2).unwrap(), b"bbbb");
        assert_eq!(FixDbConfig::read_from(&path).unwrap().unwrap().payload_width, 4);
    }
}
