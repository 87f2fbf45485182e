//! flagdb: flat-file stores addressed by position.
//!
//! - [`FixDb`]: fixed-size `(i64 key, payload)` records kept sorted on disk,
//!   looked up by binary search directly against the file
//! - [`FlagFile`]: one byte per id at offset `id`
//! - [`SliceLog`]: append-only big-endian `u32` values
//!
//! None of them keep an in-memory index. All I/O is blocking and a store
//! handle assumes it is the only writer of its file.
//!
//! # Usage
//!
//! ```no_run
//! use std::ops::ControlFlow;
//! use flagdb::{FixDb, FixDbConfig};
//!
//! let mut db = FixDb::open_with("/tmp/ids.fdb", FixDbConfig::new(4)).unwrap();
//! db.append(30, b"ccc!").unwrap();
//! db.append(10, b"aaa!").unwrap();
//! db.sort().unwrap();
//!
//! assert_eq!(db.get(10).unwrap(), b"aaa!");
//! db.update(30, b"CCC!").unwrap();
//!
//! db.iterate(|key, payload| -> flagdb::Result<ControlFlow<()>> {
//!     println!("{key}: {payload:?}");
//!     Ok(ControlFlow::Continue(()))
//! })
//! .unwrap();
//! db.close().unwrap();
//! ```

pub mod config;
pub mod error;
pub mod fixed;
pub mod flag;
pub mod slice;
pub mod sort;

pub use config::FixDbConfig;
pub use error::{FlagError, Result};
pub use fixed::{FixDb, Record, RecordLayout, Records};
pub use flag::FlagFile;
pub use slice::SliceLog;
pub use sort::SortableSeq;
