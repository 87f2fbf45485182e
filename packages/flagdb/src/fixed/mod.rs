//! Fixed-record sorted store.
//!
//! A flat file of equal-size `(i64 key, W-byte payload)` records kept in
//! ascending key order, searched and sorted in place on disk.

pub mod iter;
pub mod layout;
pub mod store;

pub use iter::Records;
pub use layout::{Record, RecordLayout, KEY_SIZE};
pub use store::FixDb;
