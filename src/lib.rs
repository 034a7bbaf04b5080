//! # constdb
//!
//! An immutable, on-disk constant key/value store in the classic cdb
//! format, widened to 64-bit offsets so a single file may hold more than
//! 4 GiB of data and index.
//!
//! A [`ConstDbWriter`] accepts a batch of `put` calls and finalizes the
//! file once; after that any number of [`ConstDb`] readers answer
//! exact-match point lookups, concurrently and without locks. Keys and
//! values are opaque byte strings; the store never interprets them.
//!
//! ## File format
//!
//! A store is a single file: a 4096-byte header of 256 `(offset, length)`
//! subtable descriptors, the record stream (`key_len`, `value_len`, key,
//! value, with every integer a little-endian u64), then 256 open-addressed
//! hash subtables of 16-byte `(hash, record_offset)` slots. A lookup
//! hashes the key, picks a subtable from the low byte of the hash, and
//! probes linearly from `(hash >> 8) % length`, comparing stored keys only
//! on a full 64-bit hash match. Each subtable holds twice as many slots as
//! entries, so probes stay short and an empty slot ends every unsuccessful
//! lookup.
//!
//! The default table hash is [`DjbHash`]; any `Hasher + Default` type can
//! be substituted, as long as reader and writer agree on it.
//!
//! ## Example
//!
//! ```rust
//! use constdb::{ConstDb, ConstDbWriter, DjbHash, Error};
//! use std::io::Cursor;
//!
//! fn main() -> Result<(), Error> {
//!     let mut writer = ConstDbWriter::<_, DjbHash>::new(Cursor::new(Vec::new()))?;
//!     writer.put(b"hello", b"world")?;
//!     writer.put(b"rust", b"is fast")?;
//!
//!     // Finalize and hand the same byte source to a reader.
//!     let db = writer.freeze()?;
//!     assert_eq!(db.get(b"hello")?.as_deref(), Some(b"world".as_ref()));
//!     assert!(db.get(b"missing")?.is_none());
//!     Ok(())
//! }
//! ```
//!
//! File-backed stores work the same way through
//! [`ConstDbWriter::create`] and [`ConstDb::open`], and every record can
//! be walked in physical file order with [`ConstDb::records`].

mod hash;
mod io;
mod iter;
mod reader;
mod writer;

pub use hash::DjbHash;
pub use io::ReadAt;
pub use iter::Records;
pub use reader::ConstDb;
pub use writer::ConstDbWriter;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An I/O error from the underlying byte source.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The writer has been finalized; the store accepts no further writes.
    #[error("store has already been finalized")]
    Finalized,

    /// The writer must be finalized before the requested operation.
    #[error("store has not been finalized")]
    NotFinalized,
}
