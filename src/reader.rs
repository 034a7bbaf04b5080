use std::fs::File;
use std::hash::Hasher;
use std::io;
use std::marker::PhantomData;
use std::path::Path;

use crate::hash::DjbHash;
use crate::io::{decode_pair, read_pair, ReadAt, HEADER_SIZE, PAIR_SIZE};
use crate::iter::Records;

/// One subtable descriptor from the header: the absolute byte offset of
/// the subtable's first slot, and its length counted in slots.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct Table {
    pub(crate) offset: u64,
    pub(crate) length: u64,
}

/// Read handle over a finalized store.
///
/// Construction reads the 4096-byte header once; after that the handle is
/// immutable and [`get`](ConstDb::get) may be called from any number of
/// threads concurrently (each call hashes with its own `H::default()`).
///
/// The source only needs to support positioned reads, so a store can live
/// in a [`File`], a byte slice, a `Cursor`, or a memory map.
///
/// # Examples
///
/// ```
/// use constdb::{ConstDb, ConstDbWriter, DjbHash};
/// use std::io::Cursor;
///
/// let mut writer = ConstDbWriter::<_, DjbHash>::new(Cursor::new(Vec::new())).unwrap();
/// writer.put(b"key", b"value").unwrap();
/// let db = writer.freeze().unwrap();
///
/// assert_eq!(db.get(b"key").unwrap().as_deref(), Some(b"value".as_ref()));
/// assert!(db.get(b"absent").unwrap().is_none());
/// ```
#[derive(Debug)]
pub struct ConstDb<R, H = DjbHash> {
    pub(crate) source: R,
    pub(crate) header: [Table; 256],
    _hash: PhantomData<H>,
}

impl<H: Hasher + Default> ConstDb<File, H> {
    /// Opens a finalized store file.
    pub fn open<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        Self::new(File::open(path)?)
    }
}

#[cfg(feature = "mmap")]
impl<H: Hasher + Default> ConstDb<memmap2::Mmap, H> {
    /// Opens a finalized store file through a read-only memory map.
    ///
    /// Lookups then run against the mapped bytes with no syscalls. The map
    /// keeps the file alive for the lifetime of the handle.
    ///
    /// # Safety
    ///
    /// As with any file-backed map, the caller must ensure no other
    /// process truncates or rewrites the file while the map is live.
    pub fn open_mmap<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let file = File::open(path)?;
        let map = unsafe { memmap2::Mmap::map(&file)? };
        Self::new(map)
    }
}

impl<R: ReadAt, H: Hasher + Default> ConstDb<R, H> {
    /// Opens a store over any positioned-read source.
    ///
    /// Fails with `UnexpectedEof` if the source is shorter than the
    /// 4096-byte header.
    pub fn new(source: R) -> io::Result<Self> {
        let mut buf = [0u8; HEADER_SIZE as usize];
        source.read_exact_at(&mut buf, 0)?;

        let mut header = [Table::default(); 256];
        for (table, chunk) in header.iter_mut().zip(buf.chunks_exact(PAIR_SIZE as usize)) {
            let (offset, length) = decode_pair(chunk);
            *table = Table { offset, length };
        }

        Ok(ConstDb {
            source,
            header,
            _hash: PhantomData,
        })
    }

    /// Looks up `key`, returning its value or `None` if the store has no
    /// such key. A stored empty value comes back as `Some(vec![])`.
    ///
    /// The low byte of the key's hash selects a subtable; probing starts
    /// at `(hash >> 8) % length` and walks forward with wrap-around. An
    /// all-zero slot means the key is absent, because entries for one home
    /// slot are packed contiguously. A slot whose hash matches still has
    /// its record's key compared byte-for-byte, so full 64-bit hash
    /// collisions resolve to the right record. The probe gives up after
    /// one full cycle.
    pub fn get(&self, key: &[u8]) -> io::Result<Option<Vec<u8>>> {
        let mut hasher = H::default();
        hasher.write(key);
        let hash = hasher.finish();

        let table = self.header[(hash & 0xff) as usize];
        if table.length == 0 {
            return Ok(None);
        }

        let home = (hash >> 8) % table.length;
        for i in 0..table.length {
            let slot = (home + i) % table.length;
            let (slot_hash, record_offset) =
                read_pair(&self.source, table.offset + slot * PAIR_SIZE)?;

            if slot_hash == 0 && record_offset == 0 {
                return Ok(None);
            }
            if slot_hash != hash {
                continue;
            }
            if let Some(value) = self.read_record(record_offset, key)? {
                return Ok(Some(value));
            }
        }
        Ok(None)
    }

    /// Reads the record at `offset` and returns its value if its key is
    /// exactly `key`; `None` when a colliding hash led to some other key.
    fn read_record(&self, offset: u64, key: &[u8]) -> io::Result<Option<Vec<u8>>> {
        let (key_len, value_len) = read_pair(&self.source, offset)?;
        if key_len != key.len() as u64 {
            return Ok(None);
        }

        // Key and value are adjacent on disk; fetch both in one read.
        let mut buf = vec![0u8; key_len.saturating_add(value_len) as usize];
        self.source.read_exact_at(&mut buf, offset + PAIR_SIZE)?;

        if buf[..key_len as usize] != *key {
            return Ok(None);
        }
        Ok(Some(buf.split_off(key_len as usize)))
    }

    /// Iterates every record in physical file order, duplicates included.
    pub fn records(&self) -> Records<'_, R, H> {
        Records::new(self)
    }
}
