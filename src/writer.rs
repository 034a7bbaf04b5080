use std::fs::{File, OpenOptions};
use std::hash::Hasher;
use std::io::{BufWriter, Seek, SeekFrom, Write};
use std::marker::PhantomData;
use std::path::Path;

use crate::hash::DjbHash;
use crate::io::{write_pair, ReadAt, HEADER_SIZE, PAIR_SIZE};
use crate::reader::ConstDb;
use crate::Error;

/// Buffer in front of the sink. Records and subtables stream through it
/// sequentially; only the final header rewrite seeks.
const SINK_BUFFER: usize = 64 * 1024;

#[derive(Debug)]
struct Entry {
    hash: u64,
    offset: u64,
}

/// Builds a store: a batch of [`put`](ConstDbWriter::put) calls, then one
/// [`finalize`](ConstDbWriter::finalize) (or [`freeze`](ConstDbWriter::freeze),
/// which finalizes and reopens the same bytes for reading).
///
/// The writer is single-producer; it is not thread-safe. An I/O failure
/// during `put` or `finalize` leaves the file garbage — discard it, there
/// is no partial-write recovery.
///
/// # Examples
///
/// ```
/// use constdb::{ConstDbWriter, DjbHash};
/// use std::io::Cursor;
///
/// let mut writer = ConstDbWriter::<_, DjbHash>::new(Cursor::new(Vec::new())).unwrap();
/// writer.put(b"key", b"first").unwrap();
/// writer.put(b"key", b"second").unwrap(); // duplicates are stored too
/// writer.put(b"", b"empty keys are fine").unwrap();
/// writer.finalize().unwrap();
/// ```
pub struct ConstDbWriter<W: Write + Seek, H: Hasher + Default = DjbHash> {
    sink: BufWriter<W>,
    entries: [Vec<Entry>; 256],
    offset: u64,
    finalized: bool,
    _hash: PhantomData<H>,
}

impl<H: Hasher + Default> ConstDbWriter<File, H> {
    /// Creates (or truncates) a store file at `path`.
    ///
    /// The file is opened readable as well, so `freeze` can hand the same
    /// handle to a [`ConstDb`] without reopening the path.
    pub fn create(path: impl AsRef<Path>) -> Result<Self, Error> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)?;
        Self::new(file)
    }
}

impl<W: Write + Seek, H: Hasher + Default> ConstDbWriter<W, H> {
    /// Starts a store on `sink`, reserving the header region with zeroes.
    /// The real header is written by `finalize`.
    pub fn new(mut sink: W) -> Result<Self, Error> {
        sink.seek(SeekFrom::Start(0))?;
        let mut sink = BufWriter::with_capacity(SINK_BUFFER, sink);
        sink.write_all(&[0u8; HEADER_SIZE as usize])?;

        Ok(ConstDbWriter {
            sink,
            entries: [const { Vec::new() }; 256],
            offset: HEADER_SIZE,
            finalized: false,
            _hash: PhantomData,
        })
    }

    /// Appends a record. Records keep their insertion order on disk.
    ///
    /// Duplicate keys are all stored; [`ConstDb::get`] returns the
    /// first-inserted one, and [`ConstDb::records`] sees every copy.
    /// Empty keys and empty values are valid.
    ///
    /// Fails with [`Error::Finalized`] once the store has been finalized.
    pub fn put(&mut self, key: &[u8], value: &[u8]) -> Result<(), Error> {
        if self.finalized {
            return Err(Error::Finalized);
        }

        let mut hasher = H::default();
        hasher.write(key);
        let hash = hasher.finish();
        self.entries[(hash & 0xff) as usize].push(Entry {
            hash,
            offset: self.offset,
        });

        write_pair(&mut self.sink, key.len() as u64, value.len() as u64)?;
        self.sink.write_all(key)?;
        self.sink.write_all(value)?;
        self.offset += PAIR_SIZE + key.len() as u64 + value.len() as u64;
        Ok(())
    }

    /// Writes the 256 subtables after the records, rewrites the header,
    /// and flushes. Runs at most once; repeated calls are no-ops, so a
    /// `finalize` after `freeze`-style shutdown paths cannot corrupt the
    /// index.
    pub fn finalize(&mut self) -> Result<(), Error> {
        if self.finalized {
            return Ok(());
        }

        let mut header = [(0u64, 0u64); 256];
        for (i, entries) in self.entries.iter().enumerate() {
            if entries.is_empty() {
                continue;
            }

            let length = entries.len() as u64 * 2;
            header[i] = (self.offset, length);

            // First-empty-slot placement, in insertion order. Occupied
            // slots always carry a record offset >= HEADER_SIZE, so a zero
            // offset marks an empty slot even when a hash is itself zero.
            let mut slots = vec![(0u64, 0u64); length as usize];
            for entry in entries {
                let mut slot = ((entry.hash >> 8) % length) as usize;
                while slots[slot].1 != 0 {
                    slot = (slot + 1) % length as usize;
                }
                slots[slot] = (entry.hash, entry.offset);
            }

            for (slot_hash, record_offset) in slots {
                write_pair(&mut self.sink, slot_hash, record_offset)?;
            }
            self.offset += length * PAIR_SIZE;
        }

        self.sink.seek(SeekFrom::Start(0))?;
        for (offset, length) in header {
            write_pair(&mut self.sink, offset, length)?;
        }
        self.sink.flush()?;

        self.finalized = true;
        Ok(())
    }

    /// Finalizes and hands the underlying byte source to a reader.
    ///
    /// The sink must support positioned reads; for sinks that do not
    /// (write-only streams), finalize and reopen the store some other
    /// way. Calling `freeze` on an already-finalized writer only performs
    /// the handoff.
    pub fn freeze(mut self) -> Result<ConstDb<W, H>, Error>
    where
        W: ReadAt,
    {
        self.finalize()?;
        let source = self
            .sink
            .into_inner()
            .map_err(|e| Error::Io(e.into_error()))?;
        ConstDb::new(source).map_err(Error::Io)
    }

    /// Consumes the writer and returns the sink, for pulling the encoded
    /// bytes out of in-memory targets.
    ///
    /// Fails with [`Error::NotFinalized`] unless `finalize` ran first.
    pub fn into_inner(mut self) -> Result<W, Error> {
        if !self.finalized {
            return Err(Error::NotFinalized);
        }

        self.sink.flush()?;
        self.sink
            .into_inner()
            .map_err(|e| Error::Io(e.into_error()))
    }
}
