use std::io::{Error, ErrorKind, Result, Write};

/// Size in bytes of one encoded `(u64, u64)` pair: a subtable descriptor,
/// a hash-table slot, or a record's length prefix.
pub(crate) const PAIR_SIZE: u64 = 16;

/// Size in bytes of the file header: 256 subtable descriptors.
pub(crate) const HEADER_SIZE: u64 = 256 * PAIR_SIZE;

/// Positioned reads from an immutable byte source.
///
/// `read_at` must not depend on any cursor the source keeps; concurrent
/// calls on the same source must not disturb each other. This is the only
/// capability a [`crate::ConstDb`] requires of its backing storage.
pub trait ReadAt {
    /// Reads up to `buf.len()` bytes starting at `offset`, returning how
    /// many were read. A return of 0 with a non-empty `buf` means
    /// end-of-source.
    fn read_at(&self, buf: &mut [u8], offset: u64) -> Result<usize>;

    /// Fills all of `buf` from `offset`, retrying interrupted reads.
    /// Fails with `UnexpectedEof` if the source ends first.
    fn read_exact_at(&self, mut buf: &mut [u8], mut offset: u64) -> Result<()> {
        while !buf.is_empty() {
            match self.read_at(buf, offset) {
                Ok(0) => {
                    return Err(Error::new(
                        ErrorKind::UnexpectedEof,
                        "source ended before the buffer was filled",
                    ));
                }
                Ok(n) => {
                    let rest = buf;
                    buf = &mut rest[n..];
                    offset += n as u64;
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => {}
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }
}

impl ReadAt for [u8] {
    fn read_at(&self, buf: &mut [u8], offset: u64) -> Result<usize> {
        if offset >= self.len() as u64 {
            return Ok(0);
        }
        let start = offset as usize;
        let n = buf.len().min(self.len() - start);
        buf[..n].copy_from_slice(&self[start..start + n]);
        Ok(n)
    }
}

impl<R: ReadAt + ?Sized> ReadAt for &R {
    fn read_at(&self, buf: &mut [u8], offset: u64) -> Result<usize> {
        (**self).read_at(buf, offset)
    }
}

#[cfg(unix)]
impl ReadAt for std::fs::File {
    fn read_at(&self, buf: &mut [u8], offset: u64) -> Result<usize> {
        std::os::unix::fs::FileExt::read_at(self, buf, offset)
    }
}

// seek_read moves the OS-level cursor; readers never rely on it.
#[cfg(windows)]
impl ReadAt for std::fs::File {
    fn read_at(&self, buf: &mut [u8], offset: u64) -> Result<usize> {
        std::os::windows::fs::FileExt::seek_read(self, buf, offset)
    }
}

impl<T: AsRef<[u8]>> ReadAt for std::io::Cursor<T> {
    fn read_at(&self, buf: &mut [u8], offset: u64) -> Result<usize> {
        self.get_ref().as_ref().read_at(buf, offset)
    }
}

#[cfg(feature = "mmap")]
impl ReadAt for memmap2::Mmap {
    fn read_at(&self, buf: &mut [u8], offset: u64) -> Result<usize> {
        self[..].read_at(buf, offset)
    }
}

/// Decodes two little-endian u64 values from the first 16 bytes of `buf`.
pub(crate) fn decode_pair(buf: &[u8]) -> (u64, u64) {
    let mut a = [0u8; 8];
    let mut b = [0u8; 8];
    a.copy_from_slice(&buf[..8]);
    b.copy_from_slice(&buf[8..16]);
    (u64::from_le_bytes(a), u64::from_le_bytes(b))
}

/// Reads a 16-byte `(u64, u64)` pair at `offset`.
pub(crate) fn read_pair<R: ReadAt + ?Sized>(source: &R, offset: u64) -> Result<(u64, u64)> {
    let mut buf = [0u8; PAIR_SIZE as usize];
    source.read_exact_at(&mut buf, offset)?;
    Ok(decode_pair(&buf))
}

/// Writes a 16-byte `(u64, u64)` pair, each value little-endian.
pub(crate) fn write_pair<W: Write + ?Sized>(sink: &mut W, a: u64, b: u64) -> Result<()> {
    sink.write_all(&a.to_le_bytes())?;
    sink.write_all(&b.to_le_bytes())
}
