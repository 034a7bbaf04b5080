use std::io::{self, ErrorKind};

use crate::hash::DjbHash;
use crate::io::{read_pair, ReadAt, HEADER_SIZE, PAIR_SIZE};
use crate::reader::ConstDb;

/// Iterator over every record of a store in physical file order, which is
/// the writer's insertion order. Duplicate keys appear once per insertion.
///
/// Returned by [`ConstDb::records`].
pub struct Records<'db, R, H = DjbHash> {
    db: &'db ConstDb<R, H>,
    pos: u64,
    end: u64,
}

impl<'db, R: ReadAt, H> Records<'db, R, H> {
    pub(crate) fn new(db: &'db ConstDb<R, H>) -> Self {
        // The record region runs from the end of the header to the first
        // subtable. A store with no entries has no record region at all.
        let end = db
            .header
            .iter()
            .filter(|table| table.length > 0 && table.offset >= HEADER_SIZE)
            .map(|table| table.offset)
            .min()
            .unwrap_or(HEADER_SIZE);

        Records {
            db,
            pos: HEADER_SIZE,
            end,
        }
    }
}

impl<R: ReadAt, H> Iterator for Records<'_, R, H> {
    type Item = io::Result<(Vec<u8>, Vec<u8>)>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.pos >= self.end {
            return None;
        }

        let (key_len, value_len) = match read_pair(&self.db.source, self.pos) {
            Ok(pair) => pair,
            Err(e) => return Some(Err(e)),
        };

        let total = PAIR_SIZE
            .saturating_add(key_len)
            .saturating_add(value_len);
        if self.pos.saturating_add(total) > self.end {
            return Some(Err(io::Error::new(
                ErrorKind::InvalidData,
                "record extends past the record region",
            )));
        }

        let mut key = vec![0u8; key_len as usize];
        if let Err(e) = self.db.source.read_exact_at(&mut key, self.pos + PAIR_SIZE) {
            return Some(Err(e));
        }

        let mut value = vec![0u8; value_len as usize];
        if let Err(e) = self
            .db
            .source
            .read_exact_at(&mut value, self.pos + PAIR_SIZE + key_len)
        {
            return Some(Err(e));
        }

        self.pos += total;
        Some(Ok((key, value)))
    }
}
