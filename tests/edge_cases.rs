use constdb::{ConstDb, ConstDbWriter, DjbHash, Error};
use std::hash::Hasher;
use std::io::Cursor;
use tempfile::NamedTempFile;

/// Duplicate keys are all stored; lookups return the first-inserted one
/// because slot placement fills the first empty slot from the home slot
/// forward and probing walks the same order.
#[test]
fn duplicate_keys_first_value_wins() -> Result<(), Error> {
    let mut writer = ConstDbWriter::<_, DjbHash>::new(Cursor::new(Vec::new()))?;
    writer.put(b"duplicate", b"value1")?;
    writer.put(b"duplicate", b"value2")?;
    writer.put(b"duplicate", b"value3")?;
    writer.put(b"other", b"other_value")?;

    let db = writer.freeze()?;
    assert_eq!(db.get(b"duplicate")?.as_deref(), Some(b"value1".as_ref()));

    let copies: Vec<Vec<u8>> = db
        .records()
        .filter_map(|record| record.ok())
        .filter(|(key, _)| key == b"duplicate")
        .map(|(_, value)| value)
        .collect();
    assert_eq!(copies, vec![b"value1".to_vec(), b"value2".to_vec(), b"value3".to_vec()]);
    Ok(())
}

#[test]
fn large_keys_and_values_round_trip() -> Result<(), Error> {
    let temp = NamedTempFile::new().expect("temp file");
    let large_key = vec![b'k'; 10_000];
    let large_value = vec![b'v'; 100_000];

    let mut writer = ConstDbWriter::<_, DjbHash>::create(temp.path())?;
    writer.put(&large_key, &large_value)?;
    writer.put(b"small", b"value")?;

    let db = writer.freeze()?;
    assert_eq!(db.get(&large_key)?.as_deref(), Some(large_value.as_slice()));
    assert_eq!(db.get(b"small")?.as_deref(), Some(b"value".as_ref()));
    Ok(())
}

#[test]
fn a_thousand_entries_are_all_retrievable() -> Result<(), Error> {
    let mut writer = ConstDbWriter::<_, DjbHash>::new(Cursor::new(Vec::new()))?;
    for i in 0..1_000 {
        let key = format!("key_{i:04}");
        let value = format!("value_{i:04}");
        writer.put(key.as_bytes(), value.as_bytes())?;
    }

    let db = writer.freeze()?;
    for i in 0..1_000 {
        let key = format!("key_{i:04}");
        let expected = format!("value_{i:04}");
        assert_eq!(
            db.get(key.as_bytes())?.as_deref(),
            Some(expected.as_bytes()),
            "key {key}"
        );
    }
    Ok(())
}

#[test]
fn empty_store_is_the_bare_header() -> Result<(), Error> {
    let mut writer = ConstDbWriter::<_, DjbHash>::new(Cursor::new(Vec::new()))?;
    writer.finalize()?;
    let data = writer.into_inner()?.into_inner();
    assert_eq!(data.len(), 4096);

    let db = ConstDb::<_, DjbHash>::new(Cursor::new(data))?;
    assert!(db.get(b"any_key")?.is_none());
    assert_eq!(db.records().count(), 0);
    Ok(())
}

#[test]
fn only_empty_keys_and_values() -> Result<(), Error> {
    let mut writer = ConstDbWriter::<_, DjbHash>::new(Cursor::new(Vec::new()))?;
    writer.put(b"", b"")?;
    writer.put(b"", b"value")?;
    writer.put(b"key", b"")?;

    let db = writer.freeze()?;
    assert_eq!(db.get(b"")?, Some(Vec::new()));
    assert_eq!(db.get(b"key")?, Some(Vec::new()));

    let all: Vec<(Vec<u8>, Vec<u8>)> = db.records().collect::<Result<_, _>>()?;
    assert_eq!(all.len(), 3);
    Ok(())
}

#[test]
fn put_after_finalize_fails() -> Result<(), Error> {
    let mut writer = ConstDbWriter::<_, DjbHash>::new(Cursor::new(Vec::new()))?;
    writer.put(b"key", b"value")?;
    writer.finalize()?;

    assert!(matches!(writer.put(b"late", b"entry"), Err(Error::Finalized)));
    Ok(())
}

#[test]
fn into_inner_before_finalize_fails() {
    let mut writer = ConstDbWriter::<_, DjbHash>::new(Cursor::new(Vec::new())).unwrap();
    writer.put(b"key", b"value").unwrap();
    assert!(matches!(writer.into_inner(), Err(Error::NotFinalized)));
}

/// Every one of the 256 subtables can hold entries and serve lookups.
#[test]
fn all_subtables_reachable() -> Result<(), Error> {
    use std::collections::HashSet;

    let mut writer = ConstDbWriter::<_, DjbHash>::new(Cursor::new(Vec::new()))?;
    let mut tables_hit = HashSet::new();
    let mut inserted = Vec::new();

    let mut i = 0u32;
    while tables_hit.len() < 256 {
        let key = format!("key_{i}");
        let mut hasher = DjbHash::default();
        hasher.write(key.as_bytes());
        let table = (hasher.finish() & 0xff) as usize;
        if tables_hit.insert(table) {
            writer.put(key.as_bytes(), b"value")?;
            inserted.push(key);
        }
        i += 1;
        assert!(i < 100_000, "key generation should cover all tables quickly");
    }

    let db = writer.freeze()?;
    for key in &inserted {
        assert_eq!(db.get(key.as_bytes())?.as_deref(), Some(b"value".as_ref()));
    }
    Ok(())
}

/// Offsets are 64-bit: a store bigger than 4 GiB still resolves lookups,
/// including keys whose records and subtables live past the u32 horizon.
#[test]
#[ignore = "writes more than 4 GiB to disk"]
fn store_larger_than_four_gib() -> Result<(), Error> {
    let temp = NamedTempFile::new().expect("temp file");
    let mut writer = ConstDbWriter::<_, DjbHash>::create(temp.path())?;

    let value = vec![0xAB; 1 << 20];
    for i in 0..4_200u32 {
        writer.put(format!("chunk_{i:05}").as_bytes(), &value)?;
    }

    let db = writer.freeze()?;
    assert_eq!(db.get(b"chunk_00000")?.as_deref(), Some(value.as_slice()));
    assert_eq!(db.get(b"chunk_02100")?.as_deref(), Some(value.as_slice()));
    assert_eq!(db.get(b"chunk_04199")?.as_deref(), Some(value.as_slice()));
    assert!(db.get(b"chunk_04200")?.is_none());
    Ok(())
}
