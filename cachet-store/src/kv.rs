//! Ordered-duplicates byte store
//!
//! One redb multimap table holds the entire namespace. A multimap key's
//! values form a lexicographically sorted set, which gives us the
//! sorted-duplicates behavior the key layout depends on: a parent key's
//! duplicates enumerate its children without any prefix scan.
//!
//! `WriteTxn`/`ReadTxn` expose the primitives the engine needs and nothing
//! else. Each primitive opens the table for the duration of the call, so
//! table handles (and their iterators) can never outlive the transaction
//! that owns them. Dropping a `WriteTxn` without committing aborts it.

use crate::error::StoreError;
use redb::{Database, MultimapTableDefinition, ReadableMultimapTable};
use std::path::Path;

const TABLE: MultimapTableDefinition<&[u8], &[u8]> = MultimapTableDefinition::new("cachet");

/// Read-side primitives, shared by read-only and read-write transactions.
pub(crate) trait DupRead {
    /// First duplicate under `key` in sort order (the sole value for
    /// single-valued keys). `None` when the key is absent.
    fn get_first(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError>;

    /// Probe for one specific duplicate.
    fn get_exact(&self, key: &[u8], value: &[u8]) -> Result<bool, StoreError>;

    /// All duplicates under `key`, in sort order.
    fn dup_values(&self, key: &[u8]) -> Result<Vec<Vec<u8>>, StoreError>;

    /// All keys beginning with `prefix`, in sort order.
    fn keys_in_prefix(&self, prefix: &[u8]) -> Result<Vec<Vec<u8>>, StoreError>;
}

pub(crate) struct DupStore {
    db: Database,
}

impl DupStore {
    pub(crate) fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let db = Database::create(path)?;
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_multimap_table(TABLE)?;
        }
        write_txn.commit()?;
        Ok(Self { db })
    }

    pub(crate) fn begin_write(&self) -> Result<WriteTxn, StoreError> {
        Ok(WriteTxn { txn: self.db.begin_write()? })
    }

    pub(crate) fn begin_read(&self) -> Result<ReadTxn, StoreError> {
        Ok(ReadTxn { txn: self.db.begin_read()? })
    }
}

pub(crate) struct WriteTxn {
    txn: redb::WriteTransaction,
}

impl WriteTxn {
    /// Add `value` to `key`'s duplicate set. Re-inserting an existing
    /// duplicate is a no-op success.
    pub(crate) fn put(&mut self, key: &[u8], value: &[u8]) -> Result<(), StoreError> {
        let mut table = self.txn.open_multimap_table(TABLE)?;
        table.insert(key, value)?;
        Ok(())
    }

    /// Remove `key` and all its duplicates; returns how many were removed.
    pub(crate) fn delete_all(&mut self, key: &[u8]) -> Result<usize, StoreError> {
        let mut table = self.txn.open_multimap_table(TABLE)?;
        let mut count = 0;
        for entry in table.remove_all(key)? {
            entry?;
            count += 1;
        }
        Ok(count)
    }

    /// Remove one specific duplicate; returns whether it was present.
    pub(crate) fn delete_exact(&mut self, key: &[u8], value: &[u8]) -> Result<bool, StoreError> {
        let mut table = self.txn.open_multimap_table(TABLE)?;
        Ok(table.remove(key, value)?)
    }

    pub(crate) fn commit(self) -> Result<(), StoreError> {
        self.txn.commit()?;
        Ok(())
    }

    pub(crate) fn abort(self) -> Result<(), StoreError> {
        self.txn.abort()?;
        Ok(())
    }
}

impl DupRead for WriteTxn {
    fn get_first(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        first_value(&self.txn.open_multimap_table(TABLE)?, key)
    }

    fn get_exact(&self, key: &[u8], value: &[u8]) -> Result<bool, StoreError> {
        contains_value(&self.txn.open_multimap_table(TABLE)?, key, value)
    }

    fn dup_values(&self, key: &[u8]) -> Result<Vec<Vec<u8>>, StoreError> {
        all_values(&self.txn.open_multimap_table(TABLE)?, key)
    }

    fn keys_in_prefix(&self, prefix: &[u8]) -> Result<Vec<Vec<u8>>, StoreError> {
        keys_with_prefix(&self.txn.open_multimap_table(TABLE)?, prefix)
    }
}

pub(crate) struct ReadTxn {
    txn: redb::ReadTransaction,
}

impl DupRead for ReadTxn {
    fn get_first(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        first_value(&self.txn.open_multimap_table(TABLE)?, key)
    }

    fn get_exact(&self, key: &[u8], value: &[u8]) -> Result<bool, StoreError> {
        contains_value(&self.txn.open_multimap_table(TABLE)?, key, value)
    }

    fn dup_values(&self, key: &[u8]) -> Result<Vec<Vec<u8>>, StoreError> {
        all_values(&self.txn.open_multimap_table(TABLE)?, key)
    }

    fn keys_in_prefix(&self, prefix: &[u8]) -> Result<Vec<Vec<u8>>, StoreError> {
        keys_with_prefix(&self.txn.open_multimap_table(TABLE)?, prefix)
    }
}

fn first_value<T>(table: &T, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError>
where
    T: ReadableMultimapTable<&'static [u8], &'static [u8]>,
{
    let mut values = table.get(key)?;
    match values.next() {
        Some(value) => Ok(Some(value?.value().to_vec())),
        None => Ok(None),
    }
}

fn contains_value<T>(table: &T, key: &[u8], value: &[u8]) -> Result<bool, StoreError>
where
    T: ReadableMultimapTable<&'static [u8], &'static [u8]>,
{
    // Duplicates are sorted, so the walk can stop at the first overshoot.
    for entry in table.get(key)? {
        let guard = entry?;
        match guard.value().cmp(value) {
            std::cmp::Ordering::Equal => return Ok(true),
            std::cmp::Ordering::Greater => return Ok(false),
            std::cmp::Ordering::Less => {}
        }
    }
    Ok(false)
}

fn all_values<T>(table: &T, key: &[u8]) -> Result<Vec<Vec<u8>>, StoreError>
where
    T: ReadableMultimapTable<&'static [u8], &'static [u8]>,
{
    let mut out = Vec::new();
    for entry in table.get(key)? {
        out.push(entry?.value().to_vec());
    }
    Ok(out)
}

fn keys_with_prefix<T>(table: &T, prefix: &[u8]) -> Result<Vec<Vec<u8>>, StoreError>
where
    T: ReadableMultimapTable<&'static [u8], &'static [u8]>,
{
    let mut out = Vec::new();
    for entry in table.range(prefix..)? {
        let (key, _values) = entry?;
        if !key.value().starts_with(prefix) {
            break;
        }
        out.push(key.value().to_vec());
    }
    Ok(out)
}
