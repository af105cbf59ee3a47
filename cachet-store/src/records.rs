//! Per-user multi-revision record store
//!
//! Three-level layout over the ordered-duplicates table:
//! `stores/<hash>` lists a user's indices as duplicates,
//! `stores/<hash>/<index>` lists an index's revisions as duplicates,
//! `stores/<hash>/<index>/<revision>` holds the value blob.
//!
//! Revisions are immutable: a put with revision bytes that already exist
//! under the index is rejected, never overwritten. Enumeration order is the
//! table's sort order, not insertion order.

use crate::error::StoreError;
use crate::keys;
use crate::kv::{DupRead, WriteTxn};
use cachet_model::{RevValue, User};
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PutOutcome {
    Stored,
    /// The revision already exists under this index; nothing was stored.
    /// The caller must abort: the index duplicate may have been inserted
    /// opportunistically before the collision was discovered.
    DuplicateRevision,
}

pub(crate) fn put(
    txn: &mut WriteTxn,
    user: &User,
    index: &[u8],
    rv: &RevValue,
) -> Result<PutOutcome, StoreError> {
    let stores = keys::stores_key(&user.public_hash);
    if !txn.get_exact(&stores, index)? {
        txn.put(&stores, index)?;
    }

    let lookup = keys::lookup_key(&user.public_hash, index);
    if txn.get_exact(&lookup, &rv.revision)? {
        return Ok(PutOutcome::DuplicateRevision);
    }
    txn.put(&lookup, &rv.revision)?;
    txn.put(
        &keys::value_key(&user.public_hash, index, &rv.revision),
        &rv.value,
    )?;
    Ok(PutOutcome::Stored)
}

/// All (revision, value) pairs under an index, or `None` when the index
/// itself is absent. A revision whose value row is missing is skipped:
/// readers absorb that corruption instead of failing the whole call.
pub(crate) fn get_record(
    txn: &impl DupRead,
    user: &User,
    index: &[u8],
) -> Result<Option<Vec<RevValue>>, StoreError> {
    let stores = keys::stores_key(&user.public_hash);
    if !txn.get_exact(&stores, index)? {
        return Ok(None);
    }

    let lookup = keys::lookup_key(&user.public_hash, index);
    let mut pairs = Vec::new();
    for revision in txn.dup_values(&lookup)? {
        match txn.get_first(&keys::value_key(&user.public_hash, index, &revision))? {
            Some(value) => pairs.push(RevValue { revision, value }),
            None => warn!(
                user = %hex_prefix(&user.public_hash),
                "skipping revision with no value row"
            ),
        }
    }
    Ok(Some(pairs))
}

pub(crate) fn get_revision(
    txn: &impl DupRead,
    user: &User,
    index: &[u8],
    revision: &[u8],
) -> Result<Option<RevValue>, StoreError> {
    let value = txn.get_first(&keys::value_key(&user.public_hash, index, revision))?;
    Ok(value.map(|value| RevValue { revision: revision.to_vec(), value }))
}

pub(crate) fn get_indices(txn: &impl DupRead, user: &User) -> Result<Vec<Vec<u8>>, StoreError> {
    txn.dup_values(&keys::stores_key(&user.public_hash))
}

/// Revision bytes under an index, or `None` when there are none.
pub(crate) fn get_revisions(
    txn: &impl DupRead,
    user: &User,
    index: &[u8],
) -> Result<Option<Vec<Vec<u8>>>, StoreError> {
    let revisions = txn.dup_values(&keys::lookup_key(&user.public_hash, index))?;
    if revisions.is_empty() {
        return Ok(None);
    }
    Ok(Some(revisions))
}

/// Remove an index and every revision under it. Returns `true` when
/// anything at all was removed.
pub(crate) fn delete_record(
    txn: &mut WriteTxn,
    user: &User,
    index: &[u8],
) -> Result<bool, StoreError> {
    let removed_index = txn.delete_exact(&keys::stores_key(&user.public_hash), index)?;
    let removed_revisions = delete_revisions(txn, user, index)?;
    Ok(removed_index || removed_revisions)
}

fn delete_revisions(txn: &mut WriteTxn, user: &User, index: &[u8]) -> Result<bool, StoreError> {
    let lookup = keys::lookup_key(&user.public_hash, index);
    let mut did_work = false;
    for revision in txn.dup_values(&lookup)? {
        let value_removed =
            txn.delete_all(&keys::value_key(&user.public_hash, index, &revision))? > 0;
        let revision_removed = txn.delete_exact(&lookup, &revision)?;
        did_work |= value_removed || revision_removed;
    }
    Ok(did_work)
}

/// Cascade helper for user deletion: walk the index set and remove every
/// revision, value and index duplicate under the user.
pub(crate) fn delete_user_data(txn: &mut WriteTxn, user: &User) -> Result<(), StoreError> {
    let stores = keys::stores_key(&user.public_hash);
    for index in txn.dup_values(&stores)? {
        delete_revisions(txn, user, &index)?;
        txn.delete_exact(&stores, &index)?;
    }
    Ok(())
}

fn hex_prefix(bytes: &[u8]) -> String {
    hex::encode(&bytes[..bytes.len().min(4)])
}
