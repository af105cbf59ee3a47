//! User registry
//!
//! A registered user occupies three rows: a duplicate of the `users` roster
//! key, the registration-time row and the public-key row. All three are
//! written (and removed) inside the caller's transaction, so no partial
//! registration is ever observable.

use crate::error::StoreError;
use crate::keys;
use crate::kv::{DupRead, WriteTxn};
use crate::{nonces, records};
use cachet_model::{EntityError, User};

/// Register a validated user carrier. Returns `false` without writing when
/// the hash is already registered.
pub(crate) fn add_user(txn: &mut WriteTxn, user: &User) -> Result<bool, StoreError> {
    if have_user(txn, &user.public_hash)? {
        return Ok(false);
    }
    txn.put(keys::USERS, &user.public_hash)?;
    txn.put(
        &keys::reg_date_key(&user.public_hash),
        &user.registration_time.to_be_bytes(),
    )?;
    txn.put(&keys::public_key_key(&user.public_hash), &user.public_key)?;
    Ok(true)
}

/// Presence of the registration-time row is what "registered" means.
pub(crate) fn have_user(txn: &impl DupRead, public_hash: &[u8]) -> Result<bool, StoreError> {
    Ok(txn.get_first(&keys::reg_date_key(public_hash))?.is_some())
}

pub(crate) fn get_user(txn: &impl DupRead, public_hash: &[u8]) -> Result<User, StoreError> {
    let reg_time = txn
        .get_first(&keys::reg_date_key(public_hash))?
        .ok_or(StoreError::UserNotFound)?;
    let public_key = txn
        .get_first(&keys::public_key_key(public_hash))?
        .ok_or(StoreError::UserNotFound)?;

    let reg_time: [u8; 8] = reg_time
        .try_into()
        .map_err(|bad: Vec<u8>| EntityError::InvalidRegistrationTime(bad.len()))?;
    Ok(User::new(
        public_key,
        public_hash.to_vec(),
        u64::from_be_bytes(reg_time),
    )?)
}

pub(crate) fn get_public_key(
    txn: &impl DupRead,
    public_hash: &[u8],
) -> Result<Vec<u8>, StoreError> {
    if !have_user(txn, public_hash)? {
        return Err(StoreError::UserNotFound);
    }
    txn.get_first(&keys::public_key_key(public_hash))?
        .ok_or(StoreError::UserNotFound)
}

/// Remove a user and everything rooted at them: registration rows, the
/// roster duplicate, their nonce rows, and all record data. Returns `false`
/// when the roster duplicate was not found (nothing was registered under
/// this hash); the row deletions before that point are no-ops in that case.
pub(crate) fn delete_user(txn: &mut WriteTxn, user: &User) -> Result<bool, StoreError> {
    txn.delete_all(&keys::reg_date_key(&user.public_hash))?;
    txn.delete_all(&keys::public_key_key(&user.public_hash))?;

    let found = txn.delete_exact(keys::USERS, &user.public_hash)?;
    if found {
        nonces::delete_for_key(txn, &user.public_key)?;
        records::delete_user_data(txn, user)?;
    }
    Ok(found)
}
