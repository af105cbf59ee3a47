//! Nonce anti-replay ledger
//!
//! Every accepted request token is recorded as a duplicate of the caller's
//! `users/nonces/<public_key>` key. Acceptance is atomic with the probe, so
//! a token is accepted exactly once no matter how many threads race on it.

use crate::error::StoreError;
use crate::keys;
use crate::kv::{DupRead, WriteTxn};
use cachet_model::Nonce;
use std::time::Duration;

/// Record the nonce if it has not been seen for this key. Returns `true`
/// when the token was fresh to the ledger (request may proceed).
pub(crate) fn check_and_add(
    txn: &mut WriteTxn,
    nonce: &Nonce,
    public_key: &[u8],
) -> Result<bool, StoreError> {
    let key = keys::nonces_key(public_key);
    let token = nonce.to_token();
    if txn.get_exact(&key, &token)? {
        return Ok(false);
    }
    txn.put(&key, &token)?;
    Ok(true)
}

/// Drop every recorded nonce for one public key (user deletion cascade).
pub(crate) fn delete_for_key(txn: &mut WriteTxn, public_key: &[u8]) -> Result<usize, StoreError> {
    txn.delete_all(&keys::nonces_key(public_key))
}

/// Remove tokens whose embedded timestamp is older than `ttl`. Tokens that
/// do not parse are removed as well: they can never validate, so retaining
/// them only grows the ledger. Returns the number of tokens removed.
pub(crate) fn purge_expired(
    txn: &mut WriteTxn,
    now_secs: u64,
    ttl: Duration,
) -> Result<usize, StoreError> {
    let mut removed = 0;
    for key in txn.keys_in_prefix(keys::NONCES_PREFIX)? {
        for token in txn.dup_values(&key)? {
            let expired = match Nonce::from_token(&token) {
                Ok(nonce) => (nonce.since_epoch_secs() as u64) + ttl.as_secs() < now_secs,
                Err(_) => true,
            };
            if expired && txn.delete_exact(&key, &token)? {
                removed += 1;
            }
        }
    }
    Ok(removed)
}
