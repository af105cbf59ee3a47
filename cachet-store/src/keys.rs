//! On-disk key layout
//!
//! The whole namespace lives in one ordered-duplicates table. Keys are the
//! concatenation of fixed tag bytes and caller-supplied byte strings joined
//! by the reserved `/` separator:
//!
//! - `users`                                  → duplicates: public hashes
//! - `users/<public_hash>/date`               → 8-byte big-endian unix ms
//! - `users/<public_hash>/key`                → raw public key bytes
//! - `stores/<public_hash>`                   → duplicates: index bytes
//! - `stores/<public_hash>/<index>`           → duplicates: revision bytes
//! - `stores/<public_hash>/<index>/<revision>`→ value bytes
//! - `users/nonces/<public_key>`              → duplicates: nonce tokens
//!
//! No escaping is applied to embedded bytes; uniqueness relies on the
//! position and length of the fixed components. This layout is part of the
//! external format and must not change.

/// Reserved separator byte between key components.
pub(crate) const SEPARATOR: &[u8] = b"/";

/// Root of the user roster (duplicate values are public hashes).
pub(crate) const USERS: &[u8] = b"users";

/// Prefix of every per-user record key.
const STORES: &[u8] = b"stores/";

/// Prefix of every nonce key; also the purge scan range.
pub(crate) const NONCES_PREFIX: &[u8] = b"users/nonces/";

const DATE: &[u8] = b"date";
const KEY: &[u8] = b"key";

pub(crate) fn concat(parts: &[&[u8]]) -> Vec<u8> {
    let len = parts.iter().map(|p| p.len()).sum();
    let mut out = Vec::with_capacity(len);
    for part in parts {
        out.extend_from_slice(part);
    }
    out
}

/// `users/<public_hash>/date`
pub(crate) fn reg_date_key(public_hash: &[u8]) -> Vec<u8> {
    concat(&[USERS, SEPARATOR, public_hash, SEPARATOR, DATE])
}

/// `users/<public_hash>/key`
pub(crate) fn public_key_key(public_hash: &[u8]) -> Vec<u8> {
    concat(&[USERS, SEPARATOR, public_hash, SEPARATOR, KEY])
}

/// `stores/<public_hash>` — duplicate values enumerate the user's indices.
pub(crate) fn stores_key(public_hash: &[u8]) -> Vec<u8> {
    concat(&[STORES, public_hash])
}

/// `stores/<public_hash>/<index>` — duplicate values enumerate revisions.
pub(crate) fn lookup_key(public_hash: &[u8], index: &[u8]) -> Vec<u8> {
    concat(&[STORES, public_hash, SEPARATOR, index])
}

/// `stores/<public_hash>/<index>/<revision>` — the value blob.
pub(crate) fn value_key(public_hash: &[u8], index: &[u8], revision: &[u8]) -> Vec<u8> {
    concat(&[STORES, public_hash, SEPARATOR, index, SEPARATOR, revision])
}

/// `users/nonces/<public_key>` — duplicate values are seen nonce tokens.
pub(crate) fn nonces_key(public_key: &[u8]) -> Vec<u8> {
    concat(&[NONCES_PREFIX, public_key])
}

#[cfg(test)]
mod tests {
    use super::*;

    const PH: &[u8] = &[0xAA, 0xBB];

    #[test]
    fn exact_user_layouts() {
        assert_eq!(reg_date_key(PH), b"users/\xAA\xBB/date");
        assert_eq!(public_key_key(PH), b"users/\xAA\xBB/key");
    }

    #[test]
    fn exact_record_layouts() {
        assert_eq!(stores_key(PH), b"stores/\xAA\xBB");
        assert_eq!(lookup_key(PH, &[0x10]), b"stores/\xAA\xBB/\x10");
        assert_eq!(value_key(PH, &[0x10], &[0x20]), b"stores/\xAA\xBB/\x10/\x20");
    }

    #[test]
    fn exact_nonce_layout() {
        assert_eq!(nonces_key(&[0x01, 0x02]), b"users/nonces/\x01\x02");
        assert!(nonces_key(&[0x01]).starts_with(NONCES_PREFIX));
    }

    #[test]
    fn value_key_extends_lookup_key() {
        let lookup = lookup_key(PH, &[0x10]);
        let value = value_key(PH, &[0x10], &[0x20, 0x21]);
        assert!(value.starts_with(&lookup));
        assert_eq!(&value[lookup.len()..], b"/\x20\x21");
    }

    #[test]
    fn separator_is_not_escaped() {
        // Embedded 0x2F bytes pass through untouched; clients are expected
        // to use digest-derived indices that make collisions improbable.
        assert_eq!(lookup_key(PH, b"a/b"), b"stores/\xAA\xBB/a/b");
    }
}
