//! Value carriers for the persistence core
//!
//! All payload-bearing fields are opaque bytes chosen by the client; the
//! server never interprets them. The only structure the core understands is
//! the nonce token, whose leading four bytes carry a unix-seconds timestamp.

use crate::clock::Clock;
use std::time::Duration;
use thiserror::Error;

/// Errors from value-carrier validation
#[derive(Error, Debug, PartialEq, Eq)]
pub enum EntityError {
    #[error("public key must not be empty")]
    EmptyPublicKey,

    #[error("public hash must not be empty")]
    EmptyPublicHash,

    #[error("revision must not be empty")]
    EmptyRevision,

    #[error("invalid nonce token length: expected {expected} bytes, got {got}")]
    InvalidNonceLength { expected: usize, got: usize },

    #[error("invalid registration time: expected 8 bytes, got {0}")]
    InvalidRegistrationTime(usize),
}

/// A registered user, keyed by the hash of their public key.
///
/// Immutable once created; the registry materializes one on read and the
/// caller passes it back to record and deletion operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub public_key: Vec<u8>,
    pub public_hash: Vec<u8>,
    /// Registration time in milliseconds since Unix epoch.
    pub registration_time: u64,
}

impl User {
    pub fn new(
        public_key: Vec<u8>,
        public_hash: Vec<u8>,
        registration_time: u64,
    ) -> Result<Self, EntityError> {
        if public_key.is_empty() {
            return Err(EntityError::EmptyPublicKey);
        }
        if public_hash.is_empty() {
            return Err(EntityError::EmptyPublicHash);
        }
        Ok(Self { public_key, public_hash, registration_time })
    }
}

/// One (revision, value) pair stored under an index.
///
/// Revisions are opaque client-chosen bytes and immutable: a second put with
/// the same revision bytes is rejected by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevValue {
    pub revision: Vec<u8>,
    pub value: Vec<u8>,
}

impl RevValue {
    /// An empty value is legal ciphertext; an empty revision is not a name.
    pub fn new(revision: Vec<u8>, value: Vec<u8>) -> Result<Self, EntityError> {
        if revision.is_empty() {
            return Err(EntityError::EmptyRevision);
        }
        Ok(Self { revision, value })
    }
}

/// Single-use request token: 4-byte big-endian unix-seconds timestamp
/// followed by 4 random bytes.
///
/// The core treats the token as opaque except for the timestamp, which the
/// gatekeeper uses for freshness and the ledger uses for expiry purging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Nonce {
    since_epoch: u32,
    random: [u8; 4],
}

impl Nonce {
    pub const TOKEN_LEN: usize = 8;

    /// Generate a fresh nonce stamped with the clock's current time.
    pub fn generate(clock: &dyn Clock) -> Self {
        Self {
            since_epoch: clock.now_secs() as u32,
            random: rand::random(),
        }
    }

    /// Parse a wire token. Only the length is validated.
    pub fn from_token(token: &[u8]) -> Result<Self, EntityError> {
        if token.len() != Self::TOKEN_LEN {
            return Err(EntityError::InvalidNonceLength {
                expected: Self::TOKEN_LEN,
                got: token.len(),
            });
        }
        let since_epoch = u32::from_be_bytes([token[0], token[1], token[2], token[3]]);
        let random = [token[4], token[5], token[6], token[7]];
        Ok(Self { since_epoch, random })
    }

    pub fn to_token(&self) -> [u8; Self::TOKEN_LEN] {
        let mut token = [0u8; Self::TOKEN_LEN];
        token[..4].copy_from_slice(&self.since_epoch.to_be_bytes());
        token[4..].copy_from_slice(&self.random);
        token
    }

    pub fn since_epoch_secs(&self) -> u32 {
        self.since_epoch
    }

    /// Whether the embedded timestamp lies within the clock's freshness
    /// window (see [`Clock::within_window`]).
    pub fn is_recent(&self, clock: &dyn Clock, window: Duration) -> bool {
        clock.within_window(self.since_epoch as u64, window)
    }
}
