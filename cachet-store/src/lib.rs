//! Cachet Store
//!
//! Server-side persistence core of a zero-knowledge, end-to-end encrypted
//! key-value datastore:
//! - **Database**: facade composing the user registry, record store and
//!   nonce ledger; one serializable transaction per operation; one live
//!   instance per data directory
//! - **Gatekeeper**: signature + freshness + anti-replay checks in front of
//!   the engine
//! - **Config**: request-freshness and nonce-retention windows
//!
//! Clients store opaque ciphertext at opaque indices; each index holds a set
//! of immutable client-named revisions. The server never merges and never
//! reads content — it enforces authentication, prevents replay, and keeps
//! the data durable.

pub mod auth;
pub mod config;
pub mod database;
pub mod error;

mod keys;
mod kv;
mod nonces;
mod records;
mod registry;

pub use auth::{AuthOutcome, Gatekeeper};
pub use config::{Config, ConfigError, DEFAULT_REQUEST_FRESHNESS};
pub use database::Database;
pub use error::StoreError;

pub use cachet_model::{
    digest_public_key, Clock, Ed25519Verifier, MockClock, Nonce, RevValue, SignatureVerifier,
    SystemClock, User,
};
