//! Authentication gatekeeper
//!
//! Requests reach the storage engine only after three checks: the signature
//! proves possession of the private key, the nonce timestamp proves the
//! request is fresh, and the nonce ledger proves it is not a replay. The
//! ledger write is atomic with its probe, so two copies of one request race
//! to a single acceptance.

use crate::database::Database;
use cachet_model::{Nonce, SignatureVerifier};
use std::sync::Arc;
use tracing::debug;

/// Why a request was (or was not) let through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthOutcome {
    Accepted,
    BadSignature,
    MalformedNonce,
    /// Nonce timestamp outside the freshness window (either direction).
    StaleNonce,
    /// Nonce already seen for this key.
    Replayed,
}

impl AuthOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, AuthOutcome::Accepted)
    }
}

pub struct Gatekeeper {
    db: Arc<Database>,
    verifier: Box<dyn SignatureVerifier>,
}

impl Gatekeeper {
    pub fn new(db: Arc<Database>, verifier: Box<dyn SignatureVerifier>) -> Self {
        Self { db, verifier }
    }

    /// Authenticate one request. The signature must cover
    /// `message ‖ nonce_token`, binding the nonce to the request body.
    pub fn authenticate(
        &self,
        public_key: &[u8],
        message: &[u8],
        signature: &[u8],
        nonce_token: &[u8],
    ) -> AuthOutcome {
        let mut signed = Vec::with_capacity(message.len() + nonce_token.len());
        signed.extend_from_slice(message);
        signed.extend_from_slice(nonce_token);
        if let Err(e) = self.verifier.verify(public_key, &signed, signature) {
            debug!(error = %e, "rejected request signature");
            return AuthOutcome::BadSignature;
        }

        let nonce = match Nonce::from_token(nonce_token) {
            Ok(nonce) => nonce,
            Err(_) => return AuthOutcome::MalformedNonce,
        };
        if !nonce.is_recent(self.db.clock(), self.db.config().request_freshness) {
            return AuthOutcome::StaleNonce;
        }
        if !self.db.check_and_add_nonce(&nonce, public_key) {
            return AuthOutcome::Replayed;
        }
        AuthOutcome::Accepted
    }
}
