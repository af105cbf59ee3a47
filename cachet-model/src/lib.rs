//! Cachet Model
//!
//! Value carriers and seams shared by the cachet persistence core:
//! - **User**: registered identity (public key + public hash + registration time)
//! - **RevValue**: one (revision, value) pair stored under an index
//! - **Nonce**: single-use request token with an embedded timestamp
//! - **Clock**: time abstraction for testability
//! - **SignatureVerifier**: request-signature seam with an Ed25519 implementation

pub mod clock;
pub mod types;
pub mod verifier;

pub use clock::{Clock, MockClock, SystemClock};
pub use types::{EntityError, Nonce, RevValue, User};
pub use verifier::{digest_public_key, Ed25519Verifier, SignatureVerifier, VerifyError};
