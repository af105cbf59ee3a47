//! Request-signature verification seam
//!
//! The storage engine never sees an unverified request; the gatekeeper
//! checks possession of the private key through this trait before any
//! engine operation runs. `Ed25519Verifier` is the production
//! implementation; tests substitute their own.

use ed25519_dalek::{Signature, Verifier, VerifyingKey};
use sha2::{Digest, Sha256};
use thiserror::Error;

/// Errors from signature verification
#[derive(Error, Debug, PartialEq, Eq)]
pub enum VerifyError {
    #[error("invalid public key length: expected 32 bytes, got {0}")]
    InvalidPublicKeyLength(usize),

    #[error("invalid signature length: expected 64 bytes, got {0}")]
    InvalidSignatureLength(usize),

    #[error("malformed public key")]
    MalformedPublicKey,

    #[error("signature verification failed")]
    BadSignature,
}

/// Verifies that `signature` over `message` was produced by the holder of
/// the private half of `public_key`.
pub trait SignatureVerifier: Send + Sync {
    fn verify(&self, public_key: &[u8], message: &[u8], signature: &[u8])
        -> Result<(), VerifyError>;
}

/// Ed25519 verification (32-byte verifying keys, 64-byte signatures).
#[derive(Debug, Clone, Copy, Default)]
pub struct Ed25519Verifier;

impl SignatureVerifier for Ed25519Verifier {
    fn verify(
        &self,
        public_key: &[u8],
        message: &[u8],
        signature: &[u8],
    ) -> Result<(), VerifyError> {
        let pk_bytes: [u8; 32] = public_key
            .try_into()
            .map_err(|_| VerifyError::InvalidPublicKeyLength(public_key.len()))?;
        let key = VerifyingKey::from_bytes(&pk_bytes)
            .map_err(|_| VerifyError::MalformedPublicKey)?;

        let sig_bytes: [u8; 64] = signature
            .try_into()
            .map_err(|_| VerifyError::InvalidSignatureLength(signature.len()))?;
        let signature = Signature::from_bytes(&sig_bytes);

        key.verify(message, &signature)
            .map_err(|_| VerifyError::BadSignature)
    }
}

/// Conventional public-key → public-hash digest (SHA-256).
///
/// Clients derive the registration hash this way; the server stores whatever
/// hash the client presents and never recomputes it.
pub fn digest_public_key(public_key: &[u8]) -> Vec<u8> {
    Sha256::digest(public_key).to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ed25519_dalek::{Signer, SigningKey};

    fn make_key() -> SigningKey {
        SigningKey::from_bytes(&[42u8; 32])
    }

    #[test]
    fn verify_roundtrip() {
        let key = make_key();
        let message = b"store this blob";
        let signature = key.sign(message);

        let verifier = Ed25519Verifier;
        verifier
            .verify(
                key.verifying_key().as_bytes(),
                message,
                &signature.to_bytes(),
            )
            .unwrap();
    }

    #[test]
    fn tampered_message_fails() {
        let key = make_key();
        let signature = key.sign(b"original");

        let verifier = Ed25519Verifier;
        let err = verifier
            .verify(key.verifying_key().as_bytes(), b"tampered", &signature.to_bytes())
            .unwrap_err();
        assert_eq!(err, VerifyError::BadSignature);
    }

    #[test]
    fn wrong_key_fails() {
        let key = make_key();
        let other = SigningKey::from_bytes(&[7u8; 32]);
        let signature = key.sign(b"message");

        let verifier = Ed25519Verifier;
        let err = verifier
            .verify(other.verifying_key().as_bytes(), b"message", &signature.to_bytes())
            .unwrap_err();
        assert_eq!(err, VerifyError::BadSignature);
    }

    #[test]
    fn bad_lengths_rejected() {
        let verifier = Ed25519Verifier;
        assert_eq!(
            verifier.verify(&[0u8; 31], b"m", &[0u8; 64]).unwrap_err(),
            VerifyError::InvalidPublicKeyLength(31)
        );
        let key = make_key();
        assert_eq!(
            verifier
                .verify(key.verifying_key().as_bytes(), b"m", &[0u8; 63])
                .unwrap_err(),
            VerifyError::InvalidSignatureLength(63)
        );
    }

    #[test]
    fn digest_is_stable_and_sized() {
        let a = digest_public_key(b"key material");
        let b = digest_public_key(b"key material");
        assert_eq!(a, b);
        assert_eq!(a.len(), 32);
        assert_ne!(a, digest_public_key(b"other material"));
    }
}
