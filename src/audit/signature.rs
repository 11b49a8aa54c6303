//! Signature verification for audit records.
//!
//! The verification scheme is pluggable; the nonce-binding contract is not.
//! Every signature must cover the signer's *current* nonce, and an accepted
//! signature permanently advances that nonce, so a captured signature can
//! never be replayed.

use crate::core::{Error, Hash256, Result};
use ed25519_dalek::{Signature, Verifier, VerifyingKey};
use std::collections::HashMap;

/// Build the message a voter signs for a decision: the decision hash
/// followed by the voter's current nonce, little-endian.
///
/// Signers obtain the nonce from the audit log's read surface before
/// constructing their next signature.
pub fn signing_message(decision_hash: &Hash256, nonce: u64) -> Vec<u8> {
    let mut message = Vec::with_capacity(40);
    message.extend_from_slice(decision_hash.as_bytes());
    message.extend_from_slice(&nonce.to_le_bytes());
    message
}

/// Pluggable signature verification capability.
pub trait SignatureVerifier {
    /// Whether `signature` over `message` verifies for `signer_id`.
    fn verify(&self, signer_id: &str, message: &[u8], signature: &[u8]) -> bool;
}

/// Ed25519-backed verifier over a directory of registered public keys.
#[derive(Clone, Debug, Default)]
pub struct Ed25519Verifier {
    keys: HashMap<String, VerifyingKey>,
}

impl Ed25519Verifier {
    /// Create an empty key directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the public key for a signer identity.
    pub fn register_key(&mut self, signer_id: &str, public_key: &[u8; 32]) -> Result<()> {
        let key = VerifyingKey::from_bytes(public_key)
            .map_err(|_| Error::InvalidSignature(signer_id.to_string()))?;
        self.keys.insert(signer_id.to_string(), key);
        Ok(())
    }
}

impl SignatureVerifier for Ed25519Verifier {
    fn verify(&self, signer_id: &str, message: &[u8], signature: &[u8]) -> bool {
        let Some(key) = self.keys.get(signer_id) else {
            return false;
        };
        let Ok(sig_bytes) = <[u8; 64]>::try_from(signature) else {
            return false;
        };
        let sig = Signature::from_bytes(&sig_bytes);
        key.verify(message, &sig).is_ok()
    }
}
