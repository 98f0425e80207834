use crate::crypto::{Keypair, PublicKey};
use ed25519_dalek::{Signature as DalekSignature, Signer as DalekSigner, Verifier};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SignatureError {
    #[error("Invalid signature length: expected 64, got {0}")]
    InvalidLength(usize),

    #[error("Invalid hex encoding: {0}")]
    InvalidHex(String),
}

/// Ed25519 signature (64 bytes, lowercase hex externally)
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Signature {
    inner: DalekSignature,
    bytes: [u8; 64],
}

impl Signature {
    /// Get the raw bytes of the signature
    pub fn as_bytes(&self) -> &[u8; 64] {
        &self.bytes
    }

    /// Lowercase hex form (128 characters)
    pub fn to_hex(&self) -> String {
        hex::encode(self.bytes)
    }

    /// Create a signature from raw bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SignatureError> {
        if bytes.len() != 64 {
            return Err(SignatureError::InvalidLength(bytes.len()));
        }

        let bytes_array: [u8; 64] = bytes
            .try_into()
            .map_err(|_| SignatureError::InvalidLength(bytes.len()))?;

        let inner = DalekSignature::from_bytes(&bytes_array);
        Ok(Self {
            inner,
            bytes: bytes_array,
        })
    }

    /// Parse a signature from its hex form
    pub fn from_hex(s: &str) -> Result<Self, SignatureError> {
        let bytes = hex::decode(s).map_err(|e| SignatureError::InvalidHex(e.to_string()))?;
        Self::from_bytes(&bytes)
    }

    fn from_inner(inner: DalekSignature) -> Self {
        let bytes = inner.to_bytes();
        Self { inner, bytes }
    }
}

/// Signing and verification operations
pub struct Signer;

impl Signer {
    /// Sign a raw message with a keypair
    pub fn sign(keypair: &Keypair, message: &[u8]) -> Signature {
        let sig = keypair.signing_key().sign(message);
        Signature::from_inner(sig)
    }

    /// Verify a signature against a public key and raw message
    pub fn verify(public_key: &PublicKey, message: &[u8], signature: &Signature) -> bool {
        public_key
            .inner()
            .verify(message, &signature.inner)
            .is_ok()
    }

    /// Sign a transaction digest.
    ///
    /// The message is the hex-encoded digest as UTF-8 bytes, not the raw
    /// 32 bytes. Verification must follow the same convention to stay
    /// bit-compatible across implementations.
    pub fn sign_digest(keypair: &Keypair, digest_hex: &str) -> Signature {
        Self::sign(keypair, digest_hex.as_bytes())
    }

    /// Verify a signature produced by [`Signer::sign_digest`]
    pub fn verify_digest(public_key: &PublicKey, digest_hex: &str, signature: &Signature) -> bool {
        Self::verify(public_key, digest_hex.as_bytes(), signature)
    }
}
