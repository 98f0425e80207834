// Crypto module - Ed25519 keypair management and canonical hashing

mod canonical;
mod keypair;
mod signer;

pub use canonical::{sha256_hex, to_canonical_string, CanonicalError};
pub use keypair::{KeyError, Keypair, PublicKey, SecretKey};
pub use signer::{Signature, SignatureError, Signer};

pub use canonical::{digest, digest_hex, digest_value};
