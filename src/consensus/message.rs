use crate::crypto::{self, CanonicalError, Keypair, PublicKey, Signature, Signer};
use serde::{Deserialize, Serialize};

/// The three PBFT phases
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MessagePhase {
    #[serde(rename = "pre-prepare")]
    PrePrepare,
    #[serde(rename = "prepare")]
    Prepare,
    #[serde(rename = "commit")]
    Commit,
}

/// One consensus message on the wire.
///
/// The signature covers the canonical JSON form of the message with the
/// signature field set to the empty string.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConsensusMessage {
    #[serde(rename = "type")]
    pub phase: MessagePhase,
    pub view: u64,
    pub sequence: u64,
    pub digest: String,
    pub validator: String,
    #[serde(default)]
    pub signature: String,
}

impl ConsensusMessage {
    pub fn new(
        phase: MessagePhase,
        view: u64,
        sequence: u64,
        digest: impl Into<String>,
        validator: impl Into<String>,
    ) -> Self {
        Self {
            phase,
            view,
            sequence,
            digest: digest.into(),
            validator: validator.into(),
            signature: String::new(),
        }
    }

    /// The exact bytes the signature covers
    pub fn signing_bytes(&self) -> Result<String, CanonicalError> {
        let mut unsigned = self.clone();
        unsigned.signature = String::new();
        let value = serde_json::to_value(&unsigned)
            .map_err(|e| CanonicalError::Serialize(e.to_string()))?;
        Ok(crypto::to_canonical_string(&value))
    }

    /// Sign in place with this validator's keypair
    pub fn sign(&mut self, keypair: &Keypair) -> Result<(), CanonicalError> {
        let bytes = self.signing_bytes()?;
        self.signature = Signer::sign(keypair, bytes.as_bytes()).to_hex();
        Ok(())
    }

    /// Verify against the claimed validator's public key
    pub fn verify(&self, public_key: &PublicKey) -> bool {
        let Ok(signature) = Signature::from_hex(&self.signature) else {
            return false;
        };
        let Ok(bytes) = self.signing_bytes() else {
            return false;
        };
        Signer::verify(public_key, bytes.as_bytes(), &signature)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_wire_names() {
        let msg = ConsensusMessage::new(MessagePhase::PrePrepare, 0, 1, "d", "v0");
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["type"], "pre-prepare");
    }

    #[test]
    fn test_sign_verify_roundtrip() {
        let kp = Keypair::generate();
        let mut msg = ConsensusMessage::new(MessagePhase::Prepare, 2, 9, "aa".repeat(32), "v1");
        msg.sign(&kp).unwrap();
        assert!(msg.verify(&kp.public_key()));

        let other = Keypair::generate();
        assert!(!msg.verify(&other.public_key()));
    }

    #[test]
    fn test_tampering_breaks_signature() {
        let kp = Keypair::generate();
        let mut msg = ConsensusMessage::new(MessagePhase::Commit, 0, 1, "aa".repeat(32), "v1");
        msg.sign(&kp).unwrap();
        msg.sequence = 2;
        assert!(!msg.verify(&kp.public_key()));
    }
}
