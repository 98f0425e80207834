use crate::crypto::{self, CanonicalError, Keypair, PublicKey, Signature, Signer};
use crate::economics::Priority;
use serde::{Deserialize, Serialize};

/// Current transaction record version
pub const TX_VERSION: u32 = 1;

/// Largest amount the system accepts; beyond this, integer arithmetic is
/// no longer portable across implementations.
pub const MAX_SAFE_AMOUNT: u64 = 9_007_199_254_740_991;

/// The kinds of state transition a transaction can request
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TxType {
    Transfer,
    Mint,
    Burn,
    Stake,
    SkillCreate,
    SkillPurchase,
}

/// Payload attached to a skill purchase, binding the value transfer to a
/// specific content-addressed artifact
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillPurchaseData {
    pub skill_id: String,
    pub manifest_hash: String,
    pub creator: String,
    pub price: u64,
    pub created_at: u64,
}

/// Payload carried by governance-related transactions
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GovernanceData {
    pub proposal_id: String,
    pub action: String,
}

/// Typed transaction payload
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TxPayload {
    Skill(SkillPurchaseData),
    Governance(GovernanceData),
}

/// A versioned, signed transaction.
///
/// The digest (and therefore the signature) covers every field except
/// `signature` itself, rendered in canonical JSON. Field names here are
/// the wire names.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub version: u32,
    #[serde(rename = "type")]
    pub tx_type: TxType,
    pub from: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
    pub amount: u64,
    pub nonce: u64,
    #[serde(default, skip_serializing_if = "Priority::is_normal")]
    pub priority: Priority,
    pub timestamp: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<TxPayload>,
    #[serde(default)]
    pub signature: String,
}

impl Transaction {
    /// Compute the canonical digest: SHA-256 over the canonical JSON form
    /// with the signature field excluded. This is the transaction's stable
    /// identity everywhere (ledger log, consensus, purchases).
    pub fn digest(&self) -> Result<String, CanonicalError> {
        let mut value = serde_json::to_value(self)
            .map_err(|e| CanonicalError::Serialize(e.to_string()))?;
        if let Some(obj) = value.as_object_mut() {
            obj.remove("signature");
        }
        Ok(hex::encode(crypto::digest_value(&value)))
    }

    /// Sign in place with the sender's keypair
    pub fn sign(&mut self, keypair: &Keypair) -> Result<(), CanonicalError> {
        let digest = self.digest()?;
        self.signature = Signer::sign_digest(keypair, &digest).to_hex();
        Ok(())
    }

    /// Verify the signature against the `from` public key.
    ///
    /// Returns false for malformed keys or signatures as well as for a
    /// genuine verification failure.
    pub fn verify_signature(&self) -> bool {
        let Ok(public_key) = PublicKey::from_hex(&self.from) else {
            return false;
        };
        let Ok(signature) = Signature::from_hex(&self.signature) else {
            return false;
        };
        let Ok(digest) = self.digest() else {
            return false;
        };
        Signer::verify_digest(&public_key, &digest, &signature)
    }
}
