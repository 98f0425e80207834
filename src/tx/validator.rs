use crate::crypto::{PublicKey, Signature};
use crate::tx::{Transaction, TxType, MAX_SAFE_AMOUNT, TX_VERSION};
use thiserror::Error;

/// Errors that can occur when validating a transaction's structure
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Unsupported version: expected {TX_VERSION}, got {0}")]
    UnsupportedVersion(u32),

    #[error("Invalid sender key: {0}")]
    InvalidSender(String),

    #[error("Invalid recipient key: {0}")]
    InvalidRecipient(String),

    #[error("Invalid signature: signature does not match the transaction content")]
    InvalidSignature,

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
}

/// Structural and cryptographic validation, independent of ledger state.
///
/// Nonce, balance, and recipient-existence checks belong to the ledger;
/// this layer answers "is this a well-formed, honestly signed record".
pub struct TxValidator;

impl TxValidator {
    pub fn validate(tx: &Transaction) -> Result<(), ValidationError> {
        if tx.version != TX_VERSION {
            return Err(ValidationError::UnsupportedVersion(tx.version));
        }

        PublicKey::from_hex(&tx.from)
            .map_err(|e| ValidationError::InvalidSender(e.to_string()))?;

        if let Some(to) = &tx.to {
            PublicKey::from_hex(to)
                .map_err(|e| ValidationError::InvalidRecipient(e.to_string()))?;
        }

        if tx.amount > MAX_SAFE_AMOUNT {
            return Err(ValidationError::InvalidAmount(format!(
                "{} exceeds the safe integer bound",
                tx.amount
            )));
        }

        if tx.tx_type == TxType::Transfer && tx.amount == 0 {
            return Err(ValidationError::InvalidAmount(
                "transfer amount cannot be zero".to_string(),
            ));
        }

        Signature::from_hex(&tx.signature).map_err(|_| ValidationError::InvalidSignature)?;
        if !tx.verify_signature() {
            return Err(ValidationError::InvalidSignature);
        }

        Ok(())
    }
}
