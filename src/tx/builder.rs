use crate::crypto::{CanonicalError, Keypair};
use crate::economics::Priority;
use crate::tx::{Transaction, TxPayload, TxType, TX_VERSION};
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;

/// Errors that can occur when building a transaction
#[derive(Error, Debug)]
pub enum BuildError {
    #[error("Missing sender: sender keypair is required")]
    MissingSender,

    #[error("Missing amount: amount is required")]
    MissingAmount,

    #[error("Missing nonce: the sender's next nonce is required")]
    MissingNonce,

    #[error("Missing recipient: {0} requires a recipient")]
    MissingRecipient(&'static str),

    #[error("Signing failed: {0}")]
    Signing(#[from] CanonicalError),
}

/// Builder for signed transactions.
///
/// The nonce is explicit: it must be the sender's current nonce + 1 for
/// the ledger to accept the result, and only the caller knows it.
pub struct TransactionBuilder<'a> {
    sender: Option<&'a Keypair>,
    tx_type: TxType,
    recipient: Option<String>,
    amount: Option<u64>,
    nonce: Option<u64>,
    priority: Priority,
    timestamp: Option<u64>,
    payload: Option<TxPayload>,
}

impl<'a> TransactionBuilder<'a> {
    pub fn new() -> Self {
        Self {
            sender: None,
            tx_type: TxType::Transfer,
            recipient: None,
            amount: None,
            nonce: None,
            priority: Priority::Normal,
            timestamp: None,
            payload: None,
        }
    }

    /// Set the sender (required)
    pub fn sender(mut self, keypair: &'a Keypair) -> Self {
        self.sender = Some(keypair);
        self
    }

    /// Set the transaction type (defaults to transfer)
    pub fn tx_type(mut self, tx_type: TxType) -> Self {
        self.tx_type = tx_type;
        self
    }

    /// Set the recipient public key (hex)
    pub fn recipient(mut self, public_key_hex: impl Into<String>) -> Self {
        self.recipient = Some(public_key_hex.into());
        self
    }

    /// Set the amount (required)
    pub fn amount(mut self, amount: u64) -> Self {
        self.amount = Some(amount);
        self
    }

    /// Set the nonce (required)
    pub fn nonce(mut self, nonce: u64) -> Self {
        self.nonce = Some(nonce);
        self
    }

    /// Set the fee priority (defaults to normal)
    pub fn priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    /// Set the timestamp in milliseconds (auto-generated if not provided)
    pub fn timestamp(mut self, timestamp: u64) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Attach a typed payload
    pub fn payload(mut self, payload: TxPayload) -> Self {
        self.payload = Some(payload);
        self
    }

    /// Build and sign the transaction
    pub fn build(self) -> Result<Transaction, BuildError> {
        let sender = self.sender.ok_or(BuildError::MissingSender)?;
        let amount = self.amount.ok_or(BuildError::MissingAmount)?;
        let nonce = self.nonce.ok_or(BuildError::MissingNonce)?;

        // Transfers and purchases move value to a counterparty.
        if self.recipient.is_none() {
            match self.tx_type {
                TxType::Transfer => return Err(BuildError::MissingRecipient("transfer")),
                TxType::SkillPurchase => {
                    return Err(BuildError::MissingRecipient("skill_purchase"))
                }
                _ => {}
            }
        }

        let timestamp = self.timestamp.unwrap_or_else(now_ms);

        let mut tx = Transaction {
            version: TX_VERSION,
            tx_type: self.tx_type,
            from: sender.public_key_hex(),
            to: self.recipient,
            amount,
            nonce,
            priority: self.priority,
            timestamp,
            data: self.payload,
            signature: String::new(),
        };
        tx.sign(sender)?;
        Ok(tx)
    }
}

impl<'a> Default for TransactionBuilder<'a> {
    fn default() -> Self {
        Self::new()
    }
}

pub(crate) fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
