// Ledger engine - the authoritative state-transition function
//
// Every check runs before any mutation; a failed transaction leaves the
// state untouched. The full state is persisted after each mutation.

use crate::crypto::CanonicalError;
use crate::economics::{check_transaction, EconomicsError, FeeSchedule, STAKE_LOCK_MS};
use crate::ledger::{Account, LedgerState, StoredTransaction};
use crate::storage::{Store, StoreError};
use crate::tx::{Transaction, TxType};
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;
use tracing::{debug, warn};

/// Errors from ledger operations. `code()` gives the stable external code.
#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Account already exists: {0}")]
    AccountExists(String),

    #[error("Unknown sender: {0}")]
    UnknownSender(String),

    #[error("Unknown recipient: {0}")]
    UnknownRecipient(String),

    #[error("Missing recipient: {0} requires one")]
    MissingRecipient(&'static str),

    #[error("Invalid nonce: expected {expected}, got {got}")]
    InvalidNonce { expected: u64, got: u64 },

    #[error("Invalid signature: signature does not verify against the sender")]
    InvalidSignature,

    #[error("Duplicate transaction: {0} already applied")]
    DuplicateTransaction(String),

    #[error("Balance would overflow")]
    BalanceOverflow,

    #[error(transparent)]
    Economics(#[from] EconomicsError),

    #[error("Encoding failed: {0}")]
    Encoding(#[from] CanonicalError),

    #[error("Storage error: {0}")]
    Storage(#[from] StoreError),
}

impl LedgerError {
    /// Stable error code for external surfaces
    pub fn code(&self) -> &'static str {
        match self {
            LedgerError::AccountExists(_) => "ACCOUNT_EXISTS",
            LedgerError::UnknownSender(_) => "UNKNOWN_SENDER",
            LedgerError::UnknownRecipient(_) | LedgerError::MissingRecipient(_) => {
                "UNKNOWN_RECIPIENT"
            }
            LedgerError::InvalidNonce { .. } => "INVALID_NONCE",
            LedgerError::InvalidSignature => "INVALID_SIGNATURE",
            LedgerError::DuplicateTransaction(_) => "DUPLICATE_TRANSACTION",
            LedgerError::BalanceOverflow => "INVALID_AMOUNT",
            LedgerError::Economics(EconomicsError::InvalidAmount(_)) => "INVALID_AMOUNT",
            LedgerError::Economics(EconomicsError::InsufficientBalance { .. }) => {
                "INSUFFICIENT_BALANCE"
            }
            LedgerError::Encoding(_) => "ENCODING_FAILED",
            LedgerError::Storage(_) => "STORAGE_FAILED",
        }
    }
}

/// The ledger engine: exclusive owner of account records and the applied
/// transaction log.
pub struct Ledger {
    state: LedgerState,
    fees: FeeSchedule,
    store: Option<Store>,
}

impl Ledger {
    /// In-memory ledger (no persistence)
    pub fn new(fees: FeeSchedule) -> Self {
        Self {
            state: LedgerState::new(),
            fees,
            store: None,
        }
    }

    /// Ledger backed by a durable store
    pub fn with_store(fees: FeeSchedule, store: Store) -> Self {
        Self {
            state: LedgerState::new(),
            fees,
            store: Some(store),
        }
    }

    /// Load persisted state. A corrupt file is fatal here; a missing one
    /// means a fresh ledger.
    pub fn initialize(&mut self) -> Result<(), LedgerError> {
        if let Some(store) = &self.store {
            if let Some(state) = store.load_ledger()? {
                self.state = state;
            }
        }
        Ok(())
    }

    pub fn state(&self) -> &LedgerState {
        &self.state
    }

    pub fn fees(&self) -> &FeeSchedule {
        &self.fees
    }

    /// Create an account with an initial balance; fails if present
    pub fn create_account(
        &mut self,
        public_key: &str,
        initial_balance: u64,
    ) -> Result<(), LedgerError> {
        if self.state.accounts.contains_key(public_key) {
            return Err(LedgerError::AccountExists(public_key.to_string()));
        }
        self.state
            .accounts
            .insert(public_key.to_string(), Account::new(initial_balance, now_ms()));
        self.persist();
        Ok(())
    }

    pub fn get_account(&self, public_key: &str) -> Option<&Account> {
        self.state.accounts.get(public_key)
    }

    /// Balance query; absent accounts read as 0
    pub fn get_balance(&self, public_key: &str) -> u64 {
        self.state
            .accounts
            .get(public_key)
            .map(|a| a.balance)
            .unwrap_or(0)
    }

    /// Apply a signed transaction.
    ///
    /// Check order: duplicate digest, sender existence, nonce, signature,
    /// economic constraints, then type-specific rules. The first failure
    /// wins and nothing mutates. Returns the transaction digest.
    pub fn apply_transaction(&mut self, tx: &Transaction) -> Result<String, LedgerError> {
        let digest = tx.digest()?;

        if self.state.transactions.contains_key(&digest) {
            return Err(LedgerError::DuplicateTransaction(digest));
        }

        let sender = self
            .state
            .accounts
            .get(&tx.from)
            .ok_or_else(|| LedgerError::UnknownSender(tx.from.clone()))?;

        let expected = sender.next_nonce();
        if tx.nonce != expected {
            return Err(LedgerError::InvalidNonce {
                expected,
                got: tx.nonce,
            });
        }

        if !tx.verify_signature() {
            return Err(LedgerError::InvalidSignature);
        }

        let fee = self.fee_for(tx);
        check_transaction(tx, sender.spendable(), fee)?;

        // Type-specific prechecks, still without mutating anything.
        match tx.tx_type {
            TxType::Transfer | TxType::SkillPurchase => {
                let label = if tx.tx_type == TxType::Transfer {
                    "transfer"
                } else {
                    "skill_purchase"
                };
                let to = tx
                    .to
                    .as_deref()
                    .ok_or(LedgerError::MissingRecipient(label))?;
                let recipient = self
                    .state
                    .accounts
                    .get(to)
                    .ok_or_else(|| LedgerError::UnknownRecipient(to.to_string()))?;
                if to != tx.from {
                    recipient
                        .balance
                        .checked_add(tx.amount)
                        .ok_or(LedgerError::BalanceOverflow)?;
                }
            }
            TxType::Mint => {
                let to = tx.to.as_deref().unwrap_or(&tx.from);
                let recipient = self
                    .state
                    .accounts
                    .get(to)
                    .ok_or_else(|| LedgerError::UnknownRecipient(to.to_string()))?;
                recipient
                    .balance
                    .checked_add(tx.amount)
                    .ok_or(LedgerError::BalanceOverflow)?;
            }
            TxType::Stake => {
                let sender = &self.state.accounts[&tx.from];
                sender
                    .stake_locked
                    .checked_add(tx.amount)
                    .ok_or(LedgerError::BalanceOverflow)?;
            }
            TxType::Burn | TxType::SkillCreate => {}
        }

        let applied_at = now_ms();
        self.mutate(tx, fee, applied_at);
        self.record(tx, &digest, applied_at);

        debug!(
            digest = %digest,
            tx_type = ?tx.tx_type,
            amount = tx.amount,
            "applied transaction"
        );
        self.persist();
        Ok(digest)
    }

    // All prechecks have passed; move the value.
    fn mutate(&mut self, tx: &Transaction, fee: u64, applied_at: u64) {
        match tx.tx_type {
            TxType::Transfer | TxType::SkillPurchase => {
                let to = tx.to.clone().expect("checked above");
                {
                    let sender = self.state.accounts.get_mut(&tx.from).expect("checked");
                    sender.balance -= tx.amount + fee;
                }
                let recipient = self.state.accounts.get_mut(&to).expect("checked");
                recipient.balance += tx.amount;
                recipient.last_active = applied_at;
            }
            TxType::Mint => {
                let to = tx.to.clone().unwrap_or_else(|| tx.from.clone());
                let recipient = self.state.accounts.get_mut(&to).expect("checked");
                recipient.balance += tx.amount;
                recipient.last_active = applied_at;
            }
            TxType::Burn => {
                let sender = self.state.accounts.get_mut(&tx.from).expect("checked");
                sender.balance -= tx.amount;
            }
            TxType::Stake => {
                let sender = self.state.accounts.get_mut(&tx.from).expect("checked");
                sender.balance -= tx.amount;
                sender.stake_locked += tx.amount;
                sender.stake_unlocked_at = Some(tx.timestamp + STAKE_LOCK_MS);
            }
            TxType::SkillCreate => {}
        }

        let sender = self.state.accounts.get_mut(&tx.from).expect("checked");
        sender.nonce += 1;
        sender.last_active = applied_at;
    }

    fn record(&mut self, tx: &Transaction, digest: &str, applied_at: u64) {
        let stored = StoredTransaction {
            digest: digest.to_string(),
            transaction: tx.clone(),
            block_height: self.state.block_height,
            applied_at,
        };
        self.state.transactions.insert(digest.to_string(), stored);

        self.state
            .account_transactions
            .entry(tx.from.clone())
            .or_default()
            .push(digest.to_string());

        if let Some(to) = &tx.to {
            if to != &tx.from {
                self.state
                    .account_transactions
                    .entry(to.clone())
                    .or_default()
                    .push(digest.to_string());
            }
        }
    }

    /// Newest-first slice of an account's transactions
    pub fn get_transaction_history(&self, public_key: &str, limit: usize) -> Vec<&StoredTransaction> {
        // Walk the index newest-insertion-first so equal timestamps keep
        // insertion order under the stable sort.
        let mut entries: Vec<&StoredTransaction> = self
            .state
            .account_transactions
            .get(public_key)
            .map(|digests| {
                digests
                    .iter()
                    .rev()
                    .filter_map(|d| self.state.transactions.get(d))
                    .collect()
            })
            .unwrap_or_default();
        entries.sort_by(|a, b| b.applied_at.cmp(&a.applied_at));
        entries.truncate(limit);
        entries
    }

    pub fn get_transaction_by_hash(&self, digest: &str) -> Option<&StoredTransaction> {
        self.state.transactions.get(digest)
    }

    /// Newest-first page over the global log
    pub fn get_all_transactions(&self, limit: usize, offset: usize) -> Vec<&StoredTransaction> {
        let mut entries: Vec<&StoredTransaction> = self.state.transactions.values().collect();
        entries.sort_by(|a, b| b.applied_at.cmp(&a.applied_at));
        entries.into_iter().skip(offset).take(limit).collect()
    }

    pub fn block_height(&self) -> u64 {
        self.state.block_height
    }

    /// Advance the block height; returns the new value
    pub fn increment_block_height(&mut self) -> u64 {
        self.state.block_height += 1;
        self.persist();
        self.state.block_height
    }

    pub fn total_supply(&self) -> u64 {
        self.state.total_supply()
    }

    fn fee_for(&self, tx: &Transaction) -> u64 {
        match tx.tx_type {
            TxType::Transfer | TxType::SkillPurchase => self.fees.fee_for(tx.priority),
            _ => 0,
        }
    }

    // Persistence failures must not roll back an applied transaction;
    // they are surfaced in the log and the next mutation retries.
    fn persist(&self) {
        if let Some(store) = &self.store {
            if let Err(e) = store.save_ledger(&self.state) {
                warn!("failed to persist ledger state: {e}");
            }
        }
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::Keypair;
    use crate::tx::TransactionBuilder;

    fn funded_pair(ledger: &mut Ledger) -> (Keypair, Keypair) {
        let sender = Keypair::generate();
        let recipient = Keypair::generate();
        ledger.create_account(&sender.public_key_hex(), 1000).unwrap();
        ledger.create_account(&recipient.public_key_hex(), 100).unwrap();
        (sender, recipient)
    }

    #[test]
    fn test_transfer_moves_value_and_burns_fee() {
        let mut ledger = Ledger::new(FeeSchedule::default());
        let (sender, recipient) = funded_pair(&mut ledger);

        let tx = TransactionBuilder::new()
            .sender(&sender)
            .recipient(recipient.public_key_hex())
            .amount(100)
            .nonce(1)
            .build()
            .unwrap();

        let supply_before = ledger.total_supply();
        ledger.apply_transaction(&tx).unwrap();

        assert_eq!(ledger.get_balance(&sender.public_key_hex()), 899);
        assert_eq!(ledger.get_balance(&recipient.public_key_hex()), 200);
        assert_eq!(ledger.get_account(&sender.public_key_hex()).unwrap().nonce, 1);
        assert_eq!(ledger.total_supply(), supply_before - 1);
    }

    #[test]
    fn test_priority_scales_the_burned_fee() {
        use crate::economics::Priority;

        let mut ledger = Ledger::new(FeeSchedule::default());
        let (sender, recipient) = funded_pair(&mut ledger);

        let tx = TransactionBuilder::new()
            .sender(&sender)
            .recipient(recipient.public_key_hex())
            .amount(100)
            .nonce(1)
            .priority(Priority::High)
            .build()
            .unwrap();

        ledger.apply_transaction(&tx).unwrap();
        // High priority doubles the base fee: 1000 - 100 - 2.
        assert_eq!(ledger.get_balance(&sender.public_key_hex()), 898);
        assert_eq!(ledger.get_balance(&recipient.public_key_hex()), 200);
    }

    #[test]
    fn test_duplicate_rejected_without_mutation() {
        let mut ledger = Ledger::new(FeeSchedule::default());
        let (sender, recipient) = funded_pair(&mut ledger);

        let tx = TransactionBuilder::new()
            .sender(&sender)
            .recipient(recipient.public_key_hex())
            .amount(100)
            .nonce(1)
            .build()
            .unwrap();

        ledger.apply_transaction(&tx).unwrap();
        let err = ledger.apply_transaction(&tx).unwrap_err();
        assert_eq!(err.code(), "DUPLICATE_TRANSACTION");
        assert_eq!(ledger.get_balance(&sender.public_key_hex()), 899);
    }

    #[test]
    fn test_nonce_gap_reports_expected() {
        let mut ledger = Ledger::new(FeeSchedule::default());
        let (sender, recipient) = funded_pair(&mut ledger);

        let tx = TransactionBuilder::new()
            .sender(&sender)
            .recipient(recipient.public_key_hex())
            .amount(10)
            .nonce(5)
            .build()
            .unwrap();

        match ledger.apply_transaction(&tx).unwrap_err() {
            LedgerError::InvalidNonce { expected, got } => {
                assert_eq!(expected, 1);
                assert_eq!(got, 5);
            }
            other => panic!("expected InvalidNonce, got {other:?}"),
        }
    }

    #[test]
    fn test_stake_locks_balance() {
        let mut ledger = Ledger::new(FeeSchedule::default());
        let sender = Keypair::generate();
        ledger.create_account(&sender.public_key_hex(), 100).unwrap();

        let tx = TransactionBuilder::new()
            .sender(&sender)
            .tx_type(TxType::Stake)
            .amount(50)
            .nonce(1)
            .timestamp(1_000)
            .build()
            .unwrap();

        ledger.apply_transaction(&tx).unwrap();
        let account = ledger.get_account(&sender.public_key_hex()).unwrap();
        assert_eq!(account.balance, 50);
        assert_eq!(account.stake_locked, 50);
        assert_eq!(account.stake_unlocked_at, Some(1_000 + STAKE_LOCK_MS));
    }

    #[test]
    fn test_mint_credits_recipient_without_fee() {
        let mut ledger = Ledger::new(FeeSchedule::default());
        let (sender, recipient) = funded_pair(&mut ledger);

        let tx = TransactionBuilder::new()
            .sender(&sender)
            .tx_type(TxType::Mint)
            .recipient(recipient.public_key_hex())
            .amount(25)
            .nonce(1)
            .build()
            .unwrap();

        ledger.apply_transaction(&tx).unwrap();
        assert_eq!(ledger.get_balance(&recipient.public_key_hex()), 125);
        assert_eq!(ledger.get_balance(&sender.public_key_hex()), 1000);
    }

    #[test]
    fn test_history_is_newest_first_and_bounded() {
        let mut ledger = Ledger::new(FeeSchedule::default());
        let (sender, recipient) = funded_pair(&mut ledger);

        for nonce in 1..=3 {
            let tx = TransactionBuilder::new()
                .sender(&sender)
                .recipient(recipient.public_key_hex())
                .amount(10)
                .nonce(nonce)
                .build()
                .unwrap();
            ledger.apply_transaction(&tx).unwrap();
        }

        let history = ledger.get_transaction_history(&sender.public_key_hex(), 2);
        assert_eq!(history.len(), 2);
        assert!(history[0].applied_at >= history[1].applied_at);
        assert_eq!(history[0].transaction.nonce, 3);
    }
}
