use crate::ledger::Account;
use crate::tx::Transaction;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub const LEDGER_STATE_VERSION: u32 = 1;

/// A transaction as recorded in the applied log
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StoredTransaction {
    pub digest: String,
    pub transaction: Transaction,
    pub block_height: u64,
    pub applied_at: u64,
}

/// The full ledger state, serialized verbatim as the persistent ledger
/// file: accounts by hex public key, the applied-transaction log by
/// digest, and a per-account digest index in insertion order.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LedgerState {
    pub version: u32,
    pub block_height: u64,
    pub accounts: HashMap<String, Account>,
    pub transactions: HashMap<String, StoredTransaction>,
    pub account_transactions: HashMap<String, Vec<String>>,
}

impl LedgerState {
    pub fn new() -> Self {
        Self {
            version: LEDGER_STATE_VERSION,
            block_height: 0,
            accounts: HashMap::new(),
            transactions: HashMap::new(),
            account_transactions: HashMap::new(),
        }
    }

    /// Total shells in circulation (spendable + staked)
    pub fn total_supply(&self) -> u64 {
        self.accounts
            .values()
            .map(|a| a.balance.saturating_add(a.stake_locked))
            .sum()
    }
}

impl Default for LedgerState {
    fn default() -> Self {
        Self::new()
    }
}
