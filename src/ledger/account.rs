use serde::{Deserialize, Serialize};

/// One account, keyed externally by its hex public key.
///
/// `balance` is spendable; staked shells live in `stake_locked` and are
/// not spendable until `stake_unlocked_at` passes. The nonce is the last
/// consumed value: an incoming transaction must carry nonce + 1.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub balance: u64,
    pub nonce: u64,
    #[serde(default)]
    pub reputation: f64,
    pub created_at: u64,
    pub last_active: u64,
    #[serde(default)]
    pub stake_locked: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stake_unlocked_at: Option<u64>,
}

impl Account {
    pub fn new(initial_balance: u64, now: u64) -> Self {
        Self {
            balance: initial_balance,
            nonce: 0,
            reputation: 0.0,
            created_at: now,
            last_active: now,
            stake_locked: 0,
            stake_unlocked_at: None,
        }
    }

    /// Spendable shells (stake is held outside the balance)
    pub fn spendable(&self) -> u64 {
        self.balance
    }

    /// The nonce the next transaction from this account must carry
    pub fn next_nonce(&self) -> u64 {
        self.nonce + 1
    }
}
