use crate::tx::{Transaction, TxType, MAX_SAFE_AMOUNT};
use thiserror::Error;

/// Shells minted when an attested bot registers
pub const REGISTRATION_MINT_ATTESTED: u64 = 100;

/// Shells minted when an unattested bot registers
pub const REGISTRATION_MINT: u64 = 50;

/// Validator reward pool per block.
///
/// Pure parameter only: the commit path does not mint rewards, because
/// validator ids are not ledger accounts. A host that pays validators
/// splits the pool with [`validator_rewards`] on its own cadence and
/// credits each share through mint transactions.
pub const VALIDATOR_REWARD_PER_BLOCK: u64 = 10;

/// Treasury allocation per block.
///
/// Pure parameter only, accrued by the host alongside validator rewards;
/// the core defines the amount, not the account it lands in.
pub const TREASURY_PER_BLOCK: u64 = 5;

/// Stake required to register
pub const STAKE_MINIMUM: u64 = 50;

/// Stake required with a qualified attestation
pub const STAKE_MINIMUM_ATTESTED: u64 = 25;

/// Minimum reputation to attest for another bot
pub const ATTESTER_MIN_REPUTATION: f64 = 100.0;

/// Registration stake lock duration (30 days, in milliseconds)
pub const STAKE_LOCK_MS: u64 = 30 * 24 * 60 * 60 * 1000;

/// Balance percentage burned per month of inactivity.
///
/// Pure parameter only: nothing in the core schedules the burn. A host
/// that wants it must call [`inactivity_burn`] from its own periodic tick.
pub const INACTIVITY_BURN_PER_MONTH_PERCENT: u64 = 1;

#[derive(Error, Debug)]
pub enum EconomicsError {
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Insufficient balance: available {available}, required {required}")]
    InsufficientBalance { available: u64, required: u64 },
}

/// Per-transaction economic constraint check, run by the ledger before any
/// mutation. `spendable` is the sender's spendable balance (stake is held
/// outside it).
pub fn check_transaction(
    tx: &Transaction,
    spendable: u64,
    fee: u64,
) -> Result<(), EconomicsError> {
    if tx.amount > MAX_SAFE_AMOUNT {
        return Err(EconomicsError::InvalidAmount(format!(
            "{} exceeds the safe integer bound",
            tx.amount
        )));
    }

    if tx.tx_type == TxType::Transfer && tx.amount == 0 {
        return Err(EconomicsError::InvalidAmount(
            "transfer amount cannot be zero".to_string(),
        ));
    }

    // Minting creates value; everything else must be covered.
    if tx.tx_type != TxType::Mint {
        let required = tx.amount.saturating_add(fee);
        if spendable < required {
            return Err(EconomicsError::InsufficientBalance {
                available: spendable,
                required,
            });
        }
    }

    Ok(())
}

/// Registration mint amount
pub fn registration_mint(attested: bool) -> u64 {
    if attested {
        REGISTRATION_MINT_ATTESTED
    } else {
        REGISTRATION_MINT
    }
}

/// Stake minimum, accounting for the attestation discount
pub fn stake_minimum(attested: bool) -> u64 {
    if attested {
        STAKE_MINIMUM_ATTESTED
    } else {
        STAKE_MINIMUM
    }
}

/// Split the per-block validator reward proportionally to participation
/// scores. When every score is zero the pool is shared equally. Remainder
/// shells from integer division go to the earliest validators, keeping the
/// total exactly [`VALIDATOR_REWARD_PER_BLOCK`].
///
/// Called by the host on its payout cadence, not by the commit path; see
/// [`VALIDATOR_REWARD_PER_BLOCK`].
pub fn validator_rewards(scores: &[u64]) -> Vec<u64> {
    if scores.is_empty() {
        return Vec::new();
    }

    let total: u64 = scores.iter().sum();
    let pool = VALIDATOR_REWARD_PER_BLOCK;
    let n = scores.len() as u64;

    let mut rewards: Vec<u64> = if total == 0 {
        scores.iter().map(|_| pool / n).collect()
    } else {
        scores
            .iter()
            .map(|s| (pool as u128 * *s as u128 / total as u128) as u64)
            .collect()
    };

    let mut remainder = pool - rewards.iter().sum::<u64>();
    for reward in rewards.iter_mut() {
        if remainder == 0 {
            break;
        }
        *reward += 1;
        remainder -= 1;
    }

    rewards
}

/// Shells burned from `balance` after `months_idle` months of inactivity
pub fn inactivity_burn(balance: u64, months_idle: u64) -> u64 {
    let percent = INACTIVITY_BURN_PER_MONTH_PERCENT.saturating_mul(months_idle).min(100);
    (balance as u128 * percent as u128 / 100) as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::Keypair;
    use crate::tx::TransactionBuilder;

    fn transfer(amount: u64) -> Transaction {
        let kp = Keypair::generate();
        TransactionBuilder::new()
            .sender(&kp)
            .recipient("55".repeat(32))
            .amount(amount)
            .nonce(1)
            .build()
            .unwrap()
    }

    #[test]
    fn test_balance_must_cover_amount_plus_fee() {
        let tx = transfer(100);
        assert!(check_transaction(&tx, 101, 1).is_ok());
        let err = check_transaction(&tx, 100, 1).unwrap_err();
        assert!(matches!(
            err,
            EconomicsError::InsufficientBalance {
                available: 100,
                required: 101
            }
        ));
    }

    #[test]
    fn test_zero_transfer_rejected() {
        let mut tx = transfer(1);
        tx.amount = 0;
        assert!(matches!(
            check_transaction(&tx, 1000, 1),
            Err(EconomicsError::InvalidAmount(_))
        ));
    }

    #[test]
    fn test_rewards_proportional() {
        assert_eq!(validator_rewards(&[3, 1, 1]), vec![6, 2, 2]);
        assert_eq!(validator_rewards(&[1, 1]), vec![5, 5]);
    }

    #[test]
    fn test_rewards_equal_on_all_zero() {
        let rewards = validator_rewards(&[0, 0, 0]);
        assert_eq!(rewards.iter().sum::<u64>(), VALIDATOR_REWARD_PER_BLOCK);
        assert_eq!(rewards, vec![4, 3, 3]);
    }

    #[test]
    fn test_registration_amounts() {
        assert_eq!(registration_mint(true), 100);
        assert_eq!(registration_mint(false), 50);
        assert_eq!(stake_minimum(true), 25);
        assert_eq!(stake_minimum(false), 50);
    }

    #[test]
    fn test_inactivity_burn_parameter() {
        assert_eq!(inactivity_burn(1000, 0), 0);
        assert_eq!(inactivity_burn(1000, 3), 30);
        assert_eq!(inactivity_burn(1000, 500), 1000);
    }
}
