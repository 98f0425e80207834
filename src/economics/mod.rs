// Economics module - fees, reputation, and constraint checks

mod fees;
mod reputation;
mod rules;

pub use fees::{FeeSchedule, Priority};
pub use reputation::{reputation, voting_power, ActivityCounters};
pub use rules::{
    check_transaction, inactivity_burn, registration_mint, stake_minimum, validator_rewards,
    EconomicsError, ATTESTER_MIN_REPUTATION, INACTIVITY_BURN_PER_MONTH_PERCENT,
    REGISTRATION_MINT, REGISTRATION_MINT_ATTESTED, STAKE_LOCK_MS, STAKE_MINIMUM,
    STAKE_MINIMUM_ATTESTED, TREASURY_PER_BLOCK, VALIDATOR_REWARD_PER_BLOCK,
};
