use crate::crypto::Keypair;
use crate::economics::{
    reputation, stake_minimum, voting_power, ActivityCounters, ATTESTER_MIN_REPUTATION,
    STAKE_LOCK_MS, STAKE_MINIMUM,
};
use crate::registry::{BotIdentity, RegistryState};
use crate::storage::{Store, StoreError};
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;
use tracing::{debug, warn};

const MONTH_MS: f64 = 30.0 * 24.0 * 60.0 * 60.0 * 1000.0;

/// Errors from registry operations. `code()` gives the stable external code.
#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("Bot already exists: {0}")]
    BotExists(String),

    #[error("Unknown bot: {0}")]
    UnknownBot(String),

    #[error("Unknown attester: {0}")]
    UnknownAttester(String),

    #[error("Stake required: need {required}, got {provided}")]
    StakeRequired { required: u64, provided: u64 },

    #[error("Attester reputation too low: need {required}, got {actual}")]
    ReputationTooLow { required: f64, actual: f64 },

    #[error("Storage error: {0}")]
    Storage(#[from] StoreError),
}

impl RegistryError {
    pub fn code(&self) -> &'static str {
        match self {
            RegistryError::BotExists(_) => "BOT_EXISTS",
            RegistryError::UnknownBot(_) => "UNKNOWN_SENDER",
            RegistryError::UnknownAttester(_) => "UNKNOWN_SENDER",
            RegistryError::StakeRequired { .. } => "STAKE_REQUIRED",
            RegistryError::ReputationTooLow { .. } => "REPUTATION_TOO_LOW",
            RegistryError::Storage(_) => "STORAGE_FAILED",
        }
    }
}

/// Registry of bot identities: wallet creation, staked registration with
/// attestation discounts, and reputation updates.
pub struct IdentityRegistry {
    state: RegistryState,
    store: Option<Store>,
}

impl IdentityRegistry {
    pub fn new() -> Self {
        Self {
            state: RegistryState::new(),
            store: None,
        }
    }

    pub fn with_store(store: Store) -> Self {
        Self {
            state: RegistryState::new(),
            store: Some(store),
        }
    }

    /// Load persisted identities; absent file means a fresh registry
    pub fn initialize(&mut self) -> Result<(), RegistryError> {
        if let Some(store) = &self.store {
            if let Some(state) = store.load_registry()? {
                self.state = state;
            }
        }
        Ok(())
    }

    pub fn state(&self) -> &RegistryState {
        &self.state
    }

    /// Generate a fresh keypair and record the identity.
    ///
    /// The secret key stays in the registry so the SDK can sign on the
    /// bot's behalf; key custody beyond this file is the host's problem.
    pub fn create_wallet(
        &mut self,
        name: &str,
        description: &str,
    ) -> Result<BotIdentity, RegistryError> {
        let keypair = Keypair::generate();
        let public_key = keypair.public_key_hex();
        if self.state.bots.contains_key(&public_key) {
            return Err(RegistryError::BotExists(public_key));
        }

        let identity = BotIdentity {
            public_key: public_key.clone(),
            secret_key: keypair.secret_key_hex(),
            name: name.to_string(),
            description: description.to_string(),
            created_at: now_ms(),
            reputation: 0.0,
            counters: ActivityCounters::default(),
            stake_locked: 0,
            stake_unlocked_at: None,
            attested_by: Vec::new(),
        };
        self.state.bots.insert(public_key, identity.clone());
        self.persist();
        debug!(name, "created wallet");
        Ok(identity)
    }

    pub fn get_bot(&self, public_key: &str) -> Option<&BotIdentity> {
        self.state.bots.get(public_key)
    }

    pub fn list_bots(&self) -> Vec<&BotIdentity> {
        self.state.bots.values().collect()
    }

    /// Reconstruct the signing keypair for a bot
    pub fn keypair_for(&self, public_key: &str) -> Result<Keypair, RegistryError> {
        let bot = self
            .state
            .bots
            .get(public_key)
            .ok_or_else(|| RegistryError::UnknownBot(public_key.to_string()))?;
        Keypair::from_secret_hex(&bot.secret_key)
            .map_err(|_| RegistryError::UnknownBot(public_key.to_string()))
    }

    /// Register a bot by locking stake for 30 days.
    ///
    /// The minimum is 50 shells, or 25 with an attestation from a bot
    /// whose reputation is at least 100. A given attestation lands in the
    /// registrant's `attested_by` and the attester's outbound index.
    pub fn register_bot(
        &mut self,
        public_key: &str,
        stake: u64,
        attester: Option<&str>,
    ) -> Result<(), RegistryError> {
        if !self.state.bots.contains_key(public_key) {
            return Err(RegistryError::UnknownBot(public_key.to_string()));
        }

        let attested = match attester {
            Some(attester_pk) => {
                let attester_bot = self
                    .state
                    .bots
                    .get(attester_pk)
                    .ok_or_else(|| RegistryError::UnknownAttester(attester_pk.to_string()))?;
                if attester_bot.reputation < ATTESTER_MIN_REPUTATION {
                    return Err(RegistryError::ReputationTooLow {
                        required: ATTESTER_MIN_REPUTATION,
                        actual: attester_bot.reputation,
                    });
                }
                true
            }
            None => false,
        };

        let required = stake_minimum(attested);
        if stake < required {
            return Err(RegistryError::StakeRequired {
                required,
                provided: stake,
            });
        }

        let now = now_ms();
        let bot = self.state.bots.get_mut(public_key).expect("checked above");
        bot.stake_locked = stake;
        bot.stake_unlocked_at = Some(now + STAKE_LOCK_MS);
        if let Some(attester_pk) = attester {
            bot.attested_by.push(attester_pk.to_string());
            self.state
                .attestations
                .entry(attester_pk.to_string())
                .or_default()
                .push(public_key.to_string());
        }

        self.persist();
        debug!(public_key, stake, attested, "registered bot");
        Ok(())
    }

    /// Recompute reputation from fresh activity counters
    pub fn update_reputation(
        &mut self,
        public_key: &str,
        counters: ActivityCounters,
    ) -> Result<f64, RegistryError> {
        let now = now_ms();
        let bot = self
            .state
            .bots
            .get_mut(public_key)
            .ok_or_else(|| RegistryError::UnknownBot(public_key.to_string()))?;

        let age_months = (now.saturating_sub(bot.created_at)) as f64 / MONTH_MS;
        bot.counters = counters;
        bot.reputation = reputation(&counters, age_months);
        let score = bot.reputation;
        self.persist();
        Ok(score)
    }

    /// Bump the trade counter and refresh reputation
    pub fn record_trade(&mut self, public_key: &str) -> Result<(), RegistryError> {
        let counters = self.counters_of(public_key)?;
        self.update_reputation(
            public_key,
            ActivityCounters {
                trades: counters.trades + 1,
                ..counters
            },
        )?;
        Ok(())
    }

    /// Bump the published-skill counter and refresh reputation
    pub fn record_skill_published(&mut self, public_key: &str) -> Result<(), RegistryError> {
        let counters = self.counters_of(public_key)?;
        self.update_reputation(
            public_key,
            ActivityCounters {
                skills_published: counters.skills_published + 1,
                ..counters
            },
        )?;
        Ok(())
    }

    fn counters_of(&self, public_key: &str) -> Result<ActivityCounters, RegistryError> {
        self.state
            .bots
            .get(public_key)
            .map(|b| b.counters)
            .ok_or_else(|| RegistryError::UnknownBot(public_key.to_string()))
    }

    /// A bot is registered while the full stake floor is locked and the
    /// lock has not expired
    pub fn is_registered(&self, public_key: &str) -> bool {
        match self.state.bots.get(public_key) {
            Some(bot) => {
                bot.stake_locked >= STAKE_MINIMUM
                    && bot.stake_unlocked_at.map(|t| t > now_ms()).unwrap_or(false)
            }
            None => false,
        }
    }

    /// Governance voting power for a bot holding `shells_held`
    pub fn voting_power(&self, public_key: &str, shells_held: u64) -> f64 {
        self.state
            .bots
            .get(public_key)
            .map(|b| voting_power(b.reputation, shells_held))
            .unwrap_or(0.0)
    }

    fn persist(&self) {
        if let Some(store) = &self.store {
            if let Err(e) = store.save_registry(&self.state) {
                warn!("failed to persist registry state: {e}");
            }
        }
    }
}

impl Default for IdentityRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
