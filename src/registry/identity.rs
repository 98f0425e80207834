use crate::economics::ActivityCounters;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub const REGISTRY_STATE_VERSION: u32 = 1;

/// A bot identity: keys, metadata, stake state, and the activity counters
/// its reputation is derived from.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BotIdentity {
    pub public_key: String,
    pub secret_key: String,
    pub name: String,
    pub description: String,
    pub created_at: u64,
    #[serde(default)]
    pub reputation: f64,
    #[serde(default)]
    pub counters: ActivityCounters,
    #[serde(default)]
    pub stake_locked: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stake_unlocked_at: Option<u64>,
    #[serde(default)]
    pub attested_by: Vec<String>,
}

/// The registry's persistent shape: bots by hex public key plus the
/// outbound attestation index (attester -> attested).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RegistryState {
    pub version: u32,
    pub bots: HashMap<String, BotIdentity>,
    pub attestations: HashMap<String, Vec<String>>,
}

impl RegistryState {
    pub fn new() -> Self {
        Self {
            version: REGISTRY_STATE_VERSION,
            bots: HashMap::new(),
            attestations: HashMap::new(),
        }
    }
}

impl Default for RegistryState {
    fn default() -> Self {
        Self::new()
    }
}
