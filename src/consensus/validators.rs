use crate::crypto::{KeyError, PublicKey};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One member of the fixed validator set
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatorInfo {
    pub id: String,
    pub public_key: String,
}

/// The validator set, fixed at construction: self first, then peers in
/// configured order. Leader rotation and quorum arithmetic live here.
pub struct ValidatorSet {
    members: Vec<ValidatorInfo>,
    keys: HashMap<String, PublicKey>,
}

impl ValidatorSet {
    pub fn new(members: Vec<ValidatorInfo>) -> Result<Self, KeyError> {
        let mut keys = HashMap::new();
        for member in &members {
            keys.insert(member.id.clone(), PublicKey::from_hex(&member.public_key)?);
        }
        Ok(Self { members, keys })
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn members(&self) -> &[ValidatorInfo] {
        &self.members
    }

    pub fn contains(&self, id: &str) -> bool {
        self.keys.contains_key(id)
    }

    pub fn public_key_of(&self, id: &str) -> Option<&PublicKey> {
        self.keys.get(id)
    }

    /// Deterministic modular rotation: view v is led by members[v mod n]
    pub fn leader_for(&self, view: u64) -> &ValidatorInfo {
        &self.members[(view % self.members.len() as u64) as usize]
    }

    /// Byzantine bound: f = floor((n - 1) / 3)
    pub fn fault_tolerance(&self) -> usize {
        (self.members.len().saturating_sub(1)) / 3
    }

    /// Agreement threshold: 2f + 1, counting the local node's implicit vote
    pub fn quorum(&self) -> usize {
        2 * self.fault_tolerance() + 1
    }
}
