// Governance - the external proposal/voting oracle seam
//
// The core never implements governance policy; it only defines the
// capability set an oracle must provide and the record shapes it reads
// and writes. The in-memory oracle exists for tests and single-process
// embedding.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GovernanceError {
    #[error("Unknown proposal: {0}")]
    UnknownProposal(String),

    #[error("Proposal is not open: {0}")]
    NotOpen(String),

    #[error("Oracle failure: {0}")]
    Oracle(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProposalStatus {
    Open,
    Accepted,
    Rejected,
    Executed,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProposalRecord {
    pub id: String,
    pub title: String,
    pub description: String,
    pub proposer: String,
    pub created_at: u64,
    pub status: ProposalStatus,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct VoteRecord {
    pub proposal_id: String,
    pub voter: String,
    pub approve: bool,
    pub weight: f64,
    pub timestamp: u64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Tally {
    pub proposal_id: String,
    pub power_for: f64,
    pub power_against: f64,
    pub votes: usize,
}

/// Minimal capability set of the governance collaborator
pub trait GovernanceOracle {
    fn submit_proposal(&mut self, proposal: ProposalRecord) -> Result<String, GovernanceError>;
    fn cast_vote(&mut self, vote: VoteRecord) -> Result<(), GovernanceError>;
    fn tally(&self, proposal_id: &str) -> Result<Tally, GovernanceError>;
    fn execute(&mut self, proposal_id: &str) -> Result<(), GovernanceError>;
}

/// In-memory oracle: majority-by-power, no quorum rules
#[derive(Default)]
pub struct MemoryOracle {
    proposals: HashMap<String, ProposalRecord>,
    votes: HashMap<String, Vec<VoteRecord>>,
}

impl MemoryOracle {
    pub fn new() -> Self {
        Self::default()
    }
}

impl GovernanceOracle for MemoryOracle {
    fn submit_proposal(&mut self, proposal: ProposalRecord) -> Result<String, GovernanceError> {
        let id = proposal.id.clone();
        self.proposals.insert(id.clone(), proposal);
        Ok(id)
    }

    fn cast_vote(&mut self, vote: VoteRecord) -> Result<(), GovernanceError> {
        let proposal = self
            .proposals
            .get(&vote.proposal_id)
            .ok_or_else(|| GovernanceError::UnknownProposal(vote.proposal_id.clone()))?;
        if proposal.status != ProposalStatus::Open {
            return Err(GovernanceError::NotOpen(vote.proposal_id.clone()));
        }
        self.votes
            .entry(vote.proposal_id.clone())
            .or_default()
            .push(vote);
        Ok(())
    }

    fn tally(&self, proposal_id: &str) -> Result<Tally, GovernanceError> {
        if !self.proposals.contains_key(proposal_id) {
            return Err(GovernanceError::UnknownProposal(proposal_id.to_string()));
        }
        let votes = self.votes.get(proposal_id).map(Vec::as_slice).unwrap_or(&[]);
        let power_for = votes.iter().filter(|v| v.approve).map(|v| v.weight).sum();
        let power_against = votes.iter().filter(|v| !v.approve).map(|v| v.weight).sum();
        Ok(Tally {
            proposal_id: proposal_id.to_string(),
            power_for,
            power_against,
            votes: votes.len(),
        })
    }

    fn execute(&mut self, proposal_id: &str) -> Result<(), GovernanceError> {
        let tally = self.tally(proposal_id)?;
        let proposal = self
            .proposals
            .get_mut(proposal_id)
            .ok_or_else(|| GovernanceError::UnknownProposal(proposal_id.to_string()))?;
        proposal.status = if tally.power_for > tally.power_against {
            ProposalStatus::Executed
        } else {
            ProposalStatus::Rejected
        };
        Ok(())
    }
}
