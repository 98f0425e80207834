// PBFT engine - three-phase agreement over transaction digests
//
// The node is transport-agnostic: outbound messages accumulate in an
// outbox the host drains, and every broadcast is also delivered locally
// first, so a single-validator set commits synchronously. The local
// node's own vote is implicit in quorum counts (recorded votes + 1).

use crate::config::ConsensusConfig;
use crate::consensus::{ConsensusMessage, MessagePhase, ValidatorInfo, ValidatorSet};
use crate::crypto::{CanonicalError, KeyError, Keypair};
use crate::ledger::{Ledger, LedgerError};
use crate::tx::{Transaction, TxValidator, ValidationError};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Errors from consensus operations. `code()` gives the stable external code.
#[derive(Error, Debug)]
pub enum ConsensusError {
    #[error(transparent)]
    InvalidTransaction(#[from] ValidationError),

    #[error("Unknown sender: {0}")]
    UnknownSender(String),

    #[error("Invalid nonce: expected {expected}, got {got}")]
    InvalidNonce { expected: u64, got: u64 },

    #[error("Duplicate transaction: {0}")]
    DuplicateTransaction(String),

    #[error("Invalid validator key: {0}")]
    InvalidValidatorKey(#[from] KeyError),

    #[error("Conflicting commit at sequence {sequence}")]
    ConflictingCommit { sequence: u64 },

    #[error("Ledger unavailable")]
    LedgerUnavailable,

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error("Encoding failed: {0}")]
    Encoding(#[from] CanonicalError),
}

impl ConsensusError {
    pub fn code(&self) -> &'static str {
        match self {
            ConsensusError::InvalidTransaction(ValidationError::InvalidAmount(_)) => {
                "INVALID_AMOUNT"
            }
            ConsensusError::InvalidTransaction(_) => "INVALID_SIGNATURE",
            ConsensusError::UnknownSender(_) => "UNKNOWN_SENDER",
            ConsensusError::InvalidNonce { .. } => "INVALID_NONCE",
            ConsensusError::DuplicateTransaction(_) => "DUPLICATE_TRANSACTION",
            ConsensusError::InvalidValidatorKey(_) => "CONSENSUS_FAILURE",
            ConsensusError::ConflictingCommit { .. } => "CONSENSUS_FAILURE",
            ConsensusError::LedgerUnavailable => "CONSENSUS_FAILURE",
            ConsensusError::Ledger(e) => e.code(),
            ConsensusError::Encoding(_) => "ENCODING_FAILED",
        }
    }
}

/// An in-flight transaction and its phase flags
#[derive(Clone, Debug)]
pub struct PendingEntry {
    pub transaction: Transaction,
    pub arrived_at: u64,
    pub pre_prepared: bool,
    pub prepared: bool,
    pub committed: bool,
}

type CommitCallback = Box<dyn FnMut(&Transaction) + Send>;

/// One validator's PBFT state machine
pub struct PbftNode {
    node_id: String,
    keypair: Keypair,
    validators: ValidatorSet,
    ledger: Arc<Mutex<Ledger>>,
    config: ConsensusConfig,

    view: u64,
    sequence: u64,
    pending: HashMap<String, PendingEntry>,
    /// digest -> sequence assigned by the current view's leader
    sequences: HashMap<String, u64>,
    prepare_votes: HashMap<String, HashSet<String>>,
    commit_votes: HashMap<String, HashSet<String>>,
    committed: HashSet<String>,
    committed_sequences: HashMap<u64, String>,
    message_log: Vec<ConsensusMessage>,
    last_checkpoint: u64,
    last_progress: u64,

    outbox: Vec<ConsensusMessage>,
    callbacks: Vec<CommitCallback>,
}

impl PbftNode {
    /// Build a node. The validator set is fixed: self first, then the
    /// configured peers.
    pub fn new(
        node_id: impl Into<String>,
        keypair: Keypair,
        peers: Vec<ValidatorInfo>,
        ledger: Arc<Mutex<Ledger>>,
        config: ConsensusConfig,
    ) -> Result<Self, ConsensusError> {
        let node_id = node_id.into();
        let mut members = vec![ValidatorInfo {
            id: node_id.clone(),
            public_key: keypair.public_key_hex(),
        }];
        members.extend(peers);
        let validators = ValidatorSet::new(members)?;

        Ok(Self {
            node_id,
            keypair,
            validators,
            ledger,
            config,
            view: 0,
            sequence: 0,
            pending: HashMap::new(),
            sequences: HashMap::new(),
            prepare_votes: HashMap::new(),
            commit_votes: HashMap::new(),
            committed: HashSet::new(),
            committed_sequences: HashMap::new(),
            message_log: Vec::new(),
            last_checkpoint: 0,
            last_progress: now_ms(),
            outbox: Vec::new(),
            callbacks: Vec::new(),
        })
    }

    pub fn node_id(&self) -> &str {
        &self.node_id
    }

    pub fn view(&self) -> u64 {
        self.view
    }

    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    pub fn validators(&self) -> &ValidatorSet {
        &self.validators
    }

    pub fn is_leader(&self) -> bool {
        self.validators.leader_for(self.view).id == self.node_id
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn pending(&self, digest: &str) -> Option<&PendingEntry> {
        self.pending.get(digest)
    }

    pub fn is_committed(&self, digest: &str) -> bool {
        self.committed.contains(digest)
    }

    pub fn message_log(&self) -> &[ConsensusMessage] {
        &self.message_log
    }

    /// Take the messages waiting for delivery to peers
    pub fn drain_outbox(&mut self) -> Vec<ConsensusMessage> {
        std::mem::take(&mut self.outbox)
    }

    /// Register a callback invoked synchronously with every committed
    /// transaction, before the next message is processed
    pub fn on_commit<F>(&mut self, callback: F)
    where
        F: FnMut(&Transaction) + Send + 'static,
    {
        self.callbacks.push(Box::new(callback));
    }

    /// Accept a signed transaction into consensus.
    ///
    /// The leader immediately broadcasts a pre-prepare; a follower stores
    /// the transaction and waits for the leader's.
    pub fn submit_transaction(&mut self, tx: Transaction) -> Result<String, ConsensusError> {
        TxValidator::validate(&tx)?;
        let digest = tx.digest()?;
        if self.pending.contains_key(&digest) || self.committed.contains(&digest) {
            return Err(ConsensusError::DuplicateTransaction(digest));
        }

        {
            let ledger = self
                .ledger
                .lock()
                .map_err(|_| ConsensusError::LedgerUnavailable)?;
            let sender = ledger
                .get_account(&tx.from)
                .ok_or_else(|| ConsensusError::UnknownSender(tx.from.clone()))?;
            let expected = sender.next_nonce();
            if tx.nonce != expected {
                return Err(ConsensusError::InvalidNonce {
                    expected,
                    got: tx.nonce,
                });
            }
        }

        self.pending.insert(
            digest.clone(),
            PendingEntry {
                transaction: tx,
                arrived_at: now_ms(),
                pre_prepared: false,
                prepared: false,
                committed: false,
            },
        );
        debug!(%digest, "transaction accepted into pending");

        if self.is_leader() {
            self.propose(&digest)?;
        } else {
            // The leader's pre-prepare may have arrived before the
            // transaction itself.
            self.try_advance(&digest)?;
        }
        Ok(digest)
    }

    /// Route an incoming message by phase
    pub fn handle_message(&mut self, msg: ConsensusMessage) -> Result<(), ConsensusError> {
        match msg.phase {
            MessagePhase::PrePrepare => self.handle_pre_prepare(msg),
            MessagePhase::Prepare => self.handle_prepare(msg),
            MessagePhase::Commit => self.handle_commit(msg),
        }
    }

    pub fn handle_pre_prepare(&mut self, msg: ConsensusMessage) -> Result<(), ConsensusError> {
        if msg.phase != MessagePhase::PrePrepare || !self.accept(&msg) {
            return Ok(());
        }
        let leader = &self.validators.leader_for(self.view).id;
        if &msg.validator != leader {
            debug!(validator = %msg.validator, %leader, "dropping pre-prepare from non-leader");
            return Ok(());
        }
        if self.committed.contains(&msg.digest) {
            return Ok(());
        }

        let digest = msg.digest.clone();
        self.sequences.insert(digest.clone(), msg.sequence);
        if msg.sequence > self.sequence {
            self.sequence = msg.sequence;
        }
        self.message_log.push(msg);
        self.try_advance(&digest)
    }

    pub fn handle_prepare(&mut self, msg: ConsensusMessage) -> Result<(), ConsensusError> {
        if msg.phase != MessagePhase::Prepare || !self.accept(&msg) {
            return Ok(());
        }
        if self.committed.contains(&msg.digest) {
            return Ok(());
        }

        let digest = msg.digest.clone();
        if msg.validator != self.node_id {
            self.prepare_votes
                .entry(digest.clone())
                .or_default()
                .insert(msg.validator.clone());
        }
        self.message_log.push(msg);
        self.try_advance(&digest)
    }

    pub fn handle_commit(&mut self, msg: ConsensusMessage) -> Result<(), ConsensusError> {
        if msg.phase != MessagePhase::Commit || !self.accept(&msg) {
            return Ok(());
        }
        if self.committed.contains(&msg.digest) {
            return Ok(());
        }

        let digest = msg.digest.clone();
        if msg.validator != self.node_id {
            self.commit_votes
                .entry(digest.clone())
                .or_default()
                .insert(msg.validator.clone());
        }
        self.message_log.push(msg);
        self.try_advance(&digest)
    }

    /// Leader timeout. Advances the view, discards the abandoned view's
    /// vote state (pending transactions survive), and re-proposes them if
    /// this node is the new leader. Returns true when a view change fired.
    pub fn on_view_timeout(&mut self, now: u64) -> Result<bool, ConsensusError> {
        if self.pending.is_empty() {
            self.last_progress = now;
            return Ok(false);
        }
        if now.saturating_sub(self.last_progress) < self.config.view_timeout_ms {
            return Ok(false);
        }

        let old_view = self.view;
        self.view += 1;
        self.sequences.clear();
        self.prepare_votes.clear();
        self.commit_votes.clear();
        for entry in self.pending.values_mut() {
            entry.pre_prepared = false;
            entry.prepared = false;
        }
        self.last_progress = now;
        warn!(old_view, new_view = self.view, "view change");

        if self.is_leader() {
            let mut backlog: Vec<(String, u64)> = self
                .pending
                .iter()
                .map(|(digest, entry)| (digest.clone(), entry.arrived_at))
                .collect();
            backlog.sort_by(|a, b| a.1.cmp(&b.1).then(a.0.cmp(&b.0)));
            for (digest, _) in backlog {
                self.propose(&digest)?;
            }
        }
        Ok(true)
    }

    // Leader path: assign the next sequence and broadcast a pre-prepare.
    fn propose(&mut self, digest: &str) -> Result<(), ConsensusError> {
        self.sequence += 1;
        let mut msg = ConsensusMessage::new(
            MessagePhase::PrePrepare,
            self.view,
            self.sequence,
            digest,
            self.node_id.clone(),
        );
        msg.sign(&self.keypair)?;
        self.broadcast(msg)
    }

    // Every broadcast is delivered locally first, then queued for peers.
    fn broadcast(&mut self, msg: ConsensusMessage) -> Result<(), ConsensusError> {
        self.outbox.push(msg.clone());
        self.handle_message(msg)
    }

    // View, membership, and signature gate shared by all handlers.
    fn accept(&self, msg: &ConsensusMessage) -> bool {
        if msg.view != self.view {
            debug!(
                msg_view = msg.view,
                view = self.view,
                "dropping out-of-view message"
            );
            return false;
        }
        let Some(public_key) = self.validators.public_key_of(&msg.validator) else {
            debug!(validator = %msg.validator, "dropping message from unknown validator");
            return false;
        };
        if !msg.verify(public_key) {
            debug!(validator = %msg.validator, "dropping message with bad signature");
            return false;
        }
        true
    }

    // Move a digest as far through the phases as its recorded state
    // allows. Flags only ever go forward, so the recursion through
    // broadcast terminates.
    fn try_advance(&mut self, digest: &str) -> Result<(), ConsensusError> {
        let Some(&sequence) = self.sequences.get(digest) else {
            return Ok(());
        };
        let Some(entry) = self.pending.get(digest) else {
            return Ok(());
        };
        let (pre_prepared, prepared, committed) =
            (entry.pre_prepared, entry.prepared, entry.committed);
        if committed {
            return Ok(());
        }

        if !pre_prepared {
            if let Some(entry) = self.pending.get_mut(digest) {
                entry.pre_prepared = true;
            }
            let mut msg = ConsensusMessage::new(
                MessagePhase::Prepare,
                self.view,
                sequence,
                digest,
                self.node_id.clone(),
            );
            msg.sign(&self.keypair)?;
            self.broadcast(msg)?;
            return self.try_advance(digest);
        }

        if !prepared {
            let votes = self.prepare_votes.get(digest).map(HashSet::len).unwrap_or(0);
            if votes + 1 >= self.validators.quorum() {
                if let Some(entry) = self.pending.get_mut(digest) {
                    entry.prepared = true;
                }
                let mut msg = ConsensusMessage::new(
                    MessagePhase::Commit,
                    self.view,
                    sequence,
                    digest,
                    self.node_id.clone(),
                );
                msg.sign(&self.keypair)?;
                self.broadcast(msg)?;
                return self.try_advance(digest);
            }
            return Ok(());
        }

        let votes = self.commit_votes.get(digest).map(HashSet::len).unwrap_or(0);
        if votes + 1 >= self.validators.quorum() {
            self.execute_commit(digest, sequence)?;
        }
        Ok(())
    }

    // Quorum of commits reached: hand the transaction to the ledger, fire
    // callbacks, and clear the in-flight state.
    fn execute_commit(&mut self, digest: &str, sequence: u64) -> Result<(), ConsensusError> {
        if let Some(existing) = self.committed_sequences.get(&sequence) {
            if existing != digest {
                warn!(sequence, "conflicting digest for an already-committed sequence");
                return Err(ConsensusError::ConflictingCommit { sequence });
            }
        }

        let Some(entry) = self.pending.remove(digest) else {
            return Ok(());
        };

        let apply_result = {
            let mut ledger = self
                .ledger
                .lock()
                .map_err(|_| ConsensusError::LedgerUnavailable)?;
            match ledger.apply_transaction(&entry.transaction) {
                Ok(applied) => {
                    ledger.increment_block_height();
                    Ok(applied)
                }
                Err(e) => Err(e),
            }
        };

        if let Err(e) = apply_result {
            warn!(%digest, error = %e, "commit apply failed; discarding transaction");
            self.forget(digest);
            return Err(ConsensusError::Ledger(e));
        }

        for callback in self.callbacks.iter_mut() {
            callback(&entry.transaction);
        }

        self.committed.insert(digest.to_string());
        self.committed_sequences.insert(sequence, digest.to_string());
        self.forget(digest);
        self.last_progress = now_ms();
        self.maybe_checkpoint(sequence);
        info!(%digest, sequence, "committed transaction");
        Ok(())
    }

    fn forget(&mut self, digest: &str) {
        self.pending.remove(digest);
        self.sequences.remove(digest);
        self.prepare_votes.remove(digest);
        self.commit_votes.remove(digest);
    }

    fn maybe_checkpoint(&mut self, sequence: u64) {
        if sequence.saturating_sub(self.last_checkpoint) >= self.config.checkpoint_interval {
            self.last_checkpoint = sequence;
            self.message_log.retain(|m| m.sequence > sequence);
            debug!(sequence, "checkpoint: truncated message log");
        }
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
