// Consensus module - PBFT agreement over transaction digests
// Three phases (pre-prepare, prepare, commit); quorum commits feed the ledger

mod engine;
mod message;
mod validators;

pub use engine::{ConsensusError, PbftNode, PendingEntry};
pub use message::{ConsensusMessage, MessagePhase};
pub use validators::{ValidatorInfo, ValidatorSet};
