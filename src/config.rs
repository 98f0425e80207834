// Configuration for embedding processes

use crate::economics::FeeSchedule;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Consensus tuning knobs
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct ConsensusConfig {
    /// Leader timeout: no progress for this long triggers a view change
    pub view_timeout_ms: u64,
    /// Message-log truncation interval, in sequences
    pub checkpoint_interval: u64,
}

impl Default for ConsensusConfig {
    fn default() -> Self {
        Self {
            view_timeout_ms: 5_000,
            checkpoint_interval: 1_024,
        }
    }
}

/// Top-level configuration shared by every subsystem
#[derive(Clone, Debug)]
pub struct Config {
    /// Directory holding the ledger, identity, and skills state files.
    /// Two processes must never share one.
    pub data_dir: PathBuf,
    pub fees: FeeSchedule,
    pub consensus: ConsensusConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            fees: FeeSchedule::default(),
            consensus: ConsensusConfig::default(),
        }
    }
}

impl Config {
    /// Configuration rooted at a specific data directory
    pub fn at<P: Into<PathBuf>>(data_dir: P) -> Self {
        Self {
            data_dir: data_dir.into(),
            ..Default::default()
        }
    }
}

fn default_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".clawrrency")
}
