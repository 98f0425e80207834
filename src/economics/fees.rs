use serde::{Deserialize, Serialize};

/// Fee priority tiers. Carried on the transaction itself (and therefore
/// signed); absent on the wire means normal.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    #[default]
    Normal,
    High,
}

impl Priority {
    /// True for the default tier; used to keep normal-priority
    /// transactions byte-identical to records that predate the field
    pub fn is_normal(&self) -> bool {
        *self == Priority::Normal
    }

    fn multiplier(&self) -> f64 {
        match self {
            Priority::Low => 0.5,
            Priority::Normal => 1.0,
            Priority::High => 2.0,
        }
    }
}

/// The fee schedule. A value-moving transaction burns a fixed base fee;
/// priority scales it, rounded up.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct FeeSchedule {
    pub base: u64,
}

impl Default for FeeSchedule {
    fn default() -> Self {
        Self { base: 1 }
    }
}

impl FeeSchedule {
    /// The flat fee for a normal-priority transaction
    pub fn base_fee(&self) -> u64 {
        self.base
    }

    /// Priority-adjusted fee: ceil(base x multiplier)
    pub fn fee_for(&self, priority: Priority) -> u64 {
        (self.base as f64 * priority.multiplier()).ceil() as u64
    }
}
