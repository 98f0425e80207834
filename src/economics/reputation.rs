use serde::{Deserialize, Serialize};

/// Activity counters a bot accumulates; the inputs to the reputation
/// formula.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityCounters {
    #[serde(default)]
    pub trades: u64,
    #[serde(default)]
    pub skills_published: u64,
    #[serde(default)]
    pub uptime_hours: u64,
    #[serde(default)]
    pub governance_votes: u64,
    #[serde(default)]
    pub disputes_lost: u64,
    #[serde(default)]
    pub spam_flags: u64,
}

/// Reputation score.
///
/// R = max(0, (10t + 20s + 0.1u + 5g - 50d - 100f) * 0.99^age_months)
///
/// Trades and published skills dominate; disputes and spam flags cost far
/// more than honest activity earns, and the whole score decays 1% per
/// month of account age.
pub fn reputation(counters: &ActivityCounters, age_months: f64) -> f64 {
    let raw = 10.0 * counters.trades as f64
        + 20.0 * counters.skills_published as f64
        + 0.1 * counters.uptime_hours as f64
        + 5.0 * counters.governance_votes as f64
        - 50.0 * counters.disputes_lost as f64
        - 100.0 * counters.spam_flags as f64;
    let decay = (1.0 - 0.01f64).powf(age_months.max(0.0));
    (raw * decay).max(0.0)
}

/// Voting power: half the reputation plus a small weight per shell held,
/// capped at 1000 so wealth cannot buy unbounded influence.
pub fn voting_power(reputation: f64, shells_held: u64) -> f64 {
    (0.5 * reputation + 0.001 * shells_held as f64).min(1000.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_positive_activity_scores() {
        let counters = ActivityCounters {
            trades: 10,
            skills_published: 2,
            uptime_hours: 100,
            governance_votes: 4,
            ..Default::default()
        };
        // 100 + 40 + 10 + 20 = 170, no decay at age 0
        assert!((reputation(&counters, 0.0) - 170.0).abs() < 1e-9);
    }

    #[test]
    fn test_penalties_floor_at_zero() {
        let counters = ActivityCounters {
            trades: 20,
            disputes_lost: 5,
            spam_flags: 2,
            ..Default::default()
        };
        // 200 - 250 - 200 = -250, decayed then clamped
        assert_eq!(reputation(&counters, 1.0), 0.0);
    }

    #[test]
    fn test_decay_reduces_score() {
        let counters = ActivityCounters {
            trades: 10,
            ..Default::default()
        };
        let fresh = reputation(&counters, 0.0);
        let aged = reputation(&counters, 12.0);
        assert!(aged < fresh);
        assert!(aged > 0.0);
    }

    #[test]
    fn test_voting_power_capped() {
        assert_eq!(voting_power(10_000.0, 0), 1000.0);
        assert!((voting_power(100.0, 2000) - 52.0).abs() < 1e-9);
    }
}
