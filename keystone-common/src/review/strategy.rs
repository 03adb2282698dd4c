use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::ReviewError;

/// Rule used to turn a vote set into an accept/reject decision.
///
/// The set is closed; every consumer matches on it exhaustively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsensusStrategy {
    /// More approvals than rejections. Ties reject.
    SimpleMajority,
    /// Trust-weighted approvals exceed trust-weighted rejections.
    TrustWeighted,
    /// At least two thirds of the votes approve.
    Supermajority,
    /// At least `2f + 1` approvals, with `f = (n - 1) / 3`.
    ByzantineFaultTolerant,
    /// At least `ceil(3n / 4)` approvals.
    Quorum,
    /// Supermajority for low-trust submitters, simple majority otherwise.
    Adaptive,
}

impl ConsensusStrategy {
    pub const ALL: [ConsensusStrategy; 6] = [
        ConsensusStrategy::SimpleMajority,
        ConsensusStrategy::TrustWeighted,
        ConsensusStrategy::Supermajority,
        ConsensusStrategy::ByzantineFaultTolerant,
        ConsensusStrategy::Quorum,
        ConsensusStrategy::Adaptive,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ConsensusStrategy::SimpleMajority => "simple_majority",
            ConsensusStrategy::TrustWeighted => "trust_weighted",
            ConsensusStrategy::Supermajority => "supermajority",
            ConsensusStrategy::ByzantineFaultTolerant => "byzantine_fault_tolerant",
            ConsensusStrategy::Quorum => "quorum",
            ConsensusStrategy::Adaptive => "adaptive",
        }
    }
}

impl Default for ConsensusStrategy {
    fn default() -> Self {
        Self::Adaptive
    }
}

impl fmt::Display for ConsensusStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ConsensusStrategy {
    type Err = ReviewError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ConsensusStrategy::ALL
            .iter()
            .copied()
            .find(|strategy| strategy.as_str() == s)
            .ok_or_else(|| ReviewError::InvalidStrategy(s.to_string()))
    }
}

/// Optional inputs to a consensus computation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ConsensusContext {
    /// Trust of the submitter whose artifact is being reviewed.
    #[serde(default)]
    pub submitter_trust: Option<f64>,
}

impl ConsensusContext {
    pub fn with_submitter_trust(submitter_trust: f64) -> Self {
        Self {
            submitter_trust: Some(submitter_trust),
        }
    }
}
