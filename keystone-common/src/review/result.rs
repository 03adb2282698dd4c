use std::{collections::BTreeSet, fmt};

use serde::{Deserialize, Serialize};

use super::strategy::ConsensusStrategy;

/// Statistical anomaly raised over a vote set.
///
/// Patterns are reported alongside a decision and never change it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuspiciousPattern {
    /// Several validators share exactly the same trust score.
    IdenticalTrustScores,
    /// Every timestamped vote landed inside a sub-second window.
    RapidVoting,
}

impl SuspiciousPattern {
    pub fn as_str(&self) -> &'static str {
        match self {
            SuspiciousPattern::IdenticalTrustScores => "identical_trust_scores",
            SuspiciousPattern::RapidVoting => "rapid_voting",
        }
    }
}

impl fmt::Display for SuspiciousPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Outcome of one consensus computation. Fully derived from its inputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsensusResult {
    /// Final decision.
    pub accepted: bool,

    pub approval_count: usize,
    pub rejection_count: usize,
    pub total_votes: usize,

    /// `approval_count / total_votes`, or 0 with no votes.
    pub approval_ratio: f64,

    /// Sum of trust scores of approving votes (absent trust counts as 0.5).
    pub weighted_approval: f64,
    /// Sum of trust scores of rejecting votes (absent trust counts as 0.5).
    pub weighted_rejection: f64,

    #[serde(default)]
    pub suspicious_patterns: BTreeSet<SuspiciousPattern>,

    /// Strategy requested by the caller.
    pub strategy: ConsensusStrategy,
    /// Rule that actually decided. Differs from `strategy` only for `adaptive`.
    pub effective_strategy: ConsensusStrategy,
}

impl ConsensusResult {
    /// Result for a submission that required no review at all.
    pub fn auto_accepted(strategy: ConsensusStrategy) -> Self {
        Self {
            accepted: true,
            approval_count: 0,
            rejection_count: 0,
            total_votes: 0,
            approval_ratio: 0.0,
            weighted_approval: 0.0,
            weighted_rejection: 0.0,
            suspicious_patterns: BTreeSet::new(),
            strategy,
            effective_strategy: strategy,
        }
    }

    pub fn is_suspicious(&self) -> bool {
        !self.suspicious_patterns.is_empty()
    }

    pub fn has_pattern(&self, pattern: SuspiciousPattern) -> bool {
        self.suspicious_patterns.contains(&pattern)
    }

    /// Pattern tags as plain strings, in stable order.
    pub fn pattern_tags(&self) -> Vec<&'static str> {
        self.suspicious_patterns.iter().map(|p| p.as_str()).collect()
    }
}
