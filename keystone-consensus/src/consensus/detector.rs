use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use keystone_common::review::{SuspiciousPattern, Vote};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorPolicy {
    /// Trust-bearing votes needed before identical scores count as collusion.
    pub min_identical_trust: usize,
    /// Votes spread over less than this many milliseconds count as rapid.
    pub rapid_window_ms: u64,
}

impl Default for DetectorPolicy {
    fn default() -> Self {
        Self {
            min_identical_trust: 3,
            rapid_window_ms: 1_000,
        }
    }
}

/// Heuristic checks for collusion and scripted voting over a completed vote set.
///
/// Findings are advisory; they never feed back into the decision.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ManipulationDetector {
    pub policy: DetectorPolicy,
}

impl ManipulationDetector {
    pub fn new(policy: DetectorPolicy) -> Self {
        Self { policy }
    }

    /// Runs every check and returns the union of raised patterns.
    pub fn inspect(&self, votes: &[Vote]) -> BTreeSet<SuspiciousPattern> {
        let mut patterns = BTreeSet::new();

        if self.identical_trust_scores(votes) {
            patterns.insert(SuspiciousPattern::IdenticalTrustScores);
        }
        if self.rapid_voting(votes) {
            patterns.insert(SuspiciousPattern::RapidVoting);
        }

        patterns
    }

    /// Every trust-bearing vote carries the same score, and there are enough
    /// of them to matter. Votes without a score are ignored.
    pub fn identical_trust_scores(&self, votes: &[Vote]) -> bool {
        let scores: Vec<f64> = votes.iter().filter_map(|v| v.trust_score).collect();
        if scores.len() < self.policy.min_identical_trust.max(2) {
            return false;
        }

        let first = scores[0];
        scores.iter().all(|s| *s == first)
    }

    /// The whole timestamped vote set fits in the rapid window. Needs at least
    /// two timestamps.
    pub fn rapid_voting(&self, votes: &[Vote]) -> bool {
        let mut stamps = votes.iter().filter_map(|v| v.voted_at);
        let Some(first) = stamps.next() else {
            return false;
        };

        let (mut earliest, mut latest, mut count) = (first, first, 1usize);
        for t in stamps {
            earliest = earliest.min(t);
            latest = latest.max(t);
            count += 1;
        }

        count >= 2 && latest - earliest < self.policy.rapid_window_ms
    }
}
