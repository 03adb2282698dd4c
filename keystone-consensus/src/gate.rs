//! Admission control: how much review a submitter must pass through.

use serde::{Deserialize, Serialize};

use keystone_common::{review::TrustTier, ReviewError, Result};

/// Tier thresholds and the validator count demanded per tier.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrustPolicy {
    /// Lowest trust classified as `HIGH` (inclusive).
    pub high_threshold: f64,
    /// Lowest trust classified as `MEDIUM` (inclusive).
    pub medium_threshold: f64,
    pub high_validators: usize,
    pub medium_validators: usize,
    pub low_validators: usize,
}

impl Default for TrustPolicy {
    fn default() -> Self {
        Self {
            high_threshold: 0.9,
            medium_threshold: 0.5,
            high_validators: 0,
            medium_validators: 3,
            low_validators: 5,
        }
    }
}

impl TrustPolicy {
    pub fn validate(&self) -> Result<()> {
        let ordered = 0.0 <= self.medium_threshold
            && self.medium_threshold < self.high_threshold
            && self.high_threshold <= 1.0;
        if !ordered {
            return Err(ReviewError::Config(format!(
                "trust thresholds must satisfy 0 <= medium ({}) < high ({}) <= 1",
                self.medium_threshold, self.high_threshold
            )));
        }

        // Less trust never buys less scrutiny.
        if self.low_validators < self.medium_validators || self.medium_validators < self.high_validators {
            return Err(ReviewError::Config(format!(
                "validator counts must not increase with trust (low {}, medium {}, high {})",
                self.low_validators, self.medium_validators, self.high_validators
            )));
        }

        Ok(())
    }
}

/// Maps a submitter's trust score to a tier and a validator requirement.
///
/// Stateless; share freely across threads.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TrustGate {
    pub policy: TrustPolicy,
}

impl TrustGate {
    pub fn new(policy: TrustPolicy) -> Self {
        Self { policy }
    }

    /// Classifies `trust`, clamping it into `[0, 1]` first. Never fails.
    ///
    /// A NaN score compares false against every threshold and lands in `LOW`.
    pub fn tier(&self, trust: f64) -> TrustTier {
        let trust = trust.clamp(0.0, 1.0);
        if trust >= self.policy.high_threshold {
            TrustTier::High
        } else if trust >= self.policy.medium_threshold {
            TrustTier::Medium
        } else {
            TrustTier::Low
        }
    }

    pub fn validators_for(&self, tier: TrustTier) -> usize {
        match tier {
            TrustTier::High => self.policy.high_validators,
            TrustTier::Medium => self.policy.medium_validators,
            TrustTier::Low => self.policy.low_validators,
        }
    }

    /// Number of validator votes a submission must collect. Zero means auto-accept.
    pub fn validators_required(&self, trust: f64) -> usize {
        self.validators_for(self.tier(trust))
    }
}

/// Tier of `trust` under the default policy.
pub fn get_trust_tier(trust: f64) -> TrustTier {
    TrustGate::default().tier(trust)
}

/// Validators required for `trust` under the default policy: 0, 3 or 5.
pub fn get_validators_required(trust: f64) -> usize {
    TrustGate::default().validators_required(trust)
}
