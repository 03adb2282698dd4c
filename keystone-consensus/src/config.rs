use std::{fs, path::Path, time::Duration};

use serde::{Deserialize, Serialize};

use keystone_common::{review::ConsensusStrategy, ReviewError, Result};

use crate::{consensus::detector::DetectorPolicy, gate::TrustPolicy};

/// Per-session settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub strategy: ConsensusStrategy,
    /// Vote collection deadline. Mandatory; zero is rejected.
    pub deadline_ms: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            strategy: ConsensusStrategy::Adaptive,
            deadline_ms: 24 * 60 * 60 * 1_000,
        }
    }
}

impl SessionConfig {
    pub fn deadline(&self) -> Duration {
        Duration::from_millis(self.deadline_ms)
    }
}

/// Full engine configuration, stored as JSON.
///
/// Every section has defaults, so a partial file (or `{}`) is valid.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReviewConfig {
    pub trust: TrustPolicy,
    pub detector: DetectorPolicy,
    pub session: SessionConfig,
}

impl ReviewConfig {
    pub fn validate(&self) -> Result<()> {
        self.trust.validate()?;

        if self.session.deadline_ms == 0 {
            return Err(ReviewError::Config("session.deadline_ms must be greater than zero".to_string()));
        }
        if self.detector.min_identical_trust < 2 {
            return Err(ReviewError::Config("detector.min_identical_trust must be at least 2".to_string()));
        }

        Ok(())
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = fs::read_to_string(path)?;
        let config: ReviewConfig = serde_json::from_str(&json)?;
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("review.json");

        let mut config = ReviewConfig::default();
        config.session.strategy = ConsensusStrategy::Quorum;
        config.session.deadline_ms = 30_000;
        config.save_to_file(&path).unwrap();

        let loaded = ReviewConfig::load_from_file(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("review.json");
        fs::write(&path, r#"{ "session": { "strategy": "supermajority" } }"#).unwrap();

        let loaded = ReviewConfig::load_from_file(&path).unwrap();
        assert_eq!(loaded.session.strategy, ConsensusStrategy::Supermajority);
        assert_eq!(loaded.session.deadline_ms, SessionConfig::default().deadline_ms);
        assert_eq!(loaded.trust, TrustPolicy::default());
    }

    #[test]
    fn test_zero_deadline_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("review.json");
        fs::write(&path, r#"{ "session": { "deadline_ms": 0 } }"#).unwrap();

        assert!(matches!(ReviewConfig::load_from_file(&path), Err(ReviewError::Config(_))));
    }

    #[test]
    fn test_unknown_strategy_in_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("review.json");
        fs::write(&path, r#"{ "session": { "strategy": "coin_flip" } }"#).unwrap();

        assert!(matches!(ReviewConfig::load_from_file(&path), Err(ReviewError::Serialization(_))));
    }
}
