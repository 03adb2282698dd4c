use std::fmt;

use serde::{Deserialize, Serialize};

/// Trust classification of a submitter. Derived from a trust score, never stored.
///
/// Variants are ordered from least to most trusted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TrustTier {
    Low,
    Medium,
    High,
}

impl TrustTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrustTier::Low => "LOW",
            TrustTier::Medium => "MEDIUM",
            TrustTier::High => "HIGH",
        }
    }
}

impl fmt::Display for TrustTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
