use serde::{Deserialize, Serialize};

use crate::error::{ReviewError, Result};

/// Weight applied to a vote that carries no trust score.
pub const DEFAULT_TRUST_SCORE: f64 = 0.5;

/// One validator's judgment on one submission.
///
/// A vote set handed to the calculator is assumed to be deduplicated by
/// `validator_id` already.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vote {
    pub validator_id: String,
    pub approved: bool,
    /// Validator trust in `[0, 1]`. Not validated: out-of-range values are
    /// carried through to the weighted sums untouched.
    #[serde(default)]
    pub trust_score: Option<f64>,
    /// Milliseconds since the UNIX epoch.
    #[serde(default)]
    pub voted_at: Option<u64>,
}

impl Vote {
    pub fn new(validator_id: impl Into<String>, approved: bool) -> Self {
        Self {
            validator_id: validator_id.into(),
            approved,
            trust_score: None,
            voted_at: None,
        }
    }

    pub fn with_trust(mut self, trust_score: f64) -> Self {
        self.trust_score = Some(trust_score);
        self
    }

    pub fn at(mut self, voted_at: u64) -> Self {
        self.voted_at = Some(voted_at);
        self
    }

    /// Weight of this vote under trust-weighted aggregation.
    pub fn weight(&self) -> f64 {
        self.trust_score.unwrap_or(DEFAULT_TRUST_SCORE)
    }
}

/// A vote as delivered by the transport, before ingestion checks.
///
/// Every field is optional on the wire; `validator_id` and `approved` are
/// required for the submission to become a [`Vote`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VoteSubmission {
    #[serde(default)]
    pub validator_id: Option<String>,
    #[serde(default)]
    pub approved: Option<bool>,
    #[serde(default)]
    pub trust_score: Option<f64>,
    #[serde(default)]
    pub voted_at: Option<u64>,
}

impl VoteSubmission {
    pub fn new(
        validator_id: impl Into<String>,
        approved: bool,
        trust_score: Option<f64>,
        voted_at: Option<u64>,
    ) -> Self {
        Self {
            validator_id: Some(validator_id.into()),
            approved: Some(approved),
            trust_score,
            voted_at,
        }
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

impl From<Vote> for VoteSubmission {
    fn from(v: Vote) -> Self {
        Self {
            validator_id: Some(v.validator_id),
            approved: Some(v.approved),
            trust_score: v.trust_score,
            voted_at: v.voted_at,
        }
    }
}

impl TryFrom<VoteSubmission> for Vote {
    type Error = ReviewError;

    fn try_from(raw: VoteSubmission) -> Result<Self> {
        let validator_id = match raw.validator_id {
            Some(id) if !id.trim().is_empty() => id,
            Some(_) => return Err(ReviewError::MalformedVote("empty validator_id".to_string())),
            None => return Err(ReviewError::MalformedVote("missing validator_id".to_string())),
        };

        let approved = raw.approved.ok_or_else(|| {
            ReviewError::MalformedVote(format!("missing approved flag from {}", validator_id))
        })?;

        Ok(Vote {
            validator_id,
            approved,
            trust_score: raw.trust_score,
            voted_at: raw.voted_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weight_defaults_to_neutral() {
        assert_eq!(Vote::new("v1", true).weight(), DEFAULT_TRUST_SCORE);
        assert_eq!(Vote::new("v1", true).with_trust(0.8).weight(), 0.8);
    }

    #[test]
    fn test_weight_keeps_out_of_range_trust() {
        let vote = Vote::new("v1", false).with_trust(-0.25);
        assert_eq!(vote.weight(), -0.25);
    }

    #[test]
    fn test_submission_requires_validator_id() {
        let raw = VoteSubmission { approved: Some(true), ..Default::default() };
        assert!(matches!(Vote::try_from(raw), Err(ReviewError::MalformedVote(_))));

        let raw = VoteSubmission {
            validator_id: Some("   ".into()),
            approved: Some(true),
            ..Default::default()
        };
        assert!(matches!(Vote::try_from(raw), Err(ReviewError::MalformedVote(_))));
    }

    #[test]
    fn test_submission_requires_approved() {
        let raw = VoteSubmission::from_json(r#"{"validator_id":"v9","trust_score":0.7}"#).unwrap();
        let err = Vote::try_from(raw).unwrap_err();
        assert!(err.to_string().contains("v9"));
    }

    #[test]
    fn test_submission_from_json() {
        let raw = VoteSubmission::from_json(
            r#"{"validator_id":"v1","approved":false,"trust_score":0.3,"voted_at":1000}"#,
        )
        .unwrap();
        let vote = Vote::try_from(raw).unwrap();
        assert_eq!(vote, Vote::new("v1", false).with_trust(0.3).at(1000));
    }
}
