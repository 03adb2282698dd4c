use serde::{Deserialize, Serialize};

use super::ArtifactKind;

/// A world-modification artifact awaiting review.
///
/// The artifact body itself lives in content-addressed storage; only the
/// identifier and the submitter's trust travel with the review.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Submission {
    pub id: String,
    #[serde(default)]
    pub artifact: ArtifactKind,
    /// Submitter trust in `[0, 1]`, supplied by the caller.
    pub submitter_trust: f64,
}

impl Submission {
    pub fn new(id: impl Into<String>, artifact: ArtifactKind, submitter_trust: f64) -> Self {
        Self {
            id: id.into(),
            artifact,
            submitter_trust,
        }
    }
}
