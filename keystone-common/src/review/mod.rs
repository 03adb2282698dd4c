//! Review data model: votes, strategies, results and trust tiers.

pub mod result;
pub mod strategy;
pub mod submission;
pub mod tier;
pub mod vote;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use result::{ConsensusResult, SuspiciousPattern};
pub use strategy::{ConsensusContext, ConsensusStrategy};
pub use submission::Submission;
pub use tier::TrustTier;
pub use vote::{Vote, VoteSubmission, DEFAULT_TRUST_SCORE};

/// Kind of world modification carried by a submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    /// A placed structure blueprint.
    Schematic,
    /// A direct edit to one or more world chunks.
    ChunkEdit,
}

impl Default for ArtifactKind {
    fn default() -> Self {
        Self::Schematic
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ArtifactKind::Schematic => "schematic",
            ArtifactKind::ChunkEdit => "chunk_edit",
        };
        write!(f, "{}", s)
    }
}
