//! session
//!
//! Lifecycle of one submission's review.
//!
//! ```text
//! Created ──(0 required)──────────────────────────────► Accepted
//!    │
//!    ▼
//! AwaitingVotes ──(threshold | deadline | forced)──► Closing ──► Accepted / Rejected
//! ```
//!
//! A session is single-writer: [`ValidationSession`] takes `&mut self` and the
//! async [`handle::SessionHandle`] serializes access behind one mutex per
//! submission. Different submissions never share state.

pub mod handle;
pub mod pool;
mod registry;
mod validation;

use serde::{Deserialize, Serialize};

use keystone_common::review::{ArtifactKind, ConsensusResult, TrustTier};

pub use registry::VoteRegistry;
pub use validation::ValidationSession;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SessionStatus {
    Created,
    AwaitingVotes,
    Closing,
    Accepted,
    Rejected,
}

/// Why vote collection stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CloseReason {
    /// The submitter was trusted enough to skip review.
    AutoAccepted,
    /// The required number of distinct validators voted.
    ThresholdReached,
    /// The collection deadline fired first.
    DeadlineElapsed,
    /// A collaborator closed the session explicitly.
    Forced,
}

/// Final, frozen state of a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionOutcome {
    pub submission_id: String,
    pub artifact: ArtifactKind,
    pub tier: TrustTier,
    pub validators_required: usize,
    pub status: SessionStatus,
    pub reason: CloseReason,
    pub result: ConsensusResult,
    /// Milliseconds since the UNIX epoch.
    pub closed_at: u64,
}

/// What happened to an accepted vote.
#[derive(Debug, Clone, PartialEq)]
pub enum VoteReceipt {
    /// First vote from this validator.
    Recorded { collected: usize, required: usize },
    /// The validator had voted before; the new vote replaced the old one.
    Replaced { collected: usize, required: usize },
    /// This vote completed the required count and closed the session.
    Closed(SessionOutcome),
}
