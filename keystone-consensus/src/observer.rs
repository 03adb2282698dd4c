//! Observability sink for review sessions.
//!
//! Sessions never log through ambient global state on their own; every
//! session is handed an observer explicitly and reports its lifecycle to it.

use tracing::{debug, info, warn};

use keystone_common::{
    review::{ConsensusResult, Submission, TrustTier, Vote},
    ReviewError,
};

use crate::session::SessionOutcome;

/// Receives lifecycle events from validation sessions.
///
/// Every method defaults to a no-op so implementors pick what they care about.
pub trait ReviewObserver: Send + Sync {
    fn session_opened(&self, _submission: &Submission, _tier: TrustTier, _required: usize) {}

    fn auto_accepted(&self, _submission: &Submission) {}

    fn vote_recorded(&self, _submission_id: &str, _vote: &Vote, _collected: usize, _required: usize) {}

    fn vote_replaced(&self, _submission_id: &str, _previous: &Vote, _vote: &Vote) {}

    fn malformed_vote(&self, _submission_id: &str, _error: &ReviewError) {}

    fn late_vote(&self, _submission_id: &str, _validator_id: &str) {}

    fn suspicious_patterns(&self, _submission_id: &str, _result: &ConsensusResult) {}

    fn session_closed(&self, _outcome: &SessionOutcome) {}
}

/// Discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl ReviewObserver for NoopObserver {}

/// Forwards events to `tracing`.
///
/// Decisions and anomalies are additionally written under the `consensus`
/// target, which the node routes to its audit log.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl ReviewObserver for TracingObserver {
    fn session_opened(&self, submission: &Submission, tier: TrustTier, required: usize) {
        info!(
            "📨 Submission [{}] ({}) opened: tier {}, {} validator(s) required",
            submission.id, submission.artifact, tier, required
        );
    }

    fn auto_accepted(&self, submission: &Submission) {
        info!("✅ Submission [{}] auto-accepted: trusted submitter", submission.id);
        tracing::info!(target: "consensus", "EVENT:AUTO_ACCEPT submission_id={} trust={}", submission.id, submission.submitter_trust);
    }

    fn vote_recorded(&self, submission_id: &str, vote: &Vote, collected: usize, required: usize) {
        debug!(
            "📥 [{}] voted approved={} on [{}] ({}/{})",
            vote.validator_id, vote.approved, submission_id, collected, required
        );
    }

    fn vote_replaced(&self, submission_id: &str, previous: &Vote, vote: &Vote) {
        info!(
            "🔁 [{}] resubmitted on [{}]: approved {} -> {}",
            vote.validator_id, submission_id, previous.approved, vote.approved
        );
    }

    fn malformed_vote(&self, submission_id: &str, error: &ReviewError) {
        warn!("⚠️ Rejected vote on [{}]: {}", submission_id, error);
    }

    fn late_vote(&self, submission_id: &str, validator_id: &str) {
        warn!("⚠️ Ignored late vote from [{}] on closed submission [{}]", validator_id, submission_id);
        tracing::info!(target: "consensus", "EVENT:LATE_VOTE submission_id={} validator={}", submission_id, validator_id);
    }

    fn suspicious_patterns(&self, submission_id: &str, result: &ConsensusResult) {
        warn!("🚨 Suspicious voting on [{}]: {:?}", submission_id, result.pattern_tags());
        tracing::info!(target: "consensus", "EVENT:SUSPICIOUS submission_id={} patterns={:?}", submission_id, result.pattern_tags());
    }

    fn session_closed(&self, outcome: &SessionOutcome) {
        let result = &outcome.result;
        info!(
            "🗳️ Submission [{}] closed ({:?}): {}/{} approvals under {}: {}",
            outcome.submission_id,
            outcome.reason,
            result.approval_count,
            result.total_votes,
            result.effective_strategy,
            if result.accepted { "✅ ACCEPTED" } else { "❌ REJECTED" }
        );
        tracing::info!(
            target: "consensus",
            "EVENT:CLOSE submission_id={} reason={:?} accepted={} approvals={} rejections={} strategy={}",
            outcome.submission_id, outcome.reason, result.accepted, result.approval_count, result.rejection_count, result.effective_strategy
        );
    }
}
