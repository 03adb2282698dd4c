use std::sync::Arc;

use keystone_common::{
    review::{
        ConsensusContext, ConsensusResult, ConsensusStrategy, Submission, TrustTier, Vote, VoteSubmission,
    },
    utils::time::current_time_millis,
    ReviewError, Result,
};

use crate::{consensus::calculator::ConsensusCalculator, engine::ReviewEngine, observer::ReviewObserver};

use super::{registry::VoteRegistry, CloseReason, SessionOutcome, SessionStatus, VoteReceipt};

/// Review state of a single submission.
///
/// Collects deduplicated votes until the trust gate's requirement is met or a
/// collaborator closes it, then freezes the vote set and computes the result
/// exactly once.
pub struct ValidationSession {
    submission: Submission,
    tier: TrustTier,
    required: usize,
    strategy: ConsensusStrategy,
    calculator: ConsensusCalculator,
    registry: VoteRegistry,
    status: SessionStatus,
    outcome: Option<SessionOutcome>,
    observer: Arc<dyn ReviewObserver>,
}

impl ValidationSession {
    /// Creates the session and applies admission control. A submitter that
    /// needs zero validators is accepted before any vote is collected.
    pub fn open(submission: Submission, engine: &ReviewEngine) -> Self {
        let tier = engine.gate.tier(submission.submitter_trust);
        let required = engine.gate.validators_for(tier);

        let mut session = Self {
            submission,
            tier,
            required,
            strategy: engine.session.strategy,
            calculator: engine.calculator,
            registry: VoteRegistry::new(),
            status: SessionStatus::Created,
            outcome: None,
            observer: engine.observer(),
        };

        session.observer.session_opened(&session.submission, tier, required);

        if required == 0 {
            session.observer.auto_accepted(&session.submission);
            let outcome = session.finalize(CloseReason::AutoAccepted, ConsensusResult::auto_accepted(session.strategy));
            session.observer.session_closed(&outcome);
        } else {
            session.status = SessionStatus::AwaitingVotes;
        }

        session
    }

    pub fn submission_id(&self) -> &str {
        &self.submission.id
    }

    pub fn tier(&self) -> TrustTier {
        self.tier
    }

    pub fn validators_required(&self) -> usize {
        self.required
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn is_closed(&self) -> bool {
        self.outcome.is_some()
    }

    pub fn votes_collected(&self) -> usize {
        self.registry.len()
    }

    pub fn outcome(&self) -> Option<&SessionOutcome> {
        self.outcome.as_ref()
    }

    /// Records one validator's vote.
    ///
    /// Fails with `LateVote` once the session is closed and with
    /// `MalformedVote` when `validator_id` is blank; neither touches the vote set.
    pub fn submit_vote(
        &mut self,
        validator_id: impl Into<String>,
        approved: bool,
        trust_score: Option<f64>,
        voted_at: Option<u64>,
    ) -> Result<VoteReceipt> {
        self.submit_raw(VoteSubmission::new(validator_id, approved, trust_score, voted_at))
    }

    /// Records a vote exactly as delivered by the transport.
    pub fn submit_raw(&mut self, raw: VoteSubmission) -> Result<VoteReceipt> {
        if self.is_closed() {
            let validator_id = raw.validator_id.unwrap_or_else(|| "<unknown>".to_string());
            self.observer.late_vote(&self.submission.id, &validator_id);
            return Err(ReviewError::LateVote {
                submission_id: self.submission.id.clone(),
                validator_id,
            });
        }

        let vote = match Vote::try_from(raw) {
            Ok(vote) => vote,
            Err(e) => {
                self.observer.malformed_vote(&self.submission.id, &e);
                return Err(e);
            }
        };

        let previous = self.registry.register_vote(vote.clone());
        let collected = self.registry.len();
        let required = self.required;

        match &previous {
            Some(previous) => self.observer.vote_replaced(&self.submission.id, previous, &vote),
            None => self.observer.vote_recorded(&self.submission.id, &vote, collected, required),
        }

        if collected >= required {
            return Ok(VoteReceipt::Closed(self.close(CloseReason::ThresholdReached)));
        }

        Ok(match previous {
            Some(_) => VoteReceipt::Replaced { collected, required },
            None => VoteReceipt::Recorded { collected, required },
        })
    }

    /// Closes collection now and returns the result. Idempotent: a closed
    /// session returns its frozen result unchanged.
    pub fn force_close(&mut self) -> ConsensusResult {
        self.close(CloseReason::Forced).result
    }

    /// Freezes the vote set and computes the outcome. Only the first call
    /// computes anything; later calls return the stored outcome whatever
    /// `reason` they pass.
    pub fn close(&mut self, reason: CloseReason) -> SessionOutcome {
        if let Some(outcome) = &self.outcome {
            return outcome.clone();
        }

        self.status = SessionStatus::Closing;

        let votes = self.registry.snapshot();
        let context = ConsensusContext::with_submitter_trust(self.submission.submitter_trust);
        // Zero votes never accept, so a silent deadline rejects.
        let result = self.calculator.calculate(&votes, self.strategy, &context);

        if result.is_suspicious() {
            self.observer.suspicious_patterns(&self.submission.id, &result);
        }

        let outcome = self.finalize(reason, result);
        self.observer.session_closed(&outcome);
        outcome
    }

    fn finalize(&mut self, reason: CloseReason, result: ConsensusResult) -> SessionOutcome {
        self.status = if result.accepted {
            SessionStatus::Accepted
        } else {
            SessionStatus::Rejected
        };

        let outcome = SessionOutcome {
            submission_id: self.submission.id.clone(),
            artifact: self.submission.artifact,
            tier: self.tier,
            validators_required: self.required,
            status: self.status,
            reason,
            result,
            closed_at: current_time_millis(),
        };
        self.outcome = Some(outcome.clone());
        outcome
    }
}

impl std::fmt::Debug for ValidationSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValidationSession")
            .field("submission", &self.submission)
            .field("tier", &self.tier)
            .field("required", &self.required)
            .field("strategy", &self.strategy)
            .field("votes", &self.registry.len())
            .field("status", &self.status)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::ReviewConfig, observer::NoopObserver};
    use keystone_common::review::{ArtifactKind, SuspiciousPattern};

    fn engine(strategy: ConsensusStrategy) -> ReviewEngine {
        let mut config = ReviewConfig::default();
        config.session.strategy = strategy;
        ReviewEngine::new(&config, Arc::new(NoopObserver))
    }

    fn submission(trust: f64) -> Submission {
        Submission::new("sub-1", ArtifactKind::Schematic, trust)
    }

    #[test]
    fn test_high_trust_is_auto_accepted() {
        let session = engine(ConsensusStrategy::Adaptive).open_session(submission(0.95));

        assert_eq!(session.status(), SessionStatus::Accepted);
        assert_eq!(session.validators_required(), 0);
        let outcome = session.outcome().unwrap();
        assert_eq!(outcome.reason, CloseReason::AutoAccepted);
        assert!(outcome.result.accepted);
        assert_eq!(outcome.result.total_votes, 0);
    }

    #[test]
    fn test_medium_trust_closes_at_three_votes() {
        let mut session = engine(ConsensusStrategy::SimpleMajority).open_session(submission(0.7));
        assert_eq!(session.status(), SessionStatus::AwaitingVotes);
        assert_eq!(session.tier(), TrustTier::Medium);

        assert_eq!(
            session.submit_vote("v1", true, Some(0.8), None).unwrap(),
            VoteReceipt::Recorded { collected: 1, required: 3 }
        );
        session.submit_vote("v2", false, Some(0.6), None).unwrap();

        match session.submit_vote("v3", true, Some(0.7), None).unwrap() {
            VoteReceipt::Closed(outcome) => {
                assert_eq!(outcome.reason, CloseReason::ThresholdReached);
                assert_eq!(outcome.status, SessionStatus::Accepted);
                assert_eq!(outcome.result.approval_count, 2);
            }
            other => panic!("expected closure, got {:?}", other),
        }
    }

    #[test]
    fn test_low_trust_needs_five_distinct_validators() {
        let mut session = engine(ConsensusStrategy::Supermajority).open_session(submission(0.2));

        for i in 0..4 {
            session.submit_vote(format!("v{}", i), true, None, None).unwrap();
        }
        // Resubmission does not count toward the threshold.
        let receipt = session.submit_vote("v0", false, None, None).unwrap();
        assert_eq!(receipt, VoteReceipt::Replaced { collected: 4, required: 5 });
        assert!(!session.is_closed());

        let receipt = session.submit_vote("v4", true, None, None).unwrap();
        let VoteReceipt::Closed(outcome) = receipt else {
            panic!("expected closure");
        };
        // v0 flipped to reject: 4 of 5 still clears two thirds.
        assert_eq!(outcome.result.approval_count, 4);
        assert!(outcome.result.accepted);
    }

    #[test]
    fn test_late_vote_is_discarded() {
        let mut session = engine(ConsensusStrategy::SimpleMajority).open_session(submission(0.6));
        session.submit_vote("v1", false, None, None).unwrap();
        let frozen = session.force_close();
        assert!(!frozen.accepted);

        let err = session.submit_vote("v2", true, None, None).unwrap_err();
        assert!(matches!(err, ReviewError::LateVote { ref validator_id, .. } if validator_id == "v2"));
        assert_eq!(session.force_close(), frozen);
        assert_eq!(session.votes_collected(), 1);
    }

    #[test]
    fn test_votes_after_auto_accept_are_late() {
        let mut session = engine(ConsensusStrategy::Adaptive).open_session(submission(1.0));
        assert!(matches!(
            session.submit_vote("v1", false, None, None),
            Err(ReviewError::LateVote { .. })
        ));
        assert_eq!(session.status(), SessionStatus::Accepted);
    }

    #[test]
    fn test_malformed_vote_never_reaches_the_set() {
        let mut session = engine(ConsensusStrategy::SimpleMajority).open_session(submission(0.6));

        let missing_approval = VoteSubmission {
            validator_id: Some("v1".into()),
            ..Default::default()
        };
        assert!(matches!(session.submit_raw(missing_approval), Err(ReviewError::MalformedVote(_))));
        assert!(matches!(session.submit_vote("", true, None, None), Err(ReviewError::MalformedVote(_))));
        assert_eq!(session.votes_collected(), 0);
        assert_eq!(session.status(), SessionStatus::AwaitingVotes);
    }

    #[test]
    fn test_close_without_votes_rejects() {
        let mut session = engine(ConsensusStrategy::TrustWeighted).open_session(submission(0.1));
        let outcome = session.close(CloseReason::DeadlineElapsed);
        assert_eq!(outcome.status, SessionStatus::Rejected);
        assert_eq!(outcome.reason, CloseReason::DeadlineElapsed);

        // Second close keeps the first reason.
        assert_eq!(session.close(CloseReason::Forced).reason, CloseReason::DeadlineElapsed);
    }

    #[test]
    fn test_adaptive_uses_submitter_trust() {
        // Medium submitter: simple majority, 2 of 3 accepts.
        let mut session = engine(ConsensusStrategy::Adaptive).open_session(submission(0.6));
        session.submit_vote("a", true, None, None).unwrap();
        session.submit_vote("b", false, None, None).unwrap();
        session.submit_vote("c", true, None, None).unwrap();
        let outcome = session.outcome().unwrap();
        assert!(outcome.result.accepted);
        assert_eq!(outcome.result.effective_strategy, ConsensusStrategy::SimpleMajority);
    }

    #[test]
    fn test_suspicious_patterns_travel_with_outcome() {
        let mut session = engine(ConsensusStrategy::SimpleMajority).open_session(submission(0.6));
        for (i, id) in ["a", "b", "c"].iter().enumerate() {
            session.submit_vote(*id, true, Some(0.5), Some(1_000 + i as u64 * 100)).unwrap();
        }
        let outcome = session.outcome().unwrap();
        assert!(outcome.result.accepted);
        assert!(outcome.result.has_pattern(SuspiciousPattern::IdenticalTrustScores));
        assert!(outcome.result.has_pattern(SuspiciousPattern::RapidVoting));
    }
}
