use std::{fs, path::Path, sync::Arc, time::Duration};

use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{info, warn};

use keystone_common::{
    review::{ArtifactKind, ConsensusContext, ConsensusResult, Submission, TrustTier, Vote, VoteSubmission},
    ReviewError, Result,
};
use keystone_consensus::{session::VoteRegistry, Callback, ReviewEngine, SessionOutcome};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TierReport {
    pub trust: f64,
    pub tier: TrustTier,
    pub validators_required: usize,
}

pub fn load_votes<P: AsRef<Path>>(path: P) -> Result<Vec<VoteSubmission>> {
    let json = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&json)?)
}

pub fn run_tier(engine: &ReviewEngine, trust: f64) -> TierReport {
    TierReport {
        trust,
        tier: engine.trust_tier(trust),
        validators_required: engine.validators_required(trust),
    }
}

/// Evaluates a vote file. The file is treated like a transport feed: malformed
/// entries fail the run and later votes from the same validator win.
pub fn run_calculate(
    engine: &ReviewEngine,
    votes: &[VoteSubmission],
    strategy: &str,
    submitter_trust: Option<f64>,
) -> Result<ConsensusResult> {
    let mut registry = VoteRegistry::new();
    for raw in votes {
        let vote = Vote::try_from(raw.clone())?;
        if let Some(previous) = registry.register_vote(vote) {
            warn!("🔁 Duplicate vote from [{}], keeping the latest", previous.validator_id);
        }
    }

    let context = ConsensusContext { submitter_trust };
    engine.calculate_named(&registry.snapshot(), strategy, &context)
}

pub struct ReplayOptions {
    pub submission_id: Option<String>,
    pub artifact: ArtifactKind,
    pub submitter_trust: f64,
    pub pace: Duration,
    pub await_deadline: bool,
}

/// Drives one session with the given votes and returns its outcome.
///
/// Rejected votes (malformed or late) are logged and skipped, as the
/// transport would. Unless `await_deadline` is set, the session is closed as
/// soon as the feed runs dry.
pub async fn run_replay(
    engine: &ReviewEngine,
    votes: Vec<VoteSubmission>,
    options: ReplayOptions,
) -> Result<SessionOutcome> {
    let submission_id = options
        .submission_id
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
    let submission = Submission::new(submission_id, options.artifact, options.submitter_trust);

    let (tx, mut rx) = mpsc::unbounded_channel::<SessionOutcome>();
    let callback: Callback = Arc::new(move |outcome| {
        let _ = tx.send(outcome);
    });

    let handle = engine.spawn_session(submission, callback);
    info!("▶️ Replaying {} vote(s) into [{}]", votes.len(), handle.submission_id());

    for (i, raw) in votes.into_iter().enumerate() {
        if i > 0 && !options.pace.is_zero() {
            tokio::time::sleep(options.pace).await;
        }
        match handle.submit_raw(raw).await {
            Ok(_) => {}
            Err(e @ ReviewError::LateVote { .. }) | Err(e @ ReviewError::MalformedVote(_)) => {
                warn!("Skipped vote: {}", e);
            }
            Err(e) => return Err(e),
        }
    }

    if !options.await_deadline {
        handle.force_close().await;
    }

    rx.recv()
        .await
        .ok_or_else(|| ReviewError::Config("session ended without an outcome".to_string()))
}
