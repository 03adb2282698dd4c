use std::{
    collections::{hash_map::Entry, HashMap},
    sync::Arc,
};

use tokio::sync::RwLock;

use keystone_common::{
    review::{ConsensusResult, Submission, VoteSubmission},
    ReviewError, Result,
};

use crate::engine::ReviewEngine;

use super::{
    handle::{Callback, SessionHandle},
    SessionOutcome, VoteReceipt,
};

/// Live review sessions keyed by submission id.
///
/// The map lock is held only to look a handle up; vote processing runs on the
/// per-session mutex, so submissions never wait on each other.
pub struct ReviewPool {
    engine: ReviewEngine,
    sessions: RwLock<HashMap<String, SessionHandle>>,
    callback: Callback,
}

impl ReviewPool {
    pub fn new(engine: ReviewEngine, callback: Callback) -> Self {
        Self {
            engine,
            sessions: RwLock::new(HashMap::new()),
            callback,
        }
    }

    pub fn engine(&self) -> &ReviewEngine {
        &self.engine
    }

    /// Opens a review for `submission`, or returns the session already open
    /// under the same id.
    ///
    /// The completion callback of an auto-accepted submission runs after the
    /// pool lock is released, so it may call back into the pool.
    pub async fn open(&self, submission: Submission) -> SessionHandle {
        let (handle, closed) = {
            let mut sessions = self.sessions.write().await;
            match sessions.entry(submission.id.clone()) {
                Entry::Occupied(existing) => return existing.get().clone(),
                Entry::Vacant(slot) => {
                    let session = self.engine.open_session(submission);
                    let (handle, closed) =
                        SessionHandle::arm(session, self.engine.session.deadline(), Arc::clone(&self.callback));
                    slot.insert(handle.clone());
                    (handle, closed)
                }
            }
        };

        if let Some(outcome) = closed {
            (self.callback)(outcome);
        }
        handle
    }

    pub async fn get(&self, submission_id: &str) -> Option<SessionHandle> {
        self.sessions.read().await.get(submission_id).cloned()
    }

    /// Routes a transport vote to its session.
    pub async fn submit_vote(&self, submission_id: &str, raw: VoteSubmission) -> Result<VoteReceipt> {
        self.lookup(submission_id).await?.submit_raw(raw).await
    }

    /// Closes one session immediately; used by the deadline scheduler or by operators.
    pub async fn force_close(&self, submission_id: &str) -> Result<ConsensusResult> {
        Ok(self.lookup(submission_id).await?.force_close().await)
    }

    /// Drops every closed session from the pool and returns their outcomes.
    pub async fn remove_finalized(&self) -> Vec<SessionOutcome> {
        let handles: Vec<SessionHandle> = self.sessions.read().await.values().cloned().collect();

        let mut finalized = Vec::new();
        for handle in handles {
            if let Some(outcome) = handle.outcome().await {
                finalized.push(outcome);
            }
        }

        let mut sessions = self.sessions.write().await;
        for outcome in &finalized {
            sessions.remove(&outcome.submission_id);
        }
        finalized
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    async fn lookup(&self, submission_id: &str) -> Result<SessionHandle> {
        self.get(submission_id)
            .await
            .ok_or_else(|| ReviewError::UnknownSubmission(submission_id.to_string()))
    }
}
