use std::{future, sync::Arc, time::Duration};

use tokio::sync::{oneshot, Mutex};

use keystone_common::{
    review::{ConsensusResult, VoteSubmission},
    Result,
};

use super::{CloseReason, SessionOutcome, SessionStatus, ValidationSession, VoteReceipt};

/// Invoked once per session with its final outcome.
pub type Callback = Arc<dyn Fn(SessionOutcome) + Send + Sync>;

/// Async, shareable driver around one [`ValidationSession`].
///
/// Vote arrivals are serialized on the session mutex. A deadline task closes
/// the session if the threshold is not reached in time; reaching the threshold
/// or forcing closure cancels it. The callback fires exactly once, from
/// whichever path closed the session.
#[derive(Clone)]
pub struct SessionHandle {
    submission_id: String,
    session: Arc<Mutex<ValidationSession>>,
    cancel_deadline: Arc<Mutex<Option<oneshot::Sender<()>>>>,
    callback: Callback,
}

impl SessionHandle {
    /// Takes ownership of `session` and arms its deadline. Must be called
    /// within a Tokio runtime.
    ///
    /// A session that is already closed (auto-accepted) reports immediately
    /// and arms nothing.
    pub fn spawn(session: ValidationSession, deadline: Duration, callback: Callback) -> Self {
        let (handle, closed) = Self::arm(session, deadline, callback);
        if let Some(outcome) = closed {
            (handle.callback)(outcome);
        }
        handle
    }

    /// Like [`spawn`](Self::spawn), but hands an already-closed outcome back to
    /// the caller instead of invoking the callback, so it can be reported
    /// after the caller releases its own locks.
    pub(crate) fn arm(
        session: ValidationSession,
        deadline: Duration,
        callback: Callback,
    ) -> (Self, Option<SessionOutcome>) {
        let submission_id = session.submission_id().to_string();
        let closed = session.outcome().cloned();
        let session = Arc::new(Mutex::new(session));

        if closed.is_some() {
            let handle = Self {
                submission_id,
                session,
                cancel_deadline: Arc::new(Mutex::new(None)),
                callback,
            };
            return (handle, closed);
        }

        let (cancel_tx, cancel_rx) = oneshot::channel::<()>();

        let timer_session = Arc::clone(&session);
        let timer_callback = Arc::clone(&callback);
        tokio::spawn(async move {
            // Only an explicit send cancels; dropping every handle does not.
            let cancelled = async {
                if cancel_rx.await.is_err() {
                    future::pending::<()>().await;
                }
            };

            tokio::select! {
                _ = tokio::time::sleep(deadline) => {
                    let outcome = {
                        let mut session = timer_session.lock().await;
                        if session.is_closed() {
                            None
                        } else {
                            Some(session.close(CloseReason::DeadlineElapsed))
                        }
                    };
                    if let Some(outcome) = outcome {
                        timer_callback(outcome);
                    }
                }
                _ = cancelled => {}
            }
        });

        let handle = Self {
            submission_id,
            session,
            cancel_deadline: Arc::new(Mutex::new(Some(cancel_tx))),
            callback,
        };
        (handle, None)
    }

    pub fn submission_id(&self) -> &str {
        &self.submission_id
    }

    /// See [`ValidationSession::submit_vote`].
    pub async fn submit_vote(
        &self,
        validator_id: impl Into<String>,
        approved: bool,
        trust_score: Option<f64>,
        voted_at: Option<u64>,
    ) -> Result<VoteReceipt> {
        self.submit_raw(VoteSubmission::new(validator_id, approved, trust_score, voted_at))
            .await
    }

    pub async fn submit_raw(&self, raw: VoteSubmission) -> Result<VoteReceipt> {
        let receipt = self.session.lock().await.submit_raw(raw)?;

        if let VoteReceipt::Closed(outcome) = &receipt {
            self.finish(outcome.clone()).await;
        }

        Ok(receipt)
    }

    /// Closes the session now. Idempotent; only the first closure reports.
    pub async fn force_close(&self) -> ConsensusResult {
        let (outcome, transitioned) = {
            let mut session = self.session.lock().await;
            let transitioned = !session.is_closed();
            (session.close(CloseReason::Forced), transitioned)
        };

        if transitioned {
            self.finish(outcome.clone()).await;
        }

        outcome.result
    }

    pub async fn status(&self) -> SessionStatus {
        self.session.lock().await.status()
    }

    pub async fn votes_collected(&self) -> usize {
        self.session.lock().await.votes_collected()
    }

    pub async fn outcome(&self) -> Option<SessionOutcome> {
        self.session.lock().await.outcome().cloned()
    }

    pub async fn is_closed(&self) -> bool {
        self.session.lock().await.is_closed()
    }

    async fn finish(&self, outcome: SessionOutcome) {
        if let Some(sender) = self.cancel_deadline.lock().await.take() {
            let _ = sender.send(());
        }
        (self.callback)(outcome);
    }
}

impl std::fmt::Debug for SessionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionHandle")
            .field("submission_id", &self.submission_id)
            .finish_non_exhaustive()
    }
}
