use std::sync::Arc;

use keystone_common::{
    review::{ConsensusContext, ConsensusResult, Submission, TrustTier, Vote},
    Result,
};

use crate::{
    config::{ReviewConfig, SessionConfig},
    consensus::calculator::ConsensusCalculator,
    gate::TrustGate,
    observer::{ReviewObserver, TracingObserver},
    session::{
        handle::{Callback, SessionHandle},
        ValidationSession,
    },
};

/// Wires the trust gate, the calculator and the observer into sessions.
///
/// Cheap to clone; holds no mutable state.
#[derive(Clone)]
pub struct ReviewEngine {
    pub gate: TrustGate,
    pub calculator: ConsensusCalculator,
    pub session: SessionConfig,
    observer: Arc<dyn ReviewObserver>,
}

impl ReviewEngine {
    pub fn new(config: &ReviewConfig, observer: Arc<dyn ReviewObserver>) -> Self {
        Self {
            gate: TrustGate::new(config.trust),
            calculator: ConsensusCalculator::new(config.detector),
            session: config.session,
            observer,
        }
    }

    pub fn observer(&self) -> Arc<dyn ReviewObserver> {
        Arc::clone(&self.observer)
    }

    pub fn trust_tier(&self, trust: f64) -> TrustTier {
        self.gate.tier(trust)
    }

    pub fn validators_required(&self, trust: f64) -> usize {
        self.gate.validators_required(trust)
    }

    pub fn calculate_named(&self, votes: &[Vote], strategy: &str, context: &ConsensusContext) -> Result<ConsensusResult> {
        self.calculator.calculate_named(votes, strategy, context)
    }

    /// Opens a synchronous session; the caller owns serialization and the deadline.
    pub fn open_session(&self, submission: Submission) -> ValidationSession {
        ValidationSession::open(submission, self)
    }

    /// Opens a session driven by its own deadline task. Requires a Tokio runtime.
    pub fn spawn_session(&self, submission: Submission, callback: Callback) -> SessionHandle {
        SessionHandle::spawn(self.open_session(submission), self.session.deadline(), callback)
    }
}

impl Default for ReviewEngine {
    fn default() -> Self {
        Self::new(&ReviewConfig::default(), Arc::new(TracingObserver))
    }
}

impl std::fmt::Debug for ReviewEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReviewEngine")
            .field("gate", &self.gate)
            .field("calculator", &self.calculator)
            .field("session", &self.session)
            .finish_non_exhaustive()
    }
}
