pub mod config;
pub mod consensus;
pub mod engine;
pub mod gate;
pub mod observer;
pub mod session;

pub use config::{ReviewConfig, SessionConfig};
pub use consensus::calculator::{calculate, calculate_named, ConsensusCalculator};
pub use consensus::detector::{DetectorPolicy, ManipulationDetector};
pub use engine::ReviewEngine;
pub use gate::{get_trust_tier, get_validators_required, TrustGate, TrustPolicy};
pub use observer::{NoopObserver, ReviewObserver, TracingObserver};
pub use session::{
    handle::{Callback, SessionHandle},
    pool::ReviewPool,
    CloseReason, SessionOutcome, SessionStatus, ValidationSession, VoteReceipt,
};
