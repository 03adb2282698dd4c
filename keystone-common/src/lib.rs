//! keystone-common
//!
//! Value types shared by the review engine and its collaborators.
//!
//! Everything here is a plain value object: votes, strategies, results and
//! trust tiers are constructed fresh per computation and never carry hidden
//! state between invocations.

pub mod error;
pub mod review;
pub mod utils;

pub use error::{ReviewError, Result};
