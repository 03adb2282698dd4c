//! consensus
//!
//! Vote aggregation for submission review.
//!
//! The calculator turns a frozen, deduplicated vote set into an accept/reject
//! decision under one of a fixed family of strategies, and runs the
//! manipulation detector over the same set on every computation. Both are
//! pure: no shared state, no I/O, safe to call from any number of tasks.

pub mod calculator;
pub mod detector;
