//! The guard over asynchronous primitives.
//!
//! Consumer stores in particular are often backed by a database or a remote service. This module
//! offers async versions of the primitive traits and drives the same `guard::Guard` state machine
//! with them. Every store lookup is bounded by the configured lookup timeout, a lookup running
//! longer counts as a failed store and ends the evaluation with a protocol error.
//!
//! The timeout relies on `tokio`, so evaluations must run within a tokio runtime that has its
//! time driver enabled.
pub mod endpoint;
pub mod guard;
pub mod primitives;

pub use self::endpoint::GuardFlow;
pub use self::guard::{evaluate, protect, Endpoint};
