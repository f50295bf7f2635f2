//! Priority queue consumer that delivers tickets to a per-priority sink.

#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    missing_docs,
    dead_code
)]

/// Health check HTTP server
pub mod health;
/// Downstream delivery targets
pub mod sink;
/// Generic priority worker loop
pub mod worker;

pub use sink::{SinkAdapter, SinkError};
pub use worker::{BatchReport, PriorityWorker};
