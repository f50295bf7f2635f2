//! Ticket routing primitives shared by the submission gateway, the priority
//! workers and the DLQ inspector.
//!
//! This crate provides the ticket model, the priority routing table, payload
//! decoding, configuration loading, the SQS queue client and the logging and shutdown
//! setup of the service binaries.

#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    missing_docs,
    dead_code
)]

/// Settings loaded from TOML or environment variables
pub mod config;
/// Ticket payload decoding
pub mod decode;
/// Deployment environment and AWS configuration
pub mod environment;
/// Message processing error taxonomy
pub mod error;
/// Tracing event capture for tests
#[cfg(feature = "test-utils")]
pub mod log_capture;
/// Queue client abstraction and implementations
pub mod queue;
/// Priority to queue routing
pub mod routing;
/// Graceful shutdown on process signals
pub mod shutdown;
/// Logging setup
pub mod telemetry;
/// Ticket model
pub mod ticket;

pub use config::{ConfigError, PollSettings, Settings, SinkConfig};
pub use decode::{
    DecodeError, Decoded, LegacyPayloadFormat, PayloadFormat, RouteKey, TicketDecoder,
};
pub use environment::Environment;
pub use error::ProcessingError;
pub use routing::{RoutingError, RoutingTable};
pub use shutdown::spawn_shutdown_listener;
pub use telemetry::init_tracing;
pub use ticket::{Priority, Ticket, TicketError, TicketFields};
