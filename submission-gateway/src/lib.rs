//! HTTP intake for support tickets: validates a submitted form and enqueues
//! the ticket on its priority queue.

#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    missing_docs,
    dead_code
)]

/// Per-client submission rate limiting
pub mod rate_limit;
/// HTTP route handlers
pub mod routes;
/// Router assembly and server startup
pub mod server;
/// Shared handler state
pub mod state;
/// API types
pub mod types;
