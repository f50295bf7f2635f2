//! Replays dead-lettered tickets to the live queue of their declared priority.

#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    missing_docs,
    dead_code
)]

/// DLQ inspection and replay
pub mod inspector;

pub use inspector::{DlqInspector, InspectReport};
