//! Queue operations for ticket routing
//!
//! This module provides the [`QueueClient`] contract used by the gateway, the
//! workers and the DLQ inspector, its AWS SQS implementation and, behind the
//! `test-utils` feature, an in-memory double with SQS lease semantics.

/// Queue client contract
pub mod client;
/// Error types for queue operations
pub mod error;
/// In-memory queue double
#[cfg(feature = "test-utils")]
pub mod memory;
/// AWS SQS queue client
pub mod sqs_queue;
/// Common types for queue operations
pub mod types;

pub use client::QueueClient;
pub use error::{QueueError, QueueResult};
#[cfg(feature = "test-utils")]
pub use memory::{FailurePlan, InMemoryQueue};
pub use sqs_queue::SqsQueueClient;
pub use types::{clamp_batch_size, QueueMessage, MAX_BATCH_SIZE, MAX_WAIT_TIME_SECONDS};
