use thiserror::Error;

use crate::{decode::DecodeError, queue::QueueError, routing::RoutingError};

/// Outcome classes for a message that was not processed
///
/// None of these are deleted from their queue by the core. The queue service's
/// redelivery and redrive policy decides what happens next.
#[derive(Error, Debug)]
pub enum ProcessingError {
    /// Unparseable or schema-invalid body
    #[error("malformed payload: {0}")]
    MalformedPayload(String),

    /// Valid payload without a routing destination
    #[error("unroutable ticket: {0}")]
    UnroutableTicket(#[from] RoutingError),

    /// The sink did not accept the ticket
    #[error("delivery failed: {0}")]
    DeliveryFailure(String),

    /// Receive, send or delete failed
    #[error("queue operation failed: {0}")]
    TransientQueueError(#[from] QueueError),
}

impl ProcessingError {
    /// Stable label used in log fields and metrics
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::MalformedPayload(_) => "malformed_payload",
            Self::UnroutableTicket(_) => "unroutable_ticket",
            Self::DeliveryFailure(_) => "delivery_failure",
            Self::TransientQueueError(_) => "transient_queue_error",
        }
    }
}

impl From<DecodeError> for ProcessingError {
    fn from(err: DecodeError) -> Self {
        Self::MalformedPayload(err.to_string())
    }
}
