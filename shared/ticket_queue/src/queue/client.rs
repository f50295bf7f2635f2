use async_trait::async_trait;

use crate::queue::{error::QueueResult, types::QueueMessage};
use crate::ticket::Ticket;

/// Receive, send and delete against named queues
///
/// Implementations perform no retries. Callers own the retry policy.
#[async_trait]
pub trait QueueClient: Send + Sync {
    /// Long-polls a queue for up to `max_messages` messages
    ///
    /// Waits up to `wait_time_seconds` when the queue is empty.
    ///
    /// # Errors
    ///
    /// Returns `QueueError` if the receive call fails
    async fn receive(
        &self,
        queue_url: &str,
        max_messages: i32,
        wait_time_seconds: i32,
    ) -> QueueResult<Vec<QueueMessage>>;

    /// Sends a raw body, returning the message ID
    ///
    /// # Errors
    ///
    /// Returns `QueueError` if the send call fails
    async fn send(&self, queue_url: &str, body: &str) -> QueueResult<String>;

    /// Deletes a leased message
    ///
    /// # Errors
    ///
    /// Returns `QueueError` if the delete call fails
    async fn delete(&self, queue_url: &str, receipt_handle: &str) -> QueueResult<()>;

    /// Serializes and sends a ticket
    ///
    /// # Errors
    ///
    /// Returns `QueueError` if serialization or the send call fails
    async fn send_ticket(&self, queue_url: &str, ticket: &Ticket) -> QueueResult<String> {
        let body = serde_json::to_string(ticket)?;
        self.send(queue_url, &body).await
    }
}
