//! In-memory queue with SQS lease semantics
//!
//! Received messages stay in flight until deleted or until
//! [`InMemoryQueue::expire_visibility`] hands them back to the queue. A queue
//! with a redrive policy moves a message to its DLQ on the receive attempt
//! after `max_receive_count` receives, the way SQS does. Long-poll waits are
//! not simulated: an empty queue returns immediately.

use std::collections::{HashMap, VecDeque};

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::queue::{
    client::QueueClient,
    error::{QueueError, QueueResult},
    types::{clamp_batch_size, QueueMessage},
};

/// Operations forced to fail on a queue
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FailurePlan {
    /// Fail `send`
    pub send: bool,
    /// Fail `receive`
    pub receive: bool,
    /// Fail `delete`
    pub delete: bool,
}

#[derive(Debug, Clone)]
struct StoredMessage {
    seq: u64,
    message_id: String,
    body: String,
    receive_count: u32,
}

#[derive(Debug, Default)]
struct QueueState {
    visible: VecDeque<StoredMessage>,
    in_flight: HashMap<String, StoredMessage>,
    send_attempts: usize,
    failures: FailurePlan,
    redrive: Option<(String, u32)>,
}

#[derive(Debug, Default)]
struct State {
    queues: HashMap<String, QueueState>,
    next_id: u64,
}

impl State {
    fn queue(&mut self, queue_url: &str) -> QueueResult<&mut QueueState> {
        self.queues
            .get_mut(queue_url)
            .ok_or_else(|| QueueError::Unavailable(format!("queue does not exist: {queue_url}")))
    }

    fn next_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{prefix}-{}", self.next_id)
    }

    fn stored(&mut self, body: &str) -> StoredMessage {
        let message_id = self.next_id("msg");
        StoredMessage {
            seq: self.next_id,
            message_id,
            body: body.to_string(),
            receive_count: 0,
        }
    }
}

/// In-memory [`QueueClient`] for tests
#[derive(Debug, Default)]
pub struct InMemoryQueue {
    state: Mutex<State>,
}

impl InMemoryQueue {
    /// Creates an empty service with no queues
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a queue, keeping it if it already exists
    pub fn create_queue(&self, queue_url: &str) {
        self.state
            .lock()
            .queues
            .entry(queue_url.to_string())
            .or_default();
    }

    /// Moves messages from `queue_url` to `dlq_url` after `max_receive_count` receives
    ///
    /// # Errors
    ///
    /// Returns `QueueError::Unavailable` if either queue does not exist
    pub fn set_redrive(
        &self,
        queue_url: &str,
        dlq_url: &str,
        max_receive_count: u32,
    ) -> QueueResult<()> {
        let mut state = self.state.lock();
        state.queue(dlq_url)?;
        state.queue(queue_url)?.redrive = Some((dlq_url.to_string(), max_receive_count));
        Ok(())
    }

    /// Forces operations on a queue to fail
    ///
    /// # Errors
    ///
    /// Returns `QueueError::Unavailable` if the queue does not exist
    pub fn set_failures(&self, queue_url: &str, failures: FailurePlan) -> QueueResult<()> {
        self.state.lock().queue(queue_url)?.failures = failures;
        Ok(())
    }

    /// Enqueues a body directly, bypassing failure injection
    ///
    /// # Errors
    ///
    /// Returns `QueueError::Unavailable` if the queue does not exist
    pub fn seed(&self, queue_url: &str, body: &str) -> QueueResult<String> {
        let mut state = self.state.lock();
        state.queue(queue_url)?;
        let message = state.stored(body);
        let message_id = message.message_id.clone();
        state.queue(queue_url)?.visible.push_back(message);
        drop(state);
        Ok(message_id)
    }

    /// Ends every lease on a queue, making in-flight messages visible again
    pub fn expire_visibility(&self, queue_url: &str) {
        let mut state = self.state.lock();
        if let Ok(queue) = state.queue(queue_url) {
            let mut expired: Vec<StoredMessage> = queue.in_flight.drain().map(|(_, m)| m).collect();
            expired.sort_by_key(|m| m.seq);
            for message in expired.into_iter().rev() {
                queue.visible.push_front(message);
            }
        }
    }

    /// Number of visible messages
    #[must_use]
    pub fn visible_count(&self, queue_url: &str) -> usize {
        self.state
            .lock()
            .queues
            .get(queue_url)
            .map_or(0, |q| q.visible.len())
    }

    /// Number of leased messages
    #[must_use]
    pub fn in_flight_count(&self, queue_url: &str) -> usize {
        self.state
            .lock()
            .queues
            .get(queue_url)
            .map_or(0, |q| q.in_flight.len())
    }

    /// Number of messages still stored, visible or leased
    #[must_use]
    pub fn len(&self, queue_url: &str) -> usize {
        self.visible_count(queue_url) + self.in_flight_count(queue_url)
    }

    /// Whether the queue stores no messages
    #[must_use]
    pub fn is_empty(&self, queue_url: &str) -> bool {
        self.len(queue_url) == 0
    }

    /// Bodies of visible messages in delivery order
    #[must_use]
    pub fn visible_bodies(&self, queue_url: &str) -> Vec<String> {
        self.state
            .lock()
            .queues
            .get(queue_url)
            .map(|q| q.visible.iter().map(|m| m.body.clone()).collect())
            .unwrap_or_default()
    }

    /// Number of `send` calls made against a queue, failed ones included
    #[must_use]
    pub fn send_attempts(&self, queue_url: &str) -> usize {
        self.state
            .lock()
            .queues
            .get(queue_url)
            .map_or(0, |q| q.send_attempts)
    }
}

#[async_trait]
impl QueueClient for InMemoryQueue {
    async fn receive(
        &self,
        queue_url: &str,
        max_messages: i32,
        _wait_time_seconds: i32,
    ) -> QueueResult<Vec<QueueMessage>> {
        let mut state = self.state.lock();
        let queue = state.queue(queue_url)?;
        if queue.failures.receive {
            return Err(QueueError::Unavailable(format!("receive failed: {queue_url}")));
        }

        let redrive = queue.redrive.clone();
        let wanted = usize::try_from(clamp_batch_size(max_messages)).unwrap_or(1);
        let mut leased = Vec::new();
        let mut dead = Vec::new();

        while leased.len() < wanted {
            let Some(mut message) = queue.visible.pop_front() else {
                break;
            };

            if let Some((_, max_receive_count)) = &redrive {
                if message.receive_count >= *max_receive_count {
                    dead.push(message);
                    continue;
                }
            }

            message.receive_count += 1;
            leased.push(message);
        }

        let mut received = Vec::with_capacity(leased.len());
        for message in leased {
            let receipt_handle = state.next_id("receipt");
            received.push(QueueMessage {
                body: message.body.clone(),
                receipt_handle: receipt_handle.clone(),
                message_id: message.message_id.clone(),
                receive_count: Some(message.receive_count),
            });
            state.queue(queue_url)?.in_flight.insert(receipt_handle, message);
        }

        if let Some((dlq_url, _)) = redrive {
            let dlq = state.queue(&dlq_url)?;
            for mut message in dead {
                message.receive_count = 0;
                dlq.visible.push_back(message);
            }
        }

        drop(state);
        Ok(received)
    }

    async fn send(&self, queue_url: &str, body: &str) -> QueueResult<String> {
        let mut state = self.state.lock();
        let queue = state.queue(queue_url)?;
        queue.send_attempts += 1;
        if queue.failures.send {
            return Err(QueueError::Unavailable(format!("send failed: {queue_url}")));
        }

        let message = state.stored(body);
        let message_id = message.message_id.clone();
        state.queue(queue_url)?.visible.push_back(message);
        drop(state);
        Ok(message_id)
    }

    async fn delete(&self, queue_url: &str, receipt_handle: &str) -> QueueResult<()> {
        let mut state = self.state.lock();
        let queue = state.queue(queue_url)?;
        if queue.failures.delete {
            return Err(QueueError::Unavailable(format!("delete failed: {queue_url}")));
        }

        queue
            .in_flight
            .remove(receipt_handle)
            .map(|_| ())
            .ok_or_else(|| QueueError::ReceiptHandleInvalid(receipt_handle.to_string()))
    }
}
