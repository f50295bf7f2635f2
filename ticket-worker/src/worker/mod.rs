use std::{panic::AssertUnwindSafe, sync::Arc, time::Duration};

use futures::FutureExt;
use metrics::counter;
use ticket_queue::{
    queue::{QueueClient, QueueMessage},
    PollSettings, Priority, ProcessingError, Ticket, TicketDecoder,
};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, instrument, warn};

use crate::sink::SinkAdapter;

/// Pause after a failed receive before polling again
const RECEIVE_RETRY_DELAY: Duration = Duration::from_secs(1);

/// Counts for one received batch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchReport {
    /// Messages received
    pub received: usize,
    /// Delivered and deleted
    pub delivered: usize,
    /// Malformed or for another priority, left on the queue
    pub rejected: usize,
    /// Delivery or delete failed, left on the queue
    pub failed: usize,
}

enum Outcome {
    Delivered,
    Rejected(ProcessingError),
    Failed(ProcessingError),
}

/// Consumes one priority queue and hands each ticket to a sink
///
/// A message is deleted only after the sink accepted it. Everything else is
/// left for the queue's redelivery and redrive policy.
pub struct PriorityWorker {
    priority: Priority,
    queue_url: String,
    queue: Arc<dyn QueueClient>,
    sink: Arc<dyn SinkAdapter>,
    decoder: Arc<TicketDecoder>,
    poll: PollSettings,
    shutdown: CancellationToken,
}

impl PriorityWorker {
    /// Creates a worker for `priority` consuming `queue_url`
    #[must_use]
    pub fn new(
        priority: Priority,
        queue_url: impl Into<String>,
        queue: Arc<dyn QueueClient>,
        sink: Arc<dyn SinkAdapter>,
        decoder: Arc<TicketDecoder>,
        poll: PollSettings,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            priority,
            queue_url: queue_url.into(),
            queue,
            sink,
            decoder,
            poll,
            shutdown,
        }
    }

    /// Token that stops the worker at the next batch boundary
    #[must_use]
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Runs until the shutdown token is cancelled
    ///
    /// Cancellation abandons a pending receive but never an in-flight
    /// delivery: a received batch is always processed to the end.
    pub async fn start(self) {
        info!(
            priority = %self.priority,
            queue_url = %self.queue_url,
            sink = self.sink.name(),
            "Starting PriorityWorker"
        );

        while !self.shutdown.is_cancelled() {
            let received = tokio::select! {
                result = self.receive() => result,
                () = self.shutdown.cancelled() => {
                    info!("Queue poller shutting down");
                    break;
                }
            };

            match received {
                Ok(messages) => {
                    self.process_batch(messages).await;
                }
                Err(e) => {
                    error!(error = %e, outcome = e.kind(), "Failed to receive messages");
                    tokio::select! {
                        () = tokio::time::sleep(RECEIVE_RETRY_DELAY) => {}
                        () = self.shutdown.cancelled() => {}
                    }
                }
            }
        }

        info!(priority = %self.priority, "PriorityWorker shutdown complete");
    }

    /// Receives and processes a single batch
    ///
    /// # Errors
    ///
    /// Returns `ProcessingError::TransientQueueError` if the receive call fails
    pub async fn poll_once(&self) -> Result<BatchReport, ProcessingError> {
        let messages = self.receive().await?;
        Ok(self.process_batch(messages).await)
    }

    async fn receive(&self) -> Result<Vec<QueueMessage>, ProcessingError> {
        Ok(self
            .queue
            .receive(
                &self.queue_url,
                self.poll.max_messages,
                self.poll.wait_time_seconds,
            )
            .await?)
    }

    async fn process_batch(&self, messages: Vec<QueueMessage>) -> BatchReport {
        let mut report = BatchReport {
            received: messages.len(),
            ..BatchReport::default()
        };

        for message in messages {
            match self.process_and_ack(&message).await {
                Outcome::Delivered => report.delivered += 1,
                Outcome::Rejected(_) => report.rejected += 1,
                Outcome::Failed(_) => report.failed += 1,
            }
        }

        report
    }

    #[instrument(
        skip(self, message),
        fields(message_id = %message.message_id, receive_count = ?message.receive_count)
    )]
    async fn process_and_ack(&self, message: &QueueMessage) -> Outcome {
        let priority: &'static str = self.priority.into();
        let outcome = self.process(message).await;

        match &outcome {
            Outcome::Delivered => {
                info!(
                    message_id = %message.message_id,
                    priority,
                    outcome = "delivered",
                    "Ticket delivered"
                );
                counter!("tickets_delivered", "priority" => priority).increment(1);
            }
            Outcome::Rejected(e) => {
                warn!(
                    message_id = %message.message_id,
                    priority,
                    outcome = e.kind(),
                    error = %e,
                    "Ticket rejected, leaving on queue"
                );
                counter!("tickets_rejected", "priority" => priority).increment(1);
            }
            Outcome::Failed(e) => {
                error!(
                    message_id = %message.message_id,
                    priority,
                    outcome = e.kind(),
                    error = %e,
                    "Ticket not acknowledged, leaving on queue"
                );
                counter!("tickets_delivery_failed", "priority" => priority).increment(1);
            }
        }

        outcome
    }

    async fn process(&self, message: &QueueMessage) -> Outcome {
        let ticket = match self.validate(&message.body) {
            Ok(ticket) => ticket,
            Err(e) => return Outcome::Rejected(e),
        };

        let delivery = AssertUnwindSafe(self.sink.deliver(&ticket))
            .catch_unwind()
            .await;

        match delivery {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Outcome::Failed(ProcessingError::DeliveryFailure(e.to_string())),
            Err(_) => {
                return Outcome::Failed(ProcessingError::DeliveryFailure(format!(
                    "{} sink panicked",
                    self.sink.name()
                )))
            }
        }

        // Redelivery after a failed delete is an accepted duplicate
        match self
            .queue
            .delete(&self.queue_url, &message.receipt_handle)
            .await
        {
            Ok(()) => Outcome::Delivered,
            Err(e) => Outcome::Failed(ProcessingError::TransientQueueError(e)),
        }
    }

    fn validate(&self, body: &str) -> Result<Ticket, ProcessingError> {
        let decoded = self.decoder.decode(body)?;
        let ticket = decoded
            .fields
            .into_ticket()
            .map_err(|e| ProcessingError::MalformedPayload(e.to_string()))?;

        if ticket.priority != self.priority {
            return Err(ProcessingError::MalformedPayload(format!(
                "ticket priority {} does not match queue priority {}",
                ticket.priority, self.priority
            )));
        }

        Ok(ticket)
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use ticket_queue::queue::{FailurePlan, InMemoryQueue};

    use super::*;
    use crate::sink::SinkError;

    const QUEUE: &str = "https://sqs.local/000/p2";

    struct AcceptAll;

    #[async_trait]
    impl SinkAdapter for AcceptAll {
        fn name(&self) -> &'static str {
            "accept_all"
        }

        async fn deliver(&self, _ticket: &Ticket) -> Result<(), SinkError> {
            Ok(())
        }
    }

    fn worker(queue: Arc<InMemoryQueue>) -> PriorityWorker {
        PriorityWorker::new(
            Priority::P2,
            QUEUE,
            queue,
            Arc::new(AcceptAll),
            Arc::new(TicketDecoder::default()),
            PollSettings {
                max_messages: 10,
                wait_time_seconds: 0,
            },
            CancellationToken::new(),
        )
    }

    #[test]
    fn test_validate_rejects_other_priority() {
        let worker = worker(Arc::new(InMemoryQueue::new()));

        let result =
            worker.validate(r#"{"title":"X","description":"Y","priority":"P1"}"#);
        assert!(matches!(result, Err(ProcessingError::MalformedPayload(_))));

        let ticket = worker
            .validate(r#"{"title":"X","description":"Y","priority":"P2"}"#)
            .unwrap();
        assert_eq!(ticket.title, "X");
    }

    #[test]
    fn test_validate_accepts_legacy_literal() {
        let worker = worker(Arc::new(InMemoryQueue::new()));

        let ticket = worker
            .validate("{'title': 'X', 'description': 'Y', 'priority': 'P2'}")
            .unwrap();
        assert_eq!(ticket.priority, Priority::P2);
    }

    #[tokio::test]
    async fn test_delete_failure_counts_as_failed() {
        let queue = Arc::new(InMemoryQueue::new());
        queue.create_queue(QUEUE);
        queue
            .seed(QUEUE, r#"{"title":"X","description":"Y","priority":"P2"}"#)
            .unwrap();
        queue
            .set_failures(
                QUEUE,
                FailurePlan {
                    delete: true,
                    ..FailurePlan::default()
                },
            )
            .unwrap();

        let report = worker(queue.clone()).poll_once().await.unwrap();

        assert_eq!(report.failed, 1);
        assert_eq!(report.delivered, 0);
        assert_eq!(queue.in_flight_count(QUEUE), 1);
    }

    #[tokio::test]
    async fn test_receive_failure_is_transient() {
        let queue = Arc::new(InMemoryQueue::new());
        queue.create_queue(QUEUE);
        queue
            .set_failures(
                QUEUE,
                FailurePlan {
                    receive: true,
                    ..FailurePlan::default()
                },
            )
            .unwrap();

        let result = worker(queue).poll_once().await;
        assert!(matches!(
            result,
            Err(ProcessingError::TransientQueueError(_))
        ));
    }
}
