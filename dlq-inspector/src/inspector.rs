use std::{ops::AddAssign, sync::Arc, time::Duration};

use metrics::counter;
use ticket_queue::{
    queue::{QueueClient, QueueMessage},
    PollSettings, ProcessingError, RouteKey, RoutingTable, TicketDecoder,
};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, instrument, warn};

/// Counts for one or more inspection passes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InspectReport {
    /// Entries received from the DLQ
    pub received: usize,
    /// Re-enqueued and deleted from the DLQ
    pub replayed: usize,
    /// Malformed or unroutable, left in the DLQ
    pub skipped: usize,
    /// Send or delete failed, left in the DLQ
    pub failed: usize,
}

impl AddAssign for InspectReport {
    fn add_assign(&mut self, other: Self) {
        self.received += other.received;
        self.replayed += other.replayed;
        self.skipped += other.skipped;
        self.failed += other.failed;
    }
}

enum Replay {
    Replayed { priority: &'static str },
    Skipped(ProcessingError),
    Failed(ProcessingError),
}

/// Moves dead-lettered tickets back to their priority queue
///
/// An entry is deleted from the DLQ only after the send to its live queue
/// succeeded. Entries that cannot be routed are left untouched.
pub struct DlqInspector {
    dlq_url: String,
    queue: Arc<dyn QueueClient>,
    routing: RoutingTable,
    decoder: Arc<TicketDecoder>,
    poll: PollSettings,
}

impl DlqInspector {
    /// Creates an inspector for `dlq_url`
    #[must_use]
    pub fn new(
        dlq_url: impl Into<String>,
        queue: Arc<dyn QueueClient>,
        routing: RoutingTable,
        decoder: Arc<TicketDecoder>,
        poll: PollSettings,
    ) -> Self {
        Self {
            dlq_url: dlq_url.into(),
            queue,
            routing,
            decoder,
            poll,
        }
    }

    /// Runs a single pass over one received batch
    ///
    /// # Errors
    ///
    /// Returns `ProcessingError::TransientQueueError` if the DLQ receive fails
    pub async fn inspect(&self) -> Result<InspectReport, ProcessingError> {
        let messages = self
            .queue
            .receive(
                &self.dlq_url,
                self.poll.max_messages,
                self.poll.wait_time_seconds,
            )
            .await?;

        let mut report = InspectReport {
            received: messages.len(),
            ..InspectReport::default()
        };

        for message in &messages {
            match self.replay(message).await {
                Replay::Replayed { .. } => report.replayed += 1,
                Replay::Skipped(_) => report.skipped += 1,
                Replay::Failed(_) => report.failed += 1,
            }
        }

        info!(
            received = report.received,
            replayed = report.replayed,
            skipped = report.skipped,
            failed = report.failed,
            "DLQ pass complete"
        );

        Ok(report)
    }

    /// Repeats passes until one receives nothing or `max_passes` ran
    ///
    /// Entries left in the DLQ stay leased for their visibility timeout, so a
    /// drain does not see them twice.
    ///
    /// # Errors
    ///
    /// Returns `ProcessingError::TransientQueueError` if a DLQ receive fails
    pub async fn drain(&self, max_passes: usize) -> Result<InspectReport, ProcessingError> {
        let mut total = InspectReport::default();

        for _ in 0..max_passes {
            let report = self.inspect().await?;
            total += report;
            if report.received == 0 {
                break;
            }
        }

        Ok(total)
    }

    /// Runs a pass every `interval` until `shutdown` is cancelled
    ///
    /// A failed pass is logged and retried at the next tick. Cancellation is
    /// observed between passes.
    pub async fn run(&self, interval: Duration, shutdown: CancellationToken) {
        info!(dlq_url = %self.dlq_url, ?interval, "Starting periodic DLQ inspection");

        while !shutdown.is_cancelled() {
            // A started pass always finishes its batch
            if let Err(e) = self.inspect().await {
                error!(error = %e, outcome = e.kind(), "DLQ pass failed");
            }

            tokio::select! {
                () = tokio::time::sleep(interval) => {}
                () = shutdown.cancelled() => break,
            }
        }

        info!("DLQ inspection stopped");
    }

    #[instrument(skip(self, message), fields(message_id = %message.message_id))]
    async fn replay(&self, message: &QueueMessage) -> Replay {
        let (declared, outcome) = match self.decoder.decode_route(&message.body) {
            Ok(route) => {
                let declared = route.priority.clone();
                (declared, self.route_and_send(message, route).await)
            }
            Err(e) => (None, Replay::Skipped(e.into())),
        };
        let declared = declared.as_deref().unwrap_or("unknown");

        match &outcome {
            Replay::Replayed { priority } => {
                info!(
                    message_id = %message.message_id,
                    priority,
                    outcome = "replayed",
                    "Replayed DLQ entry"
                );
                counter!("dlq_replayed", "priority" => *priority).increment(1);
            }
            Replay::Skipped(e) => {
                warn!(
                    message_id = %message.message_id,
                    priority = declared,
                    outcome = e.kind(),
                    error = %e,
                    body = %message.body,
                    "Leaving DLQ entry in place"
                );
                counter!("dlq_skipped").increment(1);
            }
            Replay::Failed(e) => {
                error!(
                    message_id = %message.message_id,
                    priority = declared,
                    outcome = e.kind(),
                    error = %e,
                    "DLQ replay incomplete, entry stays"
                );
            }
        }

        outcome
    }

    async fn route_and_send(&self, message: &QueueMessage, route: RouteKey) -> Replay {
        let Some(label) = route.priority.as_deref() else {
            return Replay::Skipped(ProcessingError::MalformedPayload(
                "missing required field `priority`".to_string(),
            ));
        };

        let (priority, target_url) = match self.routing.resolve_label(label) {
            Ok(resolved) => resolved,
            Err(e) => return Replay::Skipped(e.into()),
        };

        // Legacy bodies go back out as canonical JSON
        let body = route.canonical.as_deref().unwrap_or(&message.body);

        match self.queue.send(target_url, body).await {
            Ok(new_message_id) => {
                info!(%new_message_id, target_url, "Re-enqueued DLQ entry");
            }
            Err(e) => return Replay::Failed(e.into()),
        }

        if let Err(e) = self
            .queue
            .delete(&self.dlq_url, &message.receipt_handle)
            .await
        {
            // Sent but still in the DLQ: a later pass may replay it again
            return Replay::Failed(e.into());
        }

        Replay::Replayed {
            priority: priority.into(),
        }
    }
}
