//! AWS SQS queue client
//!
//! Works with standard queues. The queue URL is passed per call so one client
//! serves the live priority queues and the DLQ alike.

use std::sync::Arc;

use async_trait::async_trait;
use aws_sdk_sqs::{types::MessageSystemAttributeName, Client as SqsClient};

use crate::queue::{
    client::QueueClient,
    error::QueueResult,
    types::{clamp_batch_size, QueueMessage, MAX_WAIT_TIME_SECONDS},
};

/// SQS-backed [`QueueClient`]
pub struct SqsQueueClient {
    sqs_client: Arc<SqsClient>,
}

impl SqsQueueClient {
    /// Creates a new SQS queue client
    ///
    /// # Arguments
    ///
    /// * `sqs_client` - Pre-configured SQS client
    #[must_use]
    pub const fn new(sqs_client: Arc<SqsClient>) -> Self {
        Self { sqs_client }
    }
}

#[async_trait]
impl QueueClient for SqsQueueClient {
    async fn receive(
        &self,
        queue_url: &str,
        max_messages: i32,
        wait_time_seconds: i32,
    ) -> QueueResult<Vec<QueueMessage>> {
        let result = self
            .sqs_client
            .receive_message()
            .queue_url(queue_url)
            .max_number_of_messages(clamp_batch_size(max_messages))
            .wait_time_seconds(wait_time_seconds.clamp(0, MAX_WAIT_TIME_SECONDS))
            .message_system_attribute_names(MessageSystemAttributeName::ApproximateReceiveCount)
            .send()
            .await?;

        let messages = result
            .messages()
            .iter()
            .filter_map(|msg| {
                let Some(receipt_handle) = msg.receipt_handle() else {
                    tracing::warn!(
                        message_id = msg.message_id().unwrap_or_default(),
                        "Received message without receipt handle"
                    );
                    return None;
                };

                let receive_count = msg
                    .attributes()
                    .and_then(|attrs| {
                        attrs.get(&MessageSystemAttributeName::ApproximateReceiveCount)
                    })
                    .and_then(|count| count.parse().ok());

                Some(QueueMessage {
                    body: msg.body().unwrap_or_default().to_string(),
                    receipt_handle: receipt_handle.to_string(),
                    message_id: msg.message_id().unwrap_or_default().to_string(),
                    receive_count,
                })
            })
            .collect();

        Ok(messages)
    }

    async fn send(&self, queue_url: &str, body: &str) -> QueueResult<String> {
        let result = self
            .sqs_client
            .send_message()
            .queue_url(queue_url)
            .message_body(body)
            .send()
            .await?;

        Ok(result
            .message_id()
            .map(std::string::ToString::to_string)
            .unwrap_or_default())
    }

    async fn delete(&self, queue_url: &str, receipt_handle: &str) -> QueueResult<()> {
        self.sqs_client
            .delete_message()
            .queue_url(queue_url)
            .receipt_handle(receipt_handle)
            .send()
            .await?;

        Ok(())
    }
}
