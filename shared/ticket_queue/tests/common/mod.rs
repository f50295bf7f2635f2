//! SQS test setup utilities

#![allow(dead_code)]

use std::sync::Arc;

use aws_config::{BehaviorVersion, Region};
use aws_credential_types::Credentials;
use aws_sdk_sqs::{types::QueueAttributeName, Client as SqsClient};
use ticket_queue::queue::SqsQueueClient;
use uuid::Uuid;

/// Test context with a LocalStack SQS client and a fresh standard queue
pub struct QueueTestContext {
    pub sqs_client: Arc<SqsClient>,
    pub queue: SqsQueueClient,
    pub queue_url: String,
}

impl QueueTestContext {
    /// Creates a uniquely named standard queue
    ///
    /// A short visibility timeout lets tests observe redelivery.
    pub async fn new(test_name: &str) -> Self {
        let queue_name = format!("{}-{}", test_name, Uuid::new_v4());

        // Setup LocalStack client with hardcoded credentials for CI
        let credentials = Credentials::from_keys("test", "test", None);

        let config = aws_config::defaults(BehaviorVersion::latest())
            .endpoint_url("http://localhost:4566")
            .region(Region::new("us-east-1"))
            .credentials_provider(credentials)
            .load()
            .await;

        let sqs_client = Arc::new(SqsClient::new(&config));

        let result = sqs_client
            .create_queue()
            .queue_name(&queue_name)
            .attributes(QueueAttributeName::VisibilityTimeout, "1")
            .send()
            .await
            .expect("Failed to create test queue");

        let queue_url = result
            .queue_url()
            .expect("Queue URL not returned")
            .to_string();

        Self {
            queue: SqsQueueClient::new(sqs_client.clone()),
            sqs_client,
            queue_url,
        }
    }
}

impl Drop for QueueTestContext {
    fn drop(&mut self) {
        // Clean up the queue
        let client = self.sqs_client.clone();
        let queue_url = self.queue_url.clone();

        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            handle.spawn(async move {
                let _ = client.delete_queue().queue_url(&queue_url).send().await;
            });
        }
    }
}
