use async_trait::async_trait;
use serde::Serialize;
use ticket_queue::Ticket;
use tracing::info;

use super::{check_response, SinkAdapter, SinkError};

/// Posts tickets to an incoming webhook (Teams / Power Automate)
#[derive(Debug, Clone)]
pub struct TeamsWebhookSink {
    client: reqwest::Client,
    webhook_url: String,
}

#[derive(Debug, Serialize)]
struct WebhookPayload<'a> {
    title: &'a str,
    description: String,
    priority: &'static str,
}

impl TeamsWebhookSink {
    /// Creates a sink posting to `webhook_url`
    #[must_use]
    pub const fn new(client: reqwest::Client, webhook_url: String) -> Self {
        Self {
            client,
            webhook_url,
        }
    }
}

#[async_trait]
impl SinkAdapter for TeamsWebhookSink {
    fn name(&self) -> &'static str {
        "teams_webhook"
    }

    async fn deliver(&self, ticket: &Ticket) -> Result<(), SinkError> {
        // Flow cards render line breaks poorly
        let payload = WebhookPayload {
            title: ticket.title.trim(),
            description: ticket.description.trim().replace(['\r', '\n'], ""),
            priority: ticket.priority.into(),
        };

        let response = self
            .client
            .post(&self.webhook_url)
            .json(&payload)
            .send()
            .await?;

        info!(status = response.status().as_u16(), "Webhook responded");
        check_response(response).await
    }
}
