use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use ticket_queue::{SinkConfig, Ticket};

mod email;
mod jira;
mod teams;

pub use email::{EmailContent, EmailSink};
pub use jira::JiraSink;
pub use teams::TeamsWebhookSink;

/// Reasons a sink did not accept a ticket
#[derive(Error, Debug)]
pub enum SinkError {
    /// The downstream service answered with a non-success status
    #[error("sink rejected ticket with status {status}: {body}")]
    Rejected {
        /// HTTP status code
        status: u16,
        /// Response body, as returned
        body: String,
    },

    /// The request never produced a response
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The email could not be built or sent
    #[error("email delivery failed: {0}")]
    Email(String),
}

/// Delivers a ticket to a downstream system
///
/// Implementations never mutate the ticket. Any non-2xx response is a failure.
#[async_trait]
pub trait SinkAdapter: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Delivers one ticket
    ///
    /// # Errors
    ///
    /// Returns `SinkError` if the ticket was not accepted
    async fn deliver(&self, ticket: &Ticket) -> Result<(), SinkError>;
}

/// Builds the sink described by `config`
///
/// HTTP sinks share `http`; the email sink builds an SES client from `aws`.
#[must_use]
pub fn from_config(
    config: &SinkConfig,
    http: reqwest::Client,
    aws: &aws_config::SdkConfig,
) -> Arc<dyn SinkAdapter> {
    match config {
        SinkConfig::TeamsWebhook { webhook_url } => {
            Arc::new(TeamsWebhookSink::new(http, webhook_url.clone()))
        }
        SinkConfig::Jira {
            domain,
            email,
            api_token,
            project_key,
        } => Arc::new(JiraSink::new(
            http,
            format!("https://{domain}"),
            email.clone(),
            api_token.clone(),
            project_key.clone(),
        )),
        SinkConfig::Email { source, recipients } => Arc::new(EmailSink::new(
            aws_sdk_ses::Client::new(aws),
            source.clone(),
            recipients.clone(),
        )),
    }
}

/// Maps a response to `Ok` on any 2xx status
pub(crate) async fn check_response(response: reqwest::Response) -> Result<(), SinkError> {
    let status = response.status();
    if status.is_success() {
        return Ok(());
    }

    let body = response.text().await.unwrap_or_default();
    Err(SinkError::Rejected {
        status: status.as_u16(),
        body,
    })
}
