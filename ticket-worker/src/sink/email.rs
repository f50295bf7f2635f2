use async_trait::async_trait;
use aws_sdk_ses::types::{Body, Content, Destination, Message};
use ticket_queue::Ticket;
use tracing::info;

use super::{SinkAdapter, SinkError};

/// Subject and bodies of a ticket notification email
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailContent {
    /// `[P3] New IT Ticket: <title>`
    pub subject: String,
    /// Plain text body
    pub text: String,
    /// HTML body with escaped field values
    pub html: String,
}

impl EmailContent {
    /// Formats the notification for `ticket`
    #[must_use]
    pub fn for_ticket(ticket: &Ticket) -> Self {
        let priority = ticket.priority;
        let subject = format!("[{priority}] New IT Ticket: {}", ticket.title);
        let text = format!(
            "A new ticket has been submitted.\n\nTitle: {}\nDescription: {}\nPriority: {priority}\n",
            ticket.title, ticket.description
        );
        let html = format!(
            "<html>\n<body>\n<h2>New {priority} Ticket</h2>\n\
             <p><strong>Title:</strong> {}</p>\n\
             <p><strong>Description:</strong> {}</p>\n\
             <p><strong>Priority:</strong> {priority}</p>\n\
             </body>\n</html>\n",
            escape_html(&ticket.title),
            escape_html(&ticket.description),
        );

        Self {
            subject,
            text,
            html,
        }
    }
}

fn escape_html(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Sends tickets as email through AWS SES
#[derive(Debug, Clone)]
pub struct EmailSink {
    ses: aws_sdk_ses::Client,
    source: String,
    recipients: Vec<String>,
}

impl EmailSink {
    /// Creates a sink sending from `source` to `recipients`
    #[must_use]
    pub const fn new(ses: aws_sdk_ses::Client, source: String, recipients: Vec<String>) -> Self {
        Self {
            ses,
            source,
            recipients,
        }
    }
}

fn content(data: String) -> Result<Content, SinkError> {
    Content::builder()
        .data(data)
        .charset("UTF-8")
        .build()
        .map_err(|e| SinkError::Email(e.to_string()))
}

#[async_trait]
impl SinkAdapter for EmailSink {
    fn name(&self) -> &'static str {
        "email"
    }

    async fn deliver(&self, ticket: &Ticket) -> Result<(), SinkError> {
        let EmailContent {
            subject,
            text,
            html,
        } = EmailContent::for_ticket(ticket);

        let message = Message::builder()
            .subject(content(subject)?)
            .body(
                Body::builder()
                    .text(content(text)?)
                    .html(content(html)?)
                    .build(),
            )
            .build()
            .map_err(|e| SinkError::Email(e.to_string()))?;

        let output = self
            .ses
            .send_email()
            .source(&self.source)
            .destination(
                Destination::builder()
                    .set_to_addresses(Some(self.recipients.clone()))
                    .build(),
            )
            .message(message)
            .send()
            .await
            .map_err(|e| SinkError::Email(format!("{e:?}")))?;

        info!(ses_message_id = ?output.message_id(), "Email sent");
        Ok(())
    }
}
