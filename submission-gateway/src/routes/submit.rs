use std::net::SocketAddr;

use axum::{
    extract::{rejection::FormRejection, ConnectInfo, State},
    http::StatusCode,
    Extension, Form, Json,
};
use metrics::counter;
use serde::{Deserialize, Serialize};
use ticket_queue::{Priority, TicketFields};
use tracing::info;

use crate::{rate_limit::client_ip, state::AppState, types::AppError};

/// Submitted ticket form
#[derive(Debug, Default, Deserialize)]
pub struct SubmitForm {
    /// Ticket title
    #[serde(default)]
    pub title: String,
    /// Ticket description
    #[serde(default)]
    pub description: String,
    /// Priority label, `P1`, `P2` or `P3`
    #[serde(default)]
    pub priority: String,
}

/// Accepted submission
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitResponse {
    /// Priority queue the ticket was sent to
    pub priority: Priority,
    /// Queue message ID
    pub message_id: String,
}

/// Validates a ticket form and enqueues it on its priority queue
///
/// # Errors
///
/// Returns 429 when the client is over quota, 400 for an invalid form, 500
/// when the priority has no queue and 503 when the send fails
pub async fn handler(
    State(state): State<AppState>,
    connect_info: Option<Extension<ConnectInfo<SocketAddr>>>,
    form: Result<Form<SubmitForm>, FormRejection>,
) -> Result<(StatusCode, Json<SubmitResponse>), AppError> {
    let client = client_ip(connect_info.as_ref().map(|Extension(info)| info));
    if !state.limiter.check(client) {
        return Err(AppError::rate_limited());
    }

    let Form(form) = form.map_err(|e| {
        tracing::warn!("Form rejected: {e}");
        AppError::invalid_form()
    })?;

    let ticket = TicketFields {
        title: Some(form.title.trim().to_string()),
        description: Some(form.description.trim().to_string()),
        priority: Some(form.priority.trim().to_string()),
    }
    .into_ticket()?;

    if ticket.description.is_empty() {
        return Err(AppError::new(
            StatusCode::BAD_REQUEST,
            "invalid_ticket",
            "Title and description are required",
            false,
        ));
    }

    let queue_url = state.routing.resolve(ticket.priority)?;
    let message_id = state.queue.send_ticket(queue_url, &ticket).await?;

    let priority: &'static str = ticket.priority.into();
    info!(%message_id, priority, "Ticket submitted");
    counter!("tickets_submitted", "priority" => priority).increment(1);

    Ok((
        StatusCode::ACCEPTED,
        Json(SubmitResponse {
            priority: ticket.priority,
            message_id,
        }),
    ))
}
