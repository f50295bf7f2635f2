//! Universal error handling for the API

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use ticket_queue::{queue::QueueError, RoutingError, TicketError};

/// API error response envelope
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiErrorResponse {
    /// Whether the client should retry the request
    pub allow_retry: bool,
    /// Error details
    error: ErrorBody,
}

/// Error body containing code and message
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorBody {
    /// Machine-readable error code
    pub code: &'static str,
    /// Human-readable error message
    pub message: &'static str,
}

/// Application error type that wraps the API error response
#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    inner: ApiErrorResponse,
}

impl AppError {
    /// Create a new application error
    #[must_use]
    pub const fn new(
        status: StatusCode,
        code: &'static str,
        msg: &'static str,
        retry: bool,
    ) -> Self {
        Self {
            status,
            inner: ApiErrorResponse {
                allow_retry: retry,
                error: ErrorBody { code, message: msg },
            },
        }
    }

    /// The client exceeded its submission quota
    #[must_use]
    pub const fn rate_limited() -> Self {
        Self::new(
            StatusCode::TOO_MANY_REQUESTS,
            "rate_limited",
            "Too many submissions, try again later",
            true,
        )
    }

    /// The request is not a valid ticket form
    #[must_use]
    pub const fn invalid_form() -> Self {
        Self::new(
            StatusCode::BAD_REQUEST,
            "invalid_ticket",
            "Expected a form with title, description and priority",
            false,
        )
    }

    /// HTTP status of the response
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Log the error based on status code
        match self.status.as_u16() {
            400..=499 => tracing::warn!(
                "Client error: {} - {}",
                self.inner.error.code,
                self.inner.error.message
            ),
            500..=599 => tracing::error!(
                "Server error: {} - {}",
                self.inner.error.code,
                self.inner.error.message
            ),
            _ => {}
        }

        (self.status, Json(self.inner)).into_response()
    }
}

/// Convert ticket validation errors to application errors
impl From<TicketError> for AppError {
    fn from(err: TicketError) -> Self {
        tracing::debug!("Ticket validation failed: {err}");
        match err {
            TicketError::UnknownPriority(_) => Self::new(
                StatusCode::BAD_REQUEST,
                "invalid_ticket",
                "Priority must be one of P1, P2 or P3",
                false,
            ),
            TicketError::EmptyTitle | TicketError::MissingField(_) => Self::new(
                StatusCode::BAD_REQUEST,
                "invalid_ticket",
                "Title and description are required",
                false,
            ),
        }
    }
}

/// Convert routing errors to application errors
impl From<RoutingError> for AppError {
    fn from(err: RoutingError) -> Self {
        tracing::error!("Routing error: {err}");
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "unroutable_ticket",
            "No queue is configured for this priority",
            false,
        )
    }
}

/// Convert queue errors to application errors
impl From<QueueError> for AppError {
    fn from(err: QueueError) -> Self {
        tracing::error!(error = ?err, upstream = err.is_upstream_error(), "Queue send failed");
        Self::new(
            StatusCode::SERVICE_UNAVAILABLE,
            "queue_unavailable",
            "Ticket queue temporarily unavailable",
            true,
        )
    }
}
