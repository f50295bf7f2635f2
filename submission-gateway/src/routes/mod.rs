use axum::{
    routing::{get, post},
    Router,
};

use crate::state::AppState;

mod health;
mod submit;

pub use health::HealthResponse;
pub use submit::{SubmitForm, SubmitResponse};

/// Creates the router with all handler routes
#[must_use]
pub fn handler() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::handler))
        .route("/submit", post(submit::handler))
}
