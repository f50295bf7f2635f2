//! Application state management

use std::sync::Arc;

use ticket_queue::{queue::QueueClient, RoutingTable};

use crate::rate_limit::SubmitLimiter;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Queue client tickets are sent with
    pub queue: Arc<dyn QueueClient>,
    /// Priority to queue routing
    pub routing: Arc<RoutingTable>,
    /// Per-client submission limiter
    pub limiter: Arc<SubmitLimiter>,
}
