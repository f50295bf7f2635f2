use std::{net::SocketAddr, sync::Arc, time::Duration};

use axum::Router;
use ticket_queue::{queue::QueueClient, RoutingTable};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::{rate_limit::SubmitLimiter, routes, state::AppState};

/// How often idle rate limit entries are dropped
const LIMITER_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Builds the application router with its layers
#[must_use]
pub fn router(state: AppState) -> Router {
    routes::handler()
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(Duration::from_secs(5)))
}

/// Starts the server with the given dependencies
///
/// Stops accepting connections once `shutdown` is cancelled and returns after
/// in-flight requests finished.
///
/// # Errors
///
/// Returns an error if the server fails to start or bind to the port
pub async fn start(
    queue: Arc<dyn QueueClient>,
    routing: RoutingTable,
    limiter: SubmitLimiter,
    shutdown: CancellationToken,
) -> anyhow::Result<()> {
    let limiter = Arc::new(limiter);
    let sweeper = limiter.clone();
    let sweeper_shutdown = shutdown.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(LIMITER_SWEEP_INTERVAL);
        loop {
            tokio::select! {
                _ = interval.tick() => sweeper.retain_recent(),
                () = sweeper_shutdown.cancelled() => break,
            }
        }
    });

    let router = router(AppState {
        queue,
        routing: Arc::new(routing),
        limiter,
    });

    let addr = SocketAddr::from((
        [0, 0, 0, 0],
        std::env::var("PORT").map_or(Ok(8001), |p| p.parse())?,
    ));

    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("Submission gateway started on http://{addr}");

    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async move { shutdown.cancelled().await })
    .await?;

    tracing::info!("Submission gateway stopped");
    Ok(())
}
