//! Process signal handling

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// Cancels `token` on the first Ctrl-C or SIGTERM
///
/// The handlers are registered before this returns, so a signal raised
/// afterwards never takes the default action of killing the process.
///
/// # Panics
///
/// Panics if called outside a Tokio runtime
#[cfg(unix)]
pub fn spawn_shutdown_listener(token: CancellationToken) -> JoinHandle<()> {
    use tokio::signal::unix::{signal, Signal, SignalKind};

    async fn recv(signal: Option<Signal>) {
        match signal {
            Some(mut signal) => {
                signal.recv().await;
            }
            None => std::future::pending::<()>().await,
        }
    }

    let interrupt = signal(SignalKind::interrupt())
        .inspect_err(|e| error!("Failed to listen for Ctrl+C: {}", e))
        .ok();
    let terminate = signal(SignalKind::terminate())
        .inspect_err(|e| error!("Failed to listen for SIGTERM: {}", e))
        .ok();

    tokio::spawn(async move {
        tokio::select! {
            () = recv(interrupt) => info!("Received Ctrl+C, initiating graceful shutdown..."),
            () = recv(terminate) => info!("Received SIGTERM, initiating graceful shutdown..."),
        }
        token.cancel();
    })
}

/// Cancels `token` on the first Ctrl-C
///
/// # Panics
///
/// Panics if called outside a Tokio runtime
#[cfg(not(unix))]
pub fn spawn_shutdown_listener(token: CancellationToken) -> JoinHandle<()> {
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Received Ctrl+C, initiating graceful shutdown...");
                token.cancel();
            }
            Err(e) => error!("Failed to listen for Ctrl+C: {}", e),
        }
    })
}
