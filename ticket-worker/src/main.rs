use std::{path::PathBuf, sync::Arc, time::Duration};

use anyhow::Context;
use clap::Parser;
use ticket_queue::{
    init_tracing, queue::SqsQueueClient, spawn_shutdown_listener, Environment,
    LegacyPayloadFormat, PollSettings, Priority, Settings, TicketDecoder,
};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use ticket_worker::{health, sink, PriorityWorker};

/// Timeout for webhook and Jira requests
const SINK_HTTP_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Parser)]
#[command(name = "ticket-worker", about = "Delivers tickets from one priority queue")]
struct Args {
    /// Priority queue to consume
    #[arg(long, env = "WORKER_PRIORITY")]
    priority: Priority,

    /// TOML settings file; environment variables are used when omitted
    #[arg(long, env = "TICKET_ROUTER_CONFIG")]
    config: Option<PathBuf>,

    /// Serve GET /health on this port
    #[arg(long, env = "WORKER_HEALTH_PORT")]
    health_port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    let environment = Environment::from_env().context("Invalid APP_ENV")?;
    init_tracing(environment);

    let settings = Settings::load(args.config.as_deref()).context("Failed to load settings")?;
    let queue_url = settings
        .worker_queue_url(args.priority)
        .context("Invalid worker queue")?;
    let sink_config = settings
        .sink_for(args.priority)
        .context("Missing sink configuration")?;
    let decoder = TicketDecoder::from_format(
        LegacyPayloadFormat::from_env().context("Invalid LEGACY_PAYLOAD_FORMAT")?,
    );

    info!(
        priority = %args.priority,
        queue_url = %queue_url,
        sink = sink_config.kind(),
        "Starting ticket worker in {} environment",
        environment
    );

    let aws_config = environment.aws_config(settings.region.as_deref()).await;
    let queue = Arc::new(SqsQueueClient::new(Arc::new(aws_sdk_sqs::Client::new(
        &aws_config,
    ))));
    let http = reqwest::Client::builder()
        .timeout(SINK_HTTP_TIMEOUT)
        .build()
        .context("Failed to build HTTP client")?;
    let sink = sink::from_config(sink_config, http, &aws_config);

    let shutdown_token = CancellationToken::new();
    let worker = PriorityWorker::new(
        args.priority,
        queue_url,
        queue,
        sink,
        Arc::new(decoder),
        PollSettings::worker_from_env(),
        shutdown_token.clone(),
    );

    if let Some(port) = args.health_port {
        let health_shutdown = shutdown_token.clone();
        let priority = args.priority;
        tokio::spawn(async move {
            if let Err(e) = health::start_health_server(port, priority, health_shutdown).await {
                error!("Health server error: {}", e);
            }
        });
    }

    spawn_shutdown_listener(shutdown_token);

    worker.start().await;

    info!("Ticket worker stopped");
    Ok(())
}
