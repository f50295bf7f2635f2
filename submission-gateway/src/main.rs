use std::{path::PathBuf, sync::Arc};

use anyhow::Context;
use clap::Parser;
use ticket_queue::{
    init_tracing, queue::SqsQueueClient, spawn_shutdown_listener, Environment, Settings,
};
use tokio_util::sync::CancellationToken;

use submission_gateway::{rate_limit::SubmitLimiter, server};

#[derive(Debug, Parser)]
#[command(name = "submission-gateway", about = "Accepts tickets and enqueues them by priority")]
struct Args {
    /// TOML settings file; environment variables are used when omitted
    #[arg(long, env = "TICKET_ROUTER_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    let environment = Environment::from_env().context("Invalid APP_ENV")?;

    init_tracing(environment);

    let settings = Settings::load(args.config.as_deref()).context("Failed to load settings")?;
    let routing = settings
        .routing_table()
        .context("Invalid routing table")?;

    let aws_config = environment.aws_config(settings.region.as_deref()).await;
    let queue = Arc::new(SqsQueueClient::new(Arc::new(aws_sdk_sqs::Client::new(
        &aws_config,
    ))));

    let shutdown_token = CancellationToken::new();
    spawn_shutdown_listener(shutdown_token.clone());

    server::start(queue, routing, SubmitLimiter::from_env(), shutdown_token).await
}
