use std::{path::PathBuf, sync::Arc, time::Duration};

use anyhow::Context;
use clap::Parser;
use ticket_queue::{
    init_tracing, queue::SqsQueueClient, spawn_shutdown_listener, Environment,
    LegacyPayloadFormat, PollSettings, Settings, TicketDecoder,
};
use tokio_util::sync::CancellationToken;
use tracing::info;

use dlq_inspector::DlqInspector;

#[derive(Debug, Parser)]
#[command(
    name = "dlq-inspector",
    about = "Replays dead-lettered tickets to their priority queue"
)]
struct Args {
    /// TOML settings file; environment variables are used when omitted
    #[arg(long, env = "TICKET_ROUTER_CONFIG")]
    config: Option<PathBuf>,

    /// Keep running passes until the DLQ returns no messages
    #[arg(long, conflicts_with = "interval")]
    until_empty: bool,

    /// Upper bound on passes with --until-empty
    #[arg(long, default_value_t = 100)]
    max_passes: usize,

    /// Run a pass every INTERVAL seconds until interrupted
    #[arg(long, env = "DLQ_INTERVAL_SECONDS")]
    interval: Option<u64>,
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
    let dlq_url = settings.dlq_url().context("Invalid DLQ")?;
    let decoder = TicketDecoder::from_format(
        LegacyPayloadFormat::from_env().context("Invalid LEGACY_PAYLOAD_FORMAT")?,
    );

    info!(dlq_url = %dlq_url, "Starting DLQ inspector in {} environment", environment);

    let aws_config = environment.aws_config(settings.region.as_deref()).await;
    let queue = Arc::new(SqsQueueClient::new(Arc::new(aws_sdk_sqs::Client::new(
        &aws_config,
    ))));

    let inspector = DlqInspector::new(
        dlq_url,
        queue,
        routing,
        Arc::new(decoder),
        PollSettings::dlq_from_env(),
    );

    if let Some(seconds) = args.interval {
        let shutdown_token = CancellationToken::new();
        spawn_shutdown_listener(shutdown_token.clone());

        inspector
            .run(Duration::from_secs(seconds), shutdown_token)
            .await;
        return Ok(());
    }

    let result = if args.until_empty {
        inspector.drain(args.max_passes).await
    } else {
        inspector.inspect().await
    };
    let report = result.context("DLQ receive failed")?;

    info!(
        received = report.received,
        replayed = report.replayed,
        skipped = report.skipped,
        failed = report.failed,
        "DLQ inspection finished"
    );

    Ok(())
}
