//! zeekspool-daemon entry point.
//!
//! Wires the components together: configuration, logging, the Zeek
//! writer (rolling or standard per `Zeek.Rotate`), the optional
//! Elasticsearch mirror, and the Redis consumer loop. A Ctrl-C handler
//! and the rolling writer's crash callback both feed one cancellation
//! token; the consumer loop drains its current message and exits on the
//! next poll timeout, after which the writer is closed.

mod cli;
mod logging;

use anyhow::{Context, Result};
use clap::Parser;
use tokio_util::sync::CancellationToken;

use zeekspool_core::config::Config;
use zeekspool_core::writer::DynEcsWriter;
use zeekspool_ingest::{ElasticWriter, RedisConsumer};
use zeekspool_output::{RollingWriter, RotationPeriod, StandardWriter};

use cli::DaemonCli;

/// Rotate spool files every minute instead of every hour. Debugging
/// aid; kept a const so a release build cannot toggle it at runtime.
const ROTATE_ON_MINUTE: bool = false;

#[tokio::main]
async fn main() -> Result<()> {
    let args = DaemonCli::parse();

    let config =
        Config::load(args.config.as_deref()).context("could not load configuration file")?;

    logging::init_tracing(config.log_level)?;
    tracing::info!("zeekspool-daemon starting");

    // cancellation token shared by Ctrl-C, the crash callback, and the
    // consumer loop
    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("shutdown signal received");
                cancel.cancel();
            }
        });
    }

    let period = if ROTATE_ON_MINUTE {
        RotationPeriod::Minutely
    } else {
        RotationPeriod::Hourly
    };

    let mut writer: Box<dyn DynEcsWriter> = if config.zeek.rotate {
        let crash_cancel = cancel.clone();
        Box::new(
            RollingWriter::create(&config.zeek.path, period, move || crash_cancel.cancel())
                .context("failed to initialize rolling zeek writer")?,
        )
    } else {
        Box::new(
            StandardWriter::create(&config.zeek.path)
                .context("failed to initialize standard zeek writer")?,
        )
    };

    let mirror = if config.elasticsearch.host.is_empty() {
        tracing::info!("elasticsearch mirror disabled");
        None
    } else {
        Some(
            ElasticWriter::new(&config.elasticsearch, config.elastic_tls.as_ref())
                .context("failed to initialize elasticsearch mirror")?,
        )
    };

    let mut consumer =
        RedisConsumer::connect(&config.redis, config.redis_tls.as_ref(), cancel.clone())
            .await
            .context("failed to connect to redis")?;

    if let Err(e) = consumer.run(writer.as_mut(), mirror.as_ref()).await {
        tracing::error!(error = %e, "consumer loop terminated");
    }

    if let Err(e) = writer.close().await {
        tracing::error!(error = %e, "error encountered while closing zeek writer");
    }

    tracing::info!("zeekspool-daemon shut down");
    Ok(())
}
