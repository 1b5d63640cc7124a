//! Logging initialization for zeekspool-daemon.
//!
//! Configures `tracing-subscriber` from the integer `LogLevel` in the
//! configuration file. The numbering follows the logrus convention used
//! by the upstream collectors (0-2 error, 3 warn, 4 info, 5 debug,
//! 6+ trace). An explicit `RUST_LOG` environment variable always wins.

use anyhow::Result;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Initialize the global tracing subscriber.
///
/// Must be called exactly once, before any tracing macros are used.
pub fn init_tracing(log_level: i32) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level_directive(log_level)));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to initialize tracing subscriber: {}", e))?;

    Ok(())
}

/// Map a logrus-style integer level to a tracing filter directive.
pub fn level_directive(log_level: i32) -> &'static str {
    match log_level {
        i32::MIN..=2 => "error",
        3 => "warn",
        4 => "info",
        5 => "debug",
        _ => "trace",
    }
}
