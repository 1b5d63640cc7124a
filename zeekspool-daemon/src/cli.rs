//! CLI argument definitions for zeekspool-daemon.
//!
//! Uses `clap` v4 derive macros to parse command-line arguments.

use std::path::PathBuf;

use clap::Parser;

/// Zeekspool telemetry bridge daemon.
///
/// Consumes ECS-shaped Sysmon telemetry from a Redis work queue and
/// materialises it as Zeek TSV logs, optionally mirroring each raw
/// document to an Elasticsearch index.
#[derive(Parser, Debug)]
#[command(name = "zeekspool-daemon")]
#[command(version, about, long_about = None)]
pub struct DaemonCli {
    /// Path to the espy.yaml configuration file.
    ///
    /// Defaults to /etc/espy/espy.yaml when not given.
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_config_flag() {
        let cli = DaemonCli::parse_from(["zeekspool-daemon", "--config", "/tmp/espy.yaml"]);
        assert_eq!(cli.config.as_deref(), Some(std::path::Path::new("/tmp/espy.yaml")));
    }

    #[test]
    fn config_flag_is_optional() {
        let cli = DaemonCli::parse_from(["zeekspool-daemon"]);
        assert!(cli.config.is_none());
    }

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        DaemonCli::command().debug_assert();
    }
}
