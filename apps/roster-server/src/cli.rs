//! Command-line argument parsing

use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
#[command(
    name = "roster-server",
    about = "Roster membership server",
    version,
    long_about = "Serves the Roster admin panel API and public member forms. \
                  Every tenant organization is backed by its own database."
)]
pub struct Args {
    /// Path to configuration file
    #[arg(
        short,
        long,
        env = "ROSTER_CONFIG",
        default_value = "config/default.toml"
    )]
    pub config: PathBuf,

    /// HTTP server port (overrides the configuration file)
    #[arg(short, long, env = "PORT")]
    pub port: Option<u16>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(
        short,
        long,
        env = "LOG_LEVEL",
        default_value = "info",
        value_parser = ["trace", "debug", "info", "warn", "error"]
    )]
    pub log_level: String,

    /// Enable JSON log format (useful for production)
    #[arg(long, env = "JSON_LOGS")]
    pub json_logs: bool,
}
