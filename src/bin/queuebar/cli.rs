use std::path::PathBuf;
use std::time::Duration;

use clap::{ArgAction, Parser};
use humantime::parse_duration;

#[derive(Parser, Debug)]
#[command(author, version, about = "Queued snack-bar demo", long_about = None)]
pub struct Cli {
    /// Path to the TOML configuration file.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Maximum number of concurrently shown bars.
    #[arg(long, value_parser = clap::value_parser!(usize))]
    pub max_open: Option<usize>,

    /// Auto-dismiss delay for opened bars (e.g. "5s"; "0s" keeps them until
    /// explicitly dismissed).
    #[arg(long, value_parser = parse_duration)]
    pub duration: Option<Duration>,

    /// Action label attached to every bar.
    #[arg(long, value_name = "LABEL")]
    pub action: Option<String>,

    /// Use the headless surface instead of desktop toasts.
    #[arg(long, action = ArgAction::SetTrue)]
    pub dry_run: bool,

    /// Use a JSON layer for logs (`--features json-logs`).
    #[arg(long, action = ArgAction::SetTrue)]
    pub json_logs: bool,

    /// Explicit log filter (e.g. "queuebar=debug").
    #[arg(long, value_name = "FILTER")]
    pub log_filter: Option<String>,
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
