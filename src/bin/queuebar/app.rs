use std::path::PathBuf;
use std::sync::Arc;

use async_channel::{Sender, bounded};
use chrono::Local;
use queuebar::Result;
use queuebar::config::{BarOptions, Config};
use queuebar::service::{QueueBarService, SimpleBarContent};
use queuebar::surface::{HeadlessFactory, LogAnnouncer, SurfaceFactory};
use queuebar::telemetry::init_tracing;
use tokio::io::AsyncBufReadExt;
use tokio::signal;
use tracing::info;

use super::cli::Cli;

const DEFAULT_CONFIG: &str = "queuebar.toml";

/// Read messages from stdin, one per line, and open each as a queued bar.
pub async fn run(cli: Cli) -> Result<()> {
    init_tracing(cli.log_filter.as_deref(), cli.json_logs)?;

    let config_path = cli.config.unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG));
    let mut config = Config::from_env_and_file(&config_path)?;

    if let Some(max_open) = cli.max_open {
        config.queue.max_open = max_open;
        config.queue.validate()?;
    }
    if let Some(duration) = cli.duration {
        config.bar.duration = Some(duration);
    }

    let factory = build_factory(&config, cli.dry_run);
    let service = QueueBarService::<SimpleBarContent>::new(
        factory,
        Arc::new(LogAnnouncer),
        config.queue.clone(),
        config.bar.clone(),
    )?;

    let (tx, rx) = bounded::<String>(config.demo.channel_bound);
    let reader = tokio::spawn(read_lines(tx));

    loop {
        tokio::select! {
            biased;
            _ = signal::ctrl_c() => {
                info!("shutdown signal received, stopping");
                break;
            }
            line = rx.recv() => {
                match line {
                    Ok(message) => open_bar(&service, message, cli.action.as_deref())?,
                    Err(_) => {
                        info!("input closed, stopping");
                        break;
                    }
                }
            }
        }
    }

    reader.abort();
    let counts = service.active_counts();
    if counts.total() > 0 {
        info!(
            timed = counts.timed,
            untimed = counts.untimed,
            "exiting with bars still active"
        );
    }
    Ok(())
}

fn open_bar(
    service: &QueueBarService<SimpleBarContent>,
    message: String,
    action: Option<&str>,
) -> Result<()> {
    let bar = service.open_message(message.clone(), action, BarOptions::new())?;
    bar.on_dismissed(move || {
        info!(
            message = %message,
            at = %Local::now().format("%H:%M:%S"),
            "bar dismissed"
        );
    });
    Ok(())
}

async fn read_lines(tx: Sender<String>) {
    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    let mut lines = stdin.lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                if tx.send(trimmed.to_string()).await.is_err() {
                    break;
                }
            }
            Ok(None) | Err(_) => break,
        }
    }
    tx.close();
}

#[cfg(target_os = "linux")]
fn build_factory(config: &Config, dry_run: bool) -> Arc<dyn SurfaceFactory<SimpleBarContent>> {
    if dry_run {
        Arc::new(HeadlessFactory::new())
    } else {
        Arc::new(super::toast::ToastFactory::new(config.demo.appname.clone()))
    }
}

#[cfg(not(target_os = "linux"))]
fn build_factory(_config: &Config, dry_run: bool) -> Arc<dyn SurfaceFactory<SimpleBarContent>> {
    if !dry_run {
        tracing::warn!("desktop toasts are only wired up on Linux, using the headless surface");
    }
    Arc::new(HeadlessFactory::new())
}
