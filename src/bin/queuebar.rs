#[path = "queuebar/app.rs"]
mod app;
#[path = "queuebar/cli.rs"]
mod cli;
#[cfg(target_os = "linux")]
#[path = "queuebar/toast.rs"]
mod toast;

use std::error::Error as StdError;
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = cli::Cli::parse_args();
    match app::run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("queuebar: {err}");
            let mut source = err.source();
            while let Some(cause) = source {
                eprintln!("  caused by: {cause}");
                source = cause.source();
            }
            ExitCode::FAILURE
        }
    }
}
