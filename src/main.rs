/// Version injected at compile time via UPCTL_VERSION env var (set by CI/CD),
/// or "dev" for local builds.
pub const VERSION: &str = match option_env!("UPCTL_VERSION") {
    Some(v) => v,
    None => "dev",
};

use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::fmt::writer::MakeWriterExt;
use upctl::cli::{self, Cli, LogLevel};
use upctl::waiter::CancelSignal;

fn setup_logging(level: LogLevel) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let tracing_level = level.to_tracing_level()?;

    let log_path = get_log_path();

    if let Some(parent) = log_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }

    let file = match std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
    {
        Ok(file) => file,
        Err(e) => {
            eprintln!("Warning: cannot open log file {}: {e}", log_path.display());
            return None;
        }
    };

    let (non_blocking, guard) = tracing_appender::non_blocking(file);

    tracing_subscriber::fmt()
        .with_max_level(tracing_level)
        .with_writer(non_blocking.with_max_level(tracing_level))
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .init();

    tracing::info!("upctl {} started with log level: {:?}", VERSION, level);
    tracing::info!("Log file: {:?}", log_path);

    Some(guard)
}

fn get_log_path() -> PathBuf {
    if let Some(config_dir) = dirs::config_dir() {
        return config_dir.join("upctl").join("upctl.log");
    }
    if let Some(home) = dirs::home_dir() {
        return home.join(".upctl").join("upctl.log");
    }
    PathBuf::from("upctl.log")
}

#[tokio::main]
async fn main() {
    let args = Cli::parse();

    let log_guard = setup_logging(args.log_level);

    let (handle, cancel) = CancelSignal::channel();
    let code = tokio::select! {
        result = cli::run(args, cancel) => match result {
            Ok(()) => 0,
            Err(err) => {
                tracing::error!("Command failed: {:?}", err);
                eprintln!("Error: {err}");
                err.exit_code()
            }
        },
        () = cli::interrupt(handle) => {
            tracing::warn!("Interrupted twice, exiting");
            eprintln!("Interrupted");
            130
        }
    };

    // process::exit skips destructors; flush the log writer first
    drop(log_guard);
    std::process::exit(code);
}
