//! andpubutil - upload Android binaries and expansion files to Google Play

mod cli;
mod exit_codes;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use cli::Cli;

fn main() {
    // Env-backed options read the environment during parsing
    let args: Vec<std::ffi::OsString> = std::env::args_os().collect();
    cli::load_env_file(&cli::env_file_from_args(&args));

    let cli = match Cli::try_parse_from(&args) {
        Ok(cli) => cli,
        Err(err) => {
            let _ = err.print();
            std::process::exit(cli::parse_error_exit_code(&err));
        }
    };

    let guard = init_tracing(cli.log_level());

    info!("andpubutil: hello~");
    let code = match cli.execute() {
        Ok(()) => {
            info!("andpubutil: Done successfully");
            exit_codes::SUCCESS
        }
        Err(err) => {
            error!("{:#}", err);
            exit_codes::for_error(&err)
        }
    };

    // Flush the file appender before exiting
    drop(guard);
    std::process::exit(code);
}

/// Install the subscriber. Human-readable lines go to stderr at `RUST_LOG`
/// or the level picked by -v/-q; a JSON copy of everything at debug level
/// goes to a daily file under ~/.andpubutil/logs/ when that directory can
/// be created. The returned guard must outlive all logging.
fn init_tracing(default_level: &str) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let console_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    if let Some(log_dir) = log_directory() {
        let file_appender = tracing_appender::rolling::daily(&log_dir, "andpubutil.log");
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

        tracing_subscriber::registry()
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(false)
                    .with_writer(std::io::stderr)
                    .with_filter(console_filter),
            )
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(non_blocking)
                    .with_target(true)
                    .with_filter(EnvFilter::new("debug")),
            )
            .init();

        return Some(guard);
    }

    // Fallback: console only
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr)
                .with_filter(console_filter),
        )
        .init();

    None
}

/// Returns the log directory path, creating it if needed.
fn log_directory() -> Option<std::path::PathBuf> {
    let log_dir = dirs::home_dir()?.join(".andpubutil").join("logs");
    std::fs::create_dir_all(&log_dir).ok()?;
    Some(log_dir)
}
