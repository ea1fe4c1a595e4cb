//! Entry point for the surah-meanings command-line tool.
#![allow(clippy::print_stdout, clippy::print_stderr)]

use std::process::ExitCode;

use surah_meanings::cli::{
    self,
    USAGE,
    UsageError,
};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let args = match cli::parse_args(pico_args::Arguments::from_env()) {
        Ok(args) => args,
        Err(UsageError::Help) => {
            println!("{USAGE}");
            return ExitCode::SUCCESS;
        }
        Err(e) => {
            eprintln!("error: {e}\n\n{USAGE}");
            return ExitCode::from(2);
        }
    };

    let _guard = init_tracing(args.verbose);

    match cli::run(&args).await {
        Ok(report) => {
            println!("{report}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::debug!(error = ?e, "Command failed");
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Logs go to stderr so stdout only carries the command summary.
fn init_tracing(verbose: bool) -> WorkerGuard {
    let (writer, guard) = tracing_appender::non_blocking(std::io::stderr());
    let level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("surah_meanings={level}")));

    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).with_writer(writer).init();
    guard
}
