//! nub binary entrypoint.
//! Parses the command line, sets up tracing and hands off to `commands`.

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use nub::cli::{Cli, Command};
use nub::commands;
use nub::config::DataPaths;

/// `RUST_LOG` wins; otherwise `nub=info`. `NUB_LOG_FORMAT=json` selects the
/// JSON formatter. The daemon child writes to a file, so no ANSI there.
fn init_tracing(daemon: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("nub=info"));
    let json = std::env::var("NUB_LOG_FORMAT")
        .ok()
        .is_some_and(|v| v.eq_ignore_ascii_case("json"));

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(fmt::layer().json().with_ansi(false)).init();
    } else {
        registry
            .with(fmt::layer().compact().with_ansi(!daemon))
            .init();
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env if present; a missing file is fine.
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    init_tracing(matches!(cli.command, Command::DaemonChild));

    let result = match DataPaths::resolve(cli.config, cli.data_dir) {
        Ok(paths) => commands::dispatch(cli.command, &paths).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
