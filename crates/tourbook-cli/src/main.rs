//! tourbook - command-line front end for the tour-booking session core.
//!
//! Restores the persisted session at startup, then runs one command
//! against it. `tourbook help` lists the commands.

mod commands;

use std::io;
use std::sync::Arc;

use anyhow::Result;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use tourbook_core::{ApiClient, Config};

use commands::{Command, Context};

/// Directory for an additional log file, if set
const ENV_LOG_DIR: &str = "TOURBOOK_LOG_DIR";

/// Initialize the tracing subscriber. The returned guard flushes the file
/// writer and must live until exit.
fn init_tracing() -> Option<WorkerGuard> {
    // RUST_LOG controls the level (e.g., RUST_LOG=tourbook_core=debug)
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let (file_layer, guard) = match std::env::var(ENV_LOG_DIR) {
        Ok(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "tourbook.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (Some(fmt::layer().with_writer(writer).with_ansi(false)), Some(guard))
        }
        Err(_) => (None, None),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(file_layer)
        .with(filter)
        .init();

    guard
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let _log_guard = init_tracing();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = match Command::parse(&args) {
        Ok(command) => command,
        Err(e) => {
            eprintln!("Error: {}\n", e);
            eprintln!("{}", commands::USAGE);
            std::process::exit(2);
        }
    };
    if matches!(command, Command::Help) {
        println!("{}", commands::USAGE);
        return Ok(());
    }

    let config = Config::load()?;
    info!(backend = ?config.token_backend, api = %config.api_base_url, "tourbook starting");

    let session = Arc::new(config.session_store()?);
    session.initialize();

    let ctx = Context {
        api: ApiClient::new(&config.api_base_url)?,
        session,
        config,
    };

    commands::run(&ctx, command).await
}
