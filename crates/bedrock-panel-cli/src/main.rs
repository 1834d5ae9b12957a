//! bedrock-panel - an interactive console for a Bedrock dedicated server's
//! management panel.
//!
//! The console mirrors the web panel: you move between views by path, the
//! session is kept across runs, and a default password must be changed
//! before anything else is allowed.

mod app;
mod views;

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{error, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use bedrock_panel_core::api::{ApiClient, Gateway, HttpTransport};
use bedrock_panel_core::config::{Config, SessionStorage, APP_NAME};
use bedrock_panel_core::navigation::{LocationNavigator, LANDING_PATH};
use bedrock_panel_core::SessionCoordinator;

use app::{App, AppState};

/// Log file name in the cache directory
const LOG_FILE: &str = "bedrock-panel.log";

/// Initialize the tracing subscriber for logging.
///
/// Logs go to a file so they never interleave with the prompt.
/// Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
fn init_tracing(log_dir: &Path) -> WorkerGuard {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let appender = tracing_appender::rolling::never(log_dir, LOG_FILE);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(writer).with_ansi(false))
        .with(filter)
        .init();

    guard
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let mut config = Config::load().context("Failed to load configuration")?;

    let args: Vec<String> = std::env::args().collect();
    if args.iter().skip(1).any(|a| a == "--ephemeral") {
        config.session_storage = SessionStorage::Memory;
    }

    let log_dir = config
        .cache_dir()
        .unwrap_or_else(|_| PathBuf::from(".").join(APP_NAME));
    std::fs::create_dir_all(&log_dir)
        .with_context(|| format!("Failed to create {}", log_dir.display()))?;
    let _log_guard = init_tracing(&log_dir);

    let server_url = config.server_url();
    info!(server_url = %server_url, storage = ?config.session_storage, "bedrock-panel starting");

    let store = Arc::new(config.open_credential_store()?);
    let coordinator = Arc::new(SessionCoordinator::new(store));
    let navigator = Arc::new(LocationNavigator::new(LANDING_PATH));
    let transport = Arc::new(
        HttpTransport::new(&server_url, config.request_timeout())
            .context("Failed to create HTTP client")?,
    );
    let gateway = Gateway::new(transport, coordinator, navigator.clone());
    let mut app = App::new(ApiClient::new(gateway), navigator, config);

    println!("bedrock-panel - {} (type `help` for commands)", server_url);

    // The starting view is decided from the persisted session alone.
    app.navigate(LANDING_PATH).await?;
    app.follow_pending().await?;

    run_app(&mut app).await?;

    info!("bedrock-panel shutting down");
    Ok(())
}

async fn run_app(app: &mut App) -> Result<()> {
    let stdin = io::stdin();
    let mut line = String::new();

    while app.state == AppState::Running {
        app.prompt()?;

        line.clear();
        if stdin.read_line(&mut line)? == 0 {
            // EOF
            println!();
            break;
        }

        if let Err(e) = app.handle_command(&line).await {
            error!(error = %e, "Command failed");
            println!("Error: {:#}", e);
        }
    }
    Ok(())
}
