//! Startup helpers for the Voyage agent binaries.

use std::process::ExitCode;
use std::sync::Arc;

use tracing::Level;
use tracing_subscriber::EnvFilter;

use crate::console;
use crate::planner::{PlannerResult, TripController};
use crate::providers::ProviderConfig;
use crate::server::{self, AppState};

/// Run the HTTP server (used by the `voyage-server` binary).
///
/// # Returns
/// `ExitCode::SUCCESS` on graceful shutdown, `1` on failure.
#[must_use]
pub fn run() -> ExitCode {
    init_tracing(Level::INFO);

    tracing::info!("Starting Voyage Agent v{}", env!("CARGO_PKG_VERSION"));

    let state = match initialize() {
        Ok(s) => s,
        Err(e) => {
            tracing::error!("Failed to create state: {e}");
            return ExitCode::from(1);
        }
    };

    let port = get_port();

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            tracing::error!("Failed to create runtime: {e}");
            return ExitCode::from(1);
        }
    };

    if let Err(e) = rt.block_on(server::run_server(state, port)) {
        tracing::error!("Server error: {e}");
        return ExitCode::from(1);
    }

    ExitCode::SUCCESS
}

/// Run the interactive console (used by the `voyage` binary).
///
/// Logs go to stderr so they do not interleave with the conversation.
#[must_use]
pub fn run_console() -> ExitCode {
    init_tracing(Level::WARN);

    let controller = match TripController::from_config(&ProviderConfig::from_env()) {
        Ok(c) => c,
        Err(e) => {
            tracing::error!("Failed to create planner: {e}");
            return ExitCode::from(1);
        }
    };

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            tracing::error!("Failed to create runtime: {e}");
            return ExitCode::from(1);
        }
    };

    if let Err(e) = rt.block_on(console::run_console(&controller)) {
        tracing::error!("Console error: {e}");
        return ExitCode::from(1);
    }

    ExitCode::SUCCESS
}

/// Initialize application state from the environment without starting the server.
///
/// # Errors
/// Returns an error if the providers cannot be built.
pub fn initialize() -> PlannerResult<Arc<AppState>> {
    let config = ProviderConfig::from_env();
    tracing::info!(
        "Geoapify endpoint: {}, weather endpoint: {}",
        config.geoapify_url,
        config.weather_url
    );

    AppState::from_config(&config)
}

/// Get configured server port.
#[must_use]
pub fn get_port() -> u16 {
    std::env::var("VOYAGE_PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(server::DEFAULT_PORT)
}

fn init_tracing(default_level: Level) {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(default_level.into()))
        .with_writer(std::io::stderr)
        .init();
}
