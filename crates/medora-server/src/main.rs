//! Main entry point for the Medora server.
//!
//! Loads configuration, installs logging, opens the configured storage and
//! serves the HTTP API until shutdown.

use std::sync::Arc;

use medora_server::{Configuration, startup};
use tracing::info;

#[actix_web::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let configuration = Configuration::new()?;

    let logging_config = configuration.logging_config();
    let _logging_guard = startup::init_logging(&logging_config)?;

    let app_state = Arc::new(startup::build_state(configuration).await?);

    if !app_state.configuration.auth_enabled() {
        tracing::warn!("authentication is disabled, every endpoint is open");
    }

    startup::main_server(app_state)?.await?;

    info!("Medora server shutdown complete");
    Ok(())
}
