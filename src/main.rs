use std::process::ExitCode;
use std::sync::Arc;

use tracing::{error, info};

use filedrop::{AppState, Config, WebServer};

#[tokio::main]
async fn main() -> ExitCode {
    let config_path =
        std::env::var("FILEDROP_CONFIG").unwrap_or_else(|_| "config.toml".to_string());

    // Load configuration
    let config = match Config::load_with_env(&config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load {config_path}: {e}");
            return ExitCode::FAILURE;
        }
    };

    // Initialize logging
    if let Err(e) = filedrop::logging::init(&config.logging) {
        eprintln!("Failed to initialize logging: {e}");
        filedrop::logging::init_console_only(&config.logging.level);
    }

    if let Err(e) = config.validate() {
        error!("{e}");
        return ExitCode::FAILURE;
    }

    info!(
        "filedrop starting with {:?} backend on {}",
        config.storage.backend,
        config.bind_addr()
    );

    let state = match AppState::from_config(&config).await {
        Ok(state) => Arc::new(state),
        Err(e) => {
            error!("Failed to initialize storage: {e}");
            return ExitCode::FAILURE;
        }
    };

    let server = match WebServer::from_config(&config, state) {
        Ok(server) => server,
        Err(e) => {
            error!("{e}");
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = server.run().await {
        error!("Web server error: {e}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}
