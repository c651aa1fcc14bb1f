//! Command-line entry point.
//!
//! Usage: `microstatic [config.json]`. Without a config file the server
//! serves `www` on `localhost:8080`. `MICROSTATIC_HOST`, `MICROSTATIC_PORT`
//! and `MICROSTATIC_ROOT` override the file. Log level comes from `RUST_LOG`.

use std::process::ExitCode;

use log::{error, info};
use microstatic::{ConfigFile, HttpServer, ServerError};

fn load_config() -> Result<microstatic::ServerConfig, ServerError> {
    let file = match std::env::args_os().nth(1) {
        Some(path) => {
            info!("Loading configuration from {}", path.to_string_lossy());
            ConfigFile::load(path)?
        }
        None => ConfigFile::default(),
    };
    file.with_env()?.into_config()
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // A missing document root is fatal before anything is bound
    let config = match load_config() {
        Ok(config) => config,
        Err(e) => {
            error!("{e}");
            return ExitCode::FAILURE;
        }
    };

    match HttpServer::new(config).start().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Server error: {e}");
            ExitCode::FAILURE
        }
    }
}
