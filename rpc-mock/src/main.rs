/// Soroban RPC Mock Server
///
/// Serves fixed replies loaded from a JSON script file, for local
/// development without a Soroban node.

use std::env;
use std::sync::Arc;

use anyhow::{Context, Result};

use rpc_mock::{run_server, Script};

#[derive(Debug)]
struct Config {
    script_path: Option<String>,
    server_host: String,
    server_port: u16,
}

impl Config {
    fn from_env() -> Result<Self> {
        dotenv::dotenv().ok(); // Load .env file if present

        let script_path = env::var("RPC_MOCK_SCRIPT").ok();

        let server_host = env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());

        let server_port = env::var("SERVER_PORT")
            .unwrap_or_else(|_| "8000".to_string())
            .parse()
            .context("Invalid SERVER_PORT")?;

        Ok(Self {
            script_path,
            server_host,
            server_port,
        })
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    log::info!("Starting Soroban RPC Mock Server...");

    let config = Config::from_env().context("Failed to load configuration")?;

    let script = match &config.script_path {
        Some(path) => {
            log::info!("Loading replies from {}", path);
            Script::from_file(path).context("Failed to load script")?
        }
        None => {
            log::warn!("RPC_MOCK_SCRIPT not set, every method will answer 'not found'");
            Script::new()
        }
    };

    run_server(Arc::new(script), config.server_host, config.server_port)
        .await
        .context("Server error")?;

    Ok(())
}
