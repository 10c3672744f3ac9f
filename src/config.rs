//! Network configuration from environment variables
//!
//! Controls the Soroban RPC endpoint, the network passphrase used for
//! signing and contract address derivation, and the polling behaviour used
//! while waiting for transactions. Defaults to Testnet.

use std::env;
use std::time::Duration;

use crate::{Error, Result};

/// Public testnet passphrase
pub const TESTNET_PASSPHRASE: &str = "Test SDF Network ; September 2015";
/// Futurenet passphrase
pub const FUTURENET_PASSPHRASE: &str = "Test SDF Future Network ; October 2022";
/// Standalone (quickstart) passphrase
pub const STANDALONE_PASSPHRASE: &str = "Standalone Network ; February 2017";
/// Public network passphrase
pub const MAINNET_PASSPHRASE: &str = "Public Global Stellar Network ; September 2015";

/// Minimum per-operation inclusion fee, in stroops
pub const MIN_BASE_FEE: u32 = 100;

#[derive(Clone, Debug)]
pub struct NetworkConfig {
    /// Soroban RPC endpoint
    pub rpc_url: String,
    /// Network passphrase (hashed into the network id)
    pub passphrase: String,
    /// Friendbot endpoint, looked up through `getNetwork` when absent
    pub friendbot_url: Option<String>,
    /// Minimum per-operation inclusion fee, added on top of the resource fee
    pub min_base_fee: u32,
    /// Validity window of built transactions, in seconds
    pub tx_timeout_secs: u64,
    /// Attempts made while waiting for a restore to complete
    pub restore_poll_attempts: u32,
    /// Backoff step; attempt `i` sleeps `i * poll_backoff`
    pub poll_backoff: Duration,
}

impl NetworkConfig {
    /// Public testnet
    pub fn testnet() -> Self {
        Self {
            rpc_url: "https://soroban-testnet.stellar.org".to_string(),
            passphrase: TESTNET_PASSPHRASE.to_string(),
            friendbot_url: Some("https://friendbot.stellar.org".to_string()),
            ..Self::base()
        }
    }

    /// Futurenet
    pub fn futurenet() -> Self {
        Self {
            rpc_url: "https://rpc-futurenet.stellar.org".to_string(),
            passphrase: FUTURENET_PASSPHRASE.to_string(),
            friendbot_url: Some("https://friendbot-futurenet.stellar.org".to_string()),
            ..Self::base()
        }
    }

    /// Local quickstart container in standalone mode
    pub fn local() -> Self {
        Self {
            rpc_url: "http://localhost:8000/rpc".to_string(),
            passphrase: STANDALONE_PASSPHRASE.to_string(),
            friendbot_url: Some("http://localhost:8000/friendbot".to_string()),
            ..Self::base()
        }
    }

    fn base() -> Self {
        Self {
            rpc_url: String::new(),
            passphrase: String::new(),
            friendbot_url: None,
            min_base_fee: MIN_BASE_FEE,
            tx_timeout_secs: 30,
            restore_poll_attempts: 5,
            poll_backoff: Duration::from_secs(2),
        }
    }

    /// Load configuration from environment variables
    ///
    /// Environment variables:
    /// - `SOROBAN_NETWORK`: "testnet" (default), "futurenet" or "local"/"standalone"
    /// - `SOROBAN_RPC_URL`: RPC endpoint override
    /// - `SOROBAN_NETWORK_PASSPHRASE`: passphrase override
    /// - `SOROBAN_FRIENDBOT_URL`: friendbot override
    /// - `SOROBAN_POLL_BACKOFF_MS`: backoff step in milliseconds
    ///
    /// # Examples
    ///
    /// ```bash
    /// SOROBAN_NETWORK=local cargo test --test live_network_test -- --ignored
    /// ```
    pub fn from_env() -> Result<Self> {
        let network = env::var("SOROBAN_NETWORK")
            .unwrap_or_else(|_| "testnet".to_string())
            .to_lowercase();

        let mut config = match network.as_str() {
            "local" | "standalone" => {
                log::info!("🔧 Using STANDALONE network");
                Self::local()
            }
            "futurenet" => {
                log::info!("🌐 Using FUTURENET network");
                Self::futurenet()
            }
            "testnet" | "" => {
                log::info!("🌐 Using TESTNET network");
                Self::testnet()
            }
            other => {
                log::warn!("⚠️  Unknown network '{}', defaulting to Testnet", other);
                Self::testnet()
            }
        };

        if let Ok(url) = env::var("SOROBAN_RPC_URL") {
            config.rpc_url = url;
        }
        log::info!("📡 RPC URL: {}", config.rpc_url);

        if let Ok(passphrase) = env::var("SOROBAN_NETWORK_PASSPHRASE") {
            config.passphrase = passphrase;
        }

        if let Ok(url) = env::var("SOROBAN_FRIENDBOT_URL") {
            config.friendbot_url = Some(url);
        }

        if let Ok(ms) = env::var("SOROBAN_POLL_BACKOFF_MS") {
            let ms: u64 = ms
                .parse()
                .map_err(|_| Error::Config(format!("Invalid SOROBAN_POLL_BACKOFF_MS: {}", ms)))?;
            config.poll_backoff = Duration::from_millis(ms);
        }

        Ok(config)
    }
}

impl Default for NetworkConfig {
    /// Default configuration (Testnet)
    fn default() -> Self {
        Self::testnet()
    }
}
