//! Typed Soroban RPC client
//!
//! [`SorobanClient`] is cheap to clone: all clones share one JSON-RPC client
//! (and its request id counter) and one network configuration.

use std::sync::Arc;

use serde_json::json;
use stellar_xdr::curr::{
    AccountEntry, LedgerEntryData, LedgerKey, LedgerKeyAccount, Limits, ReadXdr,
    TransactionEnvelope, WriteXdr,
};

use crate::account::AccountInfo;
use crate::config::NetworkConfig;
use crate::keys::parse_account_id;
use crate::rpc::{RpcClient, Transport};
use crate::types::{
    GetHealthResult, GetLedgerEntriesResult, GetNetworkResult, GetTransactionResult,
    SendTransactionResult, SimulateTransactionResult,
};
use crate::{Error, Result};

#[derive(Clone)]
pub struct SorobanClient {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    rpc: RpcClient,
    config: NetworkConfig,
    http_client: reqwest::Client,
}

impl SorobanClient {
    /// Client talking HTTP to `config.rpc_url`
    pub fn new(config: NetworkConfig) -> Self {
        let rpc = RpcClient::http(config.rpc_url.clone());
        Self::from_parts(rpc, config)
    }

    /// Client over a custom transport
    pub fn with_transport(config: NetworkConfig, transport: Arc<dyn Transport>) -> Self {
        Self::from_parts(RpcClient::new(transport), config)
    }

    /// Client configured from `SOROBAN_*` environment variables
    pub fn from_env() -> Result<Self> {
        Ok(Self::new(NetworkConfig::from_env()?))
    }

    fn from_parts(rpc: RpcClient, config: NetworkConfig) -> Self {
        Self {
            inner: Arc::new(ClientInner {
                rpc,
                config,
                http_client: reqwest::Client::new(),
            }),
        }
    }

    pub fn config(&self) -> &NetworkConfig {
        &self.inner.config
    }

    pub fn passphrase(&self) -> &str {
        &self.inner.config.passphrase
    }

    pub fn min_base_fee(&self) -> u32 {
        self.inner.config.min_base_fee
    }

    pub async fn simulate_transaction(
        &self,
        envelope: &TransactionEnvelope,
    ) -> Result<SimulateTransactionResult> {
        let params = json!({ "transaction": envelope.to_xdr_base64(Limits::none())? });
        self.inner.rpc.call("simulateTransaction", Some(&params)).await
    }

    pub async fn send_transaction(
        &self,
        envelope: &TransactionEnvelope,
    ) -> Result<SendTransactionResult> {
        let params = json!({ "transaction": envelope.to_xdr_base64(Limits::none())? });
        self.inner.rpc.call("sendTransaction", Some(&params)).await
    }

    pub async fn get_transaction(&self, hash: &str) -> Result<GetTransactionResult> {
        let params = json!({ "hash": hash });
        self.inner.rpc.call("getTransaction", Some(&params)).await
    }

    pub async fn get_ledger_entries(&self, keys: &[LedgerKey]) -> Result<GetLedgerEntriesResult> {
        let keys = keys
            .iter()
            .map(|key| key.to_xdr_base64(Limits::none()))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        let params = json!({ "keys": keys });
        self.inner.rpc.call("getLedgerEntries", Some(&params)).await
    }

    pub async fn get_network(&self) -> Result<GetNetworkResult> {
        self.inner.rpc.call("getNetwork", Some(&json!({}))).await
    }

    pub async fn get_health(&self) -> Result<GetHealthResult> {
        self.inner
            .rpc
            .call::<serde_json::Value, _>("getHealth", None)
            .await
    }

    /// Account ledger entry of `account_id`
    pub async fn get_account_entry(&self, account_id: &str) -> Result<AccountEntry> {
        let key = LedgerKey::Account(LedgerKeyAccount {
            account_id: parse_account_id(account_id)?,
        });
        let result = self.get_ledger_entries(&[key]).await?;

        let entry = result
            .entries()
            .first()
            .ok_or_else(|| Error::AccountNotFound(account_id.to_string()))?;

        match LedgerEntryData::from_xdr_base64(&entry.xdr, Limits::none())? {
            LedgerEntryData::Account(account) => Ok(account),
            _ => Err(Error::AccountNotFound(account_id.to_string())),
        }
    }

    pub async fn get_account(&self, account_id: &str) -> Result<AccountInfo> {
        let entry = self.get_account_entry(account_id).await?;
        Ok(AccountInfo::from(&entry))
    }

    /// Fund `account_id` through friendbot
    ///
    /// Uses the configured friendbot URL, or the one advertised by `getNetwork`.
    pub async fn fund(&self, account_id: &str) -> Result<()> {
        let friendbot_url = match &self.inner.config.friendbot_url {
            Some(url) => url.clone(),
            None => self
                .get_network()
                .await?
                .friendbot_url
                .filter(|url| !url.is_empty())
                .ok_or_else(|| Error::Friendbot("network has no friendbot".to_string()))?,
        };

        log::info!("💰 Funding {} via {}", account_id, friendbot_url);
        let response = self
            .inner
            .http_client
            .get(&friendbot_url)
            .query(&[("addr", account_id)])
            .send()
            .await
            .map_err(|e| Error::Transport {
                method: "friendbot".to_string(),
                source: e,
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            log::error!("   ❌ Friendbot returned {}: {}", status, body);
            return Err(Error::Friendbot(format!("status {}: {}", status, body)));
        }

        log::info!("   ✓ Funded {}", account_id);
        Ok(())
    }
}

impl std::fmt::Debug for SorobanClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SorobanClient")
            .field("rpc_url", &self.inner.config.rpc_url)
            .field("passphrase", &self.inner.config.passphrase)
            .field("rpc", &self.inner.rpc)
            .finish()
    }
}
