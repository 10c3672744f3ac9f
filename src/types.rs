//! Soroban RPC result types
//!
//! These mirror the JSON shapes returned by the Soroban RPC methods used by
//! this crate. XDR payloads stay base64-encoded; the decode helpers turn them
//! into typed ledger records on demand.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_with::{serde_as, DisplayFromStr, PickFirst};
use stellar_xdr::curr::{Limits, ReadXdr, ScVal, TransactionMeta, TransactionResult};

use crate::Result;

/// Result of `simulateTransaction`
#[serde_as]
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulateTransactionResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default)]
    pub transaction_data: String,
    #[serde_as(as = "PickFirst<(DisplayFromStr, _)>")]
    #[serde(default)]
    pub min_resource_fee: i64,
    #[serde(default)]
    pub latest_ledger: u32,
    #[serde(default)]
    pub events: Vec<String>,
    #[serde(default)]
    pub results: Vec<SimulateHostFunctionResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub restore_preamble: Option<RestorePreamble>,
}

impl SimulateTransactionResult {
    /// True when execution needs expired footprint state restored first
    pub fn requires_restore(&self) -> bool {
        self.restore_preamble
            .as_ref()
            .map_or(false, |preamble| preamble.min_resource_fee != 0)
    }
}

/// Per-operation simulation output
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SimulateHostFunctionResult {
    #[serde(default)]
    pub auth: Vec<String>,
    #[serde(default)]
    pub xdr: String,
}

/// Restoration the node requires before the simulated transaction can succeed
#[serde_as]
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RestorePreamble {
    #[serde_as(as = "PickFirst<(DisplayFromStr, _)>")]
    #[serde(default)]
    pub min_resource_fee: i64,
    #[serde(default)]
    pub transaction_data: String,
}

/// Submission acceptance status; says nothing about execution outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SendStatus {
    Pending,
    Duplicate,
    TryAgainLater,
    Error,
    #[serde(other)]
    Unknown,
}

/// Result of `sendTransaction`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendTransactionResult {
    pub hash: String,
    pub status: SendStatus,
    #[serde(default)]
    pub latest_ledger: u32,
    #[serde(default, deserialize_with = "string_or_number")]
    pub latest_ledger_close_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_result_xdr: Option<String>,
    #[serde(default)]
    pub diagnostic_events_xdr: Vec<String>,
}

impl SendTransactionResult {
    /// Decode the rejection result, if the node sent one
    pub fn error_result(&self) -> Result<Option<TransactionResult>> {
        decode_optional(self.error_result_xdr.as_deref())
    }
}

/// Post-execution status reported by `getTransaction`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionStatus {
    NotFound,
    Success,
    Failed,
    #[serde(other)]
    Unknown,
}

/// Result of `getTransaction`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetTransactionResult {
    pub status: TransactionStatus,
    #[serde(default)]
    pub latest_ledger: u32,
    #[serde(default)]
    pub oldest_ledger: u32,
    #[serde(default)]
    pub ledger: Option<u32>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub created_at: Option<String>,
    #[serde(default)]
    pub application_order: Option<u32>,
    #[serde(default)]
    pub fee_bump: bool,
    #[serde(default)]
    pub envelope_xdr: Option<String>,
    #[serde(default)]
    pub result_xdr: Option<String>,
    #[serde(default)]
    pub result_meta_xdr: Option<String>,
}

impl GetTransactionResult {
    pub fn result(&self) -> Result<Option<TransactionResult>> {
        decode_optional(self.result_xdr.as_deref())
    }

    pub fn result_meta(&self) -> Result<Option<TransactionMeta>> {
        decode_optional(self.result_meta_xdr.as_deref())
    }

    /// Value returned by the invoked contract function
    pub fn return_value(&self) -> Result<Option<ScVal>> {
        let value = match self.result_meta()? {
            Some(TransactionMeta::V3(meta)) => meta.soroban_meta.map(|m| m.return_value),
            Some(TransactionMeta::V4(meta)) => meta.soroban_meta.and_then(|m| m.return_value),
            _ => None,
        };
        Ok(value)
    }

    /// Ledger close time of the including ledger
    pub fn created_at_utc(&self) -> Option<DateTime<Utc>> {
        let secs: i64 = self.created_at.as_deref()?.parse().ok()?;
        Utc.timestamp_opt(secs, 0).single()
    }
}

/// Result of `getLedgerEntries`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetLedgerEntriesResult {
    #[serde(default)]
    pub latest_ledger: u32,
    #[serde(default)]
    pub entries: Option<Vec<LedgerEntryResult>>,
}

impl GetLedgerEntriesResult {
    pub fn entries(&self) -> &[LedgerEntryResult] {
        self.entries.as_deref().unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerEntryResult {
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub xdr: String,
    #[serde(default)]
    pub last_modified_ledger_seq: u32,
    #[serde(default)]
    pub live_until_ledger_seq: Option<u32>,
}

/// Result of `getNetwork`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetNetworkResult {
    pub passphrase: String,
    #[serde(default)]
    pub friendbot_url: Option<String>,
    #[serde(default)]
    pub protocol_version: u32,
}

/// Result of `getHealth`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetHealthResult {
    pub status: String,
    #[serde(default)]
    pub latest_ledger: u32,
    #[serde(default)]
    pub oldest_ledger: u32,
    #[serde(default)]
    pub ledger_retention_window: u32,
}

fn decode_optional<T: ReadXdr>(encoded: Option<&str>) -> Result<Option<T>> {
    match encoded {
        Some(encoded) if !encoded.is_empty() => {
            Ok(Some(T::from_xdr_base64(encoded, Limits::none())?))
        }
        _ => Ok(None),
    }
}

/// Older RPC versions send timestamps as strings, newer ones as numbers
fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}
