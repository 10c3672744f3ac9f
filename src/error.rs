//! Error types for Soroban contract lifecycle operations
//!
//! Errors fall into four groups:
//! - configuration errors (a required field is absent), raised before any network call
//! - staleness errors (code or contract state has no TTL left), so callers can
//!   choose between failing and restoring
//! - transport and remote errors, surfaced with the RPC method that produced them
//! - unresolved submissions, where polling ran out before a terminal status

use std::fmt;

use thiserror::Error;

/// Configuration fields that an operation may require
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Field {
    Source,
    Client,
    Signer,
    Salt,
    Wasm,
    WasmHash,
    Function,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            Field::Source => "Source Address is required",
            Field::Client => "Client is required",
            Field::Signer => "Key pair is required",
            Field::Salt => "Salt is required",
            Field::Wasm => "Wasm is required",
            Field::WasmHash => "WasmHash is required",
            Field::Function => "Function is required",
        };
        f.write_str(msg)
    }
}

/// Core error type for Soroban lifecycle operations
#[derive(Debug, Error)]
pub enum Error {
    /// A required configuration field was not set
    #[error("{0}")]
    MissingField(Field),

    /// Account identifier could not be parsed as a G... strkey
    #[error("Invalid account id: {0}")]
    InvalidAccount(String),

    /// Invocation argument could not be converted to a contract value
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Installed wasm code has expired
    #[error("Wasm code has no ttl, requires a restore")]
    CodeNeedsRestore,

    /// Contract code or instance has expired
    #[error("Contract has no ttl, requires a restore")]
    ContractNeedsRestore,

    /// Simulation reported expired contract data in the footprint
    #[error("Contract data has no ttl, requires a restore")]
    ContractDataNeedsRestore,

    /// The transaction could not be assembled from the given parameters
    #[error("Transaction assembly failed: {0}")]
    Assembly(String),

    /// The node rejected the simulation
    #[error("Simulation failed: {0}")]
    Simulation(String),

    /// Non-success HTTP status from the RPC endpoint
    #[error("Bad status {status} for {method}")]
    HttpStatus { method: String, status: u16 },

    /// JSON-RPC error object in the response
    #[error("RPC error on {method} (code {code}): {message}")]
    Rpc {
        method: String,
        code: i64,
        message: String,
    },

    /// Request could not be executed or its body read
    #[error("RPC transport failed for {method}: {source}")]
    Transport {
        method: String,
        #[source]
        source: reqwest::Error,
    },

    /// Response carried neither a result nor an error
    #[error("RPC response for {method} has no result")]
    EmptyResult { method: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("XDR error: {0}")]
    Xdr(#[from] stellar_xdr::curr::Error),

    /// Polling ended while the transaction was still unknown to the node
    #[error("Transaction {hash} still not found after {attempts} attempts")]
    Inconclusive { hash: String, attempts: u32 },

    /// Caller-supplied deadline elapsed
    #[error("Timed out waiting for transaction {hash}")]
    Timeout { hash: String },

    #[error("Sequence number of {0} cannot be increased past i64::MAX")]
    SequenceOverflow(String),

    #[error("Account not found: {0}")]
    AccountNotFound(String),

    #[error("Friendbot funding failed: {0}")]
    Friendbot(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Create an assembly error
    pub fn assembly(msg: impl Into<String>) -> Self {
        Self::Assembly(msg.into())
    }

    /// Create an invalid account error
    pub fn invalid_account(account: impl Into<String>) -> Self {
        Self::InvalidAccount(account.into())
    }

    /// True for the staleness errors that a restore would resolve
    pub fn is_restore_required(&self) -> bool {
        matches!(
            self,
            Self::CodeNeedsRestore | Self::ContractNeedsRestore | Self::ContractDataNeedsRestore
        )
    }

    /// True for local configuration errors raised before any network call
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::MissingField(_) | Self::InvalidArgument(_) | Self::Config(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
