//! Soroban contract lifecycle: install, deploy, invoke and restore
//!
//! This crate turns high level contract intents into signed, funded Soroban
//! transactions. Every submission goes through the same two-phase protocol:
//! a simulation that computes fees, footprint and authorization, then a
//! signed send. When referenced ledger state has expired, a restore
//! transaction can be interposed before the real one.
//!
//! # Architecture
//!
//! - **Address derivation**: deterministic contract address from deployer, salt and network
//! - **Liveness**: TTL checks for contract code and instances
//! - **Transaction assembly**: preconditions, operations, fee and Soroban extension
//! - **Simulation**: dry run and write-back of its output
//! - **Completion polling**: bounded `getTransaction` polling with backoff
//! - **Contract**: the lifecycle operations built on all of the above
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use soroban_lifecycle::{Contract, Keypair, NetworkConfig, Signer, SorobanClient};
//!
//! let client = SorobanClient::new(NetworkConfig::testnet());
//! let keypair = Arc::new(Keypair::random());
//! client.fund(&keypair.account_id()).await?;
//! let source = Arc::new(client.get_account(&keypair.account_id()).await?.source_account());
//!
//! let contract = Contract::builder()
//!     .wasm(std::fs::read("hello.wasm")?)
//!     .salt("hello")
//!     .client(client)
//!     .source_account(source)
//!     .signer(keypair)
//!     .build();
//!
//! let sent = contract.install().await?;
//! contract.wait_for_completion(&sent.hash, 10).await?.into_result()?;
//!
//! let sent = contract.deploy().await?;
//! contract.wait_for_completion(&sent.hash, 10).await?.into_result()?;
//!
//! let sent = contract
//!     .invoke()
//!     .function("hello")
//!     .symbol("world")
//!     .restore_and_send()
//!     .await?;
//! ```

// Public modules
pub mod account;
pub mod address;
pub mod client;
pub mod config;
pub mod contract;
pub mod error;
pub mod invoke;
pub mod keys;
pub mod liveness;
pub mod poller;
pub mod rpc;
pub mod simulation;
pub mod transaction;
pub mod types;

// Re-exports for convenience
pub use account::{AccountInfo, SourceAccount};
pub use address::{contract_strkey, derive_contract_address, network_id};
pub use client::SorobanClient;
pub use config::{NetworkConfig, MIN_BASE_FEE};
pub use contract::{Contract, ContractBuilder};
pub use error::{Error, Field, Result};
pub use invoke::InvokeBuilder;
pub use keys::{parse_account_id, Keypair, Signer};
pub use liveness::Liveness;
pub use poller::{Completion, CompletionPoller};
pub use rpc::{HttpTransport, RpcClient, RpcRequest, RpcResponse, Transport};
pub use transaction::{Attachment, OperationKind, TimeBounds, TransactionAssembler};
pub use types::{
    GetLedgerEntriesResult, GetTransactionResult, SendStatus, SendTransactionResult,
    SimulateTransactionResult, TransactionStatus,
};

// Re-export the XDR crate so callers build arguments with the same version
pub use stellar_xdr;
