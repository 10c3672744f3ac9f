//! Shared helpers for integration tests
//!
//! `MockTransport` answers JSON-RPC calls from per-method queues and keeps
//! every request it saw, so tests can assert both on results and on which
//! network calls were (or were not) made.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use sha2::{Digest, Sha256};
use soroban_lifecycle::rpc::{RpcErrorObject, RpcRequest, RpcResponse, Transport};
use soroban_lifecycle::stellar_xdr::curr::{
    Asset, ContractExecutable, ContractIdPreimage, CreateContractArgs, Hash, LedgerFootprint,
    Limits, ReadXdr, ScVal, SorobanAuthorizationEntry, SorobanAuthorizedFunction,
    SorobanAuthorizedInvocation, SorobanCredentials, SorobanResources, SorobanTransactionData,
    SorobanTransactionDataExt, TransactionEnvelope, WriteXdr,
};
use soroban_lifecycle::{
    Contract, Keypair, NetworkConfig, Signer, SorobanClient, SourceAccount,
};

/// Initialize logging for tests (only once, subsequent calls are no-ops)
pub fn init_logging() {
    let _ = env_logger::builder()
        .is_test(true)
        .filter_level(log::LevelFilter::Debug)
        .try_init();
}

#[derive(Default)]
struct MockState {
    queues: HashMap<String, VecDeque<RpcResponseBody>>,
    calls: Vec<RpcRequest>,
}

enum RpcResponseBody {
    Result(Value),
    Error(i64, String),
}

/// Scripted in-process transport
#[derive(Default)]
pub struct MockTransport {
    state: Mutex<MockState>,
}

impl MockTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn push(&self, method: &str, result: Value) {
        self.state
            .lock()
            .unwrap()
            .queues
            .entry(method.to_string())
            .or_default()
            .push_back(RpcResponseBody::Result(result));
    }

    pub fn push_error(&self, method: &str, code: i64, message: &str) {
        self.state
            .lock()
            .unwrap()
            .queues
            .entry(method.to_string())
            .or_default()
            .push_back(RpcResponseBody::Error(code, message.to_string()));
    }

    pub fn calls(&self) -> Vec<RpcRequest> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn methods(&self) -> Vec<String> {
        self.calls().into_iter().map(|call| call.method).collect()
    }

    pub fn count(&self, method: &str) -> usize {
        self.calls().iter().filter(|call| call.method == method).count()
    }

    /// Envelopes submitted through `sendTransaction`, in order
    pub fn sent_envelopes(&self) -> Vec<TransactionEnvelope> {
        self.envelopes("sendTransaction")
    }

    pub fn simulated_envelopes(&self) -> Vec<TransactionEnvelope> {
        self.envelopes("simulateTransaction")
    }

    fn envelopes(&self, method: &str) -> Vec<TransactionEnvelope> {
        self.calls()
            .iter()
            .filter(|call| call.method == method)
            .map(|call| {
                let encoded = call.params.as_ref().unwrap()["transaction"]
                    .as_str()
                    .unwrap()
                    .to_string();
                TransactionEnvelope::from_xdr_base64(encoded, Limits::none()).unwrap()
            })
            .collect()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn execute(
        &self,
        request: &RpcRequest,
    ) -> soroban_lifecycle::Result<RpcResponse> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(request.clone());

        let body = state
            .queues
            .get_mut(&request.method)
            .and_then(VecDeque::pop_front);

        let (result, error) = match body {
            Some(RpcResponseBody::Result(value)) => (Some(value), None),
            Some(RpcResponseBody::Error(code, message)) => (
                None,
                Some(RpcErrorObject {
                    code,
                    message,
                    data: None,
                }),
            ),
            None => (
                None,
                Some(RpcErrorObject {
                    code: -32601,
                    message: format!("no scripted reply for {}", request.method),
                    data: None,
                }),
            ),
        };

        Ok(RpcResponse {
            jsonrpc: "2.0".to_string(),
            id: request.id,
            result,
            error,
        })
    }
}

/// Testnet config with a 1 ms backoff step so polling tests stay fast
pub fn test_config() -> NetworkConfig {
    NetworkConfig {
        poll_backoff: Duration::from_millis(1),
        ..NetworkConfig::testnet()
    }
}

pub fn client(transport: &Arc<MockTransport>) -> SorobanClient {
    SorobanClient::with_transport(test_config(), transport.clone())
}

pub fn keypair() -> Arc<Keypair> {
    Arc::new(Keypair::from_seed(&[11u8; 32]))
}

pub fn source(keypair: &Keypair, sequence: i64) -> Arc<SourceAccount> {
    Arc::new(SourceAccount::new(keypair.account_id(), sequence))
}

pub const WASM: &[u8] = &[0x00, 0x61, 0x73, 0x6d, 0x01, 0x00, 0x00, 0x00];

pub fn wasm_hash() -> [u8; 32] {
    Sha256::digest(WASM).into()
}

/// Contract with every field set, source account starting at `sequence`
pub fn contract(
    transport: &Arc<MockTransport>,
    sequence: i64,
) -> (Contract, Arc<SourceAccount>) {
    let keypair = keypair();
    let source = source(&keypair, sequence);
    let contract = Contract::builder()
        .wasm(WASM)
        .salt("hello")
        .client(client(transport))
        .source_account(source.clone())
        .signer(keypair)
        .build();
    (contract, source)
}

pub fn transaction_data_b64(resource_fee: i64) -> String {
    SorobanTransactionData {
        ext: SorobanTransactionDataExt::V0,
        resources: SorobanResources {
            footprint: LedgerFootprint {
                read_only: Default::default(),
                read_write: Default::default(),
            },
            instructions: 2_000_000,
            disk_read_bytes: 1024,
            write_bytes: 512,
        },
        resource_fee,
    }
    .to_xdr_base64(Limits::none())
    .unwrap()
}

/// Distinct authorization entry, `n` varies the payload
pub fn auth_entry(n: u8) -> SorobanAuthorizationEntry {
    SorobanAuthorizationEntry {
        credentials: SorobanCredentials::SourceAccount,
        root_invocation: SorobanAuthorizedInvocation {
            function: SorobanAuthorizedFunction::CreateContractHostFn(CreateContractArgs {
                contract_id_preimage: ContractIdPreimage::Asset(Asset::Native),
                executable: ContractExecutable::Wasm(Hash([n; 32])),
            }),
            sub_invocations: Default::default(),
        },
    }
}

pub fn auth_b64(n: u8) -> String {
    auth_entry(n).to_xdr_base64(Limits::none()).unwrap()
}

pub fn void_b64() -> String {
    ScVal::Void.to_xdr_base64(Limits::none()).unwrap()
}

/// `simulateTransaction` result with one operation result and no auth
pub fn simulation(min_resource_fee: i64) -> Value {
    json!({
        "transactionData": transaction_data_b64(min_resource_fee),
        "minResourceFee": min_resource_fee.to_string(),
        "latestLedger": 1000,
        "results": [{ "auth": [], "xdr": void_b64() }],
    })
}

/// `simulateTransaction` result that asks for a restore first
pub fn simulation_with_preamble(min_resource_fee: i64, restore_fee: i64) -> Value {
    json!({
        "transactionData": transaction_data_b64(min_resource_fee),
        "minResourceFee": min_resource_fee.to_string(),
        "latestLedger": 1000,
        "results": [{ "auth": [], "xdr": void_b64() }],
        "restorePreamble": {
            "minResourceFee": restore_fee.to_string(),
            "transactionData": transaction_data_b64(restore_fee),
        },
    })
}

pub fn sent(hash: &str) -> Value {
    json!({
        "hash": hash,
        "status": "PENDING",
        "latestLedger": 1000,
        "latestLedgerCloseTime": "1700000000",
    })
}

pub fn tx_status(status: &str) -> Value {
    json!({
        "status": status,
        "latestLedger": 1001,
        "oldestLedger": 1,
        "ledger": 1001,
        "createdAt": "1700000005",
    })
}

/// `getLedgerEntries` result with one entry
pub fn ledger_entry(latest: u32, live_until: u32) -> Value {
    json!({
        "latestLedger": latest,
        "entries": [{
            "key": "AAAA",
            "xdr": "AAAA",
            "lastModifiedLedgerSeq": latest.saturating_sub(10),
            "liveUntilLedgerSeq": live_until,
        }],
    })
}

/// `getLedgerEntries` result without entries
pub fn no_entries(latest: u32) -> Value {
    json!({ "latestLedger": latest, "entries": [] })
}

/// Script code and instance liveness answers, in that order
pub fn push_liveness(transport: &MockTransport, code_alive: bool, instance_alive: bool) {
    let answer = |alive: bool| {
        if alive {
            ledger_entry(1000, 5000)
        } else {
            ledger_entry(1000, 999)
        }
    };
    transport.push("getLedgerEntries", answer(code_alive));
    transport.push("getLedgerEntries", answer(instance_alive));
}
