//! Simulation Pipeline Integration Tests
//!
//! Checks the simulate → write-back → finalize → send sequence against a
//! scripted transport: fee, authorization and resource data flow into the
//! submitted envelope, and simulation never consumes a sequence number.
//!
//! Run with: cargo test --test simulation_test -- --nocapture

mod common;

use common::*;
use serde_json::json;
use soroban_lifecycle::stellar_xdr::curr::{
    OperationBody, TransactionEnvelope, TransactionExt,
};
use soroban_lifecycle::{
    Error, Field, OperationKind, SendStatus, TimeBounds, TransactionAssembler,
};

fn upload_assembler(
    transport: &std::sync::Arc<MockTransport>,
    sequence: i64,
) -> (TransactionAssembler, std::sync::Arc<soroban_lifecycle::SourceAccount>) {
    let keypair = keypair();
    let source = source(&keypair, sequence);
    let assembler = TransactionAssembler::new()
        .client(client(transport))
        .source_account(source.clone())
        .signer(keypair)
        .operation(OperationKind::Upload {
            wasm: WASM.to_vec(),
        })
        .time_bounds(TimeBounds::timeout(30));
    (assembler, source)
}

#[tokio::test]
async fn test_simulate_writes_back_fee_and_auth_union() {
    init_logging();
    let transport = MockTransport::new();
    transport.push(
        "simulateTransaction",
        json!({
            "transactionData": transaction_data_b64(100),
            "minResourceFee": "100",
            "latestLedger": 1000,
            "results": [
                { "auth": [auth_b64(1), auth_b64(2)], "xdr": void_b64() },
                { "auth": [auth_b64(3)], "xdr": void_b64() },
            ],
        }),
    );

    let (mut assembler, source) = upload_assembler(&transport, 41);
    let result = assembler.simulate().await.unwrap();

    assert_eq!(result.min_resource_fee, 100);
    assert_eq!(assembler.get_base_fee(), 100 + soroban_lifecycle::MIN_BASE_FEE);
    assert_eq!(
        assembler.authorization(),
        &[auth_entry(1), auth_entry(2), auth_entry(3)]
    );
    assert_eq!(assembler.get_soroban_data().unwrap().resource_fee, 100);

    // simulation peeks the next sequence number without consuming it
    assert_eq!(source.sequence_number(), 41);
    let simulated = transport.simulated_envelopes();
    let TransactionEnvelope::Tx(v1) = &simulated[0] else {
        panic!("expected a V1 envelope");
    };
    assert_eq!(v1.tx.seq_num.0, 42);
    assert!(v1.signatures.is_empty());
}

#[tokio::test]
async fn test_finalize_and_send_submits_prepared_transaction() {
    init_logging();
    let transport = MockTransport::new();
    transport.push("simulateTransaction", simulation(250));
    transport.push("sendTransaction", sent("abc123"));

    let (mut assembler, source) = upload_assembler(&transport, 7);
    assembler.simulate().await.unwrap();
    let result = assembler.finalize_and_send().await.unwrap();

    assert_eq!(result.hash, "abc123");
    assert_eq!(result.status, SendStatus::Pending);
    assert_eq!(source.sequence_number(), 8);

    let envelopes = transport.sent_envelopes();
    assert_eq!(envelopes.len(), 1);
    let TransactionEnvelope::Tx(v1) = &envelopes[0] else {
        panic!("expected a V1 envelope");
    };
    assert_eq!(v1.tx.fee, 350);
    assert_eq!(v1.tx.seq_num.0, 8);
    assert_eq!(v1.signatures.len(), 1);
    assert!(matches!(v1.tx.ext, TransactionExt::V1(_)));
    assert!(matches!(
        v1.tx.operations[0].body,
        OperationBody::InvokeHostFunction(_)
    ));
}

#[tokio::test]
async fn test_simulation_error_is_reported() {
    init_logging();
    let transport = MockTransport::new();
    transport.push(
        "simulateTransaction",
        json!({ "error": "HostError: Error(WasmVm, InvalidAction)", "latestLedger": 1000 }),
    );

    let (mut assembler, _) = upload_assembler(&transport, 0);
    let err = assembler.simulate().await.unwrap_err();

    assert!(matches!(err, Error::Simulation(msg) if msg.contains("HostError")));
    assert_eq!(assembler.get_base_fee(), soroban_lifecycle::MIN_BASE_FEE);
    assert!(assembler.get_soroban_data().is_none());
}

#[tokio::test]
async fn test_send_requires_signer() {
    init_logging();
    let transport = MockTransport::new();
    let keypair = keypair();

    let assembler = TransactionAssembler::new()
        .client(client(&transport))
        .source_account(source(&keypair, 0))
        .operation(OperationKind::Restore)
        .time_bounds(TimeBounds::infinite());

    assert!(matches!(
        assembler.finalize_and_send().await,
        Err(Error::MissingField(Field::Signer))
    ));
    assert!(transport.calls().is_empty());
}

#[tokio::test]
async fn test_rpc_error_propagates_unchanged() {
    init_logging();
    let transport = MockTransport::new();
    transport.push_error("simulateTransaction", -32602, "invalid transaction");

    let (mut assembler, _) = upload_assembler(&transport, 0);
    let err = assembler.simulate().await.unwrap_err();

    assert!(matches!(err, Error::Rpc { code: -32602, .. }));
}

#[tokio::test]
async fn test_rejected_submission_hands_back_sequence() {
    init_logging();
    let transport = MockTransport::new();
    transport.push("simulateTransaction", simulation(100));
    transport.push_error("sendTransaction", -32603, "node unavailable");
    transport.push(
        "sendTransaction",
        json!({ "hash": "retry", "status": "ERROR", "latestLedger": 1000 }),
    );
    transport.push("sendTransaction", sent("accepted"));

    let (mut assembler, source) = upload_assembler(&transport, 20);
    assembler.simulate().await.unwrap();

    let err = assembler.finalize_and_send().await.unwrap_err();
    assert!(matches!(err, Error::Rpc { code: -32603, .. }));
    assert_eq!(source.sequence_number(), 20);

    let rejected = assembler.finalize_and_send().await.unwrap();
    assert_eq!(rejected.status, SendStatus::Error);
    assert_eq!(source.sequence_number(), 20);

    let accepted = assembler.finalize_and_send().await.unwrap();
    assert_eq!(accepted.status, SendStatus::Pending);
    assert_eq!(source.sequence_number(), 21);

    // every attempt reused the same slot
    let sequences: Vec<i64> = transport
        .sent_envelopes()
        .iter()
        .map(|envelope| {
            let TransactionEnvelope::Tx(v1) = envelope else {
                panic!("expected a V1 envelope");
            };
            v1.tx.seq_num.0
        })
        .collect();
    assert_eq!(sequences, vec![21, 21, 21]);
}
