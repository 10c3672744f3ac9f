//! Liveness Integration Tests
//!
//! Drives the TTL checks through a scripted transport and checks that the
//! liveness rule (`liveUntilLedgerSeq >= latestLedger`, missing entry is not
//! alive) holds end to end, and that RPC failures are not masked.
//!
//! Run with: cargo test --test liveness_test -- --nocapture

mod common;

use common::*;
use soroban_lifecycle::stellar_xdr::curr::{LedgerKey, Limits, ReadXdr};
use soroban_lifecycle::{liveness, Error};

#[tokio::test]
async fn test_live_until_equal_to_latest_is_alive() {
    init_logging();
    let transport = MockTransport::new();
    transport.push("getLedgerEntries", ledger_entry(1000, 1000));

    let result = liveness::is_code_alive(&client(&transport), &wasm_hash())
        .await
        .unwrap();

    assert!(result.alive);
    assert_eq!(result.entries.latest_ledger, 1000);
}

#[tokio::test]
async fn test_live_until_before_latest_is_not_alive() {
    init_logging();
    let transport = MockTransport::new();
    transport.push("getLedgerEntries", ledger_entry(1000, 999));

    let result = liveness::is_code_alive(&client(&transport), &wasm_hash())
        .await
        .unwrap();

    assert!(!result.alive);
}

#[tokio::test]
async fn test_no_entries_is_not_alive_and_not_an_error() {
    init_logging();
    let transport = MockTransport::new();
    transport.push("getLedgerEntries", no_entries(1000));

    let (contract, _) = contract(&transport, 0);
    let result = contract.is_instance_alive().await.unwrap();

    assert!(!result.alive);
    assert!(result.entries.entries().is_empty());
}

#[tokio::test]
async fn test_query_sends_the_encoded_code_key() {
    init_logging();
    let transport = MockTransport::new();
    transport.push("getLedgerEntries", ledger_entry(1000, 2000));

    let (contract, _) = contract(&transport, 0);
    contract.is_code_alive().await.unwrap();

    let calls = transport.calls();
    assert_eq!(calls.len(), 1);
    let keys = calls[0].params.as_ref().unwrap()["keys"].as_array().unwrap().clone();
    assert_eq!(keys.len(), 1);

    let key = LedgerKey::from_xdr_base64(keys[0].as_str().unwrap(), Limits::none()).unwrap();
    assert_eq!(key, contract.code_key().unwrap());
}

#[tokio::test]
async fn test_is_alive_needs_code_and_instance() {
    init_logging();
    let transport = MockTransport::new();
    let (contract, _) = contract(&transport, 0);

    push_liveness(&transport, true, true);
    assert!(contract.is_alive().await.unwrap());

    push_liveness(&transport, true, false);
    assert!(!contract.is_alive().await.unwrap());

    push_liveness(&transport, false, true);
    assert!(!contract.is_alive().await.unwrap());

    assert_eq!(transport.count("getLedgerEntries"), 6);
}

#[tokio::test]
async fn test_code_query_error_short_circuits() {
    init_logging();
    let transport = MockTransport::new();
    transport.push_error("getLedgerEntries", -32603, "internal error");
    transport.push("getLedgerEntries", ledger_entry(1000, 5000));

    let (contract, _) = contract(&transport, 0);
    let err = contract.is_alive().await.unwrap_err();

    match err {
        Error::Rpc { method, code, .. } => {
            assert_eq!(method, "getLedgerEntries");
            assert_eq!(code, -32603);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(transport.count("getLedgerEntries"), 1);
}
