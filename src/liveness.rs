//! TTL liveness of contract code and instances
//!
//! An entry is alive while `liveUntilLedgerSeq >= latestLedger`, both taken
//! from the same `getLedgerEntries` response. A missing entry is not alive;
//! that is a normal answer, not an error.

use stellar_xdr::curr::{
    ContractDataDurability, Hash, LedgerKey, LedgerKeyContractCode, LedgerKeyContractData,
    ScAddress, ScVal,
};

use crate::client::SorobanClient;
use crate::types::GetLedgerEntriesResult;
use crate::Result;

/// Liveness answer together with the raw query result
#[derive(Debug, Clone)]
pub struct Liveness {
    pub alive: bool,
    pub entries: GetLedgerEntriesResult,
}

/// Ledger key of installed wasm code
pub fn code_key(wasm_hash: &[u8; 32]) -> LedgerKey {
    LedgerKey::ContractCode(LedgerKeyContractCode {
        hash: Hash(*wasm_hash),
    })
}

/// Ledger key of a contract instance
pub fn instance_key(address: &ScAddress) -> LedgerKey {
    LedgerKey::ContractData(LedgerKeyContractData {
        contract: address.clone(),
        key: ScVal::LedgerKeyContractInstance,
        durability: ContractDataDurability::Persistent,
    })
}

/// True when the first returned entry lives at least until the latest ledger
pub fn evaluate(result: &GetLedgerEntriesResult) -> bool {
    result
        .entries()
        .first()
        .and_then(|entry| entry.live_until_ledger_seq)
        .map_or(false, |live_until| live_until >= result.latest_ledger)
}

async fn query(client: &SorobanClient, key: LedgerKey) -> Result<Liveness> {
    let entries = client.get_ledger_entries(&[key]).await?;
    let alive = evaluate(&entries);
    log::debug!(
        "   🔍 {} entr(ies) at ledger {}, alive: {}",
        entries.entries().len(),
        entries.latest_ledger,
        alive
    );
    Ok(Liveness { alive, entries })
}

pub async fn is_code_alive(client: &SorobanClient, wasm_hash: &[u8; 32]) -> Result<Liveness> {
    log::debug!("🔍 Checking code liveness: {}", hex::encode(wasm_hash));
    query(client, code_key(wasm_hash)).await
}

pub async fn is_instance_alive(client: &SorobanClient, address: &ScAddress) -> Result<Liveness> {
    log::debug!("🔍 Checking instance liveness");
    query(client, instance_key(address)).await
}

/// Code and instance both alive; a failed code query skips the instance query
pub async fn is_alive(
    client: &SorobanClient,
    wasm_hash: &[u8; 32],
    address: &ScAddress,
) -> Result<bool> {
    let code = is_code_alive(client, wasm_hash).await?;
    let instance = is_instance_alive(client, address).await?;
    Ok(code.alive && instance.alive)
}
