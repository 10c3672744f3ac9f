//! Contract lifecycle: install, deploy, invoke and restore
//!
//! A [`Contract`] bundles the wasm code (or its hash), the deployment salt,
//! the RPC client, the source account and the signer. Each lifecycle
//! operation validates the fields it needs before touching the network,
//! builds a single Soroban operation, simulates it and submits the result.
//!
//! Submissions return as soon as the node accepts the transaction. Use
//! [`Contract::wait_for_completion`] to learn the execution outcome.

use std::sync::{Arc, OnceLock};

use sha2::{Digest, Sha256};
use stellar_xdr::curr::{
    LedgerFootprint, LedgerKey, Limits, ReadXdr, ScAddress, ScVal, SorobanResources,
    SorobanTransactionData, SorobanTransactionDataExt,
};

use crate::account::SourceAccount;
use crate::address::{contract_id_preimage, derive_contract_address};
use crate::client::SorobanClient;
use crate::invoke::InvokeBuilder;
use crate::keys::Signer;
use crate::liveness::{self, Liveness};
use crate::poller::{Completion, CompletionPoller};
use crate::transaction::{OperationKind, TimeBounds, TransactionAssembler};
use crate::types::SendTransactionResult;
use crate::{Error, Field, Result};

/// Default validity window of lifecycle transactions, in seconds
pub const DEFAULT_TX_TIMEOUT_SECS: u64 = 30;

/// Builder for [`Contract`]
#[derive(Default)]
pub struct ContractBuilder {
    wasm: Option<Vec<u8>>,
    wasm_hash: Option<[u8; 32]>,
    salt: Option<[u8; 32]>,
    client: Option<SorobanClient>,
    source: Option<Arc<SourceAccount>>,
    signer: Option<Arc<dyn Signer>>,
    address: Option<ScAddress>,
    tx_timeout_secs: Option<u64>,
}

impl ContractBuilder {
    /// Compiled contract code; also sets the wasm hash
    pub fn wasm(mut self, wasm: impl Into<Vec<u8>>) -> Self {
        let wasm = wasm.into();
        self.wasm_hash = Some(Sha256::digest(&wasm).into());
        self.wasm = Some(wasm);
        self
    }

    /// Hash of code that is already installed
    pub fn wasm_hash(mut self, wasm_hash: [u8; 32]) -> Self {
        self.wasm_hash = Some(wasm_hash);
        self
    }

    /// Deployment salt; the sha256 of the string is used
    pub fn salt(mut self, salt: &str) -> Self {
        self.salt = Some(Sha256::digest(salt.as_bytes()).into());
        self
    }

    /// Raw 32-byte deployment salt
    pub fn salt_bytes(mut self, salt: [u8; 32]) -> Self {
        self.salt = Some(salt);
        self
    }

    pub fn client(mut self, client: SorobanClient) -> Self {
        self.client = Some(client);
        self
    }

    pub fn source_account(mut self, source: Arc<SourceAccount>) -> Self {
        self.source = Some(source);
        self
    }

    pub fn signer(mut self, signer: Arc<dyn Signer>) -> Self {
        self.signer = Some(signer);
        self
    }

    /// Address of an existing contract; skips derivation
    pub fn address(mut self, address: ScAddress) -> Self {
        self.address = Some(address);
        self
    }

    pub fn tx_timeout_secs(mut self, secs: u64) -> Self {
        self.tx_timeout_secs = Some(secs);
        self
    }

    pub fn build(self) -> Contract {
        let tx_timeout_secs = self.tx_timeout_secs.unwrap_or_else(|| {
            self.client
                .as_ref()
                .map_or(DEFAULT_TX_TIMEOUT_SECS, |client| client.config().tx_timeout_secs)
        });
        let address = OnceLock::new();
        if let Some(known) = self.address {
            let _ = address.set(known);
        }

        Contract {
            wasm: self.wasm,
            wasm_hash: self.wasm_hash,
            salt: self.salt,
            client: self.client,
            source: self.source,
            signer: self.signer,
            address,
            tx_timeout_secs,
        }
    }
}

/// A contract and everything needed to manage its lifecycle
pub struct Contract {
    wasm: Option<Vec<u8>>,
    wasm_hash: Option<[u8; 32]>,
    salt: Option<[u8; 32]>,
    client: Option<SorobanClient>,
    source: Option<Arc<SourceAccount>>,
    signer: Option<Arc<dyn Signer>>,
    address: OnceLock<ScAddress>,
    tx_timeout_secs: u64,
}

impl Contract {
    /// Start building a contract
    ///
    /// # Example
    ///
    /// ```ignore
    /// let contract = Contract::builder()
    ///     .wasm(wasm_bytes)
    ///     .salt("hello")
    ///     .client(client)
    ///     .source_account(source)
    ///     .signer(keypair)
    ///     .build();
    ///
    /// let sent = contract.install().await?;
    /// contract.wait_for_completion(&sent.hash, 10).await?;
    /// ```
    pub fn builder() -> ContractBuilder {
        ContractBuilder::default()
    }

    pub fn wasm_hash(&self) -> Option<&[u8; 32]> {
        self.wasm_hash.as_ref()
    }

    pub(crate) fn require_client(&self) -> Result<&SorobanClient> {
        self.client.as_ref().ok_or(Error::MissingField(Field::Client))
    }

    pub(crate) fn require_source(&self) -> Result<&Arc<SourceAccount>> {
        self.source.as_ref().ok_or(Error::MissingField(Field::Source))
    }

    pub(crate) fn require_signer(&self) -> Result<&Arc<dyn Signer>> {
        self.signer.as_ref().ok_or(Error::MissingField(Field::Signer))
    }

    fn require_wasm_hash(&self) -> Result<&[u8; 32]> {
        self.wasm_hash
            .as_ref()
            .ok_or(Error::MissingField(Field::WasmHash))
    }

    fn require_salt(&self) -> Result<&[u8; 32]> {
        self.salt.as_ref().ok_or(Error::MissingField(Field::Salt))
    }

    /// Contract address, derived on first use and cached afterwards
    ///
    /// Requires source account, client and salt unless the address was given.
    pub fn address(&self) -> Result<&ScAddress> {
        if let Some(address) = self.address.get() {
            return Ok(address);
        }

        let source = self.require_source()?;
        let client = self.require_client()?;
        let salt = self.require_salt()?;

        let derived = derive_contract_address(source.account_id(), salt, client.passphrase())?;
        // A concurrent caller may have won the race with the same value
        let _ = self.address.set(derived);
        self.address
            .get()
            .ok_or_else(|| Error::Config("contract address could not be cached".to_string()))
    }

    /// Ledger key of the contract code
    pub fn code_key(&self) -> Result<LedgerKey> {
        Ok(liveness::code_key(self.require_wasm_hash()?))
    }

    /// Ledger key of the contract instance
    pub fn instance_key(&self) -> Result<LedgerKey> {
        self.require_wasm_hash()?;
        Ok(liveness::instance_key(self.address()?))
    }

    pub async fn is_code_alive(&self) -> Result<Liveness> {
        let client = self.require_client()?;
        liveness::is_code_alive(client, self.require_wasm_hash()?).await
    }

    pub async fn is_instance_alive(&self) -> Result<Liveness> {
        let client = self.require_client()?;
        self.require_wasm_hash()?;
        liveness::is_instance_alive(client, self.address()?).await
    }

    /// Code and instance both have TTL left
    pub async fn is_alive(&self) -> Result<bool> {
        let client = self.require_client()?;
        let wasm_hash = self.require_wasm_hash()?;
        liveness::is_alive(client, wasm_hash, self.address()?).await
    }

    /// Upload the contract wasm
    ///
    /// Requires client, source account, signer and wasm.
    pub async fn install(&self) -> Result<SendTransactionResult> {
        self.require_client()?;
        self.require_source()?;
        self.require_signer()?;
        let wasm = self.wasm.as_ref().ok_or(Error::MissingField(Field::Wasm))?;

        log::info!("🚀 Installing contract wasm ({} bytes)", wasm.len());
        self.simulate_and_send(OperationKind::Upload { wasm: wasm.clone() })
            .await
    }

    /// Create a contract instance from installed code
    ///
    /// Requires client, source account, signer, wasm hash and salt. Fails with
    /// `Error::CodeNeedsRestore` when the code has no TTL left.
    pub async fn deploy(&self) -> Result<SendTransactionResult> {
        self.require_client()?;
        let source = self.require_source()?;
        self.require_signer()?;
        let wasm_hash = *self.require_wasm_hash()?;
        let salt = self.require_salt()?;

        log::info!("🚀 Deploying contract from code {}", hex::encode(wasm_hash));
        if !self.is_code_alive().await?.alive {
            log::error!("   ❌ Wasm code has no TTL left");
            return Err(Error::CodeNeedsRestore);
        }

        let preimage = contract_id_preimage(source.account_id(), salt)?;
        self.simulate_and_send(OperationKind::Create {
            preimage,
            wasm_hash,
        })
        .await
    }

    /// Start building a function invocation
    pub fn invoke(&self) -> InvokeBuilder<'_> {
        InvokeBuilder::new(self)
    }

    /// Restore the contract code and instance
    ///
    /// Requires client, source account, signer, wasm hash and salt (or address).
    pub async fn restore(&self) -> Result<SendTransactionResult> {
        self.require_client()?;
        self.require_source()?;
        self.require_signer()?;
        let read_write = vec![self.code_key()?, self.instance_key()?];

        log::info!("♻️  Restoring contract code and instance");
        let data = SorobanTransactionData {
            ext: SorobanTransactionDataExt::V0,
            resources: SorobanResources {
                footprint: LedgerFootprint {
                    read_only: Default::default(),
                    read_write: read_write.try_into()?,
                },
                instructions: 0,
                disk_read_bytes: 0,
                write_bytes: 0,
            },
            resource_fee: 0,
        };

        let mut tx = self.assembler(OperationKind::Restore)?.soroban_data(data);
        tx.simulate().await?;
        tx.finalize_and_send().await
    }

    /// Poll until the transaction leaves `NOT_FOUND` or attempts run out
    pub async fn wait_for_completion(&self, hash: &str, max_attempts: u32) -> Result<Completion> {
        let client = self.require_client()?;
        CompletionPoller::new(client.clone())
            .wait(hash, max_attempts)
            .await
    }

    pub(crate) async fn wait_for_restore(&self, hash: &str) -> Result<()> {
        let attempts = self.require_client()?.config().restore_poll_attempts;
        match self.wait_for_completion(hash, attempts).await? {
            Completion::Completed(result) => {
                log::info!("   ✓ Restore {} finished: {:?}", hash, result.status)
            }
            Completion::Inconclusive { .. } => {
                log::warn!("⚠️  Restore {} unresolved, continuing", hash)
            }
        }
        Ok(())
    }

    /// Simulate and send an invocation, restoring archived data when allowed
    pub(crate) async fn invoke_function(
        &self,
        function: &str,
        args: Vec<ScVal>,
        restore: bool,
    ) -> Result<SendTransactionResult> {
        let contract = self.address()?.clone();
        let mut tx = self.assembler(OperationKind::Invoke {
            contract,
            function: function.to_string(),
            args,
        })?;

        let simulation = tx.simulate().await?;
        if let (true, Some(preamble)) = (
            simulation.requires_restore(),
            simulation.restore_preamble.as_ref(),
        ) {
            if !restore {
                log::error!("   ❌ Contract data has no TTL left");
                return Err(Error::ContractDataNeedsRestore);
            }

            log::info!("♻️  Restoring archived contract data before invoking");
            let data = SorobanTransactionData::from_xdr_base64(
                &preamble.transaction_data,
                Limits::none(),
            )?;
            let min_base_fee = self.require_client()?.min_base_fee();
            let base_fee = preamble
                .min_resource_fee
                .checked_add(i64::from(min_base_fee))
                .and_then(|fee| u32::try_from(fee).ok())
                .ok_or_else(|| Error::assembly("restore fee does not fit in u32"))?;

            let restore_tx = self
                .assembler(OperationKind::Restore)?
                .soroban_data(data)
                .base_fee(base_fee);
            let sent = restore_tx.finalize_and_send().await?;
            self.wait_for_restore(&sent.hash).await?;
        }

        tx.finalize_and_send().await
    }

    async fn simulate_and_send(&self, operation: OperationKind) -> Result<SendTransactionResult> {
        let mut tx = self.assembler(operation)?;
        tx.simulate().await?;
        tx.finalize_and_send().await
    }

    fn assembler(&self, operation: OperationKind) -> Result<TransactionAssembler> {
        Ok(TransactionAssembler::new()
            .client(self.require_client()?.clone())
            .source_account(self.require_source()?.clone())
            .signer(self.require_signer()?.clone())
            .operation(operation)
            .time_bounds(TimeBounds::timeout(self.tx_timeout_secs)))
    }
}

impl std::fmt::Debug for Contract {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Contract")
            .field("wasm_len", &self.wasm.as_ref().map(Vec::len))
            .field("wasm_hash", &self.wasm_hash.map(hex::encode))
            .field("source", &self.source.as_ref().map(|s| s.account_id()))
            .field("address", &self.address.get())
            .field("tx_timeout_secs", &self.tx_timeout_secs)
            .finish()
    }
}
