//! Simulate, then finalize and send
//!
//! Simulation runs against a transaction built with the *next* sequence
//! number peeked, not consumed. Its output (resource fee, footprint and
//! authorization entries) is written back into the assembler so that the
//! following [`finalize_and_send`](TransactionAssembler::finalize_and_send)
//! submits a fully prepared transaction.

use stellar_xdr::curr::{
    Limits, ReadXdr, ScVal, SorobanAuthorizationEntry, SorobanTransactionData, TransactionEnvelope,
    TransactionV1Envelope,
};

use crate::transaction::{sign, TransactionAssembler};
use crate::types::{SendStatus, SendTransactionResult, SimulateTransactionResult};
use crate::{Error, Field, Result};

impl TransactionAssembler {
    /// Dry-run the transaction and fold the result back into this assembler
    ///
    /// Returns the raw simulation result so the caller can inspect the
    /// restore preamble. The source sequence number is not consumed.
    pub async fn simulate(&mut self) -> Result<SimulateTransactionResult> {
        let client = self.require_client()?.clone();

        log::info!("🧪 Simulating transaction");
        let tx = self.build(false)?;
        let envelope = TransactionEnvelope::Tx(TransactionV1Envelope {
            tx,
            signatures: Default::default(),
        });

        let result = client.simulate_transaction(&envelope).await?;
        if let Some(error) = &result.error {
            log::error!("   ❌ Simulation failed: {}", error);
            return Err(Error::Simulation(error.clone()));
        }

        self.apply_simulation(&result, client.min_base_fee())?;
        log::info!(
            "   ✓ Simulated: resource fee {}, base fee now {}",
            result.min_resource_fee,
            self.get_base_fee()
        );
        if result.requires_restore() {
            log::warn!("⚠️  Simulation reports archived state in the footprint");
        }

        Ok(result)
    }

    /// Write simulation output into the assembler
    ///
    /// * base fee becomes `min_resource_fee + min_base_fee`
    /// * the decoded transaction data becomes the Soroban extension
    /// * authorization entries from every operation result are attached together
    pub fn apply_simulation(
        &mut self,
        result: &SimulateTransactionResult,
        min_base_fee: u32,
    ) -> Result<()> {
        let mut auth = Vec::new();
        for op_result in &result.results {
            if !op_result.xdr.is_empty() {
                ScVal::from_xdr_base64(&op_result.xdr, Limits::none())?;
            }
            for entry in &op_result.auth {
                auth.push(SorobanAuthorizationEntry::from_xdr_base64(
                    entry,
                    Limits::none(),
                )?);
            }
        }

        if result.transaction_data.is_empty() {
            return Err(Error::Simulation(
                "simulation returned no transaction data".to_string(),
            ));
        }
        let data = SorobanTransactionData::from_xdr_base64(&result.transaction_data, Limits::none())?;

        let base_fee = result
            .min_resource_fee
            .checked_add(i64::from(min_base_fee))
            .and_then(|fee| u32::try_from(fee).ok())
            .ok_or_else(|| {
                Error::assembly(format!(
                    "resource fee {} does not fit in a u32 base fee",
                    result.min_resource_fee
                ))
            })?;

        self.set_base_fee(base_fee);
        self.attach_soroban_data(data);
        // restore operations never carry auth; only warn when some was returned
        let takes_auth = self
            .operations()
            .first()
            .is_some_and(|op| op.kind.accepts_authorization());
        if takes_auth || !auth.is_empty() {
            self.attach_authorization(auth);
        }
        Ok(())
    }

    /// Build with sequence increment, sign with every signer and submit
    ///
    /// The returned status only says whether the node accepted the
    /// transaction; poll `getTransaction` for the execution outcome. When
    /// the submission fails or comes back `ERROR` / `TRY_AGAIN_LATER`, the
    /// consumed sequence number is handed back to the source account.
    pub async fn finalize_and_send(&self) -> Result<SendTransactionResult> {
        let client = self.require_client()?;
        if self.signers().is_empty() {
            return Err(Error::MissingField(Field::Signer));
        }

        let tx = self.finalize()?;
        let envelope = match sign(tx.clone(), client.passphrase(), self.signers()) {
            Ok(envelope) => envelope,
            Err(e) => {
                self.release_sequence(&tx);
                return Err(e);
            }
        };

        log::info!("📤 Sending transaction");
        match client.send_transaction(&envelope).await {
            Ok(result) if matches!(result.status, SendStatus::Error | SendStatus::TryAgainLater) => {
                log::error!("   ❌ Not accepted: {} ({:?})", result.hash, result.status);
                self.release_sequence(&tx);
                Ok(result)
            }
            Ok(result) => {
                log::info!("   ✓ Sent: {} ({:?})", result.hash, result.status);
                Ok(result)
            }
            Err(e) => {
                self.release_sequence(&tx);
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transaction::OperationKind;
    use crate::types::SimulateHostFunctionResult;
    use stellar_xdr::curr::{
        LedgerFootprint, SorobanAuthorizedFunction, SorobanAuthorizedInvocation,
        SorobanCredentials, SorobanResources, SorobanTransactionDataExt, WriteXdr,
    };

    fn data_b64(resource_fee: i64) -> String {
        SorobanTransactionData {
            ext: SorobanTransactionDataExt::V0,
            resources: SorobanResources {
                footprint: LedgerFootprint {
                    read_only: Default::default(),
                    read_write: Default::default(),
                },
                instructions: 1000,
                disk_read_bytes: 0,
                write_bytes: 0,
            },
            resource_fee,
        }
        .to_xdr_base64(Limits::none())
        .unwrap()
    }

    fn auth_b64(wasm: &[u8]) -> String {
        SorobanAuthorizationEntry {
            credentials: SorobanCredentials::SourceAccount,
            root_invocation: SorobanAuthorizedInvocation {
                function: SorobanAuthorizedFunction::CreateContractHostFn(
                    stellar_xdr::curr::CreateContractArgs {
                        contract_id_preimage: stellar_xdr::curr::ContractIdPreimage::Asset(
                            stellar_xdr::curr::Asset::Native,
                        ),
                        executable: stellar_xdr::curr::ContractExecutable::Wasm(
                            stellar_xdr::curr::Hash(wasm.try_into().unwrap()),
                        ),
                    },
                ),
                sub_invocations: Default::default(),
            },
        }
        .to_xdr_base64(Limits::none())
        .unwrap()
    }

    #[test]
    fn test_apply_simulation_writes_back() {
        let mut assembler = TransactionAssembler::new().operation(OperationKind::Upload {
            wasm: vec![1, 2, 3],
        });
        let result = SimulateTransactionResult {
            transaction_data: data_b64(100),
            min_resource_fee: 100,
            results: vec![
                SimulateHostFunctionResult {
                    auth: vec![auth_b64(&[1u8; 32])],
                    xdr: ScVal::Void.to_xdr_base64(Limits::none()).unwrap(),
                },
                SimulateHostFunctionResult {
                    auth: vec![auth_b64(&[2u8; 32]), auth_b64(&[3u8; 32])],
                    xdr: String::new(),
                },
            ],
            ..Default::default()
        };

        assembler.apply_simulation(&result, 100).unwrap();
        assert_eq!(assembler.get_base_fee(), 200);
        assert_eq!(assembler.authorization().len(), 3);
        assert_eq!(assembler.get_soroban_data().unwrap().resource_fee, 100);
    }

    #[test]
    fn test_apply_simulation_requires_transaction_data() {
        let mut assembler = TransactionAssembler::new().operation(OperationKind::Restore);
        let err = assembler
            .apply_simulation(&SimulateTransactionResult::default(), 100)
            .unwrap_err();
        assert!(matches!(err, Error::Simulation(_)));
    }

    #[tokio::test]
    async fn test_simulate_without_client() {
        let mut assembler = TransactionAssembler::new().operation(OperationKind::Restore);
        assert!(matches!(
            assembler.simulate().await,
            Err(Error::MissingField(Field::Client))
        ));
    }
}
