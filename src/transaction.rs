//! Transaction assembly
//!
//! [`TransactionAssembler`] collects everything a Stellar transaction needs
//! (source, operations, preconditions, fee, memo, signers and the optional
//! Soroban extension) and turns it into an XDR [`Transaction`] on
//! [`finalize`](TransactionAssembler::finalize).
//!
//! Configuration methods consume the assembler and return the updated value:
//!
//! ```ignore
//! let tx = TransactionAssembler::new()
//!     .client(client)
//!     .source_account(source)
//!     .signer(keypair)
//!     .operation(OperationKind::Restore)
//!     .time_bounds(TimeBounds::timeout(30))
//!     .finalize()?;
//! ```
//!
//! Simulation output is written back in place through
//! [`attach_authorization`](TransactionAssembler::attach_authorization) and
//! [`attach_soroban_data`](TransactionAssembler::attach_soroban_data). Both
//! only apply to the leading Soroban operation and report
//! [`Attachment::Skipped`] otherwise.

use std::fmt;
use std::sync::Arc;

use sha2::{Digest, Sha256};
use stellar_xdr::curr::{
    ContractExecutable, ContractIdPreimage, CreateContractArgs, DecoratedSignature, Duration,
    ExtensionPoint, Hash, HostFunction, InvokeContractArgs, InvokeHostFunctionOp, LedgerBounds,
    Limits, Memo, MuxedAccount, Operation as XdrOperation, OperationBody, Preconditions,
    PreconditionsV2, RestoreFootprintOp, ScAddress, ScSymbol, ScVal, SequenceNumber, SignerKey,
    SignerKeyEd25519SignedPayload, SorobanAuthorizationEntry, SorobanTransactionData, TimePoint,
    Transaction, TransactionEnvelope, TransactionExt, TransactionSignaturePayload,
    TransactionSignaturePayloadTaggedTransaction, TransactionV1Envelope, Uint256, WriteXdr,
};

use crate::account::SourceAccount;
use crate::address::network_id;
use crate::client::SorobanClient;
use crate::config::MIN_BASE_FEE;
use crate::keys::{parse_account_id, Signer};
use crate::{Error, Field, Result};

/// Maximum number of operations in one transaction
pub const MAX_OPERATIONS: usize = 100;

/// Maximum number of extra signer preconditions
pub const MAX_EXTRA_SIGNERS: usize = 2;

/// Operation carried by a transaction
#[derive(Debug, Clone, PartialEq)]
pub enum OperationKind {
    /// Upload contract wasm code
    Upload { wasm: Vec<u8> },
    /// Create a contract instance from installed code
    Create {
        preimage: ContractIdPreimage,
        wasm_hash: [u8; 32],
    },
    /// Invoke a contract function
    Invoke {
        contract: ScAddress,
        function: String,
        args: Vec<ScVal>,
    },
    /// Restore archived entries listed in the read-write footprint
    Restore,
    /// Any other (non-Soroban) operation
    Classic(OperationBody),
}

impl OperationKind {
    /// Host function operations accept authorization entries
    pub fn accepts_authorization(&self) -> bool {
        matches!(self, Self::Upload { .. } | Self::Create { .. } | Self::Invoke { .. })
    }

    /// Host function and restore operations accept Soroban resource data
    pub fn accepts_soroban_data(&self) -> bool {
        !matches!(self, Self::Classic(_))
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Upload { .. } => "upload",
            Self::Create { .. } => "create",
            Self::Invoke { .. } => "invoke",
            Self::Restore => "restore",
            Self::Classic(_) => "classic",
        }
    }
}

/// An operation with its optional source and authorization entries
#[derive(Debug, Clone, PartialEq)]
pub struct Operation {
    pub kind: OperationKind,
    pub source_account: Option<String>,
    pub auth: Vec<SorobanAuthorizationEntry>,
}

impl Operation {
    pub fn to_xdr(&self) -> Result<XdrOperation> {
        let host_function = |host_function| -> Result<OperationBody> {
            Ok(OperationBody::InvokeHostFunction(InvokeHostFunctionOp {
                host_function,
                auth: self.auth.clone().try_into()?,
            }))
        };

        let body = match &self.kind {
            OperationKind::Upload { wasm } => {
                host_function(HostFunction::UploadContractWasm(wasm.clone().try_into()?))?
            }
            OperationKind::Create {
                preimage,
                wasm_hash,
            } => host_function(HostFunction::CreateContract(CreateContractArgs {
                contract_id_preimage: preimage.clone(),
                executable: ContractExecutable::Wasm(Hash(*wasm_hash)),
            }))?,
            OperationKind::Invoke {
                contract,
                function,
                args,
            } => host_function(HostFunction::InvokeContract(InvokeContractArgs {
                contract_address: contract.clone(),
                function_name: ScSymbol(function.as_str().try_into()?),
                args: args.clone().try_into()?,
            }))?,
            OperationKind::Restore => OperationBody::RestoreFootprint(RestoreFootprintOp {
                ext: ExtensionPoint::V0,
            }),
            OperationKind::Classic(body) => body.clone(),
        };

        let source_account = self
            .source_account
            .as_deref()
            .map(muxed_account)
            .transpose()?;

        Ok(XdrOperation {
            source_account,
            body,
        })
    }
}

impl From<OperationKind> for Operation {
    fn from(kind: OperationKind) -> Self {
        Self {
            kind,
            source_account: None,
            auth: Vec::new(),
        }
    }
}

/// Outcome of attaching simulation output to the transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attachment {
    Applied,
    /// The leading operation does not accept this kind of data
    Skipped,
}

/// Validity window, in unix seconds (0 means unbounded)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeBounds {
    pub min_time: u64,
    pub max_time: u64,
}

impl TimeBounds {
    pub fn new(min_time: u64, max_time: u64) -> Self {
        Self { min_time, max_time }
    }

    /// Valid from now until `secs` seconds from now
    pub fn timeout(secs: u64) -> Self {
        let now = u64::try_from(chrono::Utc::now().timestamp()).unwrap_or(0);
        Self::new(0, now.saturating_add(secs))
    }

    /// Never expires
    pub fn infinite() -> Self {
        Self::new(0, 0)
    }

    fn to_xdr(self) -> stellar_xdr::curr::TimeBounds {
        stellar_xdr::curr::TimeBounds {
            min_time: TimePoint(self.min_time),
            max_time: TimePoint(self.max_time),
        }
    }
}

/// Build state of a single transaction
#[derive(Clone)]
pub struct TransactionAssembler {
    client: Option<SorobanClient>,
    source: Option<Arc<SourceAccount>>,
    operations: Vec<Operation>,
    signers: Vec<Arc<dyn Signer>>,
    time_bounds: Option<TimeBounds>,
    ledger_bounds: Option<LedgerBounds>,
    min_sequence_number: Option<i64>,
    min_sequence_age: u64,
    min_sequence_ledger_gap: u32,
    extra_signers: Vec<String>,
    memo: Memo,
    base_fee: u32,
    increment_sequence: bool,
    soroban_data: Option<SorobanTransactionData>,
}

impl Default for TransactionAssembler {
    fn default() -> Self {
        Self::new()
    }
}

impl TransactionAssembler {
    pub fn new() -> Self {
        Self {
            client: None,
            source: None,
            operations: Vec::new(),
            signers: Vec::new(),
            time_bounds: None,
            ledger_bounds: None,
            min_sequence_number: None,
            min_sequence_age: 0,
            min_sequence_ledger_gap: 0,
            extra_signers: Vec::new(),
            memo: Memo::None,
            base_fee: MIN_BASE_FEE,
            increment_sequence: true,
            soroban_data: None,
        }
    }

    pub fn client(mut self, client: SorobanClient) -> Self {
        self.client = Some(client);
        self
    }

    pub fn source_account(mut self, source: Arc<SourceAccount>) -> Self {
        self.source = Some(source);
        self
    }

    pub fn operation(mut self, operation: impl Into<Operation>) -> Self {
        self.operations.push(operation.into());
        self
    }

    pub fn signer(mut self, signer: Arc<dyn Signer>) -> Self {
        self.signers.push(signer);
        self
    }

    pub fn time_bounds(mut self, time_bounds: TimeBounds) -> Self {
        self.time_bounds = Some(time_bounds);
        self
    }

    /// Valid for ledgers `min <= n < max` (`max == 0` leaves it open)
    pub fn ledger_bounds(mut self, min_ledger: u32, max_ledger: u32) -> Self {
        self.ledger_bounds = Some(LedgerBounds {
            min_ledger,
            max_ledger,
        });
        self
    }

    pub fn min_sequence_number(mut self, min_sequence_number: i64) -> Self {
        self.min_sequence_number = Some(min_sequence_number);
        self
    }

    /// Seconds that must pass after the source account's sequence time
    pub fn min_sequence_age(mut self, secs: u64) -> Self {
        self.min_sequence_age = secs;
        self
    }

    /// Ledgers that must close after the source account's sequence ledger
    pub fn min_sequence_ledger_gap(mut self, gap: u32) -> Self {
        self.min_sequence_ledger_gap = gap;
        self
    }

    /// Require a signature from `signer` (G..., T..., X... or P... strkey)
    pub fn extra_signer(mut self, signer: impl Into<String>) -> Self {
        self.extra_signers.push(signer.into());
        self
    }

    pub fn memo(mut self, memo: Memo) -> Self {
        self.memo = memo;
        self
    }

    /// Per-operation fee in stroops
    pub fn base_fee(mut self, base_fee: u32) -> Self {
        self.base_fee = base_fee;
        self
    }

    pub fn increment_sequence(mut self, increment: bool) -> Self {
        self.increment_sequence = increment;
        self
    }

    /// Builder form of [`attach_soroban_data`](Self::attach_soroban_data)
    pub fn soroban_data(mut self, data: SorobanTransactionData) -> Self {
        self.attach_soroban_data(data);
        self
    }

    /// Set the authorization entries of the leading host function operation
    pub fn attach_authorization(&mut self, auth: Vec<SorobanAuthorizationEntry>) -> Attachment {
        match self.operations.first_mut() {
            Some(op) if op.kind.accepts_authorization() => {
                log::debug!("   🔏 Attached {} authorization entr(ies)", auth.len());
                op.auth = auth;
                Attachment::Applied
            }
            other => {
                log::warn!(
                    "⚠️  Authorization not attached: leading operation is {}",
                    other.map_or("missing", |op| op.kind.name())
                );
                Attachment::Skipped
            }
        }
    }

    /// Set the Soroban resource data when the leading operation is a Soroban operation
    pub fn attach_soroban_data(&mut self, data: SorobanTransactionData) -> Attachment {
        match self.operations.first() {
            Some(op) if op.kind.accepts_soroban_data() => {
                log::debug!(
                    "   📦 Attached Soroban data (resource fee {})",
                    data.resource_fee
                );
                self.soroban_data = Some(data);
                Attachment::Applied
            }
            other => {
                log::warn!(
                    "⚠️  Soroban data not attached: leading operation is {}",
                    other.map_or("missing", |op| op.kind.name())
                );
                Attachment::Skipped
            }
        }
    }

    pub(crate) fn set_base_fee(&mut self, base_fee: u32) {
        self.base_fee = base_fee;
    }

    pub fn get_base_fee(&self) -> u32 {
        self.base_fee
    }

    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    /// Authorization entries of the leading operation
    pub fn authorization(&self) -> &[SorobanAuthorizationEntry] {
        self.operations
            .first()
            .map_or(&[], |op| op.auth.as_slice())
    }

    pub fn get_soroban_data(&self) -> Option<&SorobanTransactionData> {
        self.soroban_data.as_ref()
    }

    pub fn signers(&self) -> &[Arc<dyn Signer>] {
        &self.signers
    }

    pub(crate) fn require_client(&self) -> Result<&SorobanClient> {
        self.client.as_ref().ok_or(Error::MissingField(Field::Client))
    }

    /// Give back the sequence number `tx` consumed, after a rejected submission
    pub(crate) fn release_sequence(&self, tx: &Transaction) {
        let Some(source) = self.source.as_ref().filter(|_| self.increment_sequence) else {
            return;
        };
        if source.release_sequence_number(tx.seq_num.0) {
            log::debug!("   ↩️  Released sequence number {}", tx.seq_num.0);
        } else {
            log::warn!(
                "⚠️  Sequence number {} of {} was not released; reload the account",
                tx.seq_num.0,
                source.account_id()
            );
        }
    }

    /// Build the transaction, consuming a sequence number if incrementing is enabled
    pub fn finalize(&self) -> Result<Transaction> {
        self.build(self.increment_sequence)
    }

    pub(crate) fn build(&self, increment: bool) -> Result<Transaction> {
        let source = self.source.as_ref().ok_or(Error::MissingField(Field::Source))?;

        if self.operations.is_empty() {
            return Err(Error::assembly("transaction has no operations"));
        }
        if self.operations.len() > MAX_OPERATIONS {
            return Err(Error::assembly(format!(
                "transaction has {} operations, at most {} allowed",
                self.operations.len(),
                MAX_OPERATIONS
            )));
        }
        let soroban = self
            .operations
            .iter()
            .any(|op| !matches!(op.kind, OperationKind::Classic(_)));
        if soroban && self.operations.len() > 1 {
            return Err(Error::assembly(
                "a Soroban operation must be the only operation in its transaction",
            ));
        }

        let min_base_fee = self
            .client
            .as_ref()
            .map_or(MIN_BASE_FEE, |client| client.min_base_fee());
        if self.base_fee < min_base_fee {
            return Err(Error::assembly(format!(
                "base fee {} is below the minimum of {}",
                self.base_fee, min_base_fee
            )));
        }
        let fee = u32::try_from(self.operations.len())
            .ok()
            .and_then(|count| self.base_fee.checked_mul(count))
            .ok_or_else(|| Error::assembly("total fee does not fit in u32"))?;

        let cond = self.preconditions()?;
        let operations = self
            .operations
            .iter()
            .map(Operation::to_xdr)
            .collect::<Result<Vec<_>>>()?;
        let source_account = muxed_account(source.account_id())?;

        let seq_num = if increment {
            source.increment_sequence_number()?
        } else {
            source.next_sequence_number()?
        };

        let ext = match &self.soroban_data {
            Some(data) => TransactionExt::V1(data.clone()),
            None => TransactionExt::V0,
        };

        Ok(Transaction {
            source_account,
            fee,
            seq_num: SequenceNumber(seq_num),
            cond,
            memo: self.memo.clone(),
            operations: operations.try_into()?,
            ext,
        })
    }

    fn preconditions(&self) -> Result<Preconditions> {
        let time_bounds = self.time_bounds.ok_or_else(|| {
            Error::assembly("time bounds are required (use TimeBounds::timeout or infinite)")
        })?;

        if self.extra_signers.len() > MAX_EXTRA_SIGNERS {
            return Err(Error::assembly(format!(
                "{} extra signers given, at most {} allowed",
                self.extra_signers.len(),
                MAX_EXTRA_SIGNERS
            )));
        }

        let needs_v2 = self.ledger_bounds.is_some()
            || self.min_sequence_number.is_some()
            || self.min_sequence_age != 0
            || self.min_sequence_ledger_gap != 0
            || !self.extra_signers.is_empty();

        if !needs_v2 {
            return Ok(Preconditions::Time(time_bounds.to_xdr()));
        }

        let extra_signers = self
            .extra_signers
            .iter()
            .map(|s| parse_signer_key(s))
            .collect::<Result<Vec<_>>>()?;

        Ok(Preconditions::V2(PreconditionsV2 {
            time_bounds: Some(time_bounds.to_xdr()),
            ledger_bounds: self.ledger_bounds.clone(),
            min_seq_num: self.min_sequence_number.map(SequenceNumber),
            min_seq_age: Duration(self.min_sequence_age),
            min_seq_ledger_gap: self.min_sequence_ledger_gap,
            extra_signers: extra_signers.try_into()?,
        }))
    }
}

impl fmt::Debug for TransactionAssembler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransactionAssembler")
            .field("source", &self.source.as_ref().map(|s| s.account_id()))
            .field("operations", &self.operations)
            .field("signers", &self.signers.len())
            .field("time_bounds", &self.time_bounds)
            .field("base_fee", &self.base_fee)
            .field("increment_sequence", &self.increment_sequence)
            .field("soroban_data", &self.soroban_data.is_some())
            .finish()
    }
}

/// Hash that signers sign: sha256 of the signature payload for `passphrase`
pub fn transaction_hash(tx: &Transaction, passphrase: &str) -> Result<[u8; 32]> {
    let payload = TransactionSignaturePayload {
        network_id: network_id(passphrase),
        tagged_transaction: TransactionSignaturePayloadTaggedTransaction::Tx(tx.clone()),
    };
    Ok(Sha256::digest(payload.to_xdr(Limits::none())?).into())
}

/// Sign `tx` with every signer and wrap it in a V1 envelope
pub fn sign(
    tx: Transaction,
    passphrase: &str,
    signers: &[Arc<dyn Signer>],
) -> Result<TransactionEnvelope> {
    let hash = transaction_hash(&tx, passphrase)?;
    let signatures = signers
        .iter()
        .map(|signer| signer.decorated_signature(&hash))
        .collect::<Result<Vec<DecoratedSignature>>>()?;

    Ok(TransactionEnvelope::Tx(TransactionV1Envelope {
        tx,
        signatures: signatures.try_into()?,
    }))
}

fn muxed_account(account_id: &str) -> Result<MuxedAccount> {
    let account = parse_account_id(account_id)?;
    let stellar_xdr::curr::PublicKey::PublicKeyTypeEd25519(key) = account.0;
    Ok(MuxedAccount::Ed25519(key))
}

fn parse_signer_key(signer: &str) -> Result<SignerKey> {
    use stellar_strkey::Strkey;

    let strkey = Strkey::from_string(signer)
        .map_err(|_| Error::assembly(format!("invalid extra signer: {}", signer)))?;
    match strkey {
        Strkey::PublicKeyEd25519(key) => Ok(SignerKey::Ed25519(Uint256(key.0))),
        Strkey::PreAuthTx(hash) => Ok(SignerKey::PreAuthTx(Uint256(hash.0))),
        Strkey::HashX(hash) => Ok(SignerKey::HashX(Uint256(hash.0))),
        Strkey::SignedPayloadEd25519(payload) => Ok(SignerKey::Ed25519SignedPayload(
            SignerKeyEd25519SignedPayload {
                ed25519: Uint256(payload.ed25519),
                payload: payload.payload.to_vec().try_into()?,
            },
        )),
        _ => Err(Error::assembly(format!(
            "extra signer {} is not a signer key",
            signer
        ))),
    }
}
