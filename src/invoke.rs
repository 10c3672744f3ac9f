//! Contract function invocation builder

use stellar_xdr::curr::{ScString, ScSymbol, ScVal};

use crate::contract::Contract;
use crate::types::SendTransactionResult;
use crate::{Error, Field, Result};

/// Longest symbol the host accepts
const MAX_SYMBOL_LEN: usize = 32;

/// Builds and sends a call to one contract function
///
/// # Example
///
/// ```ignore
/// let sent = contract
///     .invoke()
///     .function("hello")
///     .symbol("world")
///     .send()
///     .await?;
/// ```
#[derive(Debug)]
pub struct InvokeBuilder<'a> {
    contract: &'a Contract,
    function: Option<String>,
    args: Vec<ScVal>,
    invalid: Option<String>,
}

impl<'a> InvokeBuilder<'a> {
    pub(crate) fn new(contract: &'a Contract) -> Self {
        Self {
            contract,
            function: None,
            args: Vec::new(),
            invalid: None,
        }
    }

    pub fn function(mut self, function: impl Into<String>) -> Self {
        self.function = Some(function.into());
        self
    }

    /// Append already built arguments
    pub fn params(mut self, params: impl IntoIterator<Item = ScVal>) -> Self {
        self.args.extend(params);
        self
    }

    pub fn bool(self, value: bool) -> Self {
        self.push(ScVal::Bool(value))
    }

    pub fn i32(self, value: i32) -> Self {
        self.push(ScVal::I32(value))
    }

    pub fn i64(self, value: i64) -> Self {
        self.push(ScVal::I64(value))
    }

    pub fn u32(self, value: u32) -> Self {
        self.push(ScVal::U32(value))
    }

    pub fn u64(self, value: u64) -> Self {
        self.push(ScVal::U64(value))
    }

    pub fn string(mut self, value: &str) -> Self {
        match value.try_into() {
            Ok(s) => self.push(ScVal::String(ScString(s))),
            Err(_) => {
                self.reject(format!("string argument too long ({} bytes)", value.len()));
                self
            }
        }
    }

    pub fn symbol(mut self, value: &str) -> Self {
        match to_symbol(value) {
            Ok(symbol) => self.push(ScVal::Symbol(symbol)),
            Err(_) => {
                self.reject(format!("invalid symbol: {:?}", value));
                self
            }
        }
    }

    /// Arguments collected so far
    pub fn args(&self) -> &[ScVal] {
        &self.args
    }

    /// Invoke the function, failing when contract state has no TTL left
    ///
    /// Returns `Error::ContractNeedsRestore` when the code or instance has
    /// expired and `Error::ContractDataNeedsRestore` when simulation finds
    /// archived entries in the footprint. Nothing is submitted in either case.
    pub async fn send(self) -> Result<SendTransactionResult> {
        let function = self.validate()?;
        log::info!("🚀 Invoking {}", function);

        if !self.contract.is_alive().await? {
            log::error!("   ❌ Contract has no TTL left");
            return Err(Error::ContractNeedsRestore);
        }
        self.contract
            .invoke_function(&function, self.args, false)
            .await
    }

    /// Invoke the function, restoring expired contract state first
    ///
    /// Restores are polled for completion before the invocation is sent,
    /// but an unresolved restore does not stop the invocation.
    pub async fn restore_and_send(self) -> Result<SendTransactionResult> {
        let function = self.validate()?;
        log::info!("🚀 Invoking {} (restoring if needed)", function);

        if !self.contract.is_alive().await? {
            let sent = self.contract.restore().await?;
            self.contract.wait_for_restore(&sent.hash).await?;
        }
        self.contract
            .invoke_function(&function, self.args, true)
            .await
    }

    fn push(mut self, value: ScVal) -> Self {
        self.args.push(value);
        self
    }

    fn reject(&mut self, reason: String) {
        if self.invalid.is_none() {
            self.invalid = Some(reason);
        }
    }

    /// Function name and arguments are checked before any network call
    fn validate(&self) -> Result<String> {
        let function = self
            .function
            .clone()
            .filter(|f| !f.is_empty())
            .ok_or(Error::MissingField(Field::Function))?;

        self.contract.require_client()?;
        self.contract.require_source()?;
        self.contract.require_signer()?;
        self.contract.code_key()?;
        self.contract.address()?;

        if let Some(reason) = &self.invalid {
            return Err(Error::InvalidArgument(reason.clone()));
        }
        to_symbol(&function)?;
        Ok(function)
    }
}

fn to_symbol(value: &str) -> Result<ScSymbol> {
    let valid = value.len() <= MAX_SYMBOL_LEN
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_');
    if !valid {
        return Err(Error::InvalidArgument(format!("invalid symbol: {:?}", value)));
    }
    Ok(ScSymbol(value.try_into()?))
}
