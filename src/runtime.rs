//! Contract host.
//!
//! The host plays the part of the execution environment: it names the signer
//! of each call, serializes calls, collects diagnostic logs and decides whether
//! a call's storage writes persist. Each call runs against a [`StagedStorage`]
//! overlay that is applied to the committed store in one batch only when the
//! call returns `Ok`.

use serde::de::DeserializeOwned;
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::fmt;
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::chat::ChatError;
use crate::ledger::LedgerError;
use crate::storage::{StagedStorage, Storage, StorageError};
use crate::token::TokenError;
use crate::types::AccountId;

#[derive(Debug, Error)]
pub enum ContractError {
    #[error("Storage error: {0}")]
    StorageError(#[from] StorageError),
    #[error("Ledger error: {0}")]
    LedgerError(#[from] LedgerError),
    #[error("Token error: {0}")]
    TokenError(#[from] TokenError),
    #[error("Chat error: {0}")]
    ChatError(#[from] ChatError),
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
    #[error("Unknown or malformed call `{method}`: {source}")]
    InvalidCall {
        method: String,
        source: serde_json::Error,
    },
    #[error("Host lock poisoned")]
    LockPoisoned,
}

/// Write-only diagnostic log, never read back by contract code.
pub trait LogSink: Send + Sync {
    fn append_log(&self, message: &str);
}

/// Log lines collected for one call.
#[derive(Debug, Default)]
pub struct CallLog {
    lines: Mutex<Vec<String>>,
}

impl CallLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn into_lines(self) -> Vec<String> {
        self.lines.into_inner().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl LogSink for CallLog {
    fn append_log(&self, message: &str) {
        debug!(target: "tokenbook::contract_log", "{}", message);
        match self.lines.lock() {
            Ok(mut lines) => lines.push(message.to_string()),
            Err(poisoned) => poisoned.into_inner().push(message.to_string()),
        }
    }
}

/// Everything a contract learns about the call it is executing.
pub struct CallContext<'a> {
    signer: &'a AccountId,
    contract: &'a AccountId,
    log: &'a dyn LogSink,
}

impl<'a> CallContext<'a> {
    pub fn new(signer: &'a AccountId, contract: &'a AccountId, log: &'a dyn LogSink) -> Self {
        Self { signer, contract, log }
    }

    pub fn signer(&self) -> &AccountId {
        self.signer
    }

    pub fn contract(&self) -> &AccountId {
        self.contract
    }

    pub fn log(&self, message: impl AsRef<str>) {
        self.log.append_log(message.as_ref());
    }
}

pub trait Contract: Send + Sync {
    type Call: DeserializeOwned + fmt::Debug;

    fn execute(
        &self,
        ctx: &CallContext<'_>,
        storage: &dyn Storage,
        call: Self::Call,
    ) -> Result<Value, ContractError>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct CallOutcome {
    pub value: Value,
    pub logs: Vec<String>,
}

/// A failed call: the error plus whatever the contract logged before failing.
#[derive(Debug, Error)]
#[error("{error}")]
pub struct CallFailure {
    #[source]
    pub error: ContractError,
    pub logs: Vec<String>,
}

impl From<ContractError> for CallFailure {
    fn from(error: ContractError) -> Self {
        CallFailure { error, logs: Vec::new() }
    }
}

pub struct ContractHost<S: Storage> {
    storage: Arc<S>,
    contract_id: AccountId,
    call_lock: Mutex<()>,
}

impl<S: Storage> ContractHost<S> {
    pub fn new(storage: Arc<S>, contract_id: impl Into<AccountId>) -> Self {
        ContractHost {
            storage,
            contract_id: contract_id.into(),
            call_lock: Mutex::new(()),
        }
    }

    pub fn contract_id(&self) -> &AccountId {
        &self.contract_id
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Runs one call to completion. Storage writes persist only on success.
    pub fn invoke<C: Contract>(
        &self,
        contract: &C,
        signer: &AccountId,
        call: C::Call,
    ) -> Result<CallOutcome, CallFailure> {
        let _guard = self.call_lock.lock().map_err(|_| ContractError::LockPoisoned)?;
        debug!(%signer, contract = %self.contract_id, ?call, "invoking contract");

        let log = CallLog::new();
        let staged = StagedStorage::new(self.storage.as_ref());
        let ctx = CallContext::new(signer, &self.contract_id, &log);

        match contract.execute(&ctx, &staged, call) {
            Ok(value) => {
                let batch = staged.into_batch().map_err(ContractError::from)?;
                let writes = batch.len();
                self.storage
                    .apply_batch(batch)
                    .map_err(ContractError::from)?;
                info!(%signer, writes, "call committed");
                Ok(CallOutcome {
                    value,
                    logs: log.into_lines(),
                })
            }
            Err(error) => {
                warn!(%signer, %error, "call rejected, discarding writes");
                Err(CallFailure {
                    error,
                    logs: log.into_lines(),
                })
            }
        }
    }

    /// Decodes `method` and JSON `args` into the contract's call type, then
    /// invokes it. Omitted `args` stand for `{}` when the call needs them, so
    /// calls whose arguments all have defaults can be made bare.
    pub fn invoke_json<C: Contract>(
        &self,
        contract: &C,
        signer: &AccountId,
        method: &str,
        args: Option<Value>,
    ) -> Result<CallOutcome, CallFailure> {
        let call = decode_call::<C::Call>(method, args)?;
        self.invoke(contract, signer, call)
    }

    /// Hex SHA-256 over every committed key and value, in key order.
    pub fn state_digest(&self) -> Result<String, StorageError> {
        let mut hasher = Sha256::new();
        for (key, value) in self.storage.entries()? {
            hasher.update((key.len() as u64).to_le_bytes());
            hasher.update(key.as_bytes());
            hasher.update((value.len() as u64).to_le_bytes());
            hasher.update(&value);
        }
        Ok(hex::encode(hasher.finalize()))
    }
}

fn call_envelope(method: &str, args: Option<Value>) -> Value {
    let mut envelope = serde_json::Map::new();
    envelope.insert("method".to_string(), Value::String(method.to_string()));
    if let Some(args) = args {
        envelope.insert("args".to_string(), args);
    }
    Value::Object(envelope)
}

fn decode_call<T: DeserializeOwned>(method: &str, args: Option<Value>) -> Result<T, ContractError> {
    let omitted = args.is_none();
    match serde_json::from_value(call_envelope(method, args)) {
        Ok(call) => Ok(call),
        Err(source) if omitted => {
            let empty = Value::Object(serde_json::Map::new());
            serde_json::from_value(call_envelope(method, Some(empty))).map_err(|_| {
                ContractError::InvalidCall {
                    method: method.to_string(),
                    source,
                }
            })
        }
        Err(source) => Err(ContractError::InvalidCall {
            method: method.to_string(),
            source,
        }),
    }
}
