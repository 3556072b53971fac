// src/lib.rs

pub mod types;
pub mod storage;
pub mod collections;
pub mod ledger;
pub mod token;
pub mod chat;
pub mod greeting;
pub mod runtime;

pub use ledger::{EventLedger, LedgerError};
pub use runtime::{CallOutcome, ContractError, ContractHost};
pub use storage::{MemoryStorage, SledStorage, Storage};
pub use token::{Token, TokenCall, TokenError};
pub use types::{AccountId, Amount, ApprovalEvent, TokenConfig, TransferEvent};
