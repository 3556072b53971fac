//! Event ledger: transfer and approval records kept as double-ended queues.
//!
//! New records are pushed to the front, so the front is always the newest and
//! the back the oldest. The `pop_*` readers remove what they return; callers
//! that want to browse history use the `peek_*` and listing readers instead.

use thiserror::Error;
use tracing::debug;

use crate::collections::PersistentDeque;
use crate::storage::{Storage, StorageError};
use crate::types::{AccountId, Amount, ApprovalEvent, TransferEvent};

pub const TRANSFER_EVENTS_PREFIX: &str = "xfr";
pub const APPROVAL_EVENTS_PREFIX: &str = "apr";

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Storage error: {0}")]
    StorageError(#[from] StorageError),
    #[error("No {0} events recorded")]
    EmptyLedger(EventKind),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Transfer,
    Approval,
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventKind::Transfer => f.write_str("transfer"),
            EventKind::Approval => f.write_str("approval"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct EventLedger {
    transfers: PersistentDeque<TransferEvent>,
    approvals: PersistentDeque<ApprovalEvent>,
}

impl Default for EventLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl EventLedger {
    pub fn new() -> Self {
        EventLedger {
            transfers: PersistentDeque::new(TRANSFER_EVENTS_PREFIX),
            approvals: PersistentDeque::new(APPROVAL_EVENTS_PREFIX),
        }
    }

    pub fn record_transfer<S: Storage + ?Sized>(
        &self,
        storage: &S,
        spender: &AccountId,
        from: &AccountId,
        to: &AccountId,
        value: Amount,
    ) -> Result<(), LedgerError> {
        debug!(%spender, %from, %to, %value, "recording transfer event");
        let event = TransferEvent {
            spender: spender.clone(),
            from: from.clone(),
            to: to.clone(),
            value,
        };
        self.transfers.push_front(storage, &event)?;
        Ok(())
    }

    pub fn record_approval<S: Storage + ?Sized>(
        &self,
        storage: &S,
        owner: &AccountId,
        spender: &AccountId,
        old_value: Amount,
        value: Amount,
    ) -> Result<(), LedgerError> {
        debug!(%owner, %spender, %old_value, %value, "recording approval event");
        let event = ApprovalEvent {
            owner: owner.clone(),
            spender: spender.clone(),
            old_value,
            value,
        };
        self.approvals.push_front(storage, &event)?;
        Ok(())
    }

    /// Removes and returns the most recent transfer.
    pub fn pop_newest_transfer<S: Storage + ?Sized>(&self, storage: &S) -> Result<TransferEvent, LedgerError> {
        self.transfers
            .pop_front(storage)?
            .ok_or(LedgerError::EmptyLedger(EventKind::Transfer))
    }

    /// Removes and returns the earliest transfer still held.
    pub fn pop_oldest_transfer<S: Storage + ?Sized>(&self, storage: &S) -> Result<TransferEvent, LedgerError> {
        self.transfers
            .pop_back(storage)?
            .ok_or(LedgerError::EmptyLedger(EventKind::Transfer))
    }

    pub fn pop_newest_approval<S: Storage + ?Sized>(&self, storage: &S) -> Result<ApprovalEvent, LedgerError> {
        self.approvals
            .pop_front(storage)?
            .ok_or(LedgerError::EmptyLedger(EventKind::Approval))
    }

    pub fn pop_oldest_approval<S: Storage + ?Sized>(&self, storage: &S) -> Result<ApprovalEvent, LedgerError> {
        self.approvals
            .pop_back(storage)?
            .ok_or(LedgerError::EmptyLedger(EventKind::Approval))
    }

    pub fn peek_newest_transfer<S: Storage + ?Sized>(
        &self,
        storage: &S,
    ) -> Result<Option<TransferEvent>, LedgerError> {
        Ok(self.transfers.front(storage)?)
    }

    pub fn peek_oldest_transfer<S: Storage + ?Sized>(
        &self,
        storage: &S,
    ) -> Result<Option<TransferEvent>, LedgerError> {
        Ok(self.transfers.back(storage)?)
    }

    pub fn peek_newest_approval<S: Storage + ?Sized>(
        &self,
        storage: &S,
    ) -> Result<Option<ApprovalEvent>, LedgerError> {
        Ok(self.approvals.front(storage)?)
    }

    pub fn peek_oldest_approval<S: Storage + ?Sized>(
        &self,
        storage: &S,
    ) -> Result<Option<ApprovalEvent>, LedgerError> {
        Ok(self.approvals.back(storage)?)
    }

    /// Newest-first listing of at most `limit` transfers.
    pub fn transfers<S: Storage + ?Sized>(&self, storage: &S, limit: usize) -> Result<Vec<TransferEvent>, LedgerError> {
        Ok(self.transfers.range_from_front(storage, limit)?)
    }

    /// Newest-first listing of at most `limit` approvals.
    pub fn approvals<S: Storage + ?Sized>(&self, storage: &S, limit: usize) -> Result<Vec<ApprovalEvent>, LedgerError> {
        Ok(self.approvals.range_from_front(storage, limit)?)
    }

    pub fn transfer_count<S: Storage + ?Sized>(&self, storage: &S) -> Result<usize, LedgerError> {
        Ok(self.transfers.len(storage)?)
    }

    pub fn approval_count<S: Storage + ?Sized>(&self, storage: &S) -> Result<usize, LedgerError> {
        Ok(self.approvals.len(storage)?)
    }
}
