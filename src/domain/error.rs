//! Transfer Error Types
//!
//! Typed outcome of a failed transfer. The transfer operation never logs;
//! callers use this classification to decide whether to retry or surface.

use rust_decimal::Decimal;
use thiserror::Error;

use super::account::AccountId;
use super::amount::AmountError;
use crate::store::StoreError;

/// Errors returned by `LedgerService::transfer`
///
/// Every variant is returned only after the store transaction (if one was
/// opened) has been rolled back, so none of them leaves partial state behind.
#[derive(Debug, Error)]
pub enum TransferError {
    /// Non-positive or malformed amount, rejected before any store access
    #[error("invalid amount: {0}")]
    InvalidAmount(#[from] AmountError),

    /// Source or destination account does not exist
    #[error("account not found: {0}")]
    AccountNotFound(AccountId),

    /// Source balance does not cover the requested amount
    #[error("insufficient funds: available {available}, requested {requested}")]
    InsufficientFunds {
        available: Decimal,
        requested: Decimal,
    },

    /// The store could not open a transaction (connection loss, pool timeout)
    #[error("failed to begin transaction: {0}")]
    TransactionBeginFailed(#[source] StoreError),

    /// A statement or the commit failed; the transaction was rolled back
    #[error("failed to commit transfer: {0}")]
    CommitFailed(#[source] StoreError),

    /// Rolling back after `cause` failed as well
    #[error("rollback failed after {cause}: {source}")]
    RollbackFailed {
        cause: Box<TransferError>,
        #[source]
        source: StoreError,
    },
}

impl TransferError {
    /// Create an insufficient funds error
    pub fn insufficient_funds(available: Decimal, requested: Decimal) -> Self {
        Self::InsufficientFunds {
            available,
            requested,
        }
    }

    /// Caller or business-rule errors; retrying the same call cannot succeed
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidAmount(_) | Self::AccountNotFound(_) | Self::InsufficientFunds { .. }
        )
    }

    /// Infrastructure errors; the whole operation is safe to retry.
    /// A failed rollback is only as retryable as the error that caused it.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::TransactionBeginFailed(_) | Self::CommitFailed(_) => true,
            Self::RollbackFailed { cause, .. } => cause.is_retryable(),
            _ => false,
        }
    }

    /// Stable machine-readable code
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidAmount(_) => "invalid_amount",
            Self::AccountNotFound(_) => "account_not_found",
            Self::InsufficientFunds { .. } => "insufficient_funds",
            Self::TransactionBeginFailed(_) => "transaction_begin_failed",
            Self::CommitFailed(_) => "commit_failed",
            Self::RollbackFailed { .. } => "rollback_failed",
        }
    }
}
