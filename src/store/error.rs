//! Store Errors

use crate::domain::AccountId;

/// Errors raised by a ledger store
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Database error (connection loss, timeout, constraint violation)
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A write would leave an account balance negative
    #[error("balance of account {0} would become negative")]
    NegativeBalance(AccountId),

    /// The store cannot serve the request
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    /// Check if the database reported a serialization failure or deadlock
    pub fn is_conflict(&self) -> bool {
        match self {
            StoreError::Database(sqlx::Error::Database(db)) => {
                matches!(db.code().as_deref(), Some("40001") | Some("40P01"))
            }
            _ => false,
        }
    }
}
