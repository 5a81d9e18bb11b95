//! Error handling module
//!
//! Application-level errors for the command-line surface, with stable error
//! codes and process exit codes.

use crate::domain::{AccountId, AmountError, TransferError};

/// Application-wide Result type
pub type AppResult<T> = Result<T, AppError>;

/// Application error types
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    // Caller errors
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Invalid amount: {0}")]
    InvalidAmount(#[from] AmountError),

    #[error("Account not found: {0}")]
    AccountNotFound(AccountId),

    #[error(transparent)]
    Transfer(#[from] TransferError),

    // Infrastructure errors
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl AppError {
    /// Stable machine-readable code
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::InvalidRequest(_) => "invalid_request",
            AppError::InvalidAmount(_) => "invalid_amount",
            AppError::AccountNotFound(_) => "account_not_found",
            AppError::Transfer(err) => err.error_code(),
            AppError::Database(_) => "database_error",
            AppError::Config(_) => "config_error",
            AppError::Serialization(_) => "serialization_error",
        }
    }

    /// Whether the caller (not the system) is at fault
    pub fn is_client_error(&self) -> bool {
        match self {
            AppError::InvalidRequest(_)
            | AppError::InvalidAmount(_)
            | AppError::AccountNotFound(_) => true,
            AppError::Transfer(err) => err.is_client_error(),
            AppError::Database(_) | AppError::Config(_) | AppError::Serialization(_) => false,
        }
    }

    /// Process exit code: 2 for caller errors, 1 for system failures
    pub fn exit_code(&self) -> u8 {
        if self.is_client_error() {
            2
        } else {
            1
        }
    }

    /// Log the error at a level matching its class
    pub fn report(&self) {
        if self.is_client_error() {
            tracing::warn!(error_code = self.error_code(), "{}", self);
        } else {
            tracing::error!(error_code = self.error_code(), "{:?}", self);
        }
    }
}
