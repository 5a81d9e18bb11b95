//! Command definitions

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::AccountId;

/// Command to move funds between two accounts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferCommand {
    pub source: AccountId,
    pub destination: AccountId,
    /// Amount to transfer (as string for precise decimal)
    pub amount: String,
}

impl TransferCommand {
    pub fn new(source: AccountId, destination: AccountId, amount: impl Into<String>) -> Self {
        Self {
            source,
            destination,
            amount: amount.into(),
        }
    }
}

/// Result of a committed transfer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferReceipt {
    pub source: AccountId,
    pub destination: AccountId,
    pub amount: Decimal,
    /// Source balance after commit
    pub source_balance: Decimal,
    /// Destination balance after commit
    pub destination_balance: Decimal,
}
