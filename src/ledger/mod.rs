//! Ledger module
//!
//! The transfer operation and its command/result types.

mod commands;
mod service;

pub use commands::{TransferCommand, TransferReceipt};
pub use service::LedgerService;
