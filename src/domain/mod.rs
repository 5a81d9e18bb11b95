//! Domain module
//!
//! Core domain types and business rules.

pub mod account;
pub mod amount;
pub mod error;

pub use account::{Account, AccountId, NewAccount};
pub use amount::{Amount, AmountError, Balance};
pub use error::TransferError;
