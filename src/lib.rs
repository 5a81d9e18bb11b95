//! ledger-transfer Library
//!
//! Atomic account-to-account balance transfers over a transactional store.

pub mod config;
pub mod db;
pub mod domain;
pub mod ledger;
pub mod logging;
pub mod repository;
pub mod store;

mod error;

pub use config::Config;
pub use domain::{Account, AccountId, Amount, AmountError, Balance, NewAccount, TransferError};
pub use error::{AppError, AppResult};
pub use ledger::{LedgerService, TransferCommand, TransferReceipt};
pub use repository::AccountRepository;
pub use store::{LedgerStore, LedgerTransaction, MemoryLedgerStore, PgLedgerStore, StoreError};
