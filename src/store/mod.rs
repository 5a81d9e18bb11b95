//! Store module
//!
//! Transactional access to the `accounts` relation. The ledger depends only on
//! these traits; the store handle is always passed in explicitly.

mod error;
mod memory;
mod postgres;

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::domain::AccountId;

pub use error::StoreError;
pub use memory::{MemoryLedgerStore, MemoryTransaction};
pub use postgres::{PgLedgerStore, PgLedgerTransaction};

/// A store that can open transactions over account balances
#[async_trait]
pub trait LedgerStore: Send + Sync {
    type Tx: LedgerTransaction;

    /// Open a new transaction
    async fn begin(&self) -> Result<Self::Tx, StoreError>;
}

/// An open store transaction.
///
/// Dropping a handle without calling `commit` discards its writes.
#[async_trait]
pub trait LedgerTransaction: Send {
    /// Read an account balance and hold a write lock on the row until the
    /// transaction ends. Returns `None` if the account does not exist.
    async fn lock_balance(&mut self, id: AccountId) -> Result<Option<Decimal>, StoreError>;

    /// Add `delta` to an account balance, returning the new balance, or
    /// `None` if the account does not exist.
    async fn adjust_balance(
        &mut self,
        id: AccountId,
        delta: Decimal,
    ) -> Result<Option<Decimal>, StoreError>;

    async fn commit(self) -> Result<(), StoreError>;

    async fn rollback(self) -> Result<(), StoreError>;
}
