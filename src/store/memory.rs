//! In-memory ledger store
//!
//! Same transactional contract as the PostgreSQL store, without a database.
//! A transaction holds the store-wide lock from `begin` until it is committed,
//! rolled back or dropped, and buffers its writes until commit. Faults can be
//! injected to exercise the failure paths of the ledger.

use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::domain::AccountId;

use super::{LedgerStore, LedgerTransaction, StoreError};

#[derive(Debug, Default)]
struct Faults {
    fail_next_begin: bool,
    fail_next_commit: bool,
    fail_next_rollback: bool,
    fail_adjustments: HashSet<AccountId>,
}

#[derive(Debug)]
struct MemoryState {
    balances: BTreeMap<AccountId, Decimal>,
    faults: Faults,
}

/// In-memory ledger store; clones share the same accounts
#[derive(Debug, Clone)]
pub struct MemoryLedgerStore {
    state: Arc<Mutex<MemoryState>>,
    open: Arc<AtomicUsize>,
}

impl MemoryLedgerStore {
    /// Create a store seeded with `(id, balance)` pairs
    pub fn with_accounts<I>(accounts: I) -> Self
    where
        I: IntoIterator<Item = (AccountId, Decimal)>,
    {
        let state = MemoryState {
            balances: accounts.into_iter().collect(),
            faults: Faults::default(),
        };
        Self {
            state: Arc::new(Mutex::new(state)),
            open: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Committed balance of an account
    pub async fn balance(&self, id: AccountId) -> Option<Decimal> {
        self.state.lock().await.balances.get(&id).copied()
    }

    /// Snapshot of all committed balances
    pub async fn balances(&self) -> BTreeMap<AccountId, Decimal> {
        self.state.lock().await.balances.clone()
    }

    /// Number of transactions begun and not yet finished
    pub fn open_transactions(&self) -> usize {
        self.open.load(Ordering::SeqCst)
    }

    /// Make the next `begin` fail
    pub async fn fail_next_begin(&self) {
        self.state.lock().await.faults.fail_next_begin = true;
    }

    /// Make the next `commit` fail; its writes are discarded
    pub async fn fail_next_commit(&self) {
        self.state.lock().await.faults.fail_next_commit = true;
    }

    /// Make the next `rollback` fail; its writes are still discarded
    pub async fn fail_next_rollback(&self) {
        self.state.lock().await.faults.fail_next_rollback = true;
    }

    /// Make every `adjust_balance` on `id` fail
    pub async fn fail_adjustments_for(&self, id: AccountId) {
        self.state.lock().await.faults.fail_adjustments.insert(id);
    }
}

#[async_trait]
impl LedgerStore for MemoryLedgerStore {
    type Tx = MemoryTransaction;

    async fn begin(&self) -> Result<Self::Tx, StoreError> {
        let mut guard = self.state.clone().lock_owned().await;

        if std::mem::take(&mut guard.faults.fail_next_begin) {
            return Err(StoreError::Unavailable("injected begin failure".to_string()));
        }

        self.open.fetch_add(1, Ordering::SeqCst);
        Ok(MemoryTransaction {
            guard,
            writes: BTreeMap::new(),
            open: self.open.clone(),
        })
    }
}

/// Open in-memory transaction
pub struct MemoryTransaction {
    guard: OwnedMutexGuard<MemoryState>,
    writes: BTreeMap<AccountId, Decimal>,
    open: Arc<AtomicUsize>,
}

impl MemoryTransaction {
    fn current(&self, id: AccountId) -> Option<Decimal> {
        self.writes
            .get(&id)
            .or_else(|| self.guard.balances.get(&id))
            .copied()
    }
}

#[async_trait]
impl LedgerTransaction for MemoryTransaction {
    async fn lock_balance(&mut self, id: AccountId) -> Result<Option<Decimal>, StoreError> {
        Ok(self.current(id))
    }

    async fn adjust_balance(
        &mut self,
        id: AccountId,
        delta: Decimal,
    ) -> Result<Option<Decimal>, StoreError> {
        if self.guard.faults.fail_adjustments.contains(&id) {
            return Err(StoreError::Unavailable(format!(
                "injected update failure on account {}",
                id
            )));
        }

        let Some(current) = self.current(id) else {
            return Ok(None);
        };

        let updated = current + delta;
        if updated < Decimal::ZERO {
            return Err(StoreError::NegativeBalance(id));
        }

        self.writes.insert(id, updated);
        Ok(Some(updated))
    }

    async fn commit(mut self) -> Result<(), StoreError> {
        if std::mem::take(&mut self.guard.faults.fail_next_commit) {
            return Err(StoreError::Unavailable("injected commit failure".to_string()));
        }

        let writes = std::mem::take(&mut self.writes);
        self.guard.balances.extend(writes);
        Ok(())
    }

    async fn rollback(mut self) -> Result<(), StoreError> {
        self.writes.clear();
        if std::mem::take(&mut self.guard.faults.fail_next_rollback) {
            return Err(StoreError::Unavailable("injected rollback failure".to_string()));
        }
        Ok(())
    }
}

impl Drop for MemoryTransaction {
    fn drop(&mut self) {
        self.open.fetch_sub(1, Ordering::SeqCst);
    }
}
