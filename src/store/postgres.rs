//! PostgreSQL ledger store
//!
//! Each transaction pins one pooled connection. Balance reads take a row lock
//! with `SELECT ... FOR UPDATE`, so concurrent transfers touching the same
//! account serialize on that row instead of reading a stale balance.

use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Transaction};

use crate::domain::AccountId;

use super::{LedgerStore, LedgerTransaction, StoreError};

/// Ledger store backed by a PostgreSQL pool
#[derive(Debug, Clone)]
pub struct PgLedgerStore {
    pool: PgPool,
}

impl PgLedgerStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LedgerStore for PgLedgerStore {
    type Tx = PgLedgerTransaction;

    async fn begin(&self) -> Result<Self::Tx, StoreError> {
        let tx = self.pool.begin().await?;
        Ok(PgLedgerTransaction { tx })
    }
}

/// Open PostgreSQL transaction (READ COMMITTED plus row locks)
pub struct PgLedgerTransaction {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl LedgerTransaction for PgLedgerTransaction {
    async fn lock_balance(&mut self, id: AccountId) -> Result<Option<Decimal>, StoreError> {
        let balance: Option<Decimal> = sqlx::query_scalar(
            r#"
            SELECT balance FROM accounts
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(balance)
    }

    async fn adjust_balance(
        &mut self,
        id: AccountId,
        delta: Decimal,
    ) -> Result<Option<Decimal>, StoreError> {
        let balance: Option<Decimal> = sqlx::query_scalar(
            r#"
            UPDATE accounts
            SET balance = balance + $2
            WHERE id = $1
            RETURNING balance
            "#,
        )
        .bind(id)
        .bind(delta)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(|e| {
            // 23514: check_violation on accounts_balance_non_negative
            let check_violation = matches!(
                &e,
                sqlx::Error::Database(db) if db.code().as_deref() == Some("23514")
            );
            if check_violation {
                StoreError::NegativeBalance(id)
            } else {
                StoreError::Database(e)
            }
        })?;

        Ok(balance)
    }

    async fn commit(self) -> Result<(), StoreError> {
        self.tx.commit().await?;
        Ok(())
    }

    async fn rollback(self) -> Result<(), StoreError> {
        self.tx.rollback().await?;
        Ok(())
    }
}
