//! Account Repository
//!
//! Administrative reads and writes on the `accounts` relation. Balances of
//! existing accounts are only changed through `LedgerService::transfer`.

use sqlx::PgPool;

use crate::domain::{Account, AccountId, NewAccount};

#[derive(Debug, Clone)]
pub struct AccountRepository {
    pool: PgPool,
}

impl AccountRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a new account with its opening balance
    pub async fn create(&self, account: &NewAccount) -> Result<Account, sqlx::Error> {
        sqlx::query_as::<_, Account>(
            r#"
            INSERT INTO accounts (name, email, balance)
            VALUES ($1, $2, $3)
            RETURNING id, name, email, balance, created_at
            "#,
        )
        .bind(&account.name)
        .bind(&account.email)
        .bind(account.balance.value())
        .fetch_one(&self.pool)
        .await
    }

    /// All accounts ordered by id
    pub async fn list(&self) -> Result<Vec<Account>, sqlx::Error> {
        sqlx::query_as::<_, Account>(
            r#"
            SELECT id, name, email, balance, created_at
            FROM accounts
            ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await
    }

    pub async fn get(&self, id: AccountId) -> Result<Option<Account>, sqlx::Error> {
        sqlx::query_as::<_, Account>(
            r#"
            SELECT id, name, email, balance, created_at
            FROM accounts
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }
}
