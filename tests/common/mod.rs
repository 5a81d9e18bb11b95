//! Common test utilities

use rand::Rng;
use rust_decimal::Decimal;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tokio::sync::OnceCell;

use ledger_transfer::{db, AccountId, AccountRepository, Balance, NewAccount};

static SCHEMA_APPLIED: OnceCell<()> = OnceCell::const_new();

/// Connect to the test database and make sure the schema exists
pub async fn setup_test_db() -> PgPool {
    dotenvy::dotenv().ok();
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for tests");

    let pool = PgPoolOptions::new()
        .max_connections(20)
        .connect(&database_url)
        .await
        .expect("Failed to connect to DB");

    // Concurrent CREATE TABLE IF NOT EXISTS can still collide in the catalog
    SCHEMA_APPLIED
        .get_or_init(|| async {
            db::apply_schema(&pool)
                .await
                .expect("Failed to apply schema");
        })
        .await;

    pool
}

/// Insert a fresh account with a unique email so tests never share rows
pub async fn create_account(pool: &PgPool, balance: Decimal) -> AccountId {
    let suffix: u64 = rand::thread_rng().gen();
    let account = NewAccount::new(
        format!("Test {}", suffix),
        format!("test-{}@ledger.test", suffix),
    )
    .with_balance(Balance::new(balance).expect("Invalid test balance"));

    AccountRepository::new(pool.clone())
        .create(&account)
        .await
        .expect("Failed to seed account")
        .id
}

pub async fn balance_of(pool: &PgPool, id: AccountId) -> Decimal {
    AccountRepository::new(pool.clone())
        .get(id)
        .await
        .expect("Failed to read account")
        .expect("Account missing")
        .balance
}
