//! Concurrent transfer load tool
//!
//! Run with: cargo run --bin transfer_stress --release -- --transfers 1000 --accounts 3
//!
//! Fires random transfers between the first N accounts concurrently, then
//! checks that the total balance across those accounts is unchanged.

use std::time::Instant;

use clap::Parser;
use rand::Rng;
use rust_decimal::Decimal;
use tokio::task::JoinSet;

use ledger_transfer::{
    db, logging, AccountId, AccountRepository, Config, LedgerService, PgLedgerStore,
    TransferError,
};

/// Concurrent random transfers between existing accounts
#[derive(Parser, Debug)]
#[command(name = "transfer_stress", version, about, long_about = None)]
struct Args {
    /// Number of transfers to fire
    #[arg(long, default_value_t = 1000, value_parser = clap::value_parser!(u64).range(1..))]
    transfers: u64,

    /// Number of accounts to spread transfers across (taken in id order)
    #[arg(long, default_value_t = 3, value_parser = clap::value_parser!(u64).range(2..))]
    accounts: u64,
}

#[derive(Debug, Default)]
struct Tally {
    committed: u64,
    insufficient: u64,
    conflicts: u64,
    failed: u64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let args = Args::parse();
    let transfer_count = args.transfers;
    let account_limit = usize::try_from(args.accounts)?;

    let config = Config::from_env()?;
    logging::init_tracing(config.log_format);

    tracing::info!("Connecting to database...");
    let pool = db::connect(&config).await?;

    let repository = AccountRepository::new(pool.clone());
    let accounts: Vec<AccountId> = repository
        .list()
        .await?
        .into_iter()
        .take(account_limit)
        .map(|account| account.id)
        .collect();
    if accounts.len() < 2 {
        anyhow::bail!("need at least two accounts; run `ledger init --seed` first");
    }

    let total_before = total_balance(&repository, &accounts).await?;

    // thread_rng is not Send, so every transfer is planned before spawning
    let plans: Vec<(AccountId, AccountId, Decimal)> = {
        let mut rng = rand::thread_rng();
        (0..transfer_count)
            .map(|_| {
                let from = accounts[rng.gen_range(0..accounts.len())];
                let to = accounts[rng.gen_range(0..accounts.len())];
                let cents: i64 = rng.gen_range(1..=50_000);
                (from, to, Decimal::new(cents, 2))
            })
            .collect()
    };

    println!(
        "Stress Test - {} transfers across {} accounts",
        transfer_count,
        accounts.len()
    );

    let ledger = LedgerService::new(PgLedgerStore::new(pool.clone()));
    let start = Instant::now();
    let mut tasks = JoinSet::new();

    for (from, to, amount) in plans {
        let ledger = ledger.clone();
        tasks.spawn(async move { ledger.transfer(from, to, amount).await });
    }

    let mut tally = Tally::default();
    while let Some(joined) = tasks.join_next().await {
        match joined? {
            Ok(_) => tally.committed += 1,
            Err(TransferError::InsufficientFunds { .. }) => tally.insufficient += 1,
            Err(TransferError::CommitFailed(e)) if e.is_conflict() => tally.conflicts += 1,
            Err(e) => {
                tracing::warn!(error_code = e.error_code(), "Transfer failed: {}", e);
                tally.failed += 1;
            }
        }
    }

    let elapsed = start.elapsed();
    let rate = transfer_count as f64 / elapsed.as_secs_f64();
    let total_after = total_balance(&repository, &accounts).await?;

    println!("\n=== Stress Test Results ===");
    println!("Total transfers: {}", transfer_count);
    println!("Committed: {}", tally.committed);
    println!("Insufficient funds: {}", tally.insufficient);
    println!("Conflicts: {}", tally.conflicts);
    println!("Failed: {}", tally.failed);
    println!("Time: {:.2}s", elapsed.as_secs_f64());
    println!("Rate: {:.0} transfers/sec", rate);
    println!("Total balance before: {:.2}", total_before);
    println!("Total balance after:  {:.2}", total_after);

    pool.close().await;

    if total_before != total_after {
        anyhow::bail!(
            "balance not conserved: {} before, {} after",
            total_before,
            total_after
        );
    }

    Ok(())
}

async fn total_balance(
    repository: &AccountRepository,
    accounts: &[AccountId],
) -> anyhow::Result<Decimal> {
    let mut total = Decimal::ZERO;
    for id in accounts {
        if let Some(account) = repository.get(*id).await? {
            total += account.balance;
        }
    }
    Ok(total)
}
