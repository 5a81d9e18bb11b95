//! ledger - account balances and transfers from the command line
//!
//! Thin shell over `LedgerService` and `AccountRepository`. All failures are
//! converted to `AppError`, logged once, and mapped to an exit code.

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;
use sqlx::PgPool;

use ledger_transfer::{
    db, logging, Account, AccountId, AccountRepository, AppError, AppResult, Balance, Config,
    LedgerService, NewAccount, PgLedgerStore, TransferCommand, TransferError, TransferReceipt,
};

/// ledger - atomic balance transfers between accounts
#[derive(Parser)]
#[command(name = "ledger", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the accounts table
    Init {
        /// Also insert the demo accounts
        #[arg(long)]
        seed: bool,
    },

    /// Inspect and create accounts
    Accounts {
        #[command(subcommand)]
        command: AccountCommands,
    },

    /// Move funds from one account to another
    Transfer {
        /// Source account ID
        from: AccountId,
        /// Destination account ID
        to: AccountId,
        /// Amount, e.g. 100.00
        amount: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Walk through listing, inserting and transferring on the seeded accounts
    Demo,
}

#[derive(Subcommand)]
enum AccountCommands {
    /// List all accounts
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show a single account
    Show {
        id: AccountId,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Create an account with an opening balance
    Create {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long, default_value = "0.00")]
        balance: String,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    // Load environment variables
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::from(1);
        }
    };

    logging::init_tracing(config.log_format);

    match run(cli.command, &config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            err.report();
            ExitCode::from(err.exit_code())
        }
    }
}

async fn run(command: Commands, config: &Config) -> AppResult<()> {
    tracing::debug!("Connecting to database...");
    let pool = db::connect(config).await?;
    db::verify_connection(&pool).await?;

    let result = match command {
        Commands::Init { seed } => init(&pool, seed).await,
        Commands::Accounts { command } => accounts(&pool, command).await,
        Commands::Transfer {
            from,
            to,
            amount,
            json,
        } => transfer(&pool, TransferCommand::new(from, to, amount), json).await,
        Commands::Demo => demo(&pool).await,
    };

    pool.close().await;
    result
}

async fn init(pool: &PgPool, seed: bool) -> AppResult<()> {
    db::apply_schema(pool).await?;
    if seed {
        db::seed(pool).await?;
    }
    Ok(())
}

async fn accounts(pool: &PgPool, command: AccountCommands) -> AppResult<()> {
    let repository = AccountRepository::new(pool.clone());

    match command {
        AccountCommands::List { json } => {
            let accounts = repository.list().await?;
            if json {
                print_json(&accounts)?;
            } else {
                print_accounts(&accounts);
            }
        }
        AccountCommands::Show { id, json } => {
            let account = repository
                .get(id)
                .await?
                .ok_or(AppError::AccountNotFound(id))?;
            if json {
                print_json(&account)?;
            } else {
                print_accounts(std::slice::from_ref(&account));
            }
        }
        AccountCommands::Create {
            name,
            email,
            balance,
        } => {
            if name.trim().is_empty() || email.trim().is_empty() {
                return Err(AppError::InvalidRequest(
                    "name and email must not be empty".to_string(),
                ));
            }
            let balance: Balance = balance.parse()?;
            let account = repository
                .create(&NewAccount::new(name, email).with_balance(balance))
                .await?;
            tracing::info!(account_id = %account.id, balance = %account.balance, "Account created");
            print_accounts(std::slice::from_ref(&account));
        }
    }

    Ok(())
}

async fn transfer(pool: &PgPool, command: TransferCommand, json: bool) -> AppResult<()> {
    let ledger = LedgerService::new(PgLedgerStore::new(pool.clone()));

    let receipt = ledger.execute(&command).await?;
    tracing::info!(
        source = %receipt.source,
        destination = %receipt.destination,
        amount = %receipt.amount,
        "Transfer committed"
    );

    if json {
        print_json(&receipt)?;
    } else {
        print_receipt(&receipt);
    }
    Ok(())
}

/// Scripted walkthrough over the seeded accounts 1 and 2. Individual step
/// failures are reported and the walkthrough continues.
async fn demo(pool: &PgPool) -> AppResult<()> {
    let repository = AccountRepository::new(pool.clone());
    let ledger = LedgerService::new(PgLedgerStore::new(pool.clone()));
    let (first, second) = (AccountId::new(1), AccountId::new(2));

    println!("=== All accounts ===");
    print_accounts(&repository.list().await?);

    println!("\n=== Account {} ===", first);
    match repository.get(first).await? {
        Some(account) => print_accounts(&[account]),
        None => AppError::AccountNotFound(first).report(),
    }

    println!("\n=== Inserting new account ===");
    let charlie = NewAccount::new("Charlie Wilson", "charlie.wilson@example.com")
        .with_balance(Balance::new(dec!(500.00))?);
    match repository.create(&charlie).await {
        Ok(account) => print_accounts(&[account]),
        Err(e) => AppError::from(e).report(),
    }

    println!("\n=== Transferring 100.00 from {} to {} ===", first, second);
    print_balances(&repository, first, second).await?;
    match ledger.transfer(first, second, dec!(100.00)).await {
        Ok(receipt) => print_receipt(&receipt),
        Err(e) => AppError::from(e).report(),
    }

    println!("\n=== Transferring 10000.00 from {} to {} ===", first, second);
    match ledger.transfer(first, second, dec!(10000.00)).await {
        Ok(receipt) => print_receipt(&receipt),
        Err(TransferError::InsufficientFunds {
            available,
            requested,
        }) => println!(
            "Rejected: insufficient funds (available {}, requested {})",
            available, requested
        ),
        Err(e) => AppError::from(e).report(),
    }
    print_balances(&repository, first, second).await?;

    Ok(())
}

async fn print_balances(
    repository: &AccountRepository,
    first: AccountId,
    second: AccountId,
) -> AppResult<()> {
    for id in [first, second] {
        let balance = repository
            .get(id)
            .await?
            .map(|account| account.balance)
            .unwrap_or(Decimal::ZERO);
        println!("Account {} balance: {:.2}", id, balance);
    }
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> AppResult<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_accounts(accounts: &[Account]) {
    println!("{:>6}  {:<24} {:<32} {:>14}", "ID", "NAME", "EMAIL", "BALANCE");
    for account in accounts {
        println!(
            "{:>6}  {:<24} {:<32} {:>14.2}",
            account.id, account.name, account.email, account.balance
        );
    }
}

fn print_receipt(receipt: &TransferReceipt) {
    println!(
        "Transferred {:.2} from {} to {}",
        receipt.amount, receipt.source, receipt.destination
    );
    println!("  {} balance: {:.2}", receipt.source, receipt.source_balance);
    println!(
        "  {} balance: {:.2}",
        receipt.destination, receipt.destination_balance
    );
}
