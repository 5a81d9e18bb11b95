//! Ledger Service
//!
//! Atomic balance transfers between two accounts.

use rust_decimal::Decimal;

use crate::domain::{AccountId, Amount, TransferError};
use crate::store::{LedgerStore, LedgerTransaction};

use super::{TransferCommand, TransferReceipt};

/// Executes transfers against an injected store
#[derive(Debug, Clone)]
pub struct LedgerService<S> {
    store: S,
}

impl<S: LedgerStore> LedgerService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Execute a transfer command (amount given as a decimal string)
    pub async fn execute(&self, command: &TransferCommand) -> Result<TransferReceipt, TransferError> {
        let amount: Amount = command.amount.parse()?;
        self.transfer_amount(command.source, command.destination, amount)
            .await
    }

    /// Move `amount` from `source` to `destination` in one store transaction.
    ///
    /// The amount is validated before the store is touched. On every failure
    /// the transaction is rolled back before this returns, so either both
    /// balance updates are visible or neither is. A transfer to the same
    /// account checks funds and then commits without writing.
    pub async fn transfer(
        &self,
        source: AccountId,
        destination: AccountId,
        amount: Decimal,
    ) -> Result<TransferReceipt, TransferError> {
        let amount = Amount::new(amount)?;
        self.transfer_amount(source, destination, amount).await
    }

    async fn transfer_amount(
        &self,
        source: AccountId,
        destination: AccountId,
        amount: Amount,
    ) -> Result<TransferReceipt, TransferError> {
        let mut tx = self
            .store
            .begin()
            .await
            .map_err(TransferError::TransactionBeginFailed)?;

        match move_funds(&mut tx, source, destination, amount).await {
            Ok(receipt) => {
                tx.commit().await.map_err(TransferError::CommitFailed)?;
                Ok(receipt)
            }
            Err(err) => match tx.rollback().await {
                Ok(()) => Err(err),
                Err(rollback_err) => Err(TransferError::RollbackFailed {
                    cause: Box::new(err),
                    source: rollback_err,
                }),
            },
        }
    }
}

async fn move_funds<T: LedgerTransaction>(
    tx: &mut T,
    source: AccountId,
    destination: AccountId,
    amount: Amount,
) -> Result<TransferReceipt, TransferError> {
    let (available, destination_balance) = lock_accounts(tx, source, destination).await?;

    if available < amount.value() {
        return Err(TransferError::insufficient_funds(available, amount.value()));
    }

    if source == destination {
        return Ok(TransferReceipt {
            source,
            destination,
            amount: amount.value(),
            source_balance: available,
            destination_balance,
        });
    }

    let source_balance = adjust(tx, source, -amount.value()).await?;
    let destination_balance = adjust(tx, destination, amount.value()).await?;

    Ok(TransferReceipt {
        source,
        destination,
        amount: amount.value(),
        source_balance,
        destination_balance,
    })
}

/// Lock both rows in ascending id order so that opposing transfers
/// (A -> B and B -> A) cannot deadlock. Returns (source, destination) balances.
async fn lock_accounts<T: LedgerTransaction>(
    tx: &mut T,
    source: AccountId,
    destination: AccountId,
) -> Result<(Decimal, Decimal), TransferError> {
    if source == destination {
        let balance = lock(tx, source).await?;
        return Ok((balance, balance));
    }

    let (first, second) = lock_order(source, destination);
    let first_balance = lock(tx, first).await?;
    let second_balance = lock(tx, second).await?;

    if first == source {
        Ok((first_balance, second_balance))
    } else {
        Ok((second_balance, first_balance))
    }
}

fn lock_order(a: AccountId, b: AccountId) -> (AccountId, AccountId) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

async fn lock<T: LedgerTransaction>(tx: &mut T, id: AccountId) -> Result<Decimal, TransferError> {
    tx.lock_balance(id)
        .await
        .map_err(TransferError::CommitFailed)?
        .ok_or(TransferError::AccountNotFound(id))
}

async fn adjust<T: LedgerTransaction>(
    tx: &mut T,
    id: AccountId,
    delta: Decimal,
) -> Result<Decimal, TransferError> {
    tx.adjust_balance(id, delta)
        .await
        .map_err(TransferError::CommitFailed)?
        .ok_or(TransferError::AccountNotFound(id))
}
