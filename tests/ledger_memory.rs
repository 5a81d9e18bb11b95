//! Transfer behaviour against the in-memory store.

use std::collections::BTreeMap;

use ledger_transfer::{AccountId, LedgerService, MemoryLedgerStore, TransferError};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

const A: AccountId = AccountId::new(1);
const B: AccountId = AccountId::new(2);
const MISSING: AccountId = AccountId::new(404);

fn ledger(a: Decimal, b: Decimal) -> LedgerService<MemoryLedgerStore> {
    LedgerService::new(MemoryLedgerStore::with_accounts([(A, a), (B, b)]))
}

async fn snapshot(ledger: &LedgerService<MemoryLedgerStore>) -> BTreeMap<AccountId, Decimal> {
    ledger.store().balances().await
}

#[tokio::test]
async fn test_transfer_moves_funds() {
    let ledger = ledger(dec!(1000.00), dec!(1500.00));

    let receipt = ledger.transfer(A, B, dec!(100.00)).await.unwrap();

    assert_eq!(receipt.source_balance, dec!(900.00));
    assert_eq!(receipt.destination_balance, dec!(1600.00));
    assert_eq!(ledger.store().balance(A).await, Some(dec!(900.00)));
    assert_eq!(ledger.store().balance(B).await, Some(dec!(1600.00)));
    assert_eq!(ledger.store().open_transactions(), 0);
}

#[tokio::test]
async fn test_transfer_conserves_total() {
    let ledger = ledger(dec!(321.45), dec!(10.10));

    for amount in [dec!(0.01), dec!(21.45), dec!(295.00)] {
        ledger.transfer(A, B, amount).await.unwrap();
    }
    ledger.transfer(B, A, dec!(5.55)).await.unwrap();

    let balances = snapshot(&ledger).await;
    assert_eq!(balances.values().sum::<Decimal>(), dec!(331.55));
    assert_eq!(balances[&A], dec!(10.54));
    assert_eq!(balances[&B], dec!(321.01));
}

#[tokio::test]
async fn test_exact_balance_can_be_transferred() {
    let ledger = ledger(dec!(250.00), dec!(0.00));

    ledger.transfer(A, B, dec!(250.00)).await.unwrap();

    assert_eq!(ledger.store().balance(A).await, Some(dec!(0.00)));
    assert_eq!(ledger.store().balance(B).await, Some(dec!(250.00)));
}

#[tokio::test]
async fn test_insufficient_funds_leaves_balances_unchanged() {
    let ledger = ledger(dec!(900.00), dec!(1600.00));
    let before = snapshot(&ledger).await;

    let err = ledger.transfer(A, B, dec!(10000.00)).await.unwrap_err();

    match err {
        TransferError::InsufficientFunds {
            available,
            requested,
        } => {
            assert_eq!(available, dec!(900.00));
            assert_eq!(requested, dec!(10000.00));
        }
        other => panic!("Expected InsufficientFunds, got: {:?}", other),
    }
    assert_eq!(snapshot(&ledger).await, before);
    assert_eq!(ledger.store().open_transactions(), 0);
}

#[tokio::test]
async fn test_non_positive_amount_rejected_before_store_access() {
    let ledger = ledger(dec!(1000.00), dec!(1500.00));
    // A begin failure would surface if the store were touched
    ledger.store().fail_next_begin().await;

    for amount in [dec!(0.00), dec!(-5.00)] {
        let result = ledger.transfer(A, B, amount).await;
        assert!(
            matches!(result, Err(TransferError::InvalidAmount(_))),
            "Expected InvalidAmount for {}",
            amount
        );
    }

    // The injected fault is still armed, so begin was never called
    let result = ledger.transfer(A, B, dec!(1.00)).await;
    assert!(matches!(result, Err(TransferError::TransactionBeginFailed(_))));
}

#[tokio::test]
async fn test_sub_cent_amount_rejected() {
    let ledger = ledger(dec!(1000.00), dec!(1500.00));

    let result = ledger.transfer(A, B, dec!(0.001)).await;

    assert!(matches!(result, Err(TransferError::InvalidAmount(_))));
}

#[tokio::test]
async fn test_missing_source_account() {
    let ledger = ledger(dec!(1000.00), dec!(1500.00));
    let before = snapshot(&ledger).await;

    let result = ledger.transfer(MISSING, B, dec!(10.00)).await;

    assert!(matches!(result, Err(TransferError::AccountNotFound(id)) if id == MISSING));
    assert_eq!(snapshot(&ledger).await, before);
}

#[tokio::test]
async fn test_missing_destination_account() {
    let ledger = ledger(dec!(1000.00), dec!(1500.00));
    let before = snapshot(&ledger).await;

    let result = ledger.transfer(A, MISSING, dec!(10.00)).await;

    assert!(matches!(result, Err(TransferError::AccountNotFound(id)) if id == MISSING));
    assert_eq!(snapshot(&ledger).await, before);
}

#[tokio::test]
async fn test_same_account_is_a_no_op() {
    let ledger = ledger(dec!(1000.00), dec!(1500.00));

    let receipt = ledger.transfer(A, A, dec!(400.00)).await.unwrap();

    assert_eq!(receipt.source_balance, dec!(1000.00));
    assert_eq!(receipt.destination_balance, dec!(1000.00));
    assert_eq!(ledger.store().balance(A).await, Some(dec!(1000.00)));
}

#[tokio::test]
async fn test_same_account_still_checks_funds() {
    let ledger = ledger(dec!(10.00), dec!(0.00));

    let result = ledger.transfer(A, A, dec!(10.01)).await;

    assert!(matches!(result, Err(TransferError::InsufficientFunds { .. })));
    assert_eq!(ledger.store().balance(A).await, Some(dec!(10.00)));
}

#[tokio::test]
async fn test_credit_failure_rolls_back_debit() {
    let ledger = ledger(dec!(1000.00), dec!(1500.00));
    let before = snapshot(&ledger).await;
    ledger.store().fail_adjustments_for(B).await;

    let result = ledger.transfer(A, B, dec!(100.00)).await;

    assert!(matches!(result, Err(TransferError::CommitFailed(_))));
    assert_eq!(snapshot(&ledger).await, before);
    assert_eq!(ledger.store().open_transactions(), 0);
}

#[tokio::test]
async fn test_commit_failure_leaves_no_partial_state() {
    let ledger = ledger(dec!(1000.00), dec!(1500.00));
    let before = snapshot(&ledger).await;
    ledger.store().fail_next_commit().await;

    let err = ledger.transfer(A, B, dec!(100.00)).await.unwrap_err();

    assert!(matches!(err, TransferError::CommitFailed(_)));
    assert!(err.is_retryable());
    assert_eq!(snapshot(&ledger).await, before);

    // Retrying the whole operation succeeds
    ledger.transfer(A, B, dec!(100.00)).await.unwrap();
    assert_eq!(ledger.store().balance(A).await, Some(dec!(900.00)));
}

#[tokio::test]
async fn test_begin_failure() {
    let ledger = ledger(dec!(1000.00), dec!(1500.00));
    ledger.store().fail_next_begin().await;

    let err = ledger.transfer(A, B, dec!(100.00)).await.unwrap_err();

    assert!(matches!(err, TransferError::TransactionBeginFailed(_)));
    assert!(err.is_retryable());
    assert_eq!(ledger.store().balance(A).await, Some(dec!(1000.00)));
}

#[tokio::test]
async fn test_rollback_failure_reports_original_cause() {
    let ledger = ledger(dec!(900.00), dec!(1600.00));
    let before = snapshot(&ledger).await;
    ledger.store().fail_next_rollback().await;

    let err = ledger.transfer(A, B, dec!(10000.00)).await.unwrap_err();

    match &err {
        TransferError::RollbackFailed { cause, .. } => match cause.as_ref() {
            TransferError::InsufficientFunds {
                available,
                requested,
            } => {
                assert_eq!(*available, dec!(900.00));
                assert_eq!(*requested, dec!(10000.00));
            }
            other => panic!("Expected InsufficientFunds cause, got: {:?}", other),
        },
        other => panic!("Expected RollbackFailed, got: {:?}", other),
    }
    assert_eq!(err.error_code(), "rollback_failed");
    assert!(!err.is_retryable());
    assert_eq!(snapshot(&ledger).await, before);
    assert_eq!(ledger.store().open_transactions(), 0);
}

#[tokio::test]
async fn test_rollback_failure_after_store_error_is_retryable() {
    let ledger = ledger(dec!(1000.00), dec!(1500.00));
    let before = snapshot(&ledger).await;
    ledger.store().fail_adjustments_for(B).await;
    ledger.store().fail_next_rollback().await;

    let err = ledger.transfer(A, B, dec!(100.00)).await.unwrap_err();

    match &err {
        TransferError::RollbackFailed { cause, .. } => {
            assert!(matches!(cause.as_ref(), TransferError::CommitFailed(_)));
        }
        other => panic!("Expected RollbackFailed, got: {:?}", other),
    }
    assert!(err.is_retryable());
    assert_eq!(snapshot(&ledger).await, before);
    assert_eq!(ledger.store().open_transactions(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_overdraw_is_prevented() {
    let ledger = ledger(dec!(1000.00), dec!(0.00));

    let handles: Vec<_> = (0..25)
        .map(|_| {
            let ledger = ledger.clone();
            tokio::spawn(async move { ledger.transfer(A, B, dec!(100.00)).await })
        })
        .collect();

    let mut committed = 0;
    let mut rejected = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => committed += 1,
            Err(TransferError::InsufficientFunds { .. }) => rejected += 1,
            Err(e) => panic!("Unexpected error: {:?}", e),
        }
    }

    assert_eq!(committed, 10);
    assert_eq!(rejected, 15);
    assert_eq!(ledger.store().balance(A).await, Some(dec!(0.00)));
    assert_eq!(ledger.store().balance(B).await, Some(dec!(1000.00)));
    assert_eq!(ledger.store().open_transactions(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_opposing_transfers_conserve_total() {
    let ledger = ledger(dec!(500.00), dec!(500.00));

    let handles: Vec<_> = (0..40)
        .map(|i| {
            let ledger = ledger.clone();
            let (from, to) = if i % 2 == 0 { (A, B) } else { (B, A) };
            tokio::spawn(async move { ledger.transfer(from, to, dec!(75.00)).await })
        })
        .collect();

    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) | Err(TransferError::InsufficientFunds { .. }) => {}
            Err(e) => panic!("Unexpected error: {:?}", e),
        }
    }

    let balances = snapshot(&ledger).await;
    assert_eq!(balances.values().sum::<Decimal>(), dec!(1000.00));
    assert!(balances.values().all(|balance| *balance >= Decimal::ZERO));
}
