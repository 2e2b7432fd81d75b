//! Runs against a live Postgres when `TEST_DATABASE_URL` is set; otherwise
//! every test returns early.

use std::sync::Arc;

use simpleledger_core::{AccountId, Amount, Transaction, Version};
use simpleledger_infra::balance_store::{BalanceStore, BalanceStoreError, PostgresBalanceStore};
use simpleledger_infra::{LedgerEngine, RetryPolicy};

async fn store() -> Option<PostgresBalanceStore> {
    let url = std::env::var("TEST_DATABASE_URL").ok()?;
    let store = PostgresBalanceStore::connect(&url, 5)
        .await
        .expect("failed to connect to TEST_DATABASE_URL");
    store.ensure_schema().await.expect("failed to create schema");
    Some(store)
}

#[tokio::test]
async fn insert_get_and_conditional_update() {
    let Some(store) = store().await else { return };
    let id = AccountId::new();

    assert!(store.get(id).await.unwrap().is_none());

    let opened = store.insert(id, 100).await.unwrap();
    assert_eq!(opened.version, Version::INITIAL);

    let err = store.insert(id, 5).await.unwrap_err();
    assert!(matches!(err, BalanceStoreError::AlreadyExists(_)));

    let updated = store.compare_and_update(id, Version::INITIAL, 70).await.unwrap();
    assert_eq!(updated.amount, 70);
    assert_eq!(updated.version, Version::new(2));

    let stale = store
        .compare_and_update(id, Version::INITIAL, 1)
        .await
        .unwrap_err();
    assert!(matches!(
        stale,
        BalanceStoreError::VersionConflict { actual, .. } if actual == Version::new(2)
    ));

    assert_eq!(store.get(id).await.unwrap().unwrap(), updated);
}

#[tokio::test]
async fn update_of_missing_row_is_not_found() {
    let Some(store) = store().await else { return };

    let err = store
        .compare_and_update(AccountId::new(), Version::INITIAL, 1)
        .await
        .unwrap_err();
    assert!(matches!(err, BalanceStoreError::NotFound(_)));
}

#[tokio::test]
async fn negative_amount_is_refused_by_the_table() {
    let Some(store) = store().await else { return };

    let err = store.insert(AccountId::new(), -1).await.unwrap_err();
    assert!(matches!(err, BalanceStoreError::InvalidWrite(_)));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_deposits_through_the_engine() {
    let Some(store) = store().await else { return };
    let engine = Arc::new(LedgerEngine::new(store, RetryPolicy::immediate(u32::MAX)));
    let id = AccountId::new();

    let handles: Vec<_> = (0..32)
        .map(|_| {
            let engine = engine.clone();
            tokio::spawn(async move {
                engine
                    .apply(Transaction::deposit(id, Amount::new(3).unwrap()))
                    .await
            })
        })
        .collect();
    for h in handles {
        h.await.unwrap().unwrap();
    }

    let balance = engine.store().get(id).await.unwrap().unwrap();
    assert_eq!(balance.amount, 96);
    assert_eq!(balance.version.get(), 32);
}
