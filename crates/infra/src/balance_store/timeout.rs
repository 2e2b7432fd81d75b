use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;

use simpleledger_core::{AccountId, Balance, Version};

use super::r#trait::{BalanceStore, BalanceStoreError};

/// Adapter that bounds every call into the wrapped store.
///
/// A stalled backend surfaces as [`BalanceStoreError::Timeout`] instead of
/// hanging the caller.
#[derive(Debug, Clone)]
pub struct TimeoutStore<S> {
    inner: S,
    timeout: Duration,
}

impl<S> TimeoutStore<S> {
    pub fn new(inner: S, timeout: Duration) -> Self {
        Self { inner, timeout }
    }

    async fn bounded<T, F>(&self, operation: &'static str, fut: F) -> Result<T, BalanceStoreError>
    where
        F: Future<Output = Result<T, BalanceStoreError>>,
    {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(operation, timeout_ms = self.timeout.as_millis() as u64, "store call timed out");
                Err(BalanceStoreError::Timeout {
                    operation,
                    after: self.timeout,
                })
            }
        }
    }
}

#[async_trait]
impl<S> BalanceStore for TimeoutStore<S>
where
    S: BalanceStore,
{
    async fn get(&self, account_id: AccountId) -> Result<Option<Balance>, BalanceStoreError> {
        self.bounded("get", self.inner.get(account_id)).await
    }

    async fn insert(
        &self,
        account_id: AccountId,
        amount: i64,
    ) -> Result<Balance, BalanceStoreError> {
        self.bounded("insert", self.inner.insert(account_id, amount))
            .await
    }

    async fn compare_and_update(
        &self,
        account_id: AccountId,
        expected: Version,
        new_amount: i64,
    ) -> Result<Balance, BalanceStoreError> {
        self.bounded(
            "compare_and_update",
            self.inner.compare_and_update(account_id, expected, new_amount),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::balance_store::InMemoryBalanceStore;

    /// Store whose reads never complete.
    struct StalledStore;

    #[async_trait]
    impl BalanceStore for StalledStore {
        async fn get(&self, _: AccountId) -> Result<Option<Balance>, BalanceStoreError> {
            std::future::pending().await
        }

        async fn insert(&self, _: AccountId, _: i64) -> Result<Balance, BalanceStoreError> {
            std::future::pending().await
        }

        async fn compare_and_update(
            &self,
            _: AccountId,
            _: Version,
            _: i64,
        ) -> Result<Balance, BalanceStoreError> {
            std::future::pending().await
        }
    }

    #[tokio::test(start_paused = true)]
    async fn stalled_call_becomes_timeout() {
        let store = TimeoutStore::new(StalledStore, Duration::from_secs(3));
        let err = store.get(AccountId::new()).await.unwrap_err();
        match err {
            BalanceStoreError::Timeout { operation, after } => {
                assert_eq!(operation, "get");
                assert_eq!(after, Duration::from_secs(3));
            }
            other => panic!("Expected timeout, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn fast_calls_pass_through() {
        let store = TimeoutStore::new(InMemoryBalanceStore::new(), Duration::from_secs(1));
        let id = AccountId::new();
        store.insert(id, 5).await.unwrap();
        assert_eq!(store.get(id).await.unwrap().unwrap().amount, 5);
        assert!(matches!(
            store.insert(id, 5).await,
            Err(BalanceStoreError::AlreadyExists(_))
        ));
    }
}
