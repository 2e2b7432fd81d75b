use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use simpleledger_core::{AccountId, Balance, Version};

/// Balance store operation error.
///
/// These are **infrastructure errors** as opposed to domain rejections.
/// `AlreadyExists` and `VersionConflict` are the two concurrency signals: they
/// tell the writer that someone else committed first and the cycle has to be
/// re-run from a fresh read.
#[derive(Debug, Error)]
pub enum BalanceStoreError {
    #[error("no balance recorded for account {0}")]
    NotFound(AccountId),

    #[error("balance for account {0} already exists")]
    AlreadyExists(AccountId),

    #[error("version conflict on account {account_id}: expected {expected}, found {actual}")]
    VersionConflict {
        account_id: AccountId,
        expected: Version,
        actual: Version,
    },

    /// The write would store a negative amount.
    #[error("invalid write: {0}")]
    InvalidWrite(String),

    #[error("storage backend failure: {0}")]
    Backend(String),

    /// The store did not answer in time. The operation may or may not have
    /// taken effect, but never partially.
    #[error("store {operation} timed out after {after:?}")]
    Timeout {
        operation: &'static str,
        after: Duration,
    },
}

impl BalanceStoreError {
    /// Whether the failure only means "lost a race, re-read and try again".
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            BalanceStoreError::AlreadyExists(_) | BalanceStoreError::VersionConflict { .. }
        )
    }

    /// Whether the caller may simply try again later.
    pub fn is_transient(&self) -> bool {
        matches!(self, BalanceStoreError::Timeout { .. })
    }
}

/// Durable keyed storage for account balances.
///
/// ## Contract
///
/// - `get` is a point-in-time read with no side effects; `Ok(None)` means the
///   account has no record.
/// - `insert` creates a record at [`Version::INITIAL`] and fails with
///   `AlreadyExists` if one is present (two first deposits racing).
/// - `compare_and_update` replaces the amount **only if** the stored version
///   still equals `expected`, advancing the version by one. It fails with
///   `VersionConflict` if another writer got there first and `NotFound` if
///   there is no record.
///
/// `compare_and_update` must be atomic with respect to concurrent writers; it
/// is the only place mutual exclusion is needed. Every successful write is
/// visible to subsequent `get` calls from any caller.
#[async_trait]
pub trait BalanceStore: Send + Sync {
    async fn get(&self, account_id: AccountId) -> Result<Option<Balance>, BalanceStoreError>;

    async fn insert(&self, account_id: AccountId, amount: i64)
    -> Result<Balance, BalanceStoreError>;

    async fn compare_and_update(
        &self,
        account_id: AccountId,
        expected: Version,
        new_amount: i64,
    ) -> Result<Balance, BalanceStoreError>;
}

#[async_trait]
impl<S> BalanceStore for Arc<S>
where
    S: BalanceStore + ?Sized,
{
    async fn get(&self, account_id: AccountId) -> Result<Option<Balance>, BalanceStoreError> {
        (**self).get(account_id).await
    }

    async fn insert(
        &self,
        account_id: AccountId,
        amount: i64,
    ) -> Result<Balance, BalanceStoreError> {
        (**self).insert(account_id, amount).await
    }

    async fn compare_and_update(
        &self,
        account_id: AccountId,
        expected: Version,
        new_amount: i64,
    ) -> Result<Balance, BalanceStoreError> {
        (**self).compare_and_update(account_id, expected, new_amount).await
    }
}
