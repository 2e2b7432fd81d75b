use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::Utc;

use simpleledger_core::{AccountId, Balance, Version};

use super::r#trait::{BalanceStore, BalanceStoreError};

/// In-memory balance store.
///
/// Intended for tests/dev. Every write happens under the map's write lock, so
/// the version check and the replacement are a single atomic step.
#[derive(Debug, Default)]
pub struct InMemoryBalanceStore {
    balances: RwLock<HashMap<AccountId, Balance>>,
}

impl InMemoryBalanceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of accounts with a record.
    pub fn len(&self) -> Result<usize, BalanceStoreError> {
        Ok(self.balances.read().map_err(|_| poisoned())?.len())
    }

    pub fn is_empty(&self) -> Result<bool, BalanceStoreError> {
        Ok(self.len()? == 0)
    }
}

fn poisoned() -> BalanceStoreError {
    BalanceStoreError::Backend("lock poisoned".to_string())
}

fn ensure_non_negative(amount: i64) -> Result<(), BalanceStoreError> {
    if amount < 0 {
        return Err(BalanceStoreError::InvalidWrite(format!(
            "amount must be >= 0, got {amount}"
        )));
    }
    Ok(())
}

#[async_trait]
impl BalanceStore for InMemoryBalanceStore {
    async fn get(&self, account_id: AccountId) -> Result<Option<Balance>, BalanceStoreError> {
        let balances = self.balances.read().map_err(|_| poisoned())?;
        Ok(balances.get(&account_id).cloned())
    }

    async fn insert(
        &self,
        account_id: AccountId,
        amount: i64,
    ) -> Result<Balance, BalanceStoreError> {
        ensure_non_negative(amount)?;

        let mut balances = self.balances.write().map_err(|_| poisoned())?;
        if balances.contains_key(&account_id) {
            return Err(BalanceStoreError::AlreadyExists(account_id));
        }

        let balance = Balance {
            account_id,
            amount,
            version: Version::INITIAL,
            updated_at: Utc::now(),
        };
        balances.insert(account_id, balance.clone());
        Ok(balance)
    }

    async fn compare_and_update(
        &self,
        account_id: AccountId,
        expected: Version,
        new_amount: i64,
    ) -> Result<Balance, BalanceStoreError> {
        ensure_non_negative(new_amount)?;

        let mut balances = self.balances.write().map_err(|_| poisoned())?;
        let stored = balances
            .get_mut(&account_id)
            .ok_or(BalanceStoreError::NotFound(account_id))?;

        if !expected.matches(stored.version) {
            return Err(BalanceStoreError::VersionConflict {
                account_id,
                expected,
                actual: stored.version,
            });
        }

        stored.amount = new_amount;
        stored.version = stored.version.next();
        stored.updated_at = Utc::now();
        Ok(stored.clone())
    }
}
