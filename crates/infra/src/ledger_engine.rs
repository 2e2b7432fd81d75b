//! Transaction execution pipeline (application-level orchestration).
//!
//! The engine turns a validated [`Transaction`] into a committed balance:
//!
//! ```text
//! Transaction
//!   ↓
//! 1. Read the current balance (or "no record")
//!   ↓
//! 2. Decide the write (pure, `Transaction::plan`)
//!   ↓
//! 3. Insert (first deposit) or compare-and-update at the version read in 1
//!   ↓
//! 4. Conflict? Back off and start again from 1
//! ```
//!
//! No lock is held across the read and the write. Correctness comes from the
//! store rejecting a write whose expected version is stale, so two cycles that
//! read the same amount can never both commit. The engine itself keeps no state
//! between calls and can be shared freely between tasks.

use thiserror::Error;
use tracing::{debug, instrument, warn};

use simpleledger_core::{AccountId, Balance, DomainError, Plan, Transaction};

use crate::balance_store::{BalanceStore, BalanceStoreError};
use crate::retry::RetryPolicy;

/// Successfully committed transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Applied {
    pub balance: Balance,
    /// `true` when this transaction opened the account.
    pub created: bool,
}

/// Why a transaction was not applied.
#[derive(Debug, Error)]
pub enum ApplyError {
    /// Business rejection (insufficient funds, overflow). Nothing was written.
    #[error(transparent)]
    Rejected(#[from] DomainError),

    /// Lost every race within the retry budget. Safe to retry later.
    #[error("account {account_id} is busy: gave up after {attempts} attempts")]
    Busy { account_id: AccountId, attempts: u32 },

    /// Store failure (backend error or timeout).
    #[error(transparent)]
    Store(#[from] BalanceStoreError),
}

impl ApplyError {
    pub fn is_insufficient_funds(&self) -> bool {
        matches!(
            self,
            ApplyError::Rejected(DomainError::InsufficientFunds { .. })
        )
    }

    /// Whether the same request may succeed if simply sent again later.
    pub fn is_transient(&self) -> bool {
        match self {
            ApplyError::Busy { .. } => true,
            ApplyError::Store(e) => e.is_transient(),
            ApplyError::Rejected(_) => false,
        }
    }
}

/// Applies deposits and withdrawals against a [`BalanceStore`].
#[derive(Debug, Clone)]
pub struct LedgerEngine<S> {
    store: S,
    retry: RetryPolicy,
}

impl<S> LedgerEngine<S> {
    pub fn new(store: S, retry: RetryPolicy) -> Self {
        Self { store, retry }
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}

impl<S> LedgerEngine<S>
where
    S: BalanceStore,
{
    /// Apply one transaction, retrying on write conflicts.
    ///
    /// Returns the committed balance, or:
    /// - `Rejected(InsufficientFunds)` for a withdrawal larger than the balance
    ///   (including any withdrawal on an account with no record),
    /// - `Busy` when `max_attempts` cycles all lost a race,
    /// - `Store` for backend failures and timeouts.
    ///
    /// Conflict signals from the store never escape this method.
    #[instrument(
        skip(self, tx),
        fields(
            account_id = %tx.account_id,
            kind = %tx.kind,
            amount = tx.amount.get()
        )
    )]
    pub async fn apply(&self, tx: Transaction) -> Result<Applied, ApplyError> {
        let mut attempt: u32 = 0;
        loop {
            attempt += 1;

            let err = match self.try_apply(&tx).await {
                Ok(applied) => {
                    debug!(
                        attempt,
                        version = applied.balance.version.get(),
                        amount = applied.balance.amount,
                        created = applied.created,
                        "transaction committed"
                    );
                    return Ok(applied);
                }
                Err(e) if should_retry(&e) => e,
                Err(e) => {
                    debug!(attempt, error = %e, "transaction not applied");
                    return Err(e.into());
                }
            };

            if attempt >= self.retry.max_attempts {
                warn!(attempt, error = %err, "retry budget exhausted");
                return Err(ApplyError::Busy {
                    account_id: tx.account_id,
                    attempts: attempt,
                });
            }

            debug!(attempt, error = %err, "write conflict, retrying");
            let delay = self.retry.delay_after(attempt);
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
        }
    }

    /// One read-decide-write cycle.
    async fn try_apply(&self, tx: &Transaction) -> Result<Applied, CycleError> {
        let current = self.store.get(tx.account_id).await?;

        match tx.plan(current.as_ref())? {
            Plan::Open { amount } => {
                let balance = self.store.insert(tx.account_id, amount).await?;
                Ok(Applied {
                    balance,
                    created: true,
                })
            }
            Plan::Update { expected, amount } => {
                let balance = self
                    .store
                    .compare_and_update(tx.account_id, expected, amount)
                    .await?;
                Ok(Applied {
                    balance,
                    created: false,
                })
            }
        }
    }
}

/// Failure of a single cycle, before retry classification.
#[derive(Debug, Error)]
enum CycleError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Store(#[from] BalanceStoreError),
}

impl From<CycleError> for ApplyError {
    fn from(value: CycleError) -> Self {
        match value {
            CycleError::Domain(e) => ApplyError::Rejected(e),
            CycleError::Store(e) => ApplyError::Store(e),
        }
    }
}

/// Conflicts mean the read went stale. A record vanishing between read and
/// write is treated the same way: re-read and decide again.
fn should_retry(err: &CycleError) -> bool {
    match err {
        CycleError::Store(e) => e.is_conflict() || matches!(e, BalanceStoreError::NotFound(_)),
        CycleError::Domain(_) => false,
    }
}
