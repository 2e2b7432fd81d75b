use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};
use crate::id::AccountId;
use crate::version::Version;

/// Direction of a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Deposit,
    Withdrawal,
}

impl TransactionKind {
    pub const ALL: [TransactionKind; 2] = [TransactionKind::Deposit, TransactionKind::Withdrawal];

    pub fn as_str(self) -> &'static str {
        match self {
            TransactionKind::Deposit => "deposit",
            TransactionKind::Withdrawal => "withdrawal",
        }
    }

    /// Signed effect of `amount` on a balance.
    pub fn signed(self, amount: Amount) -> i64 {
        match self {
            TransactionKind::Deposit => amount.get(),
            TransactionKind::Withdrawal => -amount.get(),
        }
    }
}

impl core::fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl core::str::FromStr for TransactionKind {
    type Err = DomainError;

    /// Only the exact lowercase literals are accepted.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TransactionKind::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| DomainError::validation("kind must be deposit or withdrawal"))
    }
}

/// Strictly positive amount in the smallest currency unit (e.g. cents).
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Amount(i64);

impl Amount {
    pub fn new(value: i64) -> DomainResult<Self> {
        if value > 0 {
            Ok(Self(value))
        } else {
            Err(DomainError::validation("amount must be positive"))
        }
    }

    pub fn get(self) -> i64 {
        self.0
    }
}

/// Current balance of an account as held by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Balance {
    pub account_id: AccountId,
    /// Never negative for a committed record.
    pub amount: i64,
    pub version: Version,
    pub updated_at: DateTime<Utc>,
}

/// A validated request to move money in or out of one account.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transaction {
    pub account_id: AccountId,
    pub kind: TransactionKind,
    pub amount: Amount,
}

impl Transaction {
    pub fn new(account_id: AccountId, kind: TransactionKind, amount: Amount) -> Self {
        Self {
            account_id,
            kind,
            amount,
        }
    }

    pub fn deposit(account_id: AccountId, amount: Amount) -> Self {
        Self::new(account_id, TransactionKind::Deposit, amount)
    }

    pub fn withdrawal(account_id: AccountId, amount: Amount) -> Self {
        Self::new(account_id, TransactionKind::Withdrawal, amount)
    }

    /// Decide the write needed to apply this transaction on top of `current`.
    ///
    /// Pure: no IO, no mutation. `current` is `None` when the account has no
    /// record yet.
    pub fn plan(&self, current: Option<&Balance>) -> DomainResult<Plan> {
        let Some(current) = current else {
            return match self.kind {
                TransactionKind::Deposit => Ok(Plan::Open {
                    amount: self.amount.get(),
                }),
                TransactionKind::Withdrawal => Err(DomainError::insufficient_funds(
                    self.account_id,
                    0,
                    self.amount.get(),
                )),
            };
        };

        if current.account_id != self.account_id {
            return Err(DomainError::invariant(format!(
                "balance for {} used to plan transaction on {}",
                current.account_id, self.account_id
            )));
        }

        let next = match self.kind {
            TransactionKind::Deposit => current
                .amount
                .checked_add(self.amount.get())
                .ok_or_else(|| DomainError::invariant("balance overflow"))?,
            TransactionKind::Withdrawal => {
                if current.amount < self.amount.get() {
                    return Err(DomainError::insufficient_funds(
                        self.account_id,
                        current.amount,
                        self.amount.get(),
                    ));
                }
                current.amount - self.amount.get()
            }
        };

        Ok(Plan::Update {
            expected: current.version,
            amount: next,
        })
    }
}

/// Write the engine must issue to commit a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Plan {
    /// Create the record with this opening amount.
    Open { amount: i64 },
    /// Replace the amount, provided the record is still at `expected`.
    Update { expected: Version, amount: i64 },
}
