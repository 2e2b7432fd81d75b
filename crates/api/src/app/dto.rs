use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use simpleledger_core::{
    AccountId, Amount, Balance, Transaction, TransactionKind, ValidationErrors, Validator,
};

// -------------------------
// Request DTOs
// -------------------------

/// Body of `POST /v1/transactions`.
///
/// Fields default when absent so that a sparse body reports every missing
/// field through validation instead of failing on the first one.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TransactionRequest {
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub amount: i64,
    #[serde(default, rename = "type", alias = "kind")]
    pub kind: String,
}

impl TransactionRequest {
    /// Check every field and build the domain transaction.
    pub fn into_transaction(self) -> Result<Transaction, ValidationErrors> {
        let mut v = Validator::new();

        let account_id = self
            .user_id
            .trim()
            .parse::<AccountId>()
            .ok()
            .filter(|id| !id.is_nil());
        v.check(account_id.is_some(), "user_id", "must be uuid");

        let amount = Amount::new(self.amount).ok();
        v.check(amount.is_some(), "amount", "must be positive");

        let kind = self.kind.parse::<TransactionKind>().ok();
        v.check(kind.is_some(), "type", "must be deposit or withdrawal");

        let tx = match (account_id, kind, amount) {
            (Some(account_id), Some(kind), Some(amount)) => {
                Some(Transaction::new(account_id, kind, amount))
            }
            _ => None,
        };
        v.finish(tx)
    }
}

// -------------------------
// Response DTOs
// -------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BalanceResponse {
    pub id: String,
    pub amount: i64,
    pub version: u64,
    pub updated_at: DateTime<Utc>,
}

impl From<Balance> for BalanceResponse {
    fn from(b: Balance) -> Self {
        Self {
            id: b.account_id.to_string(),
            amount: b.amount,
            version: b.version.get(),
            updated_at: b.updated_at,
        }
    }
}
