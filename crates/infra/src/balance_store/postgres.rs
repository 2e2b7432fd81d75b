//! Postgres-backed balance store implementation.
//!
//! One row per account in the `balances` table. The conditional write is a
//! single `UPDATE ... WHERE id = $1 AND version = $2` statement, so Postgres'
//! row lock gives the atomicity the store contract requires.
//!
//! ## Error Mapping
//!
//! | SQLx Error | PostgreSQL Error Code | BalanceStoreError | Scenario |
//! |------------|----------------------|-------------------|----------|
//! | Database (unique violation) | `23505` | `AlreadyExists` | Two first deposits raced on insert |
//! | Database (check constraint violation) | `23514` | `InvalidWrite` | Negative amount reached the table |
//! | Database (other) | Any other | `Backend` | Other database errors |
//! | PoolClosed | N/A | `Backend` | Connection pool was closed |
//! | Other | N/A | `Backend` | Network errors, connection failures, etc. |

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::{FromRow, Row};
use tracing::instrument;

use simpleledger_core::{AccountId, Balance, Version};

use super::r#trait::{BalanceStore, BalanceStoreError};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS balances (
    id          UUID        PRIMARY KEY,
    amount      BIGINT      NOT NULL CHECK (amount >= 0),
    version     BIGINT      NOT NULL DEFAULT 1,
    updated_at  TIMESTAMPTZ NOT NULL DEFAULT NOW()
)
"#;

/// Postgres-backed balance store.
///
/// Cheap to clone; clones share the underlying connection pool.
#[derive(Debug, Clone)]
pub struct PostgresBalanceStore {
    pool: PgPool,
}

impl PostgresBalanceStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Open a pool against `database_url`.
    pub async fn connect(
        database_url: &str,
        max_connections: u32,
    ) -> Result<Self, BalanceStoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;
        Ok(Self::new(pool))
    }

    /// Create the `balances` table if it does not exist yet.
    pub async fn ensure_schema(&self) -> Result<(), BalanceStoreError> {
        sqlx::query(SCHEMA)
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("ensure_schema", e))?;
        Ok(())
    }

    async fn current_version(
        &self,
        account_id: AccountId,
    ) -> Result<Option<Version>, BalanceStoreError> {
        let row = sqlx::query("SELECT version FROM balances WHERE id = $1")
            .bind(account_id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("current_version", e))?;

        row.map(|r| {
            r.try_get::<i64, _>("version")
                .map(|v| Version::new(v as u64))
                .map_err(|e| BalanceStoreError::Backend(format!("failed to read version: {e}")))
        })
        .transpose()
    }
}

#[async_trait]
impl BalanceStore for PostgresBalanceStore {
    #[instrument(skip(self), fields(account_id = %account_id), err)]
    async fn get(&self, account_id: AccountId) -> Result<Option<Balance>, BalanceStoreError> {
        let row = sqlx::query(
            r#"
            SELECT id, amount, version, updated_at
            FROM balances
            WHERE id = $1
            "#,
        )
        .bind(account_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("get", e))?;

        row.map(|r| decode_balance(&r)).transpose()
    }

    // Conflicts are routine here, so errors are left to the caller to log.
    #[instrument(skip(self), fields(account_id = %account_id))]
    async fn insert(
        &self,
        account_id: AccountId,
        amount: i64,
    ) -> Result<Balance, BalanceStoreError> {
        let row = sqlx::query(
            r#"
            INSERT INTO balances (id, amount, version, updated_at)
            VALUES ($1, $2, $3, NOW())
            RETURNING id, amount, version, updated_at
            "#,
        )
        .bind(account_id.as_uuid())
        .bind(amount)
        .bind(Version::INITIAL.get() as i64)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                BalanceStoreError::AlreadyExists(account_id)
            } else {
                map_sqlx_error("insert", e)
            }
        })?;

        decode_balance(&row)
    }

    #[instrument(skip(self), fields(account_id = %account_id, expected = %expected))]
    async fn compare_and_update(
        &self,
        account_id: AccountId,
        expected: Version,
        new_amount: i64,
    ) -> Result<Balance, BalanceStoreError> {
        let row = sqlx::query(
            r#"
            UPDATE balances
            SET amount = $3, version = version + 1, updated_at = NOW()
            WHERE id = $1 AND version = $2
            RETURNING id, amount, version, updated_at
            "#,
        )
        .bind(account_id.as_uuid())
        .bind(expected.get() as i64)
        .bind(new_amount)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("compare_and_update", e))?;

        if let Some(row) = row {
            return decode_balance(&row);
        }

        // Nothing matched: either the row is gone or its version moved on.
        match self.current_version(account_id).await? {
            None => Err(BalanceStoreError::NotFound(account_id)),
            Some(actual) => Err(BalanceStoreError::VersionConflict {
                account_id,
                expected,
                actual,
            }),
        }
    }
}

fn decode_balance(row: &PgRow) -> Result<Balance, BalanceStoreError> {
    BalanceRow::from_row(row)
        .map(Balance::from)
        .map_err(|e| BalanceStoreError::Backend(format!("failed to deserialize balance row: {e}")))
}

/// Map SQLx errors to BalanceStoreError.
fn map_sqlx_error(operation: &str, err: sqlx::Error) -> BalanceStoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let msg = format!("database error in {}: {}", operation, db_err.message());
            match db_err.code().as_deref() {
                Some("23514") => BalanceStoreError::InvalidWrite(msg),
                _ => BalanceStoreError::Backend(msg),
            }
        }
        sqlx::Error::PoolClosed => {
            BalanceStoreError::Backend(format!("connection pool closed in {operation}"))
        }
        _ => BalanceStoreError::Backend(format!("sqlx error in {operation}: {err}")),
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    if let sqlx::Error::Database(db_err) = err {
        if let Some(code) = db_err.code() {
            return code.as_ref() == "23505";
        }
    }
    false
}

#[derive(Debug)]
struct BalanceRow {
    id: uuid::Uuid,
    amount: i64,
    version: i64,
    updated_at: DateTime<Utc>,
}

impl<'r> FromRow<'r, PgRow> for BalanceRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(BalanceRow {
            id: row.try_get("id")?,
            amount: row.try_get("amount")?,
            version: row.try_get("version")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

impl From<BalanceRow> for Balance {
    fn from(row: BalanceRow) -> Self {
        Balance {
            account_id: AccountId::from_uuid(row.id),
            amount: row.amount,
            version: Version::new(row.version as u64),
            updated_at: row.updated_at,
        }
    }
}
