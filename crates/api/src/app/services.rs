//! Infrastructure wiring: picks a balance store and builds the engine on it.

use std::sync::Arc;

use simpleledger_core::{AccountId, Balance, Transaction};
use simpleledger_infra::balance_store::{
    BalanceStore, BalanceStoreError, InMemoryBalanceStore, PostgresBalanceStore, TimeoutStore,
};
use simpleledger_infra::{Applied, ApplyError, LedgerConfig, LedgerEngine};

/// Store as seen by handlers: any backend, every call time-bounded.
pub type SharedStore = TimeoutStore<Arc<dyn BalanceStore>>;

/// Everything a request handler needs. Cheap to share behind an `Arc`.
pub struct AppServices {
    engine: LedgerEngine<SharedStore>,
    backend: &'static str,
}

impl AppServices {
    pub fn new(store: Arc<dyn BalanceStore>, backend: &'static str, config: &LedgerConfig) -> Self {
        let store = TimeoutStore::new(store, config.store_timeout);
        Self {
            engine: LedgerEngine::new(store, config.retry.clone()),
            backend,
        }
    }

    /// In-memory wiring (dev/test).
    pub fn in_memory(config: &LedgerConfig) -> Self {
        Self::new(Arc::new(InMemoryBalanceStore::new()), "memory", config)
    }

    /// Name of the active backend, for logs.
    pub fn backend(&self) -> &'static str {
        self.backend
    }

    /// Write path: every transaction goes through the engine.
    pub async fn apply(&self, tx: Transaction) -> Result<Applied, ApplyError> {
        self.engine.apply(tx).await
    }

    /// Read path: straight to the store, no engine involved.
    pub async fn balance(&self, account_id: AccountId) -> Result<Option<Balance>, BalanceStoreError> {
        self.engine.store().get(account_id).await
    }
}

/// Build services from configuration: Postgres when `DATABASE_URL` is set,
/// otherwise in-memory.
pub async fn build_services(config: &LedgerConfig) -> Result<AppServices, BalanceStoreError> {
    match &config.database_url {
        Some(url) => {
            let store = PostgresBalanceStore::connect(url, config.db_max_connections).await?;
            store.ensure_schema().await?;
            tracing::info!(max_connections = config.db_max_connections, "using postgres balance store");
            Ok(AppServices::new(Arc::new(store), "postgres", config))
        }
        None => {
            tracing::warn!("DATABASE_URL not set; balances are kept in memory and lost on restart");
            Ok(AppServices::in_memory(config))
        }
    }
}
