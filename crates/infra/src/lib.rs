//! Infrastructure layer: balance storage, the ledger engine and configuration.

pub mod balance_store;
pub mod config;
pub mod ledger_engine;
pub mod retry;


pub use balance_store::{BalanceStore, BalanceStoreError};
pub use config::{ConfigError, LedgerConfig};
pub use ledger_engine::{Applied, ApplyError, LedgerEngine};
pub use retry::RetryPolicy;
