//! Balance store boundary.
//!
//! Durable keyed storage for account balances: point-in-time read, create-only
//! insert and version-checked conditional write. The ledger engine is the only
//! writer and always goes through `compare_and_update`.

pub mod in_memory;
pub mod postgres;
pub mod timeout;
pub mod r#trait;

pub use in_memory::InMemoryBalanceStore;
pub use postgres::PostgresBalanceStore;
pub use timeout::TimeoutStore;
pub use r#trait::{BalanceStore, BalanceStoreError};
