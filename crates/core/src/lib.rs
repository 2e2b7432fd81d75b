//! `simpleledger-core`: domain building blocks for the balance ledger.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns):
//! identifiers, the balance model, the transaction decision rule and input
//! validation helpers.

pub mod balance;
pub mod error;
pub mod id;
pub mod validation;
pub mod version;

pub use balance::{Amount, Balance, Plan, Transaction, TransactionKind};
pub use error::{DomainError, DomainResult};
pub use id::AccountId;
pub use validation::{ValidationErrors, Validator};
pub use version::Version;
