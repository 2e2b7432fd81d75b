//! Field-level input validation.
//!
//! Transports decode a request into raw values and run every check through a
//! [`Validator`] before anything reaches the ledger, so a caller gets all
//! failing fields at once rather than the first one.

use std::collections::BTreeMap;

use serde::Serialize;

/// Accumulates `field -> reason` failures. The first reason per field wins.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Validator {
    errors: BTreeMap<String, String>,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, field: impl Into<String>, reason: impl Into<String>) {
        self.errors.entry(field.into()).or_insert_with(|| reason.into());
    }

    pub fn check(&mut self, ok: bool, field: &str, reason: &str) {
        if !ok {
            self.add_error(field, reason);
        }
    }

    pub fn errors(&self) -> &BTreeMap<String, String> {
        &self.errors
    }

    /// Hand back `value` when every check passed and it is present,
    /// otherwise the collected failures.
    ///
    /// A missing `value` is expected to have failed a check already.
    pub fn finish<T>(self, value: Option<T>) -> Result<T, ValidationErrors> {
        match value {
            Some(v) if self.is_valid() => Ok(v),
            _ => Err(ValidationErrors(self.errors)),
        }
    }
}

/// Non-empty set of field failures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<String, String>);

impl ValidationErrors {
    pub fn fields(&self) -> &BTreeMap<String, String> {
        &self.0
    }
}

impl core::fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let mut first = true;
        for (field, reason) in &self.0 {
            if !first {
                f.write_str("; ")?;
            }
            write!(f, "{field}: {reason}")?;
            first = false;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}
