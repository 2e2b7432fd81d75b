//! Optimistic concurrency marker for stored balances.

use serde::{Deserialize, Serialize};

/// Monotonically increasing version of a stored balance.
///
/// A record is created at [`Version::INITIAL`] and every successful write
/// advances it by exactly one. Writers present the version they read; a
/// mismatch means someone else committed in between.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Version(u64);

impl Version {
    pub const INITIAL: Version = Version(1);

    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn get(self) -> u64 {
        self.0
    }

    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }

    pub fn matches(self, actual: Version) -> bool {
        self == actual
    }
}

impl core::fmt::Display for Version {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_strictly_advances() {
        let v = Version::INITIAL;
        assert!(v.next() > v);
        assert_eq!(v.next().get(), 2);
    }

    #[test]
    fn serializes_as_plain_number() {
        let json = serde_json::to_string(&Version::new(7)).unwrap();
        assert_eq!(json, "7");
    }
}
