//! Store key derivation for batches
//!
//! Every process sharing the store must derive identical keys for the same
//! batch, so ids are reduced to one canonical string up front.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Caller-supplied batch identifier in canonical string form
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BatchId(String);

impl BatchId {
    /// Build from anything with a stable `Display`
    pub fn new(id: impl fmt::Display) -> Self {
        Self(id.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for BatchId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for BatchId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&String> for BatchId {
    fn from(id: &String) -> Self {
        Self(id.clone())
    }
}

impl From<Uuid> for BatchId {
    fn from(id: Uuid) -> Self {
        // Hyphenated lowercase, the same form Uuid's Display produces everywhere
        Self::new(id.hyphenated())
    }
}

impl From<i64> for BatchId {
    fn from(id: i64) -> Self {
        Self::new(id)
    }
}

impl From<u64> for BatchId {
    fn from(id: u64) -> Self {
        Self::new(id)
    }
}

/// `"<id>_count"`
pub fn count_key(id: &BatchId) -> String {
    format!("{id}_count")
}

/// `"<id>_in_progress"`
pub fn in_progress_key(id: &BatchId) -> String {
    format!("{id}_in_progress")
}

/// `"batch:<id>"`, reserved for list-backed batch membership
pub fn batch_key(id: &BatchId) -> String {
    format!("batch:{id}")
}

/// Key derivation with an optional deployment prefix
///
/// With an empty prefix the keys are exactly the bare forms above; otherwise
/// each is rendered as `"<prefix>:<key>"`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyNamespace {
    prefix: String,
}

impl KeyNamespace {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn count_key(&self, id: &BatchId) -> String {
        self.scoped(count_key(id))
    }

    pub fn in_progress_key(&self, id: &BatchId) -> String {
        self.scoped(in_progress_key(id))
    }

    pub fn batch_key(&self, id: &BatchId) -> String {
        self.scoped(batch_key(id))
    }

    fn scoped(&self, key: String) -> String {
        if self.prefix.is_empty() {
            key
        } else {
            format!("{}:{}", self.prefix, key)
        }
    }
}
