//! Meter reading as stored in the readings table.

use std::fmt;

use chrono::{DateTime, Utc};

/// A single observation read back from the data store.
///
/// Readings are never modified by this crate.
#[derive(Clone, Debug, PartialEq)]
pub struct Reading {
    /// Opaque row identifier assigned by the store.
    pub id: String,
    /// Insertion time recorded by the store.
    pub timestamp: DateTime<Utc>,
    /// Cumulative meter value.
    pub value: f64,
}

impl Reading {
    pub fn new(id: impl Into<String>, timestamp: DateTime<Utc>, value: f64) -> Self {
        Self {
            id: id.into(),
            timestamp,
            value,
        }
    }
}

impl fmt::Display for Reading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} at {} = {}",
            self.id,
            self.timestamp.to_rfc3339(),
            self.value
        )
    }
}
