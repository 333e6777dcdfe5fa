//! Validated `schema.table` identifiers.
//!
//! Query parameters are always bound, but identifiers cannot be, so the table
//! name is restricted to plain SQL identifiers before it reaches a query.

use std::{fmt, str::FromStr};

use serde::Deserialize;
use thiserror::Error;

/// Table read when the configuration does not name one.
pub const DEFAULT_READINGS_TABLE: &str = "p1.external_readings";

#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid table name {name:?}: {reason}")]
pub struct TableNameError {
    name: String,
    reason: &'static str,
}

/// Optionally schema-qualified table name.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub struct TableName {
    schema: Option<String>,
    table: String,
}

impl TableName {
    pub fn schema(&self) -> Option<&str> {
        self.schema.as_deref()
    }

    pub fn table(&self) -> &str {
        &self.table
    }
}

impl Default for TableName {
    fn default() -> Self {
        Self {
            schema: Some("p1".into()),
            table: "external_readings".into(),
        }
    }
}

fn is_identifier(part: &str) -> bool {
    let mut chars = part.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

impl FromStr for TableName {
    type Err = TableNameError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        let invalid = |reason| TableNameError {
            name: name.to_owned(),
            reason,
        };
        let (schema, table) = match name.split_once('.') {
            Some((schema, table)) => (Some(schema), table),
            None => (None, name),
        };
        if schema.is_some_and(|s| !is_identifier(s)) {
            return Err(invalid("schema must be a plain identifier"));
        }
        if !is_identifier(table) {
            return Err(invalid("table must be a plain identifier"));
        }
        Ok(Self {
            schema: schema.map(str::to_owned),
            table: table.to_owned(),
        })
    }
}

impl TryFrom<String> for TableName {
    type Error = TableNameError;

    fn try_from(name: String) -> Result<Self, Self::Error> {
        name.parse()
    }
}

impl fmt::Display for TableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.schema {
            Some(schema) => write!(f, "{schema}.{}", self.table),
            None => f.write_str(&self.table),
        }
    }
}
