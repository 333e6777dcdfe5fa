//! Read-only access to the readings table.
//!
//! The locator talks to the data store through [`ReadingStore`] so it can be
//! exercised against in-memory fakes. [`PgReadingStore`] is the production
//! implementation backed by a single PostgreSQL connection.

mod dsn;
mod postgres;
mod table;

use thiserror::Error;

use crate::{context::Interrupted, context::RunContext, reading::Reading, timezone::DayWindow};

pub use postgres::PgReadingStore;
pub use table::{DEFAULT_READINGS_TABLE, TableName, TableNameError};

/// Failures raised while talking to the data store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The connection could not be opened or was lost.
    #[error("database connection failed: {0}")]
    Connection(#[source] sqlx::Error),
    /// The connection string could not be understood.
    #[error("invalid database connection string: {0}")]
    InvalidDsn(String),
    /// The server did not complete the connection handshake in time.
    #[error("timed out connecting to database")]
    ConnectTimedOut,
    /// The store was already closed.
    #[error("database connection is closed")]
    Closed,
    /// The query was sent but failed.
    #[error("query failed: {0}")]
    Query(#[source] sqlx::Error),
    /// The operation did not finish within its time budget.
    #[error("database operation timed out")]
    TimedOut,
    /// The run was cancelled or ran out of time before the operation started.
    #[error(transparent)]
    Interrupted(#[from] Interrupted),
    /// The async runtime driving the driver could not be created.
    #[error("failed to start database runtime: {0}")]
    Runtime(#[source] std::io::Error),
}

impl StoreError {
    /// Whether the failure concerns the connection rather than the query.
    pub fn is_connection(&self) -> bool {
        matches!(
            self,
            Self::Connection(_)
                | Self::InvalidDsn(_)
                | Self::ConnectTimedOut
                | Self::Closed
                | Self::Runtime(_)
        )
    }
}

/// Capability for reading meter rows.
pub trait ReadingStore {
    /// Return the row with the smallest timestamp in `window`, if any.
    fn earliest_in_window(
        &mut self,
        ctx: &RunContext,
        window: &DayWindow,
    ) -> Result<Option<Reading>, StoreError>;

    /// Release the underlying connection. Closing twice is a no-op.
    fn close(&mut self);
}

impl<S: ReadingStore + ?Sized> ReadingStore for &mut S {
    fn earliest_in_window(
        &mut self,
        ctx: &RunContext,
        window: &DayWindow,
    ) -> Result<Option<Reading>, StoreError> {
        (**self).earliest_in_window(ctx, window)
    }

    fn close(&mut self) {
        (**self).close();
    }
}

impl<S: ReadingStore + ?Sized> ReadingStore for Box<S> {
    fn earliest_in_window(
        &mut self,
        ctx: &RunContext,
        window: &DayWindow,
    ) -> Result<Option<Reading>, StoreError> {
        (**self).earliest_in_window(ctx, window)
    }

    fn close(&mut self) {
        (**self).close();
    }
}
