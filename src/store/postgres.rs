//! PostgreSQL-backed [`ReadingStore`].
//!
//! sqlx is async, while the run is synchronous end to end. The store owns a
//! current-thread tokio runtime and blocks on each driver call, bounding it by
//! the remaining run budget and abandoning it when the run is cancelled.

use std::{future::Future, thread, time::Duration};

use chrono::{DateTime, Utc};
use crossbeam_channel::bounded;
use log::{debug, warn};
use sqlx::{Connection, FromRow, PgConnection};
use tokio::{
    runtime::{Builder, Runtime},
    sync::oneshot,
};

use crate::{context::RunContext, reading::Reading, timezone::DayWindow};

use super::{ReadingStore, StoreError, TableName, dsn::connect_options};

/// Upper bound for a single driver call when the run has no deadline.
pub const DEFAULT_STATEMENT_TIMEOUT: Duration = Duration::from_secs(30);

const CLOSE_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, FromRow)]
struct ReadingRow {
    id: String,
    created_at: DateTime<Utc>,
    value: f64,
}

impl From<ReadingRow> for Reading {
    fn from(row: ReadingRow) -> Self {
        Reading::new(row.id, row.created_at, row.value)
    }
}

fn earliest_in_window_sql(table: &TableName) -> String {
    format!(
        "SELECT id::text AS id, created_at, value::float8 AS value FROM {table} \
         WHERE created_at >= $1 AND created_at < $2 \
         ORDER BY created_at ASC LIMIT 1"
    )
}

/// Store holding one connection for the lifetime of a run.
///
/// The connection is closed by [`ReadingStore::close`] or, failing that, when
/// the store is dropped.
pub struct PgReadingStore {
    runtime: Runtime,
    conn: Option<PgConnection>,
    query: String,
}

impl PgReadingStore {
    /// Open a connection using the given DSN, in URL or key/value form.
    pub fn open(ctx: &RunContext, dsn: &str, table: &TableName) -> Result<Self, StoreError> {
        ctx.check()?;
        let options = connect_options(dsn)?;
        let runtime = Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(StoreError::Runtime)?;
        let conn = match block_on_bounded(&runtime, ctx, PgConnection::connect_with(&options)) {
            Ok(connected) => connected.map_err(StoreError::Connection)?,
            Err(StoreError::TimedOut) => return Err(StoreError::ConnectTimedOut),
            Err(err) => return Err(err),
        };
        debug!("connected to database; reading from {table}");
        Ok(Self {
            runtime,
            conn: Some(conn),
            query: earliest_in_window_sql(table),
        })
    }
}

/// Drive `fut` to completion within the run budget.
///
/// A watcher thread forwards cancellation of the run into the runtime, so the
/// driver call is dropped as soon as the run is cancelled.
fn block_on_bounded<F: Future>(
    runtime: &Runtime,
    ctx: &RunContext,
    fut: F,
) -> Result<F::Output, StoreError> {
    ctx.check()?;
    let budget = ctx.bound(DEFAULT_STATEMENT_TIMEOUT);

    let (cancel_tx, cancel_rx) = oneshot::channel();
    let (done_tx, done_rx) = bounded::<()>(0);
    let watcher = ctx.clone();
    thread::spawn(move || {
        if let Err(reason) = watcher.recv(&done_rx) {
            let _ = cancel_tx.send(reason);
        }
    });

    let result = runtime.block_on(async {
        tokio::select! {
            output = tokio::time::timeout(budget, fut) => output.map_err(|_| StoreError::TimedOut),
            Ok(reason) = cancel_rx => Err(StoreError::Interrupted(reason)),
        }
    });
    drop(done_tx);
    result
}

impl ReadingStore for PgReadingStore {
    fn earliest_in_window(
        &mut self,
        ctx: &RunContext,
        window: &DayWindow,
    ) -> Result<Option<Reading>, StoreError> {
        let conn = self.conn.as_mut().ok_or(StoreError::Closed)?;
        debug!("querying earliest reading in {window}");
        let query = sqlx::query_as::<_, ReadingRow>(&self.query)
            .bind(window.start_utc())
            .bind(window.end_utc())
            .fetch_optional(&mut *conn);
        let row = block_on_bounded(&self.runtime, ctx, query)?.map_err(|err| match err {
            sqlx::Error::Io(_) | sqlx::Error::PoolClosed | sqlx::Error::Tls(_) => {
                StoreError::Connection(err)
            }
            other => StoreError::Query(other),
        })?;
        Ok(row.map(Reading::from))
    }

    fn close(&mut self) {
        let Some(conn) = self.conn.take() else {
            return;
        };
        let closed = self
            .runtime
            .block_on(async { tokio::time::timeout(CLOSE_TIMEOUT, conn.close()).await });
        match closed {
            Ok(Ok(())) => debug!("database connection closed"),
            Ok(Err(err)) => warn!("error while closing database connection: {err}"),
            Err(_) => warn!("database connection did not close in time; dropping it"),
        }
    }
}

impl Drop for PgReadingStore {
    fn drop(&mut self) {
        self.close();
    }
}

impl std::fmt::Debug for PgReadingStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PgReadingStore")
            .field("open", &self.conn.is_some())
            .finish()
    }
}
