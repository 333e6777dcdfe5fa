//! One run of the relay: locate, transform, then deliver or print.

use std::io::{self, Write};

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use log::info;
use thiserror::Error;

use crate::{
    context::{Interrupted, RunContext},
    delivery::{Deliverer, DeliveryError},
    locator::{LocateError, find_earliest_today},
    payload::{MeterReading, PayloadError},
    settings::ConfigError,
    store::{ReadingStore, StoreError},
    timezone::DayWindow,
};

/// Fatal failures of a run, one variant per stage.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("db connect: {0}")]
    Connection(#[source] StoreError),
    #[error("select earliest: {0}")]
    Query(#[source] StoreError),
    #[error("select earliest: no reading found in {window}")]
    NotFound { window: DayWindow },
    #[error("build payload: {0}")]
    Payload(#[from] PayloadError),
    #[error("post failed: {0}")]
    Delivery(#[from] DeliveryError),
    #[error("write payload: {0}")]
    Output(#[from] io::Error),
    #[error(transparent)]
    Interrupted(#[from] Interrupted),
}

impl RunError {
    /// Short label of the stage that failed.
    pub fn stage(&self) -> &'static str {
        match self {
            Self::Config(_) => "config",
            Self::Connection(_) => "connect",
            Self::Query(_) | Self::NotFound { .. } => "select",
            Self::Payload(_) => "transform",
            Self::Delivery(err) if err.is_configuration() => "config",
            Self::Delivery(_) => "deliver",
            Self::Output(_) => "output",
            Self::Interrupted(_) => "interrupted",
        }
    }
}

impl From<StoreError> for RunError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Interrupted(reason) => Self::Interrupted(reason),
            err if err.is_connection() => Self::Connection(err),
            err => Self::Query(err),
        }
    }
}

impl From<LocateError> for RunError {
    fn from(err: LocateError) -> Self {
        match err {
            LocateError::NotFound { window } => Self::NotFound { window },
            LocateError::Store(err) => err.into(),
        }
    }
}

/// Where the payload goes once built.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Mode {
    /// Print the payload instead of posting it.
    DryRun,
    /// Post the payload to `url`.
    Deliver { url: String, auth_token: String },
}

/// Result of a successful run.
#[derive(Clone, Debug, PartialEq)]
pub enum Outcome {
    Printed(MeterReading),
    Delivered(MeterReading),
}

/// Everything a run needs besides its collaborators.
#[derive(Clone, Debug)]
pub struct Job {
    pub zone: Tz,
    pub mode: Mode,
}

impl Job {
    /// Run once against `store`, posting through `deliverer` or printing to
    /// `out` in dry-run mode. The store is closed before returning.
    pub fn run<S, D, W>(
        &self,
        ctx: &RunContext,
        store: &mut S,
        deliverer: &D,
        now: DateTime<Utc>,
        out: &mut W,
    ) -> Result<Outcome, RunError>
    where
        S: ReadingStore + ?Sized,
        D: Deliverer + ?Sized,
        W: Write + ?Sized,
    {
        let located = find_earliest_today(store, ctx, self.zone, now);
        store.close();
        let reading = located?;

        let payload = MeterReading::from_reading(&reading, self.zone);
        info!("selected: date={} reading={}", payload.date, payload.reading);

        match &self.mode {
            Mode::DryRun => {
                writeln!(out, "{}", payload.to_pretty_json()?)?;
                out.flush()?;
                Ok(Outcome::Printed(payload))
            }
            Mode::Deliver { url, auth_token } => {
                let body = payload.to_json_bytes()?;
                deliverer.deliver(ctx, url, auth_token, &body)?;
                info!("delivered payload to {url}");
                Ok(Outcome::Delivered(payload))
            }
        }
    }
}
