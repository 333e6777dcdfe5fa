//! Locates the first reading of the current local day.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use log::{debug, info};
use thiserror::Error;

use crate::{
    context::RunContext,
    reading::Reading,
    store::{ReadingStore, StoreError},
    timezone::DayWindow,
};

/// Failures raised while locating today's reading.
#[derive(Debug, Error)]
pub enum LocateError {
    /// The window holds no rows.
    #[error("no reading found in {window}")]
    NotFound { window: DayWindow },
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Return the earliest reading in the local day containing `reference`.
///
/// The store error is returned unchanged; retrying is left to the caller.
pub fn find_earliest_today<S: ReadingStore + ?Sized>(
    store: &mut S,
    ctx: &RunContext,
    zone: Tz,
    reference: DateTime<Utc>,
) -> Result<Reading, LocateError> {
    let window = DayWindow::containing(reference, zone);
    debug!("looking up earliest reading in {window} ({zone})");
    match store.earliest_in_window(ctx, &window)? {
        Some(reading) => {
            info!("earliest reading today: {reading}");
            Ok(reading)
        }
        None => Err(LocateError::NotFound { window }),
    }
}
