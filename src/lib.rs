//! Relay for today's first gas meter reading.
//!
//! A run reads the earliest reading of the current local day from
//! PostgreSQL, pins it to local midnight and posts it as JSON to the
//! MinderGas meter readings endpoint, retrying transient failures a bounded
//! number of times.

pub mod context;
pub mod delivery;
pub mod job;
pub mod locator;
pub mod logging;
pub mod payload;
pub mod reading;
pub mod settings;
pub mod store;
pub mod timezone;

pub use context::{CancelHandle, Interrupted, RunContext};
pub use delivery::{
    AuthScheme, BackoffPolicy, Deliverer, DeliveryClient, DeliveryConfig, DeliveryError,
    RetryPolicy,
};
pub use job::{Job, Mode, Outcome, RunError};
pub use locator::{LocateError, find_earliest_today};
pub use payload::{MeterReading, PayloadError};
pub use reading::Reading;
pub use settings::{ConfigError, Settings};
pub use store::{PgReadingStore, ReadingStore, StoreError};
pub use timezone::DayWindow;
