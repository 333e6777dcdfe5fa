//! Day-window arithmetic in the fixed civil timezone.
//!
//! All "today" computations use a named IANA zone rather than the host's
//! local timezone. The window for an instant starts at local midnight of the
//! instant's calendar day and spans exactly 24 hours.

use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveTime, TimeDelta, TimeZone, Utc};
use chrono_tz::Tz;
use log::warn;

/// Zone used when the configuration does not name one.
pub const DEFAULT_TIMEZONE: &str = "Europe/Amsterdam";

/// Length of every query window.
pub const WINDOW_LENGTH: TimeDelta = TimeDelta::hours(24);

/// Resolve an IANA zone name, falling back to UTC when it is unknown.
pub fn resolve_zone(name: &str) -> Tz {
    match name.trim().parse::<Tz>() {
        Ok(zone) => zone,
        Err(err) => {
            warn!("unknown timezone {name:?} ({err}); falling back to UTC");
            Tz::UTC
        }
    }
}

/// First instant of `date` in `zone`.
///
/// Midnight normally exists exactly once. When a zone skips midnight the
/// first valid local time after it is used; when midnight repeats the
/// earlier instant wins.
pub fn local_midnight(date: NaiveDate, zone: Tz) -> DateTime<Tz> {
    let midnight = date.and_time(NaiveTime::MIN);
    (0..24)
        .find_map(|hour| {
            zone.from_local_datetime(&(midnight + TimeDelta::hours(hour)))
                .earliest()
        })
        .unwrap_or_else(|| zone.from_utc_datetime(&midnight))
}

/// Half-open interval `[start, start + 24h)` anchored at local midnight.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DayWindow {
    start: DateTime<Tz>,
    end: DateTime<Tz>,
}

impl DayWindow {
    /// Window covering the calendar day of `instant` in `zone`.
    pub fn containing(instant: DateTime<Utc>, zone: Tz) -> Self {
        let local_date = instant.with_timezone(&zone).date_naive();
        let start = local_midnight(local_date, zone);
        Self {
            start,
            end: start + WINDOW_LENGTH,
        }
    }

    /// Inclusive lower bound.
    pub fn start(&self) -> DateTime<Tz> {
        self.start
    }

    /// Exclusive upper bound.
    pub fn end(&self) -> DateTime<Tz> {
        self.end
    }

    pub fn start_utc(&self) -> DateTime<Utc> {
        self.start.with_timezone(&Utc)
    }

    pub fn end_utc(&self) -> DateTime<Utc> {
        self.end.with_timezone(&Utc)
    }

    pub fn contains<Z: TimeZone>(&self, instant: &DateTime<Z>) -> bool {
        *instant >= self.start && *instant < self.end
    }
}

impl fmt::Display for DayWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start.to_rfc3339(), self.end.to_rfc3339())
    }
}
