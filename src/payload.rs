//! Wire payload accepted by the meter readings endpoint.
//!
//! The payload pins every reading to midnight of its local calendar day: the
//! endpoint tracks one value per day, so the time of day is dropped.

use chrono::NaiveTime;
use chrono_tz::Tz;
use serde::Serialize;
use thiserror::Error;

use crate::reading::Reading;

/// Local date-time layout used for the `date` field.
pub const DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Failures turning a reading into request bytes.
#[derive(Debug, Error)]
pub enum PayloadError {
    /// JSON has no representation for NaN or infinity.
    #[error("reading value {0} is not a finite number")]
    NonFinite(f64),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// JSON body posted to the endpoint.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MeterReading {
    /// Local midnight of the reading's day, without offset.
    pub date: String,
    /// Meter value, unchanged.
    pub reading: f64,
}

impl MeterReading {
    /// Build the payload for `reading`, normalising its timestamp to local
    /// midnight in `zone`.
    pub fn from_reading(reading: &Reading, zone: Tz) -> Self {
        let local_day = reading.timestamp.with_timezone(&zone).date_naive();
        Self {
            date: local_day.and_time(NaiveTime::MIN).format(DATE_FORMAT).to_string(),
            reading: reading.value,
        }
    }

    /// Compact JSON bytes sent as the request body.
    pub fn to_json_bytes(&self) -> Result<Vec<u8>, PayloadError> {
        self.ensure_finite()?;
        Ok(serde_json::to_vec(self)?)
    }

    /// Indented JSON printed in dry-run mode.
    pub fn to_pretty_json(&self) -> Result<String, PayloadError> {
        self.ensure_finite()?;
        Ok(serde_json::to_string_pretty(self)?)
    }

    fn ensure_finite(&self) -> Result<(), PayloadError> {
        if self.reading.is_finite() {
            Ok(())
        } else {
            Err(PayloadError::NonFinite(self.reading))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::{DateTime, Utc};
    use rstest::rstest;

    fn reading_at(rfc3339: &str, value: f64) -> Reading {
        let timestamp = DateTime::parse_from_rfc3339(rfc3339)
            .expect("valid timestamp")
            .with_timezone(&Utc);
        Reading::new("a1b2", timestamp, value)
    }

    #[rstest]
    #[case("2025-10-08T06:42:17+02:00", "2025-10-08T00:00:00")]
    #[case("2025-10-08T23:59:59+02:00", "2025-10-08T00:00:00")]
    // 22:30Z on the 7th is already the 8th in Amsterdam.
    #[case("2025-10-07T22:30:00Z", "2025-10-08T00:00:00")]
    #[case("2025-03-30T03:30:00+02:00", "2025-03-30T00:00:00")]
    fn date_is_local_midnight(#[case] timestamp: &str, #[case] expected: &str) {
        let reading = reading_at(timestamp, 1.0);
        let payload = MeterReading::from_reading(&reading, Tz::Europe__Amsterdam);
        assert_eq!(payload.date, expected);
    }

    #[test]
    fn reading_value_is_carried_unchanged() {
        let payload = MeterReading::from_reading(
            &reading_at("2025-10-08T06:42:17+02:00", 3578.847),
            Tz::Europe__Amsterdam,
        );
        assert_eq!(payload.reading, 3578.847);
    }

    #[test]
    fn compact_json_matches_wire_format() {
        let payload = MeterReading::from_reading(
            &reading_at("2025-10-08T06:42:17+02:00", 3578.847),
            Tz::Europe__Amsterdam,
        );
        let body = payload.to_json_bytes().expect("serialise");
        assert_eq!(body, br#"{"date":"2025-10-08T00:00:00","reading":3578.847}"#);
    }

    #[test]
    fn repeated_builds_are_byte_identical() {
        let reading = reading_at("2025-10-08T06:42:17+02:00", 3578.847);
        let first = MeterReading::from_reading(&reading, Tz::Europe__Amsterdam);
        let second = MeterReading::from_reading(&reading, Tz::Europe__Amsterdam);
        assert_eq!(
            first.to_json_bytes().expect("serialise"),
            second.to_json_bytes().expect("serialise")
        );
    }

    #[rstest]
    #[case(f64::NAN)]
    #[case(f64::INFINITY)]
    #[case(f64::NEG_INFINITY)]
    fn non_finite_readings_are_not_serialised(#[case] value: f64) {
        let payload = MeterReading::from_reading(
            &reading_at("2025-10-08T06:42:17+02:00", value),
            Tz::Europe__Amsterdam,
        );
        assert!(matches!(
            payload.to_json_bytes(),
            Err(PayloadError::NonFinite(_))
        ));
        assert!(matches!(
            payload.to_pretty_json(),
            Err(PayloadError::NonFinite(_))
        ));
    }

    #[test]
    fn pretty_json_uses_two_space_indent() {
        let payload = MeterReading {
            date: "2025-10-08T00:00:00".into(),
            reading: 12.5,
        };
        assert_eq!(
            payload.to_pretty_json().expect("serialise"),
            "{\n  \"date\": \"2025-10-08T00:00:00\",\n  \"reading\": 12.5\n}"
        );
    }
}
