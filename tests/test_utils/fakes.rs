//! In-memory stand-ins for the data store and the delivery client.
//!
//! `FakeStore` evaluates the window predicate the same way the SQL query
//! does, so locator and job tests exercise real window arithmetic without a
//! database.

#![allow(dead_code)]

use std::cell::RefCell;

use chrono::{DateTime, Utc};
use mindergas_rs::{
    Deliverer, DeliveryError, Reading, ReadingStore, RunContext, StoreError, timezone::DayWindow,
};

/// Parse an RFC 3339 timestamp into UTC.
pub fn utc(rfc3339: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(rfc3339)
        .expect("valid timestamp")
        .with_timezone(&Utc)
}

pub fn reading_at(id: &str, rfc3339: &str, value: f64) -> Reading {
    Reading::new(id, utc(rfc3339), value)
}

type FailureFn = fn() -> StoreError;

/// Store backed by a vector of rows.
#[derive(Default)]
pub struct FakeStore {
    rows: Vec<Reading>,
    failure: Option<FailureFn>,
    pub queried: Vec<DayWindow>,
    pub close_calls: usize,
}

impl FakeStore {
    pub fn with_rows(rows: Vec<Reading>) -> Self {
        Self {
            rows,
            ..Self::default()
        }
    }

    /// Store whose queries fail with the error built by `failure`.
    pub fn failing(failure: FailureFn) -> Self {
        Self {
            failure: Some(failure),
            ..Self::default()
        }
    }

    pub fn is_closed(&self) -> bool {
        self.close_calls > 0
    }
}

impl ReadingStore for FakeStore {
    fn earliest_in_window(
        &mut self,
        ctx: &RunContext,
        window: &DayWindow,
    ) -> Result<Option<Reading>, StoreError> {
        ctx.check()?;
        if self.is_closed() {
            return Err(StoreError::Closed);
        }
        self.queried.push(*window);
        if let Some(failure) = self.failure {
            return Err(failure());
        }
        Ok(self
            .rows
            .iter()
            .filter(|row| window.contains(&row.timestamp))
            .min_by_key(|row| row.timestamp)
            .cloned())
    }

    fn close(&mut self) {
        self.close_calls += 1;
    }
}

/// Arguments of one `deliver` call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeliveryCall {
    pub url: String,
    pub auth_token: String,
    pub body: String,
}

/// Deliverer that records calls and optionally rejects them.
#[derive(Default)]
pub struct RecordingDeliverer {
    pub calls: RefCell<Vec<DeliveryCall>>,
    reject_with: Option<u16>,
}

impl RecordingDeliverer {
    pub fn rejecting(status: u16) -> Self {
        Self {
            reject_with: Some(status),
            ..Self::default()
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.borrow().len()
    }
}

impl Deliverer for RecordingDeliverer {
    fn deliver(
        &self,
        _ctx: &RunContext,
        url: &str,
        auth_token: &str,
        body: &[u8],
    ) -> Result<(), DeliveryError> {
        let body = String::from_utf8_lossy(body).into_owned();
        self.calls.borrow_mut().push(DeliveryCall {
            url: url.to_owned(),
            auth_token: auth_token.to_owned(),
            body: body.clone(),
        });
        match self.reject_with {
            Some(status) => Err(DeliveryError::Rejected {
                status,
                status_text: "Rejected".into(),
                response_body: "nope".into(),
                request_body: body,
                attempts: 1,
            }),
            None => Ok(()),
        }
    }
}
