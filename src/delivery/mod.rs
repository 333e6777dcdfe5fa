//! HTTP delivery of meter reading payloads.
//!
//! This module defines [`DeliveryClient`], which posts a JSON payload to the
//! meter readings endpoint. Each call makes a bounded number of attempts,
//! waiting with exponential backoff between them, and reports a detailed
//! error when the endpoint never accepts the payload.
//!
//! # Retry Semantics
//!
//! Responses are classified for retry decisions:
//!
//! - **2xx**: Success - stop immediately.
//! - **5xx**: Retryable - apply backoff and retry.
//! - **4xx**: Permanent failure - report without retrying.
//! - **Network errors**: Retryable - apply backoff and retry.

mod backoff;
mod client;
mod config;
mod error;

pub use backoff::BackoffState;
pub use client::{DeliveryClient, Deliverer, ResponseClass, classify_status};
pub use config::{
    AuthScheme, BackoffPolicy, DEFAULT_API_VERSION, DEFAULT_ATTEMPT_TIMEOUT,
    DEFAULT_AUTH_HEADER, DEFAULT_CONNECT_TIMEOUT, DEFAULT_MAX_ATTEMPTS, DeliveryConfig,
    RetryPolicy,
};
pub use error::DeliveryError;
