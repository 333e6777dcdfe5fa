//! Configuration structures consumed by [`DeliveryClient`](super::DeliveryClient).

use std::time::Duration;

/// Default number of attempts per delivery, including the first.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
/// Default timeout bounding a single attempt.
pub const DEFAULT_ATTEMPT_TIMEOUT: Duration = Duration::from_secs(10);
/// Default connection timeout applied when establishing HTTP connections.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
/// Default base delay for exponential backoff retries.
pub const DEFAULT_BACKOFF_BASE: Duration = Duration::from_millis(500);
/// Default maximum delay for exponential backoff retries.
pub const DEFAULT_BACKOFF_CAP: Duration = Duration::from_secs(10);
/// Header carrying the token under [`AuthScheme::Header`] by default.
pub const DEFAULT_AUTH_HEADER: &str = "AUTH-TOKEN";
/// Value of the `API-VERSION` header sent by default.
pub const DEFAULT_API_VERSION: &str = "1.0";

/// How the auth token is attached to requests.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AuthScheme {
    /// Raw token in a named header.
    Header(String),
    /// `Authorization: Bearer <token>`.
    Bearer,
}

impl Default for AuthScheme {
    fn default() -> Self {
        Self::Header(DEFAULT_AUTH_HEADER.into())
    }
}

/// Exponential backoff timings between attempts.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BackoffPolicy {
    pub base: Duration,
    pub cap: Duration,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            base: DEFAULT_BACKOFF_BASE,
            cap: DEFAULT_BACKOFF_CAP,
        }
    }
}

/// Bounds on a single delivery.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first. Zero is treated as one.
    pub max_attempts: u32,
    /// Timeout for each attempt.
    pub attempt_timeout: Duration,
    pub backoff: BackoffPolicy,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            attempt_timeout: DEFAULT_ATTEMPT_TIMEOUT,
            backoff: BackoffPolicy::default(),
        }
    }
}

/// Configuration object describing how to construct a
/// [`DeliveryClient`](super::DeliveryClient).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeliveryConfig {
    pub retry: RetryPolicy,
    /// Timeout for establishing connections.
    pub connect_timeout: Duration,
    pub auth: AuthScheme,
    /// `API-VERSION` header value; omitted when `None`.
    pub api_version: Option<String>,
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            retry: RetryPolicy::default(),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            auth: AuthScheme::default(),
            api_version: Some(DEFAULT_API_VERSION.into()),
        }
    }
}
