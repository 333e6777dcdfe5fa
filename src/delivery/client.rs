//! Blocking HTTP client posting payloads with bounded retries.
//!
//! The client keeps a ureq Agent for connection reuse across attempts. Each
//! attempt runs on a short-lived worker thread while the caller waits on the
//! run context, so cancelling the run abandons the outstanding request as
//! well as any pending backoff wait.

use std::{sync::Arc, thread};

use crossbeam_channel::bounded;
use log::{debug, info, warn};
use ureq::{Agent, AgentBuilder, ErrorKind};

use crate::context::RunContext;

use super::{
    backoff::BackoffState,
    config::{AuthScheme, DeliveryConfig},
    error::DeliveryError,
};

/// Classification of HTTP response for retry logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseClass {
    /// 2xx responses - request succeeded.
    Success,
    /// 5xx responses - retry with backoff.
    Retryable,
    /// Everything else - permanent failure, do not retry.
    Permanent,
}

/// Classifies an HTTP status code for retry logic.
///
/// # Classification rules
///
/// * **2xx** → [`ResponseClass::Success`] - request completed successfully
/// * **5xx** → [`ResponseClass::Retryable`] - server error, retry with backoff
/// * **Other** → [`ResponseClass::Permanent`] - client error (any 4xx), do not retry
pub fn classify_status(status: u16) -> ResponseClass {
    match status {
        200..=299 => ResponseClass::Success,
        500..=599 => ResponseClass::Retryable,
        _ => ResponseClass::Permanent,
    }
}

/// Transport failures that cannot succeed on a later attempt.
fn is_permanent_transport(kind: ErrorKind) -> bool {
    matches!(
        kind,
        ErrorKind::InvalidUrl | ErrorKind::UnknownScheme | ErrorKind::InvalidProxyUrl
    )
}

/// Capability to deliver a payload to an endpoint.
pub trait Deliverer {
    /// Post `body` to `url`, authenticating with `auth_token`.
    fn deliver(
        &self,
        ctx: &RunContext,
        url: &str,
        auth_token: &str,
        body: &[u8],
    ) -> Result<(), DeliveryError>;
}

/// Client posting JSON payloads to the meter readings endpoint.
pub struct DeliveryClient {
    config: DeliveryConfig,
    agent: Agent,
}

impl DeliveryClient {
    /// Construct the client from a configuration object.
    pub fn new(config: DeliveryConfig) -> Result<Self, DeliveryError> {
        let connector = native_tls::TlsConnector::new()?;
        let agent = AgentBuilder::new()
            .timeout_connect(config.connect_timeout)
            .tls_connector(Arc::new(connector))
            .build();
        Ok(Self { config, agent })
    }

    pub fn config(&self) -> &DeliveryConfig {
        &self.config
    }

    fn build_request(&self, ctx: &RunContext, url: &str, auth_token: &str) -> ureq::Request {
        let mut req = self
            .agent
            .post(url)
            .timeout(ctx.bound(self.config.retry.attempt_timeout));
        req = self.apply_auth(req, auth_token);
        if let Some(version) = &self.config.api_version {
            req = req.set("API-VERSION", version);
        }
        req.set("Content-Type", "application/json")
    }

    /// Send one request on a worker thread and wait for its result.
    ///
    /// Cancelling the run abandons the wait; the worker finishes on its own
    /// and its result is dropped.
    fn execute_request(
        &self,
        ctx: &RunContext,
        url: &str,
        auth_token: &str,
        body: &[u8],
        attempt: u32,
    ) -> Result<Result<Answer, ureq::Transport>, DeliveryError> {
        let req = self.build_request(ctx, url, auth_token);
        let body = body.to_vec();
        let (tx, rx) = bounded(1);
        thread::spawn(move || {
            let result = match req.send_bytes(&body) {
                Ok(response) | Err(ureq::Error::Status(_, response)) => {
                    Ok(Answer::read(response))
                }
                Err(ureq::Error::Transport(transport)) => Err(transport),
            };
            let _ = tx.send(result);
        });

        match ctx.recv(&rx) {
            Ok(Ok(result)) => Ok(result),
            Ok(Err(_)) => Err(DeliveryError::WorkerLost { attempts: attempt }),
            Err(reason) => {
                warn!("attempt {attempt} to {url} abandoned: {reason}");
                Err(DeliveryError::Interrupted {
                    attempts: attempt,
                    reason,
                })
            }
        }
    }

    fn apply_auth(&self, req: ureq::Request, auth_token: &str) -> ureq::Request {
        if auth_token.is_empty() {
            return req;
        }
        match &self.config.auth {
            AuthScheme::Header(name) => req.set(name, auth_token),
            AuthScheme::Bearer => req.set("Authorization", &format!("Bearer {auth_token}")),
        }
    }
}

/// Status line and body of a received response.
struct Answer {
    status: u16,
    status_text: String,
    body: String,
}

impl Answer {
    fn read(response: ureq::Response) -> Self {
        let status = response.status();
        let status_text = response.status_text().to_owned();
        let body = response
            .into_string()
            .unwrap_or_else(|err| format!("<unreadable response body: {err}>"));
        Self {
            status,
            status_text,
            body,
        }
    }

    fn into_rejection(self, request_body: &[u8], attempts: u32) -> DeliveryError {
        DeliveryError::Rejected {
            status: self.status,
            status_text: self.status_text,
            response_body: self.body,
            request_body: String::from_utf8_lossy(request_body).into_owned(),
            attempts,
        }
    }
}

impl Deliverer for DeliveryClient {
    fn deliver(
        &self,
        ctx: &RunContext,
        url: &str,
        auth_token: &str,
        body: &[u8],
    ) -> Result<(), DeliveryError> {
        if url.trim().is_empty() {
            return Err(DeliveryError::MissingUrl);
        }
        if auth_token.is_empty() {
            warn!("no auth token configured; posting to {url} without one");
        }

        let max_attempts = self.config.retry.max_attempts.max(1);
        let mut backoff = BackoffState::new(&self.config.retry);
        loop {
            ctx.check().map_err(|reason| DeliveryError::Interrupted {
                attempts: backoff.attempts(),
                reason,
            })?;
            let attempt = backoff.begin_attempt();
            debug!("POST {url} (attempt {attempt}/{max_attempts})");

            let failure = match self.execute_request(ctx, url, auth_token, body, attempt)? {
                Ok(answer) => match classify_status(answer.status) {
                    ResponseClass::Success => {
                        info!(
                            "{url} accepted payload with status {} after {attempt} attempt(s)",
                            answer.status
                        );
                        return Ok(());
                    }
                    ResponseClass::Permanent => {
                        let err = answer.into_rejection(body, attempt);
                        warn!("{url} rejected payload permanently: {err}");
                        return Err(err);
                    }
                    ResponseClass::Retryable => answer.into_rejection(body, attempt),
                },
                Err(transport) => {
                    let permanent = is_permanent_transport(transport.kind());
                    let err = DeliveryError::Transport {
                        attempts: attempt,
                        source: Box::new(transport),
                    };
                    if permanent {
                        return Err(err);
                    }
                    err
                }
            };

            let Some(delay) = backoff.next_delay() else {
                warn!("giving up on {url} after {attempt} attempt(s)");
                return Err(failure);
            };
            warn!("attempt {attempt} to {url} failed: {failure}; retrying in {delay:?}");
            ctx.sleep(delay)
                .map_err(|reason| DeliveryError::Interrupted {
                    attempts: attempt,
                    reason,
                })?;
        }
    }
}

impl<D: Deliverer + ?Sized> Deliverer for &D {
    fn deliver(
        &self,
        ctx: &RunContext,
        url: &str,
        auth_token: &str,
        body: &[u8],
    ) -> Result<(), DeliveryError> {
        (**self).deliver(ctx, url, auth_token, body)
    }
}

impl std::fmt::Debug for DeliveryClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeliveryClient")
            .field("config", &self.config)
            .finish()
    }
}
