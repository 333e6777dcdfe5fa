use thiserror::Error;

use crate::context::Interrupted;

/// Terminal outcome of a failed delivery.
#[derive(Debug, Error)]
pub enum DeliveryError {
    /// No destination was configured. No request was sent.
    #[error("no destination URL provided")]
    MissingUrl,
    /// The HTTP client could not be set up.
    #[error("failed to initialise TLS: {0}")]
    Tls(#[from] native_tls::Error),
    /// No response was received on the final attempt.
    #[error("request failed after {attempts} attempt(s): {source}")]
    Transport {
        attempts: u32,
        #[source]
        source: Box<ureq::Transport>,
    },
    /// The endpoint answered with a non-2xx status.
    #[error(
        "non-2xx response: {status} {status_text}. Response body: {response_body}. \
         Request body: {request_body}"
    )]
    Rejected {
        status: u16,
        status_text: String,
        response_body: String,
        request_body: String,
        attempts: u32,
    },
    /// The attempt's worker thread stopped without reporting a result.
    #[error("delivery worker stopped during attempt {attempts}")]
    WorkerLost { attempts: u32 },
    /// The run was cancelled or ran out of time.
    #[error("delivery stopped after {attempts} attempt(s): {reason}")]
    Interrupted { attempts: u32, reason: Interrupted },
}

impl DeliveryError {
    /// Attempts made before the error was reported.
    pub fn attempts(&self) -> u32 {
        match self {
            Self::MissingUrl | Self::Tls(_) => 0,
            Self::Transport { attempts, .. }
            | Self::Rejected { attempts, .. }
            | Self::WorkerLost { attempts }
            | Self::Interrupted { attempts, .. } => *attempts,
        }
    }

    /// HTTP status of the final response, when one was received.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Rejected { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether the error stems from configuration rather than the network.
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::MissingUrl | Self::Tls(_))
    }
}
