use snafu::Snafu;

use o2ims_common::error::CoreError;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum TransportError {
    #[snafu(display("transport configuration error: {details}"))]
    Config { details: String },

    #[snafu(display("request failed: {source}"))]
    Request { source: reqwest::Error },

    #[snafu(display("token refresh failed: {details}"))]
    Auth { details: String },

    /// The retry budget was exhausted; wraps the last transport error
    /// (spec.md §4.1: "wrapped with 'max retries exceeded'").
    #[snafu(display("max retries exceeded: {source}"))]
    RetriesExceeded { source: Box<TransportError> },

    /// The driving context was cancelled mid-retry; returned unwrapped
    /// (spec.md §4.1).
    #[snafu(display("request cancelled"))]
    Cancelled,
}

impl From<reqwest::Error> for TransportError {
    fn from(source: reqwest::Error) -> Self {
        Self::Request { source }
    }
}

impl TransportError {
    /// 5xx responses and any transport-level error are retryable
    /// (spec.md §4.1).
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Request { source } => source
                .status()
                .map(|status| status.is_server_error())
                .unwrap_or(true),
            Self::Auth { .. } => true,
            _ => false,
        }
    }
}

impl From<TransportError> for CoreError {
    fn from(error: TransportError) -> Self {
        match error {
            TransportError::Config { details } => CoreError::config(details),
            TransportError::Auth { details } => CoreError::config(details),
            other => CoreError::transient(other.to_string()),
        }
    }
}
