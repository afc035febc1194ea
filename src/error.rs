//! Error taxonomy for the provider and its collaborators.
//!
//! Only quota exhaustion and the inter-call cooldown are recovered from
//! (by routing to the local generator). Everything here reaches the caller.

use std::time::Duration;

use thiserror::Error;

/// Failure reported by a [`Transport`](crate::adapters::Transport).
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("service answered HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("failed reading response body: {0}")]
    Body(String),

    #[error("transport error: {0}")]
    Other(String),
}

/// Which endpoint produced an unparsable body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Quota,
    Integers,
}

impl std::fmt::Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Endpoint::Quota => f.write_str("quota"),
            Endpoint::Integers => f.write_str("integers"),
        }
    }
}

/// Everything the provider can fail with.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("provider not initialized: call ensure_ready() before requesting numbers")]
    NotInitialized,

    #[error("address resolution failed: {0}")]
    AddressResolution(String),

    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error(transparent)]
    Transport(TransportError),

    #[error("malformed {endpoint} response: {reason}")]
    Parse { endpoint: Endpoint, reason: String },

    #[error("empty range: min {min} is greater than max {max}")]
    InvalidRange { min: i64, max: i64 },
}

impl ProviderError {
    pub(crate) fn parse(endpoint: Endpoint, reason: impl Into<String>) -> Self {
        ProviderError::Parse {
            endpoint,
            reason: reason.into(),
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, ProviderError::Timeout(_))
    }

    /// Network-layer failures a caller might reasonably retry.
    pub fn is_retryable(&self) -> bool {
        match self {
            ProviderError::Timeout(_) => true,
            ProviderError::Transport(TransportError::Connect(_)) => true,
            ProviderError::Transport(TransportError::Status { status, .. }) => *status >= 500,
            _ => false,
        }
    }
}

impl From<TransportError> for ProviderError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::Timeout(after) => ProviderError::Timeout(after),
            other => ProviderError::Transport(other),
        }
    }
}

pub type Result<T> = std::result::Result<T, ProviderError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_maps_to_distinct_variant() {
        let err: ProviderError = TransportError::Timeout(Duration::from_secs(3)).into();
        assert!(err.is_timeout());
        assert!(err.is_retryable());
    }

    #[test]
    fn test_connect_stays_transport() {
        let err: ProviderError = TransportError::Connect("refused".into()).into();
        assert!(!err.is_timeout());
        assert!(matches!(err, ProviderError::Transport(TransportError::Connect(_))));
        assert!(err.is_retryable());
    }

    #[test]
    fn test_client_status_not_retryable() {
        let err: ProviderError = TransportError::Status {
            status: 403,
            body: "Error: quota exhausted".into(),
        }
        .into();
        assert!(!err.is_retryable());
        assert!(err.to_string().contains("403"));
    }

    #[test]
    fn test_parse_error_names_endpoint() {
        let err = ProviderError::parse(Endpoint::Quota, "not-a-number");
        assert_eq!(err.to_string(), "malformed quota response: not-a-number");
        assert!(!err.is_retryable());
    }
}
