//! Error types for the load simulator core.
//!
//! Transport errors never escape the request harness; they are folded into an
//! [`Outcome`](crate::harness::Outcome). The remaining errors cover run
//! configuration and are raised before any session starts.

use std::time::Duration;
use thiserror::Error;

/// Transport-layer errors for HTTP communication with the banking API.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Request did not complete within the per-call timeout
    #[error("Request timeout after {0:?}")]
    Timeout(Duration),

    /// Failed to establish a connection (refused, DNS, TLS handshake)
    #[error("Connection failed to {url}: {message}")]
    Connect { url: String, message: String },

    /// Base URL and path did not form a valid URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Any other failure while sending the request
    #[error("Request failed: {0}")]
    Request(String),

    /// The response arrived but its body could not be read
    #[error("Failed to read response body: {0}")]
    Body(String),
}

impl TransportError {
    /// Map a reqwest error into the transport taxonomy
    pub fn from_reqwest(error: reqwest::Error, timeout: Duration) -> Self {
        if error.is_timeout() {
            TransportError::Timeout(timeout)
        } else if error.is_connect() {
            TransportError::Connect {
                url: error
                    .url()
                    .map(|u| u.to_string())
                    .unwrap_or_else(|| "unknown".to_string()),
                message: error.to_string(),
            }
        } else if error.is_body() || error.is_decode() {
            TransportError::Body(error.to_string())
        } else if error.is_builder() {
            TransportError::InvalidUrl(error.to_string())
        } else {
            TransportError::Request(error.to_string())
        }
    }

    /// Check if this error came from the network rather than a bad request
    pub fn is_network(&self) -> bool {
        matches!(
            self,
            TransportError::Timeout(_) | TransportError::Connect { .. }
        )
    }
}

/// Load profile validation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProfileError {
    #[error("worker count must be greater than zero")]
    NoWorkers,

    #[error("iterations per worker must be greater than zero")]
    NoIterations,

    #[error("ramping profile needs at least one stage")]
    NoStages,

    #[error("pre-allocated pool size must be greater than zero")]
    EmptyPool,

    #[error("time unit must be greater than zero")]
    ZeroTimeUnit,

    #[error("a session owns one or two accounts, got {0}")]
    InvalidAccountCount(usize),

    #[error("amount range [{min}, {max}] is empty or negative")]
    InvalidAmountRange { min: String, max: String },
}

/// Errors while parsing a `target:duration` stage list.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StageParseError {
    #[error("stage '{0}' is not in 'target:duration' form")]
    MissingSeparator(String),

    #[error("invalid target rate '{0}'")]
    InvalidTarget(String),

    #[error("invalid duration '{0}' (expected e.g. 500ms, 10s, 1m, 1h)")]
    InvalidDuration(String),

    #[error("stage list is empty")]
    Empty,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_network_errors_are_classified() {
        assert!(TransportError::Timeout(Duration::from_secs(1)).is_network());
        assert!(TransportError::Connect {
            url: "http://localhost:8080".to_string(),
            message: "refused".to_string(),
        }
        .is_network());
        assert!(!TransportError::Body("eof".to_string()).is_network());
    }

    #[test]
    fn test_display_messages() {
        assert_eq!(
            StageParseError::InvalidTarget("x".to_string()).to_string(),
            "invalid target rate 'x'"
        );
        assert_eq!(
            ProfileError::EmptyPool.to_string(),
            "pre-allocated pool size must be greater than zero"
        );
    }
}
