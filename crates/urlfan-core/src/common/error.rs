//! Error types for the fan-out engine.
//!
//! This module defines the central [`Error`] enum shared by every layer of the
//! engine: the admission gate, the fetcher, the worker pool and the
//! coordinator. A batch either produces a full mapping or exactly one of these
//! values.
//!
//! ## Error Cases
//! - `Transport`: The outbound request could not be sent or connected.
//! - `Timeout`: The per-fetch timeout elapsed.
//! - `BadResponse`: The upstream answered with a status other than `200 OK`.
//! - `Body`: The response body could not be read.
//! - `Cancelled`: The batch scope was cancelled before the fetch completed.
//! - `InvalidRequest`: The batch failed validation.
//! - `TooManyRequests`: The admission gate is full.
//! - `ServiceShutdown`: The admission gate has been closed.
//! - `ChannelError`: An internal queue or sink rejected a write.
//! - `Worker`: A worker task terminated abnormally.

pub type Result<T> = core::result::Result<T, Error>;

/// Unified error type for the fan-out engine.
#[derive(Clone, thiserror::Error, Debug, PartialEq, Eq)]
pub enum Error {
    /// Connection or protocol failure while issuing the request.
    #[error("request to {url} failed: {reason}")]
    Transport { url: String, reason: String },

    /// The fetch did not complete within the per-fetch timeout.
    #[error("request to {url} timed out")]
    Timeout { url: String },

    /// Upstream answered with a non-success status.
    #[error("Bad HTTP Response from {url}: {status}")]
    BadResponse { url: String, status: u16 },

    /// The response arrived but its body could not be read.
    #[error("failed to read body from {url}: {reason}")]
    Body { url: String, reason: String },

    /// The batch scope was cancelled by the caller or by a sibling failure.
    #[error("Request cancelled")]
    Cancelled,

    /// The batch was malformed or exceeded bounds.
    #[error("{reason}")]
    InvalidRequest { reason: String },

    /// Every admission slot is taken.
    #[error("Server does not accept more than {capacity} requests")]
    TooManyRequests { capacity: usize },

    /// The gate was closed for shutdown.
    #[error("Service is shutting down")]
    ServiceShutdown,

    /// Internal channel send/receive failure.
    #[error("Channel error: {context}")]
    ChannelError { context: String },

    /// A worker task panicked.
    #[error("Worker error: {context}")]
    Worker { context: String },
}

impl Error {
    /// Classifies a `reqwest` failure for `url`.
    pub(crate) fn from_reqwest(url: &str, err: &reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout {
                url: url.to_string(),
            }
        } else if err.is_body() || err.is_decode() {
            Self::Body {
                url: url.to_string(),
                reason: err.to_string(),
            }
        } else {
            Self::Transport {
                url: url.to_string(),
                reason: err.to_string(),
            }
        }
    }
}
