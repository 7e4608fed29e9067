//! Error type for the transport layer.

use thiserror::Error;

/// Transport-level failure.
///
/// HTTP status codes are never an error at this layer: a 4xx/5xx response
/// still produces a [`crate::ResponseEnvelope`]. Only configuration
/// rejections and network-level failures (DNS, connect, timeout) end up
/// here.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The transport configuration was rejected by the HTTP client builder
    /// (e.g. an invalid proxy URL or header value).
    #[error("transport config error: {0}")]
    Config(String),

    /// Network-level failure from the underlying client, wrapped verbatim.
    #[error("transport error: {0}")]
    Request(#[from] reqwest::Error),
}

/// Result type alias for transport operations.
pub type Result<T> = std::result::Result<T, TransportError>;
