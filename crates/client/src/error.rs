//! Error taxonomy for the dynamic client.
//!
//! HTTP-level error statuses (4xx/5xx) are deliberately NOT represented
//! here: they flow through as a normal [`crate::ResponseEnvelope`] so the
//! call surface stays uniform for success and HTTP-level failure.

use openapi_dynamic_http::TransportError;
use thiserror::Error;

/// Main error type for the dynamic client.
#[derive(Debug, Error)]
pub enum Error {
    /// The spec reference could not be resolved or parsed (fatal, surfaced
    /// when a facade is first built from the factory).
    #[error("failed to load OpenAPI definition from '{location}': {message}")]
    SpecLoad { location: String, message: String },

    /// The loaded document is structurally malformed (fatal at operation
    /// index build time).
    #[error("invalid OpenAPI document: {0}")]
    Spec(String),

    /// Lookup of a non-existent operation id (per call).
    #[error("unknown operation '{0}'")]
    UnknownOperation(String),

    /// A required parameter was absent at call time (per call, raised
    /// before any network request is issued).
    #[error("missing required parameter '{name}' for operation '{operation}'")]
    MissingParameter { operation: String, name: String },

    /// A parameter value is incompatible with its declared location
    /// (e.g. a non-scalar path substitution).
    #[error("invalid parameter '{name}': {message}")]
    Validation { name: String, message: String },

    /// An operation id collides with a reserved facade surface name
    /// (fatal at facade construction).
    #[error("operation id '{0}' collides with a reserved client attribute")]
    NameCollision(String),

    /// Network-level failure, wrapping the transport's native error.
    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// Result type alias for dynamic client operations.
pub type Result<T> = std::result::Result<T, Error>;
