//! Transport layer for the dynamic OpenAPI client.
//!
//! This crate owns everything below the spec-binding layer:
//! - [`config::TransportConfig`]: pass-through HTTP client options
//! - [`request::BoundRequest`]: one fully bound outbound request
//! - [`envelope::ResponseEnvelope`]: the normalized response shape
//! - [`dispatch`]: issuing a bound request (async or blocking)
//!
//! It intentionally contains **no** OpenAPI knowledge: the binding layer
//! hands it a [`request::BoundRequest`] and gets back an envelope.

pub mod config;
pub mod dispatch;
pub mod envelope;
pub mod error;
pub mod request;

pub use config::TransportConfig;
pub use envelope::ResponseEnvelope;
pub use error::{Result, TransportError};
pub use request::{BodyPayload, BoundRequest};
