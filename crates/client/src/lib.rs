//! Runtime-generated HTTP client driven by an OpenAPI specification.
//!
//! Given a spec — fetched by URL, read from a file, or supplied as an
//! already-parsed document — [`OpenApiClient`] builds a callable facade
//! exposing one bound operation per declared `operationId`, with no code
//! generation step:
//!
//! ```no_run
//! use openapi_dynamic_client::{OpenApiClient, TransportConfig};
//! use serde_json::json;
//!
//! # async fn run() -> openapi_dynamic_client::Result<()> {
//! let api = OpenApiClient::new("https://petstore3.swagger.io/api/v3/openapi.json");
//! let client = api.async_client(TransportConfig::default()).await?;
//!
//! let res = client.call("getPetById", json!({ "petId": 1 })).await?;
//! println!("{} -> {}", res.status, res.data);
//! # Ok(())
//! # }
//! ```
//!
//! Three equivalent invocation styles are exposed — generic
//! ([`AsyncClient::call`]), indexed (`client["getPetById"]` /
//! [`AsyncClient::get`]) and the explicit operation map
//! ([`AsyncClient::functions`]) — all funneling through one binding and
//! dispatch path. Non-2xx statuses are returned as a normal
//! [`ResponseEnvelope`], never as an error.

pub mod bind;
pub mod error;
pub mod facade;
pub mod index;
pub mod spec;
pub mod tools;

pub use error::{Error, Result};
pub use facade::{AsyncClient, Client, OpenApiClient, Operation};
pub use index::{OperationDescriptor, OperationIndex, ParamLocation, ParameterSpec, RequestBodySpec};
pub use spec::{SpecDocument, SpecSource};
pub use tools::ToolDefinition;

pub use openapi_dynamic_http::{
    BodyPayload, BoundRequest, ResponseEnvelope, TransportConfig, TransportError,
};
