//! Client facades and the factory that builds them.
//!
//! [`OpenApiClient`] holds a definition reference and resolves it at most
//! once (load + index build), caching the result so the async and
//! blocking facades share one parsed document. A [`Facade`] owns its
//! transport client; dropping it releases the connection pool.
//!
//! All three invocation surfaces — [`AsyncClient::call`], indexed access
//! via [`Facade::get`] / `client["opId"]`, and the explicit
//! [`Facade::functions`] map — funnel through [`Operation::invoke`], so
//! binding and dispatch behave identically regardless of style.

use crate::bind::bind;
use crate::error::{Error, Result};
use crate::index::{OperationDescriptor, OperationIndex};
use crate::spec::{self, SpecDocument, SpecSource};
use crate::tools::{self, ToolDefinition};
use openapi_dynamic_http::config::{build_async_client, build_blocking_client};
use openapi_dynamic_http::dispatch::{dispatch, dispatch_blocking};
use openapi_dynamic_http::{ResponseEnvelope, TransportConfig};
use parking_lot::RwLock;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};
use url::Url;

/// Facade surface names an operation id may not shadow.
const RESERVED_NAMES: [&str; 6] = ["call", "get", "operations", "paths", "functions", "tools"];

/// Async facade over `reqwest::Client`.
pub type AsyncClient = Facade<reqwest::Client>;

/// Blocking facade over `reqwest::blocking::Client`. Must not be used
/// inside an async runtime.
pub type Client = Facade<reqwest::blocking::Client>;

#[derive(Debug)]
struct ResolvedApi {
    document: SpecDocument,
    index: OperationIndex,
}

/// Factory: a definition reference plus a load-once cache.
///
/// Construction performs no I/O; the definition is resolved the first
/// time a facade is requested and reused for every facade after that.
pub struct OpenApiClient {
    source: SpecSource,
    resolved: RwLock<Option<Arc<ResolvedApi>>>,
}

impl OpenApiClient {
    /// Create a factory from a definition reference: a URL or file path
    /// (`&str`, `String`, `PathBuf`), or an in-memory document
    /// (`serde_json::Value`).
    pub fn new(definition: impl Into<SpecSource>) -> Self {
        Self {
            source: definition.into(),
            resolved: RwLock::new(None),
        }
    }

    /// Build an async facade.
    ///
    /// # Errors
    ///
    /// [`Error::SpecLoad`] when the definition cannot be fetched or
    /// parsed, [`Error::Spec`] when it is structurally malformed or no
    /// base URL can be determined, [`Error::NameCollision`] when an
    /// operation id shadows a facade surface, and
    /// [`Error::Transport`] when the HTTP client rejects the config.
    pub async fn async_client(&self, config: TransportConfig) -> Result<AsyncClient> {
        let transport = build_async_client(&config)?;
        let api = self.resolve(&transport).await?;
        let base_url = api.document.resolve_base_url(config.base_url.as_deref())?;
        Facade::build(transport, api, base_url)
    }

    /// Build a blocking facade. Must not be called inside an async
    /// runtime (the blocking transport panics there).
    ///
    /// # Errors
    ///
    /// Same failure modes as [`OpenApiClient::async_client`].
    pub fn client(&self, config: TransportConfig) -> Result<Client> {
        let transport = build_blocking_client(&config)?;
        let api = self.resolve_blocking(&transport)?;
        let base_url = api.document.resolve_base_url(config.base_url.as_deref())?;
        Facade::build(transport, api, base_url)
    }

    async fn resolve(&self, client: &reqwest::Client) -> Result<Arc<ResolvedApi>> {
        if let Some(api) = self.resolved.read().as_ref() {
            return Ok(Arc::clone(api));
        }

        let document = spec::load(&self.source, client).await?;
        self.cache(document)
    }

    fn resolve_blocking(&self, client: &reqwest::blocking::Client) -> Result<Arc<ResolvedApi>> {
        if let Some(api) = self.resolved.read().as_ref() {
            return Ok(Arc::clone(api));
        }

        let document = spec::load_blocking(&self.source, client)?;
        self.cache(document)
    }

    fn cache(&self, document: SpecDocument) -> Result<Arc<ResolvedApi>> {
        let index = OperationIndex::build(&document)?;
        tracing::info!(
            operations = index.len(),
            title = document.title().unwrap_or("<untitled>"),
            "indexed OpenAPI operations"
        );

        let mut slot = self.resolved.write();
        // A concurrent resolver may have won the race; keep its result.
        if let Some(api) = slot.as_ref() {
            return Ok(Arc::clone(api));
        }
        let api = Arc::new(ResolvedApi { document, index });
        *slot = Some(Arc::clone(&api));
        Ok(api)
    }
}

/// One callable operation, bound to a transport and base URL.
///
/// Cloning is cheap: the descriptor is shared and `reqwest` clients are
/// handles over a shared pool.
#[derive(Debug, Clone)]
pub struct Operation<T> {
    descriptor: Arc<OperationDescriptor>,
    transport: T,
    base_url: Url,
}

impl<T> Operation<T> {
    /// The operation id.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.descriptor.id
    }

    /// The full descriptor.
    #[must_use]
    pub fn descriptor(&self) -> &OperationDescriptor {
        &self.descriptor
    }

    fn bound_request(&self, args: &Value) -> Result<openapi_dynamic_http::BoundRequest> {
        bind(&self.descriptor, &self.base_url, as_args(args)?)
    }
}

impl Operation<reqwest::Client> {
    /// Bind the arguments and issue the request.
    ///
    /// Non-2xx statuses are returned as a normal envelope; dropping the
    /// returned future aborts the in-flight request.
    ///
    /// # Errors
    ///
    /// Binding failures ([`Error::MissingParameter`],
    /// [`Error::Validation`]) are raised before any network traffic;
    /// network failures surface as [`Error::Transport`].
    pub async fn invoke(&self, args: Value) -> Result<ResponseEnvelope> {
        let request = self.bound_request(&args)?;
        Ok(dispatch(&self.transport, request).await?)
    }
}

impl Operation<reqwest::blocking::Client> {
    /// Bind the arguments and issue the request on the calling thread.
    ///
    /// # Errors
    ///
    /// Same failure modes as the async [`Operation::invoke`].
    pub fn invoke(&self, args: Value) -> Result<ResponseEnvelope> {
        let request = self.bound_request(&args)?;
        Ok(dispatch_blocking(&self.transport, request)?)
    }
}

/// A callable client generated from one resolved definition.
#[derive(Debug)]
pub struct Facade<T> {
    api: Arc<ResolvedApi>,
    functions: HashMap<String, Operation<T>>,
    tools: OnceLock<Vec<ToolDefinition>>,
}

impl<T: Clone> Facade<T> {
    fn build(transport: T, api: Arc<ResolvedApi>, base_url: Url) -> Result<Self> {
        let mut functions = HashMap::with_capacity(api.index.len());
        for descriptor in api.index.descriptors() {
            if RESERVED_NAMES.contains(&descriptor.id.as_str()) {
                return Err(Error::NameCollision(descriptor.id.clone()));
            }
            functions.insert(
                descriptor.id.clone(),
                Operation {
                    descriptor: Arc::clone(descriptor),
                    transport: transport.clone(),
                    base_url: base_url.clone(),
                },
            );
        }

        Ok(Self {
            api,
            functions,
            tools: OnceLock::new(),
        })
    }
}

impl<T> Facade<T> {
    /// Look up one bound operation by id.
    ///
    /// # Errors
    ///
    /// [`Error::UnknownOperation`] when the id is not in the definition.
    pub fn get(&self, operation_id: &str) -> Result<&Operation<T>> {
        self.functions
            .get(operation_id)
            .ok_or_else(|| Error::UnknownOperation(operation_id.to_string()))
    }

    /// The explicit operation-id → callable map.
    #[must_use]
    pub fn functions(&self) -> &HashMap<String, Operation<T>> {
        &self.functions
    }

    /// All operation ids, in document order.
    #[must_use]
    pub fn operations(&self) -> Vec<&str> {
        self.api.index.operation_ids()
    }

    /// All path templates carrying operations, in document order.
    #[must_use]
    pub fn paths(&self) -> &[String] {
        self.api.index.paths()
    }

    /// AI tool definitions, one per operation in document order.
    /// Derived lazily on first access.
    #[must_use]
    pub fn tools(&self) -> &[ToolDefinition] {
        self.tools
            .get_or_init(|| tools::build_tools(&self.api.index, &self.api.document))
    }

    /// The resolved document this facade was generated from.
    #[must_use]
    pub fn document(&self) -> &SpecDocument {
        &self.api.document
    }
}

impl AsyncClient {
    /// Generic invocation: look the operation up and invoke it.
    ///
    /// # Errors
    ///
    /// [`Error::UnknownOperation`] plus the failure modes of
    /// [`Operation::invoke`].
    pub async fn call(&self, operation_id: &str, args: Value) -> Result<ResponseEnvelope> {
        self.get(operation_id)?.invoke(args).await
    }
}

impl Client {
    /// Generic blocking invocation.
    ///
    /// # Errors
    ///
    /// [`Error::UnknownOperation`] plus the failure modes of
    /// [`Operation::invoke`].
    pub fn call(&self, operation_id: &str, args: Value) -> Result<ResponseEnvelope> {
        self.get(operation_id)?.invoke(args)
    }
}

impl<T> std::ops::Index<&str> for Facade<T> {
    type Output = Operation<T>;

    /// Indexed access sugar: `client["getPetById"]`.
    ///
    /// # Panics
    ///
    /// Panics when the operation id is unknown, like any Rust index.
    /// Use [`Facade::get`] for a fallible lookup.
    fn index(&self, operation_id: &str) -> &Self::Output {
        match self.functions.get(operation_id) {
            Some(operation) => operation,
            None => panic!("unknown operation '{operation_id}'"),
        }
    }
}

/// Interpret the argument value: an object maps directly, `null` means
/// no arguments.
fn as_args(args: &Value) -> Result<&Map<String, Value>> {
    static EMPTY: OnceLock<Map<String, Value>> = OnceLock::new();
    match args {
        Value::Object(map) => Ok(map),
        Value::Null => Ok(EMPTY.get_or_init(Map::new)),
        other => Err(Error::Validation {
            name: "arguments".to_string(),
            message: format!("arguments must be an object or null, got {other}"),
        }),
    }
}
