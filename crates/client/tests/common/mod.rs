//! Shared test server and definitions for the integration suites.
#![allow(dead_code)]

use axum::Router;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, Method, StatusCode, Uri};
use axum::routing::{any, get};
use serde_json::{Map, Value, json};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::net::TcpListener;
use tokio::sync::oneshot;

/// An echo server plus a counter of requests it actually received.
pub struct TestServer {
    pub base_url: String,
    hits: Arc<AtomicUsize>,
    shutdown: Option<oneshot::Sender<()>>,
}

impl TestServer {
    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}

async fn echo_handler(
    State(hits): State<Arc<AtomicUsize>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> axum::Json<Value> {
    hits.fetch_add(1, Ordering::SeqCst);
    let headers: Map<String, Value> = headers
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|v| (name.as_str().to_string(), Value::String(v.to_string())))
        })
        .collect();
    axum::Json(json!({
        "method": method.as_str(),
        "path": uri.path(),
        "query": uri.query().unwrap_or(""),
        "headers": headers,
        "body": String::from_utf8_lossy(&body),
    }))
}

async fn text_handler(State(hits): State<Arc<AtomicUsize>>) -> &'static str {
    hits.fetch_add(1, Ordering::SeqCst);
    "hello, plain text"
}

async fn not_found_handler(
    State(hits): State<Arc<AtomicUsize>>,
) -> (StatusCode, axum::Json<Value>) {
    hits.fetch_add(1, Ordering::SeqCst);
    (StatusCode::NOT_FOUND, axum::Json(json!({"error": "missing"})))
}

/// The served definition uses a relative server URL so the client has to
/// resolve it against the definition's own URL.
async fn spec_handler() -> axum::Json<Value> {
    axum::Json(petstore_definition("/"))
}

pub async fn spawn_server() -> TestServer {
    let hits = Arc::new(AtomicUsize::new(0));
    let app = Router::new()
        .route("/openapi.json", get(spec_handler))
        .route("/text", any(text_handler))
        .route("/status/404", any(not_found_handler))
        .route("/", any(echo_handler))
        .route("/{*path}", any(echo_handler))
        .with_state(Arc::clone(&hits));

    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local_addr");
    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
    let server = axum::serve(listener, app).with_graceful_shutdown(async move {
        let _ = shutdown_rx.await;
    });
    tokio::spawn(async move {
        let _ = server.await;
    });

    TestServer {
        base_url: format!("http://{addr}"),
        hits,
        shutdown: Some(shutdown_tx),
    }
}

/// A petstore-flavored definition pointing at `server_url`.
pub fn petstore_definition(server_url: &str) -> Value {
    json!({
        "openapi": "3.0.3",
        "info": {"title": "Petstore", "version": "1.0.0"},
        "servers": [{"url": server_url}],
        "paths": {
            "/pets/{petId}": {
                "get": {
                    "operationId": "getPetById",
                    "summary": "Find pet by ID",
                    "parameters": [
                        {"name": "petId", "in": "path", "required": true,
                         "schema": {"type": "integer", "format": "int64"}}
                    ]
                }
            },
            "/pets/findByStatus": {
                "get": {
                    "operationId": "findPetsByStatus",
                    "parameters": [
                        {"name": "status", "in": "query", "required": true,
                         "schema": {"type": "string", "enum": ["available", "sold"]}}
                    ]
                }
            },
            "/pets": {
                "get": {
                    "operationId": "listPets",
                    "parameters": [
                        {"name": "limit", "in": "query",
                         "schema": {"type": "integer"}}
                    ]
                },
                "post": {
                    "operationId": "createPet",
                    "requestBody": {
                        "required": true,
                        "content": {
                            "application/json": {
                                "schema": {"$ref": "#/components/schemas/Pet"}
                            }
                        }
                    }
                }
            },
            "/login": {
                "post": {
                    "operationId": "login",
                    "requestBody": {
                        "content": {
                            "application/x-www-form-urlencoded": {
                                "schema": {"type": "object"}
                            }
                        }
                    }
                }
            },
            "/profile": {
                "get": {
                    "operationId": "getProfile",
                    "parameters": [
                        {"name": "x-api-key", "in": "header",
                         "schema": {"type": "string"}},
                        {"name": "session", "in": "cookie",
                         "schema": {"type": "string"}}
                    ]
                }
            },
            "/text": {
                "get": {"operationId": "getText"}
            },
            "/status/404": {
                "get": {"operationId": "alwaysMissing"}
            }
        },
        "components": {
            "schemas": {
                "Pet": {
                    "type": "object",
                    "required": ["name"],
                    "properties": {
                        "name": {"type": "string"},
                        "tag": {"type": "string"}
                    }
                }
            }
        }
    })
}
