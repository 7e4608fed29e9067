//! Request dispatch: one bound request in, one envelope out.
//!
//! Exactly one HTTP request is issued per call; retries, backoff and
//! timeouts are the transport's concern (configured on the client).
//! Cancelling the async variant (dropping the future) aborts the in-flight
//! request via the underlying client.

use crate::envelope::{ResponseEnvelope, decode_body};
use crate::error::Result;
use crate::request::{BodyPayload, BoundRequest};
use reqwest::header::HeaderMap;
use std::collections::HashMap;

/// Issue a bound request on the async client.
///
/// # Errors
///
/// Returns [`crate::TransportError::Request`] on network-level failure
/// (DNS, connection refused, timeout). HTTP error statuses are returned
/// as a normal envelope.
pub async fn dispatch(client: &reqwest::Client, request: BoundRequest) -> Result<ResponseEnvelope> {
    let url = request.full_url();
    tracing::debug!(method = %request.method, url = %url, "dispatching request");

    let mut builder = client.request(request.method.clone(), url);
    for (name, value) in &request.headers {
        builder = builder.header(name, value);
    }
    builder = apply_body(builder, request.body.as_ref());

    let response = builder.send().await?;
    let status = response.status().as_u16();
    let headers = header_mapping(response.headers());
    let content_type = headers.get("content-type").cloned();
    let bytes = response.bytes().await?;

    Ok(ResponseEnvelope {
        data: decode_body(&bytes, content_type.as_deref()),
        status,
        headers,
        config: request,
    })
}

/// Issue a bound request on the blocking client.
///
/// # Errors
///
/// Same failure modes as [`dispatch`].
pub fn dispatch_blocking(
    client: &reqwest::blocking::Client,
    request: BoundRequest,
) -> Result<ResponseEnvelope> {
    let url = request.full_url();
    tracing::debug!(method = %request.method, url = %url, "dispatching request");

    let mut builder = client.request(request.method.clone(), url);
    for (name, value) in &request.headers {
        builder = builder.header(name, value);
    }
    builder = apply_blocking_body(builder, request.body.as_ref());

    let response = builder.send()?;
    let status = response.status().as_u16();
    let headers = header_mapping(response.headers());
    let content_type = headers.get("content-type").cloned();
    let bytes = response.bytes()?;

    Ok(ResponseEnvelope {
        data: decode_body(&bytes, content_type.as_deref()),
        status,
        headers,
        config: request,
    })
}

fn apply_body(
    builder: reqwest::RequestBuilder,
    body: Option<&BodyPayload>,
) -> reqwest::RequestBuilder {
    match body {
        Some(BodyPayload::Json(value)) => builder.json(value),
        Some(BodyPayload::Form(pairs)) => builder.form(pairs),
        Some(BodyPayload::Raw(text)) => builder.body(text.clone()),
        None => builder,
    }
}

fn apply_blocking_body(
    builder: reqwest::blocking::RequestBuilder,
    body: Option<&BodyPayload>,
) -> reqwest::blocking::RequestBuilder {
    match body {
        Some(BodyPayload::Json(value)) => builder.json(value),
        Some(BodyPayload::Form(pairs)) => builder.form(pairs),
        Some(BodyPayload::Raw(text)) => builder.body(text.clone()),
        None => builder,
    }
}

fn header_mapping(headers: &HeaderMap) -> HashMap<String, String> {
    headers
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|v| (name.as_str().to_string(), v.to_string()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::Router;
    use axum::body::Bytes;
    use axum::http::{HeaderMap as AxumHeaderMap, Method as AxumMethod, StatusCode, Uri};
    use axum::routing::any;
    use reqwest::Method;
    use serde_json::{Value, json};
    use tokio::net::TcpListener;
    use url::Url;

    async fn echo_handler(
        method: AxumMethod,
        uri: Uri,
        headers: AxumHeaderMap,
        body: Bytes,
    ) -> axum::Json<Value> {
        axum::Json(json!({
            "method": method.as_str(),
            "path": uri.path(),
            "query": uri.query().unwrap_or(""),
            "content_type": headers
                .get("content-type")
                .and_then(|v| v.to_str().ok()),
            "body": String::from_utf8_lossy(&body),
        }))
    }

    async fn not_found_handler() -> (StatusCode, axum::Json<Value>) {
        (StatusCode::NOT_FOUND, axum::Json(json!({"error": "missing"})))
    }

    async fn spawn_echo() -> (String, tokio::sync::oneshot::Sender<()>) {
        let app = Router::new()
            .route("/", any(echo_handler))
            .route("/status/404", any(not_found_handler))
            .route("/{*path}", any(echo_handler));
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("local_addr");
        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();
        let server = axum::serve(listener, app).with_graceful_shutdown(async move {
            let _ = shutdown_rx.await;
        });
        tokio::spawn(async move {
            let _ = server.await;
        });
        (format!("http://{addr}"), shutdown_tx)
    }

    fn bound(method: Method, url: &str) -> BoundRequest {
        BoundRequest {
            method,
            url: Url::parse(url).expect("url"),
            headers: Vec::new(),
            query: Vec::new(),
            body: None,
        }
    }

    #[tokio::test]
    async fn dispatch_builds_method_path_query_and_json_body() {
        let (base, shutdown) = spawn_echo().await;

        let mut request = bound(Method::POST, &format!("{base}/pets"));
        request.query = vec![("verbose".to_string(), "true".to_string())];
        request.headers = vec![("x-trace".to_string(), "t-1".to_string())];
        request.body = Some(BodyPayload::Json(json!({"name": "Fido"})));

        let client = reqwest::Client::new();
        let envelope = dispatch(&client, request.clone()).await.expect("dispatch");

        assert_eq!(envelope.status, 200);
        assert!(envelope.is_success());
        assert_eq!(envelope.data["method"], "POST");
        assert_eq!(envelope.data["path"], "/pets");
        assert_eq!(envelope.data["query"], "verbose=true");
        assert_eq!(envelope.data["content_type"], "application/json");
        assert_eq!(
            envelope.data["body"],
            serde_json::to_string(&json!({"name": "Fido"})).unwrap()
        );
        // Echoed config matches what went in.
        assert_eq!(envelope.config, request);

        let _ = shutdown.send(());
    }

    #[tokio::test]
    async fn non_2xx_returns_envelope_not_error() {
        let (base, shutdown) = spawn_echo().await;

        let request = bound(Method::GET, &format!("{base}/status/404"));
        let client = reqwest::Client::new();
        let envelope = dispatch(&client, request).await.expect("dispatch");

        assert_eq!(envelope.status, 404);
        assert!(!envelope.is_success());
        assert_eq!(envelope.data, json!({"error": "missing"}));

        let _ = shutdown.send(());
    }

    #[tokio::test]
    async fn connection_refused_is_a_transport_error() {
        // Port 1 is never listening.
        let request = bound(Method::GET, "http://127.0.0.1:1/");
        let client = reqwest::Client::new();
        let err = dispatch(&client, request).await.unwrap_err();
        assert!(matches!(err, crate::TransportError::Request(_)));
    }

    #[test]
    fn blocking_dispatch_round_trips() {
        let rt = tokio::runtime::Runtime::new().expect("runtime");
        let (base, shutdown) = rt.block_on(spawn_echo());

        let mut request = bound(Method::GET, &format!("{base}/pets/1"));
        request.query = vec![("tag".to_string(), "a b".to_string())];

        let client = reqwest::blocking::Client::new();
        let envelope = dispatch_blocking(&client, request).expect("dispatch");

        assert_eq!(envelope.status, 200);
        assert_eq!(envelope.data["path"], "/pets/1");
        assert_eq!(envelope.data["query"], "tag=a%20b");

        let _ = shutdown.send(());
    }
}
