//! Outbound request construction and streaming relay.
//!
//! The forwarded request keeps the caller's path and headers, minus
//! hop-by-hop framing and any inbound authentication, which is replaced
//! with the matched backend's credential in both bearer and API-key
//! forms. Upstream responses are relayed as a byte stream so server-sent
//! completions are never buffered.

use std::time::Duration;

use axum::body::Body;
use axum::http::{HeaderMap, Response, StatusCode};
use serde_json::Value;

use crate::error::RouterError;

use super::table::RouteTarget;

/// Headers never copied between the caller and the upstream, in either
/// direction: connection framing, addressing, and inbound credentials.
const STRIPPED_HEADERS: &[&str] = &[
    "host",
    "content-length",
    "authorization",
    "x-api-key",
    "connection",
    "keep-alive",
    "transfer-encoding",
    "te",
    "trailer",
    "upgrade",
    "proxy-authenticate",
    "proxy-authorization",
];

/// Whether a header passes through unchanged.
pub(super) fn passes_through(name: &str) -> bool {
    !STRIPPED_HEADERS.contains(&name.to_ascii_lowercase().as_str())
}

/// Rewrites the outbound body's model field to the backend-native name.
pub(super) fn rewrite_model(body: &mut Value, native_model: &str) {
    if let Some(obj) = body.as_object_mut() {
        obj.insert("model".to_string(), Value::String(native_model.to_string()));
    }
}

/// Sends the rewritten request to the matched backend.
///
/// Returns the upstream response untouched; HTTP error statuses are the
/// caller's to relay. Only a network-level failure (no response at all)
/// is an error here.
pub(super) async fn send_upstream(
    client: &reqwest::Client,
    target: &RouteTarget,
    path: &str,
    inbound_headers: &HeaderMap,
    body: &Value,
    timeout: Duration,
) -> Result<reqwest::Response, RouterError> {
    let url = format!("{}{}", target.base_url.trim_end_matches('/'), path);

    let mut request = client
        .post(&url)
        .timeout(timeout)
        .bearer_auth(&target.api_key)
        .header("x-api-key", &target.api_key)
        .json(body);

    for (name, value) in inbound_headers {
        // content-type is already set by the serialized JSON body.
        if passes_through(name.as_str()) && name.as_str() != "content-type" {
            request = request.header(name, value);
        }
    }

    request
        .send()
        .await
        .map_err(|err| RouterError::UpstreamUnavailable {
            reason: err.to_string(),
        })
}

/// Converts the upstream response into the caller's response: same status,
/// headers minus framing, body streamed through without buffering.
pub(super) fn relay(upstream: reqwest::Response) -> Response<Body> {
    let status =
        StatusCode::from_u16(upstream.status().as_u16()).unwrap_or(StatusCode::BAD_GATEWAY);

    let mut builder = Response::builder().status(status);
    for (name, value) in upstream.headers() {
        if passes_through(name.as_str()) {
            builder = builder.header(name.as_str(), value.as_bytes());
        }
    }

    let stream = futures::TryStreamExt::map_err(upstream.bytes_stream(), std::io::Error::other);
    builder
        .body(Body::from_stream(stream))
        .unwrap_or_else(|_| Response::new(Body::empty()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn auth_and_framing_headers_are_stripped() {
        for name in ["Authorization", "X-Api-Key", "Host", "Content-Length", "Connection"] {
            assert!(!passes_through(name), "{name} should be stripped");
        }
        for name in ["accept", "anthropic-version", "user-agent", "x-request-id"] {
            assert!(passes_through(name), "{name} should pass through");
        }
    }

    #[test]
    fn rewrite_replaces_model_field() {
        let mut body = json!({"model": "anthropic:claude-x", "max_tokens": 64});
        rewrite_model(&mut body, "claude-x");
        assert_eq!(body["model"], "claude-x");
        assert_eq!(body["max_tokens"], 64);
    }

    #[tokio::test]
    async fn upstream_receives_backend_credential_and_native_path() {
        let mut server = mockito::Server::new_async().await;
        let upstream = server
            .mock("POST", "/v1/messages")
            .match_header("authorization", "Bearer backend-key")
            .match_header("x-api-key", "backend-key")
            .with_status(200)
            .with_body(r#"{"ok":true}"#)
            .create_async()
            .await;

        let target = RouteTarget {
            provider: "anthropic".to_string(),
            native_model: "claude-x".to_string(),
            base_url: server.url(),
            api_key: "backend-key".to_string(),
        };

        let mut inbound = HeaderMap::new();
        inbound.insert("authorization", "Bearer caller-key".parse().unwrap());

        let response = send_upstream(
            &reqwest::Client::new(),
            &target,
            "/v1/messages",
            &inbound,
            &json!({"model": "claude-x"}),
            Duration::from_secs(5),
        )
        .await
        .unwrap();

        upstream.assert_async().await;
        assert_eq!(response.status().as_u16(), 200);
    }

    #[tokio::test]
    async fn unreachable_upstream_is_an_unavailable_error() {
        let target = RouteTarget {
            provider: "anthropic".to_string(),
            native_model: "claude-x".to_string(),
            base_url: "http://127.0.0.1:1".to_string(),
            api_key: "k".to_string(),
        };

        let err = send_upstream(
            &reqwest::Client::new(),
            &target,
            "/v1/messages",
            &HeaderMap::new(),
            &serde_json::json!({}),
            Duration::from_secs(5),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, RouterError::UpstreamUnavailable { .. }));
    }
}
