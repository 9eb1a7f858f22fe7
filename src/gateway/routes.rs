//! HTTP handlers for the routing gateway.
//!
//! `GET /health` reports liveness and route count, `GET /v1/models`
//! reformats the route table as an OpenAI-style catalog, `POST /reload`
//! rebuilds the table from a live fetch, and the message/completion paths
//! forward to the matched backend. Every failure becomes a structured
//! JSON error response; nothing here crashes the gateway process.

use std::sync::Arc;

use axum::body::{Body, Bytes};
use axum::extract::{OriginalUri, State};
use axum::http::{HeaderMap, Response, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::error::RouterError;

use super::forward;
use super::table::RouteTable;
use super::AppState;

/// Structured JSON error body, distinguishable by `type`.
fn error_response(status: StatusCode, kind: &str, message: String) -> Response<Body> {
    let body = json!({ "error": { "type": kind, "message": message } });
    (status, Json(body)).into_response()
}

/// `GET /health`: liveness plus current route count.
pub(super) async fn health(State(state): State<Arc<AppState>>) -> Json<Value> {
    let table = state.table.read().await;
    Json(json!({ "status": "ok", "modelCount": table.len() }))
}

/// `GET /v1/models`: the route table as a provider-agnostic catalog.
pub(super) async fn list_models(State(state): State<Arc<AppState>>) -> Json<Value> {
    let table = state.table.read().await;
    let data: Vec<Value> = table
        .iter()
        .map(|(id, target)| {
            json!({
                "id": id,
                "object": "model",
                "owned_by": target.provider,
            })
        })
        .collect();
    Json(json!({ "object": "list", "data": data }))
}

/// `POST /reload`: rebuild the route table from a live catalog fetch and
/// swap it wholesale. In-flight requests keep the table they resolved
/// against.
pub(super) async fn reload(State(state): State<Arc<AppState>>) -> Response<Body> {
    match state.catalog.fetch_all().await {
        Ok(snapshot) => {
            let fresh = RouteTable::build(&snapshot, &state.registry);
            let count = fresh.len();
            *state.table.write().await = fresh;
            info!(routes = count, "route table reloaded");
            Json(json!({ "status": "ok", "modelCount": count })).into_response()
        }
        Err(err) => {
            warn!(%err, "route table reload failed");
            error_response(
                StatusCode::BAD_GATEWAY,
                "reload_failed",
                err.to_string(),
            )
        }
    }
}

/// `POST` on message/completion paths: resolve, rewrite, forward, relay.
pub(super) async fn forward_request(
    State(state): State<Arc<AppState>>,
    OriginalUri(uri): OriginalUri,
    headers: HeaderMap,
    body: Bytes,
) -> Response<Body> {
    let mut payload: Value = match serde_json::from_slice(&body) {
        Ok(v) => v,
        Err(err) => {
            return error_response(
                StatusCode::BAD_REQUEST,
                "invalid_request",
                format!("malformed JSON body: {err}"),
            );
        }
    };

    let Some(model) = payload.get("model").and_then(Value::as_str).map(String::from) else {
        return error_response(
            StatusCode::BAD_REQUEST,
            "invalid_request",
            "request body has no model field".to_string(),
        );
    };

    let target = {
        let table = state.table.read().await;
        match table.resolve(&model, state.catalog.priority()) {
            Some(target) => target.clone(),
            None => {
                let err = RouterError::RouteNotFound {
                    model: model.clone(),
                };
                return error_response(StatusCode::NOT_FOUND, "model_not_found", err.to_string());
            }
        }
    };

    forward::rewrite_model(&mut payload, &target.native_model);
    info!(
        model = %model,
        provider = %target.provider,
        native = %target.native_model,
        path = %uri.path(),
        "forwarding request"
    );

    match forward::send_upstream(
        &state.client,
        &target,
        uri.path(),
        &headers,
        &payload,
        state.timeout,
    )
    .await
    {
        Ok(upstream) => {
            if upstream.status().is_client_error() || upstream.status().is_server_error() {
                warn!(
                    provider = %target.provider,
                    status = %upstream.status(),
                    "upstream returned error status"
                );
            }
            forward::relay(upstream)
        }
        Err(err) => {
            warn!(provider = %target.provider, %err, "upstream unavailable");
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "upstream_unavailable",
                err.to_string(),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::app;
    use super::*;
    use std::time::Duration;

    use axum::body::to_bytes;
    use axum::http::Request;
    use tokio::sync::RwLock;
    use tower::ServiceExt;

    use crate::catalog::{CacheSnapshot, ModelCatalog, ModelDescriptor};
    use crate::registry::{ProviderDescriptor, ProviderRegistry};

    fn provider(id: &str, key: &str, base: &str) -> ProviderDescriptor {
        ProviderDescriptor {
            id: id.to_string(),
            enabled: true,
            api_key: key.to_string(),
            anthropic_base_url: Some(base.to_string()),
            openai_base_url: None,
            default_model: None,
        }
    }

    fn model(id: &str, provider: &str) -> ModelDescriptor {
        let native = id.split_once(':').map(|(_, m)| m).unwrap_or(id);
        ModelDescriptor {
            id: id.to_string(),
            provider: provider.to_string(),
            native_model: native.to_string(),
            display_name: native.to_string(),
            context_length: 128_000,
            max_output_tokens: 8_192,
            capabilities: vec![],
        }
    }

    fn state(
        providers: Vec<ProviderDescriptor>,
        models: Vec<ModelDescriptor>,
        dir: &tempfile::TempDir,
    ) -> Arc<AppState> {
        let registry = ProviderRegistry::from_descriptors(providers);
        let catalog = ModelCatalog::with_cache_path(
            registry.clone(),
            24,
            dir.path().join("models.json"),
        );
        let snapshot = CacheSnapshot::new(models, vec![], vec![]);
        let table = RouteTable::build(&snapshot, &registry);
        Arc::new(AppState {
            registry,
            catalog,
            table: RwLock::new(table),
            client: reqwest::Client::new(),
            timeout: Duration::from_secs(5),
        })
    }

    async fn request(
        state: Arc<AppState>,
        method: &str,
        path: &str,
        body: &str,
    ) -> (StatusCode, Value) {
        let response = app(state)
            .oneshot(
                Request::builder()
                    .method(method)
                    .uri(path)
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, json)
    }

    #[tokio::test]
    async fn health_reports_route_count() {
        let dir = tempfile::tempdir().unwrap();
        let state = state(
            vec![provider("anthropic", "k", "https://api.example")],
            vec![model("anthropic:claude-x", "anthropic")],
            &dir,
        );
        let (status, body) = request(state, "GET", "/health", "").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["modelCount"], 1);
    }

    #[tokio::test]
    async fn malformed_json_is_rejected_as_invalid_request() {
        let dir = tempfile::tempdir().unwrap();
        let state = state(
            vec![provider("anthropic", "k", "https://api.example")],
            vec![model("anthropic:claude-x", "anthropic")],
            &dir,
        );
        let (status, body) = request(state, "POST", "/v1/messages", "{not json").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["type"], "invalid_request");
    }

    #[tokio::test]
    async fn missing_model_field_is_rejected_as_invalid_request() {
        let dir = tempfile::tempdir().unwrap();
        let state = state(
            vec![provider("anthropic", "k", "https://api.example")],
            vec![model("anthropic:claude-x", "anthropic")],
            &dir,
        );
        let (status, body) =
            request(state, "POST", "/v1/chat/completions", r#"{"max_tokens": 64}"#).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["type"], "invalid_request");
        assert!(body["error"]["message"]
            .as_str()
            .unwrap()
            .contains("model"));
    }

    #[tokio::test]
    async fn unresolved_model_is_a_not_found_naming_the_model() {
        let dir = tempfile::tempdir().unwrap();
        let state = state(
            vec![provider("anthropic", "k", "https://api.example")],
            vec![model("anthropic:claude-x", "anthropic")],
            &dir,
        );
        let (status, body) = request(
            state,
            "POST",
            "/v1/messages",
            r#"{"model": "nope:nothing"}"#,
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["type"], "model_not_found");
        assert!(body["error"]["message"]
            .as_str()
            .unwrap()
            .contains("nope:nothing"));
    }

    #[tokio::test]
    async fn unreachable_upstream_is_reported_with_reason() {
        let dir = tempfile::tempdir().unwrap();
        let state = state(
            vec![provider("anthropic", "k", "http://127.0.0.1:1")],
            vec![model("anthropic:claude-x", "anthropic")],
            &dir,
        );
        let (status, body) = request(
            state,
            "POST",
            "/v1/messages",
            r#"{"model": "anthropic:claude-x"}"#,
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"]["type"], "upstream_unavailable");
    }

    #[tokio::test]
    async fn failed_reload_is_a_bad_gateway() {
        let dir = tempfile::tempdir().unwrap();
        // A keyless provider makes the refetch fail in aggregate.
        let state = state(
            vec![provider("anthropic", "", "https://api.example")],
            vec![model("anthropic:claude-x", "anthropic")],
            &dir,
        );
        let (status, body) = request(state, "POST", "/reload", "").await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["error"]["type"], "reload_failed");
    }

    #[tokio::test]
    async fn listed_models_come_from_the_route_table() {
        let dir = tempfile::tempdir().unwrap();
        let state = state(
            vec![provider("anthropic", "k", "https://api.example")],
            vec![model("anthropic:claude-x", "anthropic")],
            &dir,
        );
        let (status, body) = request(state, "GET", "/v1/models", "").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"][0]["id"], "anthropic:claude-x");
        assert_eq!(body["data"][0]["owned_by"], "anthropic");
    }
}
