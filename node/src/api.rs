//! HTTP API for the HEALCHAIN dev host

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use healchain_core::{CallerId, HealchainError};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::runtime::NodeRuntime;

/// API state containing node runtime
pub type ApiState = Arc<NodeRuntime>;

/// API response wrapper
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(error: impl ToString) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.to_string()),
        }
    }
}

/// Invocation request
#[derive(Debug, Deserialize)]
pub struct InvokeRequest {
    pub caller: String,
    pub function: String,
    #[serde(default)]
    pub args: Vec<String>,
}

/// Health response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub node: String,
    pub state_version: u64,
}

/// HTTP status for a failed operation
pub fn error_status(err: &HealchainError) -> StatusCode {
    match err {
        HealchainError::NotFound { .. } => StatusCode::NOT_FOUND,
        HealchainError::AlreadyExists { .. } => StatusCode::CONFLICT,
        HealchainError::InsufficientFunds { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        HealchainError::InvalidArgument(_)
        | HealchainError::InvalidKey(_)
        | HealchainError::UnknownFunction(_) => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Create API router
pub fn create_router(state: ApiState) -> Router {
    let enable_cors = state.config().api.enable_cors;

    let router = Router::new()
        .route("/health", get(health))
        .route("/invoke", post(invoke))
        .route("/history/:key", get(history))
        .with_state(state)
        .layer(TraceLayer::new_for_http());

    if enable_cors {
        router.layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
    } else {
        router
    }
}

async fn health(State(runtime): State<ApiState>) -> impl IntoResponse {
    Json(ApiResponse::ok(HealthResponse {
        status: "ok",
        node: runtime.config().name.clone(),
        state_version: runtime.state_version().await.0,
    }))
}

async fn invoke(
    State(runtime): State<ApiState>,
    Json(req): Json<InvokeRequest>,
) -> impl IntoResponse {
    let caller = CallerId::new(req.caller);
    match runtime.invoke(&caller, &req.function, &req.args).await {
        Ok(bytes) => {
            let data = if bytes.is_empty() {
                serde_json::Value::Null
            } else {
                match serde_json::from_slice(&bytes) {
                    Ok(value) => value,
                    Err(e) => {
                        error!(function = %req.function, error = %e, "Result is not JSON");
                        return (
                            StatusCode::INTERNAL_SERVER_ERROR,
                            Json(ApiResponse::<serde_json::Value>::err(e)),
                        );
                    }
                }
            };
            (StatusCode::OK, Json(ApiResponse::ok(data)))
        }
        Err(e) => (error_status(&e), Json(ApiResponse::err(e))),
    }
}

async fn history(State(runtime): State<ApiState>, Path(key): Path<String>) -> impl IntoResponse {
    match runtime.history(&key).await {
        Ok(entries) => (StatusCode::OK, Json(ApiResponse::ok(entries))),
        Err(e) => (error_status(&e), Json(ApiResponse::err(e))),
    }
}

/// Start API server
pub async fn start_api_server(runtime: ApiState, listen_addr: &str) -> anyhow::Result<()> {
    let router = create_router(runtime);

    let listener = tokio::net::TcpListener::bind(listen_addr).await?;
    info!(addr = listen_addr, "API server listening");

    axum::serve(listener, router).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use healchain_core::{NodeConfig, StorageBackend, StorageConfig};
    use healchain_fund::GenesisConfig;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    async fn test_router() -> Router {
        let config = NodeConfig {
            storage: StorageConfig {
                backend: StorageBackend::Memory,
                ..StorageConfig::default()
            },
            ..NodeConfig::default()
        };
        let runtime = NodeRuntime::open(config).unwrap();
        runtime
            .initialize_genesis(GenesisConfig::devnet())
            .await
            .unwrap();
        create_router(Arc::new(runtime))
    }

    async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    fn invoke_request(body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/invoke")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let router = test_router().await;
        let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
        let (status, body) = send(&router, request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["status"], "ok");
    }

    #[tokio::test]
    async fn test_invoke_donation() {
        let router = test_router().await;
        let (status, body) = send(
            &router,
            invoke_request(json!({
                "caller": "donor-1",
                "function": "Donate",
                "args": ["donor-1", "project-1", "100"]
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["amount"], 100);
        assert_eq!(body["data"]["type"], "donation");

        let request = Request::builder()
            .uri("/history/donor-1")
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(&router, request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"].as_array().map(Vec::len), Some(2));
    }

    #[tokio::test]
    async fn test_error_statuses() {
        let router = test_router().await;

        let (status, body) = send(
            &router,
            invoke_request(json!({
                "caller": "donor-1",
                "function": "Donate",
                "args": ["donor-1", "project-1", "100000"]
            })),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["success"], false);
        assert!(body["error"].as_str().unwrap().contains("Insufficient"));

        let (status, _) = send(
            &router,
            invoke_request(json!({
                "caller": "x",
                "function": "GetUserInfo",
                "args": ["nobody"]
            })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = send(
            &router,
            invoke_request(json!({"caller": "x", "function": "Steal"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
