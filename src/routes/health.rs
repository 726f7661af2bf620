/**
 * Health Routes
 * Liveness ping and backend readiness
 */
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Instant;

use super::AppState;

// Track server start time for uptime calculation
lazy_static::lazy_static! {
    static ref SERVER_START: Instant = Instant::now();
}

/// Initialize the server start time
pub fn init_start_time() {
    lazy_static::initialize(&SERVER_START);
}

/// Backend check result
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceCheck {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_time: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Ready check response
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadyResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub uptime: u64,
    pub backend: ServiceCheck,
}

/// Simple health response
#[derive(Debug, Serialize, Deserialize)]
pub struct SimpleHealthResponse {
    pub status: String,
}

/// GET /health - Simple health ping
pub async fn health_ping() -> impl IntoResponse {
    Json(SimpleHealthResponse {
        status: "ok".to_string(),
    })
}

/// GET /health/ready - 503 until the backend answers
pub async fn health_ready(State(state): State<AppState>) -> impl IntoResponse {
    let uptime = SERVER_START.elapsed().as_secs();

    let (code, status, backend) = match state.backend.ping().await {
        Ok(duration) => (
            StatusCode::OK,
            "ready",
            ServiceCheck {
                status: "healthy".to_string(),
                response_time: Some(duration.as_millis() as u64),
                error: None,
            },
        ),
        Err(e) => {
            tracing::warn!(error = %e, "backend readiness check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                "not ready",
                ServiceCheck {
                    status: "unhealthy".to_string(),
                    response_time: None,
                    error: Some(e.to_string()),
                },
            )
        }
    };

    (
        code,
        Json(ReadyResponse {
            status: status.to_string(),
            timestamp: Utc::now(),
            uptime,
            backend,
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{AuthSession, AuthUser, Backend, Query, Table};
    use crate::error::BackendError;
    use crate::routes::testing::{memory, state};
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::Request;
    use axum::routing::get;
    use axum::Router;
    use serde_json::Value;
    use std::sync::Arc;
    use std::time::Duration;
    use tower::ServiceExt;

    /// Backend that is never reachable.
    struct Unreachable;

    fn down() -> BackendError {
        BackendError::Status {
            status: 503,
            body: "unreachable".to_string(),
        }
    }

    #[async_trait]
    impl Backend for Unreachable {
        async fn select(&self, _: Table, _: &Query, _: Option<&str>) -> Result<Vec<Value>, BackendError> {
            Err(down())
        }
        async fn insert(&self, _: Table, _: Value, _: Option<&str>) -> Result<Value, BackendError> {
            Err(down())
        }
        async fn update(
            &self,
            _: Table,
            _: &str,
            _: Value,
            _: Option<&str>,
        ) -> Result<Value, BackendError> {
            Err(down())
        }
        async fn sign_in(&self, _: &str, _: &str) -> Result<AuthSession, BackendError> {
            Err(down())
        }
        async fn sign_up(&self, _: &str, _: &str, _: &str) -> Result<AuthUser, BackendError> {
            Err(down())
        }
        async fn sign_out(&self, _: &str) -> Result<(), BackendError> {
            Err(down())
        }
        async fn user_for_token(&self, _: &str) -> Result<AuthUser, BackendError> {
            Err(down())
        }
        async fn ping(&self) -> Result<Duration, BackendError> {
            Err(down())
        }
    }

    fn test_router(app_state: AppState) -> Router {
        Router::new()
            .route("/health", get(health_ping))
            .route("/health/ready", get(health_ready))
            .with_state(app_state)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(app: Router, uri: &str) -> (StatusCode, T) {
        let req = Request::get(uri).body(Body::empty()).unwrap();
        let res = app.oneshot(req).await.unwrap();
        let status = res.status();
        let body = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let value: T = serde_json::from_slice(&body).unwrap();
        (status, value)
    }

    #[tokio::test]
    async fn test_health_ping_returns_ok() {
        init_start_time();
        let (status, body) =
            get_json::<SimpleHealthResponse>(test_router(state(memory())), "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.status, "ok");
    }

    #[tokio::test]
    async fn test_health_ready_with_memory_backend() {
        init_start_time();
        let (status, body) =
            get_json::<ReadyResponse>(test_router(state(memory())), "/health/ready").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.status, "ready");
        assert_eq!(body.backend.status, "healthy");
    }

    #[tokio::test]
    async fn test_health_ready_reports_unreachable_backend() {
        let app = test_router(AppState::new(Arc::new(Unreachable)));
        let (status, body) = get_json::<ReadyResponse>(app, "/health/ready").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body.status, "not ready");
        assert!(body.backend.error.is_some());
    }
}
