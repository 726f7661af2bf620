/**
 * Authentication Routes
 * Sign in, sign up and sign out forwarded to the backend's auth service,
 * plus the extractor that resolves the caller's session.
 */
use axum::{
    extract::{FromRequestParts, State},
    http::{request::Parts, HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;

use super::{is_valid_email, AppState};
use crate::backend::AuthUser;

// ============================================================================
// Session extraction
// ============================================================================

/// An authenticated caller: the bearer token and the user it resolved to.
#[derive(Debug, Clone)]
pub struct Session {
    pub token: String,
    pub user: AuthUser,
}

/// The caller's session, or `None` for anonymous or rejected tokens.
#[derive(Debug, Clone)]
pub struct MaybeSession(pub Option<Session>);

/// Extract bearer token from Authorization header
pub fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

impl FromRequestParts<AppState> for MaybeSession {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Some(token) = extract_bearer_token(&parts.headers) else {
            return Ok(MaybeSession(None));
        };
        match state.backend.user_for_token(&token).await {
            Ok(user) => Ok(MaybeSession(Some(Session { token, user }))),
            Err(e) => {
                tracing::debug!(error = %e, "session token rejected");
                Ok(MaybeSession(None))
            }
        }
    }
}

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct SignInRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct SignInResponse {
    pub success: bool,
    pub user: Option<AuthUser>,
    pub access_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SignInResponse {
    fn failure(error: &str) -> Self {
        Self {
            success: false,
            user: None,
            access_token: None,
            expires_in: None,
            message: None,
            redirect: None,
            error: Some(error.to_string()),
        }
    }
}

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct SignUpRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct SignUpResponse {
    pub success: bool,
    pub user: Option<AuthUser>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SignUpResponse {
    fn failure(error: &str) -> Self {
        Self {
            success: false,
            user: None,
            message: None,
            error: Some(error.to_string()),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SignOutResponse {
    pub success: bool,
}

#[derive(Debug, Serialize)]
pub struct CurrentUserResponse {
    pub user: Option<AuthUser>,
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /api/auth/signin
pub async fn sign_in(
    State(state): State<AppState>,
    Json(payload): Json<SignInRequest>,
) -> impl IntoResponse {
    if payload.email.trim().is_empty() || payload.password.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(SignInResponse::failure("Email and password are required")),
        );
    }

    match state
        .backend
        .sign_in(payload.email.trim(), &payload.password)
        .await
    {
        Ok(session) => {
            tracing::info!(user_id = %session.user.id, "user signed in");
            (
                StatusCode::OK,
                Json(SignInResponse {
                    success: true,
                    user: Some(session.user),
                    access_token: Some(session.access_token),
                    expires_in: Some(session.expires_in),
                    message: Some("Login successful! Redirecting...".to_string()),
                    redirect: Some("profile"),
                    error: None,
                }),
            )
        }
        Err(e) => {
            tracing::warn!(error = %e, "sign in failed");
            (
                StatusCode::UNAUTHORIZED,
                Json(SignInResponse::failure("Invalid email or password")),
            )
        }
    }
}

/// POST /api/auth/signup
pub async fn sign_up(
    State(state): State<AppState>,
    Json(payload): Json<SignUpRequest>,
) -> impl IntoResponse {
    if payload.name.trim().is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(SignUpResponse::failure("Please enter your name")),
        );
    }

    if payload.email.trim().is_empty() || payload.password.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(SignUpResponse::failure("Email and password are required")),
        );
    }

    if !is_valid_email(&payload.email) {
        return (
            StatusCode::BAD_REQUEST,
            Json(SignUpResponse::failure("Invalid email format")),
        );
    }

    match state
        .backend
        .sign_up(
            payload.email.trim(),
            &payload.password,
            payload.name.trim(),
        )
        .await
    {
        Ok(user) => {
            tracing::info!(user_id = %user.id, "account created");
            (
                StatusCode::CREATED,
                Json(SignUpResponse {
                    success: true,
                    user: Some(user),
                    message: Some("Account created successfully! Please login.".to_string()),
                    error: None,
                }),
            )
        }
        Err(e) => {
            tracing::warn!(error = %e, "sign up failed");
            (
                StatusCode::BAD_REQUEST,
                Json(SignUpResponse::failure("Failed to create account")),
            )
        }
    }
}

/// POST /api/auth/signout
/// Always succeeds from the caller's point of view.
pub async fn sign_out(State(state): State<AppState>, headers: HeaderMap) -> impl IntoResponse {
    if let Some(token) = extract_bearer_token(&headers) {
        if let Err(e) = state.backend.sign_out(&token).await {
            tracing::warn!(error = %e, "backend sign out failed");
        }
    }
    (StatusCode::OK, Json(SignOutResponse { success: true }))
}

/// GET /api/auth/user
pub async fn current_user(MaybeSession(session): MaybeSession) -> impl IntoResponse {
    Json(CurrentUserResponse {
        user: session.map(|s| s.user),
    })
}
