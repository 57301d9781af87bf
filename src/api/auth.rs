use axum::{
    Json,
    extract::{Request, State},
    http::{HeaderMap, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::{ApiError, AppState};
use crate::services::AuthUser;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub message: String,
    pub token: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub message: String,
    pub token: String,
    pub user: AuthUser,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

// ============================================================================
// Middleware
// ============================================================================

/// Accepts a token from `Authorization: Bearer <token>` or the `token`
/// cookie, in that order.
fn extract_token(headers: &HeaderMap) -> Option<String> {
    if let Some(auth_header) = headers.get(header::AUTHORIZATION)
        && let Ok(auth_str) = auth_header.to_str()
        && let Some(token) = auth_str.strip_prefix("Bearer ")
    {
        return Some(token.trim().to_string());
    }

    let cookies = headers.get(header::COOKIE)?.to_str().ok()?;
    cookies
        .split(';')
        .map(str::trim)
        .find_map(|c| c.strip_prefix("token=").map(ToString::to_string))
}

/// Rejects the request unless a valid token names a user that still exists.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let Some(token) = extract_token(request.headers()) else {
        return Err(ApiError::Unauthorized(
            "Authentication required".to_string(),
        ));
    };

    let user = state.auth().verify_token(&token).await?;
    request.extensions_mut().insert(user);

    Ok(next.run(request).await)
}

/// Request context for routes that work with or without a logged-in user.
#[derive(Debug, Clone)]
pub struct MaybeUser(pub Option<AuthUser>);

/// Attaches the user when the token checks out; otherwise the request
/// proceeds anonymously.
pub async fn optional_auth(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Response {
    let mut user = None;

    if let Some(token) = extract_token(request.headers())
        && let Ok(verified) = state.auth().verify_token(&token).await
    {
        user = Some(verified);
    }

    request.extensions_mut().insert(MaybeUser(user));
    next.run(request).await
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /auth/register
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let (_user, token) = state
        .auth()
        .register(&payload.name, &payload.email, &payload.password)
        .await?;

    let cookie = session_cookie(&state, &token);

    Ok((
        StatusCode::CREATED,
        [(header::SET_COOKIE, cookie)],
        Json(RegisterResponse {
            message: "User registered successfully".to_string(),
            token,
        }),
    ))
}

/// POST /auth/login
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let (user, token) = state
        .auth()
        .login(&payload.email, &payload.password)
        .await?;

    let cookie = session_cookie(&state, &token);

    Ok((
        [(header::SET_COOKIE, cookie)],
        Json(LoginResponse {
            message: "Login successful".to_string(),
            token,
            user,
        }),
    ))
}

/// GET /auth/profile (requires authentication)
pub async fn profile(user: axum::Extension<AuthUser>) -> Json<AuthUser> {
    Json(user.0)
}

/// POST /auth/logout
pub async fn logout(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    (
        [(header::SET_COOKIE, clear_cookie(&state))],
        Json(MessageResponse {
            message: "Logged out successfully".to_string(),
        }),
    )
}

// ============================================================================
// Helpers
// ============================================================================

fn cookie_attributes(state: &AppState, max_age: i64) -> String {
    let secure = if state.config().server.secure_cookies {
        "; Secure"
    } else {
        ""
    };
    format!("HttpOnly; Path=/; Max-Age={max_age}; SameSite=Lax{secure}")
}

fn session_cookie(state: &AppState, token: &str) -> String {
    format!(
        "token={token}; {}",
        cookie_attributes(state, state.auth().token_max_age())
    )
}

fn clear_cookie(state: &AppState) -> String {
    format!("token=; {}", cookie_attributes(state, 0))
}
