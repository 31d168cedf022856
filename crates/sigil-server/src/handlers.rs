use crate::middleware::auth::request_context;
use crate::state::AppState;
use argon2::{Argon2, PasswordHash, PasswordVerifier};
use axum::{
    Json,
    extract::{Request, State},
    http::{HeaderMap, StatusCode},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sigil_core::ClientId;
use sigil_token::AuthSession;
use std::sync::Arc;

pub async fn healthz() -> Json<serde_json::Value> {
    Json(json!({ "ok": true, "service": "sigil-server" }))
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    /// The full 128-character bearer credential. Returned once,
    /// never stored server-side.
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Verify email/password and issue a bearer credential.
pub async fn login(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, (StatusCode, Json<serde_json::Value>)> {
    let user = state
        .directory
        .find_by_email(&body.email)
        .await
        .map_err(internal)?
        .ok_or_else(invalid_credentials)?;

    let parsed_hash = PasswordHash::new(&user.password_hash).map_err(|e| internal(e.to_string()))?;
    if Argon2::default()
        .verify_password(body.password.as_bytes(), &parsed_hash)
        .is_err()
    {
        return Err(invalid_credentials());
    }

    let ctx = request_context(&headers);
    let client_id = ctx.client_id.unwrap_or(ClientId::Web);
    let issued = state
        .issuer
        .issue(user.id, client_id, &ctx)
        .await
        .map_err(internal)?;

    Ok(Json(LoginResponse {
        token: issued.credential,
        expires_at: issued.record.expires_at,
    }))
}

/// The authenticated caller's identity, from the session the gate
/// bound into the request.
pub async fn me(req: Request) -> Result<Json<serde_json::Value>, StatusCode> {
    let session = req
        .extensions()
        .get::<AuthSession>()
        .ok_or(StatusCode::UNAUTHORIZED)?;

    Ok(Json(json!({
        "user_id": session.user_id,
        "client": session.client_id,
        "expires_at": session.expires_at,
    })))
}

fn invalid_credentials() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({ "error": "invalid_credentials" })),
    )
}

fn internal(err: impl std::fmt::Display) -> (StatusCode, Json<serde_json::Value>) {
    tracing::error!(error = %err, "login failed");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": "internal" })),
    )
}
