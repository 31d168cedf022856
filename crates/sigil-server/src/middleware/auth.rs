//! The authentication gate as axum middleware.

use crate::state::AppState;
use axum::{
    Json,
    extract::{Request, State},
    http::{HeaderMap, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde_json::json;
use sigil_core::ClientId;
use sigil_token::{RequestContext, TokenError};
use std::sync::Arc;

/// Verify the request's bearer credential before any handler runs.
/// On success the resolved [`sigil_token::AuthSession`] lands in the
/// request extensions; any rejection short-circuits with its kind.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Response {
    let authorization = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);
    let ctx = request_context(req.headers());

    match state.gate.authenticate(authorization.as_deref(), &ctx).await {
        Ok(session) => {
            req.extensions_mut().insert(session);
            next.run(req).await
        }
        Err(e) => reject(&e),
    }
}

/// Context attributes of the incoming request, read from headers the
/// way the clients send them: `X-Client` for the client id and
/// `X-Forwarded-For` (first hop) for the address.
pub fn request_context(headers: &HeaderMap) -> RequestContext {
    let client_id = headers
        .get("x-client")
        .and_then(|v| v.to_str().ok())
        .and_then(ClientId::from_header);
    let client_ip = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .unwrap_or_default()
        .to_string();
    let user_agent = headers
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();

    RequestContext::new(client_id, client_ip, user_agent)
}

/// Map a rejection to its response. The kind strings are a stable 1:1
/// surface for clients; the status stays 401 for every credential
/// problem and 500 for store faults outside of lookup.
fn reject(err: &TokenError) -> Response {
    let (status, kind) = match err {
        TokenError::MissingCredential => (StatusCode::UNAUTHORIZED, "auth_token_missing"),
        TokenError::InvalidCredentialLength { .. } => {
            (StatusCode::UNAUTHORIZED, "auth_token_invalid_length")
        }
        TokenError::LookupFailed(_) => (StatusCode::UNAUTHORIZED, "auth_token_not_found"),
        TokenError::InvalidSignature => (StatusCode::UNAUTHORIZED, "auth_token_invalid_signature"),
        TokenError::Expired { .. } => (StatusCode::UNAUTHORIZED, "auth_token_expired"),
        TokenError::InvalidTokenLength(_)
        | TokenError::AllocatorExhausted { .. }
        | TokenError::DuplicateToken
        | TokenError::Store(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal"),
    };

    if status.is_server_error() {
        tracing::error!(error = %err, "authentication failed on a store fault");
    } else {
        tracing::debug!(error = %err, kind, "rejected credential");
    }

    (status, Json(json!({ "error": kind }))).into_response()
}
