//! # sigil-server
//!
//! HTTP wiring for the Sigil auth service: the login endpoint that
//! issues credentials and the middleware gate that verifies them.

pub mod auth;
pub mod handlers;
pub mod middleware;
pub mod state;

use axum::{
    Router,
    routing::{get, post},
};
use state::AppState;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Build the service router. Routes behind `require_auth` see the
/// request's [`sigil_token::AuthSession`] in their extensions.
pub fn router(state: Arc<AppState>) -> Router {
    let protected = Router::new().route("/me", get(handlers::me)).route_layer(
        axum::middleware::from_fn_with_state(state.clone(), middleware::auth::require_auth),
    );

    Router::new()
        .route("/healthz", get(handlers::healthz))
        .route("/login", post(handlers::login))
        .merge(protected)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
