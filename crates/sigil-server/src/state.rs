use crate::auth::directory::UserDirectory;
use chrono::Duration;
use sigil_core::AppConfig;
use sigil_token::{Gate, Issuer, Signer, TokenStore};
use std::sync::Arc;

/// Shared application state.
pub struct AppState {
    pub cfg: AppConfig,
    pub gate: Gate,
    pub issuer: Issuer,
    pub directory: Arc<dyn UserDirectory>,
}

impl AppState {
    pub fn new(
        cfg: AppConfig,
        store: Arc<dyn TokenStore>,
        directory: Arc<dyn UserDirectory>,
    ) -> Self {
        let signer = Signer::new(cfg.auth.secret.as_bytes().to_vec());
        let ttl = Duration::hours(cfg.auth.token_ttl_hours);
        Self {
            gate: Gate::new(store.clone(), signer.clone()),
            issuer: Issuer::new(store, signer, ttl),
            directory,
            cfg,
        }
    }
}
