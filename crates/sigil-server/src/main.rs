use sigil_adapter_pg::PgTokenStore;
use sigil_server::{auth::bootstrap::bootstrap_user, router, state::AppState};
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();

    let cfg = sigil_core::load_config()?;

    let store = Arc::new(PgTokenStore::connect(&cfg.store.database_url).await?);
    store.migrate().await?;
    bootstrap_user(store.as_ref(), &cfg).await?;

    let bind = cfg.server.bind.clone();
    let state = Arc::new(AppState::new(cfg, store.clone(), store));
    let app = router(state);

    tracing::info!("sigil-server listening on {}", bind);
    let listener = tokio::net::TcpListener::bind(&bind).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
