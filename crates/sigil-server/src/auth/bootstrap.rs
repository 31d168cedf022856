use crate::auth::directory::UserDirectory;
use argon2::{
    Argon2,
    password_hash::{PasswordHasher, SaltString, rand_core::OsRng},
};
use sigil_core::AppConfig;

/// On startup, if the directory is empty, create a default user.
///
/// Password source (highest precedence first):
/// - env `SIGIL_BOOTSTRAP_PASSWORD`
/// - `config.toml` `[auth].bootstrap_password`
pub async fn bootstrap_user(directory: &dyn UserDirectory, cfg: &AppConfig) -> anyhow::Result<()> {
    if directory.user_count().await? > 0 {
        return Ok(());
    }

    let password = cfg.auth.bootstrap_password.clone();
    if password.trim().is_empty() {
        anyhow::bail!(
            "bootstrap password is empty (set SIGIL_BOOTSTRAP_PASSWORD or config.toml [auth].bootstrap_password)"
        );
    }

    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!(e.to_string()))?
        .to_string();

    let id = directory
        .insert_user(&cfg.auth.bootstrap_email, &hash)
        .await?;

    tracing::warn!(
        email = %cfg.auth.bootstrap_email,
        user_id = %id,
        "bootstrapped default user (password taken from env/config)"
    );
    Ok(())
}
