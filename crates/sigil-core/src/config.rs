use serde::{Deserialize, Serialize};
use std::{env, fs, path::PathBuf};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub store: StoreConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address, e.g. "0.0.0.0:8080"
    #[serde(default = "default_bind")]
    pub bind: String,
}

fn default_bind() -> String {
    "0.0.0.0:8080".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Server-held secret keying the credential signature.
    /// Prefer the env var `SIGIL_AUTH_SECRET` over putting this in a file.
    #[serde(default)]
    pub secret: String,

    /// Lifetime of an issued token, in hours.
    #[serde(default = "default_token_ttl_hours")]
    pub token_ttl_hours: i64,

    /// Email for the user bootstrapped into an empty database.
    #[serde(default = "default_bootstrap_email")]
    pub bootstrap_email: String,

    /// Password for the bootstrapped user. Prefer the env var
    /// `SIGIL_BOOTSTRAP_PASSWORD`.
    #[serde(default)]
    pub bootstrap_password: String,
}

fn default_token_ttl_hours() -> i64 {
    // 30 days
    720
}

fn default_bootstrap_email() -> String {
    "admin@localhost".to_string()
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            secret: String::new(),
            token_ttl_hours: default_token_ttl_hours(),
            bootstrap_email: default_bootstrap_email(),
            bootstrap_password: String::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Postgres connection string. Overridable via `SIGIL_DATABASE_URL`.
    #[serde(default = "default_database_url")]
    pub database_url: String,
}

fn default_database_url() -> String {
    "postgres://localhost/sigil".to_string()
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            database_url: default_database_url(),
        }
    }
}

/// Load configuration from the TOML file at `SIGIL_CONFIG` (default
/// `config.toml`), falling back to defaults when the file is absent.
/// Environment variables override file values for secrets.
pub fn load_config() -> anyhow::Result<AppConfig> {
    let path = config_path();
    let mut cfg: AppConfig = if path.exists() {
        let raw = fs::read_to_string(&path)?;
        toml::from_str(&raw)?
    } else {
        AppConfig::default()
    };

    if let Ok(secret) = env::var("SIGIL_AUTH_SECRET") {
        cfg.auth.secret = secret;
    }
    if let Ok(password) = env::var("SIGIL_BOOTSTRAP_PASSWORD") {
        cfg.auth.bootstrap_password = password;
    }
    if let Ok(url) = env::var("SIGIL_DATABASE_URL") {
        cfg.store.database_url = url;
    }

    if cfg.auth.secret.trim().is_empty() {
        anyhow::bail!(
            "auth secret is empty (set SIGIL_AUTH_SECRET or config.toml [auth].secret)"
        );
    }

    Ok(cfg)
}

fn config_path() -> PathBuf {
    if let Ok(p) = env::var("SIGIL_CONFIG") {
        return PathBuf::from(p);
    }
    PathBuf::from("config.toml")
}
