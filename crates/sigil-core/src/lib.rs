use serde::{Deserialize, Serialize};

// Configuration types shared across all Sigil crates
pub mod config;

pub use config::{AppConfig, AuthConfig, ServerConfig, StoreConfig, load_config};

/// Identifies which client application performed the login.
///
/// Stored as a small integer alongside every token record and carried
/// by clients in the `X-Client` header on each request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClientId {
    /// The browser single-page app.
    Web,
    /// Native mobile clients.
    Mobile,
    /// Direct API consumers (scripts, integrations).
    Api,
}

impl ClientId {
    /// Wire/database representation.
    pub fn as_i16(self) -> i16 {
        match self {
            Self::Web => 1,
            Self::Mobile => 2,
            Self::Api => 3,
        }
    }

    /// Parse the stored integer form. Unknown values yield `None`.
    pub fn from_i16(value: i16) -> Option<Self> {
        match value {
            1 => Some(Self::Web),
            2 => Some(Self::Mobile),
            3 => Some(Self::Api),
            _ => None,
        }
    }

    /// Parse the `X-Client` header value.
    pub fn from_header(value: &str) -> Option<Self> {
        value.trim().parse::<i16>().ok().and_then(Self::from_i16)
    }
}

impl std::fmt::Display for ClientId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Web => write!(f, "web"),
            Self::Mobile => write!(f, "mobile"),
            Self::Api => write!(f, "api"),
        }
    }
}
