//! The persisted token record and per-request context.

use chrono::{DateTime, Utc};
use sigil_core::ClientId;
use uuid::Uuid;

/// A server-side token record, one per active login session.
///
/// `client_id`, `client_ip` and `user_agent` are overwritten with the
/// current request's values on every authentication attempt; they
/// describe the most recent use of the token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthToken {
    /// 64-character opaque identifier, unique across the store.
    pub token: String,
    /// The authenticated principal.
    pub user_id: Uuid,
    /// Client application that performed the login.
    pub client_id: ClientId,
    /// Address the token was last used from.
    pub client_ip: String,
    /// User agent the token was last used with.
    pub user_agent: String,
    /// The token is invalid at and after this instant.
    pub expires_at: DateTime<Utc>,
}

/// Attributes of the request currently being authenticated.
///
/// Passed explicitly into issuance and verification; there is no
/// process-wide "current request" state.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    /// Parsed `X-Client` header, when the client sent one.
    pub client_id: Option<ClientId>,
    pub client_ip: String,
    pub user_agent: String,
}

impl RequestContext {
    pub fn new(client_id: Option<ClientId>, client_ip: impl Into<String>, user_agent: impl Into<String>) -> Self {
        Self {
            client_id,
            client_ip: client_ip.into(),
            user_agent: user_agent.into(),
        }
    }

    /// Overwrite the record's context fields with this request's values.
    /// A missing `X-Client` header keeps the stored client id.
    pub fn bind_to(&self, record: &mut AuthToken) {
        if let Some(client_id) = self.client_id {
            record.client_id = client_id;
        }
        record.client_ip = self.client_ip.clone();
        record.user_agent = self.user_agent.clone();
    }
}
