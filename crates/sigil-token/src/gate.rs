//! Per-request credential verification.

use crate::alloc::TOKEN_LENGTH;
use crate::error::TokenError;
use crate::record::RequestContext;
use crate::sign::{CREDENTIAL_LENGTH, Signer};
use crate::store::TokenStore;
use chrono::{DateTime, Utc};
use sigil_core::ClientId;
use std::sync::Arc;
use uuid::Uuid;

/// The identity bound to a request after a credential is accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthSession {
    pub user_id: Uuid,
    pub client_id: ClientId,
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Verifies bearer credentials once per request.
///
/// Runs the fixed sequence: extract, shape-check, lookup, context
/// bind, signature check, expiry check. Every rejection short-circuits
/// with its specific [`TokenError`] kind.
pub struct Gate {
    store: Arc<dyn TokenStore>,
    signer: Signer,
}

impl Gate {
    pub fn new(store: Arc<dyn TokenStore>, signer: Signer) -> Self {
        Self { store, signer }
    }

    /// Authenticate the `Authorization` header value against the
    /// current request context.
    pub async fn authenticate(
        &self,
        authorization: Option<&str>,
        ctx: &RequestContext,
    ) -> Result<AuthSession, TokenError> {
        self.authenticate_at(authorization, ctx, Utc::now()).await
    }

    /// [`Gate::authenticate`] against an explicit clock. Expiry is
    /// exclusive on the valid side: a token whose `expires_at` equals
    /// `now` is already rejected.
    pub async fn authenticate_at(
        &self,
        authorization: Option<&str>,
        ctx: &RequestContext,
        now: DateTime<Utc>,
    ) -> Result<AuthSession, TokenError> {
        let header = authorization
            .map(str::trim)
            .filter(|h| !h.is_empty())
            .ok_or(TokenError::MissingCredential)?;

        let credential = header.strip_prefix("Bearer ").unwrap_or(header);
        let (token, presented_sig) = split_credential(credential)?;

        let mut record = self.store.find_token(token).await?;

        // The stored context describes the most recent use, not the
        // login that created the token. Because the signature covers
        // these fields, rebinding them before the check means a
        // credential only verifies from a context matching the one it
        // was signed against.
        ctx.bind_to(&mut record);

        if self.signer.sign(&record) != presented_sig {
            return Err(TokenError::InvalidSignature);
        }

        if now >= record.expires_at {
            return Err(TokenError::Expired {
                expired_at: record.expires_at,
            });
        }

        // Informational write-back; authentication already succeeded,
        // so a failure here is logged rather than surfaced.
        if let Err(e) = self.store.update_context(&record).await {
            tracing::warn!(error = %e, "failed to persist refreshed token context");
        }

        Ok(AuthSession {
            user_id: record.user_id,
            client_id: record.client_id,
            token: record.token,
            expires_at: record.expires_at,
        })
    }
}

/// Split a credential into its token and signature halves,
/// rejecting anything shorter than the full 128 characters.
fn split_credential(credential: &str) -> Result<(&str, &str), TokenError> {
    if credential.len() < CREDENTIAL_LENGTH {
        return Err(TokenError::InvalidCredentialLength {
            expected: CREDENTIAL_LENGTH,
            got: credential.len(),
        });
    }
    match (
        credential.get(..TOKEN_LENGTH),
        credential.get(TOKEN_LENGTH..CREDENTIAL_LENGTH),
    ) {
        (Some(token), Some(sig)) => Ok((token, sig)),
        // multi-byte characters straddling the split point
        _ => Err(TokenError::InvalidCredentialLength {
            expected: CREDENTIAL_LENGTH,
            got: credential.len(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::issue::Issuer;
    use crate::memory::MemoryStore;
    use chrono::Duration;

    const SECRET: &str = "test-secret";

    fn ctx() -> RequestContext {
        RequestContext::new(Some(ClientId::Web), "198.51.100.1", "tests")
    }

    async fn issue_one(store: Arc<MemoryStore>) -> (Gate, crate::issue::IssuedCredential, Uuid) {
        let user_id = Uuid::new_v4();
        let issuer = Issuer::new(store.clone(), Signer::new(SECRET), Duration::hours(1));
        let issued = issuer.issue(user_id, ClientId::Web, &ctx()).await.unwrap();
        let gate = Gate::new(store, Signer::new(SECRET));
        (gate, issued, user_id)
    }

    #[tokio::test]
    async fn accepts_a_freshly_issued_credential() {
        let store = Arc::new(MemoryStore::new());
        let (gate, issued, user_id) = issue_one(store).await;

        let header = format!("Bearer {}", issued.credential);
        let session = gate.authenticate(Some(&header), &ctx()).await.unwrap();
        assert_eq!(session.user_id, user_id);
        assert_eq!(session.client_id, ClientId::Web);
        assert_eq!(session.token, issued.record.token);
    }

    #[tokio::test]
    async fn accepts_without_bearer_prefix() {
        let store = Arc::new(MemoryStore::new());
        let (gate, issued, _) = issue_one(store).await;

        let session = gate.authenticate(Some(&issued.credential), &ctx()).await;
        assert!(session.is_ok());
    }

    #[tokio::test]
    async fn rejects_missing_and_empty_headers() {
        let store = Arc::new(MemoryStore::new());
        let gate = Gate::new(store, Signer::new(SECRET));

        let err = gate.authenticate(None, &ctx()).await.unwrap_err();
        assert!(matches!(err, TokenError::MissingCredential));

        let err = gate.authenticate(Some(""), &ctx()).await.unwrap_err();
        assert!(matches!(err, TokenError::MissingCredential));
    }

    #[tokio::test]
    async fn rejects_a_127_character_credential() {
        let store = Arc::new(MemoryStore::new());
        let gate = Gate::new(store, Signer::new(SECRET));

        let short = "a".repeat(CREDENTIAL_LENGTH - 1);
        let err = gate.authenticate(Some(&short), &ctx()).await.unwrap_err();
        assert!(matches!(
            err,
            TokenError::InvalidCredentialLength { got: 127, .. }
        ));
    }

    #[tokio::test]
    async fn a_128_character_forgery_reaches_lookup() {
        let store = Arc::new(MemoryStore::new());
        let gate = Gate::new(store, Signer::new(SECRET));

        let forged = format!("{}{}", "A".repeat(64), "B".repeat(64));
        let err = gate.authenticate(Some(&forged), &ctx()).await.unwrap_err();
        assert!(matches!(err, TokenError::LookupFailed(_)));
    }

    #[tokio::test]
    async fn rejects_a_real_token_with_a_forged_signature() {
        let store = Arc::new(MemoryStore::new());
        let (gate, issued, _) = issue_one(store).await;

        let forged = format!("{}{}", issued.record.token, "0".repeat(64));
        let err = gate.authenticate(Some(&forged), &ctx()).await.unwrap_err();
        assert!(matches!(err, TokenError::InvalidSignature));
    }

    #[tokio::test]
    async fn any_single_flipped_signature_character_rejects() {
        let store = Arc::new(MemoryStore::new());
        let (gate, issued, _) = issue_one(store).await;

        for i in TOKEN_LENGTH..CREDENTIAL_LENGTH {
            let mut bytes = issued.credential.clone().into_bytes();
            bytes[i] = if bytes[i] == b'0' { b'1' } else { b'0' };
            let tampered = String::from_utf8(bytes).unwrap();

            let err = gate.authenticate(Some(&tampered), &ctx()).await.unwrap_err();
            assert!(matches!(err, TokenError::InvalidSignature), "position {i}");
        }
    }

    #[tokio::test]
    async fn expiry_boundary_is_exclusive_on_the_valid_side() {
        let store = Arc::new(MemoryStore::new());
        let (gate, issued, _) = issue_one(store.clone()).await;
        let header = issued.credential;

        // strictly before expiry: accepted
        let just_before = issued.record.expires_at - Duration::seconds(1);
        assert!(
            gate.authenticate_at(Some(&header), &ctx(), just_before)
                .await
                .is_ok()
        );

        // exactly at expiry: rejected
        let err = gate
            .authenticate_at(Some(&header), &ctx(), issued.record.expires_at)
            .await
            .unwrap_err();
        assert!(matches!(err, TokenError::Expired { .. }));

        // after expiry: rejected
        let err = gate
            .authenticate_at(
                Some(&header),
                &ctx(),
                issued.record.expires_at + Duration::seconds(1),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, TokenError::Expired { .. }));
    }

    #[tokio::test]
    async fn replay_from_a_different_context_is_rejected() {
        // The signature covers client_id/client_ip/user_agent, and the
        // gate recomputes it over the current request's values: a
        // captured credential presented from elsewhere cannot match.
        let store = Arc::new(MemoryStore::new());
        let (gate, issued, _) = issue_one(store.clone()).await;

        let elsewhere = RequestContext::new(Some(ClientId::Mobile), "192.0.2.99", "other-agent");
        let err = gate
            .authenticate(Some(&issued.credential), &elsewhere)
            .await
            .unwrap_err();
        assert!(matches!(err, TokenError::InvalidSignature));

        // rejected requests never touch the stored context
        let record = store.find_token(&issued.record.token).await.unwrap();
        assert_eq!(record.client_ip, ctx().client_ip);
        assert_eq!(record.user_agent, ctx().user_agent);
    }

    #[tokio::test]
    async fn successful_authentication_writes_the_context_back() {
        let store = Arc::new(MemoryStore::new());
        let (gate, issued, _) = issue_one(store.clone()).await;

        gate.authenticate(Some(&issued.credential), &ctx())
            .await
            .unwrap();

        let record = store.find_token(&issued.record.token).await.unwrap();
        assert_eq!(record.client_ip, ctx().client_ip);
        assert_eq!(record.user_agent, ctx().user_agent);
    }

    #[tokio::test]
    async fn missing_client_header_keeps_the_stored_client_id() {
        let store = Arc::new(MemoryStore::new());
        let (gate, issued, _) = issue_one(store).await;

        let no_client = RequestContext::new(None, ctx().client_ip, ctx().user_agent);
        let session = gate
            .authenticate(Some(&issued.credential), &no_client)
            .await
            .unwrap();
        assert_eq!(session.client_id, ClientId::Web);
    }
}
