//! Error types for credential issuance and verification.

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Errors surfaced by the token subsystem.
///
/// Every rejection kind is preserved to the boundary; the HTTP layer
/// decides how much detail to reveal.
#[derive(Debug, Error)]
pub enum TokenError {
    /// No Authorization header on the request.
    #[error("authorization header is missing")]
    MissingCredential,

    /// Presented credential is shorter than the token + signature pair.
    #[error("credential must be {expected} characters, got {got}")]
    InvalidCredentialLength { expected: usize, got: usize },

    /// Token not found, or the store failed during lookup.
    #[error("token lookup failed: {0}")]
    LookupFailed(String),

    /// Recomputed signature does not match the presented one.
    #[error("credential signature does not match")]
    InvalidSignature,

    /// The token's lifetime has passed.
    #[error("token expired at {expired_at}")]
    Expired { expired_at: DateTime<Utc> },

    /// Requested token length is below the minimum of one character.
    #[error("cannot allocate a token of {0} characters")]
    InvalidTokenLength(usize),

    /// The allocator could not find an unused value within its bound.
    #[error("no unique token found within {attempts} attempts")]
    AllocatorExhausted { attempts: usize },

    /// Insert raced with a concurrent allocation of the same value.
    /// Retryable at the issuance layer.
    #[error("token value already exists in the store")]
    DuplicateToken,

    /// Any other store failure outside of lookup.
    #[error("store error: {0}")]
    Store(String),
}
