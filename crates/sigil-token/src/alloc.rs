//! Collision-checked allocation of opaque token values.

use crate::error::TokenError;
use crate::store::IdentifierStore;
use rand::Rng;

/// Default identifier space for auth tokens.
pub const TOKEN_TABLE: &str = "auth_tokens";
pub const TOKEN_COLUMN: &str = "token";

/// Length of the opaque token half of a credential.
pub const TOKEN_LENGTH: usize = 64;

/// Characters tokens are drawn from.
const ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// A uniformly random string over [`ALPHABET`].
pub fn random_token(length: usize) -> String {
    let mut rng = rand::rng();
    (0..length)
        .map(|_| ALPHABET[rng.random_range(0..ALPHABET.len())] as char)
        .collect()
}

/// Allocate a token value not yet present in `table.column`.
///
/// Generates candidates and probes the store until one has no match.
/// The attempt bound is `alphabet_size * length`; in practice the first
/// candidate wins at 64 characters, the bound only prevents an endless
/// loop against a pathologically saturated namespace. The value is not
/// reserved: a concurrent allocation can still race at insert time,
/// which the store reports as [`TokenError::DuplicateToken`].
pub async fn allocate<S>(
    store: &S,
    table: &str,
    column: &str,
    length: usize,
) -> Result<String, TokenError>
where
    S: IdentifierStore + ?Sized,
{
    if length < 1 {
        return Err(TokenError::InvalidTokenLength(length));
    }

    let max_attempts = ALPHABET.len() * length;
    for _ in 0..max_attempts {
        let candidate = random_token(length);
        if !store.identifier_exists(table, column, &candidate).await? {
            return Ok(candidate);
        }
    }

    tracing::error!(table, column, max_attempts, "token namespace exhausted");
    Err(TokenError::AllocatorExhausted {
        attempts: max_attempts,
    })
}
