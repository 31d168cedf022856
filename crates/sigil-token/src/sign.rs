//! Keyed credential signatures.

use crate::alloc::TOKEN_LENGTH;
use crate::record::AuthToken;
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Length of the hex-encoded signature half of a credential.
pub const SIGNATURE_LENGTH: usize = 64;

/// Length of a full bearer credential (token + signature).
pub const CREDENTIAL_LENGTH: usize = TOKEN_LENGTH + SIGNATURE_LENGTH;

/// Derives the verifiable signature for a token record.
///
/// The signature is HMAC-SHA256 over a canonical encoding of the
/// record's identity fields, keyed by a server-held secret. It is
/// deterministic, so the gate recomputes and compares instead of
/// decrypting. Without the secret a matching signature for different
/// context fields cannot be forged.
#[derive(Clone)]
pub struct Signer {
    secret: Vec<u8>,
}

impl Signer {
    pub fn new(secret: impl Into<Vec<u8>>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    /// Sign a record. Same record and secret always yield the same
    /// 64-character hex signature.
    pub fn sign(&self, record: &AuthToken) -> String {
        let mut mac = HmacSha256::new_from_slice(&self.secret)
            .expect("HMAC accepts keys of any length");
        mac.update(&canonical(record));
        hex::encode(mac.finalize().into_bytes())
    }

    /// The full bearer credential: token followed by its signature.
    pub fn credential(&self, record: &AuthToken) -> String {
        let mut credential = String::with_capacity(CREDENTIAL_LENGTH);
        credential.push_str(&record.token);
        credential.push_str(&self.sign(record));
        credential
    }
}

impl std::fmt::Debug for Signer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // never print the secret
        f.debug_struct("Signer").finish_non_exhaustive()
    }
}

/// Canonical byte encoding of the signed fields.
///
/// Fields are terminated with a unit separator so adjacent free-form
/// strings (client_ip, user_agent) cannot be reassociated. Expiry is
/// encoded at second precision, which survives the round trip through
/// the store.
fn canonical(record: &AuthToken) -> Vec<u8> {
    let mut buf = Vec::with_capacity(256);
    let mut push = |field: &str| {
        buf.extend_from_slice(field.as_bytes());
        buf.push(0x1f);
    };
    push(&record.token);
    push(&record.user_id.to_string());
    push(&record.client_id.as_i16().to_string());
    push(&record.client_ip);
    push(&record.user_agent);
    push(&record.expires_at.timestamp().to_string());
    buf
}
