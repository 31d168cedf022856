//! # sigil-token
//!
//! Bearer credential handling for the Sigil auth service.
//!
//! This crate provides functionality for:
//! - Allocating collision-checked 64-character opaque tokens
//! - Deriving a keyed signature binding a token to its usage context
//! - Issuing credentials at login
//! - Verifying presented credentials once per request
//!
//! ## Credential Layout
//!
//! A bearer credential is a 128-character string carried in the
//! `Authorization` header:
//!
//! | Characters | Content | Purpose |
//! |------------|---------|---------|
//! | 0..64 | token | store lookup key, allocated uniquely at login |
//! | 64..128 | signature | HMAC-SHA256 over the record, hex-encoded |
//!
//! The signature is never persisted; the server recomputes it from the
//! stored record on every request and compares. The record's client id,
//! client IP and user agent are refreshed from the current request
//! before signing, so those fields always describe the most recent use
//! of the token, not the login that created it.

pub mod alloc;
pub mod error;
pub mod gate;
pub mod issue;
pub mod memory;
pub mod record;
pub mod sign;
pub mod store;

pub use alloc::{TOKEN_COLUMN, TOKEN_LENGTH, TOKEN_TABLE, allocate, random_token};
pub use error::TokenError;
pub use gate::{AuthSession, Gate};
pub use issue::{IssuedCredential, Issuer};
pub use memory::MemoryStore;
pub use record::{AuthToken, RequestContext};
pub use sign::{CREDENTIAL_LENGTH, SIGNATURE_LENGTH, Signer};
pub use store::{IdentifierStore, TokenStore};
