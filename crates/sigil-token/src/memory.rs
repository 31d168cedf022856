//! In-memory token store, used in tests and single-process setups.

use crate::error::TokenError;
use crate::record::AuthToken;
use crate::store::{IdentifierStore, TokenStore};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use tokio::sync::RwLock;

/// A [`TokenStore`] over process memory.
///
/// Holds a single identifier namespace; the table/column arguments of
/// the probe are accepted and ignored.
#[derive(Default)]
pub struct MemoryStore {
    records: RwLock<HashMap<String, AuthToken>>,
    seeded: RwLock<HashSet<String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a bare identifier as taken without a full record. Lets
    /// tests saturate the namespace the allocator probes.
    pub async fn seed_identifier(&self, value: &str) {
        self.seeded.write().await.insert(value.to_string());
    }
}

#[async_trait]
impl IdentifierStore for MemoryStore {
    async fn identifier_exists(
        &self,
        _table: &str,
        _column: &str,
        value: &str,
    ) -> Result<bool, TokenError> {
        if self.records.read().await.contains_key(value) {
            return Ok(true);
        }
        Ok(self.seeded.read().await.contains(value))
    }
}

#[async_trait]
impl TokenStore for MemoryStore {
    async fn find_token(&self, token: &str) -> Result<AuthToken, TokenError> {
        self.records
            .read()
            .await
            .get(token)
            .cloned()
            .ok_or_else(|| TokenError::LookupFailed("token not found".to_string()))
    }

    async fn insert_token(&self, record: &AuthToken) -> Result<(), TokenError> {
        let mut records = self.records.write().await;
        if records.contains_key(&record.token) {
            return Err(TokenError::DuplicateToken);
        }
        records.insert(record.token.clone(), record.clone());
        Ok(())
    }

    async fn update_context(&self, record: &AuthToken) -> Result<(), TokenError> {
        let mut records = self.records.write().await;
        let stored = records
            .get_mut(&record.token)
            .ok_or_else(|| TokenError::LookupFailed("token not found".to_string()))?;
        stored.client_id = record.client_id;
        stored.client_ip = record.client_ip.clone();
        stored.user_agent = record.user_agent.clone();
        Ok(())
    }
}
