//! In-memory store
//!
//! Reference backend for tests and embedded deployments. Holds pool records
//! and auth-key mappings in process memory behind async read-write locks.
//! Provides no optimistic-concurrency guarantee: concurrent whole-record
//! writes are last-write-wins, as documented on the store traits.

use super::{AuthKeyStore, PoolStore, StoreError};
use crate::pool::models::Pool;
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// In-memory implementation of both store traits.
#[derive(Debug, Default)]
pub struct MemoryStore {
    pools: RwLock<HashMap<String, Pool>>,
    mappings: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of pool records currently held.
    pub async fn pool_count(&self) -> usize {
        self.pools.read().await.len()
    }

    /// Number of auth-key mappings currently held.
    pub async fn mapping_count(&self) -> usize {
        self.mappings.read().await.len()
    }
}

#[async_trait]
impl PoolStore for MemoryStore {
    async fn load_pool(&self, id: &str) -> Result<Option<Pool>, StoreError> {
        Ok(self.pools.read().await.get(id).cloned())
    }

    async fn save_pool(&self, id: &str, pool: &Pool) -> Result<(), StoreError> {
        self.pools
            .write()
            .await
            .insert(id.to_string(), pool.clone());
        Ok(())
    }

    async fn delete_pool(&self, id: &str) -> Result<bool, StoreError> {
        Ok(self.pools.write().await.remove(id).is_some())
    }

    async fn load_all_pools(&self, _force_refresh: bool) -> Result<Vec<Pool>, StoreError> {
        // No cache to bypass here; the flag matters for caching decorators.
        Ok(self.pools.read().await.values().cloned().collect())
    }
}

#[async_trait]
impl AuthKeyStore for MemoryStore {
    async fn save_mapping(&self, auth_key: &str, pool_id: &str) -> Result<(), StoreError> {
        self.mappings
            .write()
            .await
            .insert(auth_key.to_string(), pool_id.to_string());
        Ok(())
    }

    async fn lookup_mapping(&self, auth_key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.mappings.read().await.get(auth_key).cloned())
    }

    async fn delete_mapping(&self, auth_key: &str) -> Result<(), StoreError> {
        self.mappings.write().await.remove(auth_key);
        Ok(())
    }
}
