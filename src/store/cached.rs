//! Caching store decorator
//!
//! Wraps any [`PoolStore`] with a bounded, TTL-evicted read cache so hot
//! per-request lookups (stat writes load the full record first) do not hit
//! the backend every time. Writes go straight through and refresh the cache;
//! `load_all_pools(force_refresh = true)` bypasses the cache entirely and
//! repopulates it from the backend.
//!
//! Cached reads can be stale up to the configured TTL. Callers that need
//! the backend's truth pass `force_refresh` or go through a non-cached store.

use super::{PoolStore, StoreError};
use crate::pool::models::Pool;
use async_trait::async_trait;
use moka::future::Cache;
use std::sync::Arc;
use std::time::Duration;

/// A [`PoolStore`] decorator with a moka read cache keyed by pool id.
pub struct CachedPoolStore {
    inner: Arc<dyn PoolStore>,
    cache: Cache<String, Pool>,
}

impl CachedPoolStore {
    /// Wrap `inner` with a cache of at most `capacity` records,
    /// each expiring `ttl` after insertion.
    pub fn new(inner: Arc<dyn PoolStore>, capacity: u64, ttl: Duration) -> Self {
        Self {
            inner,
            cache: Cache::builder()
                .max_capacity(capacity)
                .time_to_live(ttl)
                .build(),
        }
    }

    /// Number of records currently cached (approximate, per moka semantics).
    pub fn cached_count(&self) -> u64 {
        self.cache.entry_count()
    }
}

#[async_trait]
impl PoolStore for CachedPoolStore {
    async fn load_pool(&self, id: &str) -> Result<Option<Pool>, StoreError> {
        if let Some(pool) = self.cache.get(id).await {
            return Ok(Some(pool));
        }

        let loaded = self.inner.load_pool(id).await?;
        if let Some(ref pool) = loaded {
            self.cache.insert(id.to_string(), pool.clone()).await;
        }
        Ok(loaded)
    }

    async fn save_pool(&self, id: &str, pool: &Pool) -> Result<(), StoreError> {
        self.inner.save_pool(id, pool).await?;
        self.cache.insert(id.to_string(), pool.clone()).await;
        Ok(())
    }

    async fn delete_pool(&self, id: &str) -> Result<bool, StoreError> {
        let existed = self.inner.delete_pool(id).await?;
        self.cache.invalidate(id).await;
        Ok(existed)
    }

    async fn load_all_pools(&self, force_refresh: bool) -> Result<Vec<Pool>, StoreError> {
        let pools = self.inner.load_all_pools(force_refresh).await?;

        if force_refresh {
            self.cache.invalidate_all();
            for pool in &pools {
                self.cache.insert(pool.id.clone(), pool.clone()).await;
            }
        }

        Ok(pools)
    }
}
