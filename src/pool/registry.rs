//! Pool registry
//!
//! Top-level CRUD orchestrator for credential pools. Validates every write,
//! owns the pool lifecycle (created, active with update/rotation self-loops,
//! deleted) and keeps the auth-key index in lockstep with pool creation,
//! deletion and key rotation.
//!
//! Pool and mapping writes are two separate steps, not one transaction. A
//! failure between them leaves a detectable inconsistency: `create_pool`
//! rolls its pool write back best-effort; `delete_pool` and
//! `regenerate_pool_auth_key` log the stranded side for operator
//! reconciliation and propagate the store error.

use crate::catalog::ModelCatalog;
use crate::clock::{Clock, SystemClock};
use crate::config::ModelValidationMode;
use crate::error::PoolError;
use crate::keygen::{KeyGenerator, RandomKeyGenerator};
use crate::pool::auth_index::AuthKeyIndex;
use crate::pool::models::{CredentialEntry, Pool, PoolConfig, PoolStats, PoolUpdate};
use crate::pool::validator::validate_pool_config;
use crate::store::PoolStore;
use std::sync::Arc;

/// Orchestrator for the pool lifecycle.
#[derive(Clone)]
pub struct PoolRegistry {
    store: Arc<dyn PoolStore>,
    index: AuthKeyIndex,
    keygen: Arc<dyn KeyGenerator>,
    clock: Arc<dyn Clock>,
    catalog: Option<Arc<dyn ModelCatalog>>,
    validation_mode: ModelValidationMode,
}

impl PoolRegistry {
    /// Create a registry with the default key generator, system clock,
    /// no model catalog and advisory model validation.
    pub fn new(store: Arc<dyn PoolStore>, index: AuthKeyIndex) -> Self {
        Self {
            store,
            index,
            keygen: Arc::new(RandomKeyGenerator::default()),
            clock: Arc::new(SystemClock),
            catalog: None,
            validation_mode: ModelValidationMode::Warn,
        }
    }

    pub fn with_keygen(mut self, keygen: Arc<dyn KeyGenerator>) -> Self {
        self.keygen = keygen;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_catalog(mut self, catalog: Arc<dyn ModelCatalog>) -> Self {
        self.catalog = Some(catalog);
        self
    }

    pub fn with_validation_mode(mut self, mode: ModelValidationMode) -> Self {
        self.validation_mode = mode;
        self
    }

    /// The auth-key index this registry keeps synchronized.
    pub fn index(&self) -> &AuthKeyIndex {
        &self.index
    }

    fn validate(&self, config: &PoolConfig) -> Result<(), PoolError> {
        let report = validate_pool_config(config, self.catalog.as_deref(), self.validation_mode);
        if report.valid {
            Ok(())
        } else {
            Err(PoolError::validation(report.errors))
        }
    }

    /// Create a pool from a candidate configuration.
    ///
    /// Generates the pool id, the auth key and `key_{n}` credential ids,
    /// zeroes the stats, persists the record and then the auth-key mapping.
    /// Validation failure writes nothing.
    pub async fn create_pool(&self, config: PoolConfig) -> Result<Pool, PoolError> {
        self.validate(&config)?;

        let now = self.clock.now_ms();
        let id = self.keygen.pool_id();
        let auth_key = self.keygen.auth_key();

        let credentials: Vec<CredentialEntry> = config
            .credentials
            .into_iter()
            .enumerate()
            .map(|(i, c)| CredentialEntry {
                id: format!("key_{}", i + 1),
                key: c.key,
                name: c.name,
                enabled: c.enabled,
                weight: c.weight,
                total_requests: None,
                successful_requests: None,
                failed_requests: None,
                last_used_at: None,
            })
            .collect();

        let pool = Pool {
            id: id.clone(),
            name: config.name,
            description: config.description,
            auth_key: auth_key.clone(),
            credentials,
            allowed_models: config.allowed_models,
            enabled: config.enabled,
            stats: PoolStats::default(),
            created_at: now,
            updated_at: now,
        };

        self.store.save_pool(&id, &pool).await?;

        if let Err(e) = self.index.save(&auth_key, &id).await {
            // The pool record exists but is unreachable by key lookup.
            // Roll the record back so no orphan is left behind; if even
            // that fails, report the inconsistency for reconciliation.
            tracing::error!(pool_id = %id, error = %e, "Auth key mapping write failed after pool write");
            if let Err(rollback) = self.store.delete_pool(&id).await {
                tracing::error!(
                    pool_id = %id,
                    error = %rollback,
                    "Rollback failed, orphaned pool record requires reconciliation"
                );
            }
            return Err(e.into());
        }

        tracing::info!(
            pool_id = %id,
            name = %pool.name,
            credentials = pool.credentials.len(),
            "Pool created"
        );

        Ok(pool)
    }

    /// Load a pool by id.
    pub async fn get_pool(&self, id: &str) -> Result<Option<Pool>, PoolError> {
        Ok(self.store.load_pool(id).await?)
    }

    /// Load all pools. `force_refresh` bypasses any store-side cache.
    pub async fn get_all_pools(&self, force_refresh: bool) -> Result<Vec<Pool>, PoolError> {
        Ok(self.store.load_all_pools(force_refresh).await?)
    }

    /// Resolve a presented auth key to its pool.
    pub async fn find_pool_by_auth_key(&self, auth_key: &str) -> Result<Option<Pool>, PoolError> {
        let Some(pool_id) = self.index.lookup(auth_key).await? else {
            return Ok(None);
        };
        self.get_pool(&pool_id).await
    }

    /// Apply whitelisted updates {name, description, credentials,
    /// allowed_models, enabled} and re-validate the merged result.
    ///
    /// Returns the updated pool, or `None` if it does not exist.
    /// Validation failure writes nothing.
    pub async fn update_pool(
        &self,
        id: &str,
        updates: PoolUpdate,
    ) -> Result<Option<Pool>, PoolError> {
        let Some(mut pool) = self.store.load_pool(id).await? else {
            return Ok(None);
        };

        if let Some(name) = updates.name {
            pool.name = name;
        }
        if let Some(description) = updates.description {
            pool.description = description;
        }
        if let Some(credentials) = updates.credentials {
            pool.credentials = credentials;
        }
        if let Some(allowed_models) = updates.allowed_models {
            pool.allowed_models = allowed_models;
        }
        if let Some(enabled) = updates.enabled {
            pool.enabled = enabled;
        }

        self.validate(&pool.as_config())?;

        pool.updated_at = self.clock.now_ms();
        self.store.save_pool(id, &pool).await?;

        Ok(Some(pool))
    }

    /// Zero a pool's cumulative counters, ledgers and per-credential
    /// lifetime counters, through the same validation path as any update.
    ///
    /// This is the operation administrative reset tooling calls instead of
    /// writing to storage directly.
    pub async fn reset_pool_stats(&self, id: &str) -> Result<Option<Pool>, PoolError> {
        let Some(mut pool) = self.store.load_pool(id).await? else {
            return Ok(None);
        };

        pool.stats = PoolStats::default();
        for credential in &mut pool.credentials {
            credential.total_requests = None;
            credential.successful_requests = None;
            credential.failed_requests = None;
            credential.last_used_at = None;
        }

        self.validate(&pool.as_config())?;

        pool.updated_at = self.clock.now_ms();
        self.store.save_pool(id, &pool).await?;

        tracing::info!(pool_id = %id, "Pool stats reset");

        Ok(Some(pool))
    }

    /// Delete a pool and its auth-key mapping.
    ///
    /// Returns `false` without side effects if the pool does not exist.
    pub async fn delete_pool(&self, id: &str) -> Result<bool, PoolError> {
        let Some(pool) = self.store.load_pool(id).await? else {
            return Ok(false);
        };

        self.store.delete_pool(id).await?;

        if let Err(e) = self.index.delete(&pool.auth_key).await {
            tracing::error!(
                pool_id = %id,
                error = %e,
                "Mapping delete failed after pool delete, stale mapping requires reconciliation"
            );
            return Err(e.into());
        }

        tracing::info!(pool_id = %id, name = %pool.name, "Pool deleted");

        Ok(true)
    }

    /// Replace a pool's auth key.
    ///
    /// Deletes the old mapping, generates a fresh key, persists the pool and
    /// creates the new mapping. Between the two mapping writes the pool is
    /// briefly unreachable by key lookup; after success exactly one live
    /// mapping exists. Returns `None` if the pool does not exist.
    pub async fn regenerate_pool_auth_key(&self, id: &str) -> Result<Option<Pool>, PoolError> {
        let Some(mut pool) = self.store.load_pool(id).await? else {
            return Ok(None);
        };

        self.index.delete(&pool.auth_key).await?;

        pool.auth_key = self.keygen.auth_key();
        pool.updated_at = self.clock.now_ms();
        self.store.save_pool(id, &pool).await?;

        if let Err(e) = self.index.save(&pool.auth_key, id).await {
            tracing::error!(
                pool_id = %id,
                error = %e,
                "New mapping write failed after key rotation, pool unreachable until reconciled"
            );
            return Err(e.into());
        }

        tracing::info!(pool_id = %id, "Pool auth key regenerated");

        Ok(Some(pool))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::pool::models::CredentialConfig;
    use crate::store::{AuthKeyStore, MemoryStore, StoreError};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, Ordering};

    /// Auth-key store whose mapping writes can be made to fail,
    /// for exercising the two-step write failure paths.
    struct FlakyAuthKeyStore {
        inner: Arc<MemoryStore>,
        fail_saves: AtomicBool,
    }

    impl FlakyAuthKeyStore {
        fn new(inner: Arc<MemoryStore>) -> Self {
            Self {
                inner,
                fail_saves: AtomicBool::new(false),
            }
        }
    }

    #[async_trait]
    impl AuthKeyStore for FlakyAuthKeyStore {
        async fn save_mapping(&self, auth_key: &str, pool_id: &str) -> Result<(), StoreError> {
            if self.fail_saves.load(Ordering::SeqCst) {
                return Err(StoreError::Backend("mapping write refused".to_string()));
            }
            self.inner.save_mapping(auth_key, pool_id).await
        }

        async fn lookup_mapping(&self, auth_key: &str) -> Result<Option<String>, StoreError> {
            self.inner.lookup_mapping(auth_key).await
        }

        async fn delete_mapping(&self, auth_key: &str) -> Result<(), StoreError> {
            self.inner.delete_mapping(auth_key).await
        }
    }

    fn demo_config() -> PoolConfig {
        PoolConfig {
            name: "demo".to_string(),
            description: None,
            credentials: vec![CredentialConfig {
                key: "AIza-x".to_string(),
                name: "default".to_string(),
                weight: 1,
                enabled: true,
            }],
            allowed_models: Vec::new(),
            enabled: true,
        }
    }

    fn registry_over(store: Arc<MemoryStore>) -> PoolRegistry {
        PoolRegistry::new(store.clone(), AuthKeyIndex::new(store))
            .with_clock(Arc::new(ManualClock::new(1_000)))
    }

    #[tokio::test]
    async fn test_create_pool_generates_identity_and_mapping() {
        let store = Arc::new(MemoryStore::new());
        let registry = registry_over(store.clone());

        let pool = registry.create_pool(demo_config()).await.unwrap();

        assert!(!pool.id.is_empty());
        assert!(pool.auth_key.starts_with("pk-"));
        assert_eq!(pool.credentials.len(), 1);
        assert_eq!(pool.credentials[0].id, "key_1");
        assert_eq!(pool.stats.total_requests, 0);
        assert_eq!(pool.created_at, 1_000);

        let mapped = registry.index().lookup(&pool.auth_key).await.unwrap();
        assert_eq!(mapped.as_deref(), Some(pool.id.as_str()));
    }

    #[tokio::test]
    async fn test_create_pool_validation_failure_writes_nothing() {
        let store = Arc::new(MemoryStore::new());
        let registry = registry_over(store.clone());

        let mut config = demo_config();
        config.credentials.clear();

        let err = registry.create_pool(config).await.unwrap_err();
        match err {
            PoolError::Validation { reasons } => {
                assert_eq!(reasons, vec!["at least one credential is required"]);
            }
            other => panic!("expected validation error, got {other:?}"),
        }

        assert_eq!(store.pool_count().await, 0);
        assert_eq!(store.mapping_count().await, 0);
    }

    #[tokio::test]
    async fn test_create_pool_rolls_back_when_mapping_write_fails() {
        let store = Arc::new(MemoryStore::new());
        let auth_store = Arc::new(FlakyAuthKeyStore::new(store.clone()));
        auth_store.fail_saves.store(true, Ordering::SeqCst);

        let registry = PoolRegistry::new(store.clone(), AuthKeyIndex::new(auth_store.clone()))
            .with_clock(Arc::new(ManualClock::new(1_000)));

        let err = registry.create_pool(demo_config()).await.unwrap_err();
        assert!(matches!(err, PoolError::Store(_)));

        // The pool write was rolled back, no orphan on either side
        assert_eq!(store.pool_count().await, 0);
        assert_eq!(store.mapping_count().await, 0);

        // The store recovers once mapping writes succeed again
        auth_store.fail_saves.store(false, Ordering::SeqCst);
        let pool = registry.create_pool(demo_config()).await.unwrap();
        assert_eq!(store.pool_count().await, 1);
        assert_eq!(
            registry.index().lookup(&pool.auth_key).await.unwrap().as_deref(),
            Some(pool.id.as_str())
        );
    }

    #[tokio::test]
    async fn test_rotation_mapping_failure_propagates() {
        let store = Arc::new(MemoryStore::new());
        let auth_store = Arc::new(FlakyAuthKeyStore::new(store.clone()));
        let registry = PoolRegistry::new(store.clone(), AuthKeyIndex::new(auth_store.clone()))
            .with_clock(Arc::new(ManualClock::new(1_000)));
        let pool = registry.create_pool(demo_config()).await.unwrap();

        auth_store.fail_saves.store(true, Ordering::SeqCst);
        let err = registry
            .regenerate_pool_auth_key(&pool.id)
            .await
            .unwrap_err();
        assert!(matches!(err, PoolError::Store(_)));

        // Old mapping already deleted, new one refused: the pool record
        // persists but is unreachable by key lookup until reconciled.
        assert_eq!(store.pool_count().await, 1);
        assert_eq!(store.mapping_count().await, 0);
        assert!(registry.index().lookup(&pool.auth_key).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_pool_whitelist() {
        let store = Arc::new(MemoryStore::new());
        let registry = registry_over(store.clone());
        let pool = registry.create_pool(demo_config()).await.unwrap();

        let updated = registry
            .update_pool(
                &pool.id,
                PoolUpdate {
                    name: Some("renamed".to_string()),
                    description: Some(Some("gemini keys".to_string())),
                    enabled: Some(false),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
            .unwrap();

        assert_eq!(updated.name, "renamed");
        assert_eq!(updated.description.as_deref(), Some("gemini keys"));
        assert!(!updated.enabled);
        // Identity survives updates
        assert_eq!(updated.id, pool.id);
        assert_eq!(updated.auth_key, pool.auth_key);
    }

    #[tokio::test]
    async fn test_update_pool_clears_description_on_explicit_null() {
        let store = Arc::new(MemoryStore::new());
        let registry = registry_over(store.clone());
        let mut config = demo_config();
        config.description = Some("temporary".to_string());
        let pool = registry.create_pool(config).await.unwrap();

        // Absent field leaves the description untouched
        let untouched = registry
            .update_pool(
                &pool.id,
                PoolUpdate {
                    name: Some("renamed".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(untouched.description.as_deref(), Some("temporary"));

        let cleared = registry
            .update_pool(
                &pool.id,
                PoolUpdate {
                    description: Some(None),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
            .unwrap();
        assert!(cleared.description.is_none());

        let stored = store.load_pool(&pool.id).await.unwrap().unwrap();
        assert!(stored.description.is_none());
    }

    #[tokio::test]
    async fn test_update_pool_invalid_merge_not_persisted() {
        let store = Arc::new(MemoryStore::new());
        let registry = registry_over(store.clone());
        let pool = registry.create_pool(demo_config()).await.unwrap();

        let err = registry
            .update_pool(
                &pool.id,
                PoolUpdate {
                    credentials: Some(Vec::new()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, PoolError::Validation { .. }));

        let stored = store.load_pool(&pool.id).await.unwrap().unwrap();
        assert_eq!(stored.credentials.len(), 1);
    }

    #[tokio::test]
    async fn test_update_absent_pool_returns_none() {
        let store = Arc::new(MemoryStore::new());
        let registry = registry_over(store);

        let result = registry
            .update_pool("missing", PoolUpdate::default())
            .await
            .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_delete_pool_removes_record_and_mapping() {
        let store = Arc::new(MemoryStore::new());
        let registry = registry_over(store.clone());
        let pool = registry.create_pool(demo_config()).await.unwrap();

        assert!(registry.delete_pool(&pool.id).await.unwrap());
        assert_eq!(store.pool_count().await, 0);
        assert!(registry.index().lookup(&pool.auth_key).await.unwrap().is_none());

        // Absent pool: false, no side effects
        assert!(!registry.delete_pool(&pool.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_regenerate_auth_key_swaps_mapping() {
        let store = Arc::new(MemoryStore::new());
        let registry = registry_over(store.clone());
        let pool = registry.create_pool(demo_config()).await.unwrap();
        let old_key = pool.auth_key.clone();

        let rotated = registry
            .regenerate_pool_auth_key(&pool.id)
            .await
            .unwrap()
            .unwrap();

        assert_ne!(rotated.auth_key, old_key);
        assert!(registry.index().lookup(&old_key).await.unwrap().is_none());
        assert_eq!(
            registry.index().lookup(&rotated.auth_key).await.unwrap().as_deref(),
            Some(pool.id.as_str())
        );
        // Exactly one live mapping
        assert_eq!(store.mapping_count().await, 1);
    }

    #[tokio::test]
    async fn test_regenerate_absent_pool_returns_none() {
        let store = Arc::new(MemoryStore::new());
        let registry = registry_over(store);

        assert!(registry
            .regenerate_pool_auth_key("missing")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_find_pool_by_auth_key() {
        let store = Arc::new(MemoryStore::new());
        let registry = registry_over(store);
        let pool = registry.create_pool(demo_config()).await.unwrap();

        let found = registry
            .find_pool_by_auth_key(&pool.auth_key)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.id, pool.id);

        assert!(registry
            .find_pool_by_auth_key("pk-unknown")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_reset_pool_stats_zeroes_everything() {
        let store = Arc::new(MemoryStore::new());
        let registry = registry_over(store.clone());
        let pool = registry.create_pool(demo_config()).await.unwrap();

        // Dirty the record directly, as traffic would
        let mut dirty = store.load_pool(&pool.id).await.unwrap().unwrap();
        dirty.stats.total_requests = 10;
        dirty.stats.total_tokens = 500;
        dirty.credentials[0].total_requests = Some(10);
        dirty.credentials[0].last_used_at = Some(2_000);
        store.save_pool(&pool.id, &dirty).await.unwrap();

        let reset = registry.reset_pool_stats(&pool.id).await.unwrap().unwrap();
        assert_eq!(reset.stats.total_requests, 0);
        assert_eq!(reset.stats.total_tokens, 0);
        assert!(reset.credentials[0].total_requests.is_none());
        assert!(reset.credentials[0].last_used_at.is_none());

        assert!(registry.reset_pool_stats("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_get_all_pools() {
        let store = Arc::new(MemoryStore::new());
        let registry = registry_over(store);

        registry.create_pool(demo_config()).await.unwrap();
        let mut second = demo_config();
        second.name = "second".to_string();
        registry.create_pool(second).await.unwrap();

        let all = registry.get_all_pools(false).await.unwrap();
        assert_eq!(all.len(), 2);

        let refreshed = registry.get_all_pools(true).await.unwrap();
        assert_eq!(refreshed.len(), 2);
    }
}
