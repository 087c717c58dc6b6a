//! Credential lifecycle management
//!
//! Adds, removes and updates individual upstream credentials within a pool,
//! and maintains per-credential lifetime counters. Credentials only exist as
//! part of a pool record: every mutation here is a whole-pool
//! read-modify-write through the store.

use crate::clock::Clock;
use crate::error::PoolError;
use crate::pool::models::{CredentialConfig, CredentialEntry, CredentialUpdate, Pool};
use crate::store::PoolStore;
use std::sync::Arc;

/// Service for credential mutations within existing pools.
#[derive(Clone)]
pub struct CredentialManager {
    store: Arc<dyn PoolStore>,
    clock: Arc<dyn Clock>,
}

impl CredentialManager {
    pub fn new(store: Arc<dyn PoolStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Append a new credential to a pool.
    ///
    /// Returns the created entry, or `None` if the pool does not exist.
    /// The new entry gets a fresh `key_{n}` id distinct from every existing
    /// id in the pool.
    pub async fn add_credential(
        &self,
        pool_id: &str,
        config: CredentialConfig,
    ) -> Result<Option<CredentialEntry>, PoolError> {
        let Some(mut pool) = self.store.load_pool(pool_id).await? else {
            return Ok(None);
        };

        let entry = CredentialEntry {
            id: next_credential_id(&pool.credentials),
            key: config.key,
            name: config.name,
            enabled: config.enabled,
            weight: config.weight,
            total_requests: None,
            successful_requests: None,
            failed_requests: None,
            last_used_at: None,
        };

        pool.credentials.push(entry.clone());
        pool.updated_at = self.clock.now_ms();
        self.store.save_pool(pool_id, &pool).await?;

        tracing::info!(
            pool_id = %pool_id,
            credential_id = %entry.id,
            key = %entry.masked_key(),
            "Credential added"
        );

        Ok(Some(entry))
    }

    /// Remove a credential from a pool.
    ///
    /// Returns the updated pool, or `None` if the pool does not exist.
    /// A pool must keep at least one credential: removing from a
    /// single-credential pool is a policy violation and writes nothing.
    pub async fn remove_credential(
        &self,
        pool_id: &str,
        credential_id: &str,
    ) -> Result<Option<Pool>, PoolError> {
        let Some(mut pool) = self.store.load_pool(pool_id).await? else {
            return Ok(None);
        };

        if pool.credentials.len() == 1 {
            return Err(PoolError::Policy(
                "cannot remove the last credential of a pool".to_string(),
            ));
        }

        let before = pool.credentials.len();
        pool.credentials.retain(|c| c.id != credential_id);
        if pool.credentials.len() == before {
            // Nothing matched: return the pool untouched instead of
            // persisting a no-op record with a bumped timestamp.
            tracing::debug!(
                pool_id = %pool_id,
                credential_id = %credential_id,
                "Removal of unknown credential skipped"
            );
            return Ok(Some(pool));
        }

        pool.updated_at = self.clock.now_ms();
        self.store.save_pool(pool_id, &pool).await?;

        tracing::info!(
            pool_id = %pool_id,
            credential_id = %credential_id,
            remaining = pool.credentials.len(),
            "Credential removed"
        );

        Ok(Some(pool))
    }

    /// Apply whitelisted updates {name, enabled, weight} to a credential.
    ///
    /// Returns the updated entry, or `None` if the pool does not exist.
    /// An unknown credential id within an existing pool is an error,
    /// distinct from the absent-pool case.
    pub async fn update_credential(
        &self,
        pool_id: &str,
        credential_id: &str,
        updates: CredentialUpdate,
    ) -> Result<Option<CredentialEntry>, PoolError> {
        let Some(mut pool) = self.store.load_pool(pool_id).await? else {
            return Ok(None);
        };

        let Some(entry) = pool.credentials.iter_mut().find(|c| c.id == credential_id) else {
            return Err(PoolError::CredentialNotFound {
                pool_id: pool_id.to_string(),
                credential_id: credential_id.to_string(),
            });
        };

        if let Some(name) = updates.name {
            entry.name = name;
        }
        if let Some(enabled) = updates.enabled {
            entry.enabled = enabled;
        }
        if let Some(weight) = updates.weight {
            entry.weight = weight;
        }

        let updated = entry.clone();
        pool.updated_at = self.clock.now_ms();
        self.store.save_pool(pool_id, &pool).await?;

        Ok(Some(updated))
    }

    /// Record one forwarded-request outcome against a credential.
    ///
    /// Lifetime counters are initialized lazily on first use. A missing pool
    /// or credential makes this a no-op, never an error: stat writes race
    /// with admin deletes and losing one count is acceptable.
    pub async fn update_key_stats(
        &self,
        pool_id: &str,
        credential_id: &str,
        success: bool,
    ) -> Result<(), PoolError> {
        let Some(mut pool) = self.store.load_pool(pool_id).await? else {
            tracing::debug!(pool_id = %pool_id, "Stat write for unknown pool skipped");
            return Ok(());
        };

        let now = self.clock.now_ms();

        let Some(entry) = pool.credentials.iter_mut().find(|c| c.id == credential_id) else {
            tracing::debug!(
                pool_id = %pool_id,
                credential_id = %credential_id,
                "Stat write for unknown credential skipped"
            );
            return Ok(());
        };

        *entry.total_requests.get_or_insert(0) += 1;
        if success {
            *entry.successful_requests.get_or_insert(0) += 1;
            entry.failed_requests.get_or_insert(0);
        } else {
            *entry.failed_requests.get_or_insert(0) += 1;
            entry.successful_requests.get_or_insert(0);
        }
        entry.last_used_at = Some(now);

        pool.updated_at = now;
        self.store.save_pool(pool_id, &pool).await?;

        Ok(())
    }
}

/// Pick a `key_{n}` id not taken by any existing credential.
/// Removals leave gaps, so probe upward from the current count.
fn next_credential_id(credentials: &[CredentialEntry]) -> String {
    let mut n = credentials.len() + 1;
    loop {
        let candidate = format!("key_{n}");
        if !credentials.iter().any(|c| c.id == candidate) {
            return candidate;
        }
        n += 1;
    }
}
