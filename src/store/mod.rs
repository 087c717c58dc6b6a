//! Persistence collaborators
//!
//! The core never talks to a concrete database. Every operation goes through
//! the [`PoolStore`] and [`AuthKeyStore`] traits so a document store, a
//! relational backend or the bundled in-memory store can be swapped in
//! without touching pool logic.
//!
//! # Concurrency contract
//!
//! Every mutating pool operation is a whole-record read-modify-write: the
//! caller loads the full pool record, mutates it in memory and writes the
//! full record back. Two concurrent mutations of the same pool are therefore
//! last-write-wins — the loser's increment is lost — unless the backend
//! implementing these traits provides optimistic-concurrency or transactional
//! semantics of its own. That guarantee is pluggable and backend-specific;
//! the core neither requires nor simulates it.

pub mod cached;
pub mod memory;

use crate::pool::models::Pool;
use async_trait::async_trait;
use thiserror::Error;

pub use cached::CachedPoolStore;
pub use memory::MemoryStore;

/// Errors surfaced by a persistence backend.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The backend rejected a read or write.
    #[error("store backend error: {0}")]
    Backend(String),

    /// A stored record could not be encoded or decoded.
    #[error("store serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Persistence for pool records.
#[async_trait]
pub trait PoolStore: Send + Sync {
    /// Load a pool by id. `Ok(None)` if the record does not exist.
    async fn load_pool(&self, id: &str) -> Result<Option<Pool>, StoreError>;

    /// Write the full pool record, creating or replacing it.
    async fn save_pool(&self, id: &str, pool: &Pool) -> Result<(), StoreError>;

    /// Delete a pool record. `Ok(false)` if it did not exist.
    async fn delete_pool(&self, id: &str) -> Result<bool, StoreError>;

    /// Load all pool records. `force_refresh` instructs any caching layer
    /// the implementation maintains to bypass itself and hit the backend.
    async fn load_all_pools(&self, force_refresh: bool) -> Result<Vec<Pool>, StoreError>;
}

/// Persistence for the auth-key → pool-id index.
///
/// May be backed by the same store as [`PoolStore`] or a different one.
#[async_trait]
pub trait AuthKeyStore: Send + Sync {
    /// Create or replace the mapping for `auth_key`.
    async fn save_mapping(&self, auth_key: &str, pool_id: &str) -> Result<(), StoreError>;

    /// Resolve an auth key to a pool id. `Ok(None)` if unmapped.
    async fn lookup_mapping(&self, auth_key: &str) -> Result<Option<String>, StoreError>;

    /// Remove the mapping for `auth_key`. Idempotent: deleting an absent
    /// key succeeds.
    async fn delete_mapping(&self, auth_key: &str) -> Result<(), StoreError>;
}
