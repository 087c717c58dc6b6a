//! Auth-key index
//!
//! Bidirectional lookup from an issued auth key to a pool id. This is the
//! sole mechanism by which the forwarding layer resolves a presented key to
//! a pool; the registry keeps it in lockstep with pool creation, deletion
//! and key rotation.

use crate::store::{AuthKeyStore, StoreError};
use std::sync::Arc;

/// Thin façade over the auth-key mapping store.
#[derive(Clone)]
pub struct AuthKeyIndex {
    store: Arc<dyn AuthKeyStore>,
}

impl AuthKeyIndex {
    pub fn new(store: Arc<dyn AuthKeyStore>) -> Self {
        Self { store }
    }

    /// Create or replace the mapping for an auth key.
    pub async fn save(&self, auth_key: &str, pool_id: &str) -> Result<(), StoreError> {
        self.store.save_mapping(auth_key, pool_id).await?;
        tracing::debug!(pool_id = %pool_id, "Auth key mapping saved");
        Ok(())
    }

    /// Resolve an auth key to its pool id.
    pub async fn lookup(&self, auth_key: &str) -> Result<Option<String>, StoreError> {
        self.store.lookup_mapping(auth_key).await
    }

    /// Remove the mapping for an auth key. Deleting an absent key succeeds.
    pub async fn delete(&self, auth_key: &str) -> Result<(), StoreError> {
        self.store.delete_mapping(auth_key).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[tokio::test]
    async fn test_save_lookup_delete_roundtrip() {
        let index = AuthKeyIndex::new(Arc::new(MemoryStore::new()));

        index.save("pk-abc", "pool-1").await.unwrap();
        assert_eq!(
            index.lookup("pk-abc").await.unwrap().as_deref(),
            Some("pool-1")
        );

        index.delete("pk-abc").await.unwrap();
        assert!(index.lookup("pk-abc").await.unwrap().is_none());

        // Idempotent delete
        index.delete("pk-abc").await.unwrap();
    }

    #[tokio::test]
    async fn test_save_replaces_existing_mapping() {
        let index = AuthKeyIndex::new(Arc::new(MemoryStore::new()));

        index.save("pk-abc", "pool-1").await.unwrap();
        index.save("pk-abc", "pool-2").await.unwrap();
        assert_eq!(
            index.lookup("pk-abc").await.unwrap().as_deref(),
            Some("pool-2")
        );
    }
}
