//! Pool operation error types
//!
//! Absent pools are not errors: read, update and delete operations report a
//! missing pool as `Ok(None)` / `Ok(false)`. The variants here cover
//! structural validation failures, domain policy violations, unknown
//! credential ids inside an existing pool, and persistence failures, which
//! pass through unmodified.

use crate::store::StoreError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PoolError {
    /// The candidate pool configuration is structurally invalid.
    /// Raised before any write; carries every failed check in order.
    #[error("invalid pool configuration: {}", reasons.join("; "))]
    Validation { reasons: Vec<String> },

    /// A well-formed request that violates a domain rule,
    /// e.g. removing the last credential of a pool.
    #[error("policy violation: {0}")]
    Policy(String),

    /// The pool exists but the referenced credential id does not.
    #[error("credential '{credential_id}' not found in pool '{pool_id}'")]
    CredentialNotFound {
        pool_id: String,
        credential_id: String,
    },

    /// The persistence collaborator rejected a read or write.
    /// Never retried or suppressed inside the core.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl PoolError {
    /// Build a validation error from the validator's reason list.
    pub fn validation(reasons: Vec<String>) -> Self {
        PoolError::Validation { reasons }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_joins_reasons() {
        let err = PoolError::validation(vec![
            "pool name must be a non-empty string".to_string(),
            "at least one credential is required".to_string(),
        ]);
        let msg = err.to_string();
        assert!(msg.contains("pool name must be a non-empty string"));
        assert!(msg.contains("; at least one credential is required"));
    }

    #[test]
    fn test_credential_not_found_message() {
        let err = PoolError::CredentialNotFound {
            pool_id: "pool-1".to_string(),
            credential_id: "key_9".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "credential 'key_9' not found in pool 'pool-1'"
        );
    }
}
