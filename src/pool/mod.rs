//! Pool Management Module
//!
//! This module provides the lifecycle manager for pools of upstream API
//! credentials: validated CRUD over pool records, per-credential lifecycle
//! and counters, sliding-window usage metrics, and the auth-key index the
//! forwarding layer resolves presented keys through.
//!
//! # Example
//! ```ignore
//! use keypool::pool::{AuthKeyIndex, PoolRegistry};
//! use keypool::pool::models::{CredentialConfig, PoolConfig};
//! use keypool::store::MemoryStore;
//! use std::sync::Arc;
//!
//! let store = Arc::new(MemoryStore::new());
//! let registry = PoolRegistry::new(store.clone(), AuthKeyIndex::new(store));
//!
//! let pool = registry.create_pool(PoolConfig {
//!     name: "demo".into(),
//!     description: None,
//!     credentials: vec![CredentialConfig {
//!         key: "AIza-x".into(),
//!         name: "default".into(),
//!         weight: 1,
//!         enabled: true,
//!     }],
//!     allowed_models: Vec::new(),
//!     enabled: true,
//! }).await?;
//!
//! println!("issued auth key: {}", pool.auth_key);
//! ```

pub mod auth_index;
pub mod credentials;
pub mod metrics;
pub mod models;
pub mod registry;
pub mod validator;

pub use auth_index::AuthKeyIndex;
pub use credentials::CredentialManager;
pub use metrics::{
    calculate_pool_metrics, MetricsEngine, DAY_WINDOW_MS, MINUTE_WINDOW_MS,
};
pub use models::{
    CredentialConfig, CredentialEntry, CredentialUpdate, Pool, PoolConfig, PoolMetrics,
    PoolStats, PoolStatsView, PoolUpdate, TokenUsage, UsageEntry,
};
pub use registry::PoolRegistry;
pub use validator::{validate_pool_config, ValidationReport};
