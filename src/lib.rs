//! Credential pool manager for API forwarding proxies
//!
//! Groups upstream API credentials into pools behind single issued auth
//! keys, tracks per-pool and per-credential usage with 1-minute and 24-hour
//! sliding windows, and exposes that state to admin and forwarding layers.
//! Persistence is a trait boundary; the crate performs no upstream network
//! calls and selects no credentials itself.

// Public modules
pub mod catalog;
pub mod clock;
pub mod config;
pub mod error;
pub mod keygen;
pub mod logging;
pub mod pool;
pub mod store;

// Re-export commonly used types
pub use config::Settings;
pub use error::PoolError;
pub use pool::{AuthKeyIndex, CredentialManager, MetricsEngine, PoolRegistry};
pub use store::{AuthKeyStore, MemoryStore, PoolStore, StoreError};
