//! Error types for pool operations.

pub mod types;

pub use types::PoolError;
