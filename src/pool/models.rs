//! Pool data models
//!
//! This module defines the persisted pool record, its credentials and usage
//! stats, plus the input/update/output shapes used by the registry and the
//! metrics engine. All timestamps are unix milliseconds.

use serde::{Deserialize, Serialize};

/// A pool of upstream credentials behind a single issued auth key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pool {
    /// Opaque unique pool identifier. Immutable once assigned.
    pub id: String,

    /// Human-readable pool name (non-empty)
    pub name: String,

    /// Optional free-text description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// The externally presented secret clients use to select this pool.
    /// Unique across all pools; kept 1:1 with the pool id in the auth-key index.
    pub auth_key: String,

    /// Ordered credential entries. Never empty.
    pub credentials: Vec<CredentialEntry>,

    /// Model allow-list. An empty list means all models are allowed.
    #[serde(default)]
    pub allowed_models: Vec<String>,

    /// Whether the pool accepts forwarded traffic
    pub enabled: bool,

    /// Cumulative counters and sliding-window ledgers
    #[serde(default)]
    pub stats: PoolStats,

    /// Unix timestamp (ms) when the pool was created
    pub created_at: i64,

    /// Unix timestamp (ms) of the last mutation
    pub updated_at: i64,
}

impl Pool {
    /// Whether a model may be served through this pool.
    /// An empty allow-list admits every model.
    pub fn is_model_allowed(&self, model_id: &str) -> bool {
        self.allowed_models.is_empty() || self.allowed_models.iter().any(|m| m == model_id)
    }

    /// Project this record back into a candidate configuration,
    /// used to re-validate merged updates through the same path as creation.
    pub fn as_config(&self) -> PoolConfig {
        PoolConfig {
            name: self.name.clone(),
            description: self.description.clone(),
            credentials: self
                .credentials
                .iter()
                .map(|c| CredentialConfig {
                    key: c.key.clone(),
                    name: c.name.clone(),
                    weight: c.weight,
                    enabled: c.enabled,
                })
                .collect(),
            allowed_models: self.allowed_models.clone(),
            enabled: self.enabled,
        }
    }
}

/// A single upstream credential inside a pool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CredentialEntry {
    /// Identifier unique within the pool (`key_1`, `key_2`, ...).
    /// Immutable once assigned.
    pub id: String,

    /// The upstream secret key
    pub key: String,

    /// Display name
    pub name: String,

    /// Whether an external selector may pick this credential
    pub enabled: bool,

    /// Selection weight for the external selector
    pub weight: u32,

    /// Lifetime request counter. Absent until first use.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_requests: Option<u64>,

    /// Lifetime success counter. Absent until first use.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub successful_requests: Option<u64>,

    /// Lifetime failure counter. Absent until first use.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failed_requests: Option<u64>,

    /// Unix timestamp (ms) of the last forwarded use
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_used_at: Option<i64>,
}

impl CredentialEntry {
    /// The secret key with all but a short prefix elided, for logs and
    /// admin display. Truncates on characters: keys are opaque text and
    /// may not align with char boundaries at a fixed byte offset.
    pub fn masked_key(&self) -> String {
        let visible: String = self.key.chars().take(8).collect();
        format!("{visible}...")
    }
}

/// Cumulative counters plus the two sliding-window ledgers for a pool.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PoolStats {
    pub total_requests: u64,
    pub successful_requests: u64,
    pub failed_requests: u64,

    pub total_tokens: u64,
    pub prompt_tokens: u64,
    pub completion_tokens: u64,

    /// Unix timestamp (ms) of the most recent recorded request
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_request_time: Option<i64>,

    /// Usage records within the last minute at the time of last write
    #[serde(default)]
    pub requests_last_minute: Vec<UsageEntry>,

    /// Usage records within the last 24 hours at the time of last write
    #[serde(default)]
    pub requests_last_day: Vec<UsageEntry>,
}

/// One timestamped usage record in a sliding-window ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsageEntry {
    /// Unix timestamp (ms) the request was recorded
    pub timestamp: i64,

    /// Whether the forwarded request succeeded
    pub success: bool,

    /// Total tokens consumed by the request
    pub tokens: u64,
}

/// Token usage reported for one forwarded request.
/// Missing fields default to zero.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct TokenUsage {
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub prompt: u64,
    #[serde(default)]
    pub completion: u64,
}

// ============================================================================
// Input and update shapes
// ============================================================================

/// Candidate pool configuration submitted to `create_pool`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolConfig {
    pub name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    pub credentials: Vec<CredentialConfig>,

    #[serde(default)]
    pub allowed_models: Vec<String>,

    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

/// Configuration for a single credential.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CredentialConfig {
    /// The upstream secret key
    pub key: String,

    #[serde(default = "default_name")]
    pub name: String,

    #[serde(default = "default_weight")]
    pub weight: u32,

    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_name() -> String {
    "default".to_string()
}

fn default_weight() -> u32 {
    1
}

fn default_enabled() -> bool {
    true
}

/// Whitelisted fields accepted by `update_pool`. Unset fields are untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PoolUpdate {
    pub name: Option<String>,

    /// Absent leaves the description unchanged; an explicit null
    /// (`Some(None)`) clears it.
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,

    pub credentials: Option<Vec<CredentialEntry>>,
    pub allowed_models: Option<Vec<String>>,
    pub enabled: Option<bool>,
}

/// Deserialize a field where a missing key means "leave unchanged" and an
/// explicit null means "clear". Plain `Option<Option<T>>` collapses null
/// into the outer `None`.
fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: serde::Deserialize<'de>,
    D: serde::Deserializer<'de>,
{
    serde::Deserialize::deserialize(deserializer).map(Some)
}

/// Whitelisted fields accepted by `update_credential`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CredentialUpdate {
    pub name: Option<String>,
    pub enabled: Option<bool>,
    pub weight: Option<u32>,
}

// ============================================================================
// Derived output shapes
// ============================================================================

/// Live rate metrics computed from the sliding-window ledgers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PoolMetrics {
    /// Requests in the last 60 seconds
    pub rpm: u64,
    /// Requests in the last 24 hours
    pub rpd: u64,
    /// Tokens in the last 60 seconds
    pub tpm: u64,
    /// Tokens in the last 24 hours
    pub tpd: u64,

    pub total_tokens: u64,
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
}

/// Pool identity combined with live metrics, for admin display.
#[derive(Debug, Clone, Serialize)]
pub struct PoolStatsView {
    pub id: String,
    pub name: String,
    pub enabled: bool,
    pub created_at: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_request_time: Option<i64>,
    pub metrics: PoolMetrics,
}

// ============================================================================
// Test fixtures
// ============================================================================

/// Minimal valid pool record for store and service tests.
#[cfg(test)]
pub fn test_pool(id: &str, name: &str) -> Pool {
    Pool {
        id: id.to_string(),
        name: name.to_string(),
        description: None,
        auth_key: format!("pk-{id}"),
        credentials: vec![CredentialEntry {
            id: "key_1".to_string(),
            key: "AIza-test".to_string(),
            name: "default".to_string(),
            enabled: true,
            weight: 1,
            total_requests: None,
            successful_requests: None,
            failed_requests: None,
            last_used_at: None,
        }],
        allowed_models: Vec::new(),
        enabled: true,
        stats: PoolStats::default(),
        created_at: 0,
        updated_at: 0,
    }
}
