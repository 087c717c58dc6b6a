//! Application settings and configuration
//!
//! This module provides configuration management for the pool manager,
//! loading settings from environment variables with sensible defaults.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;

/// Application environment
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Staging => write!(f, "staging"),
            Environment::Production => write!(f, "production"),
        }
    }
}

impl std::str::FromStr for Environment {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "development" | "dev" => Ok(Environment::Development),
            "staging" | "stage" => Ok(Environment::Staging),
            "production" | "prod" => Ok(Environment::Production),
            _ => anyhow::bail!(
                "Invalid environment: {}. Expected: development, staging, or production",
                s
            ),
        }
    }
}

/// How unknown model ids in a pool's allow-list are handled.
///
/// The model catalog may be stale, so the default is advisory: unknown
/// models are logged as warnings and the configuration is accepted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelValidationMode {
    /// Log unknown model ids as warnings, never reject.
    #[default]
    Warn,
    /// Reject configurations referencing unknown model ids.
    Strict,
}

impl std::str::FromStr for ModelValidationMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "warn" | "advisory" => Ok(ModelValidationMode::Warn),
            "strict" => Ok(ModelValidationMode::Strict),
            _ => anyhow::bail!("Invalid model validation mode: {}. Expected: warn or strict", s),
        }
    }
}

/// Main application settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Settings {
    // App settings
    pub app_name: String,
    pub app_version: String,
    pub environment: Environment,
    pub log_level: String,

    /// Emit logs as JSON (one object per line) instead of human-readable text
    pub log_json: bool,

    /// Prefix for generated pool auth keys
    pub auth_key_prefix: String,

    /// How unknown models in a pool allow-list are treated
    pub model_validation: ModelValidationMode,

    /// Maximum number of pool records held by the caching store layer
    pub pool_cache_capacity: u64,

    /// Time-to-live for cached pool records, in seconds
    pub pool_cache_ttl_seconds: u64,
}

impl Settings {
    /// Load settings from environment variables with defaults
    pub fn load() -> Result<Self> {
        // Load .env file if it exists (ignored in production typically)
        dotenvy::dotenv().ok();

        let settings = Self {
            app_name: env_or_default("APP_NAME", "keypool"),
            app_version: env!("CARGO_PKG_VERSION").to_string(),
            environment: env_or_default("ENVIRONMENT", "development")
                .parse()
                .unwrap_or_default(),
            log_level: env_or_default("LOG_LEVEL", "info"),
            log_json: env_or_default("LOG_JSON", "false").parse().unwrap_or(false),

            auth_key_prefix: env_or_default("AUTH_KEY_PREFIX", "pk-"),

            model_validation: env_or_default("MODEL_VALIDATION", "warn")
                .parse()
                .unwrap_or_default(),

            pool_cache_capacity: env_or_default("POOL_CACHE_CAPACITY", "1000")
                .parse()
                .context("Invalid POOL_CACHE_CAPACITY value")?,
            pool_cache_ttl_seconds: env_or_default("POOL_CACHE_TTL_SECONDS", "30")
                .parse()
                .context("Invalid POOL_CACHE_TTL_SECONDS value")?,
        };

        settings.validate()?;

        Ok(settings)
    }

    /// Validate settings
    fn validate(&self) -> Result<()> {
        if self.auth_key_prefix.is_empty() {
            anyhow::bail!("AUTH_KEY_PREFIX cannot be empty");
        }

        if self.pool_cache_capacity == 0 {
            anyhow::bail!("POOL_CACHE_CAPACITY must be > 0");
        }

        if self.environment == Environment::Production
            && self.model_validation == ModelValidationMode::Strict
        {
            // Strict mode plus a stale catalog can lock admins out of edits.
            tracing::warn!("Running in production with strict model validation");
        }

        Ok(())
    }
}

/// Get an environment variable or return a default value
fn env_or_default(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}
