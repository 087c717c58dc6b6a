//! Pool configuration validation
//!
//! Pure structural checks over a candidate configuration. No side effects,
//! no persistence, no live-state queries. Model allow-list checks against the
//! optional catalog are advisory by default because the catalog may be stale;
//! strict mode turns them into errors.

use crate::catalog::ModelCatalog;
use crate::config::ModelValidationMode;
use crate::pool::models::PoolConfig;

/// Outcome of validating a candidate pool configuration.
#[derive(Debug, Clone)]
pub struct ValidationReport {
    pub valid: bool,
    /// Human-readable failure reasons, in check order.
    pub errors: Vec<String>,
}

impl ValidationReport {
    fn from_errors(errors: Vec<String>) -> Self {
        Self {
            valid: errors.is_empty(),
            errors,
        }
    }
}

/// Validate a candidate pool configuration.
pub fn validate_pool_config(
    config: &PoolConfig,
    catalog: Option<&dyn ModelCatalog>,
    mode: ModelValidationMode,
) -> ValidationReport {
    let mut errors = Vec::new();

    if config.name.trim().is_empty() {
        errors.push("pool name must be a non-empty string".to_string());
    }

    if config.credentials.is_empty() {
        errors.push("at least one credential is required".to_string());
    }

    for (i, credential) in config.credentials.iter().enumerate() {
        if credential.key.trim().is_empty() {
            errors.push(format!("credential {} has an empty key", i + 1));
        }
    }

    if let Some(catalog) = catalog {
        for model in &config.allowed_models {
            if !catalog.contains(model) {
                match mode {
                    ModelValidationMode::Warn => {
                        tracing::warn!(
                            pool = %config.name,
                            model = %model,
                            "Allowed model not found in catalog"
                        );
                    }
                    ModelValidationMode::Strict => {
                        errors.push(format!("unknown model id: {model}"));
                    }
                }
            }
        }
    }

    ValidationReport::from_errors(errors)
}
