//! Configuration validation for antsibull.

use super::types::{AppConfig, BuildConfig, NetworkConfig};

// ============================================================================
// Configuration Error
// ============================================================================

/// Error type for configuration validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError {
    /// The field that failed validation
    pub field: String,
    /// Description of the validation error
    pub message: String,
}

impl ConfigError {
    fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ConfigError {}

// ============================================================================
// Validation Trait
// ============================================================================

/// Trait for validatable configuration types.
pub trait Validatable {
    /// Validate the configuration, returning any errors found.
    fn validate(&self) -> Vec<ConfigError>;

    /// Check if the configuration is valid.
    fn is_valid(&self) -> bool {
        self.validate().is_empty()
    }
}

// ============================================================================
// Validation Implementations
// ============================================================================

impl Validatable for AppConfig {
    fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        errors.extend(self.network.validate());
        errors.extend(self.build.validate());
        errors
    }
}

fn check_url(field: &str, url: &str, errors: &mut Vec<ConfigError>) {
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        errors.push(ConfigError::new(
            field,
            format!("URL must start with http:// or https://, got '{url}'"),
        ));
    }
}

impl Validatable for NetworkConfig {
    fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        check_url("network.galaxy_url", &self.galaxy_url, &mut errors);
        check_url("network.pypi_url", &self.pypi_url, &mut errors);
        check_url(
            "network.porting_guide_base_url",
            &self.porting_guide_base_url,
            &mut errors,
        );

        if self.timeout_secs == 0 {
            errors.push(ConfigError::new("network.timeout_secs", "Timeout must be at least 1 second"));
        }
        if self.max_retries == 0 {
            errors.push(ConfigError::new("network.max_retries", "At least one attempt is required"));
        }
        if self.thread_max == 0 {
            errors.push(ConfigError::new("network.thread_max", "Worker pool needs at least one thread"));
        }

        if let Some(ref cache) = self.collection_cache {
            if cache.exists() && !cache.is_dir() {
                errors.push(ConfigError::new(
                    "network.collection_cache",
                    format!("{} exists and is not a directory", cache.display()),
                ));
            }
        }
        errors
    }
}

impl Validatable for BuildConfig {
    fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        if self.changelog_formats.is_empty() {
            errors.push(ConfigError::new(
                "build.changelog_formats",
                "At least one changelog format must be selected",
            ));
        }
        check_url("build.build_data_url", &self.build_data_url, &mut errors);
        if let Some(ref dir) = self.source_dir {
            if !dir.is_dir() {
                errors.push(ConfigError::new(
                    "build.source_dir",
                    format!("{} is not a directory", dir.display()),
                ));
            }
        }
        errors
    }
}
