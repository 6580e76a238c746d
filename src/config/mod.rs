//! Configuration module for antsibull.
//!
//! This module provides:
//! - Type-safe configuration structures
//! - Validation for all configuration values
//! - YAML config file loading and discovery
//! - CLI argument merging
//!
//! # Configuration File
//!
//! Place a `.antsibull.yaml` file in your build data directory or
//! `~/.config/antsibull/`:
//!
//! ```yaml
//! network:
//!   thread_max: 4
//!   collection_cache: /var/cache/antsibull
//! build:
//!   changelog_formats: [rst]
//! ```

mod defaults;
pub mod file;
mod types;
mod validation;

pub use defaults::{
    DEFAULT_BUILD_DATA_URL, DEFAULT_GALAXY_URL, DEFAULT_MAX_RETRIES,
    DEFAULT_PORTING_GUIDE_BASE_URL, DEFAULT_PYPI_URL, DEFAULT_THREAD_MAX, DEFAULT_TIMEOUT_SECS,
};
pub use types::{AppConfig, AppConfigBuilder, BuildConfig, NetworkConfig};
pub use validation::{ConfigError, Validatable};

pub use file::{
    discover_config_file, generate_example_config, generate_full_example_config, load_config_file,
    load_or_default, ConfigFileError,
};

/// Generate a JSON Schema for the `AppConfig` configuration format.
#[must_use]
pub fn generate_json_schema() -> String {
    let schema = schemars::schema_for!(AppConfig);
    serde_json::to_string_pretty(&schema).unwrap_or_default()
}
