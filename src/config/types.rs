//! Configuration types for antsibull operations.
//!
//! Everything that used to live in ambient application context is an
//! explicit struct here and is passed down by parameter.

use crate::render::DocumentFormat;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

// ============================================================================
// Unified Application Configuration
// ============================================================================

/// Unified application configuration that can be loaded from CLI args or config files.
///
/// CLI arguments override values loaded from a file (see [`AppConfig::merge`]).
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    /// Download settings (Galaxy, PyPI, retries, worker pool)
    pub network: NetworkConfig,
    /// Changelog build settings
    pub build: BuildConfig,
}

impl AppConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn builder() -> AppConfigBuilder {
        AppConfigBuilder::default()
    }
}

// ============================================================================
// Builder for AppConfig
// ============================================================================

/// Builder for constructing `AppConfig` with fluent API.
#[derive(Debug, Default)]
#[must_use]
pub struct AppConfigBuilder {
    config: AppConfig,
}

impl AppConfigBuilder {
    pub fn galaxy_url(mut self, url: impl Into<String>) -> Self {
        self.config.network.galaxy_url = url.into();
        self
    }

    pub fn pypi_url(mut self, url: impl Into<String>) -> Self {
        self.config.network.pypi_url = url.into();
        self
    }

    pub const fn max_retries(mut self, retries: u32) -> Self {
        self.config.network.max_retries = retries;
        self
    }

    pub const fn thread_max(mut self, threads: usize) -> Self {
        self.config.network.thread_max = threads;
        self
    }

    pub fn collection_cache(mut self, dir: Option<PathBuf>) -> Self {
        self.config.network.collection_cache = dir;
        self
    }

    /// Read changelogs from a local directory tree instead of the network.
    pub fn source_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.config.build.source_dir = dir;
        self
    }

    pub fn changelog_formats(mut self, formats: Vec<DocumentFormat>) -> Self {
        self.config.build.changelog_formats = formats;
        self
    }

    #[must_use]
    pub fn build(self) -> AppConfig {
        self.config
    }
}

// ============================================================================
// Sub-configuration Types
// ============================================================================

/// Network configuration for changelog downloads.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(default)]
pub struct NetworkConfig {
    /// Base URL of the Galaxy server collections are downloaded from
    pub galaxy_url: String,
    /// Base URL of the PyPI server ansible-core is downloaded from
    pub pypi_url: String,
    /// Base URL porting guides of ansible-core are read from
    pub porting_guide_base_url: String,
    /// Per-request timeout in seconds
    #[schemars(range(min = 1))]
    pub timeout_secs: u64,
    /// Attempts per HTTP request before giving up
    #[schemars(range(min = 1))]
    pub max_retries: u32,
    /// Size of the download worker pool
    #[schemars(range(min = 1))]
    pub thread_max: usize,
    /// Directory where downloaded collection artifacts are cached
    #[serde(skip_serializing_if = "Option::is_none")]
    pub collection_cache: Option<PathBuf>,
}

impl NetworkConfig {
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Changelog build configuration.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(default)]
pub struct BuildConfig {
    /// Formats the combined changelog is written in
    pub changelog_formats: Vec<DocumentFormat>,
    /// Base URL of the build data repository, used for links in porting guides
    pub build_data_url: String,
    /// Local directory tree to read changelogs from instead of the network
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_dir: Option<PathBuf>,
}
