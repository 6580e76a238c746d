//! Configuration file loading and discovery.
//!
//! Supports loading configuration from YAML files with automatic discovery.

use super::defaults::{
    DEFAULT_BUILD_DATA_URL, DEFAULT_GALAXY_URL, DEFAULT_MAX_RETRIES,
    DEFAULT_PORTING_GUIDE_BASE_URL, DEFAULT_PYPI_URL, DEFAULT_THREAD_MAX, DEFAULT_TIMEOUT_SECS,
};
use super::types::{AppConfig, BuildConfig};
use std::path::{Path, PathBuf};

// ============================================================================
// Configuration File Discovery
// ============================================================================

/// Standard config file names to search for.
const CONFIG_FILE_NAMES: &[&str] = &[
    ".antsibull.yaml",
    ".antsibull.yml",
    "antsibull.yaml",
    "antsibull.yml",
];

/// Discover a config file by searching standard locations.
///
/// Search order:
/// 1. Explicit path if provided
/// 2. Current directory
/// 3. Git repository root (if in a repo)
/// 4. User config directory (~/.config/antsibull/)
/// 5. Home directory
#[must_use]
pub fn discover_config_file(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        if path.exists() {
            return Some(path.to_path_buf());
        }
    }

    let cwd = std::env::current_dir().ok();
    let candidates = [
        cwd.clone(),
        find_git_root(),
        dirs::config_dir().map(|dir| dir.join("antsibull")),
        dirs::home_dir(),
    ];
    candidates
        .into_iter()
        .flatten()
        .find_map(|dir| find_config_in_dir(&dir))
}

/// Find a config file in a specific directory.
fn find_config_in_dir(dir: &Path) -> Option<PathBuf> {
    CONFIG_FILE_NAMES
        .iter()
        .map(|name| dir.join(name))
        .find(|path| path.exists())
}

/// Find the git repository root by walking up the directory tree.
fn find_git_root() -> Option<PathBuf> {
    let cwd = std::env::current_dir().ok()?;
    let mut current = cwd.as_path();

    loop {
        if current.join(".git").exists() {
            return Some(current.to_path_buf());
        }
        current = current.parent()?;
    }
}

// ============================================================================
// Configuration File Loading
// ============================================================================

/// Failure to load a config file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigFileError {
    #[error("no config file at {}", .0.display())]
    NotFound(PathBuf),
    #[error("cannot read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid config file: {0}")]
    Parse(#[from] serde_yaml::Error),
}

/// Load an `AppConfig` from a YAML file.
pub fn load_config_file(path: &Path) -> Result<AppConfig, ConfigFileError> {
    if !path.exists() {
        return Err(ConfigFileError::NotFound(path.to_path_buf()));
    }

    let content = std::fs::read_to_string(path)?;
    if content.trim().is_empty() {
        return Ok(AppConfig::default());
    }
    let config: AppConfig = serde_yaml::from_str(&content)?;
    Ok(config)
}

/// Load config from discovered file, or return default.
#[must_use]
pub fn load_or_default(explicit_path: Option<&Path>) -> (AppConfig, Option<PathBuf>) {
    discover_config_file(explicit_path).map_or_else(
        || (AppConfig::default(), None),
        |path| match load_config_file(&path) {
            Ok(config) => (config, Some(path)),
            Err(e) => {
                tracing::warn!("Failed to load config from {}: {}", path.display(), e);
                (AppConfig::default(), None)
            }
        },
    )
}

// ============================================================================
// Configuration Merging
// ============================================================================

impl AppConfig {
    /// Merge another config into this one, with `other` taking precedence
    /// wherever it differs from the defaults.
    pub fn merge(&mut self, other: &Self) {
        let net = &other.network;
        if net.galaxy_url != DEFAULT_GALAXY_URL {
            self.network.galaxy_url.clone_from(&net.galaxy_url);
        }
        if net.pypi_url != DEFAULT_PYPI_URL {
            self.network.pypi_url.clone_from(&net.pypi_url);
        }
        if net.porting_guide_base_url != DEFAULT_PORTING_GUIDE_BASE_URL {
            self.network
                .porting_guide_base_url
                .clone_from(&net.porting_guide_base_url);
        }
        if net.timeout_secs != DEFAULT_TIMEOUT_SECS {
            self.network.timeout_secs = net.timeout_secs;
        }
        if net.max_retries != DEFAULT_MAX_RETRIES {
            self.network.max_retries = net.max_retries;
        }
        if net.thread_max != DEFAULT_THREAD_MAX {
            self.network.thread_max = net.thread_max;
        }
        if net.collection_cache.is_some() {
            self.network.collection_cache.clone_from(&net.collection_cache);
        }

        if other.build.changelog_formats != BuildConfig::default().changelog_formats {
            self.build
                .changelog_formats
                .clone_from(&other.build.changelog_formats);
        }
        if other.build.build_data_url != DEFAULT_BUILD_DATA_URL {
            self.build.build_data_url.clone_from(&other.build.build_data_url);
        }
        if other.build.source_dir.is_some() {
            self.build.source_dir.clone_from(&other.build.source_dir);
        }
    }

    /// Load from file and merge with CLI overrides.
    #[must_use]
    pub fn from_file_with_overrides(
        config_path: Option<&Path>,
        cli_overrides: &Self,
    ) -> (Self, Option<PathBuf>) {
        let (mut config, loaded_from) = load_or_default(config_path);
        config.merge(cli_overrides);
        (config, loaded_from)
    }
}

// ============================================================================
// Example Config Generation
// ============================================================================

/// Generate an example config file content.
#[must_use]
pub fn generate_example_config() -> String {
    let example = AppConfig::default();
    format!(
        r"# antsibull configuration
# Place this file at .antsibull.yaml in your build data directory or ~/.config/antsibull/

{}
",
        serde_yaml::to_string(&example).unwrap_or_default()
    )
}

/// Generate a commented example config with all options.
#[must_use]
pub fn generate_full_example_config() -> String {
    r"# antsibull configuration file
# =============================
#
# Place it at:
#   - .antsibull.yaml next to the build data
#   - ~/.config/antsibull/antsibull.yaml for global config
#
# CLI arguments always override file settings.

network:
  # Galaxy server collections are downloaded from
  galaxy_url: https://galaxy.ansible.com/
  # PyPI server ansible-core is downloaded from
  pypi_url: https://pypi.org/
  # Where ansible-core porting guides are read from
  porting_guide_base_url: https://raw.githubusercontent.com/ansible/ansible/devel
  # Per-request timeout in seconds
  timeout_secs: 20
  # Attempts per request
  max_retries: 10
  # Parallel downloads
  thread_max: 8
  # Cache downloaded collection artifacts here
  # collection_cache: ~/.cache/antsibull/collections

build:
  # Formats of the combined changelog: rst, markdown
  changelog_formats:
    - rst
    - markdown
  # Used for changelog links in porting guides
  build_data_url: https://github.com/ansible-community/ansible-build-data/blob/main
  # Read changelogs from a local tree instead of downloading them
  # source_dir: ./changelog-sources
"
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NetworkConfig;
    use crate::render::DocumentFormat;
    use tempfile::TempDir;

    #[test]
    fn test_find_config_in_dir() {
        let tmp = TempDir::new().unwrap();
        let config_path = tmp.path().join(".antsibull.yaml");
        std::fs::write(&config_path, "network:\n  thread_max: 2\n").unwrap();

        assert_eq!(find_config_in_dir(tmp.path()), Some(config_path));
    }

    #[test]
    fn test_find_config_in_dir_not_found() {
        let tmp = TempDir::new().unwrap();
        assert_eq!(find_config_in_dir(tmp.path()), None);
    }

    #[test]
    fn test_load_config_file() {
        let tmp = TempDir::new().unwrap();
        let config_path = tmp.path().join("config.yaml");
        let yaml = r"
network:
  max_retries: 3
build:
  changelog_formats:
    - markdown
";
        std::fs::write(&config_path, yaml).unwrap();

        let config = load_config_file(&config_path).unwrap();
        assert_eq!(config.network.max_retries, 3);
        assert_eq!(config.network.thread_max, DEFAULT_THREAD_MAX);
        assert_eq!(config.build.changelog_formats, vec![DocumentFormat::Markdown]);
    }

    #[test]
    fn test_load_config_file_not_found() {
        let result = load_config_file(Path::new("/nonexistent/config.yaml"));
        assert!(matches!(result, Err(ConfigFileError::NotFound(_))));
    }

    #[test]
    fn test_config_merge() {
        let mut base = AppConfig::default();
        base.network.max_retries = 4;
        let overrides = AppConfig {
            network: NetworkConfig {
                thread_max: 2,
                ..NetworkConfig::default()
            },
            ..AppConfig::default()
        };

        base.merge(&overrides);
        assert_eq!(base.network.thread_max, 2);
        assert_eq!(base.network.max_retries, 4, "defaults do not override");
    }

    #[test]
    fn test_example_configs_parse() {
        let example = generate_example_config();
        let parsed: AppConfig = serde_yaml::from_str(&example).unwrap();
        assert_eq!(parsed, AppConfig::default());

        let full: AppConfig = serde_yaml::from_str(&generate_full_example_config()).unwrap();
        assert_eq!(full, AppConfig::default());
    }

    #[test]
    fn test_discover_explicit_path() {
        let tmp = TempDir::new().unwrap();
        let config_path = tmp.path().join("custom-config.yaml");
        std::fs::write(&config_path, "build: {}\n").unwrap();

        assert_eq!(discover_config_file(Some(&config_path)), Some(config_path));
    }
}
