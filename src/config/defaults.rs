//! Default values for antsibull configuration.

use super::types::{BuildConfig, NetworkConfig};
use crate::render::DocumentFormat;

/// Galaxy server used for collection downloads.
pub const DEFAULT_GALAXY_URL: &str = "https://galaxy.ansible.com/";

/// PyPI server used for ansible-core downloads.
pub const DEFAULT_PYPI_URL: &str = "https://pypi.org/";

/// Raw file location of the ansible-core development branch.
pub const DEFAULT_PORTING_GUIDE_BASE_URL: &str =
    "https://raw.githubusercontent.com/ansible/ansible/devel";

/// Location of the published build data.
pub const DEFAULT_BUILD_DATA_URL: &str =
    "https://github.com/ansible-community/ansible-build-data/blob/main";

pub const DEFAULT_TIMEOUT_SECS: u64 = 20;
pub const DEFAULT_MAX_RETRIES: u32 = 10;
pub const DEFAULT_THREAD_MAX: usize = 8;

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            galaxy_url: DEFAULT_GALAXY_URL.to_string(),
            pypi_url: DEFAULT_PYPI_URL.to_string(),
            porting_guide_base_url: DEFAULT_PORTING_GUIDE_BASE_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            max_retries: DEFAULT_MAX_RETRIES,
            thread_max: DEFAULT_THREAD_MAX,
            collection_cache: None,
        }
    }
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            changelog_formats: vec![DocumentFormat::Rst, DocumentFormat::Markdown],
            build_data_url: DEFAULT_BUILD_DATA_URL.to_string(),
            source_dir: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.network.timeout_secs, 20);
        assert_eq!(config.network.max_retries, 10);
        assert_eq!(config.network.thread_max, 8);
        assert_eq!(config.build.changelog_formats.len(), 2);
        assert!(config.network.collection_cache.is_none());
    }
}
