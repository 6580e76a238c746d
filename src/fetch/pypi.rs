//! ansible-core changelogs from PyPI sdists.

use super::cache::sha256_hex;
use super::galaxy::GalaxySource;
use super::http::{join_url, RetryingClient};
use super::{core_package_name, is_core_changelog, porting_guide_path, tarball, ChangelogSource};
use crate::config::NetworkConfig;
use crate::error::{AntsibullError, FetchErrorKind, Result};
use crate::version::PypiVersion;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Mutex;

#[derive(Debug, Clone, Default, Deserialize)]
struct Digests {
    #[serde(default)]
    sha256: Option<String>,
}

/// One distribution file of a PyPI release.
#[derive(Debug, Clone, Deserialize)]
struct ReleaseFile {
    filename: String,
    url: String,
    #[serde(default)]
    digests: Digests,
}

#[derive(Debug, Deserialize)]
struct ProjectInfo {
    #[serde(default)]
    releases: HashMap<String, Vec<ReleaseFile>>,
}

/// Whether `filename` is the sdist of `package` `version`.
///
/// Newer sdists use the normalized project name (`ansible_core-...`).
fn is_sdist(filename: &str, package: &str, version: &str) -> bool {
    let normalized = package.replace('-', "_");
    [package, normalized.as_str()]
        .iter()
        .any(|name| filename.starts_with(&format!("{name}-{version}.tar.")))
}

/// Downloads ansible-core (or ansible-base) sdists from PyPI.
///
/// Project metadata is fetched once per package and kept for the lifetime
/// of the source.
#[derive(Debug)]
pub struct PypiCoreSource {
    client: RetryingClient,
    pypi_url: String,
    porting_guide_base_url: String,
    projects: Mutex<HashMap<&'static str, HashMap<String, Vec<ReleaseFile>>>>,
}

impl PypiCoreSource {
    pub fn new(
        client: RetryingClient,
        pypi_url: impl Into<String>,
        porting_guide_base_url: impl Into<String>,
    ) -> Self {
        Self {
            client,
            pypi_url: pypi_url.into(),
            porting_guide_base_url: porting_guide_base_url.into(),
            projects: Mutex::new(HashMap::new()),
        }
    }

    fn release_files(&self, package: &'static str, version: &str) -> Result<Vec<ReleaseFile>> {
        if let Ok(projects) = self.projects.lock() {
            if let Some(releases) = projects.get(package) {
                return Ok(releases.get(version).cloned().unwrap_or_default());
            }
        }

        let url = join_url(&self.pypi_url, &format!("pypi/{package}/json"));
        let releases = self
            .client
            .get_json::<ProjectInfo>(&url)?
            .map(|info| info.releases)
            .unwrap_or_default();
        let files = releases.get(version).cloned().unwrap_or_default();
        if let Ok(mut projects) = self.projects.lock() {
            projects.insert(package, releases);
        }
        Ok(files)
    }

    /// sdist bytes of a core release, or `None` when PyPI has none.
    pub fn download(&self, version: &PypiVersion) -> Result<Option<Vec<u8>>> {
        let Some(package) = core_package_name(version) else {
            tracing::warn!("ansible-core {version} predates the ansible-base package");
            return Ok(None);
        };
        let version_str = version.to_string();
        let files = self.release_files(package, &version_str)?;
        let Some(sdist) = files
            .into_iter()
            .find(|file| is_sdist(&file.filename, package, &version_str))
        else {
            tracing::warn!("No sdist found for {package} {version_str} on {}", self.pypi_url);
            return Ok(None);
        };

        let Some(data) = self.client.get_bytes(&sdist.url)? else {
            return Ok(None);
        };
        if let Some(expected) = sdist.digests.sha256.as_deref() {
            let actual = sha256_hex(&data);
            if !actual.eq_ignore_ascii_case(expected) {
                return Err(AntsibullError::fetch(
                    sdist.url,
                    FetchErrorKind::InvalidResponse(format!(
                        "checksum mismatch: expected {expected}, got {actual}"
                    )),
                ));
            }
        }
        Ok(Some(data))
    }

    pub fn changelog(&self, version: &PypiVersion) -> Result<Option<Vec<u8>>> {
        match self.download(version)? {
            Some(sdist) => tarball::read_member(&sdist, is_core_changelog),
            None => Ok(None),
        }
    }

    pub fn porting_guide(&self, version: &PypiVersion) -> Result<Option<Vec<u8>>> {
        let url = join_url(&self.porting_guide_base_url, &porting_guide_path(version));
        self.client.get_bytes(&url)
    }
}

/// Galaxy for collections, PyPI for ansible-core.
#[derive(Debug)]
pub struct NetworkSource {
    galaxy: GalaxySource,
    core: PypiCoreSource,
}

impl NetworkSource {
    pub fn new(galaxy: GalaxySource, core: PypiCoreSource) -> Self {
        Self { galaxy, core }
    }

    /// Build both sources from the network settings.
    pub fn from_config(config: &NetworkConfig) -> Result<Self> {
        let client = RetryingClient::new(config)?;
        let mut galaxy = GalaxySource::new(client.clone(), config.galaxy_url.clone());
        if let Some(dir) = &config.collection_cache {
            galaxy = galaxy.with_cache(super::DownloadCache::new(dir.clone())?);
        }
        let core = PypiCoreSource::new(
            client,
            config.pypi_url.clone(),
            config.porting_guide_base_url.clone(),
        );
        Ok(Self::new(galaxy, core))
    }
}

impl ChangelogSource for NetworkSource {
    fn collection_changelog(
        &self,
        collection: &str,
        version: &semver::Version,
    ) -> Result<Option<Vec<u8>>> {
        self.galaxy.changelog(collection, version)
    }

    fn core_changelog(&self, version: &PypiVersion) -> Result<Option<Vec<u8>>> {
        self.core.changelog(version)
    }

    fn core_porting_guide(&self, version: &PypiVersion) -> Result<Option<Vec<u8>>> {
        self.core.porting_guide(version)
    }
}
