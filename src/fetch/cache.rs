//! File-based cache for downloaded collection artifacts.

use crate::error::{AntsibullError, FetchErrorKind, Result};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::PathBuf;

/// Identity of one collection artifact.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub struct ArtifactKey {
    /// Dotted collection name (`namespace.name`)
    pub collection: String,
    pub version: semver::Version,
}

impl ArtifactKey {
    pub fn new(collection: impl Into<String>, version: semver::Version) -> Self {
        Self {
            collection: collection.into(),
            version,
        }
    }

    /// Galaxy artifact file name: `namespace-name-version.tar.gz`.
    #[must_use]
    pub fn to_filename(&self) -> String {
        format!(
            "{}-{}.tar.gz",
            self.collection.replace('.', "-"),
            self.version
        )
    }
}

/// Hex SHA-256 of `data`.
#[must_use]
pub fn sha256_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    format!("{:x}", hasher.finalize())
}

/// Directory of collection artifacts, shared across runs.
///
/// Entries never expire: a published collection version is immutable.
/// When the expected checksum is known, cached and stored data is checked
/// against it.
#[derive(Debug, Clone)]
pub struct DownloadCache {
    cache_dir: PathBuf,
}

impl DownloadCache {
    /// Create the cache, creating its directory if needed.
    pub fn new(cache_dir: PathBuf) -> Result<Self> {
        if !cache_dir.exists() {
            fs::create_dir_all(&cache_dir).map_err(|e| AntsibullError::io(&cache_dir, e))?;
        }
        Ok(Self { cache_dir })
    }

    fn path(&self, key: &ArtifactKey) -> PathBuf {
        self.cache_dir.join(key.to_filename())
    }

    /// Cached artifact, if present and (when `sha256` is given) intact.
    pub fn get(&self, key: &ArtifactKey, sha256: Option<&str>) -> Option<Vec<u8>> {
        let path = self.path(key);
        let data = fs::read(&path).ok()?;
        if let Some(expected) = sha256 {
            if !sha256_hex(&data).eq_ignore_ascii_case(expected) {
                tracing::warn!("Discarding corrupt cache entry {}", path.display());
                let _ = fs::remove_file(&path);
                return None;
            }
        }
        tracing::debug!("Using cached {}", path.display());
        Some(data)
    }

    /// Store an artifact after checking it against `sha256`.
    pub fn store(&self, key: &ArtifactKey, data: &[u8], sha256: Option<&str>) -> Result<()> {
        if let Some(expected) = sha256 {
            let actual = sha256_hex(data);
            if !actual.eq_ignore_ascii_case(expected) {
                return Err(AntsibullError::fetch(
                    format!("{} {}", key.collection, key.version),
                    FetchErrorKind::Cache(format!(
                        "checksum mismatch: expected {expected}, got {actual}"
                    )),
                ));
            }
        }
        let path = self.path(key);
        fs::write(&path, data).map_err(|e| AntsibullError::io(&path, e))
    }
}
