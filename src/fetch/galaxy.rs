//! Collection changelogs from a Galaxy server.

use super::cache::{sha256_hex, ArtifactKey, DownloadCache};
use super::http::{join_url, RetryingClient};
use super::{is_collection_changelog, tarball};
use crate::error::{AntsibullError, FetchErrorKind, OptionContext, Result};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct ArtifactInfo {
    #[serde(default)]
    sha256: Option<String>,
}

/// The parts of a Galaxy v3 collection version record we need.
#[derive(Debug, Deserialize)]
struct CollectionVersionInfo {
    #[serde(default)]
    download_url: Option<String>,
    #[serde(default)]
    artifact: Option<ArtifactInfo>,
}

/// Downloads collection artifacts from Galaxy and extracts their changelog.
#[derive(Debug, Clone)]
pub struct GalaxySource {
    client: RetryingClient,
    galaxy_url: String,
    cache: Option<DownloadCache>,
}

impl GalaxySource {
    pub fn new(client: RetryingClient, galaxy_url: impl Into<String>) -> Self {
        Self {
            client,
            galaxy_url: galaxy_url.into(),
            cache: None,
        }
    }

    #[must_use]
    pub fn with_cache(mut self, cache: DownloadCache) -> Self {
        self.cache = Some(cache);
        self
    }

    fn version_url(&self, collection: &str, version: &semver::Version) -> Result<String> {
        let (namespace, name) = collection
            .split_once('.')
            .with_context_none(|| format!("'{collection}' is not a namespace.name collection name"))?;
        Ok(join_url(
            &self.galaxy_url,
            &format!(
                "api/v3/plugin/ansible/content/published/collections/index/{namespace}/{name}/versions/{version}/"
            ),
        ))
    }

    /// Collection artifact bytes, from the cache when possible.
    pub fn download(&self, collection: &str, version: &semver::Version) -> Result<Option<Vec<u8>>> {
        let key = ArtifactKey::new(collection, version.clone());
        if let Some(data) = self.cache.as_ref().and_then(|cache| cache.get(&key, None)) {
            return Ok(Some(data));
        }

        let info_url = self.version_url(collection, version)?;
        let Some(info) = self.client.get_json::<CollectionVersionInfo>(&info_url)? else {
            tracing::warn!("{collection} {version} is not available on {}", self.galaxy_url);
            return Ok(None);
        };
        let download_url = info.download_url.ok_or_else(|| {
            AntsibullError::fetch(
                info_url.clone(),
                FetchErrorKind::InvalidResponse("missing download_url".to_string()),
            )
        })?;
        let sha256 = info.artifact.and_then(|artifact| artifact.sha256);

        let Some(data) = self.client.get_bytes(&download_url)? else {
            return Ok(None);
        };
        if let Some(expected) = sha256.as_deref() {
            let actual = sha256_hex(&data);
            if !actual.eq_ignore_ascii_case(expected) {
                return Err(AntsibullError::fetch(
                    download_url,
                    FetchErrorKind::InvalidResponse(format!(
                        "checksum mismatch: expected {expected}, got {actual}"
                    )),
                ));
            }
        }
        if let Some(cache) = &self.cache {
            if let Err(e) = cache.store(&key, &data, sha256.as_deref()) {
                tracing::warn!("Could not cache {collection} {version}: {e}");
            }
        }
        Ok(Some(data))
    }

    /// `changelog.yaml` from the collection artifact.
    pub fn changelog(&self, collection: &str, version: &semver::Version) -> Result<Option<Vec<u8>>> {
        match self.download(collection, version)? {
            Some(artifact) => tarball::read_member(&artifact, is_collection_changelog),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NetworkConfig;

    fn source() -> GalaxySource {
        let client = RetryingClient::new(&NetworkConfig::default()).unwrap();
        GalaxySource::new(client, "https://galaxy.example.com/")
    }

    #[test]
    fn test_version_url() {
        let url = source()
            .version_url("community.general", &semver::Version::new(8, 1, 0))
            .unwrap();
        assert_eq!(
            url,
            "https://galaxy.example.com/api/v3/plugin/ansible/content/published/collections/index/community/general/versions/8.1.0/"
        );
        assert!(source()
            .version_url("nodot", &semver::Version::new(1, 0, 0))
            .is_err());
    }

    #[test]
    fn test_cached_artifact_skips_network() {
        let tmp = tempfile::tempdir().unwrap();
        let cache = DownloadCache::new(tmp.path().to_path_buf()).unwrap();
        let version = semver::Version::new(1, 2, 0);
        let artifact =
            tarball::build_tarball(&[("changelogs/changelog.yaml", b"releases: {}\n")]);
        cache
            .store(&ArtifactKey::new("acme.tools", version.clone()), &artifact, None)
            .unwrap();

        let source = source().with_cache(cache);
        let changelog = source.changelog("acme.tools", &version).unwrap();
        assert_eq!(changelog.as_deref(), Some(&b"releases: {}\n"[..]));
    }
}
