//! Reading single members out of `.tar.gz` archives.

use crate::error::{AntsibullError, FetchErrorKind, Result};
use flate2::read::GzDecoder;
use std::io::Read;

fn archive_error(err: &std::io::Error) -> AntsibullError {
    AntsibullError::fetch("reading archive", FetchErrorKind::Archive(err.to_string()))
}

/// Return the first regular file in the gzipped tarball whose path
/// (without a leading `./`) satisfies `matcher`.
pub fn read_member<F>(tarball: &[u8], matcher: F) -> Result<Option<Vec<u8>>>
where
    F: Fn(&str) -> bool,
{
    let mut archive = tar::Archive::new(GzDecoder::new(tarball));
    for entry in archive.entries().map_err(|e| archive_error(&e))? {
        let mut entry = entry.map_err(|e| archive_error(&e))?;
        if !entry.header().entry_type().is_file() {
            continue;
        }
        let path = entry
            .path()
            .map_err(|e| archive_error(&e))?
            .to_string_lossy()
            .into_owned();
        if matcher(path.strip_prefix("./").unwrap_or(&path)) {
            let mut content = Vec::new();
            entry
                .read_to_end(&mut content)
                .map_err(|e| archive_error(&e))?;
            return Ok(Some(content));
        }
    }
    Ok(None)
}

#[cfg(test)]
pub(crate) fn build_tarball(files: &[(&str, &[u8])]) -> Vec<u8> {
    use flate2::write::GzEncoder;
    use flate2::Compression;

    let mut builder = tar::Builder::new(GzEncoder::new(Vec::new(), Compression::default()));
    for (path, content) in files {
        let mut header = tar::Header::new_gnu();
        header.set_size(content.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder.append_data(&mut header, path, *content).unwrap();
    }
    builder.into_inner().unwrap().finish().unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::{is_collection_changelog, is_core_changelog};

    #[test]
    fn test_read_collection_changelog() {
        let tarball = build_tarball(&[
            ("MANIFEST.json", b"{}"),
            ("docs/changelogs/changelog.yaml", b"wrong"),
            ("changelogs/changelog.yaml", b"releases: {}\n"),
        ]);
        let found = read_member(&tarball, is_collection_changelog).unwrap();
        assert_eq!(found.as_deref(), Some(&b"releases: {}\n"[..]));
    }

    #[test]
    fn test_read_core_changelog_under_prefix() {
        let tarball = build_tarball(&[(
            "ansible-core-2.16.0/changelogs/changelog.yaml",
            b"ancestor: 2.15.0\n",
        )]);
        assert!(read_member(&tarball, is_core_changelog).unwrap().is_some());
        assert!(read_member(&tarball, is_collection_changelog)
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_garbage_is_an_error() {
        assert!(read_member(b"not a tarball", |_| true).is_err());
    }
}
