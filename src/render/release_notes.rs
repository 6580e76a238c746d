//! Changelog and porting guide files of an Ansible major release.

use super::changelog::compose_changelog;
use super::porting_guide::compose_porting_guide;
use super::{create_renderer, DocumentFormat, DocumentRenderer, RstRenderer};
use crate::aggregate::Changelog;
use crate::error::{AntsibullError, Result};
use std::path::{Path, PathBuf};

/// A rendered file, not yet written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileWithContent {
    pub filename: String,
    pub content: Vec<u8>,
}

impl FileWithContent {
    pub fn new(filename: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        Self {
            filename: filename.into(),
            content: content.into(),
        }
    }

    /// Write into `dir`, replacing an existing file. Returns the path written.
    pub fn write_to(&self, dir: &Path) -> Result<PathBuf> {
        let path = dir.join(&self.filename);
        std::fs::write(&path, &self.content).map_err(|e| AntsibullError::io(&path, e))?;
        tracing::info!("Wrote {}", path.display());
        Ok(path)
    }
}

/// Rendered changelogs (one per format) and the porting guide.
#[derive(Debug, Clone)]
pub struct ReleaseNotes {
    pub changelogs: Vec<FileWithContent>,
    pub porting_guide: FileWithContent,
}

impl ReleaseNotes {
    /// Render `CHANGELOG-v<major>.<ext>` for every format and
    /// `porting_guide_<major>.rst`.
    pub fn build(
        changelog: &Changelog,
        formats: &[DocumentFormat],
        build_data_url: &str,
    ) -> Result<Self> {
        let major = changelog.ansible_version.major();

        let mut changelogs = Vec::with_capacity(formats.len());
        for &format in formats {
            let document = compose_changelog(changelog, format)?;
            let text = create_renderer(format).render(&document);
            changelogs.push(FileWithContent::new(
                format!("CHANGELOG-v{major}.{}", format.extension()),
                text,
            ));
        }

        let guide = compose_porting_guide(changelog, build_data_url)?;
        let porting_guide = FileWithContent::new(
            format!("porting_guide_{major}.rst"),
            RstRenderer::new().render(&guide),
        );

        Ok(Self {
            changelogs,
            porting_guide,
        })
    }

    pub fn write_changelog_to(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        self.changelogs.iter().map(|file| file.write_to(dir)).collect()
    }

    pub fn write_porting_guide_to(&self, dir: &Path) -> Result<PathBuf> {
        self.porting_guide.write_to(dir)
    }
}
