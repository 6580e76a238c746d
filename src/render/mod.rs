//! Rendering changelogs and porting guides.
//!
//! Composition builds a format-independent [`Document`]; a
//! [`DocumentRenderer`] turns it into text:
//! - reStructuredText: the canonical changelog and porting guide format
//! - Markdown: the changelog, for display on code hosting sites

mod changelog;
mod document;
mod markdown;
mod porting_guide;
mod release_notes;
mod rst;
mod standalone;
mod table;

pub use changelog::{
    compose_changelog, dump_items, optimize_release_entry, ItemPath, ReleaseSource,
};
pub use document::{Block, Document, LazySection, Section};
pub use markdown::{slugify, MarkdownRenderer};
pub use porting_guide::{compose_porting_guide, core_porting_guide_body};
pub use release_notes::{FileWithContent, ReleaseNotes};
pub use rst::RstRenderer;
pub use standalone::generate_standalone;
pub use table::{compute_column_widths, render_md_table, render_rst_table};

use clap::ValueEnum;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Text format of a rendered document.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, ValueEnum, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum DocumentFormat {
    /// reStructuredText
    #[default]
    Rst,
    /// CommonMark with HTML anchors
    #[value(alias = "md")]
    Markdown,
}

impl DocumentFormat {
    /// File extension, without the dot.
    #[must_use]
    pub fn extension(self) -> &'static str {
        match self {
            Self::Rst => "rst",
            Self::Markdown => "md",
        }
    }

    /// Link markup in this format.
    #[must_use]
    pub fn link(self, title: &str, url: &str) -> String {
        match self {
            Self::Rst => format!("`{title} <{url}>`_"),
            Self::Markdown => format!("[{title}]({url})"),
        }
    }
}

impl std::fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Rst => write!(f, "rst"),
            Self::Markdown => write!(f, "markdown"),
        }
    }
}

/// Turns a [`Document`] into text.
pub trait DocumentRenderer {
    fn render(&self, document: &Document) -> String;

    /// Format this renderer produces
    fn format(&self) -> DocumentFormat;
}

/// Renderer for the given format.
#[must_use]
pub fn create_renderer(format: DocumentFormat) -> Box<dyn DocumentRenderer> {
    match format {
        DocumentFormat::Rst => Box::new(RstRenderer::new()),
        DocumentFormat::Markdown => Box::new(MarkdownRenderer::new()),
    }
}
