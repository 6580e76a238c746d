//! reStructuredText output.

use super::document::{Block, Document};
use super::table::render_rst_table;
use super::{DocumentFormat, DocumentRenderer};
use unicode_width::UnicodeWidthStr;

/// Section underline characters, outermost first.
const UNDERLINES: &[char] = &[
    '=', '-', '~', '^', '.', '*', '+', ':', '`', '\'', '"', '_', '#',
];

fn underline(depth: usize, title: &str) -> String {
    let ch = UNDERLINES[depth.min(UNDERLINES.len() - 1)];
    std::iter::repeat(ch).take(title.width().max(1)).collect()
}

/// `- item`, with continuation lines indented to the item text.
fn bullet(text: &str) -> String {
    let mut out = String::new();
    for (index, line) in text.lines().enumerate() {
        if index == 0 {
            out.push_str("- ");
            out.push_str(line);
        } else {
            out.push('\n');
            if !line.is_empty() {
                out.push_str("  ");
                out.push_str(line);
            }
        }
    }
    if out.is_empty() {
        out.push('-');
    }
    out
}

/// Renders [`Document`]s as reStructuredText.
#[derive(Debug, Clone, Copy, Default)]
pub struct RstRenderer;

impl RstRenderer {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    fn render_blocks(&self, blocks: &[Block], depth: usize, chunks: &mut Vec<String>) {
        let mut in_list = false;
        for block in blocks {
            match block {
                Block::Fragment(text) => {
                    let item = bullet(text);
                    let open_list = if in_list { chunks.last_mut() } else { None };
                    if let Some(list) = open_list {
                        list.push('\n');
                        list.push_str(&item);
                    } else {
                        chunks.push(item);
                        in_list = true;
                    }
                    continue;
                }
                Block::Text(text) => chunks.push(text.trim_end().to_string()),
                Block::ParagraphBreak => {}
                Block::Toc { max_depth } => chunks.push(format!(
                    ".. contents::\n  :local:\n  :depth: {max_depth}"
                )),
                Block::Table { headings, rows } => chunks.push(render_rst_table(headings, rows)),
                Block::Raw(text) => chunks.push(text.trim_end_matches('\n').to_string()),
                Block::Section(section) => {
                    chunks.push(format!(
                        "{}\n{}",
                        section.title,
                        underline(depth, &section.title)
                    ));
                    self.render_blocks(&section.blocks, depth + 1, chunks);
                }
            }
            in_list = false;
        }
    }
}

impl DocumentRenderer for RstRenderer {
    fn render(&self, document: &Document) -> String {
        let mut chunks = Vec::new();
        if let Some(preamble) = &document.preamble {
            chunks.push(preamble.trim_end_matches('\n').to_string());
        }
        if let Some(label) = &document.label {
            chunks.push(format!(".. _{label}:"));
        }
        let rule = underline(0, &document.title);
        chunks.push(format!("{rule}\n{}\n{rule}", document.title));
        self.render_blocks(&document.blocks, 0, &mut chunks);

        let mut out = chunks
            .into_iter()
            .filter(|chunk| !chunk.is_empty())
            .collect::<Vec<_>>()
            .join("\n\n");
        out.push('\n');
        out
    }

    fn format(&self) -> DocumentFormat {
        DocumentFormat::Rst
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::document::Section;

    #[test]
    fn test_render_document() {
        let mut document = Document::new("Demo Release Notes").with_label("demo");
        document.add_text("Intro.");
        document.add_toc(2);
        let mut release = Section::new("v1.0.0");
        release.add_fragment("first");
        release.add_fragment("second\nline");
        release.add_section("Bugfixes").add_fragment("fix");
        document.push_section(release);

        let expected = "\
.. _demo:

==================
Demo Release Notes
==================

Intro.

.. contents::
  :local:
  :depth: 2

v1.0.0
======

- first
- second
  line

Bugfixes
--------

- fix
";
        assert_eq!(RstRenderer::new().render(&document), expected);
    }

    #[test]
    fn test_paragraphs_and_lists_are_separated() {
        let mut document = Document::new("T");
        document.add_text("a");
        document.ensure_paragraph_break();
        document.add_text("b");
        let rendered = RstRenderer::new().render(&document);
        assert_eq!(rendered, "=\nT\n=\n\na\n\nb\n");
    }

    #[test]
    fn test_deep_sections_reuse_last_underline() {
        assert_eq!(underline(0, "abc"), "===");
        assert_eq!(underline(3, "ab"), "^^");
        assert_eq!(underline(40, "a"), "#");
    }
}
