//! Markdown output.
//!
//! Text is passed through unchanged. Every section gets an HTML anchor so
//! the generated tables of contents can link to it.

use super::document::{Block, Document, Section};
use super::table::render_md_table;
use super::{DocumentFormat, DocumentRenderer};
use std::collections::HashMap;

/// GitHub-style anchor slug: lowercase alphanumerics joined by dashes.
#[must_use]
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_dash = false;
    for ch in title.chars() {
        if ch.is_alphanumeric() || ch == '_' {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.extend(ch.to_lowercase());
        } else {
            pending_dash = true;
        }
    }
    if slug.is_empty() {
        slug.push_str("section");
    }
    slug
}

/// Unique anchors for all sections in document order.
fn assign_anchors(blocks: &[Block]) -> Vec<String> {
    fn walk(blocks: &[Block], seen: &mut HashMap<String, usize>, out: &mut Vec<String>) {
        for block in blocks {
            if let Block::Section(section) = block {
                let base = slugify(&section.title);
                let count = seen.entry(base.clone()).or_insert(0);
                let anchor = if *count == 0 {
                    base
                } else {
                    format!("{base}-{count}")
                };
                *count += 1;
                out.push(anchor);
                walk(&section.blocks, seen, out);
            }
        }
    }
    let mut seen = HashMap::new();
    let mut out = Vec::new();
    walk(blocks, &mut seen, &mut out);
    out
}

fn bullet(text: &str) -> String {
    let mut out = String::new();
    for (index, line) in text.lines().enumerate() {
        if index == 0 {
            out.push_str("* ");
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
        out.push('*');
    }
    out
}

/// Renders [`Document`]s as Markdown.
#[derive(Debug, Clone, Copy, Default)]
pub struct MarkdownRenderer;

struct RenderState {
    anchors: Vec<String>,
    /// Index of the next section in document order
    next: usize,
    chunks: Vec<String>,
}

impl MarkdownRenderer {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Nested link list of the sections in `blocks`, `max_depth` levels deep.
    fn toc(blocks: &[Block], first_anchor: usize, anchors: &[String], max_depth: usize) -> String {
        fn walk(
            sections: &mut dyn Iterator<Item = &Section>,
            level: usize,
            max_depth: usize,
            index: &mut usize,
            anchors: &[String],
            lines: &mut Vec<String>,
        ) {
            for section in sections {
                let anchor = anchors.get(*index).map_or("", String::as_str);
                *index += 1;
                if level < max_depth {
                    lines.push(format!(
                        "{}- [{}](#{anchor})",
                        "  ".repeat(level),
                        section.title
                    ));
                }
                let mut children = section.blocks.iter().filter_map(as_section);
                walk(&mut children, level + 1, max_depth, index, anchors, lines);
            }
        }

        let mut lines = Vec::new();
        let mut index = first_anchor;
        let mut sections = blocks.iter().filter_map(as_section);
        walk(&mut sections, 0, max_depth, &mut index, anchors, &mut lines);
        lines.join("\n")
    }

    fn render_blocks(&self, blocks: &[Block], depth: usize, state: &mut RenderState) {
        let mut in_list = false;
        for (position, block) in blocks.iter().enumerate() {
            match block {
                Block::Fragment(text) => {
                    let item = bullet(text);
                    let open_list = if in_list { state.chunks.last_mut() } else { None };
                    if let Some(list) = open_list {
                        list.push('\n');
                        list.push_str(&item);
                    } else {
                        state.chunks.push(item);
                        in_list = true;
                    }
                    continue;
                }
                Block::Text(text) => state.chunks.push(text.trim_end().to_string()),
                Block::ParagraphBreak => {}
                Block::Toc { max_depth } => {
                    let toc = Self::toc(&blocks[position + 1..], state.next, &state.anchors, *max_depth);
                    state.chunks.push(toc);
                }
                Block::Table { headings, rows } => {
                    state.chunks.push(render_md_table(headings, rows));
                }
                Block::Raw(text) => state.chunks.push(text.trim_end_matches('\n').to_string()),
                Block::Section(section) => {
                    let anchor = state.anchors.get(state.next).cloned().unwrap_or_default();
                    state.next += 1;
                    let level = "#".repeat((depth + 2).min(6));
                    state
                        .chunks
                        .push(format!("<a id=\"{anchor}\"></a>\n{level} {}", section.title));
                    self.render_blocks(&section.blocks, depth + 1, state);
                }
            }
            in_list = false;
        }
    }
}

fn as_section(block: &Block) -> Option<&Section> {
    match block {
        Block::Section(section) => Some(section),
        _ => None,
    }
}

impl DocumentRenderer for MarkdownRenderer {
    fn render(&self, document: &Document) -> String {
        let mut state = RenderState {
            anchors: assign_anchors(&document.blocks),
            next: 0,
            chunks: vec![format!("# {}", document.title)],
        };
        self.render_blocks(&document.blocks, 0, &mut state);

        let mut out = state
            .chunks
            .into_iter()
            .filter(|chunk| !chunk.is_empty())
            .collect::<Vec<_>>()
            .join("\n\n");
        out.push('\n');
        out
    }

    fn format(&self) -> DocumentFormat {
        DocumentFormat::Markdown
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("v9.1.0"), "v9-1-0");
        assert_eq!(slugify("Breaking Changes / Porting Guide"), "breaking-changes-porting-guide");
        assert_eq!(slugify("community.general"), "community-general");
        assert_eq!(slugify("!!"), "section");
    }

    #[test]
    fn test_render_with_toc() {
        let mut document = Document::new("Demo Release Notes");
        document.add_toc(2);
        let mut release = Section::new("v1.1.0");
        release.add_section("Bugfixes").add_fragment("fix");
        document.push_section(release);
        let mut older = Section::new("v1.0.0");
        older
            .add_section("Bugfixes")
            .add_section("Deep")
            .add_fragment("x");
        document.push_section(older);

        let expected = "\
# Demo Release Notes

- [v1.1.0](#v1-1-0)
  - [Bugfixes](#bugfixes)
- [v1.0.0](#v1-0-0)
  - [Bugfixes](#bugfixes-1)

<a id=\"v1-1-0\"></a>
## v1.1.0

<a id=\"bugfixes\"></a>
### Bugfixes

* fix

<a id=\"v1-0-0\"></a>
## v1.0.0

<a id=\"bugfixes-1\"></a>
### Bugfixes

<a id=\"deep\"></a>
#### Deep

* x
";
        assert_eq!(MarkdownRenderer::new().render(&document), expected);
    }
}
