//! Format-independent document tree.
//!
//! Composition code builds a [`Document`] of nested [`Section`]s; a
//! renderer turns it into reStructuredText or Markdown.

/// One element of a section body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    /// Paragraph; consecutive text additions join with a newline
    Text(String),
    /// Bullet list item
    Fragment(String),
    /// Ends the current paragraph
    ParagraphBreak,
    /// Table of contents for the enclosing section, `max_depth` levels deep
    Toc { max_depth: usize },
    Table {
        headings: Vec<String>,
        rows: Vec<Vec<String>>,
    },
    /// Pre-formatted text emitted unchanged
    Raw(String),
    Section(Section),
}

/// A titled section.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Section {
    pub title: String,
    pub blocks: Vec<Block>,
}

impl Section {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            blocks: Vec::new(),
        }
    }

    /// Append text to the current paragraph, or start one.
    pub fn add_text(&mut self, text: impl Into<String>) {
        add_text(&mut self.blocks, text.into());
    }

    pub fn add_fragment(&mut self, text: impl Into<String>) {
        self.blocks.push(Block::Fragment(text.into()));
    }

    pub fn ensure_paragraph_break(&mut self) {
        if matches!(self.blocks.last(), Some(Block::Text(_))) {
            self.blocks.push(Block::ParagraphBreak);
        }
    }

    pub fn add_toc(&mut self, max_depth: usize) {
        self.blocks.push(Block::Toc { max_depth });
    }

    pub fn add_table(&mut self, headings: Vec<String>, rows: Vec<Vec<String>>) {
        self.blocks.push(Block::Table { headings, rows });
    }

    pub fn add_raw(&mut self, text: impl Into<String>) {
        self.blocks.push(Block::Raw(text.into()));
    }

    /// Append a finished subsection.
    pub fn push_section(&mut self, section: Section) {
        self.blocks.push(Block::Section(section));
    }

    /// Append an empty subsection and return it for filling.
    pub fn add_section(&mut self, title: impl Into<String>) -> &mut Section {
        self.blocks.push(Block::Section(Section::new(title)));
        match self.blocks.last_mut() {
            Some(Block::Section(section)) => section,
            _ => unreachable!("a section was just pushed"),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Direct subsections.
    pub fn subsections(&self) -> impl Iterator<Item = &Section> {
        self.blocks.iter().filter_map(|block| match block {
            Block::Section(section) => Some(section),
            _ => None,
        })
    }
}

fn add_text(blocks: &mut Vec<Block>, text: String) {
    if let Some(Block::Text(current)) = blocks.last_mut() {
        current.push('\n');
        current.push_str(&text);
    } else {
        blocks.push(Block::Text(text));
    }
}

/// A section that only materializes once something is put into it.
#[derive(Debug)]
pub struct LazySection {
    title: String,
    section: Option<Section>,
}

impl LazySection {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            section: None,
        }
    }

    /// The section, created on first use.
    pub fn get(&mut self) -> &mut Section {
        let title = &self.title;
        self.section.get_or_insert_with(|| Section::new(title.clone()))
    }

    /// The section if it was ever used.
    #[must_use]
    pub fn finish(self) -> Option<Section> {
        self.section
    }
}

/// A complete document: optional preamble and label, a title, and a body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    /// Raw text placed before everything else
    pub preamble: Option<String>,
    /// Cross-reference label of the document
    pub label: Option<String>,
    pub title: String,
    pub blocks: Vec<Block>,
}

impl Document {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_preamble(mut self, preamble: impl Into<String>) -> Self {
        self.preamble = Some(preamble.into());
        self
    }

    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn add_text(&mut self, text: impl Into<String>) {
        add_text(&mut self.blocks, text.into());
    }

    pub fn ensure_paragraph_break(&mut self) {
        if matches!(self.blocks.last(), Some(Block::Text(_))) {
            self.blocks.push(Block::ParagraphBreak);
        }
    }

    pub fn add_toc(&mut self, max_depth: usize) {
        self.blocks.push(Block::Toc { max_depth });
    }

    pub fn add_raw(&mut self, text: impl Into<String>) {
        self.blocks.push(Block::Raw(text.into()));
    }

    pub fn push_section(&mut self, section: Section) {
        self.blocks.push(Block::Section(section));
    }

    /// Top-level sections.
    pub fn sections(&self) -> impl Iterator<Item = &Section> {
        self.blocks.iter().filter_map(|block| match block {
            Block::Section(section) => Some(section),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_joins_paragraph() {
        let mut section = Section::new("S");
        section.add_text("one");
        section.add_text("two");
        section.ensure_paragraph_break();
        section.ensure_paragraph_break();
        section.add_text("three");
        assert_eq!(
            section.blocks,
            vec![
                Block::Text("one\ntwo".into()),
                Block::ParagraphBreak,
                Block::Text("three".into()),
            ]
        );
    }

    #[test]
    fn test_lazy_section() {
        let unused = LazySection::new("Unused");
        assert!(unused.finish().is_none());

        let mut used = LazySection::new("Used");
        used.get().add_fragment("item");
        used.get().add_fragment("other");
        let section = used.finish().unwrap();
        assert_eq!(section.title, "Used");
        assert_eq!(section.blocks.len(), 2);
    }

    #[test]
    fn test_add_section_returns_child() {
        let mut parent = Section::new("Parent");
        parent.add_section("Child").add_fragment("x");
        let child = parent.subsections().next().unwrap();
        assert_eq!(child.title, "Child");
        assert_eq!(child.blocks, vec![Block::Fragment("x".into())]);
    }
}
