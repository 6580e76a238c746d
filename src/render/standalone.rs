//! Release notes of a single changelog, one section per release.

use super::changelog::{
    add_modules, add_objects, add_plugins, add_section_content, ReleaseSource,
};
use super::document::{Document, Section};
use super::{create_renderer, DocumentFormat};
use crate::changelog::ChangelogData;
use crate::error::Result;

/// Render every release of `data`, newest first.
///
/// `prefix` is prepended to plugin and module names, usually the
/// collection name followed by a dot.
pub fn generate_standalone(
    data: &ChangelogData,
    prefix: &str,
    format: DocumentFormat,
) -> Result<String> {
    let config = data.config();
    let title = config.title.as_deref().unwrap_or("Project");
    let mut document = Document::new(format!("{title} Release Notes"));
    document.add_toc(2);

    if config.mention_ancestor {
        if let Some(ancestor) = data.document().ancestor() {
            document.add_text(format!(
                "This changelog describes changes after version {ancestor}."
            ));
        }
    }

    for entry in data.collect(false, None, None)? {
        let mut section = Section::new(format!("v{}", entry.version));
        for (name, title) in config.all_sections() {
            if entry.has_no_changes(Some(&[name])) {
                continue;
            }
            if config.is_prelude(name) {
                add_section_content(&entry, &mut section, name);
                section.ensure_paragraph_break();
            } else {
                add_section_content(&entry, section.add_section(title), name);
            }
        }

        let sources = [ReleaseSource::new("", prefix, entry)];
        add_plugins(&mut section, &sources);
        add_modules(&mut section, &sources, !config.flatmap);
        add_objects(&mut section, &sources);
        document.push_section(section);
    }

    Ok(create_renderer(format).render(&document))
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHANGELOG: &str = r"
ancestor: 0.9.0
releases:
  1.0.0:
    release_date: '2024-01-10'
    changes:
      release_summary: First stable release.
      bugfixes:
        - Fix the frobnicator.
    modules:
      - name: frob
        namespace: ''
        description: Frobnicate things
    plugins:
      lookup:
        - name: lines
          namespace: null
          description: Read lines
";

    #[test]
    fn test_generate_rst() {
        let data = ChangelogData::collection("acme.tools", CHANGELOG.as_bytes()).unwrap();
        let text = generate_standalone(&data, "acme.tools.", DocumentFormat::Rst).unwrap();
        assert!(text.starts_with(
            "========================\nacme.tools Release Notes\n========================\n"
        ));
        assert!(text.contains("This changelog describes changes after version 0.9.0."));
        assert!(text.contains("v1.0.0\n======\n\nFirst stable release."));
        assert!(text.contains("Bugfixes\n--------\n\n- Fix the frobnicator."));
        assert!(text.contains(
            "New Plugins\n-----------\n\nLookup\n~~~~~~\n\n- acme.tools.lines - Read lines"
        ));
        assert!(text.contains("New Modules\n-----------\n\n- acme.tools.frob - Frobnicate things"));
    }

    #[test]
    fn test_generate_markdown() {
        let data = ChangelogData::collection("acme.tools", CHANGELOG.as_bytes()).unwrap();
        let text = generate_standalone(&data, "acme.tools.", DocumentFormat::Markdown).unwrap();
        assert!(text.starts_with("# acme.tools Release Notes\n"));
        assert!(text.contains("* acme.tools.frob - Frobnicate things"));
    }
}
