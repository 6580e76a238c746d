//! The combined changelog of an Ansible major release.

use super::document::{Document, LazySection, Section};
use super::DocumentFormat;
use crate::aggregate::{Changelog, ChangelogEntry};
use crate::changelog::{title_case, PluginDescription, ReleaseEntry, SectionContent, DEFAULT_SECTIONS};
use crate::error::Result;
use std::collections::{BTreeSet, HashSet};

/// Heading path under which an item is listed.
pub type ItemPath = Vec<String>;

/// One changelog's contribution to the notes of a release.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseSource {
    /// Subsection title; empty for the Ansible package itself
    pub name: String,
    /// Prepended to plugin and module names
    pub prefix: String,
    pub entry: ReleaseEntry,
}

impl ReleaseSource {
    pub fn new(name: impl Into<String>, prefix: impl Into<String>, entry: ReleaseEntry) -> Self {
        Self {
            name: name.into(),
            prefix: prefix.into(),
            entry,
        }
    }
}

fn dedup_by_name(items: Vec<PluginDescription>) -> Vec<PluginDescription> {
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(item.name.clone()))
        .collect()
}

/// Remove duplicates that appear when overlapping release ranges are
/// combined.
///
/// Modules, plugins and objects keep the first entry of every name. List
/// sections are deduplicated and sorted; prose sections are kept as is.
#[must_use]
pub fn optimize_release_entry(mut entry: ReleaseEntry) -> ReleaseEntry {
    entry.modules = dedup_by_name(std::mem::take(&mut entry.modules));
    for plugins in entry.plugins.values_mut() {
        *plugins = dedup_by_name(std::mem::take(plugins));
    }
    for objects in entry.objects.values_mut() {
        *objects = dedup_by_name(std::mem::take(objects));
    }
    for content in entry.changes.values_mut() {
        if let SectionContent::Items(items) = content {
            let unique: BTreeSet<String> = std::mem::take(items).into_iter().collect();
            *items = unique.into_iter().collect();
        }
    }
    entry
}

fn common_start(a: &[String], b: &[String]) -> usize {
    a.iter().zip(b).take_while(|(x, y)| x == y).count()
}

fn close_top(stack: &mut Vec<Section>, root: &mut Section) {
    if let Some(section) = stack.pop() {
        match stack.last_mut() {
            Some(parent) => parent.push_section(section),
            None => root.push_section(section),
        }
    }
}

/// List `name - description` items under nested headings.
///
/// Items are sorted by heading path, then name. A heading is only opened
/// where an item's path diverges from the previous item's path.
pub fn dump_items(root: &mut Section, mut items: Vec<(ItemPath, String, String)>) {
    items.sort();
    let mut last_path: ItemPath = Vec::new();
    let mut stack: Vec<Section> = Vec::new();

    for (path, name, description) in items {
        if path != last_path {
            let common = common_start(&last_path, &path);
            while stack.len() > common {
                close_top(&mut stack, root);
            }
            while stack.len() < path.len() {
                stack.push(Section::new(path[stack.len()].clone()));
            }
            last_path = path;
        }
        let target = match stack.last_mut() {
            Some(section) => section,
            None => &mut *root,
        };
        target.add_fragment(format!("{name} - {description}"));
    }

    while !stack.is_empty() {
        close_top(&mut stack, root);
    }
}

fn description(plugin: &PluginDescription) -> String {
    plugin.description.clone().unwrap_or_default()
}

pub(crate) fn add_plugins(section: &mut Section, sources: &[ReleaseSource]) {
    let mut items = Vec::new();
    for source in sources {
        for (plugin_type, plugins) in &source.entry.plugins {
            for plugin in plugins {
                items.push((
                    vec!["New Plugins".to_string(), title_case(plugin_type)],
                    format!("{}{}", source.prefix, plugin.name),
                    description(plugin),
                ));
            }
        }
    }
    dump_items(section, items);
}

/// Namespace path of a module, title-cased; at most two levels.
fn module_namespace(module: &PluginDescription) -> Vec<String> {
    let namespace = module.namespace.as_deref().unwrap_or_default();
    // Old changelog tooling recorded the full Python package path.
    if namespace.is_empty() || namespace.starts_with(".ansible.collections.ansible_collections.") {
        return Vec::new();
    }
    namespace
        .trim_matches('.')
        .splitn(2, '.')
        .filter(|part| !part.is_empty())
        .map(|part| title_case(&part.replace('_', " ")))
        .collect()
}

/// With `namespaces`, modules are grouped by their namespace below the
/// source's heading.
pub(crate) fn add_modules(section: &mut Section, sources: &[ReleaseSource], namespaces: bool) {
    let mut items = Vec::new();
    for source in sources {
        for module in &source.entry.modules {
            let mut path = vec!["New Modules".to_string()];
            if !source.name.is_empty() {
                path.push(source.name.clone());
            }
            if namespaces {
                path.extend(module_namespace(module));
            }
            items.push((
                path,
                format!("{}{}", source.prefix, module.name),
                description(module),
            ));
        }
    }
    dump_items(section, items);
}

pub(crate) fn add_objects(section: &mut Section, sources: &[ReleaseSource]) {
    let mut items = Vec::new();
    for source in sources {
        for (object_type, objects) in &source.entry.objects {
            for object in objects {
                items.push((
                    vec![format!("New {}s", title_case(object_type))],
                    format!("{}{}", source.prefix, object.name),
                    description(object),
                ));
            }
        }
    }
    dump_items(section, items);
}

/// Add the content of one changelog section.
pub(crate) fn add_section_content(entry: &ReleaseEntry, section: &mut Section, name: &str) {
    match entry.changes.get(name) {
        Some(SectionContent::Prose(text)) => section.add_text(text.clone()),
        Some(SectionContent::Items(items)) => {
            for item in items {
                section.add_fragment(item.clone());
            }
        }
        None => {}
    }
}

fn summary_text(content: &SectionContent) -> String {
    match content {
        SectionContent::Prose(text) => text.clone(),
        SectionContent::Items(items) => items.join("\n"),
    }
}

fn append_ansible_changes(
    section: &mut Section,
    changelog: &Changelog,
    entry: &ChangelogEntry,
) -> Result<Vec<ReleaseSource>> {
    let ansible = &changelog.ansible_changelog;
    let prev = entry.prev_version.as_ref().map(ToString::to_string);
    let entries = ansible.collect(true, prev.as_deref(), Some(&entry.version_str))?;
    let Some(first) = entries.into_iter().next() else {
        return Ok(Vec::new());
    };

    let mut release = optimize_release_entry(first);
    if let Some(summary) = release.changes.shift_remove(&ansible.config().prelude_name) {
        if !summary.is_empty() {
            section
                .add_section("Release Summary")
                .add_text(summary_text(&summary));
        }
    }
    if release.is_empty() {
        return Ok(Vec::new());
    }
    Ok(vec![ReleaseSource::new("", "", release)])
}

pub(crate) fn append_removed_collections(section: &mut Section, entry: &ChangelogEntry) {
    if entry.removed_collections.is_empty() {
        return;
    }
    let removed = section.add_section("Removed Collections");
    for collection in &entry.removed_collections {
        removed.add_fragment(format!(
            "{} (previously included version: {})",
            collection.collection, collection.version
        ));
    }
}

pub(crate) fn append_added_collections(section: &mut Section, entry: &ChangelogEntry) {
    if entry.added_collections.is_empty() {
        return;
    }
    let added = section.add_section("Added Collections");
    for collection in &entry.added_collections {
        added.add_fragment(format!(
            "{} (version {})",
            collection.collection, collection.version
        ));
    }
}

fn append_unchanged_collections(section: &mut Section, entry: &ChangelogEntry) {
    if entry.unchanged_collections.is_empty() {
        return;
    }
    let unchanged = section.add_section("Unchanged Collections");
    for collection in &entry.unchanged_collections {
        unchanged.add_fragment(format!(
            "{} (still version {})",
            collection.collection, collection.version
        ));
    }
}

fn append_core_changes(
    section: &mut Section,
    changelog: &Changelog,
    entry: &ChangelogEntry,
) -> Result<Vec<ReleaseSource>> {
    let core_section = section.add_section("Ansible-core");
    core_section.add_text(format!(
        "Ansible {} contains ansible-core version {}.",
        entry.version, entry.core_version
    ));
    if let Some(prev_core) = &entry.prev_core_version {
        if *prev_core == entry.core_version {
            core_section
                .add_text("This is the same version of ansible-core as in the previous Ansible release.");
            return Ok(Vec::new());
        }
        core_section.add_text(format!(
            "This is a newer version than version {prev_core} contained in the previous Ansible release."
        ));
    }

    let Some(core) = changelog.core_collector.changelog() else {
        return Ok(Vec::new());
    };
    core_section.ensure_paragraph_break();

    let entries = core.collect(
        true,
        entry.prev_core_version.as_deref(),
        Some(&entry.core_version),
    )?;
    let Some(first) = entries.into_iter().next() else {
        core_section.add_text("Ansible-core did not have a changelog in this version.");
        return Ok(Vec::new());
    };
    if first.is_empty() {
        core_section.add_text("There are no changes recorded in the changelog.");
        return Ok(Vec::new());
    }
    core_section.add_text("The changes are reported in the combined changelog below.");
    Ok(vec![ReleaseSource::new(
        "Ansible-core",
        "ansible.builtin.",
        optimize_release_entry(first),
    )])
}

fn append_collection_changes(
    section: &mut Section,
    changelog: &Changelog,
    entry: &ChangelogEntry,
    is_last: bool,
    format: DocumentFormat,
) -> Result<Vec<ReleaseSource>> {
    let mut sources = Vec::new();
    if entry.changed_collections.is_empty() {
        return Ok(sources);
    }

    let title = if is_last {
        "Included Collections"
    } else {
        "Changed Collections"
    };
    let table_section = section.add_section(title);
    table_section
        .add_text("If not mentioned explicitly, the changes are reported in the combined changelog below.");
    table_section.ensure_paragraph_break();

    let with_prev = entry.prev_version.is_some();
    let mut headings = vec!["Collection".to_string()];
    if let Some(prev) = &entry.prev_version {
        headings.push(format!("Ansible {prev}"));
    }
    headings.push(format!("Ansible {}", entry.version_str));
    headings.push("Notes".to_string());

    let mut rows = Vec::with_capacity(entry.changed_collections.len());
    for change in &entry.changed_collections {
        let collector_changelog = changelog
            .collector(&change.collection)
            .and_then(|collector| collector.changelog());

        let note = if change.added {
            "The collection was added to Ansible".to_string()
        } else if let Some(data) = collector_changelog {
            let entries = data.collect(true, change.prev_version.as_deref(), Some(&change.version))?;
            match entries.into_iter().next() {
                None => "The collection did not have a changelog in this version.".to_string(),
                Some(first) if first.is_empty() => {
                    "There are no changes recorded in the changelog.".to_string()
                }
                Some(first) => {
                    sources.push(ReleaseSource::new(
                        change.collection.clone(),
                        format!("{}.", change.collection),
                        optimize_release_entry(first),
                    ));
                    String::new()
                }
            }
        } else if let Some(url) = changelog.collection_metadata.changelog_url(&change.collection) {
            format!(
                "You can find the collection's changelog at {}.",
                format.link(url, url)
            )
        } else {
            "Unfortunately, this collection does not provide changelog data in a format that can be processed by the changelog generator.".to_string()
        };

        let mut row = vec![change.collection.clone()];
        if with_prev {
            row.push(change.prev_version.clone().unwrap_or_default());
        }
        row.push(change.version.clone());
        row.push(note);
        rows.push(row);
    }
    table_section.add_table(headings, rows);
    Ok(sources)
}

fn append_release(
    document: &mut Document,
    changelog: &Changelog,
    entry: &ChangelogEntry,
    is_last: bool,
    format: DocumentFormat,
) -> Result<()> {
    let mut section = Section::new(format!("v{}", entry.version_str));
    section.add_toc(2);

    let mut sources = append_ansible_changes(&mut section, changelog, entry)?;
    append_removed_collections(&mut section, entry);
    append_added_collections(&mut section, entry);
    sources.extend(append_core_changes(&mut section, changelog, entry)?);
    sources.extend(append_collection_changes(
        &mut section,
        changelog,
        entry,
        is_last,
        format,
    )?);

    for &(section_name, section_title) in DEFAULT_SECTIONS {
        let mut changes = LazySection::new(section_title);
        for source in &sources {
            if source.entry.has_no_changes(Some(&[section_name])) {
                continue;
            }
            if source.name.is_empty() {
                add_section_content(&source.entry, changes.get(), section_name);
            } else {
                let subsection = changes.get().add_section(source.name.clone());
                add_section_content(&source.entry, subsection, section_name);
            }
        }
        if let Some(changes) = changes.finish() {
            section.push_section(changes);
        }
    }

    add_plugins(&mut section, &sources);
    add_modules(&mut section, &sources, true);
    add_objects(&mut section, &sources);
    append_unchanged_collections(&mut section, entry);

    document.push_section(section);
    Ok(())
}

/// Build the changelog document of an Ansible major release.
///
/// Releases are listed newest first; the ancestor release is omitted.
pub fn compose_changelog(changelog: &Changelog, format: DocumentFormat) -> Result<Document> {
    let mut document = Document::new(format!(
        "Ansible {} Release Notes",
        changelog.ansible_version.major()
    ));
    if let Some(ancestor) = &changelog.ansible_ancestor_version {
        document.add_text(format!(
            "This changelog describes changes since Ansible {ancestor}."
        ));
    }
    document.add_toc(2);

    let entries: Vec<&ChangelogEntry> = changelog
        .entries
        .iter()
        .filter(|entry| !entry.is_ancestor)
        .collect();
    for (index, entry) in entries.iter().enumerate() {
        append_release(
            &mut document,
            changelog,
            entry,
            index + 1 == entries.len(),
            format,
        )?;
    }
    Ok(document)
}
