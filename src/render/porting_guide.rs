//! The porting guide of an Ansible major release.

use super::changelog::{
    add_section_content, append_added_collections, append_removed_collections,
    optimize_release_entry,
};
use super::document::{Document, LazySection};
use super::DocumentFormat;
use crate::aggregate::{Changelog, ChangelogEntry};
use crate::changelog::{title_case, ChangelogData};
use crate::error::Result;

const SECTIONS_BEFORE_REMOVALS: &[&str] = &["known_issues", "breaking_changes", "major_changes"];
const SECTIONS_AFTER_REMOVALS: &[&str] = &["removed_features", "deprecated_features"];

/// Lines of the ansible-core porting guide after its table of contents.
///
/// Returns `None` when the text has no `.. contents::` block followed by an
/// empty line.
#[must_use]
pub fn core_porting_guide_body(text: &str) -> Option<String> {
    let mut lines = text.lines().chain(std::iter::once(""));
    lines.find(|line| line.starts_with(".. contents::"))?;
    lines.find(|line| line.is_empty())?;
    let body: Vec<&str> = lines.collect();
    Some(body.join("\n"))
}

fn add_changelog_section(
    parent: &mut LazySection,
    name: &str,
    data: Option<&ChangelogData>,
    version: &str,
    prev_version: Option<&str>,
    section: &str,
) -> Result<()> {
    let Some(data) = data else {
        return Ok(());
    };
    let entries = data.collect(true, prev_version, Some(version))?;
    let Some(first) = entries.into_iter().next() else {
        return Ok(());
    };
    if first.has_no_changes(Some(&[section])) {
        return Ok(());
    }
    let entry = optimize_release_entry(first);
    if name.is_empty() {
        add_section_content(&entry, parent.get(), section);
    } else {
        add_section_content(&entry, parent.get().add_section(name), section);
    }
    Ok(())
}

fn append_porting_section(
    guide: &mut LazySection,
    changelog: &Changelog,
    entry: &ChangelogEntry,
    section: &str,
) -> Result<()> {
    let mut porting = LazySection::new(title_case(&section.replace('_', " ")));

    let prev = entry.prev_version.as_ref().map(ToString::to_string);
    add_changelog_section(
        &mut porting,
        "",
        Some(&changelog.ansible_changelog),
        &entry.version_str,
        prev.as_deref(),
        section,
    )?;
    add_changelog_section(
        &mut porting,
        "Ansible-core",
        changelog.core_collector.changelog(),
        &entry.core_version,
        entry.prev_core_version.as_deref(),
        section,
    )?;
    for change in entry.changed_collections.iter().filter(|c| !c.added) {
        add_changelog_section(
            &mut porting,
            &change.collection,
            changelog
                .collector(&change.collection)
                .and_then(|collector| collector.changelog()),
            &change.version,
            change.prev_version.as_deref(),
            section,
        )?;
    }

    if let Some(porting) = porting.finish() {
        guide.get().push_section(porting);
    }
    Ok(())
}

fn append_release(
    document: &mut Document,
    changelog: &Changelog,
    entry: &ChangelogEntry,
) -> Result<()> {
    let mut guide = LazySection::new(format!("Porting Guide for v{}", entry.version_str));

    if !entry.added_collections.is_empty() {
        append_added_collections(guide.get(), entry);
    }
    for section in SECTIONS_BEFORE_REMOVALS {
        append_porting_section(&mut guide, changelog, entry, section)?;
    }
    if !entry.removed_collections.is_empty() {
        append_removed_collections(guide.get(), entry);
    }
    for section in SECTIONS_AFTER_REMOVALS {
        append_porting_section(&mut guide, changelog, entry, section)?;
    }

    if let Some(guide) = guide.finish() {
        document.push_section(guide);
    }
    Ok(())
}

fn changelog_link(build_data_url: &str, major: u64) -> String {
    let url = format!(
        "{}/{major}/CHANGELOG-v{major}.md",
        build_data_url.trim_end_matches('/')
    );
    DocumentFormat::Rst.link(&format!("Ansible {major} Changelog"), &url)
}

/// Build the porting guide of an Ansible major release.
///
/// The ansible-core porting guide is included when the ansible-core
/// minor release differs from the one of the previous Ansible major
/// release. `build_data_url` is the base of the changelog link.
pub fn compose_porting_guide(changelog: &Changelog, build_data_url: &str) -> Result<Document> {
    let major = changelog.ansible_version.major();
    let (core_major, core_minor) = changelog.core_collector.latest().major_minor();
    let core_version = format!("{core_major}.{core_minor}");

    let mut document = Document::new(format!("Ansible {major} Porting Guide"))
        .with_preamble(format!(
            "..\n   THIS DOCUMENT IS AUTOMATICALLY GENERATED BY ANTSIBULL! PLEASE DO NOT EDIT MANUALLY! (YOU PROBABLY WANT TO EDIT porting_guide_core_{core_version}.rst)\n"
        ))
        .with_label(format!("porting_{major}_guide"));
    document.add_toc(2);

    // The earliest core release belongs to the previous major release
    // whenever the ancestor release is listed.
    let prev_core_version = if changelog.entries.iter().any(|entry| entry.is_ancestor) {
        let (prev_major, prev_minor) = changelog.core_collector.earliest().major_minor();
        format!("{prev_major}.{prev_minor}")
    } else {
        String::new()
    };

    let suggestion = format!(
        "We suggest you read this page along with the {} to understand what updates you may need to make.",
        changelog_link(build_data_url, major)
    );

    if core_version != prev_core_version {
        document.add_text(format!("Ansible {major} is based on Ansible-core {core_version}."));
        document.ensure_paragraph_break();
        document.add_text(suggestion);
        if let Some(core_guide) = changelog.core_collector.porting_guide() {
            match core_porting_guide_body(core_guide) {
                Some(body) if !body.trim().is_empty() => document.add_raw(body),
                Some(_) => {}
                None => tracing::warn!("cannot find TOC of ansible-core porting guide"),
            }
        }
    } else {
        let prev_major = major.saturating_sub(1);
        let prev_prev_major = major.saturating_sub(2);
        document.add_text(format!(
            "Ansible {major} is based on Ansible-core {core_version}, which is the same major release as Ansible {prev_major}.  Therefore, there is no section on ansible-core in this porting guide.  If you are upgrading from Ansible {prev_prev_major}, please first consult the Ansible {prev_major} porting guide before continuing with the Ansible {major} porting guide."
        ));
        document.ensure_paragraph_break();
        document.add_text(suggestion);
    }

    for entry in changelog.entries.iter().filter(|entry| !entry.is_ancestor) {
        append_release(&mut document, changelog, entry)?;
    }
    Ok(document)
}
