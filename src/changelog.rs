//! Changelog projection
//!
//! Renders the expected changelog for any prefix of a definition's version
//! sequence, purely from the declarative model. The simulator is never
//! consulted; the only realized data used is the backfilled commit identity,
//! which is what lets tests compare simulator output against projector
//! output byte for byte.

use std::collections::HashSet;

use semver::Version;

use crate::convention::CommitConvention;
use crate::definition::{RepositoryDefinition, VersionRecord};
use crate::error::{Result, ScenarioError};
use crate::hvcs::HvcsClient;

/// Supported changelog output formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangelogFormat {
    Markdown,
    RestructuredText,
}

impl ChangelogFormat {
    /// Both formats, in the order scenarios write them
    pub const ALL: [ChangelogFormat; 2] =
        [ChangelogFormat::Markdown, ChangelogFormat::RestructuredText];

    /// Conventional file name for this format
    pub fn file_name(&self) -> &'static str {
        match self {
            ChangelogFormat::Markdown => "CHANGELOG.md",
            ChangelogFormat::RestructuredText => "CHANGELOG.rst",
        }
    }
}

/// Render the changelog as of `as_of`, newest version first.
///
/// A prerelease is listed only while it is the newest release at its numeric
/// triple; once the finalized version at that triple is inside the rendered
/// range, its prereleases are absorbed into it and omitted.
pub fn render(
    definition: &RepositoryDefinition,
    convention: CommitConvention,
    as_of: &Version,
    format: ChangelogFormat,
    hvcs: &dyn HvcsClient,
) -> Result<String> {
    let mut included: Vec<&(Version, VersionRecord)> = definition
        .releases()
        .iter()
        .filter(|(version, _)| version <= as_of)
        .collect();
    included.sort_by(|a, b| b.0.cmp(&a.0));

    let finalized: HashSet<(u64, u64, u64)> = included
        .iter()
        .filter(|(version, _)| version.pre.is_empty())
        .map(|(version, _)| (version.major, version.minor, version.patch))
        .collect();
    included.retain(|(version, _)| {
        version.pre.is_empty()
            || !finalized.contains(&(version.major, version.minor, version.patch))
    });

    let mut out = String::new();
    push_title(&mut out, format);

    for (version, record) in included {
        push_version_heading(&mut out, format, version);

        for section in record.sections(convention) {
            push_section_heading(&mut out, format, &section.name);

            for &index in &section.commits {
                let commit = record.commits().get(index).ok_or_else(|| {
                    ScenarioError::definition(format!(
                        "version {}: section '{}' references missing commit {}",
                        version, section.name, index
                    ))
                })?;
                let sha = commit.sha().ok_or_else(|| {
                    ScenarioError::definition(format!(
                        "version {}: commit {} has no identity to render",
                        version, index
                    ))
                })?;
                let short = sha.get(..7).unwrap_or(sha);
                let subject = commit.subject(convention);
                let url = hvcs.commit_url(sha);

                match format {
                    ChangelogFormat::Markdown => {
                        out.push_str(&format!("* {} ([`{}`]({}))\n", subject, short, url));
                    }
                    ChangelogFormat::RestructuredText => {
                        out.push_str(&format!("* {} (`{} <{}>`_)\n", subject, short, url));
                    }
                }
            }
        }
    }

    Ok(out)
}

fn push_title(out: &mut String, format: ChangelogFormat) {
    match format {
        ChangelogFormat::Markdown => out.push_str("# CHANGELOG\n"),
        ChangelogFormat::RestructuredText => {
            out.push_str("=========\nCHANGELOG\n=========\n");
        }
    }
}

fn push_version_heading(out: &mut String, format: ChangelogFormat, version: &Version) {
    let heading = format!("v{}", version);
    out.push('\n');
    match format {
        ChangelogFormat::Markdown => {
            out.push_str(&format!("## {}\n", heading));
        }
        ChangelogFormat::RestructuredText => {
            out.push_str(&heading);
            out.push('\n');
            out.push_str(&"=".repeat(heading.chars().count()));
            out.push('\n');
        }
    }
}

fn push_section_heading(out: &mut String, format: ChangelogFormat, name: &str) {
    out.push('\n');
    match format {
        ChangelogFormat::Markdown => {
            out.push_str(&format!("### {}\n\n", name));
        }
        ChangelogFormat::RestructuredText => {
            out.push_str(name);
            out.push('\n');
            out.push_str(&"-".repeat(name.chars().count()));
            out.push_str("\n\n");
        }
    }
}
