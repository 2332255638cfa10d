//! Repository definition model
//!
//! The declarative description of a release history: an explicitly ordered
//! sequence of versions, each owning its commits and its per-convention
//! changelog section groupings. This model is the single source of truth for
//! both the history simulator and the changelog projector; the only mutation
//! it ever sees after construction is the one-shot commit-identity backfill
//! performed during simulation.

use semver::Version;

use crate::convention::{format_change, ChangeKind, CommitConvention};
use crate::error::{Result, ScenarioError};
use crate::hvcs::HvcsClient;

/// One commit message rendered under each supported convention
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConventionMessages {
    angular: String,
    emoji: String,
    scipy: String,
}

impl ConventionMessages {
    pub fn new(
        angular: impl Into<String>,
        emoji: impl Into<String>,
        scipy: impl Into<String>,
    ) -> Self {
        ConventionMessages {
            angular: angular.into(),
            emoji: emoji.into(),
            scipy: scipy.into(),
        }
    }

    /// The same message under every convention (initial and merge commits)
    pub fn uniform(message: impl Into<String>) -> Self {
        let message = message.into();
        ConventionMessages {
            angular: message.clone(),
            emoji: message.clone(),
            scipy: message,
        }
    }

    /// Render a change intent under all three conventions at once
    pub fn change(kind: ChangeKind, text: &str) -> Self {
        ConventionMessages {
            angular: format_change(CommitConvention::Angular, kind, text),
            emoji: format_change(CommitConvention::Emoji, kind, text),
            scipy: format_change(CommitConvention::Scipy, kind, text),
        }
    }

    pub fn get(&self, convention: CommitConvention) -> &str {
        match convention {
            CommitConvention::Angular => &self.angular,
            CommitConvention::Emoji => &self.emoji,
            CommitConvention::Scipy => &self.scipy,
        }
    }
}

/// Remote merge/PR metadata embedded in a merge commit's message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeMetadata {
    pub branch: String,
    pub pr_number: u64,
}

/// A single commit of the definition.
///
/// Carries the message under every convention; once the simulator creates
/// the real commit, its identity is backfilled here exactly once. This is
/// the join point between the declarative model and the live repository.
#[derive(Debug, Clone)]
pub struct CommitRecord {
    messages: ConventionMessages,
    sha: Option<String>,
    merge: Option<MergeMetadata>,
}

impl CommitRecord {
    /// A change commit (feature or fix)
    pub fn change(kind: ChangeKind, text: &str) -> Self {
        CommitRecord {
            messages: ConventionMessages::change(kind, text),
            sha: None,
            merge: None,
        }
    }

    /// A commit whose message is identical under every convention
    pub fn uniform(message: impl Into<String>) -> Self {
        CommitRecord {
            messages: ConventionMessages::uniform(message),
            sha: None,
            merge: None,
        }
    }

    /// The merge commit for a pull/merge request, message per the host
    pub fn merge(hvcs: &dyn HvcsClient, pr_number: u64, branch: &str) -> Self {
        CommitRecord {
            messages: ConventionMessages::uniform(hvcs.merge_commit_message(pr_number, branch)),
            sha: None,
            merge: Some(MergeMetadata {
                branch: branch.to_string(),
                pr_number,
            }),
        }
    }

    pub fn message(&self, convention: CommitConvention) -> &str {
        self.messages.get(convention)
    }

    /// First line of the message, as rendered in changelogs
    pub fn subject(&self, convention: CommitConvention) -> &str {
        self.message(convention).lines().next().unwrap_or_default()
    }

    pub fn sha(&self) -> Option<&str> {
        self.sha.as_deref()
    }

    /// Backfill the realized commit identity. May happen exactly once.
    pub fn assign_sha(&mut self, sha: impl Into<String>) -> Result<()> {
        if self.sha.is_some() {
            return Err(ScenarioError::definition(
                "commit identity already assigned",
            ));
        }
        self.sha = Some(sha.into());
        Ok(())
    }

    pub fn is_merge(&self) -> bool {
        self.merge.is_some()
    }

    pub fn merge_metadata(&self) -> Option<&MergeMetadata> {
        self.merge.as_ref()
    }
}

/// A named changelog section with indices into the owning version's commits
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangelogSection {
    pub name: String,
    pub commits: Vec<usize>,
}

/// Ordered section lists, one per convention
#[derive(Debug, Clone, Default)]
pub struct SectionMap {
    angular: Vec<ChangelogSection>,
    emoji: Vec<ChangelogSection>,
    scipy: Vec<ChangelogSection>,
}

impl SectionMap {
    pub fn get(&self, convention: CommitConvention) -> &[ChangelogSection] {
        match convention {
            CommitConvention::Angular => &self.angular,
            CommitConvention::Emoji => &self.emoji,
            CommitConvention::Scipy => &self.scipy,
        }
    }

    fn push(&mut self, convention: CommitConvention, section: ChangelogSection) {
        match convention {
            CommitConvention::Angular => self.angular.push(section),
            CommitConvention::Emoji => self.emoji.push(section),
            CommitConvention::Scipy => self.scipy.push(section),
        }
    }
}

/// Branch choreography of one release step, consumed only by the simulator
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReleaseFlow {
    /// Commit and release on the default branch
    DefaultBranch,
    /// Commit and release on a feature/fix branch, creating it first if asked
    Branch { name: String, create: bool },
    /// Merge a branch back into the default branch (never fast-forward)
    Merge { source: String },
}

/// Everything one released version owns: flow, commits, section groupings
#[derive(Debug, Clone)]
pub struct VersionRecord {
    pub flow: ReleaseFlow,
    commits: Vec<CommitRecord>,
    sections: SectionMap,
}

impl VersionRecord {
    pub fn new(flow: ReleaseFlow, commits: Vec<CommitRecord>) -> Self {
        VersionRecord {
            flow,
            commits,
            sections: SectionMap::default(),
        }
    }

    /// Declare a changelog section for one convention. Sections render in
    /// declaration order.
    pub fn with_section(
        mut self,
        convention: CommitConvention,
        name: impl Into<String>,
        commits: &[usize],
    ) -> Self {
        self.sections.push(
            convention,
            ChangelogSection {
                name: name.into(),
                commits: commits.to_vec(),
            },
        );
        self
    }

    pub fn commits(&self) -> &[CommitRecord] {
        &self.commits
    }

    pub fn commits_mut(&mut self) -> &mut [CommitRecord] {
        &mut self.commits
    }

    pub fn sections(&self, convention: CommitConvention) -> &[ChangelogSection] {
        self.sections.get(convention)
    }

    /// Check section indices and the merge-commit slot invariant
    fn validate(&self, version: &Version) -> Result<()> {
        for convention in CommitConvention::ALL {
            for section in self.sections.get(convention) {
                for &index in &section.commits {
                    if index >= self.commits.len() {
                        return Err(ScenarioError::definition(format!(
                            "version {}: section '{}' references commit {} but only {} commits exist",
                            version,
                            section.name,
                            index,
                            self.commits.len()
                        )));
                    }
                }
            }
        }

        // A merge step carries exactly one commit: the merge record itself.
        match &self.flow {
            ReleaseFlow::Merge { .. } => {
                if self.commits.len() != 1 || !self.commits[0].is_merge() {
                    return Err(ScenarioError::definition(format!(
                        "version {}: a merge step must carry exactly the merge commit",
                        version
                    )));
                }
            }
            _ => {
                if self.commits.iter().any(CommitRecord::is_merge) {
                    return Err(ScenarioError::definition(format!(
                        "version {}: merge commit outside a merge step",
                        version
                    )));
                }
            }
        }

        Ok(())
    }
}

/// Ordered mapping from version to version record for one scenario run.
///
/// Ordering is explicit and significant: it is release order and (reversed)
/// changelog emission order. Versions must therefore be pushed in strictly
/// increasing semantic-version order.
#[derive(Debug, Clone, Default)]
pub struct RepositoryDefinition {
    releases: Vec<(Version, VersionRecord)>,
}

impl RepositoryDefinition {
    pub fn new() -> Self {
        RepositoryDefinition::default()
    }

    /// Append the next release. Fails on an unparsable version, a version
    /// not greater than the previous one, or an invalid record.
    pub fn push(&mut self, version: &str, record: VersionRecord) -> Result<()> {
        let version = Version::parse(version)
            .map_err(|e| ScenarioError::definition(format!("invalid version '{}': {}", version, e)))?;

        if let Some((last, _)) = self.releases.last() {
            if version <= *last {
                return Err(ScenarioError::definition(format!(
                    "version {} must be greater than {}",
                    version, last
                )));
            }
        }

        record.validate(&version)?;
        self.releases.push((version, record));
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.releases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.releases.is_empty()
    }

    pub fn releases(&self) -> &[(Version, VersionRecord)] {
        &self.releases
    }

    pub fn release_at(&self, index: usize) -> Option<(&Version, &VersionRecord)> {
        self.releases.get(index).map(|(v, r)| (v, r))
    }

    pub fn release_at_mut(&mut self, index: usize) -> Option<(&Version, &mut VersionRecord)> {
        self.releases.get_mut(index).map(|(v, r)| (&*v, r))
    }

    pub fn get(&self, version: &Version) -> Option<&VersionRecord> {
        self.releases
            .iter()
            .find(|(v, _)| v == version)
            .map(|(_, r)| r)
    }

    pub fn versions(&self) -> impl Iterator<Item = &Version> {
        self.releases.iter().map(|(v, _)| v)
    }

    pub fn version_strings(&self) -> Vec<String> {
        self.versions().map(Version::to_string).collect()
    }
}
