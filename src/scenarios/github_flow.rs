//! GitHub-Flow scenario with branch release channels
//!
//! A repository following the GitHub Flow branching strategy: work happens
//! on short-lived `fix/` and `feat/` branches that publish alpha prereleases,
//! and lands on the default branch through non-fast-forward merge commits
//! that publish the finalized releases.
//!
//! Release sequence: 1.0.0, 1.0.1-alpha.1, 1.0.1-alpha.2, 1.0.1,
//! 1.1.0-alpha.1, 1.1.0.

use crate::config::{BranchRuleConfig, ScenarioConfig};
use crate::convention::{ChangeKind, CommitConvention, INITIAL_COMMIT_MESSAGE};
use crate::definition::{CommitRecord, ReleaseFlow, RepositoryDefinition, VersionRecord};
use crate::error::Result;
use crate::hvcs::HvcsClient;
use crate::scenario::{ScenarioBuilder, ScenarioOutcome};

/// Scenario kind, used as the cache key component
pub const SCENARIO_KIND: &str = "github-flow";

pub const FIX_BRANCH_1: &str = "fix/patch-1";
pub const FEAT_BRANCH_1: &str = "feat/feature-1";

const PATCH_PR_NUMBER: u64 = 25;
const FEATURE_PR_NUMBER: u64 = 26;

/// Configuration for this scenario: main/master release final versions,
/// feat/fix branches release alpha prereleases, zero versions are disabled
pub fn config() -> ScenarioConfig {
    ScenarioConfig {
        branches: vec![
            BranchRuleConfig {
                r#match: r"^(main|master)$".to_string(),
                prerelease: false,
                prerelease_token: None,
            },
            BranchRuleConfig {
                r#match: r"^(feat|fix)/.+".to_string(),
                prerelease: true,
                prerelease_token: Some("alpha".to_string()),
            },
        ],
        allow_zero_version: false,
        ..ScenarioConfig::default()
    }
}

/// The scenario's release history, commits and changelog sections
pub fn definition(hvcs: &dyn HvcsClient) -> Result<RepositoryDefinition> {
    let mut def = RepositoryDefinition::new();

    def.push(
        "1.0.0",
        VersionRecord::new(
            ReleaseFlow::DefaultBranch,
            vec![
                CommitRecord::uniform(INITIAL_COMMIT_MESSAGE),
                CommitRecord::change(ChangeKind::Feature, "add new feature"),
            ],
        )
        .with_section(CommitConvention::Angular, "Features", &[1])
        .with_section(CommitConvention::Emoji, ":sparkles:", &[1])
        .with_section(CommitConvention::Emoji, "Other", &[0])
        .with_section(CommitConvention::Scipy, "Feature", &[1]),
    )?;

    def.push(
        "1.0.1-alpha.1",
        VersionRecord::new(
            ReleaseFlow::Branch {
                name: FIX_BRANCH_1.to_string(),
                create: true,
            },
            vec![CommitRecord::change(ChangeKind::Fix, "correct some text")],
        )
        .with_section(CommitConvention::Angular, "Bug Fixes", &[0])
        .with_section(CommitConvention::Emoji, ":bug:", &[0])
        .with_section(CommitConvention::Scipy, "Fix", &[0]),
    )?;

    def.push(
        "1.0.1-alpha.2",
        VersionRecord::new(
            ReleaseFlow::Branch {
                name: FIX_BRANCH_1.to_string(),
                create: false,
            },
            vec![CommitRecord::change(ChangeKind::Fix, "adjust text to resolve")],
        )
        .with_section(CommitConvention::Angular, "Bug Fixes", &[0])
        .with_section(CommitConvention::Emoji, ":bug:", &[0])
        .with_section(CommitConvention::Scipy, "Fix", &[0]),
    )?;

    // the finalized patch lists no change sections of its own: its fixes
    // already shipped in the alphas it absorbs
    def.push(
        "1.0.1",
        VersionRecord::new(
            ReleaseFlow::Merge {
                source: FIX_BRANCH_1.to_string(),
            },
            vec![CommitRecord::merge(hvcs, PATCH_PR_NUMBER, FIX_BRANCH_1)],
        )
        .with_section(CommitConvention::Emoji, "Other", &[0]),
    )?;

    def.push(
        "1.1.0-alpha.1",
        VersionRecord::new(
            ReleaseFlow::Branch {
                name: FEAT_BRANCH_1.to_string(),
                create: true,
            },
            vec![CommitRecord::change(ChangeKind::Feature, "add some more text")],
        )
        .with_section(CommitConvention::Angular, "Features", &[0])
        .with_section(CommitConvention::Emoji, ":sparkles:", &[0])
        .with_section(CommitConvention::Scipy, "Feature", &[0]),
    )?;

    def.push(
        "1.1.0",
        VersionRecord::new(
            ReleaseFlow::Merge {
                source: FEAT_BRANCH_1.to_string(),
            },
            vec![CommitRecord::merge(hvcs, FEATURE_PR_NUMBER, FEAT_BRANCH_1)],
        )
        .with_section(CommitConvention::Emoji, "Other", &[0]),
    )?;

    Ok(def)
}

/// A ready-made builder for this scenario under one convention
pub fn builder(convention: CommitConvention) -> Result<ScenarioBuilder> {
    ScenarioBuilder::from_config(convention, config())
}

/// Build the whole scenario into `dest`
pub fn build_into(
    convention: CommitConvention,
    dest: &std::path::Path,
) -> Result<ScenarioOutcome> {
    let builder = builder(convention)?;
    let mut definition = definition(builder.hvcs())?;
    builder.build(&mut definition, dest)
}
