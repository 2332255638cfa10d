//! Git history simulator
//!
//! Replays a repository definition against a live repository, one release
//! step at a time: enter the step's branch, realize its change commits or
//! its single merge commit, and (after the caller has written the expected
//! changelogs) create the release commit and tag. Every created commit
//! identity is backfilled into the definition, which is how the declarative
//! model and the realized history stay joined.
//!
//! Transitions are strictly sequential; any backend failure aborts the
//! whole scenario build, since a partially built history must never be
//! cached as complete.

use std::fs::OpenOptions;
use std::io::Write;

use semver::Version;

use crate::convention::CommitConvention;
use crate::definition::{ReleaseFlow, VersionRecord};
use crate::domain::channel::{ChannelResolution, ReleaseChannelPolicy};
use crate::domain::prerelease::PrereleaseTag;
use crate::domain::tag::TagPattern;
use crate::error::{Result, ScenarioError};
use crate::git::VcsRepository;

/// File the simulator appends to so every change commit has real content
pub const CHANGE_FILE: &str = "file.txt";

/// Drives the version-control backend through one scenario's release steps
pub struct HistorySimulator<'a> {
    vcs: &'a dyn VcsRepository,
    convention: CommitConvention,
    policy: &'a ReleaseChannelPolicy,
    tag_pattern: &'a TagPattern,
    default_branch: &'a str,
}

impl<'a> HistorySimulator<'a> {
    pub fn new(
        vcs: &'a dyn VcsRepository,
        convention: CommitConvention,
        policy: &'a ReleaseChannelPolicy,
        tag_pattern: &'a TagPattern,
        default_branch: &'a str,
    ) -> Self {
        HistorySimulator {
            vcs,
            convention,
            policy,
            tag_pattern,
            default_branch,
        }
    }

    /// Realize one version's branch choreography and commits, backfilling
    /// each created identity into the record.
    pub fn run_version_step(&self, version: &Version, record: &mut VersionRecord) -> Result<()> {
        match record.flow.clone() {
            ReleaseFlow::DefaultBranch => {
                self.ensure_branch(version, self.default_branch)?;
                self.apply_change_commits(version, record)
            }
            ReleaseFlow::Branch { name, create } => {
                if create {
                    // branches fork from the default branch head
                    self.ensure_branch(version, self.default_branch)?;
                    self.vcs
                        .create_branch(&name)
                        .map_err(|e| self.step_failure(version, e))?;
                }
                self.ensure_branch(version, &name)?;
                self.apply_change_commits(version, record)
            }
            ReleaseFlow::Merge { source } => {
                self.ensure_branch(version, self.default_branch)?;
                let merge_record = record.commits_mut().first_mut().ok_or_else(|| {
                    ScenarioError::definition(format!("version {}: merge step has no commit", version))
                })?;
                let message = merge_record.message(self.convention).to_string();
                let sha = self
                    .vcs
                    .merge_no_ff(&source, &message)
                    .map_err(|e| self.step_failure(version, e))?;
                merge_record.assign_sha(sha)
            }
        }
    }

    /// Terminal transition of a release step: validate the branch's release
    /// channel against the version, create the release commit (staging the
    /// just-written changelogs) and tag it. Returns the tag name.
    pub fn tag_release(&self, version: &Version) -> Result<String> {
        let branch = self
            .vcs
            .current_branch()
            .map_err(|e| self.step_failure(version, e))?;
        let channel = self.policy.resolve(&branch)?;
        self.check_channel(version, &branch, &channel)?;

        self.vcs
            .commit_all(&version.to_string())
            .map_err(|e| self.step_failure(version, e))?;

        let tag_name = self.tag_pattern.format(version);
        self.vcs
            .create_tag(&tag_name)
            .map_err(|e| self.step_failure(version, e))?;
        Ok(tag_name)
    }

    fn ensure_branch(&self, version: &Version, branch: &str) -> Result<()> {
        let current = self
            .vcs
            .current_branch()
            .map_err(|e| self.step_failure(version, e))?;
        if current != branch {
            self.vcs
                .checkout(branch)
                .map_err(|e| self.step_failure(version, e))?;
        }
        Ok(())
    }

    fn apply_change_commits(&self, version: &Version, record: &mut VersionRecord) -> Result<()> {
        let workdir = self.vcs.workdir();

        for commit in record.commits_mut() {
            if commit.is_merge() {
                return Err(ScenarioError::definition(format!(
                    "version {}: merge commit outside a merge step",
                    version
                )));
            }

            if let Some(dir) = &workdir {
                let mut file = OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(dir.join(CHANGE_FILE))?;
                writeln!(file, "{}", commit.subject(self.convention))?;
            }

            let message = commit.message(self.convention).to_string();
            let sha = self
                .vcs
                .commit_all(&message)
                .map_err(|e| self.step_failure(version, e))?;
            commit.assign_sha(sha)?;
        }

        Ok(())
    }

    fn check_channel(
        &self,
        version: &Version,
        branch: &str,
        channel: &ChannelResolution,
    ) -> Result<()> {
        let prerelease = PrereleaseTag::of(version)?;

        if channel.prerelease {
            match (prerelease, channel.token.as_deref()) {
                (Some(tag), Some(token)) if tag.token == token => Ok(()),
                (found, token) => Err(ScenarioError::simulation(format!(
                    "release {} on branch '{}' must carry prerelease token '{}', found '{}'",
                    version,
                    branch,
                    token.unwrap_or("?"),
                    found.map(|t| t.to_string()).unwrap_or_default()
                ))),
            }
        } else if prerelease.is_some() {
            Err(ScenarioError::simulation(format!(
                "branch '{}' releases final versions but {} is a prerelease",
                branch, version
            )))
        } else {
            Ok(())
        }
    }

    fn step_failure(&self, version: &Version, err: ScenarioError) -> ScenarioError {
        match err {
            ScenarioError::NoMatchingBranchRule(_) | ScenarioError::Definition(_) => err,
            ScenarioError::Simulation(msg) => {
                ScenarioError::Simulation(format!("release {}: {}", version, msg))
            }
            other => ScenarioError::simulation(format!("release {}: {}", version, other)),
        }
    }
}
