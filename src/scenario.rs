//! Scenario orchestration
//!
//! Drives realization and documentation in lockstep: for every version in
//! the definition, run the simulator's transitions, then render and write
//! both expected changelogs with `as_of` set to that version, then tag the
//! release. Any divergence between the two paths surfaces as a file
//! mismatch in the consuming test instead of a silent modeling bug.

use std::fs;
use std::path::{Path, PathBuf};

use crate::changelog::{self, ChangelogFormat};
use crate::config::ScenarioConfig;
use crate::convention::CommitConvention;
use crate::definition::RepositoryDefinition;
use crate::domain::channel::ReleaseChannelPolicy;
use crate::domain::tag::TagPattern;
use crate::error::{Result, ScenarioError};
use crate::git::{Git2Repository, VcsRepository};
use crate::hvcs::HvcsClient;
use crate::simulator::HistorySimulator;

/// A finished scenario: realized repository plus its artifacts
#[derive(Debug)]
pub struct ScenarioOutcome {
    pub repo_dir: PathBuf,
    /// Tag names in creation order
    pub tags: Vec<String>,
    pub changelog_md: PathBuf,
    pub changelog_rst: PathBuf,
}

/// Builds scenarios from explicitly supplied collaborators
pub struct ScenarioBuilder {
    convention: CommitConvention,
    policy: ReleaseChannelPolicy,
    hvcs: Box<dyn HvcsClient>,
    tag_pattern: TagPattern,
    config: ScenarioConfig,
    extra_config: Option<toml::Table>,
}

impl ScenarioBuilder {
    pub fn new(
        convention: CommitConvention,
        policy: ReleaseChannelPolicy,
        hvcs: Box<dyn HvcsClient>,
        tag_pattern: TagPattern,
        config: ScenarioConfig,
    ) -> Self {
        ScenarioBuilder {
            convention,
            policy,
            hvcs,
            tag_pattern,
            config,
            extra_config: None,
        }
    }

    /// Materialize every collaborator from a configuration tree
    pub fn from_config(convention: CommitConvention, config: ScenarioConfig) -> Result<Self> {
        let policy = config.policy()?;
        let hvcs = config.hvcs_client()?;
        let tag_pattern = config.tag_pattern()?;
        Ok(ScenarioBuilder::new(convention, policy, hvcs, tag_pattern, config))
    }

    /// Extra nested configuration merged into the project's config file
    pub fn with_extra_config(mut self, extra: toml::Table) -> Self {
        self.extra_config = Some(extra);
        self
    }

    pub fn convention(&self) -> CommitConvention {
        self.convention
    }

    pub fn config(&self) -> &ScenarioConfig {
        &self.config
    }

    /// The host client the scenario was built against
    pub fn hvcs(&self) -> &dyn HvcsClient {
        self.hvcs.as_ref()
    }

    pub fn tag_pattern(&self) -> &TagPattern {
        &self.tag_pattern
    }

    /// Scaffold `dest`, write the merged config file, initialize a git
    /// repository and replay the whole definition into it.
    pub fn build(
        &self,
        definition: &mut RepositoryDefinition,
        dest: &Path,
    ) -> Result<ScenarioOutcome> {
        fs::create_dir_all(dest)?;
        self.config.write(dest, self.extra_config.as_ref())?;

        let vcs = Git2Repository::init(dest, &self.config.default_branch)?;
        self.run(&vcs, definition, dest)
    }

    /// Replay the definition against an already prepared backend, writing
    /// changelog files into `dest`. Exposed separately so tests can drive a
    /// mock backend.
    pub fn run(
        &self,
        vcs: &dyn VcsRepository,
        definition: &mut RepositoryDefinition,
        dest: &Path,
    ) -> Result<ScenarioOutcome> {
        self.check_zero_versions(definition)?;

        let simulator = HistorySimulator::new(
            vcs,
            self.convention,
            &self.policy,
            &self.tag_pattern,
            &self.config.default_branch,
        );

        let mut tags = Vec::with_capacity(definition.len());

        for index in 0..definition.len() {
            let version = {
                let (version, record) = definition
                    .release_at_mut(index)
                    .ok_or_else(|| ScenarioError::definition("release index out of range"))?;
                let version = version.clone();
                simulator.run_version_step(&version, record)?;
                version
            };

            for format in ChangelogFormat::ALL {
                let text =
                    changelog::render(definition, self.convention, &version, format, self.hvcs())?;
                fs::write(dest.join(format.file_name()), text)?;
            }

            tags.push(simulator.tag_release(&version)?);
        }

        Ok(ScenarioOutcome {
            repo_dir: dest.to_path_buf(),
            tags,
            changelog_md: dest.join(ChangelogFormat::Markdown.file_name()),
            changelog_rst: dest.join(ChangelogFormat::RestructuredText.file_name()),
        })
    }

    fn check_zero_versions(&self, definition: &RepositoryDefinition) -> Result<()> {
        if self.config.allow_zero_version {
            return Ok(());
        }
        if let Some(version) = definition.versions().find(|v| v.major == 0) {
            return Err(ScenarioError::definition(format!(
                "zero versions are disabled but the definition contains {}",
                version
            )));
        }
        Ok(())
    }
}
