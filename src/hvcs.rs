//! Hosted version-control system clients.
//!
//! A scenario needs two things from the hosting side: the merge-commit
//! message its web UI would write, and the hyperlink formats the changelog
//! resolves commit identities against. Both are host-specific, so they live
//! behind the [HvcsClient] trait; everything else stays host-agnostic.

use crate::error::{Result, ScenarioError};

/// Domain used by scenarios unless configured otherwise
pub const EXAMPLE_HVCS_DOMAIN: &str = "example.com";

/// Host-specific message and hyperlink formats
pub trait HvcsClient {
    /// Short client name, matching the configuration value (e.g. "github")
    fn name(&self) -> &'static str;

    /// The merge-commit message the host writes when merging a pull/merge
    /// request from `branch_name`
    fn merge_commit_message(&self, pr_number: u64, branch_name: &str) -> String;

    /// Hyperlink to a single commit
    fn commit_url(&self, sha: &str) -> String;

    /// Hyperlink to a pull/merge request
    fn pull_request_url(&self, pr_number: u64) -> String;
}

/// GitHub-style host
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitHub {
    pub domain: String,
    pub owner: String,
    pub repo: String,
}

impl GitHub {
    pub fn new(
        domain: impl Into<String>,
        owner: impl Into<String>,
        repo: impl Into<String>,
    ) -> Self {
        GitHub {
            domain: domain.into(),
            owner: owner.into(),
            repo: repo.into(),
        }
    }
}

impl HvcsClient for GitHub {
    fn name(&self) -> &'static str {
        "github"
    }

    fn merge_commit_message(&self, pr_number: u64, branch_name: &str) -> String {
        format!("Merge pull request #{} from {}", pr_number, branch_name)
    }

    fn commit_url(&self, sha: &str) -> String {
        format!(
            "https://{}/{}/{}/commit/{}",
            self.domain, self.owner, self.repo, sha
        )
    }

    fn pull_request_url(&self, pr_number: u64) -> String {
        format!(
            "https://{}/{}/{}/pull/{}",
            self.domain, self.owner, self.repo, pr_number
        )
    }
}

/// GitLab-style host
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitLab {
    pub domain: String,
    pub owner: String,
    pub repo: String,
}

impl GitLab {
    pub fn new(
        domain: impl Into<String>,
        owner: impl Into<String>,
        repo: impl Into<String>,
    ) -> Self {
        GitLab {
            domain: domain.into(),
            owner: owner.into(),
            repo: repo.into(),
        }
    }
}

impl HvcsClient for GitLab {
    fn name(&self) -> &'static str {
        "gitlab"
    }

    fn merge_commit_message(&self, pr_number: u64, branch_name: &str) -> String {
        format!(
            "Merge branch '{}'\n\nSee merge request !{}",
            branch_name, pr_number
        )
    }

    fn commit_url(&self, sha: &str) -> String {
        format!(
            "https://{}/{}/{}/-/commit/{}",
            self.domain, self.owner, self.repo, sha
        )
    }

    fn pull_request_url(&self, pr_number: u64) -> String {
        format!(
            "https://{}/{}/{}/-/merge_requests/{}",
            self.domain, self.owner, self.repo, pr_number
        )
    }
}

/// Resolve a host client by its configured name
pub fn hvcs_client(name: &str, domain: &str, owner: &str, repo: &str) -> Result<Box<dyn HvcsClient>> {
    match name.to_lowercase().as_str() {
        "github" => Ok(Box::new(GitHub::new(domain, owner, repo))),
        "gitlab" => Ok(Box::new(GitLab::new(domain, owner, repo))),
        other => Err(ScenarioError::config(format!(
            "unknown hvcs client '{}'",
            other
        ))),
    }
}
