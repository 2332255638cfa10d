//! Branch release-channel policy
//!
//! An ordered rule list decides, per branch name, whether tagged releases on
//! that branch are prereleases and which prerelease token they carry. The
//! first matching rule governs; a branch with no matching rule cannot
//! receive a tagged release.

use regex::Regex;

use crate::error::{Result, ScenarioError};

/// One release-channel rule: branch-name pattern plus channel attributes
#[derive(Debug, Clone)]
pub struct BranchRule {
    pattern: Regex,
    pub prerelease: bool,
    pub prerelease_token: Option<String>,
}

impl BranchRule {
    /// Compile a rule from its pattern; prerelease rules carry a token
    pub fn new(pattern: &str, prerelease: bool, prerelease_token: Option<&str>) -> Result<Self> {
        let pattern = Regex::new(pattern)
            .map_err(|e| ScenarioError::config(format!("invalid branch pattern: {}", e)))?;

        if prerelease && prerelease_token.is_none() {
            return Err(ScenarioError::config(format!(
                "prerelease rule '{}' is missing a prerelease token",
                pattern.as_str()
            )));
        }

        Ok(BranchRule {
            pattern,
            prerelease,
            prerelease_token: prerelease_token.map(str::to_string),
        })
    }

    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }

    pub fn matches(&self, branch: &str) -> bool {
        self.pattern.is_match(branch)
    }
}

/// Resolved channel for a branch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelResolution {
    pub prerelease: bool,
    pub token: Option<String>,
}

/// Ordered, first-match-wins release-channel rule set
#[derive(Debug, Clone, Default)]
pub struct ReleaseChannelPolicy {
    rules: Vec<BranchRule>,
}

impl ReleaseChannelPolicy {
    pub fn new(rules: Vec<BranchRule>) -> Self {
        ReleaseChannelPolicy { rules }
    }

    /// The GitHub-Flow rule set: main/master release, feat/fix prerelease "alpha"
    pub fn github_flow() -> Result<Self> {
        Ok(ReleaseChannelPolicy::new(vec![
            BranchRule::new(r"^(main|master)$", false, None)?,
            BranchRule::new(r"^(feat|fix)/.+", true, Some("alpha"))?,
        ]))
    }

    pub fn rules(&self) -> &[BranchRule] {
        &self.rules
    }

    /// Resolve the channel governing a branch.
    ///
    /// Rules are tried in declaration order; the first match wins. A branch
    /// with no applicable rule fails with
    /// [ScenarioError::NoMatchingBranchRule].
    pub fn resolve(&self, branch: &str) -> Result<ChannelResolution> {
        self.rules
            .iter()
            .find(|rule| rule.matches(branch))
            .map(|rule| ChannelResolution {
                prerelease: rule.prerelease,
                token: rule.prerelease_token.clone(),
            })
            .ok_or_else(|| ScenarioError::NoMatchingBranchRule(branch.to_string()))
    }
}
