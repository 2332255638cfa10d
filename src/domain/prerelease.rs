//! Pre-release component handling for semantic versions
//!
//! A prerelease component is a token plus an optional iteration number
//! ("alpha.2" has token "alpha" and iteration 2). Ordering of full versions
//! is left to the `semver` crate; this module only inspects the component.

use std::fmt;

use semver::Version;

use crate::error::{Result, ScenarioError};

/// Parsed prerelease component (token + optional iteration)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrereleaseTag {
    pub token: String,
    pub iteration: Option<u32>,
}

impl PrereleaseTag {
    pub fn new(token: impl Into<String>, iteration: Option<u32>) -> Self {
        PrereleaseTag {
            token: token.into(),
            iteration,
        }
    }

    /// Parse a prerelease string such as "alpha" or "alpha.2"
    pub fn parse(s: &str) -> Result<Self> {
        if s.is_empty() {
            return Err(ScenarioError::definition(
                "empty prerelease component".to_string(),
            ));
        }

        let mut parts = s.splitn(2, '.');
        let token = parts.next().unwrap_or_default();
        if token.is_empty() || !token.chars().all(|c| c.is_alphanumeric() || c == '-') {
            return Err(ScenarioError::definition(format!(
                "invalid prerelease token: '{}'",
                s
            )));
        }

        let iteration = match parts.next() {
            Some(n) => Some(n.parse::<u32>().map_err(|_| {
                ScenarioError::definition(format!("invalid prerelease iteration: '{}'", n))
            })?),
            None => None,
        };

        Ok(PrereleaseTag {
            token: token.to_string(),
            iteration,
        })
    }

    /// Extract the prerelease component of a version, if it has one
    pub fn of(version: &Version) -> Result<Option<Self>> {
        if version.pre.is_empty() {
            return Ok(None);
        }
        Self::parse(version.pre.as_str()).map(Some)
    }

    /// Next iteration of the same token ("alpha" -> "alpha.1", "alpha.1" -> "alpha.2")
    pub fn increment(&self) -> Self {
        PrereleaseTag {
            token: self.token.clone(),
            iteration: Some(self.iteration.map_or(1, |n| n + 1)),
        }
    }
}

impl fmt::Display for PrereleaseTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.token)?;
        if let Some(n) = self.iteration {
            write!(f, ".{}", n)?;
        }
        Ok(())
    }
}

/// Whether a version carries the given prerelease token
pub fn matches_token(version: &Version, token: &str) -> bool {
    match PrereleaseTag::of(version) {
        Ok(Some(tag)) => tag.token == token,
        _ => false,
    }
}
