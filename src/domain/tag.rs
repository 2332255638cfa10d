use regex::Regex;
use semver::Version;

use crate::error::{Result, ScenarioError};

/// Tag naming pattern (e.g. "v{version}", "release-{version}")
///
/// The same pattern must be applied when creating tags and when the system
/// under test later parses them, so formatting and matching live together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagPattern {
    pattern: String,
}

/// Default tag format used by scenarios
pub const DEFAULT_TAG_FORMAT: &str = "v{version}";

impl TagPattern {
    /// Create a tag pattern; the pattern must contain a `{version}` placeholder
    pub fn new(pattern: impl Into<String>) -> Result<Self> {
        let pattern = pattern.into();
        if !pattern.contains("{version}") {
            return Err(ScenarioError::config(
                "tag format must contain a {version} placeholder",
            ));
        }
        Ok(TagPattern { pattern })
    }

    pub fn as_str(&self) -> &str {
        &self.pattern
    }

    /// Format a version according to the pattern
    /// Example: pattern="v{version}", version=1.0.1-alpha.2 -> "v1.0.1-alpha.2"
    pub fn format(&self, version: &Version) -> String {
        self.pattern.replace("{version}", &version.to_string())
    }

    /// Extract the version embedded in a tag name, if the tag matches
    pub fn parse(&self, tag: &str) -> Option<Version> {
        let escaped = regex::escape(&self.pattern);
        let regex_pattern = escaped.replace(r"\{version\}", r"(\d+\.\d+\.\d+(?:-[0-9A-Za-z.-]+)?)");

        let re = Regex::new(&format!("^{}$", regex_pattern)).ok()?;
        let captures = re.captures(tag)?;
        Version::parse(captures.get(1)?.as_str()).ok()
    }

    /// Validate whether a tag name matches this pattern
    pub fn matches(&self, tag: &str) -> bool {
        self.parse(tag).is_some()
    }
}

impl Default for TagPattern {
    fn default() -> Self {
        TagPattern {
            pattern: DEFAULT_TAG_FORMAT.to_string(),
        }
    }
}
