//! Commit message generation for the three supported conventions.
//!
//! This is the fixture-side counterpart of a commit-message parser: given an
//! abstract change intent, produce the message string each convention expects.

use std::fmt;
use std::str::FromStr;

use crate::error::{Result, ScenarioError};

/// Message used for the very first commit of every scenario, identical
/// across conventions.
pub const INITIAL_COMMIT_MESSAGE: &str = "Initial commit";

/// Commit message convention selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommitConvention {
    /// Angular-style prefixes (`feat:`, `fix:`)
    Angular,
    /// Gitmoji-style markers (`:sparkles:`, `:bug:`)
    Emoji,
    /// SciPy-style tags (`ENH:`, `MAINT:`)
    Scipy,
}

impl CommitConvention {
    /// All supported conventions, in a stable order
    pub const ALL: [CommitConvention; 3] = [
        CommitConvention::Angular,
        CommitConvention::Emoji,
        CommitConvention::Scipy,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CommitConvention::Angular => "angular",
            CommitConvention::Emoji => "emoji",
            CommitConvention::Scipy => "scipy",
        }
    }
}

impl FromStr for CommitConvention {
    type Err = ScenarioError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "angular" => Ok(CommitConvention::Angular),
            "emoji" => Ok(CommitConvention::Emoji),
            "scipy" => Ok(CommitConvention::Scipy),
            other => Err(ScenarioError::UnsupportedConvention(other.to_string())),
        }
    }
}

impl fmt::Display for CommitConvention {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Semantic type of a simulated change commit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Feature,
    Fix,
}

/// Render a change intent as a commit message under one convention.
///
/// Pure function; merge-commit messages are host-specific and come from the
/// [crate::hvcs::HvcsClient] instead.
pub fn format_change(convention: CommitConvention, kind: ChangeKind, text: &str) -> String {
    let marker = match (convention, kind) {
        (CommitConvention::Angular, ChangeKind::Feature) => "feat: ",
        (CommitConvention::Angular, ChangeKind::Fix) => "fix: ",
        (CommitConvention::Emoji, ChangeKind::Feature) => ":sparkles: ",
        (CommitConvention::Emoji, ChangeKind::Fix) => ":bug: ",
        (CommitConvention::Scipy, ChangeKind::Feature) => "ENH: ",
        (CommitConvention::Scipy, ChangeKind::Fix) => "MAINT: ",
    };

    format!("{}{}", marker, text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_convention_parse_known_names() {
        assert_eq!(
            "angular".parse::<CommitConvention>().unwrap(),
            CommitConvention::Angular
        );
        assert_eq!(
            "emoji".parse::<CommitConvention>().unwrap(),
            CommitConvention::Emoji
        );
        assert_eq!(
            "scipy".parse::<CommitConvention>().unwrap(),
            CommitConvention::Scipy
        );
    }

    #[test]
    fn test_convention_parse_is_case_insensitive() {
        assert_eq!(
            "Angular".parse::<CommitConvention>().unwrap(),
            CommitConvention::Angular
        );
    }

    #[test]
    fn test_convention_parse_unknown_fails() {
        let err = "gitmoji".parse::<CommitConvention>().unwrap_err();
        assert!(matches!(err, ScenarioError::UnsupportedConvention(_)));
    }

    #[test]
    fn test_convention_display_round_trips() {
        for convention in CommitConvention::ALL {
            let parsed: CommitConvention = convention.to_string().parse().unwrap();
            assert_eq!(parsed, convention);
        }
    }

    #[test]
    fn test_format_feature_per_convention() {
        assert_eq!(
            format_change(CommitConvention::Angular, ChangeKind::Feature, "add new feature"),
            "feat: add new feature"
        );
        assert_eq!(
            format_change(CommitConvention::Emoji, ChangeKind::Feature, "add new feature"),
            ":sparkles: add new feature"
        );
        assert_eq!(
            format_change(CommitConvention::Scipy, ChangeKind::Feature, "add new feature"),
            "ENH: add new feature"
        );
    }

    #[test]
    fn test_format_fix_per_convention() {
        assert_eq!(
            format_change(CommitConvention::Angular, ChangeKind::Fix, "correct some text"),
            "fix: correct some text"
        );
        assert_eq!(
            format_change(CommitConvention::Emoji, ChangeKind::Fix, "correct some text"),
            ":bug: correct some text"
        );
        assert_eq!(
            format_change(CommitConvention::Scipy, ChangeKind::Fix, "correct some text"),
            "MAINT: correct some text"
        );
    }
}
