use std::path::PathBuf;

use thiserror::Error;

/// Unified error type for scenario building
#[derive(Error, Debug)]
pub enum ScenarioError {
    #[error("Git operation failed: {0}")]
    Git(#[from] git2::Error),

    #[error("Unsupported commit convention: '{0}'")]
    UnsupportedConvention(String),

    #[error("No release-channel rule matches branch '{0}'")]
    NoMatchingBranchRule(String),

    #[error("Simulation step failed: {0}")]
    Simulation(String),

    #[error("Cached scenario missing: {}", .0.display())]
    CacheMiss(PathBuf),

    #[error("Definition error: {0}")]
    Definition(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience type alias for Results in repo-scenario
pub type Result<T> = std::result::Result<T, ScenarioError>;

impl ScenarioError {
    /// Create a simulation error with context
    pub fn simulation(msg: impl Into<String>) -> Self {
        ScenarioError::Simulation(msg.into())
    }

    /// Create a definition error with context
    pub fn definition(msg: impl Into<String>) -> Self {
        ScenarioError::Definition(msg.into())
    }

    /// Create a configuration error with context
    pub fn config(msg: impl Into<String>) -> Self {
        ScenarioError::Config(msg.into())
    }
}
