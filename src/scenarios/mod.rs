//! Canonical scenario definitions

pub mod github_flow;
