//! Version-control backend abstraction
//!
//! The simulator drives the repository through the [VcsRepository] trait,
//! which exposes exactly the primitives a scenario build needs: branch
//! creation and checkout, stage-everything commits, non-fast-forward merges
//! and lightweight tags, each returning the created identity where one
//! exists. Two implementations are provided:
//!
//! - [repository::Git2Repository]: the real backend using the `git2` crate
//! - [mock::MockRepository]: an in-memory backend for tests
//!
//! ```rust
//! # use repo_scenario::git::VcsRepository;
//! # fn example<R: VcsRepository>(repo: &R) -> repo_scenario::Result<()> {
//! let sha = repo.commit_all("feat: add new feature")?;
//! repo.create_tag("v1.0.0")?;
//! assert_eq!(repo.tag_target("v1.0.0")?, sha);
//! # Ok(())
//! # }
//! ```

pub mod mock;
pub mod repository;

pub use mock::MockRepository;
pub use repository::Git2Repository;

use std::path::PathBuf;

use crate::error::Result;

/// Primitives the history simulator needs from a version-control backend
pub trait VcsRepository {
    /// Working directory of the repository; `None` for in-memory backends
    fn workdir(&self) -> Option<PathBuf>;

    /// Name of the branch HEAD currently points at
    fn current_branch(&self) -> Result<String>;

    /// Identity of the commit at the tip of a branch
    fn branch_head(&self, branch: &str) -> Result<String>;

    /// Create a branch at the current head. Fails if the branch exists.
    fn create_branch(&self, name: &str) -> Result<()>;

    /// Make an existing branch current and sync the working tree to it
    fn checkout(&self, branch: &str) -> Result<()>;

    /// Stage every pending change and commit it, returning the new identity
    fn commit_all(&self, message: &str) -> Result<String>;

    /// Merge a branch into the current one, always creating an explicit
    /// two-parent merge commit (never fast-forwarding), and return its
    /// identity
    fn merge_no_ff(&self, source: &str, message: &str) -> Result<String>;

    /// Create a lightweight tag at the current head. Fails on collision.
    fn create_tag(&self, name: &str) -> Result<()>;

    /// All tag names in the repository
    fn list_tags(&self) -> Result<Vec<String>>;

    /// Identity of the commit a tag points at
    fn tag_target(&self, name: &str) -> Result<String>;

    /// Parent identities of a commit
    fn commit_parents(&self, id: &str) -> Result<Vec<String>>;
}
