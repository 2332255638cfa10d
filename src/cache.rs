//! Build-once, reuse-by-copy scenario cache
//!
//! A realized scenario repository is expensive to build and cheap to copy,
//! so builds are cached per (scenario kind, convention) and every consumer
//! works on a private copy. A failed build removes its partial directory:
//! the presence of a cache entry is the completion marker.

use std::fs;
use std::path::{Path, PathBuf};

use crate::convention::CommitConvention;
use crate::error::{Result, ScenarioError};

/// Cache key: scenario kind plus commit convention
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub scenario: String,
    pub convention: CommitConvention,
}

impl CacheKey {
    pub fn new(scenario: impl Into<String>, convention: CommitConvention) -> Self {
        CacheKey {
            scenario: scenario.into(),
            convention,
        }
    }

    /// Directory name of this entry under the cache root
    pub fn dir_name(&self) -> String {
        format!("{}-{}", self.scenario, self.convention)
    }
}

/// File-system cache of realized scenario directories
#[derive(Debug, Clone)]
pub struct ScenarioCache {
    root: PathBuf,
}

impl ScenarioCache {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        ScenarioCache { root: root.into() }
    }

    /// Cache under the user's cache directory, falling back to the system
    /// temporary directory
    pub fn at_default_location() -> Self {
        let root = dirs::cache_dir()
            .unwrap_or_else(std::env::temp_dir)
            .join("repo-scenario");
        ScenarioCache { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn entry_path(&self, key: &CacheKey) -> PathBuf {
        self.root.join(key.dir_name())
    }

    /// Return the cached directory for `key`, building it first if absent.
    ///
    /// On build failure the partial directory is removed so a later call
    /// never mistakes it for a completed build.
    pub fn get_or_build<F>(&self, key: &CacheKey, build: F) -> Result<PathBuf>
    where
        F: FnOnce(&Path) -> Result<()>,
    {
        let entry = self.entry_path(key);
        if entry.exists() {
            return Ok(entry);
        }

        fs::create_dir_all(&entry)?;
        if let Err(err) = build(&entry) {
            let _ = fs::remove_dir_all(&entry);
            return Err(err);
        }
        Ok(entry)
    }

    /// Copy a cached scenario into a private directory for one consumer
    pub fn checkout(&self, key: &CacheKey, dest: &Path) -> Result<()> {
        let entry = self.entry_path(key);
        if !entry.exists() {
            return Err(ScenarioError::CacheMiss(entry));
        }
        copy_dir_tree(&entry, dest)
    }

    /// Drop a cache entry (e.g. after a definition schema change)
    pub fn invalidate(&self, key: &CacheKey) -> Result<()> {
        let entry = self.entry_path(key);
        if entry.exists() {
            fs::remove_dir_all(entry)?;
        }
        Ok(())
    }
}

/// Recursively copy a directory tree, `.git` included
pub fn copy_dir_tree(src: &Path, dest: &Path) -> Result<()> {
    fs::create_dir_all(dest)?;

    for entry in fs::read_dir(src)? {
        let entry = entry?;
        let target = dest.join(entry.file_name());
        if entry.file_type()?.is_dir() {
            copy_dir_tree(&entry.path(), &target)?;
        } else {
            fs::copy(entry.path(), &target)?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_or_build_builds_once() {
        let root = tempfile::tempdir().unwrap();
        let cache = ScenarioCache::new(root.path());
        let key = CacheKey::new("github-flow", CommitConvention::Angular);

        let mut builds = 0;
        let first = cache
            .get_or_build(&key, |dir| {
                builds += 1;
                fs::write(dir.join("marker.txt"), "built").map_err(Into::into)
            })
            .unwrap();

        let second = cache
            .get_or_build(&key, |_| {
                builds += 1;
                Ok(())
            })
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(builds, 1);
        assert!(first.ends_with("github-flow-angular"));
    }

    #[test]
    fn test_failed_build_leaves_no_entry() {
        let root = tempfile::tempdir().unwrap();
        let cache = ScenarioCache::new(root.path());
        let key = CacheKey::new("github-flow", CommitConvention::Emoji);

        let result = cache.get_or_build(&key, |dir| {
            fs::write(dir.join("partial.txt"), "half-done")?;
            Err(ScenarioError::simulation("tag collision"))
        });

        assert!(result.is_err());
        assert!(!cache.entry_path(&key).exists());
    }

    #[test]
    fn test_checkout_copies_the_tree() {
        let root = tempfile::tempdir().unwrap();
        let cache = ScenarioCache::new(root.path());
        let key = CacheKey::new("github-flow", CommitConvention::Scipy);

        cache
            .get_or_build(&key, |dir| {
                fs::create_dir(dir.join(".git"))?;
                fs::write(dir.join(".git").join("HEAD"), "ref: refs/heads/main")?;
                fs::write(dir.join("file.txt"), "content").map_err(Into::into)
            })
            .unwrap();

        let dest = tempfile::tempdir().unwrap();
        let private = dest.path().join("copy");
        cache.checkout(&key, &private).unwrap();

        assert!(private.join("file.txt").exists());
        assert!(private.join(".git").join("HEAD").exists());
    }

    #[test]
    fn test_checkout_missing_entry_is_cache_miss() {
        let root = tempfile::tempdir().unwrap();
        let cache = ScenarioCache::new(root.path());
        let key = CacheKey::new("never-built", CommitConvention::Angular);

        let dest = tempfile::tempdir().unwrap();
        let err = cache.checkout(&key, dest.path()).unwrap_err();
        assert!(matches!(err, ScenarioError::CacheMiss(_)));
    }

    #[test]
    fn test_invalidate_removes_entry() {
        let root = tempfile::tempdir().unwrap();
        let cache = ScenarioCache::new(root.path());
        let key = CacheKey::new("github-flow", CommitConvention::Angular);

        cache.get_or_build(&key, |_| Ok(())).unwrap();
        assert!(cache.entry_path(&key).exists());

        cache.invalidate(&key).unwrap();
        assert!(!cache.entry_path(&key).exists());
    }
}
