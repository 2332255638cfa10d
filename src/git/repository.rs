use std::cell::Cell;
use std::path::{Path, PathBuf};

use git2::build::CheckoutBuilder;
use git2::{BranchType, ErrorCode, IndexAddOption, ObjectType, Repository as Git2Repo};

use crate::error::{Result, ScenarioError};
use crate::git::VcsRepository;

const SIGNATURE_NAME: &str = "scenario-bot";
const SIGNATURE_EMAIL: &str = "scenario-bot@example.com";

/// Base of the synthetic commit clock: 2022-01-01 00:00:00 UTC.
const COMMIT_CLOCK_BASE: i64 = 1_640_995_200;
/// Seconds between consecutive simulated commits.
const COMMIT_CLOCK_STEP: i64 = 60;

/// Real backend over git2.
///
/// Commits are signed with a fixed identity and a monotonic synthetic clock,
/// so building the same definition twice yields identical commit identities
/// and therefore byte-identical changelogs.
pub struct Git2Repository {
    repo: Git2Repo,
    clock: Cell<i64>,
}

impl Git2Repository {
    /// Initialize a fresh repository whose unborn HEAD points at
    /// `default_branch`
    pub fn init<P: AsRef<Path>>(path: P, default_branch: &str) -> Result<Self> {
        let mut opts = git2::RepositoryInitOptions::new();
        opts.initial_head(default_branch);
        let repo = Git2Repo::init_opts(path, &opts)?;

        {
            let mut config = repo.config()?;
            config.set_str("user.name", SIGNATURE_NAME)?;
            config.set_str("user.email", SIGNATURE_EMAIL)?;
        }

        Ok(Git2Repository {
            repo,
            clock: Cell::new(COMMIT_CLOCK_BASE),
        })
    }

    /// Open or discover an existing repository (inspection only; the
    /// synthetic clock restarts, so build into a repository exactly once)
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let repo = Git2Repo::discover(path)?;

        Ok(Git2Repository {
            repo,
            clock: Cell::new(COMMIT_CLOCK_BASE),
        })
    }

    fn next_signature(&self) -> Result<git2::Signature<'static>> {
        let at = self.clock.get();
        self.clock.set(at + COMMIT_CLOCK_STEP);
        let time = git2::Time::new(at, 0);
        Ok(git2::Signature::new(SIGNATURE_NAME, SIGNATURE_EMAIL, &time)?)
    }

    fn head_commit(&self) -> Result<Option<git2::Commit<'_>>> {
        match self.repo.head() {
            Ok(head) => Ok(Some(head.peel_to_commit()?)),
            Err(e) if e.code() == ErrorCode::UnbornBranch || e.code() == ErrorCode::NotFound => {
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }
}

impl VcsRepository for Git2Repository {
    fn workdir(&self) -> Option<PathBuf> {
        self.repo.workdir().map(Path::to_path_buf)
    }

    fn current_branch(&self) -> Result<String> {
        match self.repo.head() {
            Ok(head) => head
                .shorthand()
                .map(str::to_string)
                .ok_or_else(|| ScenarioError::simulation("HEAD is not on a branch")),
            Err(e) if e.code() == ErrorCode::UnbornBranch || e.code() == ErrorCode::NotFound => {
                // unborn HEAD still names its branch symbolically
                let head = self.repo.find_reference("HEAD")?;
                head.symbolic_target()
                    .and_then(|target| target.strip_prefix("refs/heads/"))
                    .map(str::to_string)
                    .ok_or_else(|| ScenarioError::simulation("HEAD is not on a branch"))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn branch_head(&self, branch: &str) -> Result<String> {
        let name = branch.to_string();
        let branch = self.repo.find_branch(branch, BranchType::Local)?;
        let oid = branch
            .get()
            .target()
            .ok_or_else(|| ScenarioError::simulation(format!("branch '{}' has no target", name)))?;
        Ok(oid.to_string())
    }

    fn create_branch(&self, name: &str) -> Result<()> {
        let head = self
            .head_commit()?
            .ok_or_else(|| ScenarioError::simulation("cannot branch from an unborn HEAD"))?;
        self.repo.branch(name, &head, false)?;
        Ok(())
    }

    fn checkout(&self, branch: &str) -> Result<()> {
        let refname = format!("refs/heads/{}", branch);
        let object = self.repo.revparse_single(&refname)?;
        let mut checkout = CheckoutBuilder::new();
        checkout.force();
        self.repo.checkout_tree(&object, Some(&mut checkout))?;
        self.repo.set_head(&refname)?;
        Ok(())
    }

    fn commit_all(&self, message: &str) -> Result<String> {
        let mut index = self.repo.index()?;
        index.add_all(["*"], IndexAddOption::DEFAULT, None)?;
        index.write()?;
        let tree_id = index.write_tree()?;
        let tree = self.repo.find_tree(tree_id)?;

        let parent = self.head_commit()?;
        let parents: Vec<&git2::Commit<'_>> = parent.iter().collect();
        let sig = self.next_signature()?;
        let oid = self
            .repo
            .commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)?;
        Ok(oid.to_string())
    }

    fn merge_no_ff(&self, source: &str, message: &str) -> Result<String> {
        let source_ref = self
            .repo
            .find_branch(source, BranchType::Local)?
            .into_reference();
        let annotated = self.repo.reference_to_annotated_commit(&source_ref)?;
        self.repo.merge(&[&annotated], None, None)?;

        let mut index = self.repo.index()?;
        if index.has_conflicts() {
            self.repo.cleanup_state()?;
            return Err(ScenarioError::simulation(format!(
                "merging '{}' produced conflicts",
                source
            )));
        }

        let tree_id = index.write_tree_to(&self.repo)?;
        let tree = self.repo.find_tree(tree_id)?;
        let head_commit = self
            .head_commit()?
            .ok_or_else(|| ScenarioError::simulation("cannot merge into an unborn HEAD"))?;
        let source_commit = source_ref.peel_to_commit()?;

        let sig = self.next_signature()?;
        let oid = self.repo.commit(
            Some("HEAD"),
            &sig,
            &sig,
            message,
            &tree,
            &[&head_commit, &source_commit],
        )?;

        self.repo.cleanup_state()?;
        let mut checkout = CheckoutBuilder::new();
        checkout.force();
        self.repo.checkout_head(Some(&mut checkout))?;
        Ok(oid.to_string())
    }

    fn create_tag(&self, name: &str) -> Result<()> {
        let head = self
            .head_commit()?
            .ok_or_else(|| ScenarioError::simulation("cannot tag an unborn HEAD"))?;
        self.repo.tag_lightweight(name, head.as_object(), false)?;
        Ok(())
    }

    fn list_tags(&self) -> Result<Vec<String>> {
        let tags = self.repo.tag_names(None)?;
        Ok(tags.iter().flatten().map(str::to_string).collect())
    }

    fn tag_target(&self, name: &str) -> Result<String> {
        let reference = self.repo.find_reference(&format!("refs/tags/{}", name))?;
        let oid = reference.peel(ObjectType::Commit)?.id();
        Ok(oid.to_string())
    }

    fn commit_parents(&self, id: &str) -> Result<Vec<String>> {
        let oid = git2::Oid::from_str(id)?;
        let commit = self.repo.find_commit(oid)?;
        Ok(commit.parent_ids().map(|p| p.to_string()).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn init_with_commit() -> (tempfile::TempDir, Git2Repository) {
        let dir = tempfile::tempdir().expect("Could not create temp dir");
        let repo = Git2Repository::init(dir.path(), "main").expect("Could not init repo");
        fs::write(dir.path().join("file.txt"), "one\n").expect("Could not write file");
        repo.commit_all("Initial commit").expect("Could not commit");
        (dir, repo)
    }

    #[test]
    fn test_init_sets_default_branch() {
        let dir = tempfile::tempdir().unwrap();
        let repo = Git2Repository::init(dir.path(), "main").unwrap();
        assert_eq!(repo.current_branch().unwrap(), "main");
    }

    #[test]
    fn test_commit_all_returns_identity() {
        let (_dir, repo) = init_with_commit();
        let head = repo.branch_head("main").unwrap();
        assert_eq!(head.len(), 40);
    }

    #[test]
    fn test_commits_are_deterministic_across_builds() {
        let build = || {
            let dir = tempfile::tempdir().unwrap();
            let repo = Git2Repository::init(dir.path(), "main").unwrap();
            fs::write(dir.path().join("file.txt"), "one\n").unwrap();
            let first = repo.commit_all("Initial commit").unwrap();
            fs::write(dir.path().join("file.txt"), "one\ntwo\n").unwrap();
            let second = repo.commit_all("feat: add new feature").unwrap();
            (first, second)
        };

        assert_eq!(build(), build());
    }

    #[test]
    fn test_create_branch_collision_fails() {
        let (_dir, repo) = init_with_commit();
        repo.create_branch("fix/patch-1").unwrap();
        assert!(repo.create_branch("fix/patch-1").is_err());
    }

    #[test]
    fn test_merge_no_ff_creates_two_parent_commit() {
        let (dir, repo) = init_with_commit();
        let main_head = repo.branch_head("main").unwrap();

        repo.create_branch("fix/patch-1").unwrap();
        repo.checkout("fix/patch-1").unwrap();
        fs::write(dir.path().join("file.txt"), "one\ntwo\n").unwrap();
        let fix_head = repo.commit_all("fix: correct some text").unwrap();

        repo.checkout("main").unwrap();
        let merge = repo
            .merge_no_ff("fix/patch-1", "Merge pull request #25 from fix/patch-1")
            .unwrap();

        assert_ne!(merge, main_head);
        assert_ne!(merge, fix_head);
        assert_eq!(repo.commit_parents(&merge).unwrap(), vec![main_head, fix_head]);
    }

    #[test]
    fn test_tag_collision_fails() {
        let (_dir, repo) = init_with_commit();
        repo.create_tag("v1.0.0").unwrap();
        assert!(repo.create_tag("v1.0.0").is_err());
    }

    #[test]
    fn test_tag_target_points_at_head() {
        let (_dir, repo) = init_with_commit();
        let head = repo.branch_head("main").unwrap();
        repo.create_tag("v1.0.0").unwrap();
        assert_eq!(repo.tag_target("v1.0.0").unwrap(), head);
        assert_eq!(repo.list_tags().unwrap(), vec!["v1.0.0"]);
    }
}
