use std::cell::RefCell;
use std::collections::HashMap;
use std::path::PathBuf;

use crate::error::{Result, ScenarioError};
use crate::git::VcsRepository;

/// A commit held by the mock backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockCommit {
    pub message: String,
    pub parents: Vec<String>,
}

#[derive(Debug, Default)]
struct MockState {
    counter: u64,
    current: String,
    branches: HashMap<String, Option<String>>,
    commits: HashMap<String, MockCommit>,
    tags: Vec<(String, String)>,
}

/// In-memory backend for testing the simulator without a real repository.
///
/// Identities are synthetic but unique and deterministic (a hex counter), so
/// tests can assert on ordering and backfill behaviour.
pub struct MockRepository {
    state: RefCell<MockState>,
}

impl MockRepository {
    /// Create a mock repository with an unborn default branch
    pub fn new(default_branch: &str) -> Self {
        let mut state = MockState::default();
        state.current = default_branch.to_string();
        state.branches.insert(default_branch.to_string(), None);

        MockRepository {
            state: RefCell::new(state),
        }
    }

    /// Messages of every commit, in creation order
    pub fn commit_messages(&self) -> Vec<String> {
        let state = self.state.borrow();
        let mut ids: Vec<&String> = state.commits.keys().collect();
        ids.sort();
        ids.iter()
            .map(|id| state.commits[*id].message.clone())
            .collect()
    }

    fn next_id(state: &mut MockState) -> String {
        state.counter += 1;
        format!("{:040x}", state.counter)
    }
}

impl Default for MockRepository {
    fn default() -> Self {
        Self::new("main")
    }
}

impl VcsRepository for MockRepository {
    fn workdir(&self) -> Option<PathBuf> {
        None
    }

    fn current_branch(&self) -> Result<String> {
        Ok(self.state.borrow().current.clone())
    }

    fn branch_head(&self, branch: &str) -> Result<String> {
        let state = self.state.borrow();
        state
            .branches
            .get(branch)
            .cloned()
            .flatten()
            .ok_or_else(|| ScenarioError::simulation(format!("branch '{}' has no target", branch)))
    }

    fn create_branch(&self, name: &str) -> Result<()> {
        let mut state = self.state.borrow_mut();
        if state.branches.contains_key(name) {
            return Err(ScenarioError::simulation(format!(
                "branch '{}' already exists",
                name
            )));
        }
        let head = state.branches.get(&state.current).cloned().flatten();
        state.branches.insert(name.to_string(), head);
        Ok(())
    }

    fn checkout(&self, branch: &str) -> Result<()> {
        let mut state = self.state.borrow_mut();
        if !state.branches.contains_key(branch) {
            return Err(ScenarioError::simulation(format!(
                "branch '{}' not found",
                branch
            )));
        }
        state.current = branch.to_string();
        Ok(())
    }

    fn commit_all(&self, message: &str) -> Result<String> {
        let mut state = self.state.borrow_mut();
        let parent = state.branches.get(&state.current).cloned().flatten();
        let id = Self::next_id(&mut state);
        state.commits.insert(
            id.clone(),
            MockCommit {
                message: message.to_string(),
                parents: parent.into_iter().collect(),
            },
        );
        let current = state.current.clone();
        state.branches.insert(current, Some(id.clone()));
        Ok(id)
    }

    fn merge_no_ff(&self, source: &str, message: &str) -> Result<String> {
        let mut state = self.state.borrow_mut();
        let target_head = state
            .branches
            .get(&state.current)
            .cloned()
            .flatten()
            .ok_or_else(|| ScenarioError::simulation("cannot merge into an unborn branch"))?;
        let source_head = state
            .branches
            .get(source)
            .cloned()
            .flatten()
            .ok_or_else(|| ScenarioError::simulation(format!("branch '{}' not found", source)))?;

        let id = Self::next_id(&mut state);
        state.commits.insert(
            id.clone(),
            MockCommit {
                message: message.to_string(),
                parents: vec![target_head, source_head],
            },
        );
        let current = state.current.clone();
        state.branches.insert(current, Some(id.clone()));
        Ok(id)
    }

    fn create_tag(&self, name: &str) -> Result<()> {
        let mut state = self.state.borrow_mut();
        if state.tags.iter().any(|(tag, _)| tag == name) {
            return Err(ScenarioError::simulation(format!(
                "tag '{}' already exists",
                name
            )));
        }
        let head = state
            .branches
            .get(&state.current)
            .cloned()
            .flatten()
            .ok_or_else(|| ScenarioError::simulation("cannot tag an unborn branch"))?;
        state.tags.push((name.to_string(), head));
        Ok(())
    }

    fn list_tags(&self) -> Result<Vec<String>> {
        Ok(self
            .state
            .borrow()
            .tags
            .iter()
            .map(|(name, _)| name.clone())
            .collect())
    }

    fn tag_target(&self, name: &str) -> Result<String> {
        self.state
            .borrow()
            .tags
            .iter()
            .find(|(tag, _)| tag == name)
            .map(|(_, target)| target.clone())
            .ok_or_else(|| ScenarioError::simulation(format!("tag '{}' not found", name)))
    }

    fn commit_parents(&self, id: &str) -> Result<Vec<String>> {
        self.state
            .borrow()
            .commits
            .get(id)
            .map(|commit| commit.parents.clone())
            .ok_or_else(|| ScenarioError::simulation(format!("commit '{}' not found", id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_commit_advances_branch_head() {
        let repo = MockRepository::default();
        let id = repo.commit_all("Initial commit").unwrap();
        assert_eq!(repo.branch_head("main").unwrap(), id);
    }

    #[test]
    fn test_branch_and_checkout() {
        let repo = MockRepository::default();
        repo.commit_all("Initial commit").unwrap();
        repo.create_branch("fix/patch-1").unwrap();
        repo.checkout("fix/patch-1").unwrap();
        assert_eq!(repo.current_branch().unwrap(), "fix/patch-1");
        assert!(repo.create_branch("fix/patch-1").is_err());
        assert!(repo.checkout("missing").is_err());
    }

    #[test]
    fn test_merge_records_both_parents() {
        let repo = MockRepository::default();
        repo.commit_all("Initial commit").unwrap();
        let main_head = repo.branch_head("main").unwrap();

        repo.create_branch("fix/patch-1").unwrap();
        repo.checkout("fix/patch-1").unwrap();
        let fix_head = repo.commit_all("fix: correct some text").unwrap();

        repo.checkout("main").unwrap();
        let merge = repo.merge_no_ff("fix/patch-1", "Merge pull request #25").unwrap();

        assert_eq!(
            repo.commit_parents(&merge).unwrap(),
            vec![main_head, fix_head]
        );
    }

    #[test]
    fn test_tags_keep_creation_order() {
        let repo = MockRepository::default();
        repo.commit_all("Initial commit").unwrap();
        repo.create_tag("v1.0.0").unwrap();
        repo.commit_all("feat: more").unwrap();
        repo.create_tag("v1.1.0").unwrap();

        assert_eq!(repo.list_tags().unwrap(), vec!["v1.0.0", "v1.1.0"]);
        assert!(repo.create_tag("v1.0.0").is_err());
    }

    #[test]
    fn test_tag_on_unborn_branch_fails() {
        let repo = MockRepository::default();
        assert!(repo.create_tag("v1.0.0").is_err());
    }
}
