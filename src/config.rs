use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::domain::channel::{BranchRule, ReleaseChannelPolicy};
use crate::domain::tag::TagPattern;
use crate::error::{Result, ScenarioError};
use crate::hvcs::{self, HvcsClient, EXAMPLE_HVCS_DOMAIN};

/// Configuration file written into every scenario project
pub const CONFIG_FILE_NAME: &str = "release.toml";

/// One branch release-channel rule in configuration form.
///
/// Rule order in the `branches` list is priority order.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct BranchRuleConfig {
    pub r#match: String,

    #[serde(default)]
    pub prerelease: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prerelease_token: Option<String>,
}

/// Hosted version-control settings consumed by merge messages and hyperlinks
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct HvcsConfig {
    #[serde(default = "default_hvcs_client")]
    pub client: String,

    #[serde(default = "default_hvcs_domain")]
    pub domain: String,

    #[serde(default = "default_hvcs_owner")]
    pub owner: String,

    #[serde(default = "default_hvcs_repo")]
    pub repo: String,
}

fn default_hvcs_client() -> String {
    "github".to_string()
}

fn default_hvcs_domain() -> String {
    EXAMPLE_HVCS_DOMAIN.to_string()
}

fn default_hvcs_owner() -> String {
    "example-org".to_string()
}

fn default_hvcs_repo() -> String {
    "example-repo".to_string()
}

fn default_tag_format() -> String {
    crate::domain::tag::DEFAULT_TAG_FORMAT.to_string()
}

fn default_branch_name() -> String {
    "main".to_string()
}

fn default_allow_zero_version() -> bool {
    true
}

impl Default for HvcsConfig {
    fn default() -> Self {
        HvcsConfig {
            client: default_hvcs_client(),
            domain: default_hvcs_domain(),
            owner: default_hvcs_owner(),
            repo: default_hvcs_repo(),
        }
    }
}

/// The configuration tree a scenario merges into its project's config file.
///
/// The same values drive the build (branch policy, tag format, host client)
/// and are what the system under test later reads back.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ScenarioConfig {
    #[serde(default)]
    pub branches: Vec<BranchRuleConfig>,

    #[serde(default = "default_allow_zero_version")]
    pub allow_zero_version: bool,

    #[serde(default = "default_tag_format")]
    pub tag_format: String,

    #[serde(default = "default_branch_name")]
    pub default_branch: String,

    #[serde(default)]
    pub hvcs: HvcsConfig,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        ScenarioConfig {
            branches: Vec::new(),
            allow_zero_version: default_allow_zero_version(),
            tag_format: default_tag_format(),
            default_branch: default_branch_name(),
            hvcs: HvcsConfig::default(),
        }
    }
}

impl ScenarioConfig {
    /// Compile the branch rules into a release-channel policy
    pub fn policy(&self) -> Result<ReleaseChannelPolicy> {
        let mut rules = Vec::with_capacity(self.branches.len());
        for rule in &self.branches {
            rules.push(BranchRule::new(
                &rule.r#match,
                rule.prerelease,
                rule.prerelease_token.as_deref(),
            )?);
        }
        Ok(ReleaseChannelPolicy::new(rules))
    }

    pub fn tag_pattern(&self) -> Result<TagPattern> {
        TagPattern::new(self.tag_format.clone())
    }

    pub fn hvcs_client(&self) -> Result<Box<dyn HvcsClient>> {
        hvcs::hvcs_client(
            &self.hvcs.client,
            &self.hvcs.domain,
            &self.hvcs.owner,
            &self.hvcs.repo,
        )
    }

    /// Serialize into the project's config file, deep-merging any extra
    /// nested key-value tree over this configuration first.
    pub fn write(&self, project_dir: &Path, extra: Option<&toml::Table>) -> Result<PathBuf> {
        let mut tree = toml::Value::try_from(self)
            .map_err(|e| ScenarioError::config(format!("cannot serialize config: {}", e)))?;

        if let Some(extra) = extra {
            merge_tables(&mut tree, &toml::Value::Table(extra.clone()));
        }

        let text = toml::to_string_pretty(&tree)
            .map_err(|e| ScenarioError::config(format!("cannot serialize config: {}", e)))?;
        let path = project_dir.join(CONFIG_FILE_NAME);
        fs::write(&path, text)?;
        Ok(path)
    }

    /// Load a previously written configuration file
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        toml::from_str(&text).map_err(|e| ScenarioError::config(format!("cannot parse config: {}", e)))
    }
}

/// Deep-merge `overlay` into `base`: nested tables merge recursively,
/// everything else is replaced.
pub fn merge_tables(base: &mut toml::Value, overlay: &toml::Value) {
    if !base.is_table() || !overlay.is_table() {
        *base = overlay.clone();
        return;
    }

    let overlay_table = match overlay.as_table() {
        Some(table) => table,
        None => return,
    };
    let base_table = match base.as_table_mut() {
        Some(table) => table,
        None => return,
    };

    for (key, value) in overlay_table {
        let merged = match base_table.get_mut(key) {
            Some(existing) if existing.is_table() && value.is_table() => {
                merge_tables(existing, value);
                true
            }
            Some(existing) => {
                *existing = value.clone();
                true
            }
            None => false,
        };
        if !merged {
            base_table.insert(key.clone(), value.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn github_flow_config() -> ScenarioConfig {
        ScenarioConfig {
            branches: vec![
                BranchRuleConfig {
                    r#match: r"^(main|master)$".to_string(),
                    prerelease: false,
                    prerelease_token: None,
                },
                BranchRuleConfig {
                    r#match: r"^(feat|fix)/.+".to_string(),
                    prerelease: true,
                    prerelease_token: Some("alpha".to_string()),
                },
            ],
            allow_zero_version: false,
            ..ScenarioConfig::default()
        }
    }

    #[test]
    fn test_policy_from_config() {
        let config = github_flow_config();
        let policy = config.policy().unwrap();
        assert!(policy.resolve("feat/feature-1").unwrap().prerelease);
        assert!(!policy.resolve("main").unwrap().prerelease);
    }

    #[test]
    fn test_bad_rule_pattern_fails() {
        let mut config = github_flow_config();
        config.branches[0].r#match = "((".to_string();
        assert!(config.policy().is_err());
    }

    #[test]
    fn test_write_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let config = github_flow_config();

        let path = config.write(dir.path(), None).unwrap();
        assert_eq!(path.file_name().unwrap(), CONFIG_FILE_NAME);

        let loaded = ScenarioConfig::load(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_write_applies_extra_tree() {
        let dir = tempfile::tempdir().unwrap();
        let config = github_flow_config();

        let extra: toml::Table = toml::from_str(
            r#"
            allow_zero_version = true

            [hvcs]
            domain = "git.example.org"
            "#,
        )
        .unwrap();

        config.write(dir.path(), Some(&extra)).unwrap();
        let loaded = ScenarioConfig::load(&dir.path().join(CONFIG_FILE_NAME)).unwrap();

        assert!(loaded.allow_zero_version);
        assert_eq!(loaded.hvcs.domain, "git.example.org");
        // untouched nested values survive the merge
        assert_eq!(loaded.hvcs.client, "github");
        assert_eq!(loaded.branches.len(), 2);
    }

    #[test]
    fn test_merge_tables_replaces_scalars_and_merges_tables() {
        let mut base: toml::Value = toml::from_str(
            r#"
            a = 1

            [nested]
            x = "old"
            y = "keep"
            "#,
        )
        .unwrap();
        let overlay: toml::Value = toml::from_str(
            r#"
            a = 2
            b = 3

            [nested]
            x = "new"
            "#,
        )
        .unwrap();

        merge_tables(&mut base, &overlay);

        assert_eq!(base["a"].as_integer(), Some(2));
        assert_eq!(base["b"].as_integer(), Some(3));
        assert_eq!(base["nested"]["x"].as_str(), Some("new"));
        assert_eq!(base["nested"]["y"].as_str(), Some("keep"));
    }

    #[test]
    fn test_defaults_fill_missing_fields() {
        let config: ScenarioConfig = toml::from_str("").unwrap();
        assert!(config.allow_zero_version);
        assert_eq!(config.tag_format, "v{version}");
        assert_eq!(config.default_branch, "main");
        assert_eq!(config.hvcs.client, "github");
    }
}
