use std::env;
use std::fs;

use semver::Version;
use serial_test::serial;

use repo_scenario::cache::{CacheKey, ScenarioCache};
use repo_scenario::changelog::{self, ChangelogFormat};
use repo_scenario::convention::CommitConvention;
use repo_scenario::git::{Git2Repository, VcsRepository};
use repo_scenario::scenarios::github_flow;

const EXPECTED_TAGS: [&str; 6] = [
    "v1.0.0",
    "v1.0.1-alpha.1",
    "v1.0.1-alpha.2",
    "v1.0.1",
    "v1.1.0-alpha.1",
    "v1.1.0",
];

#[test]
fn test_github_flow_tag_sequence() {
    let dest = tempfile::tempdir().expect("Could not create temp dir");
    let outcome = github_flow::build_into(CommitConvention::Angular, dest.path())
        .expect("Scenario build should succeed");

    assert_eq!(outcome.tags, EXPECTED_TAGS);

    // the realized repository carries the same six tags
    let repo = Git2Repository::open(dest.path()).expect("Could not open built repo");
    let mut on_disk = repo.list_tags().unwrap();
    on_disk.sort();
    let mut expected: Vec<String> = EXPECTED_TAGS.iter().map(|t| t.to_string()).collect();
    expected.sort();
    assert_eq!(on_disk, expected);
}

#[test]
fn test_merge_commits_have_two_parents() {
    let dest = tempfile::tempdir().unwrap();
    let builder = github_flow::builder(CommitConvention::Angular).unwrap();
    let mut def = github_flow::definition(builder.hvcs()).unwrap();
    builder.build(&mut def, dest.path()).unwrap();

    let repo = Git2Repository::open(dest.path()).unwrap();
    for version in ["1.0.1", "1.1.0"] {
        let record = def.get(&Version::parse(version).unwrap()).unwrap();
        let sha = record.commits()[0]
            .sha()
            .expect("merge commit identity should be backfilled");
        let parents = repo.commit_parents(sha).unwrap();
        assert_eq!(parents.len(), 2, "merge for {} must not fast-forward", version);
        assert_ne!(parents[0], parents[1]);
    }
}

#[test]
fn test_changelog_files_match_projector_output() {
    let dest = tempfile::tempdir().unwrap();
    let builder = github_flow::builder(CommitConvention::Angular).unwrap();
    let mut def = github_flow::definition(builder.hvcs()).unwrap();
    let outcome = builder.build(&mut def, dest.path()).unwrap();

    let last = Version::parse("1.1.0").unwrap();
    for (format, path) in [
        (ChangelogFormat::Markdown, &outcome.changelog_md),
        (ChangelogFormat::RestructuredText, &outcome.changelog_rst),
    ] {
        let expected = changelog::render(
            &def,
            CommitConvention::Angular,
            &last,
            format,
            builder.hvcs(),
        )
        .unwrap();
        let written = fs::read_to_string(path).unwrap();
        assert_eq!(written, expected, "{:?} file diverged from projector", format);
    }
}

#[test]
fn test_final_markdown_shape() {
    let dest = tempfile::tempdir().unwrap();
    let outcome = github_flow::build_into(CommitConvention::Angular, dest.path()).unwrap();

    let text = fs::read_to_string(&outcome.changelog_md).unwrap();
    assert!(text.starts_with("# CHANGELOG\n"));

    // finalized releases only, newest first; alphas are absorbed
    let minor = text.find("## v1.1.0").expect("1.1.0 heading missing");
    let patch = text.find("## v1.0.1").expect("1.0.1 heading missing");
    let initial = text.find("## v1.0.0").expect("1.0.0 heading missing");
    assert!(minor < patch && patch < initial);
    assert!(!text.contains("alpha"));

    assert!(text.contains("### Features"));
    assert!(text.contains("* feat: add new feature"));
}

#[test]
fn test_emoji_convention_changes_messages_and_sections() {
    let dest = tempfile::tempdir().unwrap();
    let outcome = github_flow::build_into(CommitConvention::Emoji, dest.path()).unwrap();

    let text = fs::read_to_string(&outcome.changelog_md).unwrap();
    assert!(text.contains("### :sparkles:"));
    assert!(text.contains("* :sparkles: add new feature"));
    assert!(text.contains("* Initial commit"));
    // the emoji grouping files merge commits under Other
    assert!(text.contains("* Merge pull request #26 from feat/feature-1"));
}

#[test]
fn test_build_is_deterministic() {
    let build = |convention| {
        let dest = tempfile::tempdir().unwrap();
        let outcome = github_flow::build_into(convention, dest.path()).unwrap();
        (
            fs::read_to_string(&outcome.changelog_md).unwrap(),
            fs::read_to_string(&outcome.changelog_rst).unwrap(),
        )
    };

    let first = build(CommitConvention::Scipy);
    let second = build(CommitConvention::Scipy);
    assert_eq!(first.0, second.0);
    assert_eq!(first.1, second.1);
}

#[test]
fn test_config_file_written_into_project() {
    let dest = tempfile::tempdir().unwrap();
    github_flow::build_into(CommitConvention::Angular, dest.path()).unwrap();

    let config = repo_scenario::config::ScenarioConfig::load(
        &dest.path().join(repo_scenario::config::CONFIG_FILE_NAME),
    )
    .unwrap();
    assert!(!config.allow_zero_version);
    assert_eq!(config.branches.len(), 2);
    assert_eq!(config.hvcs.client, "github");
}

#[test]
fn test_cached_build_copies_complete_repository() {
    let root = tempfile::tempdir().unwrap();
    let cache = ScenarioCache::new(root.path());
    let key = CacheKey::new(github_flow::SCENARIO_KIND, CommitConvention::Emoji);

    let entry = cache
        .get_or_build(&key, |dir| {
            github_flow::build_into(CommitConvention::Emoji, dir).map(|_| ())
        })
        .unwrap();

    let dest = tempfile::tempdir().unwrap();
    let private = dest.path().join("copy");
    cache.checkout(&key, &private).unwrap();

    let repo = Git2Repository::open(&private).unwrap();
    assert_eq!(repo.list_tags().unwrap().len(), 6);
    assert!(private.join("CHANGELOG.md").exists());

    // master copy stays intact for the next consumer
    assert!(entry.join("CHANGELOG.md").exists());
}

#[test]
#[serial]
fn test_open_discovers_built_repository() {
    let dest = tempfile::tempdir().unwrap();
    github_flow::build_into(CommitConvention::Angular, dest.path()).unwrap();

    let original_dir = env::current_dir().unwrap();
    env::set_current_dir(dest.path()).expect("Could not change to scenario dir");

    let repo = Git2Repository::open(".");
    assert!(repo.is_ok(), "open should discover the built repository");
    assert_eq!(repo.unwrap().current_branch().unwrap(), "main");

    env::set_current_dir(original_dir).unwrap();
}
