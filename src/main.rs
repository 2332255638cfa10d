use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

use repo_scenario::cache::{CacheKey, ScenarioCache};
use repo_scenario::convention::CommitConvention;
use repo_scenario::scenarios::github_flow;
use repo_scenario::ui;

#[derive(clap::Parser)]
#[command(
    name = "repo-scenario",
    about = "Build a deterministic git repository with a known release history and changelogs"
)]
struct Args {
    #[arg(help = "Directory to create the repository in")]
    dest: PathBuf,

    #[arg(
        short,
        long,
        default_value = "angular",
        help = "Commit message convention (angular, emoji, scipy)"
    )]
    convention: String,

    #[arg(long, help = "Reuse a cached build and copy it into the destination")]
    cached: bool,

    #[arg(long, help = "Cache directory (defaults to the user cache dir)")]
    cache_dir: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let convention: CommitConvention = match args.convention.parse() {
        Ok(convention) => convention,
        Err(e) => {
            ui::display_error(&e.to_string());
            std::process::exit(1);
        }
    };

    if args.dest.exists() && args.dest.read_dir()?.next().is_some() {
        ui::display_error(&format!(
            "destination '{}' exists and is not empty",
            args.dest.display()
        ));
        std::process::exit(1);
    }

    if args.cached {
        let cache = match args.cache_dir {
            Some(dir) => ScenarioCache::new(dir),
            None => ScenarioCache::at_default_location(),
        };
        let key = CacheKey::new(github_flow::SCENARIO_KIND, convention);

        ui::display_status(&format!(
            "Using cache at {}",
            cache.root().display()
        ));
        cache.get_or_build(&key, |dir| {
            github_flow::build_into(convention, dir).map(|_| ())
        })?;
        cache.checkout(&key, &args.dest)?;
        ui::display_success(&format!(
            "Copied cached {} scenario to {}",
            convention,
            args.dest.display()
        ));
        return Ok(());
    }

    ui::display_status(&format!(
        "Building {} scenario with {} commits...",
        github_flow::SCENARIO_KIND,
        convention
    ));

    let outcome = github_flow::build_into(convention, &args.dest)?;

    for tag in &outcome.tags {
        ui::display_status(&format!("tagged {}", tag));
    }
    ui::display_success(&format!(
        "Built {} releases in {}",
        outcome.tags.len(),
        outcome.repo_dir.display()
    ));

    Ok(())
}
