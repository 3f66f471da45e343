//! # Migrate Command
//!
//! Runs the catalog migrator over a directory.
//!
//! - With `--catalog` the directory is the pipeline catalog itself: every
//!   pack pipeline below `packs/<lang>/.lighthouse` is copied to
//!   `tasks/<lang>/<file>.yaml` and reduced to named reuse steps. A failing
//!   file is reported and the walk carries on.
//! - Without it the directory is a repository consuming the catalog: steps
//!   copied from the catalog are replaced by reuse steps carrying only their
//!   local overrides. The first failing file stops the walk.

use std::path::PathBuf;

use anyhow::{Context as _, Result};
use clap::Args;

use super::{finish, git_catalog, load_config};
use crate::cli::Context;
use pipeline_reuse::defaults::default_dir;
use pipeline_reuse::migrate::{Direction, UsesMigrator};
use pipeline_reuse::walk::{walk, ErrorPolicy, Layout};

/// Arguments for the migrate command
#[derive(Args, Debug)]
pub struct MigrateArgs {
    /// Directory to walk (defaults to the current directory)
    #[arg(short, long, value_name = "PATH")]
    pub dir: Option<PathBuf>,

    /// Treat the directory as the pipeline catalog
    #[arg(long)]
    pub catalog: bool,

    /// Language pack to take catalog steps from, e.g. `go`
    #[arg(long, value_name = "LANG")]
    pub pack: Option<String>,

    /// Owner of the catalog repository
    #[arg(long, value_name = "OWNER")]
    pub owner: Option<String>,

    /// Name of the catalog repository
    #[arg(long, value_name = "REPO")]
    pub repo: Option<String>,

    /// Revision written into generated `uses:` references
    #[arg(long, value_name = "REV")]
    pub revision: Option<String>,

    /// Cache root directory for catalog checkouts
    #[arg(long, value_name = "PATH", env = "PIPELINE_REUSE_CACHE")]
    pub cache_root: Option<PathBuf>,
}

/// Execute the migrate command
pub fn execute(args: MigrateArgs, ctx: &Context) -> Result<()> {
    let dir = args.dir.unwrap_or_else(default_dir);
    if !dir.is_dir() {
        anyhow::bail!("Directory not found: {}", dir.display());
    }
    let mut config = load_config(ctx, &dir)?;
    if let Some(pack) = args.pack {
        if pack.is_empty() || pack.contains('/') {
            anyhow::bail!("Invalid pack '{}': expected a single directory name", pack);
        }
        config.catalog.pack = Some(pack);
    }
    if let Some(owner) = args.owner {
        config.catalog.owner = owner;
    }
    if let Some(repo) = args.repo {
        config.catalog.repo = repo;
    }
    if let Some(revision) = args.revision {
        config.catalog.revision = revision;
    }

    let (direction, layout, policy) = if args.catalog {
        (Direction::Catalog, Layout::Catalog, ErrorPolicy::Continue)
    } else {
        (Direction::Repository, Layout::Lighthouse, ErrorPolicy::Abort)
    };
    let catalog = git_catalog(&config, args.cache_root);
    let mut migrator = UsesMigrator::new(direction, &dir, config.catalog.clone(), catalog)
        .with_layout_mismatch(config.layout_mismatch);

    let report = walk(&mut migrator, &dir, layout, policy)
        .with_context(|| format!("Failed to migrate pipelines in {}", dir.display()))?;
    finish(ctx, &report, &dir)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pipeline_reuse::output::OutputConfig;
    use std::fs;
    use tempfile::TempDir;

    fn ctx() -> Context {
        Context {
            output: OutputConfig::from_env_and_flag("never"),
            config: None,
        }
    }

    fn args(dir: &std::path::Path) -> MigrateArgs {
        MigrateArgs {
            dir: Some(dir.to_path_buf()),
            catalog: true,
            pack: None,
            owner: None,
            repo: None,
            revision: None,
            cache_root: Some(dir.join("cache")),
        }
    }

    #[test]
    fn test_missing_directory() {
        let temp = TempDir::new().unwrap();
        let result = execute(args(&temp.path().join("absent")), &ctx());
        assert!(result.unwrap_err().to_string().contains("Directory not found"));
    }

    #[test]
    fn test_invalid_pack() {
        let temp = TempDir::new().unwrap();
        let mut args = args(temp.path());
        args.pack = Some("go/extra".to_string());
        let result = execute(args, &ctx());
        assert!(result.unwrap_err().to_string().contains("Invalid pack"));
    }

    #[test]
    fn test_catalog_migration_writes_task_copy() {
        let temp = TempDir::new().unwrap();
        let pipeline = temp.path().join("packs/go/.lighthouse/jenkins-x/release.yaml");
        fs::create_dir_all(pipeline.parent().unwrap()).unwrap();
        fs::write(
            &pipeline,
            r#"apiVersion: tekton.dev/v1beta1
kind: PipelineRun
metadata:
  name: release
spec:
  pipelineSpec:
    tasks:
    - name: from-build-pack
      taskSpec:
        stepTemplate:
          workingDir: /workspace/source
        steps:
        - name: build
          image: golang:1.21
          script: make build
"#,
        )
        .unwrap();

        execute(args(temp.path()), &ctx()).unwrap();

        let copy = fs::read_to_string(temp.path().join("tasks/go/release.yaml")).unwrap();
        assert!(copy.contains("script: make build"));
        let reduced = fs::read_to_string(&pipeline).unwrap();
        assert!(reduced
            .contains("uses:jenkins-x/jx3-pipeline-catalog/tasks/go/release.yaml@versionStream"));
        assert!(!reduced.contains("make build"));
    }
}
