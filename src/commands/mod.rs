//! # CLI Command Implementations
//!
//! One file per subcommand. Each holds an `Args` struct derived with `clap`
//! and an `execute` function that turns the arguments into a processor from
//! the `pipeline_reuse` library and walks the target directory with it.

pub mod completions;
pub mod convert;
pub mod migrate;
pub mod override_step;
pub mod set_env;

use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};

use crate::cli::Context;
use pipeline_reuse::catalog::Catalog;
use pipeline_reuse::config::{self, Config};
use pipeline_reuse::defaults::default_cache_root;
use pipeline_reuse::output::print_report;
use pipeline_reuse::repository::GitContentResolver;
use pipeline_reuse::walk::WalkReport;

/// Load the configuration for a walk of `dir`.
pub(crate) fn load_config(ctx: &Context, dir: &Path) -> Result<Config> {
    config::load(ctx.config.as_deref(), dir).context("Failed to load configuration")
}

/// Catalog backed by git checkouts below `cache_root`.
pub(crate) fn git_catalog(config: &Config, cache_root: Option<PathBuf>) -> Catalog {
    let cache_root = cache_root.unwrap_or_else(default_cache_root);
    log::debug!("catalog cache root: {}", cache_root.display());
    Catalog::new(Box::new(GitContentResolver::new(
        cache_root,
        &config.catalog.version_stream_revision,
    )))
}

/// Print the walk report and fail if any file failed.
pub(crate) fn finish(ctx: &Context, report: &WalkReport, root: &Path) -> Result<()> {
    print_report(&ctx.output, report, root);
    if report.has_failures() {
        anyhow::bail!("{} file(s) could not be processed", report.failed.len());
    }
    Ok(())
}
