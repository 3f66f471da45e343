//! # Convert Command
//!
//! Rewrites step-template pipelines into multi-task pipelines whose tasks are
//! fetched by the git resolver at run time. Pipelines defining their own
//! steps are split into standalone Task files; pipelines reusing a parent are
//! replaced by a resolver-based PipelineRun.

use std::path::PathBuf;

use anyhow::{Context as _, Result};
use clap::Args;

use super::{finish, load_config};
use crate::cli::Context;
use pipeline_reuse::defaults::default_dir;
use pipeline_reuse::migrate::ResolverMigrator;
use pipeline_reuse::walk::{walk, ErrorPolicy, Layout};

/// Arguments for the convert command
#[derive(Args, Debug)]
pub struct ConvertArgs {
    /// Directory to walk (defaults to the current directory)
    #[arg(short, long, value_name = "PATH")]
    pub dir: Option<PathBuf>,

    /// The catalog repository is public; omit the git credentials param
    #[arg(long)]
    pub public: bool,

    /// Size of the shared workspace volume
    #[arg(long, value_name = "QUANTITY")]
    pub volume_size: Option<String>,

    /// Service account the converted PipelineRuns run as
    #[arg(long, value_name = "NAME")]
    pub service_account: Option<String>,

    /// Name of the Tekton resolver used for task references
    #[arg(long, value_name = "NAME")]
    pub resolver: Option<String>,
}

/// Execute the convert command
pub fn execute(args: ConvertArgs, ctx: &Context) -> Result<()> {
    let dir = args.dir.unwrap_or_else(default_dir);
    if !dir.is_dir() {
        anyhow::bail!("Directory not found: {}", dir.display());
    }
    let mut config = load_config(ctx, &dir)?;
    if args.public {
        config.resolver.public = true;
    }
    if let Some(quantity) = args.volume_size {
        config.resolver.workspace_volume_quantity = quantity;
    }
    if let Some(account) = args.service_account {
        config.resolver.service_account = account;
    }
    if let Some(resolver) = args.resolver {
        config.resolver.name = resolver;
    }

    let mut migrator = ResolverMigrator::new(config.resolver);
    let report = walk(&mut migrator, &dir, Layout::Lighthouse, ErrorPolicy::Abort)
        .with_context(|| format!("Failed to convert pipelines in {}", dir.display()))?;
    finish(ctx, &report, &dir)
}
