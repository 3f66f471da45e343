//! # Set-Env Command
//!
//! Sets environment variables on the step template of every task in every
//! pipeline below a directory. Variables come from the `env` section of the
//! configuration file and from `--env NAME=VALUE` flags, the flags winning.

use std::path::PathBuf;

use anyhow::{Context as _, Result};
use clap::Args;

use super::{finish, load_config};
use crate::cli::Context;
use pipeline_reuse::defaults::default_dir;
use pipeline_reuse::migrate::EnvModifier;
use pipeline_reuse::walk::{walk, ErrorPolicy, Layout};

/// Arguments for the set-env command
#[derive(Args, Debug)]
pub struct SetEnvArgs {
    /// Directory to walk (defaults to the current directory)
    #[arg(short, long, value_name = "PATH")]
    pub dir: Option<PathBuf>,

    /// Variable to set, as NAME=VALUE (repeatable)
    #[arg(short, long = "env", value_name = "NAME=VALUE", value_parser = parse_env)]
    pub env: Vec<(String, String)>,
}

fn parse_env(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((name, value)) if !name.trim().is_empty() => {
            Ok((name.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected NAME=VALUE, got '{}'", raw)),
    }
}

/// Execute the set-env command
pub fn execute(args: SetEnvArgs, ctx: &Context) -> Result<()> {
    let dir = args.dir.unwrap_or_else(default_dir);
    if !dir.is_dir() {
        anyhow::bail!("Directory not found: {}", dir.display());
    }
    let mut vars = load_config(ctx, &dir)?.env;
    vars.extend(args.env);
    if vars.is_empty() {
        anyhow::bail!("No variables to set; pass --env NAME=VALUE or add an env section to the config");
    }

    let mut modifier = EnvModifier::new(vars);
    let report = walk(&mut modifier, &dir, Layout::Lighthouse, ErrorPolicy::Abort)
        .with_context(|| format!("Failed to set environment variables in {}", dir.display()))?;
    finish(ctx, &report, &dir)
}
