//! # Override Command
//!
//! Copies one catalog step into a pipeline file so it can be edited locally.
//! The step is given with `--step`, or chosen from a list of the file's
//! reuse steps when running in a terminal.

use std::path::PathBuf;

use anyhow::{Context as _, Result};
use clap::Args;
use dialoguer::{theme::ColorfulTheme, Select};

use super::{git_catalog, load_config};
use crate::cli::Context;
use pipeline_reuse::dispatch::{process_file, Outcome};
use pipeline_reuse::error::Error;
use pipeline_reuse::migrate::{FixedPicker, Inliner, Picker};
use pipeline_reuse::output::emoji;

/// Arguments for the override command
#[derive(Args, Debug)]
pub struct OverrideArgs {
    /// Pipeline file to edit
    #[arg(short, long, value_name = "PATH")]
    pub file: PathBuf,

    /// Name of the step to override (prompts when omitted)
    #[arg(short, long, value_name = "NAME")]
    pub step: Option<String>,

    /// Cache root directory for catalog checkouts
    #[arg(long, value_name = "PATH", env = "PIPELINE_REUSE_CACHE")]
    pub cache_root: Option<PathBuf>,
}

/// Prompts for the step on the terminal.
struct SelectPicker;

impl Picker for SelectPicker {
    fn pick(&mut self, candidates: &[String]) -> pipeline_reuse::error::Result<String> {
        let theme = ColorfulTheme::default();
        let choice = Select::with_theme(&theme)
            .with_prompt("Pick the step to override")
            .items(candidates)
            .default(0)
            .interact_opt()
            .map_err(|e| Error::Io(std::io::Error::other(e.to_string())))?;
        Ok(choice
            .map(|i| candidates[i].clone())
            .unwrap_or_default())
    }
}

/// Execute the override command
pub fn execute(args: OverrideArgs, ctx: &Context) -> Result<()> {
    if !args.file.is_file() {
        anyhow::bail!("File not found: {}", args.file.display());
    }
    let dir = args
        .file
        .parent()
        .map(PathBuf::from)
        .unwrap_or_else(pipeline_reuse::defaults::default_dir);
    let config = load_config(ctx, &dir)?;
    let catalog = git_catalog(&config, args.cache_root);

    let processed = match args.step {
        Some(step) => process_file(&mut Inliner::new(catalog, FixedPicker::new(&step)), &args.file),
        None => {
            if !console::Term::stdout().is_term() {
                anyhow::bail!("No terminal to prompt on; pass the step with --step");
            }
            process_file(&mut Inliner::new(catalog, SelectPicker), &args.file)
        }
    }
    .with_context(|| format!("Failed to override a step in {}", args.file.display()))?;

    match processed.outcome {
        Outcome::Saved => println!(
            "{} saved {}",
            emoji(&ctx.output, "💾", "[SAVED]"),
            args.file.display()
        ),
        Outcome::Unchanged => println!(
            "{} no step overridden in {}",
            emoji(&ctx.output, "ℹ️ ", "[INFO]"),
            args.file.display()
        ),
        Outcome::UnknownKind => anyhow::bail!(
            "{} is not a Tekton pipeline or task",
            args.file.display()
        ),
    }
    Ok(())
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

    #[test]
    fn test_missing_file() {
        let temp = TempDir::new().unwrap();
        let args = OverrideArgs {
            file: temp.path().join("absent.yaml"),
            step: Some("build".to_string()),
            cache_root: None,
        };
        let err = execute(args, &ctx()).unwrap_err();
        assert!(err.to_string().contains("File not found"));
    }

    #[test]
    fn test_not_a_pipeline() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("values.yaml");
        fs::write(&file, "image: foo\n").unwrap();
        let args = OverrideArgs {
            file,
            step: Some("build".to_string()),
            cache_root: Some(temp.path().join("cache")),
        };
        let err = execute(args, &ctx()).unwrap_err();
        assert!(err.to_string().contains("not a Tekton pipeline"));
    }

    #[test]
    fn test_no_reuse_steps_is_unchanged() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("task.yaml");
        let content = "apiVersion: tekton.dev/v1beta1\nkind: Task\nmetadata:\n  name: build\nspec:\n  steps:\n  - name: build\n    image: alpine\n";
        fs::write(&file, content).unwrap();
        let args = OverrideArgs {
            file: file.clone(),
            step: Some("build".to_string()),
            cache_root: Some(temp.path().join("cache")),
        };
        execute(args, &ctx()).unwrap();
        assert_eq!(fs::read_to_string(&file).unwrap(), content);
    }
}
