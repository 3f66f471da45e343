//! CLI argument parsing and command dispatch

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::commands;
use pipeline_reuse::output::OutputConfig;

const DEFAULT_LOG_LEVEL: &str = "info";

/// Pipeline Reuse - Rewrite Tekton pipelines between inline, catalog-reuse and resolver forms
#[derive(Parser, Debug)]
#[command(name = "pipeline-reuse")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Colorize output (always, never, auto)
    #[arg(long, global = true, value_name = "WHEN", default_value = "auto")]
    color: String,

    /// Set log level (error, warn, info, debug, trace)
    #[arg(long, global = true, value_name = "LEVEL", default_value = DEFAULT_LOG_LEVEL)]
    log_level: String,

    /// Path to config file (defaults to .pipeline-reuse.yaml in the walked directory)
    #[arg(long, global = true, value_name = "PATH", env = "PIPELINE_REUSE_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Move inline steps into the catalog, or minimize them against it
    Migrate(commands::migrate::MigrateArgs),

    /// Convert step-template pipelines into resolver-based multi-task pipelines
    Convert(commands::convert::ConvertArgs),

    /// Copy a catalog step into a pipeline so it can be edited locally
    Override(commands::override_step::OverrideArgs),

    /// Set step template environment variables on every pipeline
    SetEnv(commands::set_env::SetEnvArgs),

    /// Generate shell completion scripts
    Completions(commands::completions::CompletionsArgs),
}

/// Settings shared by every command.
#[derive(Debug, Clone)]
pub struct Context {
    pub output: OutputConfig,
    pub config: Option<PathBuf>,
}

fn init_logging(level: &str) {
    let mut builder = env_logger::Builder::new();
    match std::env::var("RUST_LOG") {
        Ok(filters) if level == DEFAULT_LOG_LEVEL => builder.parse_filters(&filters),
        _ => builder.parse_filters(level),
    };
    builder.format_timestamp(None);
    let _ = builder.try_init();
}

impl Cli {
    /// Execute the CLI command
    pub fn execute(self) -> Result<()> {
        init_logging(&self.log_level);
        let ctx = Context {
            output: OutputConfig::from_env_and_flag(&self.color),
            config: self.config,
        };

        match self.command {
            Commands::Migrate(args) => commands::migrate::execute(args, &ctx),
            Commands::Convert(args) => commands::convert::execute(args, &ctx),
            Commands::Override(args) => commands::override_step::execute(args, &ctx),
            Commands::SetEnv(args) => commands::set_env::execute(args, &ctx),
            Commands::Completions(args) => commands::completions::execute(args),
        }
    }
}
