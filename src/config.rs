//! # Configuration Schema and Parsing
//!
//! This module defines the `.pipeline-reuse.yaml` configuration file. Every
//! field has a default, so an absent or empty file is a valid configuration
//! targeting the public Jenkins X pipeline catalog.
//!
//! ```yaml
//! catalog:
//!   owner: jenkins-x
//!   repo: jx3-pipeline-catalog
//!   revision: versionStream
//!   version_stream_revision: master
//!   pack: go
//! resolver:
//!   public: true
//!   workspace_volume_quantity: 2Gi
//! layout_mismatch: warn
//! env:
//!   GOPROXY: https://proxy.golang.org
//! ```
//!
//! Command-line flags override values read from the file.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Name of the configuration file looked up in the working directory.
pub const CONFIG_FILE: &str = ".pipeline-reuse.yaml";

/// Where catalog content lives and which revision new references pin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CatalogConfig {
    /// Owner (user or organisation) of the catalog repository.
    pub owner: String,
    /// Name of the catalog repository.
    pub repo: String,
    /// Revision written into `uses:` references created by catalog migration.
    pub revision: String,
    /// Revision fetched when a reference names the `versionStream` sentinel.
    pub version_stream_revision: String,
    /// Host serving the catalog repository.
    pub host: String,
    /// Language pack used as the catalog source for tasks without a `uses:`
    /// step template, e.g. `go` for `tasks/go/<file>.yaml`.
    pub pack: Option<String>,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            owner: "jenkins-x".to_string(),
            repo: "jx3-pipeline-catalog".to_string(),
            revision: crate::reference::VERSION_STREAM.to_string(),
            version_stream_revision: "master".to_string(),
            host: "github.com".to_string(),
            pack: None,
        }
    }
}

/// Settings for the runtime-resolver conversion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ResolverConfig {
    /// Resolver named in generated task references.
    pub name: String,
    /// Emit `url` resolver params instead of `org`/`repo`.
    pub public: bool,
    /// Storage requested for the shared pipeline workspace.
    pub workspace_volume_quantity: String,
    /// Service account of generated PipelineRuns.
    pub service_account: String,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            name: "git".to_string(),
            public: false,
            workspace_volume_quantity: "1Gi".to_string(),
            service_account: "tekton-bot".to_string(),
        }
    }
}

/// What catalog migration does with files outside the
/// `packs/<language>/.lighthouse/<trigger>/<file>.yaml` layout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayoutMismatch {
    /// Skip the file silently.
    #[default]
    Ignore,
    /// Skip the file and log a warning.
    Warn,
}

/// The complete configuration file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub catalog: CatalogConfig,
    pub resolver: ResolverConfig,
    pub layout_mismatch: LayoutMismatch,
    /// Step template environment variables applied by `set-env`.
    pub env: BTreeMap<String, String>,
}

impl Config {
    fn validate(&self) -> Result<()> {
        let required = [
            ("catalog.owner", &self.catalog.owner),
            ("catalog.repo", &self.catalog.repo),
            ("catalog.revision", &self.catalog.revision),
            ("catalog.host", &self.catalog.host),
            ("resolver.name", &self.resolver.name),
            (
                "resolver.workspace_volume_quantity",
                &self.resolver.workspace_volume_quantity,
            ),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(Error::Config {
                    message: format!("'{}' must not be empty", field),
                    hint: Some(format!(
                        "remove '{}' from {} to use the default",
                        field, CONFIG_FILE
                    )),
                });
            }
        }
        if let Some(pack) = &self.catalog.pack {
            if pack.is_empty() || pack.contains('/') {
                return Err(Error::Config {
                    message: format!("invalid catalog.pack '{}'", pack),
                    hint: Some("use a single pack directory name such as 'go'".to_string()),
                });
            }
        }
        for name in self.env.keys() {
            if name.is_empty() || name.contains('=') {
                return Err(Error::Config {
                    message: format!("invalid environment variable name '{}'", name),
                    hint: None,
                });
            }
        }
        Ok(())
    }
}

/// Parse configuration YAML. Empty content yields the defaults.
pub fn parse(yaml_content: &str) -> Result<Config> {
    if yaml_content.trim().is_empty() {
        return Ok(Config::default());
    }
    let config: Config = serde_yaml::from_str(yaml_content).map_err(|e| Error::Config {
        message: e.to_string(),
        hint: Some(format!(
            "valid sections of {} are catalog, resolver, layout_mismatch and env",
            CONFIG_FILE
        )),
    })?;
    config.validate()?;
    Ok(config)
}

/// Parse a configuration file.
pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Config> {
    let content = std::fs::read_to_string(path.as_ref()).map_err(|e| Error::Config {
        message: format!("cannot read {}: {}", path.as_ref().display(), e),
        hint: None,
    })?;
    parse(&content)
}

/// Load the configuration: the explicit file if one is given (it must
/// exist), else [`CONFIG_FILE`] in `dir` if present, else the defaults.
pub fn load(explicit: Option<&Path>, dir: &Path) -> Result<Config> {
    if let Some(path) = explicit {
        return from_file(path);
    }
    let candidate: PathBuf = dir.join(CONFIG_FILE);
    if candidate.is_file() {
        log::debug!("loading configuration from {}", candidate.display());
        return from_file(candidate);
    }
    Ok(Config::default())
}
