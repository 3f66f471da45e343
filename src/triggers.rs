//! Lighthouse `triggers.yaml` files.
//!
//! A trigger file lists the presubmit and postsubmit jobs of a directory.
//! Each entry names the pipeline file it runs in `source` (older files use
//! `sourcePath`), relative to the trigger file's own directory.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_yaml::Mapping;

use crate::error::{Error, Result};

/// File name of a trigger file.
pub const TRIGGERS_FILE: &str = "triggers.yaml";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Trigger {
    #[serde(default)]
    pub name: String,
    #[serde(default, alias = "sourcePath", skip_serializing_if = "String::is_empty")]
    pub source: String,
    #[serde(flatten)]
    pub extra: Mapping,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TriggerSpec {
    #[serde(default)]
    pub presubmits: Vec<Trigger>,
    #[serde(default)]
    pub postsubmits: Vec<Trigger>,
    #[serde(flatten)]
    pub extra: Mapping,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TriggerConfig {
    #[serde(default)]
    pub spec: TriggerSpec,
    #[serde(flatten)]
    pub extra: Mapping,
}

impl TriggerConfig {
    pub fn parse(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(content)?)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::from(e).in_file(path))?;
        Self::parse(&content).map_err(|e| e.in_file(path))
    }

    /// Source files of all triggers, presubmits first, resolved against
    /// `dir` and without duplicates.
    pub fn source_files(&self, dir: &Path) -> Vec<PathBuf> {
        let mut seen = HashSet::new();
        self.spec
            .presubmits
            .iter()
            .chain(self.spec.postsubmits.iter())
            .filter(|t| !t.source.is_empty())
            .map(|t| dir.join(&t.source))
            .filter(|p| seen.insert(p.clone()))
            .collect()
    }
}
