//! # Directory Walker
//!
//! Finds the pipeline files of a repository and runs one [`Processor`] over
//! them through the dispatcher.
//!
//! Three layouts are understood:
//!
//! - [`Layout::Lighthouse`]: files below any `.lighthouse` directory
//! - [`Layout::Catalog`]: files below `packs/<lang>/.lighthouse`
//! - [`Layout::All`]: every YAML file, skipping hidden and build directories
//!
//! In the first two layouts a directory holding a `triggers.yaml` contributes
//! only the files its triggers point at, in trigger order.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use log::{debug, error, warn};

use crate::dispatch::{process_file, Outcome};
use crate::error::{Error, Result};
use crate::processor::Processor;
use crate::triggers::{TriggerConfig, TRIGGERS_FILE};

/// Directories never descended into.
const SKIP_DIRS: &[&str] = &["target", "node_modules", "vendor", "charts"];

/// Directory holding Lighthouse pipelines.
const LIGHTHOUSE_DIR: &str = ".lighthouse";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Layout {
    #[default]
    Lighthouse,
    Catalog,
    All,
}

impl Layout {
    fn contains(self, relative: &Path) -> bool {
        let parts: Vec<&str> = relative
            .components()
            .filter_map(|c| c.as_os_str().to_str())
            .collect();
        match self {
            Layout::Lighthouse => parts.iter().rev().skip(1).any(|p| *p == LIGHTHOUSE_DIR),
            Layout::Catalog => {
                parts.len() > 3 && parts[0] == "packs" && parts[2] == LIGHTHOUSE_DIR
            }
            Layout::All => true,
        }
    }

    fn honours_triggers(self) -> bool {
        !matches!(self, Layout::All)
    }
}

/// What to do when a file fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorPolicy {
    /// Stop at the first failure and return it.
    Abort,
    /// Record the failure and carry on with the next file.
    Continue,
}

#[derive(Debug, Default)]
pub struct WalkReport {
    pub saved: Vec<PathBuf>,
    pub generated: Vec<PathBuf>,
    pub unchanged: usize,
    pub skipped: usize,
    pub failed: Vec<Error>,
}

impl WalkReport {
    pub fn has_failures(&self) -> bool {
        !self.failed.is_empty()
    }

    pub fn processed(&self) -> usize {
        self.saved.len() + self.unchanged + self.skipped + self.failed.len()
    }
}

fn is_yaml(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml") | Some("yml")
    )
}

/// Enumerate the pipeline files below `root` for `layout`.
pub fn find_pipeline_files(root: &Path, layout: Layout) -> Result<Vec<PathBuf>> {
    let mut candidates = Vec::new();
    for entry in walkdir::WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| {
            if e.depth() == 0 || !e.file_type().is_dir() {
                return true;
            }
            let name = e.file_name().to_str().unwrap_or("");
            if SKIP_DIRS.contains(&name) {
                return false;
            }
            !name.starts_with('.') || name == LIGHTHOUSE_DIR
        })
    {
        let entry = entry.map_err(|e| Error::Io(e.into()))?;
        if !entry.file_type().is_file() || !is_yaml(entry.path()) {
            continue;
        }
        let relative = entry.path().strip_prefix(root).unwrap_or(entry.path());
        if layout.contains(relative) {
            candidates.push(entry.into_path());
        }
    }

    let mut files = Vec::new();
    let mut seen = HashSet::new();
    let mut trigger_dirs = HashSet::new();
    for file in candidates {
        let dir = file.parent().map(Path::to_path_buf).unwrap_or_default();
        let triggers = dir.join(TRIGGERS_FILE);
        if layout.honours_triggers() && triggers.is_file() {
            if !trigger_dirs.insert(dir.clone()) {
                continue;
            }
            let config = TriggerConfig::from_file(&triggers)?;
            for source in config.source_files(&dir) {
                if !source.is_file() {
                    warn!(
                        "{} points at missing file {}",
                        triggers.display(),
                        source.display()
                    );
                } else if seen.insert(source.clone()) {
                    files.push(source);
                }
            }
            continue;
        }
        if seen.insert(file.clone()) {
            files.push(file);
        }
    }
    debug!("found {} pipeline files below {}", files.len(), root.display());
    Ok(files)
}

/// Run `processor` over `files` in order.
pub fn process_files(
    processor: &mut dyn Processor,
    files: &[PathBuf],
    policy: ErrorPolicy,
) -> Result<WalkReport> {
    let mut report = WalkReport::default();
    for file in files {
        match process_file(processor, file) {
            Ok(processed) => {
                match processed.outcome {
                    Outcome::Saved => report.saved.push(file.clone()),
                    Outcome::Unchanged => report.unchanged += 1,
                    Outcome::UnknownKind => report.skipped += 1,
                }
                report.generated.extend(processed.generated);
            }
            Err(e) => match policy {
                ErrorPolicy::Abort => return Err(e),
                ErrorPolicy::Continue => {
                    error!("{}", e);
                    report.failed.push(e);
                }
            },
        }
    }
    Ok(report)
}

/// Find the files for `layout` below `root` and process them.
pub fn walk(
    processor: &mut dyn Processor,
    root: &Path,
    layout: Layout,
    policy: ErrorPolicy,
) -> Result<WalkReport> {
    let files = find_pipeline_files(root, layout)?;
    process_files(processor, &files, policy)
}
