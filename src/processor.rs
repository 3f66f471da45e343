//! # Processor Contract
//!
//! A `Processor` is a visitor with one method per document kind. The
//! dispatcher parses a file, hands the typed document to the matching method
//! and persists the result when the method reports a modification.
//!
//! Processors never touch the filesystem themselves. Documents they produce
//! in addition to the one being processed (a catalog copy, standalone Tasks)
//! are queued as [`GeneratedFile`]s and written by the dispatcher once the
//! processor call has succeeded.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::Result;
use crate::tekton::{Pipeline, PipelineRun, Task, TaskRun};

/// A document produced as a side result of processing a file.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedFile {
    pub path: PathBuf,
    pub content: String,
}

impl GeneratedFile {
    /// Serialize a document for writing at `path`.
    pub fn yaml<T: Serialize>(path: impl Into<PathBuf>, doc: &T) -> Result<Self> {
        Ok(Self {
            path: path.into(),
            content: serde_yaml::to_string(doc)?,
        })
    }
}

/// One method per document kind. Each returns whether the document was
/// modified in place.
pub trait Processor {
    fn process_pipeline(&mut self, pipeline: &mut Pipeline, path: &Path) -> Result<bool>;

    fn process_pipeline_run(&mut self, run: &mut PipelineRun, path: &Path) -> Result<bool>;

    fn process_task(&mut self, task: &mut Task, path: &Path) -> Result<bool>;

    fn process_task_run(&mut self, run: &mut TaskRun, path: &Path) -> Result<bool>;

    /// Drain the documents generated by the last call.
    fn take_generated(&mut self) -> Vec<GeneratedFile> {
        Vec::new()
    }
}
