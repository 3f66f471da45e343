//! # Catalog Lookup
//!
//! Finds the task spec a `uses:` reference points at. Catalog documents are
//! normally flattened PipelineRuns with exactly one embedded task; plain
//! Task documents are accepted too. Parsed specs are memoized per
//! `(host, owner, repo, path, revision)` for the lifetime of the [`Catalog`].

use log::debug;

use crate::cache::{CacheKey, CatalogCache};
use crate::dispatch::{parse_document, sniff_kind};
use crate::error::{Error, Result};
use crate::reference::GitRef;
use crate::repository::ContentResolver;
use crate::tekton::{Kind, PipelineRun, Step, Task, TaskSpec};

/// Run context for catalog access: a content resolver plus its cache.
pub struct Catalog {
    resolver: Box<dyn ContentResolver>,
    cache: CatalogCache,
}

impl Catalog {
    pub fn new(resolver: Box<dyn ContentResolver>) -> Self {
        Self {
            resolver,
            cache: CatalogCache::new(),
        }
    }

    pub fn cache(&self) -> &CatalogCache {
        &self.cache
    }

    /// Fetch and parse the catalog task spec for a reference.
    ///
    /// Fetch failures, including a missing file, are errors naming the
    /// reference.
    pub fn find_catalog_task_spec(&mut self, git_ref: &GitRef) -> Result<TaskSpec> {
        let resolver = &self.resolver;
        let spec = self.cache.get_or_fetch(CacheKey::from(git_ref), || {
            debug!("fetching catalog task {}", git_ref);
            let content = resolver
                .fetch(
                    git_ref.host(),
                    &git_ref.owner,
                    &git_ref.repo,
                    &git_ref.path_in_repo,
                    &git_ref.revision,
                )
                .map_err(|e| Error::CatalogFetch {
                    reference: git_ref.to_string(),
                    message: e.to_string(),
                })?;
            let content = String::from_utf8_lossy(&content);
            task_spec_from_content(&content, &git_ref.to_string())
        })?;
        Ok(spec.clone())
    }

    /// Find a named step in the catalog task a reference points at, along
    /// with that task's step template. `Ok(None)` when the catalog task has
    /// no such step.
    pub fn find_catalog_step(
        &mut self,
        git_ref: &GitRef,
        name: &str,
    ) -> Result<Option<(Step, Option<Step>)>> {
        let spec = self.find_catalog_task_spec(git_ref)?;
        Ok(spec
            .step(name)
            .cloned()
            .map(|step| (step, spec.step_template.clone())))
    }
}

/// Extract the sole task spec from catalog document content.
pub fn task_spec_from_content(content: &str, reference: &str) -> Result<TaskSpec> {
    match sniff_kind(content) {
        Some(Kind::PipelineRun) => {
            let run: PipelineRun = parse_document(content).map_err(|e| Error::CatalogFetch {
                reference: reference.to_string(),
                message: e.to_string(),
            })?;
            sole_task_spec(run).map_err(|e| Error::CatalogFetch {
                reference: reference.to_string(),
                message: e.to_string(),
            })
        }
        Some(Kind::Task) => {
            let task: Task = parse_document(content).map_err(|e| Error::CatalogFetch {
                reference: reference.to_string(),
                message: e.to_string(),
            })?;
            Ok(task.spec)
        }
        other => Err(Error::CatalogFetch {
            reference: reference.to_string(),
            message: format!(
                "expected a PipelineRun or Task, found {}",
                other.map(|k| k.as_str()).unwrap_or("an unknown kind")
            ),
        }),
    }
}

/// The single embedded task spec of a flattened PipelineRun.
pub fn sole_task_spec(run: PipelineRun) -> Result<TaskSpec> {
    let name = run.metadata.name.clone();
    let mut tasks = run
        .spec
        .pipeline_spec
        .map(|p| p.tasks)
        .unwrap_or_default()
        .into_iter()
        .filter_map(|t| t.task_spec)
        .collect::<Vec<_>>();
    if tasks.len() != 1 {
        return Err(Error::structural(format!(
            "pipelinerun '{}' should have exactly 1 embedded task but has {}",
            name,
            tasks.len()
        )));
    }
    Ok(tasks.remove(0))
}
