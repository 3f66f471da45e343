//! # Document Transformations
//!
//! The four [`Processor`](crate::processor::Processor) implementations and
//! the helpers they share.
//!
//! - [`uses::UsesMigrator`]: rewrites materialized steps into `uses:`
//!   references, for a catalog repository or for a repository consuming one.
//! - [`resolver::ResolverMigrator`]: converts flattened single-task
//!   PipelineRuns into resolver-based task references.
//! - [`inline::Inliner`]: materializes one reuse step so it can be edited
//!   locally.
//! - [`env::EnvModifier`]: sets step template environment variables.
//!
//! Shared pieces live in [`overrides`] (override sets), [`annotations`]
//! (legacy step URL annotations) and [`lighthouse`] (default build
//! parameters).

pub mod annotations;
pub mod env;
pub mod inline;
pub mod lighthouse;
pub mod overrides;
pub mod resolver;
pub mod uses;

pub use env::EnvModifier;
pub use inline::{FixedPicker, Inliner, Picker};
pub use resolver::ResolverMigrator;
pub use uses::{Direction, UsesMigrator};

use crate::error::Result;
use crate::reference::GitRef;
use crate::tekton::{Step, TaskSpec};

/// The catalog reference a reuse step points at: its own `uses:` image, or
/// for a step without an image, the step template's `uses:` image with the
/// step's name addressing it.
///
/// `Ok(None)` for materialized steps.
pub(crate) fn reuse_source(step: &Step, template: Option<&Step>) -> Result<Option<GitRef>> {
    if step.is_reuse() {
        return GitRef::parse(&step.image, None, None);
    }
    if step.image.is_empty() {
        if let Some(template) = template {
            return GitRef::parse(&template.image, None, None);
        }
    }
    Ok(None)
}

/// Names of the steps of a task spec that are in reuse form, directly or
/// through the step template.
pub(crate) fn reuse_step_names(spec: &TaskSpec) -> Vec<String> {
    let template = spec.step_template.as_ref();
    spec.steps
        .iter()
        .filter(|s| !s.name.is_empty())
        .filter(|s| crate::reference::is_uses(s.effective_image(template)))
        .map(|s| s.name.clone())
        .collect()
}
