//! # Local Override Inliner
//!
//! Materializes one reuse step so it can be edited locally: the catalog
//! step is copied in full and the step's existing local overrides are
//! layered on top. The step is chosen through a [`Picker`].

use std::path::Path;

use log::{info, warn};

use super::overrides::apply_overrides;
use super::{reuse_source, reuse_step_names};
use crate::catalog::Catalog;
use crate::error::{Error, Result};
use crate::processor::Processor;
use crate::tekton::{Document, Pipeline, PipelineRun, Task, TaskRun};

/// Chooses one step name out of a list of candidates.
pub trait Picker {
    /// Return the chosen name, or an empty string for none.
    fn pick(&mut self, candidates: &[String]) -> Result<String>;
}

/// Always picks the same step, when it is a candidate.
#[derive(Debug, Clone)]
pub struct FixedPicker {
    step: String,
}

impl FixedPicker {
    pub fn new(step: &str) -> Self {
        Self {
            step: step.to_string(),
        }
    }
}

impl Picker for FixedPicker {
    fn pick(&mut self, candidates: &[String]) -> Result<String> {
        if candidates.contains(&self.step) {
            Ok(self.step.clone())
        } else {
            warn!(
                "step '{}' is not a reuse step; candidates are: {}",
                self.step,
                candidates.join(", ")
            );
            Ok(String::new())
        }
    }
}

pub struct Inliner<P: Picker> {
    catalog: Catalog,
    picker: P,
}

impl<P: Picker> Inliner<P> {
    pub fn new(catalog: Catalog, picker: P) -> Self {
        Self { catalog, picker }
    }

    fn inline<D: Document>(&mut self, doc: &mut D, path: &Path) -> Result<bool> {
        let candidates: Vec<String> = doc
            .task_specs_mut()
            .iter()
            .flat_map(|spec| reuse_step_names(spec))
            .collect();
        if candidates.is_empty() {
            info!("{} has no reuse steps to override", path.display());
            return Ok(false);
        }
        let choice = self.picker.pick(&candidates)?;
        if choice.is_empty() {
            return Ok(false);
        }

        for spec in doc.task_specs_mut() {
            let template = spec.step_template.clone();
            let Some(step) = spec.steps.iter_mut().find(|s| s.name == choice) else {
                continue;
            };
            let Some(source) = reuse_source(step, template.as_ref())? else {
                continue;
            };
            let catalog_spec = self.catalog.find_catalog_task_spec(&source)?;
            let Some(catalog_step) = catalog_spec.step(&choice) else {
                return Err(Error::CatalogStepNotFound {
                    step: choice,
                    reference: source.to_string(),
                });
            };

            let mut base = catalog_step.clone();
            if let Some(catalog_template) = &catalog_spec.step_template {
                if base.image.is_empty() {
                    base.image = catalog_template.image.clone();
                }
                if base.working_dir.is_empty() {
                    base.working_dir = catalog_template.working_dir.clone();
                }
            }
            let mut local = step.clone();
            local.image.clear();
            *step = apply_overrides(&base, &local);
            info!("inlined step '{}' from {}", choice, source);
            return Ok(true);
        }
        Ok(false)
    }
}

impl<P: Picker> Processor for Inliner<P> {
    fn process_pipeline(&mut self, pipeline: &mut Pipeline, path: &Path) -> Result<bool> {
        self.inline(pipeline, path)
    }

    fn process_pipeline_run(&mut self, run: &mut PipelineRun, path: &Path) -> Result<bool> {
        self.inline(run, path)
    }

    fn process_task(&mut self, task: &mut Task, path: &Path) -> Result<bool> {
        self.inline(task, path)
    }

    fn process_task_run(&mut self, run: &mut TaskRun, path: &Path) -> Result<bool> {
        self.inline(run, path)
    }
}
