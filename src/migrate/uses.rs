//! # Catalog Migrator
//!
//! Rewrites materialized steps into `uses:` references.
//!
//! In the [`Direction::Catalog`] direction the repository being walked is the
//! catalog itself. Every pipeline under
//! `packs/<language>/.lighthouse/<trigger>/<file>.yaml` is copied verbatim to
//! `tasks/<language>/<file>.yaml`, then its step template is pointed at that
//! copy and each materialized step is reduced to its name.
//!
//! In the [`Direction::Repository`] direction the repository consumes the
//! catalog. A materialized step is replaced by a reference when the catalog
//! has a step of the same name running the same image (tags ignored), and
//! only the fields that differ from the catalog step are kept. Steps already
//! in reuse form have their overrides re-minimized. Steps without a catalog
//! counterpart stay as they are.
//!
//! Legacy step URL annotations are expanded in both directions before
//! anything else.

use std::path::{Component, Path, PathBuf};

use log::{debug, warn};
use serde::Serialize;

use super::annotations::convert_legacy_annotations;
use super::overrides::override_set;
use crate::catalog::Catalog;
use crate::config::{CatalogConfig, LayoutMismatch};
use crate::error::{Error, Result};
use crate::processor::{GeneratedFile, Processor};
use crate::reference::{is_uses, strip_image_tag, GitRef};
use crate::tekton::{Document, Pipeline, PipelineRun, Step, Task, TaskRun, TaskSpec};

/// Which side of the catalog the walked repository is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// The repository is the catalog.
    Catalog,
    /// The repository consumes the catalog.
    Repository,
}

pub struct UsesMigrator {
    direction: Direction,
    root: PathBuf,
    settings: CatalogConfig,
    layout_mismatch: LayoutMismatch,
    catalog: Catalog,
    pending: Vec<GeneratedFile>,
}

impl UsesMigrator {
    /// `root` is the directory being walked; catalog paths are computed
    /// relative to it.
    pub fn new(
        direction: Direction,
        root: impl Into<PathBuf>,
        settings: CatalogConfig,
        catalog: Catalog,
    ) -> Self {
        Self {
            direction,
            root: root.into(),
            settings,
            layout_mismatch: LayoutMismatch::default(),
            catalog,
            pending: Vec::new(),
        }
    }

    pub fn with_layout_mismatch(mut self, policy: LayoutMismatch) -> Self {
        self.layout_mismatch = policy;
        self
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    fn migrate<D: Document + Serialize>(&mut self, doc: &mut D, path: &Path) -> Result<bool> {
        let mut changed =
            convert_legacy_annotations(doc, &self.settings.owner, &self.settings.repo)?;
        changed |= match self.direction {
            Direction::Catalog => self.to_catalog(doc, path)?,
            Direction::Repository => self.to_repository(doc, path)?,
        };
        Ok(changed)
    }

    fn to_catalog<D: Document + Serialize>(&mut self, doc: &mut D, path: &Path) -> Result<bool> {
        if !doc.task_specs_mut().iter().any(|s| s.has_materialized_steps()) {
            return Ok(false);
        }
        let Some(task_path) = catalog_task_path(&self.root, path) else {
            match self.layout_mismatch {
                LayoutMismatch::Ignore => debug!(
                    "{} is not under packs/<language>/.lighthouse/<trigger>/",
                    path.display()
                ),
                LayoutMismatch::Warn => warn!(
                    "skipping {}: not under packs/<language>/.lighthouse/<trigger>/",
                    path.display()
                ),
            }
            return Ok(false);
        };

        for spec in doc.task_specs_mut() {
            let template = spec.step_template.as_ref();
            let unnamed = spec.steps.iter().find(|s| {
                let image = s.effective_image(template);
                s.name.is_empty() && !image.is_empty() && !is_uses(image)
            });
            if let Some(step) = unnamed {
                return Err(Error::structural(format!(
                    "a step running '{}' has no name and cannot be referenced from the catalog",
                    step.effective_image(template)
                )));
            }
        }

        self.pending
            .push(GeneratedFile::yaml(self.root.join(&task_path), &*doc)?);

        let uses = self.catalog_ref(&task_path).to_uses();
        for spec in doc.task_specs_mut() {
            if !spec.has_materialized_steps() {
                continue;
            }
            let template = spec.step_template.get_or_insert_with(Step::default);
            let inherited = template.image.clone();
            template.image = uses.clone();
            for step in spec.steps.iter_mut() {
                let image = if step.image.is_empty() {
                    inherited.as_str()
                } else {
                    step.image.as_str()
                };
                if !image.is_empty() && !is_uses(image) {
                    *step = Step::named(&step.name);
                }
            }
        }
        debug!("{} now references {}", path.display(), uses);
        Ok(true)
    }

    fn to_repository<D: Document>(&mut self, doc: &mut D, path: &Path) -> Result<bool> {
        let pack_source = self.pack_source(path);
        let mut changed = false;
        for spec in doc.task_specs_mut() {
            changed |= self.task_to_repository(spec, pack_source.as_ref())?;
        }
        Ok(changed)
    }

    /// The pack task a pipeline file maps to, when a pack is configured.
    fn pack_source(&self, path: &Path) -> Option<GitRef> {
        let (Some(pack), Some(file)) = (
            self.settings.pack.as_deref(),
            path.file_name().and_then(|f| f.to_str()),
        ) else {
            return None;
        };
        Some(self.catalog_ref(&format!("tasks/{}/{}", pack, file)))
    }

    /// Reference to a file in the configured catalog repository.
    fn catalog_ref(&self, path_in_repo: &str) -> GitRef {
        GitRef::new(
            &self.settings.host,
            &self.settings.owner,
            &self.settings.repo,
            path_in_repo,
            &self.settings.revision,
        )
    }

    fn task_to_repository(&mut self, spec: &mut TaskSpec, pack_source: Option<&GitRef>) -> Result<bool> {
        let template = spec.step_template.clone();
        let template_image = spec.template_image().to_string();
        let template_source = GitRef::parse(&template_image, None, None)?;
        let task_source = template_source.as_ref().or(pack_source);

        let mut changed = false;
        for step in spec.steps.iter_mut() {
            if step.name.is_empty() {
                continue;
            }
            let rewritten = if step.is_reuse() {
                let source = GitRef::parse(&step.image, None, None)?;
                self.reminimize(step, source.as_ref())?
            } else if step.image.is_empty() && template_source.is_some() {
                self.reminimize(step, template_source.as_ref())?
            } else {
                match task_source {
                    Some(source) => {
                        self.materialized_to_reuse(step, template.as_ref(), source, &template_image)?
                    }
                    None => None,
                }
            };
            if let Some(new_step) = rewritten {
                if new_step != *step {
                    debug!("rewrote step '{}'", step.name);
                    *step = new_step;
                    changed = true;
                }
            }
        }
        Ok(changed)
    }

    /// Drop overrides of a reuse step that the catalog step already has.
    fn reminimize(&mut self, step: &Step, source: Option<&GitRef>) -> Result<Option<Step>> {
        let Some(source) = source else {
            return Ok(None);
        };
        let Some((catalog_step, _)) = self.catalog.find_catalog_step(source, &step.name)? else {
            return Ok(None);
        };
        let mut reduced = override_set(step, &catalog_step);
        reduced.image = step.image.clone();
        Ok(Some(reduced))
    }

    fn materialized_to_reuse(
        &mut self,
        step: &Step,
        template: Option<&Step>,
        source: &GitRef,
        template_image: &str,
    ) -> Result<Option<Step>> {
        let Some((catalog_step, catalog_template)) =
            self.catalog.find_catalog_step(source, &step.name)?
        else {
            debug!("step '{}' is not in {}, keeping it", step.name, source);
            return Ok(None);
        };
        let local_image = strip_image_tag(step.effective_image(template));
        let catalog_image = strip_image_tag(catalog_step.effective_image(catalog_template.as_ref()));
        if local_image != catalog_image {
            debug!(
                "step '{}' runs {} but the catalog runs {}, keeping it",
                step.name, local_image, catalog_image
            );
            return Ok(None);
        }

        // Compare against the catalog step as it runs, including what its
        // template supplies.
        let mut baseline = catalog_step;
        if baseline.working_dir.is_empty() {
            if let Some(t) = &catalog_template {
                baseline.working_dir = t.working_dir.clone();
            }
        }
        let mut local = step.clone();
        if local.working_dir.is_empty() {
            if let Some(t) = template {
                local.working_dir = t.working_dir.clone();
            }
        }

        let mut reduced = override_set(&local, &baseline);
        let uses = source.to_uses();
        if uses != template_image {
            reduced.image = uses;
        }
        Ok(Some(reduced))
    }
}

/// Map `packs/<language>/.lighthouse/<trigger>/<file>.yaml` (relative to
/// `root`) to `tasks/<language>/<file>.yaml`.
pub fn catalog_task_path(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let parts: Vec<&str> = relative
        .components()
        .filter(|c| !matches!(c, Component::CurDir))
        .map(|c| c.as_os_str().to_str())
        .collect::<Option<_>>()?;
    match parts.as_slice() {
        ["packs", language, ".lighthouse", _trigger, file]
            if file.ends_with(".yaml") && !language.is_empty() =>
        {
            Some(format!("tasks/{}/{}", language, file))
        }
        _ => None,
    }
}

impl Processor for UsesMigrator {
    fn process_pipeline(&mut self, pipeline: &mut Pipeline, path: &Path) -> Result<bool> {
        self.migrate(pipeline, path)
    }

    fn process_pipeline_run(&mut self, run: &mut PipelineRun, path: &Path) -> Result<bool> {
        self.migrate(run, path)
    }

    fn process_task(&mut self, task: &mut Task, path: &Path) -> Result<bool> {
        self.migrate(task, path)
    }

    fn process_task_run(&mut self, run: &mut TaskRun, path: &Path) -> Result<bool> {
        self.migrate(run, path)
    }

    fn take_generated(&mut self) -> Vec<GeneratedFile> {
        std::mem::take(&mut self.pending)
    }
}
