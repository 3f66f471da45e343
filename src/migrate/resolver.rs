//! # Runtime-Resolver Migrator
//!
//! Converts a flattened PipelineRun (one embedded task whose steps come from
//! a step template) into structures the pipeline engine resolves on its own
//! at run time.
//!
//! - A **parent** definition (no step template, or one with a concrete
//!   image) is split into one standalone `Task` file per materialized step,
//!   written to `<dir>/<pipelinerun file stem>/<step>.yaml`. The PipelineRun
//!   itself is left as it is.
//! - A **child** definition (step template image is a `uses:` reference) is
//!   replaced by a new PipelineRun whose tasks reference the catalog through
//!   a resolver, sharing one workspace.
//!
//! Every step maps to one pipeline task, chained linearly with `runAfter`.
//! Generated documents are validated before anything is queued.

use std::path::{Path, PathBuf};

use log::debug;

use super::lighthouse;
use crate::config::ResolverConfig;
use crate::error::{Error, Result};
use crate::processor::{GeneratedFile, Processor};
use crate::reference::{is_uses, GitRef, GitResolverRef};
use crate::tekton::validate::{validate_pipeline_run, validate_pipeline_spec, validate_task};
use crate::tekton::{
    ObjectMeta, Pipeline, PipelineRun, PipelineRunSpec, PipelineSpec, PipelineTask, Step, Task,
    TaskRef, TaskRun, TaskSpec, VolumeClaimTemplate, WorkspaceBinding, WorkspaceDeclaration,
    WorkspacePipelineTaskBinding,
};

/// Workspace shared by every task of a generated PipelineRun.
pub const PIPELINE_WORKSPACE: &str = "pipeline-ws";

/// Workspace name catalog tasks declare for their checkout.
pub const TASK_WORKSPACE: &str = "output";

/// How a flattened PipelineRun is converted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Definition {
    Parent,
    Child,
}

/// Where a single step's task comes from.
#[derive(Debug, Clone, PartialEq)]
enum StepSource {
    /// Resolved from the catalog at run time.
    Resolver(GitRef),
    /// Carried locally, with the template working directory applied.
    Materialized(Step),
}

pub struct ResolverMigrator {
    settings: ResolverConfig,
    pending: Vec<GeneratedFile>,
}

impl ResolverMigrator {
    pub fn new(settings: ResolverConfig) -> Self {
        Self {
            settings,
            pending: Vec::new(),
        }
    }

    fn convert(&mut self, run: &mut PipelineRun, path: &Path) -> Result<bool> {
        let Some(spec) = run.spec.pipeline_spec.as_ref() else {
            debug!("{} has no pipelineSpec", path.display());
            return Ok(false);
        };
        if is_runtime_form(spec) {
            debug!("{} already uses resolver task references", path.display());
            return Ok(false);
        }
        let count = spec.embedded_task_count();
        if count != 1 {
            return Err(Error::structural(format!(
                "pipelinerun '{}' should have exactly 1 embedded task but has {}",
                run.metadata.name, count
            )));
        }
        let task_spec = spec
            .tasks
            .iter()
            .chain(spec.finally.iter())
            .find_map(|t| t.task_spec.clone())
            .unwrap_or_default();

        match classify(&task_spec) {
            Definition::Parent => {
                let files = self.split_into_tasks(run, &task_spec, path)?;
                self.pending.extend(files);
                Ok(false)
            }
            Definition::Child => {
                *run = self.child_pipeline_run(run, &task_spec)?;
                Ok(true)
            }
        }
    }

    /// Standalone Task files for a parent definition.
    fn split_into_tasks(
        &self,
        run: &PipelineRun,
        spec: &TaskSpec,
        path: &Path,
    ) -> Result<Vec<GeneratedFile>> {
        let dir = tasks_dir(path)?;
        let mut files = Vec::new();
        let mut tasks = Vec::new();

        for step in &spec.steps {
            let (name, task) = match step_source(step, spec.step_template.as_ref())? {
                StepSource::Resolver(git_ref) => {
                    let name = task_name(step, &git_ref);
                    let task_ref = self.resolver_ref(git_ref);
                    (name, task_ref)
                }
                StepSource::Materialized(step) => {
                    let task = standalone_task(spec, step)?;
                    validate_task(&task)?;
                    let name = task.metadata.name.clone();
                    files.push(GeneratedFile::yaml(dir.join(format!("{}.yaml", name)), &task)?);
                    let task_ref = TaskRef {
                        name: name.clone(),
                        kind: "Task".to_string(),
                        ..TaskRef::default()
                    };
                    (name, task_ref)
                }
            };
            tasks.push(PipelineTask {
                name,
                task_ref: Some(task),
                ..PipelineTask::default()
            });
        }
        chain(&mut tasks);

        let pipeline = PipelineSpec {
            tasks,
            ..PipelineSpec::default()
        };
        validate_pipeline_spec(&pipeline).map_err(|e| match e {
            Error::Validation { message } => Error::Validation {
                message: format!("tasks generated for '{}': {}", run.metadata.name, message),
            },
            other => other,
        })?;
        debug!(
            "{} splits into {} task files under {}",
            path.display(),
            files.len(),
            dir.display()
        );
        Ok(files)
    }

    /// The replacement PipelineRun for a child definition.
    fn child_pipeline_run(&self, run: &PipelineRun, spec: &TaskSpec) -> Result<PipelineRun> {
        let mut tasks = Vec::new();
        for step in &spec.steps {
            let task = match step_source(step, spec.step_template.as_ref())? {
                StepSource::Resolver(git_ref) => PipelineTask {
                    name: task_name(step, &git_ref),
                    params: lighthouse::pass_through_params(),
                    task_ref: Some(self.resolver_ref(git_ref)),
                    workspaces: vec![WorkspacePipelineTaskBinding {
                        name: TASK_WORKSPACE.to_string(),
                        workspace: PIPELINE_WORKSPACE.to_string(),
                        ..WorkspacePipelineTaskBinding::default()
                    }],
                    ..PipelineTask::default()
                },
                StepSource::Materialized(step) => {
                    let mut template = spec.step_template.clone();
                    if let Some(t) = template.as_mut() {
                        t.image.clear();
                    }
                    PipelineTask {
                        name: step.name.clone(),
                        task_spec: Some(TaskSpec {
                            step_template: template.filter(|t| *t != Step::default()),
                            steps: vec![step],
                            ..TaskSpec::default()
                        }),
                        ..PipelineTask::default()
                    }
                }
            };
            tasks.push(task);
        }
        chain(&mut tasks);

        let converted = PipelineRun {
            api_version: run.api_version.clone(),
            kind: run.kind.clone(),
            metadata: run.metadata.clone(),
            spec: PipelineRunSpec {
                params: run.spec.params.clone(),
                pipeline_spec: Some(PipelineSpec {
                    params: lighthouse::param_specs(),
                    tasks,
                    workspaces: vec![WorkspaceDeclaration::named(PIPELINE_WORKSPACE)],
                    ..PipelineSpec::default()
                }),
                service_account_name: self.settings.service_account.clone(),
                workspaces: vec![WorkspaceBinding {
                    name: PIPELINE_WORKSPACE.to_string(),
                    volume_claim_template: Some(VolumeClaimTemplate::with_storage(
                        &self.settings.workspace_volume_quantity,
                    )),
                    ..WorkspaceBinding::default()
                }],
                extra: run.spec.extra.clone(),
                ..PipelineRunSpec::default()
            },
            extra: run.extra.clone(),
        };
        validate_pipeline_run(&converted)?;
        Ok(converted)
    }

    fn resolver_ref(&self, git_ref: GitRef) -> TaskRef {
        let params = GitResolverRef::new(git_ref, self.settings.public).to_params();
        TaskRef::resolver(&self.settings.name, params)
    }
}

/// Parent or child, decided by the step template image.
pub fn classify(spec: &TaskSpec) -> Definition {
    match &spec.step_template {
        Some(template) if is_uses(&template.image) => Definition::Child,
        _ => Definition::Parent,
    }
}

/// True for a pipeline this migrator produced: flattened pipelines never
/// reference tasks through a resolver or declare the shared workspace.
fn is_runtime_form(spec: &PipelineSpec) -> bool {
    spec.tasks
        .iter()
        .chain(spec.finally.iter())
        .any(|t| t.is_resolver_ref())
        || spec.workspaces.iter().any(|w| w.name == PIPELINE_WORKSPACE)
}

fn step_source(step: &Step, template: Option<&Step>) -> Result<StepSource> {
    if step.is_reuse() {
        return Ok(StepSource::Resolver(parse_required(&step.image, None)?));
    }
    if !step.image.is_empty() {
        return Ok(StepSource::Materialized(with_template_dir(step, template)));
    }
    match template {
        Some(t) if is_uses(&t.image) => {
            let Some(name) = Some(step.name.as_str()).filter(|n| !n.is_empty()) else {
                return Err(Error::structural(format!(
                    "a step inheriting '{}' has no name to address it by",
                    t.image
                )));
            };
            Ok(StepSource::Resolver(parse_required(&t.image, Some(name))?))
        }
        Some(t) if !t.image.is_empty() => {
            Ok(StepSource::Materialized(with_template_dir(step, template)))
        }
        _ => Err(Error::structural(format!(
            "step '{}' has no image and its task has no step template image",
            step.name
        ))),
    }
}

fn parse_required(image: &str, step_name: Option<&str>) -> Result<GitRef> {
    GitRef::parse(image, step_name, None)?.ok_or_else(|| Error::Reference {
        reference: image.to_string(),
        message: "not a uses: reference".to_string(),
    })
}

fn with_template_dir(step: &Step, template: Option<&Step>) -> Step {
    let mut step = step.clone();
    if step.working_dir.is_empty() {
        if let Some(t) = template {
            step.working_dir = t.working_dir.clone();
        }
    }
    step
}

fn task_name(step: &Step, git_ref: &GitRef) -> String {
    if step.name.is_empty() {
        git_ref.parent_file_name()
    } else {
        step.name.clone()
    }
}

/// Make every task run after the one before it.
fn chain(tasks: &mut [PipelineTask]) {
    for i in 1..tasks.len() {
        let previous = tasks[i - 1].name.clone();
        tasks[i].run_after = vec![previous];
    }
}

/// `<dir>/<file stem>` of the PipelineRun file.
fn tasks_dir(path: &Path) -> Result<PathBuf> {
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| {
            Error::structural(format!(
                "cannot derive a task directory from {}",
                path.display()
            ))
        })?;
    Ok(path.with_file_name(stem))
}

/// A standalone Task for one materialized step of a parent definition.
fn standalone_task(parent: &TaskSpec, step: Step) -> Result<Task> {
    if step.name.is_empty() {
        return Err(Error::structural(format!(
            "a step running '{}' has no name to name its task after",
            step.image
        )));
    }
    let mut spec = TaskSpec {
        params: parent.params.clone(),
        step_template: parent.step_template.clone(),
        workspaces: parent.workspaces.clone(),
        ..TaskSpec::default()
    };
    let name = step.name.clone();
    spec.steps.push(step);
    lighthouse::inject_defaults(&mut spec);
    Ok(Task {
        metadata: ObjectMeta::named(&name),
        spec,
        ..Task::default()
    })
}

impl Processor for ResolverMigrator {
    fn process_pipeline(&mut self, _pipeline: &mut Pipeline, _path: &Path) -> Result<bool> {
        Ok(false)
    }

    fn process_pipeline_run(&mut self, run: &mut PipelineRun, path: &Path) -> Result<bool> {
        self.convert(run, path)
    }

    fn process_task(&mut self, _task: &mut Task, _path: &Path) -> Result<bool> {
        Ok(false)
    }

    fn process_task_run(&mut self, _run: &mut TaskRun, _path: &Path) -> Result<bool> {
        Ok(false)
    }

    fn take_generated(&mut self) -> Vec<GeneratedFile> {
        std::mem::take(&mut self.pending)
    }
}
