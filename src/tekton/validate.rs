//! In-memory validation of generated documents against the constraints the
//! pipeline engine enforces on admission. Nothing is written to disk before
//! these checks pass.

use std::collections::HashSet;

use regex::Regex;

use super::{PipelineRun, PipelineSpec, PipelineTask, Task, TaskSpec};
use crate::error::{Error, Result};
use crate::reference::is_uses;

const DNS_LABEL: &str = r"^[a-z0-9]([-a-z0-9]*[a-z0-9])?$";
const MAX_NAME_LENGTH: usize = 63;

fn invalid(message: String) -> Error {
    Error::Validation { message }
}

fn check_name(re: &Regex, what: &str, name: &str) -> Result<()> {
    if name.len() > MAX_NAME_LENGTH || !re.is_match(name) {
        return Err(invalid(format!(
            "{} name '{}' must be a lowercase RFC 1123 label of at most {} characters",
            what, name, MAX_NAME_LENGTH
        )));
    }
    Ok(())
}

/// Validate a standalone Task.
pub fn validate_task(task: &Task) -> Result<()> {
    let re = Regex::new(DNS_LABEL)?;
    check_name(&re, "task", &task.metadata.name)?;
    validate_task_spec(&re, &task.metadata.name, &task.spec)
}

/// Validate a PipelineRun carrying an embedded pipeline spec.
pub fn validate_pipeline_run(run: &PipelineRun) -> Result<()> {
    let spec = run.spec.pipeline_spec.as_ref().ok_or_else(|| {
        invalid(format!(
            "pipelinerun '{}' has no pipelineSpec",
            run.metadata.name
        ))
    })?;
    validate_pipeline_spec(spec)?;

    let bound: HashSet<&str> = run.spec.workspaces.iter().map(|w| w.name.as_str()).collect();
    for ws in &spec.workspaces {
        if !bound.contains(ws.name.as_str()) {
            return Err(invalid(format!(
                "pipeline workspace '{}' is not bound by the pipelinerun",
                ws.name
            )));
        }
    }
    Ok(())
}

/// Validate the task graph of a pipeline spec.
pub fn validate_pipeline_spec(spec: &PipelineSpec) -> Result<()> {
    let re = Regex::new(DNS_LABEL)?;
    if spec.tasks.is_empty() {
        return Err(invalid("pipeline has no tasks".to_string()));
    }

    let declared: HashSet<&str> = spec.workspaces.iter().map(|w| w.name.as_str()).collect();
    let mut seen: HashSet<&str> = HashSet::new();
    for task in spec.tasks.iter().chain(spec.finally.iter()) {
        check_name(&re, "pipeline task", &task.name)?;
        if !seen.insert(task.name.as_str()) {
            return Err(invalid(format!(
                "pipeline task name '{}' is used more than once",
                task.name
            )));
        }
        for after in &task.run_after {
            if after == &task.name || !seen.contains(after.as_str()) {
                return Err(invalid(format!(
                    "pipeline task '{}' runs after unknown task '{}'",
                    task.name, after
                )));
            }
        }
        for binding in &task.workspaces {
            if !declared.contains(binding.workspace.as_str()) {
                return Err(invalid(format!(
                    "pipeline task '{}' binds undeclared workspace '{}'",
                    task.name, binding.workspace
                )));
            }
        }
        validate_pipeline_task(&re, task)?;
    }
    Ok(())
}

fn validate_pipeline_task(re: &Regex, task: &PipelineTask) -> Result<()> {
    match (&task.task_ref, &task.task_spec) {
        (Some(_), Some(_)) => Err(invalid(format!(
            "pipeline task '{}' has both taskRef and taskSpec",
            task.name
        ))),
        (None, None) => Err(invalid(format!(
            "pipeline task '{}' has neither taskRef nor taskSpec",
            task.name
        ))),
        (None, Some(spec)) => validate_task_spec(re, &task.name, spec),
        (Some(task_ref), None) => {
            if task_ref.resolver.is_empty() {
                if task_ref.name.is_empty() {
                    return Err(invalid(format!(
                        "pipeline task '{}' references a task without a name or resolver",
                        task.name
                    )));
                }
                return Ok(());
            }
            let has = |p: &str| task_ref.param(p).is_some_and(|v| !v.is_empty());
            let located = has("url") || (has("org") && has("repo"));
            if !located || !has("revision") || !has("pathInRepo") {
                return Err(invalid(format!(
                    "pipeline task '{}' resolver params need url or org/repo, revision and pathInRepo",
                    task.name
                )));
            }
            Ok(())
        }
    }
}

fn validate_task_spec(re: &Regex, owner: &str, spec: &TaskSpec) -> Result<()> {
    if spec.steps.is_empty() {
        return Err(invalid(format!("task '{}' has no steps", owner)));
    }
    let mut names = HashSet::new();
    for step in &spec.steps {
        if !step.name.is_empty() {
            check_name(re, "step", &step.name)?;
            if !names.insert(step.name.as_str()) {
                return Err(invalid(format!(
                    "task '{}' has more than one step named '{}'",
                    owner, step.name
                )));
            }
        }
        let image = step.effective_image(spec.step_template.as_ref());
        if image.is_empty() {
            return Err(invalid(format!(
                "step '{}' of task '{}' has no image",
                step.name, owner
            )));
        }
        if is_uses(image) {
            return Err(invalid(format!(
                "step '{}' of task '{}' still uses '{}' which the pipeline engine cannot run",
                step.name, owner, image
            )));
        }
    }
    let mut params = HashSet::new();
    for param in &spec.params {
        if !params.insert(param.name.as_str()) {
            return Err(invalid(format!(
                "task '{}' declares param '{}' more than once",
                owner, param.name
            )));
        }
    }
    Ok(())
}
