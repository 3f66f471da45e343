//! # Pipeline Document Model
//!
//! Serde types for the subset of the Tekton `v1beta1` schema this crate
//! rewrites: `Pipeline`, `PipelineRun`, `Task` and `TaskRun`.
//!
//! Only the fields the transformations read or write are typed. Every other
//! field of a struct lands in its flattened `extra` mapping and is written
//! back unchanged, so a rewrite never drops data it does not understand.
//! Empty strings and empty lists are omitted on output, matching how the
//! pipeline engine's own tooling serializes these documents.

mod meta;
mod pipeline;
mod task;
pub mod validate;

pub use meta::ObjectMeta;
pub use pipeline::{
    Pipeline, PipelineRun, PipelineRunSpec, PipelineSpec, PipelineTask, PvcResources, PvcSpec,
    TaskRef, VolumeClaimTemplate, WorkspaceBinding, WorkspacePipelineTaskBinding,
};
pub use task::{
    EnvFromSource, EnvVar, LocalObjectRef, Param, ParamSpec, ParamValue, Step, Task, TaskRun,
    TaskRunSpec, TaskSpec, VolumeMount, WorkspaceDeclaration,
};

/// API version written on generated documents.
pub const API_VERSION: &str = "tekton.dev/v1beta1";

/// The document kinds the dispatcher understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    Pipeline,
    PipelineRun,
    Task,
    TaskRun,
}

impl Kind {
    pub fn from_name(name: &str) -> Option<Kind> {
        match name {
            "Pipeline" => Some(Kind::Pipeline),
            "PipelineRun" => Some(Kind::PipelineRun),
            "Task" => Some(Kind::Task),
            "TaskRun" => Some(Kind::TaskRun),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Kind::Pipeline => "Pipeline",
            Kind::PipelineRun => "PipelineRun",
            Kind::Task => "Task",
            Kind::TaskRun => "TaskRun",
        }
    }
}

impl std::fmt::Display for Kind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Uniform access to the parts of a document that processors visit.
pub trait Document {
    fn metadata(&self) -> &ObjectMeta;

    fn metadata_mut(&mut self) -> &mut ObjectMeta;

    /// Every task spec embedded in the document, in document order.
    fn task_specs_mut(&mut self) -> Vec<&mut TaskSpec>;
}

impl Document for Pipeline {
    fn metadata(&self) -> &ObjectMeta {
        &self.metadata
    }

    fn metadata_mut(&mut self) -> &mut ObjectMeta {
        &mut self.metadata
    }

    fn task_specs_mut(&mut self) -> Vec<&mut TaskSpec> {
        self.spec.task_specs_mut()
    }
}

impl Document for PipelineRun {
    fn metadata(&self) -> &ObjectMeta {
        &self.metadata
    }

    fn metadata_mut(&mut self) -> &mut ObjectMeta {
        &mut self.metadata
    }

    fn task_specs_mut(&mut self) -> Vec<&mut TaskSpec> {
        match self.spec.pipeline_spec.as_mut() {
            Some(spec) => spec.task_specs_mut(),
            None => Vec::new(),
        }
    }
}

impl Document for Task {
    fn metadata(&self) -> &ObjectMeta {
        &self.metadata
    }

    fn metadata_mut(&mut self) -> &mut ObjectMeta {
        &mut self.metadata
    }

    fn task_specs_mut(&mut self) -> Vec<&mut TaskSpec> {
        vec![&mut self.spec]
    }
}

impl Document for TaskRun {
    fn metadata(&self) -> &ObjectMeta {
        &self.metadata
    }

    fn metadata_mut(&mut self) -> &mut ObjectMeta {
        &mut self.metadata
    }

    fn task_specs_mut(&mut self) -> Vec<&mut TaskSpec> {
        self.spec.task_spec.iter_mut().collect()
    }
}
