use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_yaml::Mapping;

use super::meta::ObjectMeta;
use super::task::{Param, ParamSpec, TaskSpec, WorkspaceDeclaration};
use super::{API_VERSION, Kind};

/// A reference to a task, either by name or through a resolver.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskRef {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub resolver: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub params: Vec<Param>,
    #[serde(flatten)]
    pub extra: Mapping,
}

impl TaskRef {
    pub fn resolver(resolver: &str, params: Vec<Param>) -> Self {
        Self {
            resolver: resolver.to_string(),
            params,
            ..Self::default()
        }
    }

    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|p| p.name == name)
            .and_then(|p| p.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkspacePipelineTaskBinding {
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub workspace: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub sub_path: String,
}

/// One task slot of a pipeline: an embedded spec or a reference.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineTask {
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub params: Vec<Param>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub run_after: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_ref: Option<TaskRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_spec: Option<TaskSpec>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub workspaces: Vec<WorkspacePipelineTaskBinding>,
    #[serde(flatten)]
    pub extra: Mapping,
}

impl PipelineTask {
    /// True if the slot resolves its task through a resolver at run time.
    pub fn is_resolver_ref(&self) -> bool {
        self.task_spec.is_none()
            && self
                .task_ref
                .as_ref()
                .is_some_and(|r| !r.resolver.is_empty())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineSpec {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub params: Vec<ParamSpec>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tasks: Vec<PipelineTask>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub finally: Vec<PipelineTask>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub workspaces: Vec<WorkspaceDeclaration>,
    #[serde(flatten)]
    pub extra: Mapping,
}

impl PipelineSpec {
    pub fn task_specs_mut(&mut self) -> Vec<&mut TaskSpec> {
        self.tasks
            .iter_mut()
            .chain(self.finally.iter_mut())
            .filter_map(|t| t.task_spec.as_mut())
            .collect()
    }

    /// Number of task slots carrying an embedded spec.
    pub fn embedded_task_count(&self) -> usize {
        self.tasks
            .iter()
            .chain(self.finally.iter())
            .filter(|t| t.task_spec.is_some())
            .count()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pipeline {
    pub api_version: String,
    pub kind: String,
    #[serde(default)]
    pub metadata: ObjectMeta,
    #[serde(default)]
    pub spec: PipelineSpec,
    #[serde(flatten)]
    pub extra: Mapping,
}

impl Default for Pipeline {
    fn default() -> Self {
        Self {
            api_version: API_VERSION.to_string(),
            kind: Kind::Pipeline.as_str().to_string(),
            metadata: ObjectMeta::default(),
            spec: PipelineSpec::default(),
            extra: Mapping::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PvcResources {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub requests: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PvcSpec {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub access_modes: Vec<String>,
    #[serde(default)]
    pub resources: PvcResources,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VolumeClaimTemplate {
    pub spec: PvcSpec,
}

impl VolumeClaimTemplate {
    /// A single-writer claim requesting `quantity` of storage.
    pub fn with_storage(quantity: &str) -> Self {
        let mut requests = BTreeMap::new();
        requests.insert("storage".to_string(), quantity.to_string());
        Self {
            spec: PvcSpec {
                access_modes: vec!["ReadWriteOnce".to_string()],
                resources: PvcResources { requests },
            },
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceBinding {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume_claim_template: Option<VolumeClaimTemplate>,
    #[serde(flatten)]
    pub extra: Mapping,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineRunSpec {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub params: Vec<Param>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pipeline_ref: Option<serde_yaml::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pipeline_spec: Option<PipelineSpec>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub service_account_name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub workspaces: Vec<WorkspaceBinding>,
    #[serde(flatten)]
    pub extra: Mapping,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineRun {
    pub api_version: String,
    pub kind: String,
    #[serde(default)]
    pub metadata: ObjectMeta,
    #[serde(default)]
    pub spec: PipelineRunSpec,
    #[serde(flatten)]
    pub extra: Mapping,
}

impl Default for PipelineRun {
    fn default() -> Self {
        Self {
            api_version: API_VERSION.to_string(),
            kind: Kind::PipelineRun.as_str().to_string(),
            metadata: ObjectMeta::default(),
            spec: PipelineRunSpec::default(),
            extra: Mapping::new(),
        }
    }
}
