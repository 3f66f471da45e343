//! Template-Env Modifier: sets step template environment variables on every
//! task of a document.

use std::path::Path;

use crate::error::Result;
use crate::processor::Processor;
use crate::tekton::{Document, EnvVar, Pipeline, PipelineRun, Step, Task, TaskRun};

#[derive(Debug, Clone, Default)]
pub struct EnvModifier {
    vars: Vec<(String, String)>,
}

impl EnvModifier {
    pub fn new<I, K, V>(vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            vars: vars
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    fn modify<D: Document>(&self, doc: &mut D) -> bool {
        if self.vars.is_empty() {
            return false;
        }
        let mut changed = false;
        for spec in doc.task_specs_mut() {
            let template = spec.step_template.get_or_insert_with(|| {
                changed = true;
                Step::default()
            });
            for (name, value) in &self.vars {
                match template.env.iter().position(|e| &e.name == name) {
                    Some(i) => {
                        let env = &mut template.env[i];
                        if &env.value != value || env.value_from.is_some() {
                            env.value = value.clone();
                            env.value_from = None;
                            changed = true;
                        }
                    }
                    None => {
                        template.env.push(EnvVar::new(name, value));
                        changed = true;
                    }
                }
            }
        }
        changed
    }
}

impl Processor for EnvModifier {
    fn process_pipeline(&mut self, pipeline: &mut Pipeline, _path: &Path) -> Result<bool> {
        Ok(self.modify(pipeline))
    }

    fn process_pipeline_run(&mut self, run: &mut PipelineRun, _path: &Path) -> Result<bool> {
        Ok(self.modify(run))
    }

    fn process_task(&mut self, task: &mut Task, _path: &Path) -> Result<bool> {
        Ok(self.modify(task))
    }

    fn process_task_run(&mut self, run: &mut TaskRun, _path: &Path) -> Result<bool> {
        Ok(self.modify(run))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(yaml: &str) -> Task {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn test_appends_and_overwrites() {
        let mut doc = task(
            r#"
apiVersion: tekton.dev/v1beta1
kind: Task
metadata:
  name: build
spec:
  stepTemplate:
    env:
    - name: GOPROXY
      value: direct
    - name: KEEP
      value: me
  steps:
  - name: build
    image: golang:1.21
"#,
        );
        let mut modifier = EnvModifier::new([("GOPROXY", "https://proxy.golang.org"), ("CGO_ENABLED", "0")]);

        assert!(modifier.process_task(&mut doc, Path::new("t.yaml")).unwrap());
        let env = &doc.spec.step_template.as_ref().unwrap().env;
        assert_eq!(
            env,
            &vec![
                EnvVar::new("GOPROXY", "https://proxy.golang.org"),
                EnvVar::new("KEEP", "me"),
                EnvVar::new("CGO_ENABLED", "0"),
            ]
        );

        assert!(!modifier.process_task(&mut doc, Path::new("t.yaml")).unwrap());
    }

    #[test]
    fn test_creates_missing_step_template() {
        let mut doc = PipelineRun::default();
        doc.spec.pipeline_spec = Some(serde_yaml::from_str(
            r#"
tasks:
- name: a
  taskSpec:
    steps:
    - name: one
      image: alpine
- name: b
  taskSpec:
    steps:
    - name: two
      image: alpine
"#,
        )
        .unwrap());
        let mut modifier = EnvModifier::new([("FOO", "bar")]);

        assert!(modifier.process_pipeline_run(&mut doc, Path::new("r.yaml")).unwrap());
        for spec in doc.task_specs_mut() {
            let template = spec.step_template.as_ref().unwrap();
            assert_eq!(template.env_var("FOO").unwrap().value, "bar");
        }
    }

    #[test]
    fn test_no_vars_is_no_change() {
        let mut doc = Task::default();
        let mut modifier = EnvModifier::default();
        assert!(!modifier.process_task(&mut doc, Path::new("t.yaml")).unwrap());
        assert!(doc.spec.step_template.is_none());
    }
}
