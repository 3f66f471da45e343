//! Default build parameters supplied by Lighthouse to every pipeline.
//!
//! Standalone Tasks generated from a flattened PipelineRun no longer get
//! these values from pipeline-run expansion, so they declare them as params
//! and bind them into the step template environment.

use crate::tekton::{
    EnvFromSource, EnvVar, LocalObjectRef, Param, ParamSpec, ParamValue, Step, TaskSpec,
};

/// Home directory forced onto generated tasks.
pub const HOME_DIR: &str = "/workspace";

/// Secret holding the job environment variables.
pub const JOB_ENV_SECRET: &str = "jx-boot-job-env-vars";

/// `(name, description, has an empty default)` for each parameter.
const PARAMS: [(&str, &str, bool); 13] = [
    ("BUILD_ID", "the unique build number", false),
    ("JOB_NAME", "the name of the job which is the trigger context name", false),
    ("JOB_SPEC", "the specification of the job", false),
    ("JOB_TYPE", "the kind of job: postsubmit or presubmit", false),
    ("PULL_BASE_REF", "the base git reference of the pull request", false),
    ("PULL_BASE_SHA", "the git sha of the base of the pull request", false),
    ("PULL_NUMBER", "git pull request number", true),
    ("PULL_PULL_REF", "git pull request ref in the form 'refs/pull/$PULL_NUMBER/head'", true),
    ("PULL_PULL_SHA", "git revision to checkout (branch, tag, sha, ref)", true),
    (
        "PULL_REFS",
        "git pull reference strings of base and latest in the form 'master:$PULL_BASE_SHA,$PULL_NUMBER:$PULL_PULL_SHA:refs/pull/$PULL_NUMBER/head'",
        false,
    ),
    ("REPO_NAME", "git repository name", false),
    ("REPO_OWNER", "git repository owner (user or organisation)", false),
    ("REPO_URL", "git url to clone", false),
];

/// Names of the default parameters, in declaration order.
pub fn param_names() -> impl Iterator<Item = &'static str> {
    PARAMS.iter().map(|(name, _, _)| *name)
}

/// Parameter declarations for the default parameters.
pub fn param_specs() -> Vec<ParamSpec> {
    PARAMS
        .iter()
        .map(|(name, description, empty_default)| ParamSpec {
            name: name.to_string(),
            kind: "string".to_string(),
            description: description.to_string(),
            default: empty_default.then(|| ParamValue::String(String::new())),
            ..ParamSpec::default()
        })
        .collect()
}

/// `NAME: $(params.NAME)` bindings passing every default parameter through.
pub fn pass_through_params() -> Vec<Param> {
    param_names()
        .map(|name| Param::string(name, &format!("$(params.{})", name)))
        .collect()
}

fn job_env_from() -> EnvFromSource {
    EnvFromSource {
        secret_ref: Some(LocalObjectRef {
            name: JOB_ENV_SECRET.to_string(),
            optional: Some(true),
        }),
        ..EnvFromSource::default()
    }
}

/// Add the default parameters and their environment bindings to a task.
///
/// Existing params and env vars with the same name are left where they are;
/// `HOME` is the one variable whose value is overwritten. Returns whether
/// anything changed.
pub fn inject_defaults(spec: &mut TaskSpec) -> bool {
    let mut changed = false;

    for param in param_specs() {
        if !spec.params.iter().any(|p| p.name == param.name) {
            spec.params.push(param);
            changed = true;
        }
    }

    let template = spec.step_template.get_or_insert_with(|| {
        changed = true;
        Step::default()
    });
    for name in param_names() {
        if template.env_var(name).is_none() {
            template
                .env
                .push(EnvVar::new(name, &format!("$(params.{})", name)));
            changed = true;
        }
    }

    match template.env.iter().position(|e| e.name == "HOME") {
        Some(i) => {
            let home = &mut template.env[i];
            if home.value != HOME_DIR || home.value_from.is_some() {
                home.value = HOME_DIR.to_string();
                home.value_from = None;
                changed = true;
            }
        }
        None => {
            template.env.push(EnvVar::new("HOME", HOME_DIR));
            changed = true;
        }
    }

    let has_secret = template.env_from.iter().any(|e| {
        e.secret_ref
            .as_ref()
            .is_some_and(|s| s.name == JOB_ENV_SECRET)
    });
    if !has_secret {
        template.env_from.push(job_env_from());
        changed = true;
    }
    changed
}
