//! Override sets: the parts of a local step that differ from its catalog
//! baseline.
//!
//! `script`, `command`, `args` and `workingDir` are compared as whole
//! fields. `env`, `envFrom` and `volumeMounts` are compared per entry, so a
//! step that changes one environment variable keeps only that variable.
//! Unknown step fields are compared per key.

use crate::tekton::Step;

/// Reduce `local` to the fields that differ from `catalog`.
///
/// The result carries the local name and no image; the caller decides which
/// image the reuse-form step is written with.
pub fn override_set(local: &Step, catalog: &Step) -> Step {
    let mut out = Step::named(&local.name);

    if !local.script.is_empty() && local.script != catalog.script {
        out.script = local.script.clone();
    }
    if !local.command.is_empty() && local.command != catalog.command {
        out.command = local.command.clone();
    }
    if !local.args.is_empty() && local.args != catalog.args {
        out.args = local.args.clone();
    }
    if !local.working_dir.is_empty() && local.working_dir != catalog.working_dir {
        out.working_dir = local.working_dir.clone();
    }

    out.env = missing_from(&local.env, &catalog.env);
    out.env_from = missing_from(&local.env_from, &catalog.env_from);
    out.volume_mounts = missing_from(&local.volume_mounts, &catalog.volume_mounts);

    for (key, value) in &local.extra {
        if catalog.extra.get(key) != Some(value) {
            out.extra.insert(key.clone(), value.clone());
        }
    }
    out
}

/// Layer the overrides of `local` on top of a copy of `base`.
///
/// Whole fields replace the base value when set locally. Environment
/// variables and volume mounts replace the base entry of the same name or
/// are appended; `envFrom` entries are appended unless already present.
pub fn apply_overrides(base: &Step, local: &Step) -> Step {
    let mut out = base.clone();
    if !local.name.is_empty() {
        out.name = local.name.clone();
    }
    if !local.script.is_empty() {
        out.script = local.script.clone();
    }
    if !local.command.is_empty() {
        out.command = local.command.clone();
    }
    if !local.args.is_empty() {
        out.args = local.args.clone();
    }
    if !local.working_dir.is_empty() {
        out.working_dir = local.working_dir.clone();
    }

    for env in &local.env {
        match out.env.iter_mut().find(|e| e.name == env.name) {
            Some(existing) => *existing = env.clone(),
            None => out.env.push(env.clone()),
        }
    }
    for env_from in &local.env_from {
        if !out.env_from.contains(env_from) {
            out.env_from.push(env_from.clone());
        }
    }
    for mount in &local.volume_mounts {
        match out.volume_mounts.iter_mut().find(|m| m.name == mount.name) {
            Some(existing) => *existing = mount.clone(),
            None => out.volume_mounts.push(mount.clone()),
        }
    }
    for (key, value) in &local.extra {
        out.extra.insert(key.clone(), value.clone());
    }
    out
}

fn missing_from<T: Clone + PartialEq>(local: &[T], catalog: &[T]) -> Vec<T> {
    local
        .iter()
        .filter(|entry| !catalog.contains(entry))
        .cloned()
        .collect()
}
