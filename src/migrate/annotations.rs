//! Conversion of the legacy `prependStepURL` / `appendStepURL` annotations.
//!
//! Older pipelines named a raw content URL in a document annotation to run
//! an extra step before or after all others. The annotation is replaced by a
//! synthetic unnamed step whose image is the equivalent `uses:` reference.

use log::debug;

use crate::error::{Error, Result};
use crate::reference::uses_from_raw_url;
use crate::tekton::{Document, Step};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Position {
    Prepend,
    Append,
}

fn legacy_position(key: &str) -> Option<Position> {
    let name = key.rsplit('/').next().unwrap_or(key);
    match name {
        "prependStepURL" | "prependStepsURL" => Some(Position::Prepend),
        "appendStepURL" | "appendStepsURL" => Some(Position::Append),
        _ => None,
    }
}

/// Expand legacy step URL annotations into steps and remove them.
///
/// Prepended steps go before the first step of the first task, appended
/// steps after the last step of the last task. Returns whether the document
/// changed. The document is untouched when any URL is invalid.
pub fn convert_legacy_annotations<D: Document + ?Sized>(
    doc: &mut D,
    default_owner: &str,
    default_repo: &str,
) -> Result<bool> {
    let mut found = Vec::new();
    for (key, value) in &doc.metadata().annotations {
        if let Some(position) = legacy_position(key) {
            let image = uses_from_raw_url(value, default_owner, default_repo)?;
            found.push((key.clone(), position, image));
        }
    }
    if found.is_empty() {
        return Ok(false);
    }

    let name = doc.metadata().name.clone();
    let mut specs = doc.task_specs_mut();
    if specs.is_empty() {
        return Err(Error::structural(format!(
            "'{}' has step URL annotations but no embedded task to add steps to",
            name
        )));
    }
    for (key, position, image) in &found {
        debug!("converting annotation {} to step {}", key, image);
        let step = Step {
            image: image.clone(),
            ..Step::default()
        };
        match position {
            Position::Prepend => specs[0].steps.insert(0, step),
            Position::Append => {
                let last = specs.len() - 1;
                specs[last].steps.push(step);
            }
        }
    }
    drop(specs);

    let annotations = &mut doc.metadata_mut().annotations;
    for (key, _, _) in found {
        annotations.remove(&key);
    }
    Ok(true)
}
