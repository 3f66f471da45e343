//! # Document Dispatcher
//!
//! Routes one file to a [`Processor`]. The kind is found with a cheap textual
//! scan for a top-level `kind:` key before any structural parse, so unrelated
//! YAML (trigger configs, charts, malformed fragments) is skipped without
//! being deserialized.
//!
//! Each file ends in one of four states:
//!
//! - unknown kind: skipped, `Outcome::UnknownKind`
//! - parse error: `Err`, wrapped with the file path
//! - no change: `Outcome::Unchanged`, nothing written except generated files
//! - changed: the document is written back, `Outcome::Saved`

use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{Error, Result};
use crate::processor::{GeneratedFile, Processor};
use crate::tekton::{Kind, Pipeline, PipelineRun, Task, TaskRun};

/// What happened to the processed file itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    UnknownKind,
    Unchanged,
    Saved,
}

/// Result of dispatching one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Processed {
    pub outcome: Outcome,
    /// Additional files written on behalf of the processor.
    pub generated: Vec<PathBuf>,
}

impl Processed {
    fn new(outcome: Outcome) -> Self {
        Self {
            outcome,
            generated: Vec::new(),
        }
    }
}

/// Find the document kind by scanning for a top-level `kind:` line.
pub fn sniff_kind(content: &str) -> Option<Kind> {
    content.lines().find_map(|line| {
        let value = line.strip_prefix("kind:")?;
        let value = value.split('#').next().unwrap_or_default().trim();
        Some(Kind::from_name(value.trim_matches(|c| c == '"' || c == '\'')))
    })?
}

/// Parse YAML content into a typed document.
pub fn parse_document<T: DeserializeOwned>(content: &str) -> Result<T> {
    Ok(serde_yaml::from_str(content)?)
}

/// Process a single file with the given processor.
pub fn process_file(processor: &mut dyn Processor, path: &Path) -> Result<Processed> {
    let result = dispatch(processor, path);
    // Pending output from a failed call must not leak into the next file.
    let generated = processor.take_generated();
    let (modified, doc) = match result {
        Ok(Some(found)) => found,
        Ok(None) => return Ok(Processed::new(Outcome::UnknownKind)),
        Err(e) => return Err(e.in_file(path)),
    };

    let mut processed = Processed::new(if modified {
        Outcome::Saved
    } else {
        Outcome::Unchanged
    });
    for file in generated {
        write_generated(&file).map_err(|e| e.in_file(&file.path))?;
        info!("saved file {}", file.path.display());
        processed.generated.push(file.path);
    }
    if modified {
        fs::write(path, doc).map_err(|e| Error::from(e).in_file(path))?;
        info!("saved file {}", path.display());
    }
    Ok(processed)
}

/// Parse, process and serialize. Returns `None` for unknown kinds, otherwise
/// the modified flag and the serialized document.
fn dispatch(processor: &mut dyn Processor, path: &Path) -> Result<Option<(bool, String)>> {
    let content = fs::read_to_string(path)?;
    let Some(kind) = sniff_kind(&content) else {
        debug!("skipping {}: not a pipeline document", path.display());
        return Ok(None);
    };
    debug!("processing {} {}", kind, path.display());

    let found = match kind {
        Kind::Pipeline => {
            let mut doc: Pipeline = parse_document(&content)?;
            let modified = processor.process_pipeline(&mut doc, path)?;
            (modified, render(modified, &doc)?)
        }
        Kind::PipelineRun => {
            let mut doc: PipelineRun = parse_document(&content)?;
            let modified = processor.process_pipeline_run(&mut doc, path)?;
            (modified, render(modified, &doc)?)
        }
        Kind::Task => {
            let mut doc: Task = parse_document(&content)?;
            let modified = processor.process_task(&mut doc, path)?;
            (modified, render(modified, &doc)?)
        }
        Kind::TaskRun => {
            let mut doc: TaskRun = parse_document(&content)?;
            let modified = processor.process_task_run(&mut doc, path)?;
            (modified, render(modified, &doc)?)
        }
    };
    Ok(Some(found))
}

fn render<T: Serialize>(modified: bool, doc: &T) -> Result<String> {
    if modified {
        Ok(serde_yaml::to_string(doc)?)
    } else {
        Ok(String::new())
    }
}

fn write_generated(file: &GeneratedFile) -> Result<()> {
    if let Some(parent) = file.path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&file.path, &file.content)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tekton::Document;
    use tempfile::TempDir;

    /// Renames every document and optionally emits a sibling file.
    #[derive(Default)]
    struct Renamer {
        generate: bool,
        fail: bool,
        pending: Vec<GeneratedFile>,
        calls: Vec<Kind>,
    }

    impl Renamer {
        fn visit<D: Document>(&mut self, doc: &mut D, kind: Kind, path: &Path) -> Result<bool> {
            self.calls.push(kind);
            if self.generate {
                self.pending.push(GeneratedFile {
                    path: path.with_file_name("extra.txt"),
                    content: "generated".to_string(),
                });
            }
            if self.fail {
                return Err(Error::structural("refusing"));
            }
            if doc.metadata().name == "renamed" {
                return Ok(false);
            }
            doc.metadata_mut().name = "renamed".to_string();
            Ok(true)
        }
    }

    impl Processor for Renamer {
        fn process_pipeline(&mut self, doc: &mut Pipeline, path: &Path) -> Result<bool> {
            self.visit(doc, Kind::Pipeline, path)
        }

        fn process_pipeline_run(&mut self, doc: &mut PipelineRun, path: &Path) -> Result<bool> {
            self.visit(doc, Kind::PipelineRun, path)
        }

        fn process_task(&mut self, doc: &mut Task, path: &Path) -> Result<bool> {
            self.visit(doc, Kind::Task, path)
        }

        fn process_task_run(&mut self, doc: &mut TaskRun, path: &Path) -> Result<bool> {
            self.visit(doc, Kind::TaskRun, path)
        }

        fn take_generated(&mut self) -> Vec<GeneratedFile> {
            std::mem::take(&mut self.pending)
        }
    }

    const TASK: &str = "apiVersion: tekton.dev/v1beta1\nkind: Task\nmetadata:\n  name: build\nspec:\n  steps:\n  - name: build\n    image: alpine\n";

    #[test]
    fn test_sniff_kind() {
        assert_eq!(sniff_kind(TASK), Some(Kind::Task));
        assert_eq!(sniff_kind("kind: \"PipelineRun\"\n"), Some(Kind::PipelineRun));
        assert_eq!(sniff_kind("kind: Pipeline # comment\n"), Some(Kind::Pipeline));
        assert_eq!(sniff_kind("apiVersion: v1\nkind: ConfigMap\n"), None);
        assert_eq!(sniff_kind("spec:\n  kind: Task\n"), None);
        assert_eq!(sniff_kind("not: [valid yaml"), None);
    }

    #[test]
    fn test_unknown_kind_is_skipped() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("triggers.yaml");
        fs::write(&path, "kind: TriggerConfig\nspec: {}\n").unwrap();

        let mut processor = Renamer::default();
        let processed = process_file(&mut processor, &path).unwrap();
        assert_eq!(processed.outcome, Outcome::UnknownKind);
        assert!(processor.calls.is_empty());
    }

    #[test]
    fn test_changed_document_is_saved() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("task.yaml");
        fs::write(&path, TASK).unwrap();

        let mut processor = Renamer::default();
        let processed = process_file(&mut processor, &path).unwrap();
        assert_eq!(processed.outcome, Outcome::Saved);
        assert_eq!(processor.calls, vec![Kind::Task]);

        let saved = fs::read_to_string(&path).unwrap();
        assert!(saved.contains("name: renamed"));
        assert!(saved.contains("image: alpine"));

        let processed = process_file(&mut processor, &path).unwrap();
        assert_eq!(processed.outcome, Outcome::Unchanged);
    }

    #[test]
    fn test_unchanged_document_is_not_rewritten() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("task.yaml");
        let original = TASK.replace("name: build\nspec", "name: renamed\nspec");
        fs::write(&path, &original).unwrap();

        let mut processor = Renamer::default();
        let processed = process_file(&mut processor, &path).unwrap();
        assert_eq!(processed.outcome, Outcome::Unchanged);
        assert_eq!(fs::read_to_string(&path).unwrap(), original);
    }

    #[test]
    fn test_parse_error_names_the_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("broken.yaml");
        fs::write(&path, "kind: Task\nspec: [unclosed\n").unwrap();

        let mut processor = Renamer::default();
        let err = process_file(&mut processor, &path).unwrap_err();
        assert!(err.to_string().contains("broken.yaml"));
    }

    #[test]
    fn test_generated_files_are_written() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("task.yaml");
        fs::write(&path, TASK).unwrap();

        let mut processor = Renamer {
            generate: true,
            ..Renamer::default()
        };
        let processed = process_file(&mut processor, &path).unwrap();
        assert_eq!(processed.generated, vec![temp.path().join("extra.txt")]);
        assert_eq!(
            fs::read_to_string(temp.path().join("extra.txt")).unwrap(),
            "generated"
        );
    }

    #[test]
    fn test_failed_processor_writes_nothing() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("task.yaml");
        fs::write(&path, TASK).unwrap();

        let mut processor = Renamer {
            generate: true,
            fail: true,
            ..Renamer::default()
        };
        assert!(process_file(&mut processor, &path).is_err());
        assert!(!temp.path().join("extra.txt").exists());
        assert!(processor.pending.is_empty());
        assert_eq!(fs::read_to_string(&path).unwrap(), TASK);
    }
}
