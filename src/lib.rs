//! # Pipeline Reuse Library
//!
//! This library rewrites Tekton pipeline definitions between their fully
//! inline form and the compact reuse notation
//! `uses:<owner>/<repo>/<path>@<revision>`, which points into a shared
//! pipeline catalog. It is used by the `pipeline-reuse` command-line tool
//! but can be driven directly as well.
//!
//! ## Quick Example
//!
//! ```
//! use pipeline_reuse::reference::GitRef;
//!
//! let image = "uses:jenkins-x/jx3-pipeline-catalog/tasks/go/release.yaml@versionStream";
//! let reference = GitRef::parse(image, Some("build"), None).unwrap().unwrap();
//! assert_eq!(reference.owner, "jenkins-x");
//! assert_eq!(reference.path_in_repo, "tasks/go/release/build.yaml");
//!
//! // Plain container images are not references.
//! assert!(GitRef::parse("golang:1.21", None, None).unwrap().is_none());
//! ```
//!
//! ## Core Concepts
//!
//! - **References (`reference`)**: the `uses:` grammar and the equivalent
//!   git-resolver parameter set.
//! - **Documents (`tekton`)**: the subset of the Tekton schema the engine
//!   rewrites. Fields it does not model are carried through untouched.
//! - **Processors (`processor`, `migrate`)**: one visitor per transformation.
//!   The catalog migrator, the runtime-resolver migrator, the local override
//!   inliner and the template-env modifier all implement [`processor::Processor`].
//! - **Dispatch (`dispatch`, `walk`)**: finds pipeline files, sniffs their
//!   kind, parses them and writes back whatever a processor changed.
//! - **Catalog (`catalog`, `cache`, `repository`, `git`)**: fetches catalog
//!   task specs through a [`repository::ContentResolver`] and memoizes them
//!   for the run.
//!
//! ## Execution Flow
//!
//! 1.  **Discovery**: the walker lists the pipeline files of a layout,
//!     following `triggers.yaml` files where present.
//! 2.  **Dispatch**: each file's kind is sniffed and the document is parsed.
//! 3.  **Processing**: the processor rewrites the document in memory and
//!     queues any additional documents it produces.
//! 4.  **Persistence**: generated documents and the changed document are
//!     written to disk.

pub mod cache;
pub mod catalog;
pub mod config;
pub mod defaults;
pub mod dispatch;
pub mod error;
pub mod git;
pub mod migrate;
pub mod output;
pub mod processor;
pub mod reference;
pub mod repository;
pub mod tekton;
pub mod triggers;
pub mod walk;
