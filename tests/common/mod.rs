//! Shared test utilities for integration and E2E tests.
//!
//! ```rust,ignore
//! mod common;
//! use common::prelude::*;
//!
//! #[test]
//! fn test_example() {
//!     let fixture = TestFixture::new().with_file(".lighthouse/jenkins-x/release.yaml", docs::CHILD);
//!     fixture.command().arg("convert").assert().success();
//! }
//! ```

use assert_fs::prelude::*;
use std::env;
use std::path::{Path, PathBuf};

/// Re-export commonly used test dependencies for convenience.
pub mod prelude {
    pub use assert_cmd::cargo::cargo_bin_cmd;
    pub use assert_fs::prelude::*;
    #[allow(unused_imports)]
    pub use assert_fs::TempDir;
    pub use predicates::prelude::*;

    #[allow(unused_imports)]
    pub use super::docs;
    #[allow(unused_imports)]
    pub use super::should_skip_network_tests;
    pub use super::TestFixture;
}

/// Pipeline documents used across the tests.
#[allow(dead_code)]
pub mod docs {
    /// A catalog pack pipeline with fully materialized steps.
    pub const CATALOG_RELEASE: &str = r#"apiVersion: tekton.dev/v1beta1
kind: PipelineRun
metadata:
  name: release
spec:
  pipelineSpec:
    tasks:
    - name: from-build-pack
      taskSpec:
        stepTemplate:
          image: golang:1.21
          workingDir: /workspace/source
        steps:
        - name: build
          script: make build
          env:
          - name: GOPROXY
            value: https://proxy.golang.org
        - name: lint
          image: golangci/golangci-lint:1.55
          script: make lint
"#;

    /// A repository pipeline reusing the go release task with one override.
    pub const CHILD: &str = r#"apiVersion: tekton.dev/v1beta1
kind: PipelineRun
metadata:
  name: release
spec:
  pipelineSpec:
    tasks:
    - name: from-build-pack
      taskSpec:
        stepTemplate:
          image: uses:jenkins-x/jx3-pipeline-catalog/tasks/go/release.yaml@versionStream
        steps:
        - name: build
          env:
          - name: CGO_ENABLED
            value: "1"
        - name: lint
"#;

    /// A repository pipeline defining its own steps.
    pub const PARENT: &str = r#"apiVersion: tekton.dev/v1beta1
kind: PipelineRun
metadata:
  name: release
spec:
  pipelineSpec:
    tasks:
    - name: from-build-pack
      taskSpec:
        stepTemplate:
          image: golang:1.21
          workingDir: /workspace/source
        steps:
        - name: build
          script: make build
        - name: test
          script: make test
"#;

    /// A standalone Task.
    pub const TASK: &str = r#"apiVersion: tekton.dev/v1beta1
kind: Task
metadata:
  name: build
spec:
  steps:
  - name: build
    image: alpine
    script: echo hello
"#;

    /// Lighthouse triggers for `pullrequest.yaml` and `release.yaml`.
    pub const TRIGGERS: &str = r#"apiVersion: config.lighthouse.jenkins-x.io/v1alpha1
kind: TriggerConfig
spec:
  presubmits:
  - name: pr
    context: pr
    always_run: true
    source: pullrequest.yaml
  postsubmits:
  - name: release
    context: release
    source: release.yaml
    branches:
    - ^main$
"#;
}

/// Returns `true` if the `SKIP_NETWORK_TESTS` environment variable is set.
#[allow(dead_code)]
pub fn should_skip_network_tests() -> bool {
    env::var("SKIP_NETWORK_TESTS").is_ok()
}

/// A temporary repository to run the binary against.
///
/// ```rust,ignore
/// let fixture = TestFixture::new()
///     .with_file(".lighthouse/jenkins-x/release.yaml", docs::CHILD)
///     .with_catalog_file("tasks/go/release.yaml", docs::CATALOG_RELEASE);
///
/// fixture.command().args(["migrate", "--dir", "."]).assert().success();
/// ```
pub struct TestFixture {
    temp_dir: assert_fs::TempDir,
}

impl TestFixture {
    pub fn new() -> Self {
        Self {
            temp_dir: assert_fs::TempDir::new().expect("Failed to create temp directory"),
        }
    }

    /// Add a `.pipeline-reuse.yaml` configuration file.
    #[allow(dead_code)]
    pub fn with_config(self, content: &str) -> Self {
        self.with_file(".pipeline-reuse.yaml", content)
    }

    pub fn with_file(self, path: &str, content: &str) -> Self {
        self.temp_dir
            .child(path)
            .write_str(content)
            .expect("Failed to write file");
        self
    }

    /// Seed the catalog checkout cache so no fetch is needed for the default
    /// catalog at its version stream revision.
    #[allow(dead_code)]
    pub fn with_catalog_file(self, path: &str, content: &str) -> Self {
        let checkout = pipeline_reuse::git::url_to_cache_path(
            &self.cache_root(),
            "https://github.com/jenkins-x/jx3-pipeline-catalog.git",
            "master",
        );
        let file = checkout.join(path);
        std::fs::create_dir_all(file.parent().expect("catalog file has a parent"))
            .expect("Failed to create catalog checkout");
        std::fs::write(&file, content).expect("Failed to write catalog file");
        self
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Catalog cache used by [`TestFixture::command`]. It is a hidden
    /// directory, so walks never pick it up.
    pub fn cache_root(&self) -> PathBuf {
        self.temp_dir.path().join(".cache")
    }

    #[allow(dead_code)]
    pub fn read(&self, path: &str) -> String {
        std::fs::read_to_string(self.path().join(path)).expect("Failed to read file")
    }

    #[allow(dead_code)]
    pub fn child(&self, path: &str) -> assert_fs::fixture::ChildPath {
        self.temp_dir.child(path)
    }

    /// A command running in the fixture directory with an isolated cache and
    /// no configuration from the environment.
    pub fn command(&self) -> assert_cmd::Command {
        let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("pipeline-reuse");
        cmd.current_dir(self.path())
            .env("PIPELINE_REUSE_CACHE", self.cache_root())
            .env_remove("PIPELINE_REUSE_CONFIG")
            .env("NO_COLOR", "1");
        cmd
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}
