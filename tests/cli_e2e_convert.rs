//! End-to-end tests for the `pipeline-reuse convert` command.

mod common;
use common::prelude::*;

const RELEASE: &str = ".lighthouse/jenkins-x/release.yaml";

#[test]
fn test_convert_help() {
    let mut cmd = cargo_bin_cmd!("pipeline-reuse");
    cmd.args(["convert", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--public"))
        .stdout(predicate::str::contains("--volume-size"))
        .stdout(predicate::str::contains("--service-account"));
}

#[test]
fn test_parent_is_split_into_tasks() {
    let fixture = TestFixture::new().with_file(RELEASE, docs::PARENT);

    fixture
        .command()
        .arg("convert")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "[NEW] generated .lighthouse/jenkins-x/release/build.yaml",
        ))
        .stdout(predicate::str::contains(
            "[NEW] generated .lighthouse/jenkins-x/release/test.yaml",
        ));

    let build = fixture.read(".lighthouse/jenkins-x/release/build.yaml");
    assert!(build.contains("kind: Task"));
    assert!(build.contains("make build"));
    assert!(build.contains("PULL_NUMBER"));
    assert_eq!(fixture.read(RELEASE), docs::PARENT);
}

#[test]
fn test_child_is_replaced_by_resolver_pipeline() {
    let fixture = TestFixture::new().with_file(RELEASE, docs::CHILD);

    fixture
        .command()
        .args(["convert", "--volume-size", "5Gi", "--service-account", "builder"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[SAVED] saved .lighthouse/jenkins-x/release.yaml"));

    let converted = fixture.read(RELEASE);
    assert!(converted.contains("resolver: git"));
    assert!(converted.contains("tasks/go/release/build.yaml"));
    assert!(converted.contains("tasks/go/release/lint.yaml"));
    assert!(converted.contains("storage: 5Gi"));
    assert!(converted.contains("serviceAccountName: builder"));

    fixture
        .command()
        .arg("convert")
        .assert()
        .success()
        .stdout(predicate::str::contains("0 saved, 0 generated, 1 unchanged"));
    assert_eq!(fixture.read(RELEASE), converted);
}

#[test]
fn test_resolver_settings_from_config() {
    let fixture = TestFixture::new()
        .with_config("resolver:\n  service_account: from-config\n")
        .with_file(RELEASE, docs::CHILD);

    fixture.command().arg("convert").assert().success();
    assert!(fixture
        .read(RELEASE)
        .contains("serviceAccountName: from-config"));
}

#[test]
fn test_multiple_embedded_tasks_abort() {
    let two_tasks = r#"apiVersion: tekton.dev/v1beta1
kind: PipelineRun
metadata:
  name: release
spec:
  pipelineSpec:
    tasks:
    - name: one
      taskSpec:
        steps:
        - name: a
          image: alpine
    - name: two
      taskSpec:
        steps:
        - name: b
          image: alpine
"#;
    let fixture = TestFixture::new().with_file(RELEASE, two_tasks);

    fixture
        .command()
        .arg("convert")
        .assert()
        .failure()
        .stderr(predicate::str::contains("release.yaml"));
    assert_eq!(fixture.read(RELEASE), two_tasks);
}

#[test]
fn test_invalid_config_is_reported() {
    let fixture = TestFixture::new()
        .with_config("pipelines: []\n")
        .with_file(RELEASE, docs::CHILD);

    fixture
        .command()
        .arg("convert")
        .assert()
        .failure()
        .stderr(predicate::str::contains("valid sections"));
    assert_eq!(fixture.read(RELEASE), docs::CHILD);
}
