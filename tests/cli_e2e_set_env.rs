//! End-to-end tests for the `pipeline-reuse set-env` command.

mod common;
use common::prelude::*;

const BUILD: &str = ".lighthouse/jenkins-x/build.yaml";

#[test]
fn test_set_env_from_flags() {
    let fixture = TestFixture::new()
        .with_file(BUILD, docs::TASK)
        .with_file(".lighthouse/jenkins-x/release.yaml", docs::CHILD);

    fixture
        .command()
        .args(["set-env", "--env", "GOPROXY=direct", "--env", "CGO_ENABLED=0"])
        .assert()
        .success()
        .stdout(predicate::str::contains("2 saved"));

    for file in [BUILD, ".lighthouse/jenkins-x/release.yaml"] {
        let saved = fixture.read(file);
        assert!(saved.contains("GOPROXY"), "{}", file);
        assert!(saved.contains("CGO_ENABLED"), "{}", file);
    }

    fixture
        .command()
        .args(["set-env", "--env", "GOPROXY=direct", "--env", "CGO_ENABLED=0"])
        .assert()
        .success()
        .stdout(predicate::str::contains("0 saved, 0 generated, 2 unchanged"));
}

#[test]
fn test_set_env_from_config() {
    let fixture = TestFixture::new()
        .with_config("env:\n  DOCKER_REGISTRY: ghcr.io\n")
        .with_file(BUILD, docs::TASK);

    fixture.command().arg("set-env").assert().success();
    assert!(fixture.read(BUILD).contains("ghcr.io"));
}

#[test]
fn test_set_env_with_explicit_config_path() {
    let fixture = TestFixture::new()
        .with_file("settings/pipeline.yaml", "env:\n  FROM_FILE: yes-please\n")
        .with_file(BUILD, docs::TASK);

    fixture
        .command()
        .args(["--config", "settings/pipeline.yaml", "set-env"])
        .assert()
        .success();
    assert!(fixture.read(BUILD).contains("yes-please"));
}

#[test]
fn test_set_env_rejects_malformed_variable() {
    let fixture = TestFixture::new().with_file(BUILD, docs::TASK);

    fixture
        .command()
        .args(["set-env", "--env", "NOVALUE"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("expected NAME=VALUE"));
    assert_eq!(fixture.read(BUILD), docs::TASK);
}

#[test]
fn test_set_env_ignores_files_outside_lighthouse() {
    let fixture = TestFixture::new().with_file("deploy/task.yaml", docs::TASK);

    fixture
        .command()
        .args(["set-env", "--env", "FOO=bar"])
        .assert()
        .success()
        .stdout(predicate::str::contains("0 saved"));
    assert_eq!(fixture.read("deploy/task.yaml"), docs::TASK);
}
