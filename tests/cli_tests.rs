mod common;

use assert_cmd::prelude::*;
use common::*;
use predicates::prelude::*;
use std::fs;
use std::process::Command;

fn ci_matrix() -> Command {
    let mut cmd = Command::cargo_bin("ci-matrix").unwrap();
    cmd.env_remove("GITHUB_EVENT_NAME")
        .env("NO_COLOR", "1")
        .arg("--lang")
        .arg("en");
    cmd
}

/// `plan` on a project without a pipeline file falls back to the built-in
/// matrix and lists the six steps in stage order with their commands.
///
/// 在没有流水线文件的项目上执行 `plan` 会回退到内置矩阵，
/// 并按阶段顺序列出六个步骤及其命令。
#[test]
fn test_plan_uses_built_in_matrix() {
    let project = setup_sample_project();

    ci_matrix()
        .arg("plan")
        .arg("--project-dir")
        .arg(project.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("using the built-in matrix"))
        .stdout(predicate::str::contains("1. build (default)"))
        .stdout(predicate::str::contains("6. test (tokio-eyre)"))
        .stdout(predicate::str::contains(
            "cargo build --workspace --verbose --no-default-features --features runtime-tokio,anyhow",
        ));
}

/// `plan` with a shard only lists the configurations owned by that runner.
///
/// 带分片参数的 `plan` 只列出该运行器负责的配置。
#[test]
fn test_plan_with_shard() {
    let project = setup_sample_project();

    ci_matrix()
        .arg("plan")
        .arg("--project-dir")
        .arg(project.path())
        .arg("--total-runners")
        .arg("3")
        .arg("--runner-index")
        .arg("1")
        .assert()
        .success()
        .stdout(predicate::str::contains("build (tokio-anyhow)"))
        .stdout(predicate::str::contains("build (default)").not())
        .stdout(predicate::str::contains("Runner 2 of 3"));
}

#[test]
fn test_plan_rejects_unknown_configuration() {
    let project = setup_sample_project();

    ci_matrix()
        .arg("plan")
        .arg("--project-dir")
        .arg(project.path())
        .arg("--only")
        .arg("nightly")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown configuration 'nightly'"));
}

/// An unparsable pipeline file is reported and the process exits non-zero.
///
/// 无法解析的流水线文件会被报告，进程以非零状态退出。
#[test]
fn test_invalid_pipeline_file() {
    let project = setup_sample_project();
    write_pipeline(project.path(), INVALID_TOML_PIPELINE);

    ci_matrix()
        .arg("plan")
        .arg("--project-dir")
        .arg(project.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load the pipeline definition"));
}

#[test]
fn test_missing_config_file() {
    let project = setup_sample_project();

    ci_matrix()
        .arg("plan")
        .arg("--project-dir")
        .arg(project.path())
        .arg("--config")
        .arg(project.path().join("missing.toml"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("missing.toml"));
}

/// A push to a branch other than master does not trigger the job, which is
/// not a failure.
///
/// 推送到 master 以外的分支不会触发任务，这不算失败。
#[test]
fn test_push_to_other_branch_is_skipped() {
    let project = setup_sample_project();

    ci_matrix()
        .arg("run")
        .arg("--project-dir")
        .arg(project.path())
        .arg("--event")
        .arg("push")
        .arg("--branch")
        .arg("dev")
        .assert()
        .success()
        .stdout(predicate::str::contains("not triggered by push to 'dev'"));
}

/// `init --non-interactive` writes a pipeline that `workflow` then renders.
///
/// `init --non-interactive` 写入流水线文件，随后由 `workflow` 渲染。
#[test]
fn test_init_then_workflow() {
    let project = setup_sample_project();
    let pipeline_path = project.path().join("Pipeline.toml");

    ci_matrix()
        .arg("init")
        .arg("--non-interactive")
        .arg("--output")
        .arg(&pipeline_path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Created"));
    assert!(pipeline_path.is_file());

    ci_matrix()
        .arg("init")
        .arg("--non-interactive")
        .arg("--output")
        .arg(&pipeline_path)
        .assert()
        .success()
        .stdout(predicate::str::contains("File already exists"));

    ci_matrix()
        .arg("workflow")
        .arg("--project-dir")
        .arg(project.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("name: Rust"))
        .stdout(predicate::str::contains("- name: Run tests (tokio-eyre)"));
}

#[test]
fn test_workflow_to_file() {
    let project = setup_sample_project();
    let output = project.path().join(".github").join("workflows").join("rust.yml");

    ci_matrix()
        .arg("workflow")
        .arg("--project-dir")
        .arg(project.path())
        .arg("--output")
        .arg(&output)
        .assert()
        .success();

    let yaml = fs::read_to_string(&output).unwrap();
    assert!(yaml.contains("pull_request:"));
}

/// Builds and tests the sample project for real with one configuration and
/// writes both reports.
///
/// 使用一个配置真实地构建并测试示例项目，并写入两种报告。
#[test]
fn test_successful_run() {
    let project = setup_sample_project();
    write_pipeline(project.path(), SINGLE_DEFAULT_PIPELINE);
    let json_path = project.path().join("report.json");
    let html_path = project.path().join("report.html");

    ci_matrix()
        .arg("run")
        .arg("--event")
        .arg("manual")
        .arg("--project-dir")
        .arg(project.path())
        .arg("--json")
        .arg(&json_path)
        .arg("--html")
        .arg(&html_path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Verifying project: sample_actors"))
        .stdout(predicate::str::contains("All steps passed. Job succeeded."));

    let json: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&json_path).unwrap()).unwrap();
    assert_eq!(json["success"], true);
    assert_eq!(json["steps"].as_array().unwrap().len(), 2);
    assert!(html_path.is_file());
}

/// A build failure in the first step stops the run and is attributed to it.
///
/// 第一步的构建失败会终止运行，失败归属于该步骤。
#[test]
fn test_build_failure_stops_the_run() {
    let project = setup_sample_project();
    write_pipeline(project.path(), BROKEN_BUILD_PIPELINE);

    ci_matrix()
        .arg("run")
        .arg("--event")
        .arg("manual")
        .arg("--quiet")
        .arg("--project-dir")
        .arg(project.path())
        .assert()
        .failure()
        .stdout(predicate::str::contains("deliberate build failure"))
        .stdout(predicate::str::contains("Job failed at step 1: build (default)"))
        .stdout(predicate::str::contains("build (tokio-anyhow)").and(predicate::str::contains("Not run")))
        .stderr(predicate::str::contains("job failed at step 1: build (default)"));
}

#[test]
fn test_test_failure_is_reported() {
    let project = setup_sample_project();
    write_pipeline(project.path(), BROKEN_TEST_PIPELINE);

    ci_matrix()
        .arg("run")
        .arg("--event")
        .arg("pull_request")
        .arg("--project-dir")
        .arg(project.path())
        .assert()
        .failure()
        .stdout(predicate::str::contains("Job failed at step 2: test (default)"));
}
