//! # Pipeline Runner Integration Tests / 流水线运行器集成测试
//!
//! Drives `run_pipeline` with a scripted executor to check ordering,
//! stop-at-first-failure, the build-before-test rule, timeouts and interrupts
//! without spawning real processes.
//!
//! 使用脚本化的执行器驱动 `run_pipeline`，在不派生真实进程的情况下检查
//! 顺序、首次失败即停止、先构建后测试规则、超时和中断。

use anyhow::{Result, bail};
use async_trait::async_trait;
use ci_matrix::config::{BuildConfiguration, PipelineConfig, StepOrder};
use ci_matrix::execution::{ActionOutput, FailurePolicy, StepExecutor, run_pipeline};
use ci_matrix::models::{PipelineError, PipelineRun, Step, StepStatus};
use ci_matrix::planner::expand;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// How the scripted executor answers one step label.
#[derive(Clone)]
enum Scripted {
    Fail,
    Error,
    Sleep(Duration),
}

/// Records every executed label and answers from a script; unscripted steps succeed.
#[derive(Default)]
struct ScriptedExecutor {
    script: HashMap<String, Scripted>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedExecutor {
    fn with(mut self, label: &str, answer: Scripted) -> Self {
        self.script.insert(label.to_string(), answer);
        self
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl StepExecutor for ScriptedExecutor {
    async fn execute(&self, step: &Step) -> Result<ActionOutput> {
        let label = step.label();
        self.calls.lock().unwrap().push(label.clone());
        match self.script.get(&label).cloned() {
            None => Ok(ActionOutput {
                success: true,
                exit_code: Some(0),
                output: format!("ok {label}\n"),
            }),
            Some(Scripted::Fail) => Ok(ActionOutput {
                success: false,
                exit_code: Some(101),
                output: format!("error: {label} broke\n"),
            }),
            Some(Scripted::Error) => bail!("could not spawn tool for {label}"),
            Some(Scripted::Sleep(duration)) => {
                tokio::time::sleep(duration).await;
                Ok(ActionOutput {
                    success: true,
                    exit_code: Some(0),
                    output: String::new(),
                })
            }
        }
    }
}

fn default_run() -> PipelineRun {
    let pipeline = PipelineConfig::default_matrix();
    expand(&pipeline.configurations, pipeline.order)
}

fn labels_of(steps: &[Step]) -> Vec<String> {
    steps.iter().map(Step::label).collect()
}

#[cfg(test)]
mod ordering_tests {
    use super::*;

    #[tokio::test]
    async fn test_all_steps_succeed_in_order() {
        let executor = ScriptedExecutor::default();
        let token = CancellationToken::new();
        let report = run_pipeline(
            &default_run(),
            &executor,
            FailurePolicy::StopAtFirstFailure,
            &token,
            "en",
        )
        .await;

        assert!(report.is_success());
        assert_eq!(report.results.len(), 6);
        assert!(report.not_run.is_empty());
        assert_eq!(
            executor.calls(),
            vec![
                "build (default)",
                "build (tokio-anyhow)",
                "build (tokio-eyre)",
                "test (default)",
                "test (tokio-anyhow)",
                "test (tokio-eyre)",
            ]
        );
        assert!(report.ensure_success().is_ok());
        assert!(report.finished_at >= report.started_at);
    }

    #[tokio::test]
    async fn test_repeated_runs_give_the_same_outcome() {
        let token = CancellationToken::new();
        let mut outcomes = Vec::new();
        for _ in 0..2 {
            let executor = ScriptedExecutor::default().with("test (tokio-anyhow)", Scripted::Fail);
            let report = run_pipeline(
                &default_run(),
                &executor,
                FailurePolicy::StopAtFirstFailure,
                &token,
                "en",
            )
            .await;
            let statuses: Vec<StepStatus> = report.results.iter().map(|r| r.status).collect();
            outcomes.push((statuses, executor.calls()));
        }
        assert_eq!(outcomes[0], outcomes[1]);
    }

    #[tokio::test]
    async fn test_empty_run_succeeds() {
        let executor = ScriptedExecutor::default();
        let token = CancellationToken::new();
        let report = run_pipeline(
            &PipelineRun::default(),
            &executor,
            FailurePolicy::StopAtFirstFailure,
            &token,
            "en",
        )
        .await;
        assert!(report.is_success());
        assert!(executor.calls().is_empty());
    }
}

#[cfg(test)]
mod failure_tests {
    use super::*;

    #[tokio::test]
    async fn test_first_build_failure_stops_everything() {
        let executor = ScriptedExecutor::default().with("build (default)", Scripted::Fail);
        let token = CancellationToken::new();
        let report = run_pipeline(
            &default_run(),
            &executor,
            FailurePolicy::StopAtFirstFailure,
            &token,
            "en",
        )
        .await;

        assert!(!report.is_success());
        assert_eq!(report.results.len(), 1);
        assert_eq!(report.results[0].status, StepStatus::Failure);
        assert_eq!(report.results[0].exit_code, Some(101));
        assert_eq!(report.not_run.len(), 5);
        assert_eq!(executor.calls(), vec!["build (default)"]);
        assert!(!report.interrupted);

        let err = report.ensure_success().unwrap_err();
        assert_eq!(
            err,
            PipelineError::StepFailed {
                position: 1,
                label: "build (default)".to_string()
            }
        );
        assert_eq!(err.to_string(), "job failed at step 1: build (default)");
    }

    #[tokio::test]
    async fn test_failure_is_attributed_to_the_failing_step() {
        let executor = ScriptedExecutor::default().with("test (tokio-anyhow)", Scripted::Fail);
        let token = CancellationToken::new();
        let report = run_pipeline(
            &default_run(),
            &executor,
            FailurePolicy::StopAtFirstFailure,
            &token,
            "en",
        )
        .await;

        assert_eq!(report.results.len(), 5);
        assert_eq!(labels_of(&report.not_run), vec!["test (tokio-eyre)"]);
        let failed = report.first_failure().unwrap();
        assert_eq!(failed.step.position(), 5);
        assert!(failed.output.contains("broke"));
    }

    #[tokio::test]
    async fn test_executor_error_is_a_step_failure() {
        let executor = ScriptedExecutor::default().with("build (tokio-eyre)", Scripted::Error);
        let token = CancellationToken::new();
        let report = run_pipeline(
            &default_run(),
            &executor,
            FailurePolicy::StopAtFirstFailure,
            &token,
            "en",
        )
        .await;

        let failed = report.first_failure().unwrap();
        assert_eq!(failed.label(), "build (tokio-eyre)");
        assert_eq!(failed.exit_code, None);
        assert!(failed.output.contains("could not spawn tool"));
        assert_eq!(report.not_run.len(), 3);
    }

    #[tokio::test]
    async fn test_keep_going_never_tests_a_failed_build() {
        let executor = ScriptedExecutor::default().with("build (tokio-anyhow)", Scripted::Fail);
        let token = CancellationToken::new();
        let report = run_pipeline(&default_run(), &executor, FailurePolicy::KeepGoing, &token, "en").await;

        assert_eq!(
            executor.calls(),
            vec![
                "build (default)",
                "build (tokio-anyhow)",
                "build (tokio-eyre)",
                "test (default)",
                "test (tokio-eyre)",
            ]
        );
        assert_eq!(labels_of(&report.not_run), vec!["test (tokio-anyhow)"]);
        assert_eq!(report.passed_count(), 4);
        assert_eq!(report.failed_count(), 1);
        assert_eq!(
            report.ensure_success().unwrap_err().to_string(),
            "job failed at step 2: build (tokio-anyhow)"
        );
    }

    #[tokio::test]
    async fn test_configuration_order_stops_before_later_configurations() {
        let pipeline = PipelineConfig::default_matrix();
        let run = expand(&pipeline.configurations, StepOrder::Configuration);
        let executor = ScriptedExecutor::default().with("test (default)", Scripted::Fail);
        let token = CancellationToken::new();
        let report = run_pipeline(&run, &executor, FailurePolicy::StopAtFirstFailure, &token, "en").await;

        assert_eq!(executor.calls(), vec!["build (default)", "test (default)"]);
        assert_eq!(report.not_run.len(), 4);
    }
}

#[cfg(test)]
mod bounds_tests {
    use super::*;

    #[tokio::test]
    async fn test_step_timeout_is_a_failure() {
        let configuration = BuildConfiguration::new("slow").with_timeout_secs(1);
        let run = expand(&[configuration], StepOrder::Stage);
        let executor = ScriptedExecutor::default().with("build (slow)", Scripted::Sleep(Duration::from_secs(30)));
        let token = CancellationToken::new();

        let report = run_pipeline(&run, &executor, FailurePolicy::StopAtFirstFailure, &token, "en").await;

        assert_eq!(report.results.len(), 1);
        assert_eq!(report.results[0].status, StepStatus::Failure);
        assert!(report.results[0].duration < Duration::from_secs(30));
        assert_eq!(labels_of(&report.not_run), vec!["test (slow)"]);
        assert!(!report.interrupted);
    }

    #[tokio::test]
    async fn test_cancelled_token_runs_nothing() {
        let executor = ScriptedExecutor::default();
        let token = CancellationToken::new();
        token.cancel();

        let report = run_pipeline(
            &default_run(),
            &executor,
            FailurePolicy::KeepGoing,
            &token,
            "en",
        )
        .await;

        assert!(executor.calls().is_empty());
        assert!(report.results.is_empty());
        assert_eq!(report.not_run.len(), 6);
        assert!(report.interrupted);
        assert_eq!(
            report.ensure_success().unwrap_err(),
            PipelineError::Incomplete { not_run: 6 }
        );
    }

    #[tokio::test]
    async fn test_interrupt_aborts_the_running_step() {
        let run = expand(&[BuildConfiguration::new("long")], StepOrder::Stage);
        let executor = ScriptedExecutor::default().with("build (long)", Scripted::Sleep(Duration::from_secs(30)));
        let token = CancellationToken::new();

        let canceller = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            canceller.cancel();
        });

        let report = run_pipeline(&run, &executor, FailurePolicy::KeepGoing, &token, "en").await;

        assert!(report.interrupted);
        assert_eq!(report.results.len(), 1);
        assert_eq!(report.results[0].status, StepStatus::Failure);
        assert_eq!(labels_of(&report.not_run), vec!["test (long)"]);
    }
}
