//! # Pipeline Execution Engine Module / 流水线执行引擎模块
//!
//! This module runs a `PipelineRun` strictly in order, one external process
//! at a time. A configuration's test is only attempted after its build
//! succeeded, and by default the first failing step stops the whole run.
//!
//! 此模块严格按顺序运行 `PipelineRun`，每次只运行一个外部进程。
//! 只有在配置的构建成功之后才会尝试其测试，
//! 默认情况下第一个失败的步骤会终止整个运行。

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use colored::*;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::{
    core::{
        config::PipelineConfig,
        models::{Action, PipelineReport, PipelineRun, RunResult, Step, StepStatus},
    },
    infra::{command, t},
};

/// What the external tool reported for one step.
///
/// 外部工具对一个步骤的报告。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionOutput {
    pub success: bool,
    pub exit_code: Option<i32>,
    pub output: String,
}

impl ActionOutput {
    /// A failure that did not come from a tool exit code.
    pub fn failed(output: impl Into<String>) -> Self {
        Self {
            success: false,
            exit_code: None,
            output: output.into(),
        }
    }
}

/// Executes the action of a single step.
///
/// Errors returned here are not fatal to the runner: they are recorded as a
/// failed step, exactly like a non-zero exit.
///
/// 执行单个步骤的动作。此处返回的错误会被记录为失败的步骤，与非零退出码相同。
#[async_trait]
pub trait StepExecutor: Send + Sync {
    async fn execute(&self, step: &Step) -> Result<ActionOutput>;
}

/// Whether the runner stops at the first failing step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Abort the remainder of the run at the first failure.
    /// 在第一次失败时中止剩余的运行。
    #[default]
    StopAtFirstFailure,
    /// Keep running independent steps to collect every result. A test whose
    /// build failed is still never attempted.
    /// 继续运行独立的步骤以收集所有结果。构建失败的配置仍不会运行测试。
    KeepGoing,
}

/// Runs each step as a `cargo` invocation in the project directory.
///
/// 在项目目录中以 `cargo` 调用的方式运行每个步骤。
#[derive(Debug, Clone)]
pub struct CargoExecutor {
    program: String,
    project_root: PathBuf,
    workspace: bool,
    verbose: bool,
    echo: bool,
}

impl CargoExecutor {
    pub fn new(project_root: impl Into<PathBuf>) -> Self {
        Self {
            program: "cargo".to_string(),
            project_root: project_root.into(),
            workspace: true,
            verbose: true,
            echo: false,
        }
    }

    /// An executor honoring the tool settings of `pipeline`.
    pub fn from_pipeline(pipeline: &PipelineConfig, project_root: impl Into<PathBuf>) -> Self {
        Self::new(project_root)
            .program(&pipeline.program)
            .workspace(pipeline.workspace)
            .verbose(pipeline.verbose)
    }

    pub fn program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    pub fn workspace(mut self, workspace: bool) -> Self {
        self.workspace = workspace;
        self
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Print the tool's output live while it runs.
    pub fn echo(mut self, echo: bool) -> Self {
        self.echo = echo;
        self
    }

    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    /// The arguments passed to the tool for `step`, e.g.
    /// `build --workspace --verbose --no-default-features --features runtime-tokio,anyhow`.
    pub fn command_args(&self, step: &Step) -> Vec<String> {
        let mut args = vec![step.action().subcommand().to_string()];
        if self.workspace {
            args.push("--workspace".to_string());
        }
        if self.verbose {
            args.push("--verbose".to_string());
        }
        args.extend(step.configuration().cargo_flags());
        args
    }

    /// The full shell-quoted command line for `step`.
    pub fn command_line(&self, step: &Step) -> String {
        command::render_command(&self.program, &self.command_args(step))
    }
}

#[async_trait]
impl StepExecutor for CargoExecutor {
    async fn execute(&self, step: &Step) -> Result<ActionOutput> {
        let command_line = self.command_line(step);
        let mut cmd = tokio::process::Command::new(&self.program);
        cmd.args(self.command_args(step))
            .kill_on_drop(true)
            .current_dir(&self.project_root);

        debug!(command = %command_line, dir = %self.project_root.display(), "spawning");
        let (status_res, output) = command::spawn_and_capture(cmd, self.echo).await;
        let status = status_res.with_context(|| format!("Failed to run '{command_line}'"))?;

        Ok(ActionOutput {
            success: status.success(),
            exit_code: status.code(),
            output: format!("{} {}\n{}", t!("run.command_prefix"), command_line, output),
        })
    }
}

/// Runs the steps of `run` one after another and collects the report.
///
/// # Arguments
/// * `run` - The expanded pipeline
/// * `executor` - Performs each action
/// * `policy` - Stop at the first failure, or keep going
/// * `stop_token` - Cancelled on an interrupt signal; aborts the in-flight step
/// * `locale` - Language for progress messages
///
/// # Returns
/// A `PipelineReport` holding a `RunResult` for every step that ran.
pub async fn run_pipeline<E>(
    run: &PipelineRun,
    executor: &E,
    policy: FailurePolicy,
    stop_token: &CancellationToken,
    locale: &str,
) -> PipelineReport
where
    E: StepExecutor + ?Sized,
{
    let started_at = Utc::now();
    let total = run.len();
    let mut results = Vec::with_capacity(total);
    let mut not_run = Vec::new();
    let mut built: HashSet<String> = HashSet::new();
    let mut halted = false;
    let mut interrupted = false;

    info!(steps = total, ?policy, "pipeline started");

    for step in run {
        if !halted && stop_token.is_cancelled() {
            halted = true;
            interrupted = true;
        }
        if halted {
            not_run.push(step.clone());
            continue;
        }

        let name = &step.configuration().name;
        if step.action() == Action::Test && !built.contains(name) {
            println!(
                "{}",
                t!("run.test_skipped_no_build", locale = locale, label = step.label()).yellow()
            );
            debug!(step = step.position(), configuration = %name, "test skipped, build did not succeed");
            not_run.push(step.clone());
            continue;
        }

        println!(
            "{}",
            t!(
                "run.step_started",
                locale = locale,
                position = step.position(),
                total = total,
                label = step.label()
            )
            .blue()
            .bold()
        );

        let (result, was_interrupted) = run_step(step, executor, stop_token, locale).await;
        print_step_outcome(&result, locale);

        if result.is_success() {
            if step.action() == Action::Build {
                built.insert(name.clone());
            }
        } else {
            interrupted |= was_interrupted;
            if was_interrupted || policy == FailurePolicy::StopAtFirstFailure {
                halted = true;
            }
        }
        results.push(result);
    }

    if !not_run.is_empty() && halted {
        println!(
            "{}",
            t!("run.remaining_steps_skipped", locale = locale, count = not_run.len()).yellow()
        );
    }

    let report = PipelineReport {
        results,
        not_run,
        interrupted,
        started_at,
        finished_at: Utc::now(),
    };
    info!(
        passed = report.passed_count(),
        failed = report.failed_count(),
        not_run = report.not_run.len(),
        "pipeline finished"
    );
    report
}

/// Runs one step, bounded by its configuration's timeout and by the stop token.
/// Returns the result and whether the step was interrupted.
async fn run_step<E>(
    step: &Step,
    executor: &E,
    stop_token: &CancellationToken,
    locale: &str,
) -> (RunResult, bool)
where
    E: StepExecutor + ?Sized,
{
    let start = Instant::now();
    let timeout = step.configuration().timeout_secs.map(Duration::from_secs);

    let execution = async {
        match timeout {
            Some(limit) => match tokio::time::timeout(limit, executor.execute(step)).await {
                Ok(res) => res,
                Err(_) => {
                    warn!(step = step.position(), timeout_secs = limit.as_secs(), "step timed out");
                    Ok(ActionOutput::failed(t!(
                        "run.step_timeout_message",
                        locale = locale,
                        timeout = limit.as_secs()
                    )))
                }
            },
            None => executor.execute(step).await,
        }
    };

    let (outcome, interrupted) = tokio::select! {
        biased;
        _ = stop_token.cancelled() => {
            warn!(step = step.position(), "step interrupted");
            (
                ActionOutput::failed(t!("run.step_interrupted_message", locale = locale)),
                true,
            )
        }
        res = execution => {
            let outcome = res.unwrap_or_else(|e| {
                warn!(step = step.position(), error = %e, "step could not run");
                ActionOutput::failed(format!("{e:#}"))
            });
            (outcome, false)
        }
    };

    let result = RunResult {
        step: step.clone(),
        status: if outcome.success {
            StepStatus::Success
        } else {
            StepStatus::Failure
        },
        output: outcome.output,
        exit_code: outcome.exit_code,
        duration: start.elapsed(),
    };
    (result, interrupted)
}

fn print_step_outcome(result: &RunResult, locale: &str) {
    let duration = format!("{:.2}", result.duration.as_secs_f64());
    if result.is_success() {
        println!(
            "{}",
            t!("run.step_passed", locale = locale, label = result.label(), duration = duration).green()
        );
    } else {
        let exit_code = result
            .exit_code
            .map(|code| code.to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{}",
            t!(
                "run.step_failed",
                locale = locale,
                label = result.label(),
                duration = duration,
                code = exit_code
            )
            .red()
        );
    }
}
