//! # Data Models Module / 数据模型模块
//!
//! This module defines the data structures flowing through a pipeline run:
//! the actions, the immutable ordered list of steps, the result of each step
//! and the aggregate report.
//!
//! 此模块定义了在流水线运行中流转的数据结构：
//! 动作、不可变的有序步骤列表、每个步骤的结果以及汇总报告。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

use crate::core::config::BuildConfiguration;
use crate::infra::t;

/// What a step does to its configuration.
///
/// 步骤对其配置执行的操作。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    /// Compile every package with the configuration's features.
    /// 使用该配置的 features 编译所有包。
    Build,
    /// Run every package's test suite with the configuration's features.
    /// 使用该配置的 features 运行所有包的测试套件。
    Test,
}

impl Action {
    /// The cargo subcommand for this action.
    pub fn subcommand(self) -> &'static str {
        match self {
            Action::Build => "build",
            Action::Test => "test",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.subcommand())
    }
}

/// One (configuration, action) pair, at a fixed 1-based position of the run.
///
/// 一个 (配置, 动作) 对，位于运行中固定的位置（从 1 开始）。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Step {
    position: usize,
    configuration: BuildConfiguration,
    action: Action,
}

impl Step {
    pub fn new(position: usize, configuration: BuildConfiguration, action: Action) -> Self {
        Self {
            position,
            configuration,
            action,
        }
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn configuration(&self) -> &BuildConfiguration {
        &self.configuration
    }

    pub fn action(&self) -> Action {
        self.action
    }

    /// Display label, e.g. `build (default)`.
    pub fn label(&self) -> String {
        format!("{} ({})", self.action, self.configuration.name)
    }
}

/// The ordered sequence of steps produced by expanding the matrix.
/// It is immutable once generated and consumed strictly in order.
///
/// 展开矩阵得到的有序步骤序列。生成后不可变，并严格按顺序消费。
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PipelineRun {
    steps: Vec<Step>,
}

impl PipelineRun {
    /// Builds a run from steps, renumbering positions to match their order.
    pub fn new(steps: Vec<(BuildConfiguration, Action)>) -> Self {
        let steps = steps
            .into_iter()
            .enumerate()
            .map(|(i, (configuration, action))| Step::new(i + 1, configuration, action))
            .collect();
        Self { steps }
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Step> {
        self.steps.iter()
    }
}

impl<'a> IntoIterator for &'a PipelineRun {
    type Item = &'a Step;
    type IntoIter = std::slice::Iter<'a, Step>;

    fn into_iter(self) -> Self::IntoIter {
        self.steps.iter()
    }
}

/// Outcome classification of one step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StepStatus {
    Success,
    Failure,
}

/// The outcome of one action applied to one configuration.
///
/// 一个动作作用于一个配置后的结果。
#[derive(Debug, Clone)]
pub struct RunResult {
    /// The step that was executed / 已执行的步骤
    pub step: Step,
    pub status: StepStatus,
    /// Interleaved stdout and stderr of the tool, or the reason it could not run.
    /// 工具交错的 stdout 和 stderr，或其无法运行的原因。
    pub output: String,
    /// Exit code of the tool, if it exited normally.
    pub exit_code: Option<i32>,
    pub duration: Duration,
}

impl RunResult {
    pub fn is_success(&self) -> bool {
        self.status == StepStatus::Success
    }

    pub fn label(&self) -> String {
        self.step.label()
    }

    /// Gets the status of the result as a localized string for display.
    /// 以本地化字符串形式获取结果状态以供显示。
    pub fn get_status_str(&self, locale: &str) -> String {
        match self.status {
            StepStatus::Success => t!("report.status_success", locale = locale).to_string(),
            StepStatus::Failure => t!("report.status_failure", locale = locale).to_string(),
        }
    }

    /// Gets the CSS class used for this status in the HTML report.
    pub fn get_status_class(&self) -> &'static str {
        match self.status {
            StepStatus::Success => "status-success",
            StepStatus::Failure => "status-failure",
        }
    }
}

/// The aggregate outcome of a pipeline run.
///
/// 流水线运行的汇总结果。
#[derive(Debug, Clone)]
pub struct PipelineReport {
    /// Results in execution order / 按执行顺序排列的结果
    pub results: Vec<RunResult>,
    /// Steps that were never attempted / 从未尝试执行的步骤
    pub not_run: Vec<Step>,
    /// Whether the run was cut short by an interrupt signal.
    pub interrupted: bool,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl PipelineReport {
    /// The run succeeds only if every step ran and every step succeeded.
    pub fn is_success(&self) -> bool {
        self.not_run.is_empty() && self.results.iter().all(RunResult::is_success)
    }

    /// The first failing step, to which the job failure is attributed.
    pub fn first_failure(&self) -> Option<&RunResult> {
        self.results.iter().find(|r| !r.is_success())
    }

    pub fn failures(&self) -> impl Iterator<Item = &RunResult> {
        self.results.iter().filter(|r| !r.is_success())
    }

    pub fn passed_count(&self) -> usize {
        self.results.iter().filter(|r| r.is_success()).count()
    }

    pub fn failed_count(&self) -> usize {
        self.results.len() - self.passed_count()
    }

    /// Total number of steps the run was planned with.
    pub fn planned_count(&self) -> usize {
        self.results.len() + self.not_run.len()
    }

    pub fn total_duration(&self) -> Duration {
        self.results.iter().map(|r| r.duration).sum()
    }

    /// Converts the report into the job's exit contract.
    ///
    /// 将报告转换为任务的退出约定。
    pub fn ensure_success(&self) -> Result<(), PipelineError> {
        match self.first_failure() {
            Some(failed) => Err(PipelineError::StepFailed {
                position: failed.step.position(),
                label: failed.label(),
            }),
            None if !self.not_run.is_empty() => Err(PipelineError::Incomplete {
                not_run: self.not_run.len(),
            }),
            None => Ok(()),
        }
    }
}

/// Why a job did not succeed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PipelineError {
    #[error("job failed at step {position}: {label}")]
    StepFailed { position: usize, label: String },
    #[error("job stopped before {not_run} step(s) could run")]
    Incomplete { not_run: usize },
}
