//! # Workflow Rendering Module / 工作流渲染模块
//!
//! Renders a pipeline as the equivalent GitHub Actions workflow: the same
//! triggers, one `build` job on a Linux runner, a checkout step, then every
//! build/test step in the order the runner would execute them. The hosted
//! job stops at the first failing step, matching the local runner.
//!
//! 将流水线渲染为等效的 GitHub Actions 工作流：相同的触发条件、
//! 一个运行在 Linux 上的 `build` 任务、一个检出步骤，
//! 然后按运行器的执行顺序列出每个构建/测试步骤。

use anyhow::{Context, Result};
use serde::Serialize;

use crate::core::config::PipelineConfig;
use crate::core::execution::CargoExecutor;
use crate::core::models::{Action, Step};
use crate::core::planner;

/// Default workflow name, as shown in the hosted CI's UI.
pub const DEFAULT_WORKFLOW_NAME: &str = "Rust";

const RUNNER_IMAGE: &str = "ubuntu-latest";
const CHECKOUT_ACTION: &str = "actions/checkout@v4";

#[derive(Debug, Serialize)]
struct Workflow {
    name: String,
    on: On,
    jobs: Jobs,
}

/// An empty trigger body such as `pull_request: {}`.
#[derive(Debug, Serialize)]
struct Always {}

#[derive(Debug, Serialize)]
struct On {
    #[serde(skip_serializing_if = "Option::is_none")]
    push: Option<PushTrigger>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pull_request: Option<Always>,
    #[serde(skip_serializing_if = "Option::is_none")]
    workflow_dispatch: Option<Always>,
}

#[derive(Debug, Serialize)]
struct PushTrigger {
    branches: Vec<String>,
}

#[derive(Debug, Serialize)]
struct Jobs {
    build: Job,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "kebab-case")]
struct Job {
    runs_on: &'static str,
    steps: Vec<JobStep>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "kebab-case")]
struct JobStep {
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    uses: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    run: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    timeout_minutes: Option<u64>,
}

impl JobStep {
    fn checkout() -> Self {
        JobStep {
            name: None,
            uses: Some(CHECKOUT_ACTION),
            run: None,
            timeout_minutes: None,
        }
    }

    fn for_step(step: &Step, executor: &CargoExecutor) -> Self {
        JobStep {
            name: Some(step_title(step)),
            uses: None,
            run: Some(executor.command_line(step)),
            timeout_minutes: step.configuration().timeout_secs.map(|secs| secs.div_ceil(60)),
        }
    }
}

/// Renders the workflow YAML for `pipeline`.
///
/// 为 `pipeline` 渲染工作流 YAML。
pub fn render_workflow(pipeline: &PipelineConfig, workflow_name: &str) -> Result<String> {
    let run = planner::expand(&pipeline.configurations, pipeline.order);
    let executor = CargoExecutor::from_pipeline(pipeline, ".");

    let steps = std::iter::once(JobStep::checkout())
        .chain(run.iter().map(|step| JobStep::for_step(step, &executor)))
        .collect();

    let workflow = Workflow {
        name: workflow_name.to_string(),
        on: triggers_of(pipeline),
        jobs: Jobs {
            build: Job {
                runs_on: RUNNER_IMAGE,
                steps,
            },
        },
    };

    serde_yaml::to_string(&workflow).context("Failed to serialize the workflow")
}

/// Without push branches or pull requests the workflow is manual-only.
fn triggers_of(pipeline: &PipelineConfig) -> On {
    let triggers = &pipeline.triggers;
    let manual_only = triggers.push_branches.is_empty() && !triggers.pull_request;

    On {
        push: (!triggers.push_branches.is_empty()).then(|| PushTrigger {
            branches: triggers.push_branches.clone(),
        }),
        pull_request: triggers.pull_request.then_some(Always {}),
        workflow_dispatch: manual_only.then_some(Always {}),
    }
}

/// `Build (default)`, `Run tests (tokio-eyre)`.
fn step_title(step: &Step) -> String {
    let verb = match step.action() {
        Action::Build => "Build",
        Action::Test => "Run tests",
    };
    format!("{} ({})", verb, step.configuration().name)
}
