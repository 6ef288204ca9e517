//! # Trigger Module / 触发条件模块
//!
//! Decides whether the event that started the process should run the job.
//! Events come from explicit CLI flags or from the variables the hosting CI
//! system injects; a plain local invocation counts as a manual run.
//!
//! 判断启动进程的事件是否应运行任务。
//! 事件来自显式的命令行参数或托管 CI 系统注入的变量；
//! 普通的本地调用视为手动运行。

use anyhow::{Result, bail};
use std::env;
use std::fmt;

use crate::core::config::Triggers;

/// The event that started the process.
///
/// 启动进程的事件。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TriggerEvent {
    /// A push. `branch` is `None` for pushes that are not to a branch (tags).
    /// 推送事件。对于非分支推送（标签），`branch` 为 `None`。
    Push { branch: Option<String> },
    /// A pull-request event of any action type, against any base branch.
    /// 任意动作类型、任意目标分支的拉取请求事件。
    PullRequest { base: Option<String> },
    /// A local or explicitly requested run, including a hosted
    /// `workflow_dispatch`.
    /// 本地或显式请求的运行，包括托管环境中的 `workflow_dispatch`。
    Manual,
    /// Any other hosted event, which the pipeline does not subscribe to.
    Other(String),
}

impl TriggerEvent {
    /// Detects the event from the process environment.
    pub fn from_env() -> Self {
        Self::from_vars(|key| env::var(key).ok())
    }

    /// Detects the event from `GITHUB_EVENT_NAME` and the ref variables,
    /// read through `get`. Without an event name the run is manual.
    pub fn from_vars<F>(get: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let Some(event_name) = get("GITHUB_EVENT_NAME").filter(|name| !name.is_empty()) else {
            return TriggerEvent::Manual;
        };

        match event_name.as_str() {
            "push" => {
                let branch = match get("GITHUB_REF") {
                    Some(git_ref) if git_ref.starts_with("refs/") => git_ref
                        .strip_prefix("refs/heads/")
                        .map(str::to_string),
                    _ => get("GITHUB_REF_NAME"),
                };
                TriggerEvent::Push { branch }
            }
            "pull_request" | "pull_request_target" => TriggerEvent::PullRequest {
                base: get("GITHUB_BASE_REF").filter(|base| !base.is_empty()),
            },
            "workflow_dispatch" => TriggerEvent::Manual,
            other => TriggerEvent::Other(other.to_string()),
        }
    }

    /// Builds the event from the `--event`/`--branch` flags.
    /// Returns `None` when no event was given on the command line.
    pub fn from_args(event: Option<&str>, branch: Option<&str>) -> Result<Option<Self>> {
        let branch = branch.map(str::to_string);
        let event = match event {
            None if branch.is_some() => Some(TriggerEvent::Push { branch }),
            None => None,
            Some("push") => Some(TriggerEvent::Push { branch }),
            Some("pull_request") | Some("pull-request") => {
                Some(TriggerEvent::PullRequest { base: branch })
            }
            Some("manual") => Some(TriggerEvent::Manual),
            Some(other) => bail!(
                "Unknown event '{}'. Expected one of: push, pull_request, manual.",
                other
            ),
        };
        Ok(event)
    }
}

impl fmt::Display for TriggerEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TriggerEvent::Push { branch: Some(branch) } => write!(f, "push to '{branch}'"),
            TriggerEvent::Push { branch: None } => f.write_str("push"),
            TriggerEvent::PullRequest { base: Some(base) } => {
                write!(f, "pull request against '{base}'")
            }
            TriggerEvent::PullRequest { base: None } => f.write_str("pull request"),
            TriggerEvent::Manual => f.write_str("manual run"),
            TriggerEvent::Other(name) => write!(f, "'{name}' event"),
        }
    }
}

impl Triggers {
    /// Whether `event` runs the job.
    ///
    /// 判断 `event` 是否会运行任务。
    pub fn matches(&self, event: &TriggerEvent) -> bool {
        match event {
            TriggerEvent::Push { branch: Some(branch) } => {
                self.push_branches.iter().any(|b| b == branch)
            }
            TriggerEvent::Push { branch: None } => false,
            TriggerEvent::PullRequest { .. } => self.pull_request,
            TriggerEvent::Manual => true,
            TriggerEvent::Other(_) => false,
        }
    }
}
