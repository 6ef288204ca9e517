//! # Commands / 子命令
//!
//! Implementations of the `run`, `plan`, `init` and `workflow` subcommands,
//! plus the pipeline loading they share.
//!
//! `run`、`plan`、`init` 和 `workflow` 子命令的实现，以及它们共享的流水线加载逻辑。

pub mod init;
pub mod plan;
pub mod run;
pub mod workflow;

use anyhow::{Context, Result};
use colored::*;
use std::path::{Path, PathBuf};

use crate::core::config::{self, DEFAULT_CONFIG_FILE, PipelineConfig};
use crate::core::planner::{self, ExecutionPlan, Shard};
use crate::infra::{fs, t};

/// Where the pipeline and the verified project come from.
#[derive(Debug, Clone)]
pub struct SourceArgs {
    /// Explicit pipeline file; `<project-dir>/Pipeline.toml` otherwise.
    pub config: Option<PathBuf>,
    pub project_dir: PathBuf,
}

/// Which configurations of the matrix take part.
#[derive(Debug, Clone, Default)]
pub struct Selection {
    pub only: Vec<String>,
    pub total_runners: Option<usize>,
    pub runner_index: Option<usize>,
}

impl Selection {
    pub fn plan(&self, pipeline: &PipelineConfig) -> Result<ExecutionPlan> {
        let shard = Shard::from_args(self.total_runners, self.runner_index)?;
        planner::plan_execution(pipeline, &self.only, shard)
    }
}

/// A loaded pipeline with the absolute project directory it applies to.
#[derive(Debug)]
pub struct LoadedPipeline {
    pub pipeline: PipelineConfig,
    /// `None` when the built-in matrix is used.
    pub config_path: Option<PathBuf>,
    pub project_root: PathBuf,
}

/// Resolves the project directory and loads the pipeline.
///
/// An explicit `--config` must exist. Without it, `Pipeline.toml` in the
/// project directory is used when present, and the built-in default matrix
/// otherwise.
///
/// 解析项目目录并加载流水线。显式的 `--config` 必须存在；
/// 否则使用项目目录中的 `Pipeline.toml`（如果存在），再否则使用内置的默认矩阵。
pub fn load_pipeline(source: &SourceArgs, locale: &str) -> Result<LoadedPipeline> {
    let project_dir = fs::expand_path(&source.project_dir)?;
    let project_root = fs::absolute_path(&project_dir)
        .with_context(|| t!("project_dir_not_found", locale = locale, path = project_dir.display()).to_string())?;

    let config_path = match &source.config {
        Some(path) => {
            let path = fs::expand_path(path)?;
            Some(
                fs::absolute_path(&path).with_context(|| {
                    t!("config_read_failed_path", locale = locale, path = path.display()).to_string()
                })?,
            )
        }
        None => Some(project_root.join(DEFAULT_CONFIG_FILE)).filter(|p| p.is_file()),
    };

    let pipeline = match &config_path {
        Some(path) => {
            config::load_pipeline(path).with_context(|| t!("config_parse_failed", locale = locale).to_string())?
        }
        None => PipelineConfig::default_matrix(),
    };

    Ok(LoadedPipeline {
        pipeline,
        config_path,
        project_root,
    })
}

/// Announces which pipeline definition is in use.
pub fn print_pipeline_source(loaded: &LoadedPipeline, locale: &str) {
    match &loaded.config_path {
        Some(path) => println!(
            "{}",
            t!("loading_pipeline", locale = locale, path = path.display())
        ),
        None => println!(
            "{}",
            t!("using_default_matrix", locale = locale, file = DEFAULT_CONFIG_FILE).yellow()
        ),
    }
}

/// Describes the project at `project_root`, from its manifest.
pub fn describe_project(project_root: &Path, locale: &str) -> Result<String> {
    let manifest = fs::read_manifest(project_root)
        .with_context(|| t!("manifest_read_failed", locale = locale, path = project_root.display()).to_string())?;
    Ok(match (manifest.package, manifest.workspace) {
        (Some(package), _) => package.name,
        (None, Some(_)) => t!("virtual_workspace", locale = locale).to_string(),
        (None, None) => t!("unnamed_project", locale = locale).to_string(),
    })
}
