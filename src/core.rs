//! # Core Module / 核心模块
//!
//! This module contains the core functionality of `ci-matrix`:
//! the pipeline configuration model, matrix expansion, trigger evaluation
//! and the sequential step runner.
//!
//! 此模块包含 `ci-matrix` 的核心功能：
//! 流水线配置模型、矩阵展开、触发条件判断以及顺序步骤运行器。

pub mod config;
pub mod execution;
pub mod models;
pub mod planner;
pub mod trigger;

// Re-exports
pub use config::{BuildConfiguration, PipelineConfig};
pub use execution::run_pipeline;
pub use models::{Action, PipelineReport, PipelineRun, RunResult, Step, StepStatus};
