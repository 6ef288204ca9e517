//! # JSON Reporting Module / JSON 报告模块
//!
//! A machine-readable rendition of a pipeline report, for CI dashboards and
//! other tooling.
//!
//! 流水线报告的机器可读形式，供 CI 仪表盘和其他工具使用。

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::Path;

use crate::core::models::{Action, PipelineReport, StepStatus};
use crate::infra::fs::write_file;

/// Top-level JSON document.
#[derive(Debug, Serialize)]
pub struct JsonReport {
    pub success: bool,
    pub interrupted: bool,
    /// Position of the step the failure is attributed to.
    pub failed_step: Option<usize>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub steps: Vec<JsonStep>,
}

/// One planned step, whether it ran or not.
#[derive(Debug, Serialize)]
pub struct JsonStep {
    pub position: usize,
    pub label: String,
    pub configuration: String,
    pub action: Action,
    pub features: Vec<String>,
    pub no_default_features: bool,
    /// `None` for steps that never ran.
    pub status: Option<StepStatus>,
    pub exit_code: Option<i32>,
    pub duration_secs: Option<f64>,
    pub output: Option<String>,
}

impl From<&PipelineReport> for JsonReport {
    fn from(report: &PipelineReport) -> Self {
        let mut steps: Vec<JsonStep> = report
            .results
            .iter()
            .map(|result| {
                let configuration = result.step.configuration();
                JsonStep {
                    position: result.step.position(),
                    label: result.label(),
                    configuration: configuration.name.clone(),
                    action: result.step.action(),
                    features: configuration.features.clone(),
                    no_default_features: configuration.no_default_features,
                    status: Some(result.status),
                    exit_code: result.exit_code,
                    duration_secs: Some(result.duration.as_secs_f64()),
                    output: Some(result.output.clone()),
                }
            })
            .collect();
        steps.extend(report.not_run.iter().map(|step| JsonStep {
            position: step.position(),
            label: step.label(),
            configuration: step.configuration().name.clone(),
            action: step.action(),
            features: step.configuration().features.clone(),
            no_default_features: step.configuration().no_default_features,
            status: None,
            exit_code: None,
            duration_secs: None,
            output: None,
        }));
        steps.sort_by_key(|step| step.position);

        JsonReport {
            success: report.is_success(),
            interrupted: report.interrupted,
            failed_step: report.first_failure().map(|r| r.step.position()),
            started_at: report.started_at,
            finished_at: report.finished_at,
            steps,
        }
    }
}

/// Serializes `report` as pretty-printed JSON and writes it to `output_path`.
pub fn write_json_report(report: &PipelineReport, output_path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(&JsonReport::from(report))
        .context("Failed to serialize JSON report")?;
    write_file(output_path, &json)
}
