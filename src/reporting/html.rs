//! # HTML Reporting Module / HTML 报告模块
//!
//! This module renders a pipeline report as a self-contained HTML page with
//! summary statistics, a table of steps and collapsible step output.
//!
//! 此模块将流水线报告渲染为独立的 HTML 页面，包含汇总统计、
//! 步骤表格以及可折叠的步骤输出。

use anyhow::Result;
use maud::{DOCTYPE, Markup, PreEscaped, html};
use std::path::Path;

use crate::core::models::{PipelineReport, RunResult, Step};
use crate::infra::{fs::write_file, t};

/// Embedded CSS styles for HTML reports / HTML 报告的嵌入式 CSS 样式
const HTML_STYLE: &str = include_str!("assets/report.css");

/// Embedded JavaScript for HTML report interactivity / HTML 报告交互性的嵌入式 JavaScript
const HTML_SCRIPT: &str = include_str!("assets/report.js");

/// Renders the HTML page for `report`.
///
/// 为 `report` 渲染 HTML 页面。
pub fn render_html_report(report: &PipelineReport, locale: &str) -> Markup {
    let verdict = if report.is_success() {
        ("verdict passed", t!("summary.job_passed", locale = locale).to_string())
    } else if let Some(failed) = report.first_failure() {
        (
            "verdict failed",
            t!(
                "summary.job_failed",
                locale = locale,
                position = failed.step.position(),
                label = failed.label()
            )
            .to_string(),
        )
    } else {
        ("verdict failed", t!("summary.job_incomplete", locale = locale).to_string())
    };

    let mut rows: Vec<(usize, Markup)> = report
        .results
        .iter()
        .map(|result| (result.step.position(), result_row(result, locale)))
        .collect();
    rows.extend(
        report
            .not_run
            .iter()
            .map(|step| (step.position(), not_run_row(step, locale))),
    );
    rows.sort_by_key(|row| row.0);

    html! {
        (DOCTYPE)
        html {
            head {
                meta charset="utf-8";
                title { (t!("html_report.title", locale = locale)) }
                style { (PreEscaped(HTML_STYLE)) }
            }
            body {
                h1 { (t!("html_report.main_header", locale = locale)) }
                p class="timestamps" {
                    (t!(
                        "html_report.timestamps",
                        locale = locale,
                        started = report.started_at.format("%Y-%m-%d %H:%M:%S UTC"),
                        finished = report.finished_at.format("%Y-%m-%d %H:%M:%S UTC")
                    ))
                }
                div class=(verdict.0) { (verdict.1) }
                div class="summary-container" {
                    (summary_item(report.planned_count(), "", &t!("html_report.summary.total", locale = locale)))
                    (summary_item(report.passed_count(), "passed-text", &t!("html_report.summary.passed", locale = locale)))
                    (summary_item(report.failed_count(), "failed-text", &t!("html_report.summary.failed", locale = locale)))
                    (summary_item(report.not_run.len(), "skipped-text", &t!("html_report.summary.not_run", locale = locale)))
                }
                table {
                    thead {
                        tr {
                            th class="position-col" { "#" }
                            th { (t!("html_report.table.header.step", locale = locale)) }
                            th class="status-col" { (t!("html_report.table.header.status", locale = locale)) }
                            th class="duration-cell" { (t!("html_report.table.header.duration", locale = locale)) }
                        }
                    }
                    tbody {
                        @for (_, row) in &rows {
                            (row)
                        }
                    }
                }
                script { (PreEscaped(HTML_SCRIPT)) }
            }
        }
    }
}

/// Generates the HTML report and writes it to `output_path`.
///
/// # Errors / 错误
/// Fails if the file or its parent directory cannot be written.
pub fn generate_html_report(report: &PipelineReport, output_path: &Path, locale: &str) -> Result<()> {
    let markup = render_html_report(report, locale);
    write_file(output_path, &markup.into_string())
}

fn summary_item(count: usize, class: &str, label: &str) -> Markup {
    html! {
        div class="summary-item" {
            span class={ "count " (class) } { (count) }
            span class="label" { (label) }
        }
    }
}

fn result_row(result: &RunResult, locale: &str) -> Markup {
    let output_id = format!("output-{}", result.step.position());
    html! {
        tr {
            td class="position-col" { (result.step.position()) }
            td { (result.label()) }
            td class="status-col" {
                div class={ "status-cell " (result.get_status_class()) } { (result.get_status_str(locale)) }
                @if !result.output.trim().is_empty() {
                    div class="output-toggle" onclick={ "toggleOutput('" (output_id) "')" } {
                        (t!("html_report.toggle_output", locale = locale))
                    }
                }
            }
            td class="duration-cell" { (format!("{:.2}s", result.duration.as_secs_f64())) }
        }
        @if !result.output.trim().is_empty() {
            tr id=(output_id) style="display:none;" {
                td colspan="4" { pre class="output-content" { (result.output) } }
            }
        }
    }
}

fn not_run_row(step: &Step, locale: &str) -> Markup {
    html! {
        tr {
            td class="position-col" { (step.position()) }
            td { (step.label()) }
            td class="status-col" {
                div class="status-cell status-not-run" { (t!("report.status_not_run", locale = locale)) }
            }
            td class="duration-cell" { "N/A" }
        }
    }
}
