//! # Console Reporting Module / 控制台报告模块
//!
//! This module prints the expanded plan, the end-of-run summary and the
//! output of failing steps to the console, with internationalization support.
//!
//! 此模块在控制台打印展开后的计划、运行结束摘要以及失败步骤的输出，支持国际化。

use colored::*;

use crate::core::execution::CargoExecutor;
use crate::core::models::{PipelineReport, PipelineRun};
use crate::infra::t;

/// Prints the steps of a run with the exact command each one executes.
///
/// 打印运行中的各个步骤以及每个步骤执行的具体命令。
///
/// # Output Format / 输出格式
/// ```text
/// --- Pipeline Plan ---
///   1. build (default)            cargo build --workspace --verbose
///   2. build (tokio-anyhow)       cargo build --workspace --verbose --no-default-features --features runtime-tokio,anyhow
/// ```
pub fn print_plan(run: &PipelineRun, executor: &CargoExecutor, locale: &str) {
    println!("\n{}", t!("plan.banner", locale = locale).bold());
    for step in run {
        println!(
            "  {:>2}. {:<28} {}",
            step.position(),
            step.label(),
            executor.command_line(step).dimmed()
        );
    }
}

/// Prints a formatted summary of the run: one line per planned step, then the
/// overall verdict with the attribution of the first failure.
///
/// 打印运行的格式化摘要：每个计划步骤一行，然后是总体结论以及第一个失败的归属。
///
/// # Output Format / 输出格式
/// ```text
/// --- Pipeline Summary ---
///   1. Success  | build (default)               |      12.30s
///   2. Failure  | build (tokio-anyhow)          |       3.10s
///   3. Not run  | build (tokio-eyre)            |         N/A
/// ```
pub fn print_summary(report: &PipelineReport, locale: &str) {
    println!("\n{}", t!("summary.banner", locale = locale).bold());

    let mut rows: Vec<(usize, String, ColoredString, String)> = report
        .results
        .iter()
        .map(|result| {
            let status = result.get_status_str(locale);
            let status = if result.is_success() {
                status.green()
            } else {
                status.red()
            };
            (
                result.step.position(),
                result.label(),
                status,
                format!("{:.2}s", result.duration.as_secs_f64()),
            )
        })
        .collect();
    rows.extend(report.not_run.iter().map(|step| {
        (
            step.position(),
            step.label(),
            t!("report.status_not_run", locale = locale).to_string().dimmed(),
            "N/A".to_string(),
        )
    }));
    rows.sort_by_key(|row| row.0);

    for (position, label, status, duration) in rows {
        println!("  {:>2}. {:<10} | {:<30} | {:>10}", position, status, label, duration);
    }

    println!(
        "\n{}",
        t!(
            "summary.counts",
            locale = locale,
            passed = report.passed_count(),
            failed = report.failed_count(),
            not_run = report.not_run.len(),
            duration = format!("{:.2}", report.total_duration().as_secs_f64())
        )
    );

    if report.interrupted {
        println!("{}", t!("summary.interrupted", locale = locale).yellow());
    }

    match report.first_failure() {
        Some(failed) => println!(
            "\n{}",
            t!(
                "summary.job_failed",
                locale = locale,
                position = failed.step.position(),
                label = failed.label()
            )
            .red()
            .bold()
        ),
        None if report.is_success() => {
            println!("\n{}", t!("summary.job_passed", locale = locale).green().bold())
        }
        None => println!("\n{}", t!("summary.job_incomplete", locale = locale).yellow().bold()),
    }
}

/// Prints the captured output of every failed step. Used when the output was
/// not already echoed live.
///
/// 打印每个失败步骤捕获的输出。在输出未被实时回显时使用。
pub fn print_failure_details(report: &PipelineReport, locale: &str) {
    let failures: Vec<_> = report.failures().collect();
    if failures.is_empty() {
        return;
    }

    println!("\n{}", t!("summary.failure_details_banner", locale = locale).red().bold());
    println!("{}", "-".repeat(80));

    for (i, result) in failures.iter().enumerate() {
        println!(
            "[{}/{}] {} '{}'",
            i + 1,
            failures.len(),
            t!("summary.failure_header", locale = locale).red(),
            result.label().cyan()
        );
        println!("\n--- {} ---\n", t!("summary.step_log", locale = locale).yellow());
        println!("{}", result.output.trim_end());
        println!("\n{}", "-".repeat(80));
    }
}
