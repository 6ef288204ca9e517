//! # Run Command Module / 运行命令模块
//!
//! This module implements the `run` command: load the pipeline, check that
//! the triggering event subscribes to it, expand the matrix and execute the
//! steps one after another, then report.
//!
//! 此模块实现了 `run` 命令：加载流水线，检查触发事件是否订阅了它，
//! 展开矩阵并逐个执行步骤，然后输出报告。

use anyhow::Result;
use colored::*;
use std::path::PathBuf;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::{
    cli::commands::{self, Selection, SourceArgs},
    core::{
        execution::{CargoExecutor, FailurePolicy, run_pipeline},
        trigger::TriggerEvent,
    },
    infra::t,
    reporting::{
        console::{print_failure_details, print_summary},
        html::generate_html_report,
        json::write_json_report,
    },
};

/// Arguments of the `run` command.
#[derive(Debug, Clone)]
pub struct RunArgs {
    pub source: SourceArgs,
    pub selection: Selection,
    /// Collect every result instead of stopping at the first failure.
    pub keep_going: bool,
    pub event: Option<String>,
    pub branch: Option<String>,
    pub html: Option<PathBuf>,
    pub json: Option<PathBuf>,
    /// Do not echo tool output live; print it for failed steps instead.
    pub quiet: bool,
    /// Language given with `--lang`, which wins over the pipeline's `language`.
    pub lang: Option<String>,
}

/// Executes the run command with the provided arguments.
///
/// # Returns
/// `Ok` when every step succeeded or the event does not trigger the job;
/// an error naming the failing step otherwise.
pub async fn execute(args: RunArgs) -> Result<()> {
    let early_locale = crate::resolve_locale(args.lang.as_deref());
    let loaded = commands::load_pipeline(&args.source, &early_locale)?;
    let language = crate::init_locale(args.lang.as_deref().or(loaded.pipeline.language.as_deref()));
    let locale = language.as_str();

    let event = match TriggerEvent::from_args(args.event.as_deref(), args.branch.as_deref())? {
        Some(event) => event,
        None => TriggerEvent::from_env(),
    };
    if !loaded.pipeline.triggers.matches(&event) {
        println!(
            "{}",
            t!("trigger_not_matched", locale = locale, event = event.to_string()).yellow()
        );
        return Ok(());
    }

    let project_name = commands::describe_project(&loaded.project_root, locale)?;
    println!(
        "{}",
        t!("project_root_detected", locale = locale, path = loaded.project_root.display())
    );
    println!(
        "{}",
        t!("testing_project", locale = locale, name = project_name.yellow())
    );
    commands::print_pipeline_source(&loaded, locale);
    println!(
        "{}",
        t!("trigger_matched", locale = locale, event = event.to_string()).cyan()
    );

    let plan = args.selection.plan(&loaded.pipeline)?;

    match plan.shard {
        Some(shard) => println!(
            "{}",
            t!(
                "running_as_split_runner",
                locale = locale,
                index = shard.index + 1,
                total = shard.total,
                count = plan.configurations.len(),
                others = plan.other_shards_count
            )
            .bold()
        ),
        None => println!("{}", t!("running_as_single_runner", locale = locale).bold()),
    }

    if plan.run.is_empty() {
        println!("{}", t!("no_steps_to_run", locale = locale).green());
        return Ok(());
    }

    let policy = if args.keep_going {
        FailurePolicy::KeepGoing
    } else {
        FailurePolicy::StopAtFirstFailure
    };
    let executor = CargoExecutor::from_pipeline(&loaded.pipeline, loaded.project_root.clone())
        .echo(!args.quiet);
    let stop_token = setup_signal_handler(locale);

    let report = run_pipeline(&plan.run, &executor, policy, &stop_token, locale).await;
    stop_token.cancel();

    if args.quiet {
        print_failure_details(&report, locale);
    }
    print_summary(&report, locale);

    if let Some(report_path) = &args.html {
        println!(
            "\n{}",
            t!("generating_html_report", locale = locale, path = report_path.display())
        );
        if let Err(e) = generate_html_report(&report, report_path, locale) {
            eprintln!("{} {:#}", t!("html_report_failed", locale = locale).red(), e);
        }
    }
    if let Some(report_path) = &args.json {
        println!(
            "{}",
            t!("generating_json_report", locale = locale, path = report_path.display())
        );
        if let Err(e) = write_json_report(&report, report_path) {
            eprintln!("{} {:#}", t!("json_report_failed", locale = locale).red(), e);
        }
    }

    report.ensure_success()?;
    Ok(())
}

/// Cancels the returned token on Ctrl-C, which aborts the in-flight step.
/// Cancelling the token once the run is over also ends the listener task.
fn setup_signal_handler(locale: &str) -> CancellationToken {
    let token = CancellationToken::new();
    let token_clone = token.clone();
    let locale = locale.to_string();

    tokio::spawn(async move {
        tokio::select! {
            res = signal::ctrl_c() => match res {
                Ok(()) => {
                    println!("\n{}", t!("shutdown_signal", locale = &locale).yellow());
                    token_clone.cancel();
                }
                Err(e) => warn!(error = %e, "failed to listen for Ctrl-C"),
            },
            _ = token_clone.cancelled() => {}
        }
    });

    token
}
