//! # Workflow Command Module / 工作流命令模块
//!
//! Renders the pipeline as a hosted-CI workflow file, to stdout or to a path.
//!
//! 将流水线渲染为托管 CI 工作流文件，输出到标准输出或指定路径。

use anyhow::Result;
use colored::*;
use std::path::PathBuf;

use crate::cli::commands::{self, SourceArgs};
use crate::infra::{fs::write_file, t};
use crate::reporting::workflow::render_workflow;

/// Executes the workflow command.
pub fn execute(source: SourceArgs, output: Option<PathBuf>, name: &str, locale: &str) -> Result<()> {
    let loaded = commands::load_pipeline(&source, locale)?;
    let yaml = render_workflow(&loaded.pipeline, name)?;

    match output {
        Some(path) => {
            write_file(&path, &yaml)?;
            println!(
                "{}",
                t!("workflow_written", locale = locale, path = path.display()).green()
            );
        }
        None => print!("{yaml}"),
    }
    Ok(())
}
