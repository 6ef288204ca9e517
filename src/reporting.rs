//! # Reporting Module / 报告模块
//!
//! This module handles the presentation of pipeline runs: colorful console
//! summaries, HTML and JSON reports, and the rendering of the equivalent
//! hosted-CI workflow file.
//!
//! 此模块处理流水线运行的展示：彩色控制台摘要、HTML 和 JSON 报告，
//! 以及等效托管 CI 工作流文件的渲染。

pub mod console;
pub mod html;
pub mod json;
pub mod workflow;

// Re-export common reporting functions
pub use console::{print_failure_details, print_plan, print_summary};
pub use html::generate_html_report;
pub use json::write_json_report;
pub use workflow::render_workflow;
