//! # CI Matrix Library / CI Matrix 库
//!
//! This library provides the core functionality for the `ci-matrix` tool,
//! a sequential build/test runner that verifies a Rust project under a matrix
//! of mutually exclusive feature configurations.
//!
//! 此库为 `ci-matrix` 工具提供核心功能，
//! 这是一个在互斥 feature 配置矩阵下验证 Rust 项目的顺序构建/测试运行器。
//!
//! ## Modules / 模块
//!
//! - `core` - Pipeline model, matrix expansion, triggers and the sequential runner
//! - `infra` - Process spawning, file system helpers and tracing setup
//! - `reporting` - Console, HTML, JSON and workflow output
//! - `cli` - Command-line interface and commands
//!
//! - `core` - 流水线模型、矩阵展开、触发条件和顺序运行器
//! - `infra` - 进程派生、文件系统辅助函数和 tracing 初始化
//! - `reporting` - 控制台、HTML、JSON 和工作流输出
//! - `cli` - 命令行接口和命令

pub mod cli;
pub mod core;
pub mod infra;
pub mod reporting;

// Re-export commonly used items
pub use core::config;
pub use core::execution;
pub use core::models;
pub use core::planner;
pub use core::trigger;

// Initialize i18n
rust_i18n::i18n!("locales", fallback = "en");

/// Resolves the language used for all user-facing output.
///
/// An explicitly requested language wins; otherwise the system locale is
/// detected. The result is matched against the bundled locales, first on the
/// full tag (e.g. "zh-CN"), then on the language part only (e.g. "en" from
/// "en-US"), finally falling back to "en".
pub fn resolve_locale(requested: Option<&str>) -> String {
    let locale = requested
        .map(str::to_string)
        .or_else(sys_locale::get_locale)
        .unwrap_or_else(|| "en".to_string());
    let available_locales = rust_i18n::available_locales!();

    if available_locales.contains(&locale.as_str()) {
        return locale;
    }

    locale
        .split(['-', '_'])
        .next()
        .and_then(|lang_code| {
            available_locales
                .iter()
                .find(|available| available.split('-').next() == Some(lang_code))
        })
        .map(|lang| lang.to_string())
        .unwrap_or_else(|| "en".to_string())
}

/// Resolves the language and makes it the process-wide default for `t!`.
pub fn init_locale(requested: Option<&str>) -> String {
    let lang = resolve_locale(requested);
    rust_i18n::set_locale(&lang);
    lang
}
