//! # Infrastructure Module / 基础设施模块
//!
//! This module provides infrastructure services for `ci-matrix`,
//! including command execution, file system operations, tracing setup
//! and i18n support.
//!
//! 此模块为 `ci-matrix` 提供基础设施服务，
//! 包括命令执行、文件系统操作、tracing 初始化和国际化支持。

pub mod command;
pub mod fs;
pub mod telemetry;

// Re-export i18n functions for easier access
pub use rust_i18n::t;
