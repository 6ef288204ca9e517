//! # File System Operations Module / 文件系统操作模块
//!
//! Path expansion, project detection and report writing.
//!
//! 路径展开、项目检测和报告写入。

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Package information from Cargo.toml
/// 来自Cargo.toml的包信息
#[derive(Debug, Clone, Deserialize)]
pub struct Package {
    pub name: String,
}

/// The parts of a Cargo.toml manifest the runner looks at. Virtual
/// workspace manifests have no `[package]`.
///
/// 运行器关心的 Cargo.toml 清单部分。虚拟工作区清单没有 `[package]`。
#[derive(Debug, Clone, Deserialize)]
pub struct Manifest {
    pub package: Option<Package>,
    pub workspace: Option<toml::Table>,
}

/// Expands `~` and environment variables in a path given on the command line.
pub fn expand_path(path: &Path) -> Result<PathBuf> {
    let raw = path.to_string_lossy();
    let expanded = shellexpand::full(&raw)
        .with_context(|| format!("Failed to expand path: {raw}"))?;
    Ok(PathBuf::from(expanded.as_ref()))
}

/// Gets the absolute path from a potentially relative path.
///
/// # Returns
/// Canonicalized absolute path, or an error if the path doesn't exist
pub fn absolute_path(path: &Path) -> Result<PathBuf> {
    fs::canonicalize(path).with_context(|| format!("Failed to resolve path: {}", path.display()))
}

/// Reads the manifest at the root of a cargo project.
pub fn read_manifest(project_root: &Path) -> Result<Manifest> {
    let manifest_path = project_root.join("Cargo.toml");
    let content = fs::read_to_string(&manifest_path)
        .with_context(|| format!("Failed to read manifest: {}", manifest_path.display()))?;
    toml::from_str(&content)
        .with_context(|| format!("Failed to parse manifest: {}", manifest_path.display()))
}

/// Writes `contents` to `path`, creating missing parent directories.
pub fn write_file(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }
    fs::write(path, contents).with_context(|| format!("Failed to write file: {}", path.display()))
}
