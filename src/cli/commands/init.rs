//! # Init Command Module / 初始化命令模块
//!
//! This module implements the `init` command, which creates a new
//! `Pipeline.toml`, either from the built-in matrix or through an interactive
//! wizard.
//!
//! 此模块实现了 `init` 命令，用于创建新的 `Pipeline.toml`，
//! 可以基于内置矩阵，也可以通过交互式向导生成。

use anyhow::{Context, Result, bail};
use colored::*;
use dialoguer::{Confirm, Input, MultiSelect, theme::ColorfulTheme};
use std::path::Path;

use crate::core::config::{BuildConfiguration, PipelineConfig};
use crate::infra::{fs, t};

/// The file written by `init --non-interactive`. It parses to
/// `PipelineConfig::default_matrix()`.
pub const DEFAULT_CONFIG: &str = r#"# Feature-matrix pipeline / 特性矩阵流水线
#
# Every configuration is built first, then every configuration is tested.
# The first failing step stops the run.
# 先构建所有配置，再测试所有配置。第一个失败的步骤会终止运行。

# "stage" (all builds, then all tests) or "configuration" (build+test per configuration)
order = "stage"

# Tool invoked for every step / 每个步骤调用的工具
program = "cargo"
verbose = true
workspace = true

[triggers]
push_branches = ["master"]
pull_request = true

# At most one feature of each group may be enabled at once.
# 每个分组中同一时间最多只能启用一个 feature。
[exclusive_groups]
error = ["anyhow", "eyre"]
runtime = ["runtime-async-std", "runtime-tokio"]

# Features the project enables by default / 项目默认启用的 features
[defaults]
features = ["runtime-async-std", "anyhow"]

[[configurations]]
name = "default"

[[configurations]]
name = "tokio-anyhow"
no_default_features = true
features = ["runtime-tokio", "anyhow"]

[[configurations]]
name = "tokio-eyre"
no_default_features = true
features = ["runtime-tokio", "eyre"]
# Optional bound per action, in seconds / 每个动作的可选时间上限（秒）
# timeout_secs = 1800
"#;

/// Executes the init command.
///
/// # Arguments
/// * `output` - Path for the new pipeline file
/// * `force` - Overwrite an existing file without asking
/// * `non_interactive` - Write the built-in matrix without launching the wizard
/// * `locale` - Language for prompts and messages
pub fn execute(output: &Path, force: bool, non_interactive: bool, locale: &str) -> Result<()> {
    if non_interactive {
        if output.exists() && !force {
            println!(
                "{}",
                t!("init.file_exists", locale = locale, path = output.display()).red()
            );
            println!("{}", t!("init.use_force", locale = locale).yellow());
            return Ok(());
        }
        return write_config(output, DEFAULT_CONFIG, locale);
    }

    run_wizard(output, force, locale)
}

fn run_wizard(output: &Path, force: bool, locale: &str) -> Result<()> {
    let theme = ColorfulTheme::default();

    println!("\n{}", t!("init.wizard_welcome", locale = locale).cyan().bold());
    println!("{}", t!("init.wizard_description", locale = locale));

    if output.exists() && !force {
        let confirmation = Confirm::with_theme(&theme)
            .with_prompt(t!("init.overwrite_prompt", locale = locale, path = output.display()))
            .default(false)
            .interact()
            .context(t!("init.user_input_failed", locale = locale).to_string())?;
        if !confirmation {
            println!("{}", t!("init.aborted", locale = locale));
            return Ok(());
        }
    }

    let project_dir = output
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    if let Ok(Some(package)) = fs::read_manifest(project_dir).map(|m| m.package) {
        println!(
            "{}",
            t!("init.detected_project", locale = locale, name = package.name.green())
        );
    }

    let mut pipeline = PipelineConfig::default_matrix();
    let templates: Vec<String> = pipeline
        .configurations
        .iter()
        .map(|c| describe_configuration(c, locale))
        .collect();
    let selections = MultiSelect::with_theme(&theme)
        .with_prompt(t!("init.template_selection_prompt", locale = locale))
        .items(&templates)
        .defaults(&vec![true; templates.len()])
        .interact()
        .context(t!("init.user_input_failed", locale = locale).to_string())?;

    let mut configurations: Vec<BuildConfiguration> = selections
        .into_iter()
        .map(|i| pipeline.configurations[i].clone())
        .collect();

    while Confirm::with_theme(&theme)
        .with_prompt(t!("init.add_custom_prompt", locale = locale))
        .default(configurations.is_empty())
        .interact()
        .context(t!("init.user_input_failed", locale = locale).to_string())?
    {
        configurations.push(prompt_configuration(&theme, locale)?);
    }

    pipeline.configurations = configurations;
    if let Err(e) = pipeline.validate() {
        println!("{}", t!("init.invalid_pipeline", locale = locale).red());
        bail!(e);
    }

    let content = toml::to_string_pretty(&pipeline).context("Failed to serialize pipeline")?;
    write_config(output, &content, locale)
}

fn prompt_configuration(theme: &ColorfulTheme, locale: &str) -> Result<BuildConfiguration> {
    let name: String = Input::with_theme(theme)
        .with_prompt(t!("init.custom_name_prompt", locale = locale))
        .interact_text()
        .context(t!("init.user_input_failed", locale = locale).to_string())?;
    let features: String = Input::with_theme(theme)
        .with_prompt(t!("init.custom_features_prompt", locale = locale))
        .allow_empty(true)
        .interact_text()
        .context(t!("init.user_input_failed", locale = locale).to_string())?;
    let no_default_features = Confirm::with_theme(theme)
        .with_prompt(t!("init.custom_no_default_prompt", locale = locale))
        .default(false)
        .interact()
        .context(t!("init.user_input_failed", locale = locale).to_string())?;

    let mut configuration = BuildConfiguration::new(name.trim()).with_features(
        features
            .split(',')
            .map(str::trim)
            .filter(|f| !f.is_empty()),
    );
    configuration.no_default_features = no_default_features;
    Ok(configuration)
}

fn describe_configuration(configuration: &BuildConfiguration, locale: &str) -> String {
    let flags = configuration.cargo_flags();
    if flags.is_empty() {
        format!(
            "{} ({})",
            configuration.name,
            t!("init.template_default_features", locale = locale)
        )
    } else {
        format!("{} ({})", configuration.name, flags.join(" "))
    }
}

fn write_config(output: &Path, content: &str, locale: &str) -> Result<()> {
    fs::write_file(output, content)
        .with_context(|| t!("init.write_failed", locale = locale, path = output.display()).to_string())?;
    println!(
        "{}",
        t!("init.success", locale = locale, path = output.display()).green()
    );
    println!("{}", t!("init.next_steps", locale = locale));
    Ok(())
}
