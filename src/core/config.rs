//! # Pipeline Configuration Module / 流水线配置模块
//!
//! Defines the declarative pipeline loaded from `Pipeline.toml`: the build
//! configurations of the matrix, the exclusive feature groups of the verified
//! project, and the events that trigger a run.
//!
//! 定义从 `Pipeline.toml` 加载的声明式流水线：矩阵中的构建配置、
//! 被验证项目的互斥 feature 分组，以及触发运行的事件。

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// File name looked up in the project directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "Pipeline.toml";

/// The order in which the (configuration, action) pairs are laid out.
/// Both orders keep every Build ahead of its paired Test.
///
/// (配置, 动作) 对的排列顺序。两种顺序都保证构建先于其配对的测试。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepOrder {
    /// Every build in declaration order, then every test in declaration order.
    /// 先按声明顺序执行所有构建，再按声明顺序执行所有测试。
    #[default]
    Stage,
    /// Build then test for each configuration in turn.
    /// 依次对每个配置执行构建和测试。
    Configuration,
}

/// A named, immutable set of feature selectors for one build of the project.
///
/// 项目一次构建所使用的具名、不可变的 feature 选择集合。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildConfiguration {
    /// Unique name, used in step labels and reports.
    /// 唯一名称，用于步骤标签和报告。
    pub name: String,
    /// Features passed as `--features a,b`.
    /// 以 `--features a,b` 形式传递的 features。
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub features: Vec<String>,
    /// If `true`, `--no-default-features` is passed.
    /// 如果为 `true`，则传递 `--no-default-features`。
    #[serde(default)]
    pub no_default_features: bool,
    /// Optional upper bound for each action of this configuration.
    /// Absent means the action runs until the tool exits.
    /// 此配置每个动作的可选时间上限。未设置表示一直运行到工具退出。
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

impl BuildConfiguration {
    /// A configuration with the project's default features and nothing else.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            features: Vec::new(),
            no_default_features: false,
            timeout_secs: None,
        }
    }

    pub fn with_features<I, S>(mut self, features: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.features = features.into_iter().map(Into::into).collect();
        self
    }

    pub fn without_default_features(mut self) -> Self {
        self.no_default_features = true;
        self
    }

    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }

    /// The comma-separated feature list, as cargo expects it.
    pub fn feature_list(&self) -> String {
        self.features.join(",")
    }

    /// The cargo flags selecting this configuration's feature set.
    ///
    /// 选择此配置 feature 集合的 cargo 参数。
    pub fn cargo_flags(&self) -> Vec<String> {
        let mut flags = Vec::new();
        if self.no_default_features {
            flags.push("--no-default-features".to_string());
        }
        if !self.features.is_empty() {
            flags.push("--features".to_string());
            flags.push(self.feature_list());
        }
        flags
    }

    /// The features that end up enabled, given the project's default features.
    fn effective_features<'a>(&'a self, defaults: &'a [String]) -> BTreeSet<&'a str> {
        let mut enabled: BTreeSet<&str> = self.features.iter().map(String::as_str).collect();
        if !self.no_default_features {
            enabled.extend(defaults.iter().map(String::as_str));
        }
        enabled
    }
}

/// Events that start the job.
///
/// 启动任务的事件。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Triggers {
    /// Branches whose pushes run the job.
    /// 推送时会运行任务的分支。
    #[serde(default = "default_push_branches")]
    pub push_branches: Vec<String>,
    /// Whether every pull-request event runs the job, whatever its target branch.
    /// 是否对所有拉取请求事件运行任务（不论目标分支）。
    #[serde(default = "default_true")]
    pub pull_request: bool,
}

impl Default for Triggers {
    fn default() -> Self {
        Self {
            push_branches: default_push_branches(),
            pull_request: true,
        }
    }
}

/// Features the verified project enables when default features are on.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefaultFeatures {
    #[serde(default)]
    pub features: Vec<String>,
}

/// The whole pipeline definition, loaded from a TOML file.
///
/// 从 TOML 文件加载的完整流水线定义。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Output language (e.g. "en", "zh-CN"). Detected from the system when absent.
    /// 输出语言（例如 "en", "zh-CN"）。未设置时从系统检测。
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default)]
    pub order: StepOrder,
    /// The build tool to invoke.
    /// 要调用的构建工具。
    #[serde(default = "default_program")]
    pub program: String,
    /// Pass `--verbose` to every action.
    #[serde(default = "default_true")]
    pub verbose: bool,
    /// Pass `--workspace` so every package of the workspace is built and tested.
    #[serde(default = "default_true")]
    pub workspace: bool,
    #[serde(default)]
    pub triggers: Triggers,
    /// Named groups of features of which at most one may be enabled at once.
    /// 具名的 feature 分组，同一时间最多启用组内一个 feature。
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub exclusive_groups: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    pub defaults: DefaultFeatures,
    /// The matrix, in declaration order.
    /// 按声明顺序排列的矩阵。
    pub configurations: Vec<BuildConfiguration>,
}

/// Reasons a pipeline definition is rejected.
///
/// 流水线定义被拒绝的原因。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("the pipeline declares no configurations")]
    NoConfigurations,
    #[error("configuration #{index} has an empty name")]
    EmptyName { index: usize },
    #[error("configuration '{0}' is declared more than once")]
    DuplicateName(String),
    #[error("configuration '{configuration}' lists an empty feature name")]
    EmptyFeature { configuration: String },
    #[error(
        "configuration '{configuration}' enables alternate feature '{feature}' without disabling default features"
    )]
    DefaultsNotDisabled {
        configuration: String,
        feature: String,
    },
    #[error(
        "configuration '{configuration}' enables {features:?}, but at most one feature of group '{group}' may be active"
    )]
    ExclusiveConflict {
        configuration: String,
        group: String,
        features: Vec<String>,
    },
}

impl PipelineConfig {
    /// The built-in matrix: the default feature set, then the tokio runtime
    /// paired with each of the two error-handling libraries.
    ///
    /// 内置矩阵：默认 feature 集合，然后是 tokio 运行时分别搭配两种错误处理库。
    pub fn default_matrix() -> Self {
        let mut exclusive_groups = BTreeMap::new();
        exclusive_groups.insert(
            "runtime".to_string(),
            vec!["runtime-async-std".to_string(), "runtime-tokio".to_string()],
        );
        exclusive_groups.insert(
            "error".to_string(),
            vec!["anyhow".to_string(), "eyre".to_string()],
        );

        Self {
            language: None,
            order: StepOrder::Stage,
            program: default_program(),
            verbose: true,
            workspace: true,
            triggers: Triggers::default(),
            exclusive_groups,
            defaults: DefaultFeatures {
                features: vec!["runtime-async-std".to_string(), "anyhow".to_string()],
            },
            configurations: vec![
                BuildConfiguration::new("default"),
                BuildConfiguration::new("tokio-anyhow")
                    .without_default_features()
                    .with_features(["runtime-tokio", "anyhow"]),
                BuildConfiguration::new("tokio-eyre")
                    .without_default_features()
                    .with_features(["runtime-tokio", "eyre"]),
            ],
        }
    }

    /// Looks up a configuration by name.
    pub fn find(&self, name: &str) -> Option<&BuildConfiguration> {
        self.configurations.iter().find(|c| c.name == name)
    }

    /// Checks the structural rules and the feature exclusivity of every configuration.
    ///
    /// A feature that belongs to an exclusive group but is not one of the
    /// project's defaults is an *alternate* feature; enabling it requires
    /// `no_default_features`, so a configuration never mixes the default set
    /// with an alternate one.
    ///
    /// 检查结构规则以及每个配置的 feature 互斥性。
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.configurations.is_empty() {
            return Err(ConfigError::NoConfigurations);
        }

        let mut seen = HashSet::new();
        for (index, configuration) in self.configurations.iter().enumerate() {
            if configuration.name.trim().is_empty() {
                return Err(ConfigError::EmptyName { index: index + 1 });
            }
            if !seen.insert(configuration.name.as_str()) {
                return Err(ConfigError::DuplicateName(configuration.name.clone()));
            }
            if configuration.features.iter().any(|f| f.trim().is_empty()) {
                return Err(ConfigError::EmptyFeature {
                    configuration: configuration.name.clone(),
                });
            }
            self.check_exclusivity(configuration)?;
        }
        Ok(())
    }

    fn check_exclusivity(&self, configuration: &BuildConfiguration) -> Result<(), ConfigError> {
        let defaults = &self.defaults.features;

        if !configuration.no_default_features {
            let alternate = configuration.features.iter().find(|feature| {
                !defaults.contains(feature)
                    && self
                        .exclusive_groups
                        .values()
                        .any(|members| members.contains(feature))
            });
            if let Some(feature) = alternate {
                return Err(ConfigError::DefaultsNotDisabled {
                    configuration: configuration.name.clone(),
                    feature: feature.clone(),
                });
            }
        }

        let enabled = configuration.effective_features(defaults);
        for (group, members) in &self.exclusive_groups {
            let active: Vec<String> = members
                .iter()
                .filter(|member| enabled.contains(member.as_str()))
                .cloned()
                .collect();
            if active.len() > 1 {
                return Err(ConfigError::ExclusiveConflict {
                    configuration: configuration.name.clone(),
                    group: group.clone(),
                    features: active,
                });
            }
        }
        Ok(())
    }
}

/// Parses a pipeline definition from TOML text and validates it.
pub fn parse_pipeline(content: &str) -> Result<PipelineConfig> {
    let pipeline: PipelineConfig =
        toml::from_str(content).context("Failed to parse pipeline definition")?;
    pipeline.validate()?;
    Ok(pipeline)
}

/// Loads and validates the pipeline definition at `path`.
///
/// 加载并验证位于 `path` 的流水线定义。
pub fn load_pipeline(path: &Path) -> Result<PipelineConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read pipeline file: {}", path.display()))?;
    parse_pipeline(&content).with_context(|| format!("Invalid pipeline file: {}", path.display()))
}

fn default_push_branches() -> Vec<String> {
    vec!["master".to_string()]
}

fn default_program() -> String {
    "cargo".to_string()
}

fn default_true() -> bool {
    true
}
