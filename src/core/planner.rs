//! # Matrix Expansion Planner Module / 矩阵展开计划模块
//!
//! This module turns the declared configurations into the ordered
//! `PipelineRun`, including selection by name and the split of the matrix
//! across several CI runners.
//!
//! 此模块将声明的配置转换为有序的 `PipelineRun`，
//! 包括按名称选择以及在多个 CI 运行器之间拆分矩阵。

use anyhow::{Result, bail};

use crate::core::config::{BuildConfiguration, PipelineConfig, StepOrder};
use crate::core::models::{Action, PipelineRun};

/// The slice of the matrix handled by one of several CI runners.
///
/// 多个 CI 运行器之一所处理的矩阵切片。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Shard {
    pub total: usize,
    pub index: usize,
}

impl Shard {
    /// Builds a shard from the `--total-runners`/`--runner-index` pair.
    /// Both must be given together, and the index must be below the total.
    pub fn from_args(total_runners: Option<usize>, runner_index: Option<usize>) -> Result<Option<Self>> {
        match (total_runners, runner_index) {
            (Some(total), Some(index)) => {
                if total == 0 {
                    bail!("Total runners must be at least 1.");
                }
                if index >= total {
                    bail!("Runner index must be less than total runners.");
                }
                Ok(Some(Self { total, index }))
            }
            (None, None) => Ok(None),
            _ => bail!("Both --total-runners and --runner-index must be provided."),
        }
    }

    fn owns(&self, position: usize) -> bool {
        position % self.total == self.index
    }
}

/// Represents a complete execution plan for a pipeline.
/// 表示流水线的完整执行计划。
#[derive(Debug)]
pub struct ExecutionPlan {
    /// The ordered steps to execute.
    /// 要执行的有序步骤。
    pub run: PipelineRun,
    /// Names of the configurations taking part, in declaration order.
    /// 参与运行的配置名称，按声明顺序排列。
    pub configurations: Vec<String>,
    /// The number of configurations left to other runners.
    /// 留给其他运行器的配置数量。
    pub other_shards_count: usize,
    /// The shard this runner executes, if the matrix is distributed.
    pub shard: Option<Shard>,
}

/// Expands configurations into the ordered (configuration, action) pairs.
///
/// Expansion is a pure function of its inputs, so the same pipeline always
/// yields the same steps.
///
/// 将配置展开为有序的 (配置, 动作) 对。
pub fn expand(configurations: &[BuildConfiguration], order: StepOrder) -> PipelineRun {
    let pairs: Vec<(BuildConfiguration, Action)> = match order {
        StepOrder::Stage => [Action::Build, Action::Test]
            .into_iter()
            .flat_map(|action| configurations.iter().map(move |c| (c.clone(), action)))
            .collect(),
        StepOrder::Configuration => configurations
            .iter()
            .flat_map(|c| [(c.clone(), Action::Build), (c.clone(), Action::Test)])
            .collect(),
    };
    PipelineRun::new(pairs)
}

/// Creates an execution plan for the given pipeline.
/// Configurations are first narrowed to `only` (when non-empty), then
/// distributed across runners. A configuration is never split between two
/// runners, so its build and test always run on the same machine.
///
/// 为给定的流水线创建执行计划。
/// 配置首先按 `only` 过滤（非空时），然后在运行器之间分配。
/// 一个配置永远不会被拆分到两个运行器上。
pub fn plan_execution(
    pipeline: &PipelineConfig,
    only: &[String],
    shard: Option<Shard>,
) -> Result<ExecutionPlan> {
    for name in only {
        if pipeline.find(name).is_none() {
            bail!("Unknown configuration '{}'.", name);
        }
    }

    let selected: Vec<&BuildConfiguration> = pipeline
        .configurations
        .iter()
        .filter(|c| only.is_empty() || only.contains(&c.name))
        .collect();

    let (owned, others): (Vec<_>, Vec<_>) = selected
        .into_iter()
        .enumerate()
        .partition(|(i, _)| shard.is_none_or(|s| s.owns(*i)));

    let configurations: Vec<BuildConfiguration> =
        owned.into_iter().map(|(_, c)| c.clone()).collect();

    Ok(ExecutionPlan {
        run: expand(&configurations, pipeline.order),
        configurations: configurations.into_iter().map(|c| c.name).collect(),
        other_shards_count: others.len(),
        shard,
    })
}
