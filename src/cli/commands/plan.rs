//! # Plan Command Module / 计划命令模块
//!
//! Prints the expanded pipeline with the exact command of each step,
//! without running anything.
//!
//! 打印展开后的流水线以及每个步骤的具体命令，不执行任何操作。

use anyhow::Result;

use crate::cli::commands::{self, Selection, SourceArgs};
use crate::core::execution::CargoExecutor;
use crate::infra::t;
use crate::reporting::console::print_plan;

/// Executes the plan command.
pub fn execute(source: SourceArgs, selection: Selection, lang: Option<String>) -> Result<()> {
    let early_locale = crate::resolve_locale(lang.as_deref());
    let loaded = commands::load_pipeline(&source, &early_locale)?;
    let language = crate::init_locale(lang.as_deref().or(loaded.pipeline.language.as_deref()));
    let locale = language.as_str();

    commands::print_pipeline_source(&loaded, locale);

    let plan = selection.plan(&loaded.pipeline)?;
    let executor = CargoExecutor::from_pipeline(&loaded.pipeline, loaded.project_root.clone());
    print_plan(&plan.run, &executor, locale);

    if let Some(shard) = plan.shard {
        println!(
            "\n{}",
            t!(
                "plan.shard_note",
                locale = locale,
                index = shard.index + 1,
                total = shard.total,
                others = plan.other_shards_count
            )
        );
    }
    Ok(())
}
