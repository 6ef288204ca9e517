//! # Command-Line Interface / 命令行接口
//!
//! Builds the `ci-matrix` command tree with localized help texts and
//! dispatches to the subcommands in `commands`.
//!
//! 构建带有本地化帮助文本的 `ci-matrix` 命令树，并分派到 `commands` 中的子命令。

pub mod commands;

use anyhow::Result;
use clap::{Arg, ArgAction, ArgMatches, Command};
use std::ffi::OsString;
use std::path::PathBuf;

use crate::config::DEFAULT_CONFIG_FILE;
use crate::infra::t;
use crate::reporting::workflow::DEFAULT_WORKFLOW_NAME;

/// Pre-parses the command line arguments to find the language setting.
/// This allows i18n to be initialized before the full CLI is built.
/// It looks for `--lang <VALUE>` or `--lang=<VALUE>`.
fn pre_parse_language(args: &[OsString]) -> Option<String> {
    let args: Vec<String> = args.iter().map(|a| a.to_string_lossy().into_owned()).collect();
    if let Some(pos) = args.iter().position(|arg| arg == "--lang") {
        return args.get(pos + 1).cloned();
    }
    args.iter()
        .find_map(|arg| arg.strip_prefix("--lang=").map(str::to_string))
}

fn config_arg(locale: &str) -> Arg {
    Arg::new("config")
        .short('c')
        .long("config")
        .help(t!("arg_config", locale = locale, file = DEFAULT_CONFIG_FILE).to_string())
        .value_name("CONFIG")
        .value_parser(clap::value_parser!(PathBuf))
        .action(ArgAction::Set)
}

fn project_dir_arg(locale: &str) -> Arg {
    Arg::new("project-dir")
        .long("project-dir")
        .help(t!("arg_project_dir", locale = locale).to_string())
        .value_name("PROJECT_DIR")
        .default_value(".")
        .value_parser(clap::value_parser!(PathBuf))
        .action(ArgAction::Set)
}

fn selection_args(locale: &str) -> [Arg; 3] {
    [
        Arg::new("only")
            .long("only")
            .help(t!("arg_only", locale = locale).to_string())
            .value_name("NAME")
            .value_delimiter(',')
            .action(ArgAction::Append),
        Arg::new("total-runners")
            .long("total-runners")
            .help(t!("arg_total_runners", locale = locale).to_string())
            .value_name("TOTAL_RUNNERS")
            .value_parser(clap::value_parser!(usize))
            .action(ArgAction::Set)
            .requires("runner-index"),
        Arg::new("runner-index")
            .long("runner-index")
            .help(t!("arg_runner_index", locale = locale).to_string())
            .value_name("RUNNER_INDEX")
            .value_parser(clap::value_parser!(usize))
            .action(ArgAction::Set)
            .requires("total-runners"),
    ]
}

fn build_cli(locale: &str) -> Command {
    Command::new("ci-matrix")
        .version(env!("CARGO_PKG_VERSION"))
        .about(t!("cli_about", locale = locale).to_string())
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("lang")
                .long("lang")
                .help(t!("cli_lang", locale = locale).to_string())
                .value_name("LANGUAGE")
                .global(true)
                .action(ArgAction::Set),
        )
        .subcommand(
            Command::new("run")
                .about(t!("cmd_run_about", locale = locale).to_string())
                .arg(config_arg(locale))
                .arg(project_dir_arg(locale))
                .args(selection_args(locale))
                .arg(
                    Arg::new("keep-going")
                        .long("keep-going")
                        .help(t!("arg_keep_going", locale = locale).to_string())
                        .action(ArgAction::SetTrue),
                )
                .arg(
                    Arg::new("event")
                        .long("event")
                        .help(t!("arg_event", locale = locale).to_string())
                        .value_name("EVENT")
                        .value_parser(["push", "pull_request", "manual"])
                        .action(ArgAction::Set),
                )
                .arg(
                    Arg::new("branch")
                        .long("branch")
                        .help(t!("arg_branch", locale = locale).to_string())
                        .value_name("BRANCH")
                        .action(ArgAction::Set),
                )
                .arg(
                    Arg::new("html")
                        .long("html")
                        .help(t!("arg_html", locale = locale).to_string())
                        .value_name("HTML")
                        .value_parser(clap::value_parser!(PathBuf))
                        .action(ArgAction::Set),
                )
                .arg(
                    Arg::new("json")
                        .long("json")
                        .help(t!("arg_json", locale = locale).to_string())
                        .value_name("JSON")
                        .value_parser(clap::value_parser!(PathBuf))
                        .action(ArgAction::Set),
                )
                .arg(
                    Arg::new("quiet")
                        .short('q')
                        .long("quiet")
                        .help(t!("arg_quiet", locale = locale).to_string())
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(
            Command::new("plan")
                .about(t!("cmd_plan_about", locale = locale).to_string())
                .arg(config_arg(locale))
                .arg(project_dir_arg(locale))
                .args(selection_args(locale)),
        )
        .subcommand(
            Command::new("init")
                .about(t!("cmd_init_about", locale = locale).to_string())
                .arg(
                    Arg::new("output")
                        .short('o')
                        .long("output")
                        .help(t!("arg_init_output", locale = locale).to_string())
                        .value_name("OUTPUT")
                        .default_value(DEFAULT_CONFIG_FILE)
                        .value_parser(clap::value_parser!(PathBuf))
                        .action(ArgAction::Set),
                )
                .arg(
                    Arg::new("force")
                        .long("force")
                        .help(t!("arg_force", locale = locale).to_string())
                        .action(ArgAction::SetTrue),
                )
                .arg(
                    Arg::new("non-interactive")
                        .long("non-interactive")
                        .help(t!("arg_non_interactive", locale = locale).to_string())
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(
            Command::new("workflow")
                .about(t!("cmd_workflow_about", locale = locale).to_string())
                .arg(config_arg(locale))
                .arg(project_dir_arg(locale))
                .arg(
                    Arg::new("output")
                        .short('o')
                        .long("output")
                        .help(t!("arg_workflow_output", locale = locale).to_string())
                        .value_name("OUTPUT")
                        .value_parser(clap::value_parser!(PathBuf))
                        .action(ArgAction::Set),
                )
                .arg(
                    Arg::new("name")
                        .long("name")
                        .help(t!("arg_workflow_name", locale = locale).to_string())
                        .value_name("NAME")
                        .default_value(DEFAULT_WORKFLOW_NAME)
                        .action(ArgAction::Set),
                ),
        )
}

fn source_args(matches: &ArgMatches) -> commands::SourceArgs {
    commands::SourceArgs {
        config: matches.get_one::<PathBuf>("config").cloned(),
        project_dir: matches
            .get_one::<PathBuf>("project-dir")
            .cloned()
            .unwrap_or_else(|| PathBuf::from(".")),
    }
}

fn selection(matches: &ArgMatches) -> commands::Selection {
    commands::Selection {
        only: matches
            .get_many::<String>("only")
            .map(|names| names.cloned().collect())
            .unwrap_or_default(),
        total_runners: matches.get_one::<usize>("total-runners").copied(),
        runner_index: matches.get_one::<usize>("runner-index").copied(),
    }
}

/// Parses the process arguments and runs the selected subcommand.
pub async fn run() -> Result<()> {
    run_from(std::env::args_os()).await
}

/// Parses `args` (including the program name) and runs the selected subcommand.
pub async fn run_from<I, T>(args: I) -> Result<()>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    let args: Vec<OsString> = args.into_iter().map(Into::into).collect();

    // Pre-parse language and initialize i18n first.
    let requested_lang = pre_parse_language(&args);
    let language = crate::init_locale(requested_lang.as_deref());

    let matches = build_cli(&language).get_matches_from(args);

    match matches.subcommand() {
        Some(("run", run_matches)) => {
            commands::run::execute(commands::run::RunArgs {
                source: source_args(run_matches),
                selection: selection(run_matches),
                keep_going: run_matches.get_flag("keep-going"),
                event: run_matches.get_one::<String>("event").cloned(),
                branch: run_matches.get_one::<String>("branch").cloned(),
                html: run_matches.get_one::<PathBuf>("html").cloned(),
                json: run_matches.get_one::<PathBuf>("json").cloned(),
                quiet: run_matches.get_flag("quiet"),
                lang: requested_lang,
            })
            .await?;
        }
        Some(("plan", plan_matches)) => {
            commands::plan::execute(
                source_args(plan_matches),
                selection(plan_matches),
                requested_lang,
            )?;
        }
        Some(("init", init_matches)) => {
            let output = init_matches
                .get_one::<PathBuf>("output")
                .cloned()
                .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
            commands::init::execute(
                &output,
                init_matches.get_flag("force"),
                init_matches.get_flag("non-interactive"),
                &language,
            )?;
        }
        Some(("workflow", workflow_matches)) => {
            let name = workflow_matches
                .get_one::<String>("name")
                .map(String::as_str)
                .unwrap_or(DEFAULT_WORKFLOW_NAME);
            commands::workflow::execute(
                source_args(workflow_matches),
                workflow_matches.get_one::<PathBuf>("output").cloned(),
                name,
                &language,
            )?;
        }
        _ => {
            // Clap requires a subcommand, so it has already printed help info.
        }
    }
    Ok(())
}
