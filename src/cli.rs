//! # Command-Line Interface Module / 命令行接口模块
//!
//! Builds the `clap` command tree with translated help text and dispatches
//! to the `run` and `init` subcommands.
//!
//! 使用翻译后的帮助文本构建 `clap` 命令树，并分发到 `run` 和 `init` 子命令。

use anyhow::Result;
use clap::{Arg, ArgAction, ArgMatches, Command};
use colored::*;
use std::{env, path::PathBuf};

use crate::core::config::{DEFAULT_CONFIG_FILE, Overrides};
use crate::infra::t;

pub mod commands;

/// Pre-parses the command line arguments to find the language setting.
/// This allows i18n to be initialized before the full CLI is built.
/// It looks for a `--lang <VALUE>` argument.
fn pre_parse_language() -> String {
    let args: Vec<String> = env::args().collect();
    if let Some(pos) = args.iter().position(|arg| arg == "--lang") {
        if let Some(lang) = args.get(pos + 1) {
            return lang.clone();
        }
    }
    // Fallback to system language detection
    sys_locale::get_locale().unwrap_or_else(|| "en".to_string())
}

pub fn build_cli(locale: &str) -> Command {
    Command::new("slick-reporter")
        .author(env!("CARGO_PKG_AUTHORS"))
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
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .help(t!("arg_config", locale = locale).to_string())
                .value_name("CONFIGPATH")
                .default_value(DEFAULT_CONFIG_FILE)
                .value_parser(clap::value_parser!(PathBuf))
                .global(true)
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new("nologfile")
                .short('n')
                .long("nologfile")
                .help(t!("arg_nologfile", locale = locale).to_string())
                .global(true)
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("logfile")
                .long("logfile")
                .help(t!("arg_logfile", locale = locale).to_string())
                .value_name("LOGFILE")
                .global(true)
                .conflicts_with("nologfile")
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new("loglevel")
                .long("loglevel")
                .help(t!("arg_loglevel", locale = locale).to_string())
                .value_name("LEVEL")
                .global(true)
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new("quiet")
                .short('q')
                .long("quiet")
                .help(t!("arg_quiet", locale = locale).to_string())
                .global(true)
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("slick")
                .long("slick")
                .help(t!("arg_slick", locale = locale).to_string())
                .value_name("SLICKBASEURL")
                .global(true)
                .action(ArgAction::Set),
        )
        .subcommand(Command::new("run").about(t!("cmd_run_about", locale = locale).to_string()))
        .subcommand(
            Command::new("init")
                .about(t!("cmd_init_about", locale = locale).to_string())
                .arg(
                    Arg::new("non-interactive")
                        .long("non-interactive")
                        .help(t!("arg_non_interactive", locale = locale).to_string())
                        .action(ArgAction::SetTrue),
                )
                .arg(
                    Arg::new("force")
                        .long("force")
                        .help(t!("arg_force", locale = locale).to_string())
                        .action(ArgAction::SetTrue),
                ),
        )
}

/// Collects the overrides shared by every subcommand.
pub fn overrides_from(matches: &ArgMatches) -> Overrides {
    Overrides {
        slick_url: matches.get_one::<String>("slick").cloned(),
        log_level: matches.get_one::<String>("loglevel").cloned(),
        logfile: matches.get_one::<String>("logfile").cloned(),
        no_logfile: matches.get_flag("nologfile"),
        quiet: matches.get_flag("quiet"),
    }
}

pub async fn run() -> Result<()> {
    // Pre-parse language and initialize i18n first.
    let requested = pre_parse_language();
    let language = crate::resolve_locale(&requested).to_string();
    rust_i18n::set_locale(&language);

    let matches = build_cli(&language).get_matches();

    match matches.subcommand() {
        Some(("run", run_matches)) => {
            let config = run_matches
                .get_one::<PathBuf>("config")
                .cloned()
                .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
            commands::run::execute(config, overrides_from(run_matches), &language).await?;
        }
        Some(("init", init_matches)) => {
            let config = init_matches
                .get_one::<PathBuf>("config")
                .cloned()
                .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
            commands::init::run_init_wizard(
                &config,
                &overrides_from(init_matches),
                &language,
                init_matches.get_flag("non-interactive"),
                init_matches.get_flag("force"),
            )?;
        }
        _ => {
            // subcommand_required: clap has already printed help.
        }
    }
    Ok(())
}

/// Prints a fatal error in the user's language.
/// 以用户的语言打印致命错误。
pub fn report_error(error: &anyhow::Error) {
    let locale = rust_i18n::locale();
    eprintln!(
        "{}",
        t!("run.fatal", locale = &*locale, error = format!("{error:#}")).red()
    );
}
