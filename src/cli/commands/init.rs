//! # Init Command Module / 初始化命令模块
//!
//! This module implements the `init` command for the Slick Reporter CLI,
//! which writes a configuration file, either from the current settings or
//! through an interactive wizard.
//!
//! 此模块实现了 Slick Reporter CLI 的 `init` 命令，
//! 它根据当前设置或通过交互式向导写入配置文件。

use anyhow::{Context, Result};
use colored::*;
use dialoguer::{Confirm, Input, theme::ColorfulTheme};
use std::path::Path;

use crate::core::config::{self, Overrides, ReporterConfig};
use crate::infra::t;

/// Writes a configuration file to `config_path`.
///
/// The starting point is the existing file when it can be read, the sample
/// configuration otherwise; command-line overrides are applied on top.
///
/// 将配置文件写入 `config_path`。起点是可读取的现有文件，否则为示例配置；
/// 命令行覆盖参数会应用在其之上。
pub fn run_init_wizard(
    config_path: &Path,
    overrides: &Overrides,
    language: &str,
    non_interactive: bool,
    force: bool,
) -> Result<()> {
    let theme = ColorfulTheme::default();
    let exists = config::expand_path(config_path)?.exists();
    let path_display = config_path.display().to_string();

    if exists && !force {
        if non_interactive {
            println!("{}", t!("init.file_exists", locale = language, path = &path_display).red());
            println!("{}", t!("init.use_force", locale = language).yellow());
            return Ok(());
        }
        let confirmation = Confirm::with_theme(&theme)
            .with_prompt(t!("init.overwrite_prompt", locale = language, path = &path_display))
            .default(false)
            .interact()
            .context(t!("init.input_failed", locale = language).to_string())?;
        if !confirmation {
            println!("{}", t!("init.aborted", locale = language));
            return Ok(());
        }
    }

    let mut reporter_config = config::load_config(config_path).unwrap_or_else(|_| ReporterConfig::sample());
    reporter_config.apply_overrides(overrides);

    if !non_interactive {
        println!("\n{}", t!("init.welcome", locale = language).cyan().bold());
        println!("{}", t!("init.description", locale = language));
        ask_questions(&theme, &mut reporter_config, language)?;
    }

    config::save_config(config_path, &reporter_config)
        .with_context(|| t!("init.write_failed", locale = language, path = &path_display).to_string())?;
    println!("{}", t!("init.success", locale = language, path = &path_display).green());
    Ok(())
}

fn ask_questions(theme: &ColorfulTheme, config: &mut ReporterConfig, language: &str) -> Result<()> {
    let slick = &mut config.slick;
    slick.url = ask(theme, t!("init.prompt_url", locale = language), Some(&slick.url), language)?;
    slick.project = ask(theme, t!("init.prompt_project", locale = language), Some(&slick.project), language)?;
    slick.release = ask(theme, t!("init.prompt_release", locale = language), Some(&slick.release), language)?;
    slick.component = ask_optional(theme, t!("init.prompt_component", locale = language), &slick.component, language)?;
    slick.testplan = ask_optional(theme, t!("init.prompt_testplan", locale = language), &slick.testplan, language)?;
    slick.build = ask_optional(theme, t!("init.prompt_build", locale = language), &slick.build, language)?;
    if slick.build.is_none() {
        slick.build_command = Some(ask(
            theme,
            t!("init.prompt_build_command", locale = language),
            slick.build_command.as_ref(),
            language,
        )?);
        slick.build_regex = Some(ask(
            theme,
            t!("init.prompt_build_regex", locale = language),
            slick.build_regex.as_ref(),
            language,
        )?);
    }

    let test = &mut config.test;
    test.command = Some(ask(theme, t!("init.prompt_command", locale = language), test.command.as_ref(), language)?);
    test.output_regex = Some(ask(
        theme,
        t!("init.prompt_output_regex", locale = language),
        test.output_regex.as_ref(),
        language,
    )?);
    test.name = ask_optional(theme, t!("init.prompt_name", locale = language), &test.name, language)?;
    Ok(())
}

fn ask(
    theme: &ColorfulTheme,
    prompt: impl Into<String>,
    default: Option<&String>,
    language: &str,
) -> Result<String> {
    let mut input = Input::<String>::with_theme(theme).with_prompt(prompt);
    if let Some(default) = default {
        input = input.default(default.clone());
    }
    input
        .interact_text()
        .context(t!("init.input_failed", locale = language).to_string())
}

fn ask_optional(
    theme: &ColorfulTheme,
    prompt: impl Into<String>,
    current: &Option<String>,
    language: &str,
) -> Result<Option<String>> {
    let mut input = Input::<String>::with_theme(theme)
        .with_prompt(prompt)
        .allow_empty(true);
    if let Some(current) = current {
        input = input.default(current.clone());
    }
    let answer = input
        .interact_text()
        .context(t!("init.input_failed", locale = language).to_string())?;
    let answer = answer.trim();
    Ok((!answer.is_empty()).then(|| answer.to_string()))
}
