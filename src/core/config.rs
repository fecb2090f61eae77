//! # Configuration Module / 配置模块
//!
//! Loads and saves the reporter configuration, a TOML file with `[slick]`,
//! `[test]` and `[logging]` tables, and applies command-line overrides.
//!
//! 加载并保存报告器配置（包含 `[slick]`、`[test]` 和 `[logging]` 表的 TOML 文件），
//! 并应用命令行覆盖参数。

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::core::error::{ReporterError, Result};
use crate::infra::slick::DEFAULT_SLICK_URL;

pub const DEFAULT_CONFIG_FILE: &str = "slick-reporter.toml";

/// The `[slick]` table: where to report and under which hierarchy.
/// `[slick]` 表：报告到哪里以及在哪个层级之下。
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SlickSection {
    /// Base URL of the Slick server / Slick 服务器的基础 URL
    #[serde(default = "default_url")]
    pub url: String,
    /// Name of an existing project / 已存在项目的名称
    pub project: String,
    /// Release name, created when missing / 发布名称，缺失时自动创建
    pub release: String,
    /// Explicit build identifier / 显式的构建标识
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub build: Option<String>,
    /// Command whose output contains the build identifier / 输出中包含构建标识的命令
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub build_command: Option<String>,
    /// Pattern with a `build` group applied to `build_command` output
    /// 应用于 `build_command` 输出、带有 `build` 分组的正则表达式
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub build_regex: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub component: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub testplan: Option<String>,
}

/// The `[test]` table: the command to run and how to read its output.
///
/// `command` and `output_regex` are required when running; they are optional
/// here so that every missing key can be reported at once.
///
/// `[test]` 表：要运行的命令以及如何读取其输出。
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct TestSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_regex: Option<String>,
    /// Template for the test case name / 测试用例名称模板
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Template for the result status / 结果状态模板
    #[serde(default, alias = "result", skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    /// Template for the result reason / 结果原因模板
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Template for the run length in milliseconds / 运行时长（毫秒）模板
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runlength: Option<String>,
}

/// The `[logging]` table.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct LoggingSection {
    #[serde(default = "default_level")]
    pub level: String,
    /// Also log to the console (stderr) / 同时输出日志到控制台（stderr）
    #[serde(default = "default_true")]
    pub stdout: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logfile: Option<String>,
    /// strftime format for timestamps / 时间戳的 strftime 格式
    #[serde(default = "default_dateformat")]
    pub dateformat: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: default_level(),
            stdout: true,
            logfile: None,
            dateformat: default_dateformat(),
        }
    }
}

/// The whole configuration file.
/// 整个配置文件。
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ReporterConfig {
    pub slick: SlickSection,
    #[serde(default)]
    pub test: TestSection,
    #[serde(default)]
    pub logging: LoggingSection,
}

impl ReporterConfig {
    /// A starting configuration written by `init` when nothing else is known.
    pub fn sample() -> Self {
        Self {
            slick: SlickSection {
                url: default_url(),
                project: "My Project".to_string(),
                release: "1.0".to_string(),
                build: None,
                build_command: Some("echo 1.0.0-1".to_string()),
                build_regex: Some(r".*-(?P<build>\d+)".to_string()),
                component: None,
                testplan: None,
            },
            test: TestSection {
                command: Some("cat test-output.txt".to_string()),
                output_regex: Some(
                    r"\[(?P<result>.*?)\](?:\[(?P<reason>.*?)\])? \| (?P<name>.*?) \| ElapsedMS: (?P<runlength>\d+)"
                        .to_string(),
                ),
                ..TestSection::default()
            },
            logging: LoggingSection::default(),
        }
    }

    /// Applies command-line overrides on top of the file contents.
    /// 在文件内容之上应用命令行覆盖参数。
    pub fn apply_overrides(&mut self, overrides: &Overrides) {
        if let Some(url) = overrides.slick_url.as_deref().filter(|u| !u.is_empty()) {
            self.slick.url = url.to_string();
        }
        if let Some(level) = overrides.log_level.as_deref().filter(|l| !l.is_empty()) {
            self.logging.level = level.to_string();
        }
        if let Some(logfile) = overrides.logfile.as_deref().filter(|l| !l.is_empty()) {
            self.logging.logfile = Some(logfile.to_string());
        }
        if overrides.no_logfile {
            self.logging.logfile = None;
        }
        if overrides.quiet {
            self.logging.stdout = false;
        }
    }
}

/// Values given on the command line that take precedence over the file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub slick_url: Option<String>,
    pub log_level: Option<String>,
    pub logfile: Option<String>,
    pub no_logfile: bool,
    pub quiet: bool,
}

fn default_url() -> String {
    DEFAULT_SLICK_URL.to_string()
}

fn default_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

fn default_dateformat() -> String {
    "%x %I:%M:%S %p".to_string()
}

/// Expands `~` and environment variables in a configuration path.
pub fn expand_path(path: &Path) -> Result<PathBuf> {
    let raw = path.to_string_lossy();
    shellexpand::full(&raw)
        .map(|expanded| PathBuf::from(expanded.as_ref()))
        .map_err(|e| ReporterError::Configuration(format!("unable to expand path '{raw}': {e}")))
}

/// Parses configuration text.
pub fn parse_config(content: &str) -> Result<ReporterConfig> {
    toml::from_str(content)
        .map_err(|e| ReporterError::Configuration(format!("invalid configuration: {e}")))
}

/// Loads the configuration from a TOML file.
///
/// # Arguments
/// * `path` - Path to the configuration file; `~` and `$VARS` are expanded
///
/// # Returns
/// The parsed `ReporterConfig`, or a configuration error if the file is
/// missing, unreadable or not valid.
pub fn load_config(path: &Path) -> Result<ReporterConfig> {
    let path = expand_path(path)?;
    let content = fs::read_to_string(&path).map_err(|e| {
        ReporterError::Configuration(format!(
            "unable to read configuration file '{}': {e}",
            path.display()
        ))
    })?;
    parse_config(&content)
}

/// Writes the configuration to a TOML file, creating parent directories.
pub fn save_config(path: &Path, config: &ReporterConfig) -> Result<()> {
    let path = expand_path(path)?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .map_err(|e| ReporterError::io(format!("creating {}", parent.display()), e))?;
    }
    let content = toml::to_string_pretty(config)
        .map_err(|e| ReporterError::Configuration(format!("unable to serialize configuration: {e}")))?;
    fs::write(&path, content).map_err(|e| ReporterError::io(format!("writing {}", path.display()), e))
}
