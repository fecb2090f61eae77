//! # Output Classifier Module / 输出分类模块
//!
//! Turns lines of command output into typed result fields. Each line is
//! matched against the configured pattern (anchored at the start of the
//! line); a match yields a test name, status, reason and runlength, derived
//! from templates or from the `name`, `result`, `reason` and `runlength`
//! groups.
//!
//! 将命令输出的行转换为类型化的结果字段。每一行都与配置的模式匹配（锚定在行首）；
//! 匹配结果产生测试名称、状态、原因和运行时长，
//! 它们来自模板或 `name`、`result`、`reason`、`runlength` 分组。

use regex::{Captures, Regex};
use std::collections::BTreeMap;
use std::time::Instant;

use crate::core::config::TestSection;
use crate::core::error::{ReporterError, Result};
use crate::core::models::BROKEN_TEST;
use crate::core::template::{self, TemplateError};

/// The captures of one matching line.
///
/// Named groups map to `None` when they did not participate in the match,
/// which is distinct from having captured an empty string.
///
/// 一个匹配行的捕获内容。未参与匹配的命名分组映射为 `None`，这与捕获到空字符串不同。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchRecord {
    named: BTreeMap<String, Option<String>>,
    positional: Vec<Option<String>>,
}

impl MatchRecord {
    pub fn from_captures(pattern: &Regex, captures: &Captures<'_>) -> Self {
        let named = pattern
            .capture_names()
            .flatten()
            .map(|name| {
                let value = captures.name(name).map(|m| m.as_str().to_string());
                (name.to_string(), value)
            })
            .collect();
        let positional = captures
            .iter()
            .skip(1)
            .map(|group| group.map(|m| m.as_str().to_string()))
            .collect();
        Self { named, positional }
    }

    /// Builds a record directly, mostly useful for tests.
    pub fn new(named: BTreeMap<String, Option<String>>, positional: Vec<Option<String>>) -> Self {
        Self { named, positional }
    }

    /// `None` if the pattern has no such group, `Some(None)` if the group
    /// did not participate in the match.
    pub fn named(&self, name: &str) -> Option<Option<&str>> {
        self.named.get(name).map(|value| value.as_deref())
    }

    /// Group by position, counting the first capture group as 0.
    pub fn positional(&self, index: usize) -> Option<Option<&str>> {
        self.positional.get(index).map(|value| value.as_deref())
    }

    pub fn group_count(&self) -> usize {
        self.positional.len()
    }

    pub fn has_group(&self, name: &str) -> bool {
        self.named.contains_key(name)
    }

    /// The captured text of a named group, if it participated.
    pub fn captured(&self, name: &str) -> Option<&str> {
        self.named(name).flatten()
    }
}

/// Where a result's runlength came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunlengthSource {
    Template,
    Group,
    Elapsed,
}

/// The fields derived from one matching line.
/// 从一个匹配行派生出的字段。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub name: String,
    pub status: String,
    pub reason: String,
    /// Milliseconds / 毫秒
    pub runlength: i64,
    pub runlength_source: RunlengthSource,
}

/// Classifies lines of output from the command under test.
///
/// The only state kept between lines is the start of the current segment,
/// used as the elapsed-time fallback for the runlength.
///
/// 对被测命令的输出行进行分类。行与行之间唯一保留的状态是当前片段的起始时间，
/// 用作运行时长的耗时回退值。
#[derive(Debug, Clone)]
pub struct OutputClassifier {
    command: String,
    pattern: Regex,
    name_template: Option<String>,
    status_template: Option<String>,
    reason_template: Option<String>,
    runlength_template: Option<String>,
    segment_start: Instant,
}

impl OutputClassifier {
    /// Validates the `[test]` table and compiles the output pattern.
    ///
    /// All missing required keys are reported together. An invalid pattern is
    /// a configuration error as well.
    ///
    /// 验证 `[test]` 表并编译输出模式。所有缺失的必需键会被一起报告。
    pub fn from_config(test: &TestSection) -> Result<Self> {
        let missing: Vec<&str> = [("command", &test.command), ("output_regex", &test.output_regex)]
            .into_iter()
            .filter(|(_, value)| value.as_deref().is_none_or(str::is_empty))
            .map(|(key, _)| key)
            .collect();
        if !missing.is_empty() {
            for key in &missing {
                tracing::error!("Missing configuration in [test] section: {}", key);
            }
            return Err(ReporterError::Configuration(format!(
                "missing required [test] keys: {}",
                missing.join(", ")
            )));
        }
        let command = test.command.clone().unwrap_or_default();
        let output_regex = test.output_regex.as_deref().unwrap_or_default();

        tracing::debug!("Compiling regular expression <<{}>>.", output_regex);
        let pattern = compile_anchored(output_regex)?;
        tracing::debug!("Regular expression <<{}>> compiled successfully.", output_regex);

        Ok(Self {
            command,
            pattern,
            name_template: test.name.clone(),
            status_template: test.status.clone(),
            reason_template: test.reason.clone(),
            runlength_template: test.runlength.clone(),
            segment_start: Instant::now(),
        })
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    /// Restarts the elapsed-time baseline, e.g. when the command is spawned.
    pub fn start_clock(&mut self, now: Instant) {
        self.segment_start = now;
    }

    /// Matches a line against the pattern without deriving any fields.
    pub fn match_line(&self, line: &str) -> Option<MatchRecord> {
        self.pattern
            .captures(line)
            .map(|captures| MatchRecord::from_captures(&self.pattern, &captures))
    }

    /// Classifies one line of output observed at `now`.
    ///
    /// Returns `Ok(None)` for lines that do not match; nothing changes in that
    /// case. On a match the elapsed-time baseline is reset to `now`, whichever
    /// runlength source ends up being used.
    ///
    /// # Errors
    /// A name, status or reason template that cannot be rendered is a
    /// `Classification` error. Runlength problems, including negative values,
    /// are logged and fall back to elapsed time.
    ///
    /// 对在 `now` 时刻观察到的一行输出进行分类。不匹配的行返回 `Ok(None)`，且不会改变任何状态。
    pub fn classify(&mut self, line: &str, now: Instant) -> Result<Option<Classification>> {
        let Some(record) = self.match_line(line) else {
            return Ok(None);
        };
        tracing::debug!("Matched output, groups={:?}", record);

        let elapsed = now.saturating_duration_since(self.segment_start).as_millis() as i64;
        self.segment_start = now;

        let fail = |e: TemplateError| ReporterError::Classification {
            line: line.to_string(),
            message: e.to_string(),
        };

        let status = match &self.status_template {
            Some(template) => template::render(template, &record).map_err(fail)?,
            None => record.captured("result").unwrap_or(BROKEN_TEST).to_string(),
        };

        let reason = match &self.reason_template {
            Some(template) => template::render(template, &record).map_err(fail)?,
            None if record.has_group("reason") => match record.captured("reason") {
                Some(reason) if !reason.is_empty() => reason.to_string(),
                _ => format!("Output Indicated {status}"),
            },
            None => String::new(),
        };

        let name = match &self.name_template {
            Some(template) => template::render(template, &record).map_err(fail)?,
            None => match record.captured("name") {
                Some(name) => name.to_string(),
                None => format!("Command {}", self.command),
            },
        };

        let (runlength, runlength_source) = self.runlength(&record, elapsed);

        Ok(Some(Classification {
            name,
            status,
            reason,
            runlength,
            runlength_source,
        }))
    }

    fn runlength(&self, record: &MatchRecord, elapsed: i64) -> (i64, RunlengthSource) {
        let (value, source) = match &self.runlength_template {
            Some(template) => match template::render(template, record) {
                Ok(value) => (value, RunlengthSource::Template),
                Err(e) => {
                    let err = ReporterError::FieldConversion {
                        value: template.clone(),
                        message: e.to_string(),
                    };
                    tracing::warn!("Error converting runlength from config into integer: {}", err);
                    return (elapsed, RunlengthSource::Elapsed);
                }
            },
            None => match record.captured("runlength") {
                Some(value) => (value.to_string(), RunlengthSource::Group),
                None => return (elapsed, RunlengthSource::Elapsed),
            },
        };

        let parsed = value.trim().parse::<i64>().map_err(|e| e.to_string()).and_then(|runlength| {
            if runlength < 0 {
                Err("runlength cannot be negative".to_string())
            } else {
                Ok(runlength)
            }
        });
        match parsed {
            Ok(runlength) => (runlength, source),
            Err(message) => {
                let err = ReporterError::FieldConversion { value, message };
                tracing::warn!("Error converting runlength into integer: {}", err);
                (elapsed, RunlengthSource::Elapsed)
            }
        }
    }
}

/// Compiles `pattern` so that it only matches at the start of a line.
fn compile_anchored(pattern: &str) -> Result<Regex> {
    Regex::new(&format!(r"\A(?:{pattern})")).map_err(|e| {
        ReporterError::Configuration(format!("regular expression <<{pattern}>> is not valid: {e}"))
    })
}
