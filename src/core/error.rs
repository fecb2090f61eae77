//! # Error Module / 错误模块
//!
//! Classifies everything that can go wrong during a reporting run. Fatal kinds
//! map to a distinct process exit code; non-fatal kinds are only ever logged.
//!
//! 对报告运行中可能出现的所有错误进行分类。致命错误对应不同的进程退出码；
//! 非致命错误只会被记录到日志中。

use thiserror::Error;

use crate::infra::slick::ClientError;

/// Exit code for errors that are not a `ReporterError`.
pub const EXIT_GENERIC_FAILURE: u8 = 1;

/// Exit code clap uses for usage errors. No `ReporterError` kind shares it.
pub const EXIT_USAGE: u8 = 2;

/// The error kinds a reporting run can produce.
/// 报告运行可能产生的错误类型。
#[derive(Debug, Error)]
pub enum ReporterError {
    /// The Slick server could not be reached or answered with an error.
    /// 无法连接 Slick 服务器，或服务器返回了错误。
    #[error("unable to communicate with slick at '{url}': {source}")]
    ServiceUnreachable {
        url: String,
        #[source]
        source: ClientError,
    },

    /// The configured project does not exist. Projects are never created.
    /// 配置的项目不存在。项目永远不会被自动创建。
    #[error("unable to find project with name '{name}' on slick located at '{url}'")]
    ProjectNotFound { name: String, url: String },

    /// Missing or invalid configuration, including invalid regular expressions.
    /// 缺失或无效的配置，包括无效的正则表达式。
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The build discovery command could not run or exited unsuccessfully.
    #[error("build discovery command <<{command}>> failed: {message}")]
    DiscoveryCommand { command: String, message: String },

    /// A templated or captured duration was not an integer.
    #[error("unable to convert runlength '{value}' into an integer: {message}")]
    FieldConversion { value: String, message: String },

    /// A name, status or reason template could not be rendered against a match.
    #[error("unable to classify output line <<{line}>>: {message}")]
    Classification { line: String, message: String },

    #[error("i/o error while {context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
}

impl ReporterError {
    pub fn unreachable(url: impl Into<String>, source: ClientError) -> Self {
        ReporterError::ServiceUnreachable {
            url: url.into(),
            source,
        }
    }

    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        ReporterError::Io {
            context: context.into(),
            source,
        }
    }

    /// Non-fatal kinds are logged and processing continues with a fallback.
    /// 非致命错误会被记录，处理会以回退值继续。
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            ReporterError::DiscoveryCommand { .. } | ReporterError::FieldConversion { .. }
        )
    }

    /// The process exit status for this kind.
    /// 此错误类型对应的进程退出状态。
    pub fn exit_code(&self) -> u8 {
        match self {
            ReporterError::ServiceUnreachable { .. } => 3,
            ReporterError::ProjectNotFound { .. } => 4,
            ReporterError::Configuration(_) => 5,
            ReporterError::Classification { .. } => 6,
            ReporterError::Io { .. } => 7,
            ReporterError::DiscoveryCommand { .. } | ReporterError::FieldConversion { .. } => {
                EXIT_GENERIC_FAILURE
            }
        }
    }
}

/// Chooses the exit code for an error surfaced through `anyhow`.
/// The first `ReporterError` found in the cause chain decides.
pub fn exit_code_for(error: &anyhow::Error) -> u8 {
    error
        .chain()
        .find_map(|cause| cause.downcast_ref::<ReporterError>())
        .map(ReporterError::exit_code)
        .unwrap_or(EXIT_GENERIC_FAILURE)
}

pub type Result<T, E = ReporterError> = std::result::Result<T, E>;
