//! # Logging Module / 日志模块
//!
//! Builds the `tracing` subscriber from the `[logging]` configuration and
//! installs it as the default for the current thread. Nothing is installed
//! globally; logging lasts as long as the returned `LoggingGuard`.
//!
//! 根据 `[logging]` 配置构建 `tracing` subscriber，并将其安装为当前线程的默认值。
//! 不会进行全局安装；日志的生命周期与返回的 `LoggingGuard` 相同。

use std::path::Path;
use tracing::subscriber::DefaultGuard;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt::time::ChronoLocal;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt};

use crate::core::config::LoggingSection;

/// Keeps the subscriber installed and flushes the log file on drop.
/// 保持 subscriber 安装状态，并在丢弃时刷新日志文件。
#[must_use = "logging stops when the guard is dropped"]
pub struct LoggingGuard {
    _default: DefaultGuard,
    _file_writer: Option<WorkerGuard>,
}

impl LoggingGuard {
    /// Installs logging as described by `section`.
    ///
    /// Output goes to stderr when `stdout` is set and to `logfile` when one is
    /// configured. A log file that cannot be opened falls back to stderr with a
    /// warning. With no sink enabled, stderr is used.
    pub fn init(section: &LoggingSection) -> Self {
        let filter = EnvFilter::try_new(&section.level).unwrap_or_else(|_| EnvFilter::new("info"));

        let mut file_error = None;
        let (file_layer, file_writer) = match section.logfile.as_deref().filter(|f| !f.is_empty()) {
            Some(logfile) => match open_log_file(Path::new(logfile)) {
                Ok(appender) => {
                    let (writer, guard) = tracing_appender::non_blocking(appender);
                    let layer = fmt::layer()
                        .with_ansi(false)
                        .with_timer(ChronoLocal::new(section.dateformat.clone()))
                        .with_writer(writer);
                    (Some(layer), Some(guard))
                }
                Err(e) => {
                    file_error = Some((logfile.to_string(), e));
                    (None, None)
                }
            },
            None => (None, None),
        };

        let console = section.stdout || file_layer.is_none();
        let console_layer = console.then(|| {
            fmt::layer()
                .with_timer(ChronoLocal::new(section.dateformat.clone()))
                .with_writer(std::io::stderr)
        });

        let subscriber = tracing_subscriber::registry()
            .with(filter)
            .with(console_layer)
            .with(file_layer);
        let default = tracing::subscriber::set_default(subscriber);

        if let Some((logfile, e)) = file_error {
            tracing::warn!("Unable to write to log file {}: {}", logfile, e);
        }

        Self {
            _default: default,
            _file_writer: file_writer,
        }
    }
}

fn open_log_file(path: &Path) -> Result<RollingFileAppender, tracing_appender::rolling::InitError> {
    let directory = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "slick-reporter.log".to_string());
    RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(file_name)
        .build(directory)
}
