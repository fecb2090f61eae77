//! # Slick Reporter Library / Slick Reporter 库
//!
//! This library provides the core functionality for the Slick Reporter tool,
//! which runs a command, classifies its output line by line with a regular
//! expression, and files the matches as results on a Slick server.
//!
//! 此库为 Slick Reporter 工具提供核心功能：
//! 运行一个命令，用正则表达式逐行分类其输出，并将匹配结果提交到 Slick 服务器。
//!
//! ## Modules / 模块
//!
//! - `core` - Data models, context resolution, output classification and result filing
//! - `infra` - Infrastructure services like process execution, the Slick client and logging
//! - `reporting` - Console summary of filed results
//! - `cli` - Command-line interface and commands
//!
//! - `core` - 数据模型、上下文解析、输出分类和结果提交
//! - `infra` - 基础设施服务，如进程执行、Slick 客户端和日志
//! - `reporting` - 已提交结果的控制台摘要
//! - `cli` - 命令行接口和命令

pub mod core;
pub mod infra;
pub mod reporting;
pub mod cli;

// Re-export commonly used items
pub use core::models;
pub use core::config;
pub use core::error::{ReporterError, exit_code_for};

/// Picks the best available locale for a requested one.
/// 为请求的语言选择最合适的可用语言。
pub fn resolve_locale(requested: &str) -> &str {
    let available_locales = rust_i18n::available_locales!();

    // Full locale first ("zh-CN"), then the language part ("en" from "en-US").
    if available_locales.contains(&requested) {
        requested
    } else {
        requested
            .split('-')
            .next()
            .filter(|lang_code| available_locales.contains(lang_code))
            .unwrap_or("en")
    }
}

// Initialize i18n
rust_i18n::i18n!("locales", fallback = "en");
