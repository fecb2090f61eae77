//! # Infrastructure Module / 基础设施模块
//!
//! This module provides infrastructure services for Slick Reporter,
//! including shell command execution, the Slick REST client, logging
//! and i18n support.
//!
//! 此模块为 Slick Reporter 提供基础设施服务，
//! 包括 shell 命令执行、Slick REST 客户端、日志和国际化支持。

pub mod command;
pub mod logging;
pub mod slick;

// Re-export i18n functions for easier access
pub use rust_i18n::t;
