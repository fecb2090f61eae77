//! # Core Module / 核心模块
//!
//! This module contains the core functionality of Slick Reporter:
//! data models, configuration, hierarchy resolution, output classification
//! and result filing.
//!
//! 此模块包含 Slick Reporter 的核心功能：
//! 数据模型、配置、层级解析、输出分类和结果提交。

pub mod classifier;
pub mod config;
pub mod context;
pub mod error;
pub mod execution;
pub mod models;
pub mod resolve;
pub mod template;

// Re-exports
pub use classifier::OutputClassifier;
pub use config::ReporterConfig;
pub use context::ContextResolver;
pub use execution::{CommandTester, run_and_finalize};
