//! # Reporting Module / 报告模块
//!
//! This module prints a colorful, formatted summary of the results filed
//! during a run, with internationalization support.
//!
//! 此模块打印运行期间已提交结果的彩色格式化摘要，支持国际化。

pub mod console;

// Re-export common reporting functions
pub use console::print_summary;
