//! # Console Reporting Module / 控制台报告模块
//!
//! This module prints the results filed during a run to the console.
//! It provides a colorful table of results followed by per-status totals,
//! with internationalization support.
//!
//! 此模块将运行期间提交的结果打印到控制台。
//! 它提供彩色的结果表格以及按状态统计的总数，支持国际化。

use colored::*;
use std::collections::BTreeMap;

use crate::core::models::{EntityRef, FiledResult, RunOutcome};
use crate::infra::t;

/// Colors a status: `PASS` green, `FAIL` red, anything else yellow.
/// 为状态着色：`PASS` 为绿色，`FAIL` 为红色，其余为黄色。
pub fn colorize_status(status: &str) -> ColoredString {
    match status {
        "PASS" => status.green(),
        "FAIL" => status.red(),
        _ => status.yellow(),
    }
}

/// Counts filed results per status, in status order.
pub fn status_totals(results: &[FiledResult]) -> BTreeMap<&str, usize> {
    let mut totals = BTreeMap::new();
    for result in results {
        *totals.entry(result.status.as_str()).or_insert(0) += 1;
    }
    totals
}

/// Prints a formatted summary of filed results to the console.
///
/// 在控制台打印已提交结果的格式化摘要。
///
/// # Arguments / 参数
/// * `testrun` - The test run the results were filed against
///               结果所属的测试运行
/// * `outcome` - What the run produced
///               运行的产出
/// * `locale` - The language locale to use for messages
///              用于消息的语言区域设置
///
/// # Output Format / 输出格式
/// ```text
/// --- Results Filed ---
///   - PASS         | Search should return results            |     450ms
///   - FAIL         | Search should page                      |    1200ms
/// ```
pub fn print_summary(testrun: &EntityRef, outcome: &RunOutcome, locale: &str) {
    println!("\n{}", t!("summary.banner", locale = locale).bold());

    if outcome.filed.is_empty() {
        println!(
            "{}",
            t!("summary.no_results", locale = locale, lines = outcome.lines_read).yellow()
        );
    }

    for result in &outcome.filed {
        println!(
            "  - {:<12} | {:<40} | {:>9}ms",
            colorize_status(&result.status),
            result.name,
            result.runlength
        );
    }

    let totals = status_totals(&outcome.filed)
        .into_iter()
        .map(|(status, count)| format!("{} {}", colorize_status(status), count))
        .collect::<Vec<_>>()
        .join(", ");
    if !totals.is_empty() {
        println!("\n{} {}", t!("summary.totals", locale = locale), totals);
    }

    println!(
        "{}",
        t!("summary.testrun", locale = locale, name = &testrun.name, id = &testrun.id).cyan()
    );
    if let Some(code) = outcome.exit_code {
        println!("{}", t!("summary.exit_code", locale = locale, code = code).dimmed());
    }
}
