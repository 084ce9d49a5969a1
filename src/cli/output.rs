//! CLI output formatting

use crate::persistence::RunResult;
use crate::substep::InterfaceReport;
use console::Emoji;

// Re-export style
pub use console::style;

// Emojis for output
pub static CHECK: Emoji<'_, '_> = Emoji("✅ ", "✓ ");
pub static CROSS: Emoji<'_, '_> = Emoji("❌ ", "✗ ");
pub static INFO: Emoji<'_, '_> = Emoji("ℹ️  ", "i ");
pub static WARN: Emoji<'_, '_> = Emoji("⚠️  ", "!");

/// Format an interface report with bold section headings
pub fn format_report(report: &InterfaceReport) -> String {
    let mut lines = vec![
        style("STEP NAME:").bold().to_string(),
        style(&report.step_name).cyan().to_string(),
    ];

    for (title, views) in report.sections() {
        lines.push(String::new());
        lines.push(style(format!("{}:", title)).bold().to_string());
        for view in views {
            lines.push(format!("  {} {}", style(&view.name).bold(), style(&view.url).dim()));
        }
    }

    lines.join("\n")
}

/// Format a run result for display
pub fn format_run_result(result: RunResult) -> String {
    match result {
        RunResult::Success => style("SUCCESS").green().to_string(),
        RunResult::Fail => style("FAIL").red().to_string(),
        RunResult::Unknown => style("UNKNOWN").dim().to_string(),
    }
}
