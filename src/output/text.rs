//! Human-readable text output formatter

use colored::*;

use super::{total_diagnostics, FileReport, Formatter};
use crate::core::types::{Diagnostic, Severity};

/// Text formatter with optional color support
pub struct TextFormatter {
    colored: bool,
}

impl TextFormatter {
    pub fn new(colored: bool) -> Self {
        Self { colored }
    }

    fn severity_str(&self, severity: Severity) -> ColoredString {
        let s = severity.as_str();
        if !self.colored {
            return s.normal();
        }
        match severity {
            Severity::Error => s.red().bold(),
            Severity::Warning => s.yellow().bold(),
            Severity::Information => s.blue(),
            Severity::Hint => s.dimmed(),
        }
    }

    fn format_diagnostic(&self, path: &str, diag: &Diagnostic) -> String {
        let location = format!(
            "{}:{}:{}",
            path, diag.range.start.line, diag.range.start.character
        );
        let location = if self.colored {
            location.bold()
        } else {
            location.normal()
        };
        format!(
            "{} {}[{}]: {}",
            location,
            self.severity_str(diag.severity),
            diag.rule_id,
            diag.message
        )
    }
}

impl Formatter for TextFormatter {
    fn format(&self, reports: &[FileReport]) -> String {
        let mut output = String::new();

        for report in reports {
            let path = report.path.display().to_string();
            for diag in &report.diagnostics {
                output.push_str(&self.format_diagnostic(&path, diag));
                output.push('\n');
            }
        }

        let total = total_diagnostics(reports);
        let files = reports.len();
        let summary = format!(
            "{} {} checked, {} {}",
            files,
            if files == 1 { "file" } else { "files" },
            total,
            if total == 1 { "problem" } else { "problems" }
        );
        if !output.is_empty() {
            output.push('\n');
        }
        if self.colored && total > 0 {
            output.push_str(&summary.yellow().to_string());
        } else {
            output.push_str(&summary);
        }
        output.push('\n');
        output
    }
}
