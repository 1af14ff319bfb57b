//! JSON output formatter

use serde::Serialize;

use super::{total_diagnostics, FileReport, Formatter};
use crate::core::types::Diagnostic;

/// JSON formatter
#[derive(Debug, Default)]
pub struct JsonFormatter;

impl JsonFormatter {
    pub fn new() -> Self {
        Self
    }
}

#[derive(Serialize)]
struct JsonOutput<'a> {
    files: Vec<JsonFile<'a>>,
    summary: JsonSummary,
}

#[derive(Serialize)]
struct JsonFile<'a> {
    path: String,
    diagnostics: &'a [Diagnostic],
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonSummary {
    files_checked: usize,
    total: usize,
}

impl Formatter for JsonFormatter {
    fn format(&self, reports: &[FileReport]) -> String {
        let output = JsonOutput {
            files: reports
                .iter()
                .map(|r| JsonFile {
                    path: r.path.display().to_string(),
                    diagnostics: &r.diagnostics,
                })
                .collect(),
            summary: JsonSummary {
                files_checked: reports.len(),
                total: total_diagnostics(reports),
            },
        };
        serde_json::to_string_pretty(&output).unwrap_or_else(|e| {
            tracing::error!("Failed to serialize report: {}", e);
            "{}".to_string()
        })
    }
}
