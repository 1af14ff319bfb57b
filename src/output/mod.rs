//! Output formatters for command-line results

mod json;
mod text;

pub use json::JsonFormatter;
pub use text::TextFormatter;

use std::path::PathBuf;

use crate::core::types::Diagnostic;

/// Diagnostics of one analyzed file
#[derive(Debug, Clone)]
pub struct FileReport {
    pub path: PathBuf,
    pub diagnostics: Vec<Diagnostic>,
}

impl FileReport {
    pub fn new(path: PathBuf, diagnostics: Vec<Diagnostic>) -> Self {
        Self { path, diagnostics }
    }
}

/// Total diagnostics across reports
pub fn total_diagnostics(reports: &[FileReport]) -> usize {
    reports.iter().map(|r| r.diagnostics.len()).sum()
}

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => Err(format!("Unknown format: {}", s)),
        }
    }
}

/// Trait for output formatters
pub trait Formatter {
    fn format(&self, reports: &[FileReport]) -> String;
}

/// Get a formatter for the specified format
pub fn get_formatter(format: OutputFormat, colored: bool) -> Box<dyn Formatter> {
    match format {
        OutputFormat::Text => Box::new(TextFormatter::new(colored)),
        OutputFormat::Json => Box::new(JsonFormatter::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_format_from_str() {
        assert_eq!("text".parse::<OutputFormat>().unwrap(), OutputFormat::Text);
        assert_eq!("JSON".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert!("sarif"
            .parse::<OutputFormat>()
            .unwrap_err()
            .contains("Unknown format"));
    }

    #[test]
    fn test_get_formatter_json_empty() {
        let output = get_formatter(OutputFormat::Json, false).format(&[]);
        assert!(output.contains("\"files\""));
    }

    #[test]
    fn test_total_diagnostics_empty() {
        assert_eq!(total_diagnostics(&[]), 0);
    }
}
