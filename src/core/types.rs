//! Core types for naming analysis

use serde::{Deserialize, Serialize};

/// Source tag attached to every published diagnostic
pub const DIAGNOSTIC_SOURCE: &str = "name-analyzer";

/// Position in a file (1-based for LSP compatibility)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Position {
    pub line: usize,
    pub character: usize,
}

impl Position {
    pub fn new(line: usize, character: usize) -> Self {
        Self { line, character }
    }
}

/// Range in a file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Range {
    pub start: Position,
    pub end: Position,
}

impl Range {
    pub fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }

    /// Create range from byte offsets in source
    pub fn from_offsets(source: &str, start: usize, end: usize) -> Self {
        let index = LineIndex::new(source);
        Self::new(index.position(source, start), index.position(source, end))
    }

    /// Check whether a 1-based line falls inside this range
    pub fn contains_line(&self, line: usize) -> bool {
        self.start.line <= line && line <= self.end.line
    }
}

/// Byte span `[start, end)` in the source text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Line start table for converting byte offsets to positions
#[derive(Debug, Clone)]
pub struct LineIndex {
    line_starts: Vec<usize>,
}

impl LineIndex {
    pub fn new(source: &str) -> Self {
        let mut line_starts = vec![0];
        for (i, b) in source.bytes().enumerate() {
            if b == b'\n' {
                line_starts.push(i + 1);
            }
        }
        Self { line_starts }
    }

    /// Number of lines in the source
    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// Convert a byte offset to a 1-based line / 1-based character position.
    ///
    /// Offsets past the end are clamped to the end of the text, offsets inside
    /// a multi-byte character are rounded down to the character start.
    pub fn position(&self, source: &str, offset: usize) -> Position {
        let mut offset = offset.min(source.len());
        while offset > 0 && !source.is_char_boundary(offset) {
            offset -= 1;
        }

        let line_idx = match self.line_starts.binary_search(&offset) {
            Ok(idx) => idx,
            Err(idx) => idx - 1,
        };
        let line_start = self.line_starts[line_idx];
        let character = source[line_start..offset].chars().count() + 1;

        Position::new(line_idx + 1, character)
    }
}

/// Diagnostic severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Hint = 1,
    Information = 2,
    Warning = 3,
    Error = 4,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Information => "information",
            Severity::Hint => "hint",
        }
    }
}

/// Which rule family produced a violation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RuleKind {
    NamingConvention,
    RedundantComment,
    ThemeSystemUsage,
}

impl RuleKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RuleKind::NamingConvention => "naming-convention",
            RuleKind::RedundantComment => "redundant-comment",
            RuleKind::ThemeSystemUsage => "theme-system-usage",
        }
    }
}

/// The specific check that fired
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ViolationCategory {
    /// Identifier shorter than the configured minimum
    NameTooShort,
    /// Identifier does not follow the configured casing convention
    InvalidCase,
    /// Boolean without an `is`/`has`/... prefix
    BooleanNoPrefix,
    /// Boolean containing a negative word (`isNotReady`)
    BooleanNegativePattern,
    /// Function name shorter than the configured minimum
    FunctionTooShort,
    /// Function name without an action word
    FunctionNoActionWord,
    /// Function body longer than the configured limit
    FunctionTooLong,
    /// Literal duplicating a design-token value
    HardcodedThemeValue,
}

impl ViolationCategory {
    /// Every category, in rule id order
    pub const ALL: [ViolationCategory; 8] = [
        ViolationCategory::NameTooShort,
        ViolationCategory::InvalidCase,
        ViolationCategory::BooleanNoPrefix,
        ViolationCategory::BooleanNegativePattern,
        ViolationCategory::FunctionTooShort,
        ViolationCategory::FunctionNoActionWord,
        ViolationCategory::FunctionTooLong,
        ViolationCategory::HardcodedThemeValue,
    ];

    /// Stable rule identifier used in configuration and reports
    pub fn rule_id(&self) -> &'static str {
        match self {
            ViolationCategory::NameTooShort => "NAM-001",
            ViolationCategory::InvalidCase => "NAM-002",
            ViolationCategory::BooleanNoPrefix => "BOOL-001",
            ViolationCategory::BooleanNegativePattern => "BOOL-002",
            ViolationCategory::FunctionTooShort => "FN-001",
            ViolationCategory::FunctionNoActionWord => "FN-002",
            ViolationCategory::FunctionTooLong => "FN-003",
            ViolationCategory::HardcodedThemeValue => "THEME-001",
        }
    }

    /// Rule family the category belongs to
    pub fn rule_kind(&self) -> RuleKind {
        match self {
            ViolationCategory::HardcodedThemeValue => RuleKind::ThemeSystemUsage,
            _ => RuleKind::NamingConvention,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            ViolationCategory::NameTooShort => "Names should meet the minimum length",
            ViolationCategory::InvalidCase => "Names should follow the configured casing convention",
            ViolationCategory::BooleanNoPrefix => "Booleans should start with a prefix such as 'is' or 'has'",
            ViolationCategory::BooleanNegativePattern => "Booleans should use positive naming",
            ViolationCategory::FunctionTooShort => "Function names should meet the minimum length",
            ViolationCategory::FunctionNoActionWord => "Function names should start with an action word",
            ViolationCategory::FunctionTooLong => "Functions should not exceed the configured length",
            ViolationCategory::HardcodedThemeValue => "Use design tokens instead of hard-coded values",
        }
    }
}

/// Rule id of the (uncategorized) redundant comment rule
pub const REDUNDANT_COMMENT_RULE_ID: &str = "CMT-001";

/// A detected rule breach, prior to formatting as a diagnostic
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Violation {
    pub rule: RuleKind,
    /// `None` only for redundant comments
    pub category: Option<ViolationCategory>,
    /// The flagged identifier or literal text
    pub subject: String,
    pub span: Span,
    pub range: Range,
    pub message: String,
}

impl Violation {
    pub fn new(
        category: ViolationCategory,
        subject: impl Into<String>,
        span: Span,
        range: Range,
        message: impl Into<String>,
    ) -> Self {
        Self {
            rule: category.rule_kind(),
            category: Some(category),
            subject: subject.into(),
            span,
            range,
            message: message.into(),
        }
    }

    pub fn redundant_comment(
        subject: impl Into<String>,
        span: Span,
        range: Range,
        message: impl Into<String>,
    ) -> Self {
        Self {
            rule: RuleKind::RedundantComment,
            category: None,
            subject: subject.into(),
            span,
            range,
            message: message.into(),
        }
    }

    pub fn rule_id(&self) -> &'static str {
        self.category
            .map(|c| c.rule_id())
            .unwrap_or(REDUNDANT_COMMENT_RULE_ID)
    }
}

/// Stable diagnostic code published to clients
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DiagnosticCode {
    #[serde(rename = "namingConventionViolation")]
    NamingConventionViolation,
    #[serde(rename = "themeSystemViolation")]
    ThemeSystemViolation,
    /// Never written out; the `code` field is omitted instead
    #[default]
    #[serde(skip)]
    Uncategorized,
}

impl DiagnosticCode {
    pub fn is_uncategorized(&self) -> bool {
        matches!(self, DiagnosticCode::Uncategorized)
    }

    /// Wire value; `None` for uncategorized diagnostics
    pub fn as_wire(&self) -> Option<&'static str> {
        match self {
            DiagnosticCode::NamingConventionViolation => Some("namingConventionViolation"),
            DiagnosticCode::ThemeSystemViolation => Some("themeSystemViolation"),
            DiagnosticCode::Uncategorized => None,
        }
    }

    pub fn from_wire(value: Option<&str>) -> Self {
        match value {
            Some("namingConventionViolation") => DiagnosticCode::NamingConventionViolation,
            Some("themeSystemViolation") => DiagnosticCode::ThemeSystemViolation,
            _ => DiagnosticCode::Uncategorized,
        }
    }
}

/// A positioned, user-facing diagnostic
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostic {
    pub range: Range,
    pub message: String,
    pub severity: Severity,
    #[serde(default, skip_serializing_if = "DiagnosticCode::is_uncategorized")]
    pub code: DiagnosticCode,
    pub source: String,
    /// Rule identifier (e.g., "BOOL-001")
    pub rule_id: String,
}

/// Text replacement applied by a quick fix
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum FixAction {
    /// Replace text in range
    ReplaceText { range: Range, new_text: String },
    /// Ask the user for a new name; no deterministic rename exists
    PromptRename { range: Range, placeholder: String },
}

/// A suggested fix for a diagnostic
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fix {
    pub description: String,
    pub action: FixAction,
}

impl Fix {
    pub fn new(description: impl Into<String>, action: FixAction) -> Self {
        Self {
            description: description.into(),
            action,
        }
    }

    /// Whether the fix needs caller-supplied input before it can be applied
    pub fn requires_input(&self) -> bool {
        matches!(self.action, FixAction::PromptRename { .. })
    }
}
