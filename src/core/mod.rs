//! Core infrastructure for naming analysis

pub mod changes;
pub mod syntax;
pub mod types;

pub use changes::{
    parse_hunk_header, parse_unified_diff, ChangeSet, ChangeSetError, ChangeSetResolver,
};
pub use syntax::{parse, LanguageVariant, NodeId, NodeKind, ParseError, SyntaxNode, SyntaxTree};
pub use types::{
    Diagnostic, DiagnosticCode, Fix, FixAction, Position, Range, RuleKind, Severity, Span,
    Violation, ViolationCategory, DIAGNOSTIC_SOURCE, REDUNDANT_COMMENT_RULE_ID,
};
