//! Name Analyzer - naming convention diagnostics for JavaScript and TypeScript
//!
//! This library checks identifiers, functions, comments and literals in JS/TS
//! sources and turns what it finds into editor diagnostics and quick fixes:
//! - Naming: short names, casing, boolean prefixes, negative booleans
//! - Functions: action words, short names, overly long bodies
//! - Theme usage: hardcoded colors and sizes in string literals
//! - Comments: comments that only restate the next line
//!
//! # Example
//!
//! ```no_run
//! use name_analyzer::{analyze, Config, SourceDocument};
//! use name_analyzer::core::LanguageVariant;
//!
//! let document = SourceDocument::new(None, "let ready = true;", LanguageVariant::JavaScript);
//! let evaluation = analyze(&document, None, &Config::default()).unwrap();
//!
//! for violation in evaluation.violations {
//!     println!("{}: {}", violation.rule_id(), violation.message);
//! }
//! ```

pub mod config;
pub mod core;
pub mod engine;
pub mod fixes;
pub mod lsp;
pub mod output;
pub mod schedule;
pub mod session;

// Re-export main types
pub use crate::config::{Config, ConfigError, NamingConvention, CONFIG_FILE_NAME};
pub use crate::core::{
    ChangeSet, ChangeSetResolver, Diagnostic, DiagnosticCode, Fix, FixAction, LanguageVariant,
    Position, Range, Severity, Violation, ViolationCategory,
};
pub use crate::engine::{Evaluation, RuleEngine, RuleEvaluationError};
pub use crate::fixes::{FixSynthesizer, SuggestionError, SuggestionService};
pub use crate::schedule::{DiagnosticQueue, KeyedDebouncer, QueueOutcome};
pub use crate::session::{analyze, AnalysisError, AnalysisSession, QuickFix, SourceDocument};
