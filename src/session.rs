//! Per-document analysis session
//!
//! A session owns everything one open document needs between passes: the
//! configuration handle, the change-set resolver, the fix synthesizer with
//! its cache, and the diagnostics/violations of the latest pass so that code
//! action requests can be answered without re-analyzing.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use thiserror::Error;

use crate::config::Config;
use crate::core::changes::{ChangeSet, ChangeSetResolver};
use crate::core::syntax::{parse, LanguageVariant, ParseError};
use crate::core::types::{Diagnostic, Fix, Violation};
use crate::engine::{Evaluation, RuleEngine};
use crate::fixes::{to_diagnostics, FixSynthesizer, SuggestionError, SuggestionService};

/// Analysis failures
#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("Unsupported file type: {0}")]
    UnsupportedLanguage(PathBuf),
    #[error("Failed to read '{}': {}", .0.display(), .1)]
    Read(PathBuf, std::io::Error),
    #[error(transparent)]
    Parse(#[from] ParseError),
}

/// Source text with its language
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDocument {
    /// Location on disk, used for change detection
    pub path: Option<PathBuf>,
    pub text: String,
    pub variant: LanguageVariant,
}

impl SourceDocument {
    pub fn new(path: Option<PathBuf>, text: impl Into<String>, variant: LanguageVariant) -> Self {
        Self {
            path,
            text: text.into(),
            variant,
        }
    }

    /// Document for in-memory text at `path`, language taken from the extension
    pub fn for_path(path: &Path, text: impl Into<String>) -> Result<Self, AnalysisError> {
        let variant = LanguageVariant::from_path(path)
            .ok_or_else(|| AnalysisError::UnsupportedLanguage(path.to_path_buf()))?;
        Ok(Self::new(Some(path.to_path_buf()), text, variant))
    }

    /// Read a document from disk
    pub fn read(path: &Path) -> Result<Self, AnalysisError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| AnalysisError::Read(path.to_path_buf(), e))?;
        Self::for_path(path, text)
    }
}

/// Parse and evaluate one document synchronously
pub fn analyze(
    document: &SourceDocument,
    changes: Option<&ChangeSet>,
    config: &Config,
) -> Result<Evaluation, AnalysisError> {
    let start = Instant::now();
    let tree = parse(&document.text, document.variant)?;
    if tree.has_errors() {
        tracing::debug!(
            "{} syntax issue(s) in {}",
            tree.syntax_issues().len(),
            display_path(document)
        );
    }

    let evaluation = RuleEngine::new(config).evaluate(&tree, changes);
    tracing::debug!(
        "Analyzed {} in {:?}: {} violation(s)",
        display_path(document),
        start.elapsed(),
        evaluation.violations.len()
    );
    Ok(evaluation)
}

fn display_path(document: &SourceDocument) -> String {
    document
        .path
        .as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "<memory>".to_string())
}

/// A diagnostic and the quick fix synthesized for it
#[derive(Debug, Clone)]
pub struct QuickFix {
    pub diagnostic: Diagnostic,
    pub fix: Arc<Fix>,
}

/// State kept for one open document
pub struct AnalysisSession {
    config: Arc<Config>,
    resolver: ChangeSetResolver,
    synthesizer: FixSynthesizer,
    analyzed_text: Option<String>,
    only_changed_lines: bool,
    last: Vec<(Diagnostic, Violation)>,
}

impl AnalysisSession {
    pub fn new(config: Arc<Config>, suggestions: Option<Arc<dyn SuggestionService>>) -> Self {
        let synthesizer = FixSynthesizer::new(&config, suggestions);
        Self {
            config,
            resolver: ChangeSetResolver::new(),
            synthesizer,
            analyzed_text: None,
            only_changed_lines: false,
            last: Vec::new(),
        }
    }

    /// Use a custom change-set resolver
    pub fn with_resolver(mut self, resolver: ChangeSetResolver) -> Self {
        self.resolver = resolver;
        self
    }

    /// Replace the configuration; the next pass uses it
    pub fn reconfigure(
        &mut self,
        config: Arc<Config>,
        suggestions: Option<Arc<dyn SuggestionService>>,
    ) {
        self.synthesizer.reconfigure(&config, suggestions);
        self.config = config;
        self.analyzed_text = None;
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Diagnostics of the latest pass
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.last.iter().map(|(d, _)| d.clone()).collect()
    }

    /// Analyze the document and remember the result for code actions.
    ///
    /// With `only_changed_lines`, violations are limited to lines changed
    /// since the last commit; when that cannot be determined every line is
    /// checked.
    pub async fn provide_diagnostics(
        &mut self,
        document: &SourceDocument,
        only_changed_lines: bool,
    ) -> Result<Vec<Diagnostic>, AnalysisError> {
        let changes = match (&document.path, only_changed_lines) {
            (Some(path), true) => self.resolver.changed_lines(path).await,
            _ => None,
        };

        let evaluation = analyze(document, changes.as_ref(), &self.config)?;
        let diagnostics = to_diagnostics(&evaluation.violations);

        self.last = diagnostics
            .iter()
            .cloned()
            .zip(evaluation.violations)
            .collect();
        self.analyzed_text = Some(document.text.clone());
        self.only_changed_lines = only_changed_lines;
        Ok(diagnostics)
    }

    /// Quick fixes for the given diagnostics of this document.
    ///
    /// Diagnostics that do not belong to the latest pass are ignored.
    pub async fn provide_code_actions(
        &mut self,
        document: &SourceDocument,
        diagnostics: &[Diagnostic],
    ) -> Result<Vec<QuickFix>, SuggestionError> {
        if self.analyzed_text.as_deref() != Some(document.text.as_str()) {
            let only_changed = self.only_changed_lines;
            if let Err(e) = self.provide_diagnostics(document, only_changed).await {
                tracing::warn!("Re-analysis for code actions failed: {}", e);
                return Ok(Vec::new());
            }
        }

        let mut fixes = Vec::new();
        for requested in diagnostics {
            let Some((diagnostic, violation)) = self.find(requested) else {
                continue;
            };
            if let Some(fix) = self.synthesizer.synthesize_fix(&diagnostic, &violation).await? {
                fixes.push(QuickFix { diagnostic, fix });
            }
        }
        Ok(fixes)
    }

    fn find(&self, requested: &Diagnostic) -> Option<(Diagnostic, Violation)> {
        self.last
            .iter()
            .find(|(d, _)| d.message == requested.message && d.range.start == requested.range.start)
            .cloned()
    }

    /// Fixes synthesized so far
    pub fn cached_fixes(&self) -> usize {
        self.synthesizer.cache().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{DiagnosticCode, FixAction};

    fn document(text: &str) -> SourceDocument {
        SourceDocument::new(None, text, LanguageVariant::JavaScript)
    }

    #[test]
    fn test_for_path_rejects_unknown_extension() {
        assert!(matches!(
            SourceDocument::for_path(Path::new("notes.txt"), ""),
            Err(AnalysisError::UnsupportedLanguage(_))
        ));
        let doc = SourceDocument::for_path(Path::new("app.tsx"), "").unwrap();
        assert_eq!(doc.variant, LanguageVariant::Tsx);
    }

    #[test]
    fn test_read_missing_file() {
        assert!(matches!(
            SourceDocument::read(Path::new("/nonexistent/app.js")),
            Err(AnalysisError::Read(_, _))
        ));
    }

    #[tokio::test]
    async fn test_provide_diagnostics() {
        let mut session = AnalysisSession::new(Arc::new(Config::default()), None);
        let diagnostics = session
            .provide_diagnostics(&document("let ready = true;\nconst color = '#fff';\n"), false)
            .await
            .unwrap();

        assert_eq!(diagnostics.len(), 2);
        assert_eq!(diagnostics[0].code, DiagnosticCode::NamingConventionViolation);
        assert_eq!(diagnostics[1].code, DiagnosticCode::ThemeSystemViolation);
        assert_eq!(session.diagnostics(), diagnostics);
    }

    #[tokio::test]
    async fn test_only_changed_without_path_checks_everything() {
        let mut session = AnalysisSession::new(Arc::new(Config::default()), None);
        let diagnostics = session
            .provide_diagnostics(&document("const a = 1;\n"), true)
            .await
            .unwrap();
        assert_eq!(diagnostics.len(), 1);
    }

    #[tokio::test]
    async fn test_code_actions_for_boolean() {
        let mut session = AnalysisSession::new(Arc::new(Config::default()), None);
        let doc = document("let ready = true;\n");
        let diagnostics = session.provide_diagnostics(&doc, false).await.unwrap();

        let fixes = session.provide_code_actions(&doc, &diagnostics).await.unwrap();
        assert_eq!(fixes.len(), 1);
        match &fixes[0].fix.action {
            FixAction::ReplaceText { new_text, range } => {
                assert_eq!(new_text, "isReady");
                assert_eq!(range.start.line, 1);
                assert_eq!(range.start.character, 5);
            }
            other => panic!("unexpected action {:?}", other),
        }
        assert_eq!(session.cached_fixes(), 1);
    }

    #[tokio::test]
    async fn test_code_actions_reanalyze_stale_text() {
        let mut session = AnalysisSession::new(Arc::new(Config::default()), None);
        session
            .provide_diagnostics(&document("const value = 1;\n"), false)
            .await
            .unwrap();

        let edited = document("let ready = true;\n");
        let mut fresh = AnalysisSession::new(Arc::new(Config::default()), None);
        let requested = fresh.provide_diagnostics(&edited, false).await.unwrap();

        let fixes = session.provide_code_actions(&edited, &requested).await.unwrap();
        assert_eq!(fixes.len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_diagnostic_ignored() {
        let mut session = AnalysisSession::new(Arc::new(Config::default()), None);
        let doc = document("let ready = true;\n");
        let mut diagnostics = session.provide_diagnostics(&doc, false).await.unwrap();
        diagnostics[0].message = "Something else".to_string();

        let fixes = session.provide_code_actions(&doc, &diagnostics).await.unwrap();
        assert!(fixes.is_empty());
    }
}
