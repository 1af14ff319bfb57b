//! Violation to diagnostic mapping and quick fix synthesis

use std::sync::Arc;

use crate::config::{Config, NamingConvention};
use crate::core::types::{
    Diagnostic, DiagnosticCode, Fix, FixAction, Severity, Violation, ViolationCategory,
    DIAGNOSTIC_SOURCE,
};
use crate::engine::words::{
    capitalize, convert_case, detect_convention, join_words, split_words, strip_markers,
    NEGATIVE_WORDS,
};

use super::cache::{FixCache, FixKey};
use super::suggest::{SuggestionError, SuggestionService};

/// Convert one violation to a published diagnostic
pub fn to_diagnostic(violation: &Violation) -> Diagnostic {
    let code = match violation.category {
        None => DiagnosticCode::Uncategorized,
        Some(ViolationCategory::HardcodedThemeValue) => DiagnosticCode::ThemeSystemViolation,
        Some(_) => DiagnosticCode::NamingConventionViolation,
    };
    Diagnostic {
        range: violation.range,
        message: violation.message.clone(),
        severity: Severity::Warning,
        code,
        source: DIAGNOSTIC_SOURCE.to_string(),
        rule_id: violation.rule_id().to_string(),
    }
}

/// Convert violations to diagnostics, preserving order
pub fn to_diagnostics(violations: &[Violation]) -> Vec<Diagnostic> {
    violations.iter().map(to_diagnostic).collect()
}

/// Builds and memoizes quick fixes for one document
pub struct FixSynthesizer {
    cache: FixCache,
    suggestions: Option<Arc<dyn SuggestionService>>,
    development_mode: bool,
    convention: NamingConvention,
}

impl FixSynthesizer {
    pub fn new(config: &Config, suggestions: Option<Arc<dyn SuggestionService>>) -> Self {
        Self {
            cache: FixCache::new(),
            suggestions,
            development_mode: config.general.development_mode,
            convention: config.general.naming_convention,
        }
    }

    /// Apply new settings; cached fixes may no longer match them
    pub fn reconfigure(&mut self, config: &Config, suggestions: Option<Arc<dyn SuggestionService>>) {
        self.development_mode = config.general.development_mode;
        self.convention = config.general.naming_convention;
        self.suggestions = suggestions;
        self.cache.clear();
    }

    pub fn cache(&self) -> &FixCache {
        &self.cache
    }

    /// Quick fix for a diagnostic, from the cache when the same
    /// (message, position) was synthesized before
    pub async fn synthesize_fix(
        &mut self,
        diagnostic: &Diagnostic,
        violation: &Violation,
    ) -> Result<Option<Arc<Fix>>, SuggestionError> {
        let key = FixKey::of(diagnostic);
        if let Some(fix) = self.cache.get(&key) {
            return Ok(Some(fix));
        }

        let Some(fix) = self.derive_fix(diagnostic, violation).await? else {
            return Ok(None);
        };
        tracing::debug!("Synthesized fix '{}' for {}", fix.description, violation.subject);
        Ok(Some(self.cache.insert(key, fix)))
    }

    async fn derive_fix(
        &self,
        diagnostic: &Diagnostic,
        violation: &Violation,
    ) -> Result<Option<Fix>, SuggestionError> {
        let Some(category) = violation.category else {
            return Ok(None);
        };
        let subject = violation.subject.as_str();
        let range = violation.range;

        let new_name = match category {
            ViolationCategory::NameTooShort => {
                return Ok(Some(Fix::new(
                    format!("Rename '{}'", subject),
                    FixAction::PromptRename {
                        range,
                        placeholder: subject.to_string(),
                    },
                )));
            }
            ViolationCategory::BooleanNegativePattern => strip_negative(subject),
            ViolationCategory::BooleanNoPrefix => Some(add_prefix(subject, "is")),
            ViolationCategory::InvalidCase => Some(convert_case(subject, self.convention)),
            ViolationCategory::FunctionNoActionWord | ViolationCategory::FunctionTooShort => {
                if self.development_mode {
                    Some(add_prefix(subject, "get"))
                } else {
                    match &self.suggestions {
                        Some(service) => service.suggest(subject, &diagnostic.message).await?,
                        None => None,
                    }
                }
            }
            ViolationCategory::FunctionTooLong | ViolationCategory::HardcodedThemeValue => None,
        };

        Ok(new_name
            .filter(|name| !name.is_empty() && name != subject)
            .map(|name| {
                Fix::new(
                    format!("Rename to '{}'", name),
                    FixAction::ReplaceText {
                        range,
                        new_text: name,
                    },
                )
            }))
    }
}

/// Split `_$name` into (`_$`, `name`)
fn split_markers(name: &str) -> (&str, &str) {
    let stripped = strip_markers(name);
    (&name[..name.len() - stripped.len()], stripped)
}

/// `isNotReady` -> `isReady`
fn strip_negative(name: &str) -> Option<String> {
    let (markers, stripped) = split_markers(name);
    let mut words = split_words(stripped);
    let index = words
        .iter()
        .position(|w| NEGATIVE_WORDS.contains(&w.as_str()))?;
    words.remove(index);
    if words.is_empty() {
        return None;
    }
    Some(format!(
        "{}{}",
        markers,
        join_words(&words, detect_convention(stripped))
    ))
}

/// `ready` -> `isReady`, `ready_state` -> `is_ready_state`
fn add_prefix(name: &str, prefix: &str) -> String {
    let (markers, stripped) = split_markers(name);
    match detect_convention(stripped) {
        NamingConvention::SnakeCase => format!("{}{}_{}", markers, prefix, stripped),
        _ => format!("{}{}{}", markers, prefix, capitalize(stripped)),
    }
}
