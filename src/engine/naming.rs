//! Naming rules for declarations, parameters, properties and functions

use crate::config::{Config, NamingConvention};
use crate::core::types::{Range, Span, Violation, ViolationCategory};

use super::words::{
    follows_convention, is_constant_case, negative_word, starts_with_any, strip_markers,
    ACTION_WORDS,
};

/// Where a checked name was bound
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingKind {
    Declaration,
    Parameter,
    Property,
}

/// A name occurrence to check
#[derive(Debug, Clone, Copy)]
pub struct NameSite<'t> {
    pub name: &'t str,
    pub span: Span,
    pub range: Range,
}

/// Applies the naming rules under one configuration
pub struct NameRules<'a> {
    config: &'a Config,
}

impl<'a> NameRules<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self { config }
    }

    fn enabled(&self, category: ViolationCategory) -> bool {
        self.config.is_rule_enabled(category.rule_id())
    }

    /// Casing, length and boolean wording for a bound name
    pub fn check_binding(
        &self,
        site: NameSite<'_>,
        kind: BindingKind,
        is_boolean: bool,
    ) -> Vec<Violation> {
        let mut out = Vec::new();
        if site.name == "_" || self.config.is_ignored_name(site.name) {
            return out;
        }
        let name = strip_markers(site.name);
        if name.is_empty() {
            return out;
        }

        let general = &self.config.general;
        let constant = general.allow_constant_case && is_constant_case(name);
        let violation = |category, message: String| {
            Violation::new(category, site.name, site.span, site.range, message)
        };

        // Casing is not enforced on property keys
        if kind != BindingKind::Property
            && !constant
            && self.enabled(ViolationCategory::InvalidCase)
            && !follows_convention(name, general.naming_convention)
        {
            out.push(violation(
                ViolationCategory::InvalidCase,
                format!(
                    "Name '{}' does not follow {} naming.",
                    site.name,
                    convention_label(general.naming_convention)
                ),
            ));
        }

        let length = name.chars().count();
        let too_short = match kind {
            BindingKind::Property => length <= general.name_length_limit,
            _ => length < general.name_length_limit,
        };
        if too_short && self.enabled(ViolationCategory::NameTooShort) {
            out.push(violation(
                ViolationCategory::NameTooShort,
                format!(
                    "Name '{}' is too short. Use a more descriptive name.",
                    site.name
                ),
            ));
        }

        if is_boolean && !constant {
            if self.enabled(ViolationCategory::BooleanNegativePattern) {
                if let Some(word) = negative_word(name) {
                    out.push(violation(
                        ViolationCategory::BooleanNegativePattern,
                        format!(
                            "Boolean '{}' uses negative wording ('{}'). Prefer a positive name.",
                            site.name, word
                        ),
                    ));
                }
            }

            let prefixes = general.boolean_prefixes.as_slice();
            if self.enabled(ViolationCategory::BooleanNoPrefix) && !starts_with_any(name, prefixes)
            {
                out.push(violation(
                    ViolationCategory::BooleanNoPrefix,
                    format!(
                        "Boolean '{}' should start with a prefix such as {}.",
                        site.name,
                        prefix_list(prefixes)
                    ),
                ));
            }
        }

        out
    }

    /// Name length, action word and body length for a function.
    ///
    /// `body_lines` is `None` when the function has no body node.
    pub fn check_function(&self, site: NameSite<'_>, body_lines: Option<usize>) -> Vec<Violation> {
        let mut out = Vec::new();
        if self.config.is_ignored_function(site.name) {
            return out;
        }
        let name = strip_markers(site.name);
        if name.is_empty() {
            return out;
        }

        let general = &self.config.general;
        let violation = |category, message: String| {
            Violation::new(category, site.name, site.span, site.range, message)
        };

        if self.enabled(ViolationCategory::FunctionTooShort)
            && name.chars().count() <= general.name_length_limit
        {
            out.push(violation(
                ViolationCategory::FunctionTooShort,
                format!(
                    "Function name '{}' is too short. Use a name longer than {} characters.",
                    site.name, general.name_length_limit
                ),
            ));
        }

        let exempt = general.exempt_short_functions
            && body_lines.is_some_and(|lines| lines <= general.short_function_line_limit);
        if !exempt
            && self.enabled(ViolationCategory::FunctionNoActionWord)
            && !starts_with_any(name, ACTION_WORDS)
        {
            out.push(violation(
                ViolationCategory::FunctionNoActionWord,
                format!(
                    "Function '{}' should start with an action word such as 'get', 'set' or 'handle'.",
                    site.name
                ),
            ));
        }

        if let Some(lines) = body_lines {
            if lines > general.function_length_limit
                && self.enabled(ViolationCategory::FunctionTooLong)
            {
                out.push(violation(
                    ViolationCategory::FunctionTooLong,
                    format!(
                        "Function '{}' is {} lines long. Keep functions under {} lines.",
                        site.name, lines, general.function_length_limit
                    ),
                ));
            }
        }

        out
    }
}

fn convention_label(convention: NamingConvention) -> &'static str {
    match convention {
        NamingConvention::CamelCase => "camelCase",
        NamingConvention::SnakeCase => "snake_case",
        NamingConvention::PascalCase => "PascalCase",
        NamingConvention::Any => "any",
    }
}

fn prefix_list(prefixes: &[String]) -> String {
    prefixes
        .iter()
        .take(3)
        .map(|p| format!("'{}'", p))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Position;

    fn site(name: &str) -> NameSite<'_> {
        NameSite {
            name,
            span: Span::new(0, name.len()),
            range: Range::new(Position::new(1, 1), Position::new(1, name.len() + 1)),
        }
    }

    fn categories(violations: &[Violation]) -> Vec<ViolationCategory> {
        violations.iter().filter_map(|v| v.category).collect()
    }

    #[test]
    fn test_boolean_negative() {
        let config = Config::default();
        let rules = NameRules::new(&config);
        let found = rules.check_binding(site("isNotReady"), BindingKind::Declaration, true);
        assert_eq!(
            categories(&found),
            vec![ViolationCategory::BooleanNegativePattern]
        );
    }

    #[test]
    fn test_boolean_no_prefix() {
        let config = Config::default();
        let rules = NameRules::new(&config);
        let found = rules.check_binding(site("ready"), BindingKind::Declaration, true);
        assert_eq!(categories(&found), vec![ViolationCategory::BooleanNoPrefix]);
        assert!(found[0].message.contains("'is'"));
    }

    #[test]
    fn test_non_boolean_skips_boolean_rules() {
        let config = Config::default();
        let rules = NameRules::new(&config);
        assert!(rules
            .check_binding(site("ready"), BindingKind::Declaration, false)
            .is_empty());
    }

    #[test]
    fn test_short_names() {
        let config = Config::default();
        let rules = NameRules::new(&config);
        assert_eq!(
            categories(&rules.check_binding(site("ab"), BindingKind::Declaration, false)),
            vec![ViolationCategory::NameTooShort]
        );
        assert!(rules
            .check_binding(site("abc"), BindingKind::Declaration, false)
            .is_empty());
        // Property keys use an inclusive limit
        assert_eq!(
            categories(&rules.check_binding(site("abc"), BindingKind::Property, false)),
            vec![ViolationCategory::NameTooShort]
        );
    }

    #[test]
    fn test_markers_and_ignored() {
        let mut config = Config::default();
        config.general.ignored_names.push("id".to_string());
        let rules = NameRules::new(&config);
        assert!(rules.check_binding(site("_"), BindingKind::Parameter, false).is_empty());
        assert!(rules.check_binding(site("id"), BindingKind::Declaration, false).is_empty());
        assert!(rules
            .check_binding(site("_isReady"), BindingKind::Declaration, true)
            .is_empty());
        assert!(rules
            .check_binding(site("$element"), BindingKind::Declaration, false)
            .is_empty());
    }

    #[test]
    fn test_invalid_case() {
        let config = Config::default();
        let rules = NameRules::new(&config);
        let found = rules.check_binding(site("user_name"), BindingKind::Declaration, false);
        assert_eq!(categories(&found), vec![ViolationCategory::InvalidCase]);
        assert!(found[0].message.contains("camelCase"));

        assert!(rules
            .check_binding(site("MAX_RETRIES"), BindingKind::Declaration, false)
            .is_empty());
        assert!(rules
            .check_binding(site("user_name"), BindingKind::Property, false)
            .is_empty());
    }

    #[test]
    fn test_disabled_rule() {
        let mut config = Config::default();
        config.rules.disable.push("BOOL-*".to_string());
        let rules = NameRules::new(&config);
        assert!(rules
            .check_binding(site("notReady"), BindingKind::Declaration, true)
            .is_empty());
    }

    #[test]
    fn test_function_short_body_exempt() {
        let config = Config::default();
        let rules = NameRules::new(&config);
        assert!(rules.check_function(site("data"), Some(1)).is_empty());
        assert_eq!(
            categories(&rules.check_function(site("data"), Some(20))),
            vec![ViolationCategory::FunctionNoActionWord]
        );
    }

    #[test]
    fn test_function_exemption_disabled() {
        let mut config = Config::default();
        config.general.exempt_short_functions = false;
        let rules = NameRules::new(&config);
        assert_eq!(
            categories(&rules.check_function(site("data"), Some(1))),
            vec![ViolationCategory::FunctionNoActionWord]
        );
    }

    #[test]
    fn test_function_too_short_and_long() {
        let config = Config::default();
        let rules = NameRules::new(&config);
        assert_eq!(
            categories(&rules.check_function(site("get"), Some(1))),
            vec![ViolationCategory::FunctionTooShort]
        );
        assert_eq!(
            categories(&rules.check_function(site("loadUsers"), Some(80))),
            vec![ViolationCategory::FunctionTooLong]
        );
        assert!(rules.check_function(site("main"), Some(80)).is_empty());
    }
}
