//! Rule engine
//!
//! One top-down traversal over a [`SyntaxTree`], dispatching on node kind:
//!
//! ```text
//! VariableDeclarator ─► declaration naming ─► function naming (bound arrows/expressions)
//! FunctionDeclaration / FunctionExpression / ArrowFunction ─► function + parameter naming
//! ObjectProperty / ShorthandProperty ─► property naming
//! string / template_string ─► theme values
//! Comment ─► redundant comments
//! ```
//!
//! Every check is gated on the change set when one is given. A node that
//! cannot be evaluated (typically a parser recovery node) is recorded as a
//! [`RuleEvaluationError`] and the walk continues.

pub mod comments;
pub mod naming;
pub mod theme;
mod visitor;
pub mod words;

use thiserror::Error;

use crate::config::Config;
use crate::core::changes::ChangeSet;
use crate::core::syntax::{NodeId, SyntaxTree};
use crate::core::types::Violation;

use visitor::Walker;

/// A node the rules could not evaluate
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RuleEvaluationError {
    #[error("{kind} at line {line} has no '{field}'")]
    MissingField {
        kind: &'static str,
        field: &'static str,
        line: usize,
    },
    #[error("Empty identifier at line {line}")]
    EmptyName { line: usize },
}

impl RuleEvaluationError {
    pub(crate) fn missing(tree: &SyntaxTree, id: NodeId, field: &'static str) -> Self {
        let node = tree.node(id);
        Self::MissingField {
            kind: node.raw_kind,
            field,
            line: node.start_line(),
        }
    }
}

/// Counters collected during one evaluation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EvaluationStats {
    pub nodes_visited: usize,
    /// Functions whose name and parameters were evaluated
    pub function_checks: usize,
}

/// Result of evaluating one tree
#[derive(Debug, Clone, Default)]
pub struct Evaluation {
    /// Violations in document order
    pub violations: Vec<Violation>,
    pub errors: Vec<RuleEvaluationError>,
    pub stats: EvaluationStats,
}

/// Evaluates the fixed rule set under one configuration
pub struct RuleEngine<'a> {
    config: &'a Config,
    theme_patterns: Vec<regex::Regex>,
}

impl<'a> RuleEngine<'a> {
    pub fn new(config: &'a Config) -> Self {
        let theme_patterns = if config.theme.enabled {
            config.theme.compiled_patterns()
        } else {
            Vec::new()
        };
        Self {
            config,
            theme_patterns,
        }
    }

    /// Evaluate every rule over the tree.
    ///
    /// With a change set, only lines it contains are reported.
    pub fn evaluate(&self, tree: &SyntaxTree, changes: Option<&ChangeSet>) -> Evaluation {
        let mut walker = Walker::new(tree, self.config, changes, &self.theme_patterns);
        walker.walk();

        let mut violations = walker.violations;
        violations.sort_by_key(|v| v.span.start);

        if !walker.errors.is_empty() {
            tracing::debug!(
                "{} node(s) could not be evaluated in {} source",
                walker.errors.len(),
                tree.variant()
            );
        }

        Evaluation {
            violations,
            errors: walker.errors,
            stats: walker.stats,
        }
    }
}

/// Evaluate a tree with a one-off engine
pub fn evaluate(tree: &SyntaxTree, changes: Option<&ChangeSet>, config: &Config) -> Evaluation {
    RuleEngine::new(config).evaluate(tree, changes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::syntax::{parse, LanguageVariant};
    use crate::core::types::ViolationCategory;

    fn run(source: &str) -> Evaluation {
        let tree = parse(source, LanguageVariant::JavaScript).unwrap();
        evaluate(&tree, None, &Config::default())
    }

    fn run_ts(source: &str) -> Evaluation {
        let tree = parse(source, LanguageVariant::TypeScript).unwrap();
        evaluate(&tree, None, &Config::default())
    }

    fn found(eval: &Evaluation) -> Vec<(String, ViolationCategory)> {
        eval.violations
            .iter()
            .filter_map(|v| v.category.map(|c| (v.subject.clone(), c)))
            .collect()
    }

    #[test]
    fn test_boolean_declarations() {
        let eval = run("const isNotReady = false;\nlet ready = true;\nconst done = !busy;\n");
        assert_eq!(
            found(&eval),
            vec![
                (
                    "isNotReady".to_string(),
                    ViolationCategory::BooleanNegativePattern
                ),
                ("ready".to_string(), ViolationCategory::BooleanNoPrefix),
                ("done".to_string(), ViolationCategory::BooleanNoPrefix),
            ]
        );
    }

    #[test]
    fn test_typescript_boolean_annotation() {
        let eval = run_ts("let loaded: boolean;\nfunction toggleMenu(open: boolean) {}\n");
        assert_eq!(
            found(&eval),
            vec![
                ("loaded".to_string(), ViolationCategory::BooleanNoPrefix),
                ("open".to_string(), ViolationCategory::BooleanNoPrefix),
            ]
        );
    }

    #[test]
    fn test_destructuring() {
        let eval = run("const { id, user: { nm }, visible = true } = props;\nconst [a, ...rest] = list;\n");
        let subjects: Vec<String> = found(&eval).into_iter().map(|(s, _)| s).collect();
        assert_eq!(subjects, vec!["id", "nm", "visible", "a"]);
        let visible = &found(&eval)[2];
        assert_eq!(visible.1, ViolationCategory::BooleanNoPrefix);
    }

    #[test]
    fn test_function_forms() {
        let source = "\
function data() { return 1; }
const info = () => 2;
const fetchUsers = function () { return []; };
";
        let eval = run(source);
        assert!(found(&eval).is_empty());
        assert_eq!(eval.stats.function_checks, 3);
    }

    #[test]
    fn test_long_function_without_action_word() {
        let body = "  step();\n".repeat(18);
        let source = format!("function data() {{\n{}}}\n", body);
        let eval = run(&source);
        assert_eq!(
            found(&eval),
            vec![("data".to_string(), ViolationCategory::FunctionNoActionWord)]
        );
    }

    #[test]
    fn test_parameters() {
        let eval = run("function handleClick(e, { id }, enabled = false, ...xs) {}\n");
        assert_eq!(
            found(&eval),
            vec![
                ("e".to_string(), ViolationCategory::NameTooShort),
                ("id".to_string(), ViolationCategory::NameTooShort),
                ("enabled".to_string(), ViolationCategory::BooleanNoPrefix),
                ("xs".to_string(), ViolationCategory::NameTooShort),
            ]
        );
    }

    #[test]
    fn test_single_parameter_arrow() {
        let eval = run("const items = list.map(x => x * 2);\n");
        assert_eq!(
            found(&eval),
            vec![("x".to_string(), ViolationCategory::NameTooShort)]
        );
    }

    #[test]
    fn test_object_properties() {
        let eval = run("const settings = { on: true, 'quoted-key': 1, val, isOpen: false };\n");
        assert_eq!(
            found(&eval),
            vec![
                ("on".to_string(), ViolationCategory::NameTooShort),
                ("on".to_string(), ViolationCategory::BooleanNoPrefix),
                ("val".to_string(), ViolationCategory::NameTooShort),
            ]
        );
    }

    #[test]
    fn test_theme_values() {
        let eval = run("const styles = { color: '#336699', margin: 8 };\nimport x from './a.css';\n");
        assert_eq!(
            found(&eval),
            vec![("#336699".to_string(), ViolationCategory::HardcodedThemeValue)]
        );
    }

    #[test]
    fn test_theme_disabled() {
        let mut config = Config::default();
        config.theme.enabled = false;
        let tree = parse("const color = '#fff';", LanguageVariant::JavaScript).unwrap();
        assert!(evaluate(&tree, None, &config).violations.is_empty());
    }

    #[test]
    fn test_redundant_comment_flag() {
        let source = "// get user name\nconst userName = getUser();\n";
        let tree = parse(source, LanguageVariant::JavaScript).unwrap();

        assert!(evaluate(&tree, None, &Config::default()).violations.is_empty());

        let mut config = Config::default();
        config.comments.flag_redundant = true;
        let eval = evaluate(&tree, None, &config);
        assert_eq!(eval.violations.len(), 1);
        assert!(eval.violations[0].category.is_none());
    }

    #[test]
    fn test_change_set_gating() {
        let source = "const a = 1;\nconst b = 2;\nconst c = 3;\nconst d = 4;\nconst e = 5;\n";
        let tree = parse(source, LanguageVariant::JavaScript).unwrap();
        let changes: ChangeSet = [5].into_iter().collect();

        let eval = evaluate(&tree, Some(&changes), &Config::default());
        assert_eq!(found(&eval), vec![("e".to_string(), ViolationCategory::NameTooShort)]);

        let all = evaluate(&tree, None, &Config::default());
        assert_eq!(all.violations.len(), 5);
    }

    #[test]
    fn test_nested_arrow_evaluated_once() {
        let source = "const makeHandler = () => {\n  const handleIt = () => () => 1;\n  return handleIt;\n};\n";
        let eval = run(source);
        // outer, inner and the anonymous returned arrow
        assert_eq!(eval.stats.function_checks, 3);
        assert!(found(&eval).is_empty());
    }

    #[test]
    fn test_evaluation_is_idempotent() {
        let source = "let ready = true;\nfunction x(a) { return '#fff'; }\n";
        let tree = parse(source, LanguageVariant::JavaScript).unwrap();
        let config = Config::default();
        let first = evaluate(&tree, None, &config);
        let second = evaluate(&tree, None, &config);
        assert_eq!(first.violations, second.violations);
    }

    #[test]
    fn test_violations_in_document_order() {
        let eval = run("const b = 1;\nfunction handle(c) {}\nconst settings = { d: '#000' };\n");
        let starts: Vec<usize> = eval.violations.iter().map(|v| v.span.start).collect();
        let mut sorted = starts.clone();
        sorted.sort();
        assert_eq!(starts, sorted);
        assert!(!eval.violations.is_empty());
    }

    #[test]
    fn test_malformed_source_does_not_abort() {
        let tree = parse("const = 5;\nlet ready = true;\n", LanguageVariant::JavaScript).unwrap();
        let eval = evaluate(&tree, None, &Config::default());
        assert!(eval
            .violations
            .iter()
            .any(|v| v.subject == "ready" && v.category == Some(ViolationCategory::BooleanNoPrefix)));
    }
}
