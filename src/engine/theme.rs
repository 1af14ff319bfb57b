//! Hard-coded design value detection in string literals

use regex::Regex;

use crate::core::syntax::{NodeId, SyntaxTree};
use crate::core::types::{Span, Violation, ViolationCategory};

/// Literal node types scanned for design values
pub fn is_literal(raw_kind: &str) -> bool {
    matches!(raw_kind, "string" | "template_string")
}

/// One violation per pattern match inside the literal, positioned at the match.
///
/// Template substitutions are skipped; literals inside them are scanned as
/// literals of their own. `in_scope` decides per line whether a match is
/// reported.
pub fn scan_literal(
    tree: &SyntaxTree,
    literal: NodeId,
    patterns: &[Regex],
    in_scope: impl Fn(usize) -> bool,
) -> Vec<Violation> {
    let source = tree.source();

    let mut matches: Vec<(usize, usize)> = literal_segments(tree, literal)
        .into_iter()
        .flat_map(|segment| {
            let text = source.get(segment.start..segment.end).unwrap_or("");
            patterns
                .iter()
                .flat_map(move |re| {
                    re.find_iter(text)
                        .map(move |m| (segment.start + m.start(), segment.start + m.end()))
                })
                .collect::<Vec<_>>()
        })
        .collect();
    matches.sort_unstable();
    matches.dedup();

    matches
        .into_iter()
        .filter_map(|(start, end)| {
            let span = Span::new(start, end);
            let range = tree.range(span);
            if !in_scope(range.start.line) {
                return None;
            }
            let value = &source[start..end];
            Some(Violation::new(
                ViolationCategory::HardcodedThemeValue,
                value,
                span,
                range,
                format!(
                    "Hard-coded value '{}' should come from the theme instead.",
                    value
                ),
            ))
        })
        .collect()
}

/// Byte ranges of the literal outside any `${...}` substitution
fn literal_segments(tree: &SyntaxTree, literal: NodeId) -> Vec<Span> {
    let whole = tree.node(literal).span;
    let mut segments = Vec::new();
    let mut cursor = whole.start;
    for &child in tree.children(literal) {
        let child = tree.node(child);
        if child.raw_kind != "template_substitution" {
            continue;
        }
        if child.span.start > cursor {
            segments.push(Span::new(cursor, child.span.start));
        }
        cursor = cursor.max(child.span.end);
    }
    if whole.end > cursor {
        segments.push(Span::new(cursor, whole.end));
    }
    segments
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ThemeConfig;
    use crate::core::syntax::{parse, LanguageVariant};

    fn literals(tree: &SyntaxTree) -> Vec<NodeId> {
        tree.iter()
            .filter(|n| is_literal(n.raw_kind))
            .map(|n| n.id)
            .collect()
    }

    #[test]
    fn test_scan_hex_and_px() {
        let source = "const border = '1px solid #ff0000';";
        let tree = parse(source, LanguageVariant::JavaScript).unwrap();
        let patterns = ThemeConfig::default().compiled_patterns();
        let literal = literals(&tree)[0];

        let found = scan_literal(&tree, literal, &patterns, |_| true);
        let subjects: Vec<&str> = found.iter().map(|v| v.subject.as_str()).collect();
        assert_eq!(subjects, vec!["1px", "#ff0000"]);

        let hex = &found[1];
        assert_eq!(&source[hex.span.start..hex.span.end], "#ff0000");
        assert_eq!(hex.range.start.character, source.find('#').unwrap() + 1);
    }

    #[test]
    fn test_scan_template_and_rgb() {
        let source = "const shadow = `0 0 4px rgba(0, 0, 0, 0.5)`;";
        let tree = parse(source, LanguageVariant::JavaScript).unwrap();
        let patterns = ThemeConfig::default().compiled_patterns();
        let literal = literals(&tree)[0];

        let found = scan_literal(&tree, literal, &patterns, |_| true);
        assert_eq!(found.len(), 2);
        assert_eq!(found[1].subject, "rgba(0, 0, 0, 0.5)");
    }

    #[test]
    fn test_substitution_literal_reported_once() {
        let source = "const label = `${'#ff0000'}`;";
        let tree = parse(source, LanguageVariant::JavaScript).unwrap();
        let patterns = ThemeConfig::default().compiled_patterns();

        let found: Vec<(String, usize)> = literals(&tree)
            .into_iter()
            .flat_map(|literal| scan_literal(&tree, literal, &patterns, |_| true))
            .map(|v| (v.subject, v.span.start))
            .collect();
        assert_eq!(found, vec![("#ff0000".to_string(), 18)]);
    }

    #[test]
    fn test_template_text_around_substitution() {
        let source = "const edge = `${size}px solid #000 ${color}`;";
        let tree = parse(source, LanguageVariant::JavaScript).unwrap();
        let patterns = ThemeConfig::default().compiled_patterns();
        let literal = literals(&tree)[0];

        let found = scan_literal(&tree, literal, &patterns, |_| true);
        let subjects: Vec<&str> = found.iter().map(|v| v.subject.as_str()).collect();
        assert_eq!(subjects, vec!["#000"]);
    }

    #[test]
    fn test_scan_respects_scope() {
        let tree = parse("const c = '#fff';", LanguageVariant::JavaScript).unwrap();
        let patterns = ThemeConfig::default().compiled_patterns();
        let literal = literals(&tree)[0];
        assert!(scan_literal(&tree, literal, &patterns, |_| false).is_empty());
    }

    #[test]
    fn test_plain_string_is_clean() {
        let tree = parse("const label = 'Save changes';", LanguageVariant::JavaScript).unwrap();
        let patterns = ThemeConfig::default().compiled_patterns();
        let literal = literals(&tree)[0];
        assert!(scan_literal(&tree, literal, &patterns, |_| true).is_empty());
    }
}
