//! Redundant comment detection
//!
//! A leading comment is redundant when it is short and mostly repeats the
//! identifiers on the first line of the code it annotates:
//!
//! ```text
//! // get user name
//! const userName = getUser().name;
//! ```

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::config::CommentsConfig;
use crate::core::syntax::{NodeId, SyntaxTree};
use crate::core::types::Violation;

use super::words::split_words;

static IDENTIFIER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[A-Za-z_$][A-Za-z0-9_$]*").expect("identifier regex"));

static WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"[A-Za-z][A-Za-z']*").expect("word regex"));

static MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(?:TODO|FIXME|HACK|XXX|NOTE)\b").expect("marker regex"));

const DIRECTIVE_PREFIXES: &[&str] = &[
    "eslint",
    "@ts-",
    "prettier-ignore",
    "istanbul",
    "jshint",
    "global ",
    "#region",
    "#endregion",
    "/ <reference",
    "@jsx",
    "webpackChunkName",
];

const STOP_WORDS: &[&str] = &[
    "a", "an", "the", "to", "of", "and", "or", "for", "in", "on", "at", "by", "with", "from",
    "as", "is", "it", "be", "this", "that", "we", "our", "then", "here", "into", "its",
];

/// Comment body without delimiters
fn comment_body(raw: &str) -> &str {
    let body = raw
        .strip_prefix("//")
        .or_else(|| {
            raw.strip_prefix("/*")
                .map(|b| b.strip_suffix("*/").unwrap_or(b))
        })
        .unwrap_or(raw);
    body.trim_start_matches(['*', '!']).trim()
}

fn is_directive(body: &str) -> bool {
    DIRECTIVE_PREFIXES.iter().any(|p| body.starts_with(p)) || MARKER.is_match(body)
}

/// Whether the comment sits alone on its line and directly precedes a node
fn annotated_node(tree: &SyntaxTree, comment: NodeId) -> Option<NodeId> {
    let node = tree.node(comment);
    if let Some(prev) = tree.prev_sibling(comment) {
        if tree.node(prev).end_line() == node.start_line() {
            return None;
        }
    }
    let next = tree.next_sibling(comment)?;
    let next_node = tree.node(next);
    if next_node.kind == crate::core::syntax::NodeKind::Comment
        || next_node.start_line() != node.end_line() + 1
    {
        return None;
    }
    Some(next)
}

/// Evaluate one comment node
pub fn check_comment(
    tree: &SyntaxTree,
    comment: NodeId,
    config: &CommentsConfig,
) -> Option<Violation> {
    let annotated = annotated_node(tree, comment)?;
    let raw = tree.text(comment);
    let body = comment_body(raw);
    if body.is_empty() || is_directive(body) {
        return None;
    }

    let words: Vec<String> = WORD
        .find_iter(body)
        .map(|m| m.as_str().to_lowercase().replace('\'', ""))
        .collect();
    if words.is_empty() || words.len() > config.max_words {
        return None;
    }
    let meaningful: Vec<&String> = words
        .iter()
        .filter(|w| !STOP_WORDS.contains(&w.as_str()))
        .collect();
    if meaningful.is_empty() {
        return None;
    }

    let code = tree.text(annotated);
    let first_line = code.lines().next().unwrap_or("");
    let code_words: HashSet<String> = IDENTIFIER
        .find_iter(first_line)
        .flat_map(|m| split_words(m.as_str()))
        .collect();

    let matched = meaningful
        .iter()
        .filter(|w| {
            code_words.contains(w.as_str())
                || w.strip_suffix('s')
                    .is_some_and(|stem| code_words.contains(stem))
        })
        .count();
    let ratio = matched as f64 / meaningful.len() as f64;
    if ratio < config.redundancy_threshold {
        return None;
    }

    let node = tree.node(comment);
    Some(Violation::redundant_comment(
        raw,
        node.span,
        node.range,
        "Comment restates the code that follows. Remove it or explain why.",
    ))
}
