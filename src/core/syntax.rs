//! Syntax tree provider
//!
//! Parses JavaScript and TypeScript sources with tree-sitter and copies the
//! named nodes into an arena. Rules address nodes by [`NodeId`], an index into
//! that arena, so identity stays stable for the lifetime of the tree.
//!
//! Parsing is error-tolerant: malformed input still produces a tree, and the
//! recovery points are reported as [`SyntaxIssue`]s.
//!
//! # Example
//!
//! ```
//! use name_analyzer::core::syntax::{parse, LanguageVariant, NodeKind};
//!
//! let tree = parse("const ready = true;", LanguageVariant::JavaScript).unwrap();
//! let declarator = tree
//!     .iter()
//!     .find(|n| n.kind == NodeKind::VariableDeclarator)
//!     .unwrap();
//! assert_eq!(tree.text(declarator.id), "ready = true");
//! ```

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tree_sitter::Parser;

use super::types::{LineIndex, Position, Range, Span};

/// Source language flavour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LanguageVariant {
    /// JavaScript, including JSX
    JavaScript,
    /// TypeScript
    TypeScript,
    /// TypeScript with JSX
    Tsx,
}

impl LanguageVariant {
    /// Pick a variant from a file extension
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "js" | "jsx" | "mjs" | "cjs" => Some(Self::JavaScript),
            "ts" | "mts" | "cts" => Some(Self::TypeScript),
            "tsx" => Some(Self::Tsx),
            _ => None,
        }
    }

    /// Whether typed-language constructs are enabled
    pub fn is_typed(&self) -> bool {
        matches!(self, Self::TypeScript | Self::Tsx)
    }

    fn grammar(&self) -> tree_sitter::Language {
        match self {
            Self::JavaScript => tree_sitter_javascript::LANGUAGE.into(),
            Self::TypeScript => tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
            Self::Tsx => tree_sitter_typescript::LANGUAGE_TSX.into(),
        }
    }
}

impl fmt::Display for LanguageVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::JavaScript => write!(f, "javascript"),
            Self::TypeScript => write!(f, "typescript"),
            Self::Tsx => write!(f, "tsx"),
        }
    }
}

/// Parse failures beyond recovery
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("Failed to load {variant} grammar: {message}")]
    Grammar {
        variant: LanguageVariant,
        message: String,
    },
    #[error("Parser produced no tree for {0} source")]
    NoTree(LanguageVariant),
}

/// Index of a node in its tree's arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(&self) -> usize {
        self.0
    }
}

/// Node shapes the rule engine dispatches on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    VariableDeclarator,
    FunctionDeclaration,
    FunctionExpression,
    ArrowFunction,
    MethodDefinition,
    ObjectProperty,
    ShorthandProperty,
    Comment,
    Other,
}

impl NodeKind {
    fn classify(raw: &str) -> Self {
        match raw {
            "variable_declarator" => Self::VariableDeclarator,
            "function_declaration" | "generator_function_declaration" => {
                Self::FunctionDeclaration
            }
            "function_expression" | "function" | "generator_function" => Self::FunctionExpression,
            "arrow_function" => Self::ArrowFunction,
            "method_definition" => Self::MethodDefinition,
            "pair" => Self::ObjectProperty,
            "shorthand_property_identifier" => Self::ShorthandProperty,
            "comment" => Self::Comment,
            _ => Self::Other,
        }
    }

    /// Any function-like node
    pub fn is_function(&self) -> bool {
        matches!(
            self,
            Self::FunctionDeclaration
                | Self::FunctionExpression
                | Self::ArrowFunction
                | Self::MethodDefinition
        )
    }
}

/// A named syntax node
#[derive(Debug, Clone)]
pub struct SyntaxNode {
    pub id: NodeId,
    pub kind: NodeKind,
    /// Grammar node type (e.g., "lexical_declaration")
    pub raw_kind: &'static str,
    /// Field name under the parent (e.g., "name", "value")
    pub field: Option<&'static str>,
    pub span: Span,
    pub range: Range,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
}

impl SyntaxNode {
    pub fn start_line(&self) -> usize {
        self.range.start.line
    }

    pub fn end_line(&self) -> usize {
        self.range.end.line
    }
}

/// A recovery point reported by the parser
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxIssue {
    pub range: Range,
    pub message: String,
}

/// Arena-backed syntax tree
#[derive(Debug, Clone)]
pub struct SyntaxTree {
    source: String,
    variant: LanguageVariant,
    nodes: Vec<SyntaxNode>,
    issues: Vec<SyntaxIssue>,
    lines: LineIndex,
}

/// Parse source text into a syntax tree
pub fn parse(text: &str, variant: LanguageVariant) -> Result<SyntaxTree, ParseError> {
    let mut parser = Parser::new();
    parser
        .set_language(&variant.grammar())
        .map_err(|e| ParseError::Grammar {
            variant,
            message: e.to_string(),
        })?;

    let tree = parser.parse(text, None).ok_or(ParseError::NoTree(variant))?;
    let lines = LineIndex::new(text);

    let mut nodes: Vec<SyntaxNode> = Vec::new();
    let mut issues = Vec::new();

    // (node, nearest named ancestor, field name under the direct parent)
    let mut stack = vec![(tree.root_node(), None::<NodeId>, None::<&'static str>)];

    while let Some((node, parent, field)) = stack.pop() {
        let span = Span::new(node.start_byte(), node.end_byte());
        let range = Range::new(
            lines.position(text, span.start),
            lines.position(text, span.end),
        );

        if node.is_error() {
            issues.push(SyntaxIssue {
                range,
                message: "Syntax error".to_string(),
            });
        } else if node.is_missing() {
            issues.push(SyntaxIssue {
                range,
                message: format!("Missing '{}'", node.kind()),
            });
        }

        let mut next_parent = parent;
        if node.is_named() {
            let id = NodeId(nodes.len());
            nodes.push(SyntaxNode {
                id,
                kind: NodeKind::classify(node.kind()),
                raw_kind: node.kind(),
                field,
                span,
                range,
                parent,
                children: Vec::new(),
            });
            if let Some(parent) = parent {
                nodes[parent.0].children.push(id);
            }
            next_parent = Some(id);
        }

        let mut cursor = node.walk();
        let mut children = Vec::new();
        if cursor.goto_first_child() {
            loop {
                children.push((cursor.node(), next_parent, cursor.field_name()));
                if !cursor.goto_next_sibling() {
                    break;
                }
            }
        }
        // Reverse so the arena is filled in document order
        stack.extend(children.into_iter().rev());
    }

    Ok(SyntaxTree {
        source: text.to_string(),
        variant,
        nodes,
        issues,
        lines,
    })
}

impl SyntaxTree {
    /// The root (program) node
    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn node(&self, id: NodeId) -> &SyntaxNode {
        &self.nodes[id.0]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn variant(&self) -> LanguageVariant {
        self.variant
    }

    /// Recovery points found while parsing
    pub fn syntax_issues(&self) -> &[SyntaxIssue] {
        &self.issues
    }

    pub fn has_errors(&self) -> bool {
        !self.issues.is_empty()
    }

    /// Nodes in document (pre-)order
    pub fn iter(&self) -> impl Iterator<Item = &SyntaxNode> {
        self.nodes.iter()
    }

    /// Source text of a node
    pub fn text(&self, id: NodeId) -> &str {
        let span = self.nodes[id.0].span;
        self.source.get(span.start..span.end).unwrap_or("")
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    /// First child stored under the given field name
    pub fn child_by_field(&self, id: NodeId, field: &str) -> Option<NodeId> {
        self.children(id)
            .iter()
            .copied()
            .find(|c| self.nodes[c.0].field == Some(field))
    }

    /// First child of the given grammar type
    pub fn child_of_kind(&self, id: NodeId, raw_kind: &str) -> Option<NodeId> {
        self.children(id)
            .iter()
            .copied()
            .find(|c| self.nodes[c.0].raw_kind == raw_kind)
    }

    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let siblings = self.children(parent);
        let pos = siblings.iter().position(|s| *s == id)?;
        siblings.get(pos + 1).copied()
    }

    pub fn prev_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let siblings = self.children(parent);
        let pos = siblings.iter().position(|s| *s == id)?;
        pos.checked_sub(1).and_then(|p| siblings.get(p).copied())
    }

    /// Convert a byte offset in the source to a position
    pub fn position(&self, offset: usize) -> Position {
        self.lines.position(&self.source, offset)
    }

    /// Convert a byte span in the source to a range
    pub fn range(&self, span: Span) -> Range {
        Range::new(self.position(span.start), self.position(span.end))
    }
}
