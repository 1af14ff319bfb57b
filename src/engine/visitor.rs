//! Single-pass traversal dispatching rule checks per node kind

use std::collections::HashSet;

use regex::Regex;

use crate::config::Config;
use crate::core::changes::ChangeSet;
use crate::core::syntax::{NodeId, NodeKind, SyntaxTree};
use crate::core::types::{Violation, REDUNDANT_COMMENT_RULE_ID};

use super::naming::{BindingKind, NameRules, NameSite};
use super::{comments, theme, EvaluationStats, RuleEvaluationError};

/// A bound identifier and whether its value is boolean
type Binding = (NodeId, bool);

pub(crate) struct Walker<'a> {
    tree: &'a SyntaxTree,
    config: &'a Config,
    changes: Option<&'a ChangeSet>,
    rules: NameRules<'a>,
    theme_patterns: &'a [Regex],
    /// Functions already evaluated at their binding site
    visited: HashSet<NodeId>,
    pub violations: Vec<Violation>,
    pub errors: Vec<RuleEvaluationError>,
    pub stats: EvaluationStats,
}

impl<'a> Walker<'a> {
    pub fn new(
        tree: &'a SyntaxTree,
        config: &'a Config,
        changes: Option<&'a ChangeSet>,
        theme_patterns: &'a [Regex],
    ) -> Self {
        Self {
            tree,
            config,
            changes,
            rules: NameRules::new(config),
            theme_patterns,
            visited: HashSet::new(),
            violations: Vec::new(),
            errors: Vec::new(),
            stats: EvaluationStats::default(),
        }
    }

    fn in_scope(&self, line: usize) -> bool {
        self.changes.map_or(true, |c| c.contains(line))
    }

    /// Pre-order walk over the whole tree
    pub fn walk(&mut self) {
        if self.tree.is_empty() {
            return;
        }
        let mut stack = vec![self.tree.root()];
        while let Some(id) = stack.pop() {
            self.stats.nodes_visited += 1;
            if let Err(e) = self.visit(id) {
                tracing::debug!("Skipping node: {}", e);
                self.errors.push(e);
            }
            stack.extend(self.tree.children(id).iter().rev().copied());
        }
    }

    fn visit(&mut self, id: NodeId) -> Result<(), RuleEvaluationError> {
        let tree = self.tree;
        let node = tree.node(id);
        match node.kind {
            NodeKind::VariableDeclarator => self.visit_declarator(id),
            NodeKind::FunctionDeclaration | NodeKind::FunctionExpression => {
                if !self.visited.insert(id) {
                    return Ok(());
                }
                let name = tree.child_by_field(id, "name");
                if name.is_none() && node.kind == NodeKind::FunctionDeclaration {
                    return Err(RuleEvaluationError::missing(tree, id, "name"));
                }
                self.evaluate_function(id, name)
            }
            NodeKind::ArrowFunction | NodeKind::MethodDefinition => {
                if !self.visited.insert(id) {
                    return Ok(());
                }
                self.evaluate_function(id, None)
            }
            NodeKind::ObjectProperty => self.visit_pair(id),
            NodeKind::ShorthandProperty => {
                let site = self.site(id)?;
                if self.in_scope(site.range.start.line) {
                    let found = self.rules.check_binding(site, BindingKind::Property, false);
                    self.violations.extend(found);
                }
                Ok(())
            }
            NodeKind::Comment => {
                if self.config.comments.flag_redundant
                    && self.config.is_rule_enabled(REDUNDANT_COMMENT_RULE_ID)
                    && self.in_scope(node.start_line())
                {
                    if let Some(v) = comments::check_comment(tree, id, &self.config.comments) {
                        self.violations.push(v);
                    }
                }
                Ok(())
            }
            NodeKind::Other => {
                if theme::is_literal(node.raw_kind) && self.scans_literal(id) {
                    let found = theme::scan_literal(tree, id, self.theme_patterns, |line| {
                        self.in_scope(line)
                    });
                    self.violations.extend(found);
                }
                Ok(())
            }
        }
    }

    fn scans_literal(&self, id: NodeId) -> bool {
        if !self.config.theme.enabled || self.theme_patterns.is_empty() {
            return false;
        }
        // Module specifiers and quoted keys are not values
        !matches!(self.tree.node(id).field, Some("source") | Some("key"))
    }

    fn site(&self, id: NodeId) -> Result<NameSite<'a>, RuleEvaluationError> {
        let tree: &'a SyntaxTree = self.tree;
        let node = tree.node(id);
        let name = tree.text(id);
        if name.is_empty() || node.span.is_empty() {
            return Err(RuleEvaluationError::EmptyName {
                line: node.start_line(),
            });
        }
        Ok(NameSite {
            name,
            span: node.span,
            range: node.range,
        })
    }

    fn visit_declarator(&mut self, id: NodeId) -> Result<(), RuleEvaluationError> {
        let tree = self.tree;
        let name = tree
            .child_by_field(id, "name")
            .ok_or_else(|| RuleEvaluationError::missing(tree, id, "name"))?;
        let value = tree.child_by_field(id, "value");
        let annotated_boolean = tree
            .child_by_field(id, "type")
            .is_some_and(|t| is_boolean_annotation(tree.text(t)));
        let is_boolean = annotated_boolean || value.is_some_and(|v| self.is_boolean_value(v));

        if self.in_scope(tree.node(id).start_line()) {
            for (ident, boolean) in self.bindings(name, is_boolean) {
                let site = self.site(ident)?;
                let found = self
                    .rules
                    .check_binding(site, BindingKind::Declaration, boolean);
                self.violations.extend(found);
            }
        }

        if let Some(value) = value {
            let kind = tree.node(value).kind;
            if matches!(kind, NodeKind::ArrowFunction | NodeKind::FunctionExpression)
                && tree.node(name).raw_kind == "identifier"
                && self.visited.insert(value)
            {
                self.evaluate_function(value, Some(name))?;
            }
        }
        Ok(())
    }

    fn visit_pair(&mut self, id: NodeId) -> Result<(), RuleEvaluationError> {
        let tree = self.tree;
        let key = tree
            .child_by_field(id, "key")
            .ok_or_else(|| RuleEvaluationError::missing(tree, id, "key"))?;
        if tree.node(key).raw_kind != "property_identifier" {
            return Ok(());
        }
        if !self.in_scope(tree.node(id).start_line()) {
            return Ok(());
        }
        let is_boolean = tree
            .child_by_field(id, "value")
            .is_some_and(|v| self.is_boolean_value(v));
        let site = self.site(key)?;
        let found = self
            .rules
            .check_binding(site, BindingKind::Property, is_boolean);
        self.violations.extend(found);
        Ok(())
    }

    /// Check a function's name (if bound) and its parameters
    fn evaluate_function(
        &mut self,
        func: NodeId,
        name: Option<NodeId>,
    ) -> Result<(), RuleEvaluationError> {
        let tree = self.tree;
        self.stats.function_checks += 1;

        if let Some(name) = name {
            // Bound function expressions gate on the declarator line
            let gate_line = match tree.parent(name) {
                Some(p) if tree.node(p).kind == NodeKind::VariableDeclarator => {
                    tree.node(p).start_line()
                }
                _ => tree.node(func).start_line(),
            };
            if self.in_scope(gate_line) {
                let site = self.site(name)?;
                let body_lines = tree
                    .child_by_field(func, "body")
                    .map(|b| tree.node(b).end_line() - tree.node(b).start_line() + 1);
                let found = self.rules.check_function(site, body_lines);
                self.violations.extend(found);
            }
        }

        let params: Vec<NodeId> = match tree.child_by_field(func, "parameters") {
            Some(list) => tree
                .children(list)
                .iter()
                .copied()
                .filter(|c| tree.node(*c).kind != NodeKind::Comment)
                .collect(),
            // `x => x`
            None => tree.child_by_field(func, "parameter").into_iter().collect(),
        };
        for param in params {
            if !self.in_scope(tree.node(param).start_line()) {
                continue;
            }
            for (ident, boolean) in self.parameter_bindings(param) {
                let site = self.site(ident)?;
                let found = self.rules.check_binding(site, BindingKind::Parameter, boolean);
                self.violations.extend(found);
            }
        }
        Ok(())
    }

    fn parameter_bindings(&self, param: NodeId) -> Vec<Binding> {
        let tree = self.tree;
        match tree.node(param).raw_kind {
            "required_parameter" | "optional_parameter" => {
                let Some(pattern) = tree.child_by_field(param, "pattern") else {
                    return Vec::new();
                };
                let boolean = tree
                    .child_by_field(param, "type")
                    .is_some_and(|t| is_boolean_annotation(tree.text(t)))
                    || tree
                        .child_by_field(param, "value")
                        .is_some_and(|v| self.is_boolean_value(v));
                self.bindings(pattern, boolean)
            }
            _ => self.bindings(param, false),
        }
    }

    /// Identifiers bound by a name or destructuring pattern
    fn bindings(&self, pattern: NodeId, is_boolean: bool) -> Vec<Binding> {
        let tree = self.tree;
        let mut out = Vec::new();
        let mut stack = vec![(pattern, is_boolean)];

        while let Some((id, boolean)) = stack.pop() {
            let node = tree.node(id);
            match node.raw_kind {
                "identifier" | "shorthand_property_identifier_pattern" => out.push((id, boolean)),
                "assignment_pattern" | "object_assignment_pattern" => {
                    let default_boolean = tree
                        .child_by_field(id, "right")
                        .is_some_and(|r| self.is_boolean_value(r));
                    if let Some(left) = tree.child_by_field(id, "left") {
                        stack.push((left, default_boolean));
                    }
                }
                "pair_pattern" => {
                    if let Some(value) = tree.child_by_field(id, "value") {
                        stack.push((value, false));
                    }
                }
                "object_pattern" | "array_pattern" | "rest_pattern" => {
                    for child in tree.children(id).iter().rev() {
                        stack.push((*child, false));
                    }
                }
                _ => {}
            }
        }
        out
    }

    fn is_boolean_value(&self, id: NodeId) -> bool {
        let tree = self.tree;
        let node = tree.node(id);
        match node.raw_kind {
            "true" | "false" => true,
            "unary_expression" => tree.text(id).starts_with('!'),
            "parenthesized_expression" => tree
                .children(id)
                .first()
                .is_some_and(|inner| self.is_boolean_value(*inner)),
            _ => false,
        }
    }
}

fn is_boolean_annotation(text: &str) -> bool {
    text.trim_start_matches(':').trim() == "boolean"
}
