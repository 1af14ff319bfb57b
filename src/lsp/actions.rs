//! Code actions for LSP quick fixes

use std::collections::HashMap;

use serde_json::json;
use tower_lsp::lsp_types::*;

use crate::core::types::FixAction;
use crate::session::QuickFix;

use super::server::{to_lsp_diagnostic, Utf16Lines};

/// Client command that opens the inline rename box
pub const RENAME_COMMAND: &str = "editor.action.rename";

/// Turns synthesized fixes into code actions
#[derive(Debug, Default)]
pub struct CodeActionProvider;

impl CodeActionProvider {
    pub fn new() -> Self {
        Self
    }

    /// Get code actions for the given quick fixes
    pub(crate) fn get_actions(
        &self,
        uri: &Url,
        lines: &Utf16Lines,
        fixes: &[QuickFix],
    ) -> Vec<CodeActionOrCommand> {
        fixes
            .iter()
            .map(|fix| CodeActionOrCommand::CodeAction(self.fix_to_code_action(uri, lines, fix)))
            .collect()
    }

    fn fix_to_code_action(&self, uri: &Url, lines: &Utf16Lines, quick_fix: &QuickFix) -> CodeAction {
        let fix = &quick_fix.fix;
        let (edit, command) = match &fix.action {
            FixAction::ReplaceText { range, new_text } => {
                let mut changes = HashMap::new();
                changes.insert(
                    uri.clone(),
                    vec![TextEdit {
                        range: lines.to_lsp_range(range),
                        new_text: new_text.clone(),
                    }],
                );
                let edit = WorkspaceEdit {
                    changes: Some(changes),
                    document_changes: None,
                    change_annotations: None,
                };
                (Some(edit), None)
            }
            FixAction::PromptRename { range, .. } => {
                let start = lines.to_lsp(&range.start);
                let command = Command {
                    title: fix.description.clone(),
                    command: RENAME_COMMAND.to_string(),
                    arguments: Some(vec![
                        json!(uri.as_str()),
                        json!({ "line": start.line, "character": start.character }),
                    ]),
                };
                (None, Some(command))
            }
        };

        CodeAction {
            title: fix.description.clone(),
            kind: Some(CodeActionKind::QUICKFIX),
            diagnostics: Some(vec![to_lsp_diagnostic(&quick_fix.diagnostic, lines)]),
            edit,
            command,
            is_preferred: Some(!fix.requires_input()),
            disabled: None,
            data: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::core::types::{
        Diagnostic as NameDiagnostic, DiagnosticCode, Fix, Position as NamePosition,
        Range as NameRange, Severity, DIAGNOSTIC_SOURCE,
    };

    fn quick_fix(action: FixAction) -> QuickFix {
        let range = NameRange::new(NamePosition::new(2, 5), NamePosition::new(2, 10));
        QuickFix {
            diagnostic: NameDiagnostic {
                range,
                message: "Boolean 'ready' should start with a prefix".to_string(),
                severity: Severity::Warning,
                code: DiagnosticCode::NamingConventionViolation,
                source: DIAGNOSTIC_SOURCE.to_string(),
                rule_id: "BOOL-001".to_string(),
            },
            fix: Arc::new(Fix::new("Rename to 'isReady'", action)),
        }
    }

    fn uri() -> Url {
        Url::parse("file:///work/app.js").unwrap()
    }

    #[test]
    fn test_replace_becomes_workspace_edit() {
        let range = NameRange::new(NamePosition::new(2, 5), NamePosition::new(2, 10));
        let fix = quick_fix(FixAction::ReplaceText {
            range,
            new_text: "isReady".to_string(),
        });

        let actions = CodeActionProvider::new().get_actions(&uri(), &Utf16Lines::new(""), &[fix]);
        assert_eq!(actions.len(), 1);
        let CodeActionOrCommand::CodeAction(action) = &actions[0] else {
            panic!("expected a code action");
        };

        assert_eq!(action.kind, Some(CodeActionKind::QUICKFIX));
        assert_eq!(action.is_preferred, Some(true));
        assert!(action.command.is_none());
        let changes = action.edit.as_ref().unwrap().changes.as_ref().unwrap();
        let edits = &changes[&uri()];
        assert_eq!(edits[0].new_text, "isReady");
        assert_eq!(edits[0].range.start, Position::new(1, 4));
        assert_eq!(edits[0].range.end, Position::new(1, 9));
    }

    #[test]
    fn test_prompt_becomes_rename_command() {
        let range = NameRange::new(NamePosition::new(3, 7), NamePosition::new(3, 8));
        let fix = quick_fix(FixAction::PromptRename {
            range,
            placeholder: "a".to_string(),
        });

        let actions = CodeActionProvider::new().get_actions(&uri(), &Utf16Lines::new(""), &[fix]);
        let CodeActionOrCommand::CodeAction(action) = &actions[0] else {
            panic!("expected a code action");
        };

        assert!(action.edit.is_none());
        assert_eq!(action.is_preferred, Some(false));
        let command = action.command.as_ref().unwrap();
        assert_eq!(command.command, RENAME_COMMAND);
        let args = command.arguments.as_ref().unwrap();
        assert_eq!(args[0], json!("file:///work/app.js"));
        assert_eq!(args[1], json!({ "line": 2, "character": 6 }));
    }

    #[test]
    fn test_replace_range_after_emoji() {
        let text = "let x = 1;\nconst s = '\u{1F600}'; let ready = true;\n";
        let range = NameRange::new(NamePosition::new(2, 20), NamePosition::new(2, 25));
        let fix = quick_fix(FixAction::ReplaceText {
            range,
            new_text: "isReady".to_string(),
        });

        let actions = CodeActionProvider::new().get_actions(&uri(), &Utf16Lines::new(text), &[fix]);
        let CodeActionOrCommand::CodeAction(action) = &actions[0] else {
            panic!("expected a code action");
        };
        let changes = action.edit.as_ref().unwrap().changes.as_ref().unwrap();
        let edit = &changes[&uri()][0];
        assert_eq!(edit.range.start, Position::new(1, 20));
        assert_eq!(edit.range.end, Position::new(1, 25));
    }

    #[test]
    fn test_action_carries_diagnostic() {
        let range = NameRange::new(NamePosition::new(2, 5), NamePosition::new(2, 10));
        let fix = quick_fix(FixAction::ReplaceText {
            range,
            new_text: "isReady".to_string(),
        });

        let actions = CodeActionProvider::new().get_actions(&uri(), &Utf16Lines::new(""), &[fix]);
        let CodeActionOrCommand::CodeAction(action) = &actions[0] else {
            panic!("expected a code action");
        };
        let diagnostics = action.diagnostics.as_ref().unwrap();
        assert_eq!(
            diagnostics[0].code,
            Some(NumberOrString::String("namingConventionViolation".to_string()))
        );
    }
}
