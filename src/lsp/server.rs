//! Name Analyzer language server implementation

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tokio::sync::{Mutex, RwLock};
use tower_lsp::jsonrpc::Result;
use tower_lsp::lsp_types::*;
use tower_lsp::{Client, LanguageServer};

use crate::config::Config;
use crate::core::syntax::LanguageVariant;
use crate::core::types::{
    Diagnostic as NameDiagnostic, DiagnosticCode, Position as NamePosition, Range as NameRange,
    Severity, DIAGNOSTIC_SOURCE,
};
use crate::fixes::{HttpSuggestionClient, SuggestionService};
use crate::schedule::{DiagnosticQueue, KeyedDebouncer, QueueOutcome};
use crate::session::{AnalysisSession, SourceDocument};

use super::actions::CodeActionProvider;

/// Settings section looked up in `didChangeConfiguration` payloads
const SETTINGS_SECTION: &str = "nameAnalyzer";

/// State shared between request handlers and debounced analyses
struct ServerState {
    client: Client,
    config: RwLock<Arc<Config>>,
    suggestions: RwLock<Option<Arc<dyn SuggestionService>>>,
    /// Open documents, keyed by their exact URI
    documents: DashMap<Url, SourceDocument>,
    sessions: DashMap<Url, Arc<Mutex<AnalysisSession>>>,
    queue: DiagnosticQueue<Url>,
    debouncer: KeyedDebouncer<Url>,
}

impl ServerState {
    async fn session(&self, uri: &Url) -> Arc<Mutex<AnalysisSession>> {
        if let Some(session) = self.sessions.get(uri) {
            return Arc::clone(session.value());
        }

        let config = Arc::clone(&*self.config.read().await);
        let suggestions = self.suggestions.read().await.clone();
        let entry = self
            .sessions
            .entry(uri.clone())
            .or_insert_with(|| Arc::new(Mutex::new(AnalysisSession::new(config, suggestions))));
        Arc::clone(entry.value())
    }

    /// Analyze a document and publish its diagnostics unless a newer pass exists
    async fn analyze_document(&self, uri: &Url) {
        let Some(document) = self.documents.get(uri).map(|d| d.value().clone()) else {
            return;
        };
        let only_changed = self.config.read().await.general.only_check_new_code;
        let session = self.session(uri).await;
        let text = document.text.clone();

        let outcome = self
            .queue
            .enqueue(uri.clone(), async move {
                let mut session = session.lock().await;
                session.provide_diagnostics(&document, only_changed).await
            })
            .await;

        let result = match outcome {
            QueueOutcome::Current(result) => result,
            QueueOutcome::Superseded => {
                tracing::trace!("Dropped stale analysis of {}", uri);
                return;
            }
        };

        // The document may have been closed while this pass was running
        if !self.documents.contains_key(uri) {
            tracing::trace!("Dropped analysis of closed {}", uri);
            self.sessions.remove(uri);
            self.queue.clear_queue(uri);
            return;
        }

        match &*result {
            Ok(diagnostics) => {
                let lines = Utf16Lines::new(&text);
                let lsp_diagnostics = diagnostics
                    .iter()
                    .map(|d| to_lsp_diagnostic(d, &lines))
                    .collect();
                self.client
                    .publish_diagnostics(uri.clone(), lsp_diagnostics, None)
                    .await;
            }
            Err(e) => tracing::warn!("Analysis of {} failed: {}", uri, e),
        }
    }

    /// Install a new configuration and re-analyze open documents
    async fn apply_config(&self, config: Config) {
        let suggestions = build_suggestions(&config);
        self.debouncer
            .set_delay(Duration::from_millis(config.general.debounce_ms));

        let config = Arc::new(config);
        *self.config.write().await = Arc::clone(&config);
        *self.suggestions.write().await = suggestions.clone();

        let sessions: Vec<_> = self
            .sessions
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect();
        for session in sessions {
            session
                .lock()
                .await
                .reconfigure(Arc::clone(&config), suggestions.clone());
        }

        let uris: Vec<Url> = self.documents.iter().map(|d| d.key().clone()).collect();
        for uri in uris {
            self.analyze_document(&uri).await;
        }
    }

    fn forget(&self, uri: &Url) {
        self.queue.clear_queue(uri);
        self.debouncer.remove(uri);
        self.sessions.remove(uri);
        self.documents.remove(uri);
    }
}

/// Name Analyzer language server
pub struct NameLanguageServer {
    state: Arc<ServerState>,
    action_provider: CodeActionProvider,
}

impl NameLanguageServer {
    pub fn new(client: Client) -> Self {
        let config = Config::default();
        let debouncer = KeyedDebouncer::new(Duration::from_millis(config.general.debounce_ms));
        Self {
            state: Arc::new(ServerState {
                client,
                suggestions: RwLock::new(build_suggestions(&config)),
                config: RwLock::new(Arc::new(config)),
                documents: DashMap::new(),
                sessions: DashMap::new(),
                queue: DiagnosticQueue::new(),
                debouncer,
            }),
            action_provider: CodeActionProvider::new(),
        }
    }

    fn open(&self, uri: Url, language_id: &str, text: String) {
        let path = uri.to_file_path().ok();
        let Some(variant) = variant_for(path.as_deref(), language_id) else {
            tracing::debug!("Ignoring {} ({})", uri, language_id);
            return;
        };
        self.state
            .documents
            .insert(uri, SourceDocument::new(path, text, variant));
    }
}

#[tower_lsp::async_trait]
impl LanguageServer for NameLanguageServer {
    async fn initialize(&self, params: InitializeParams) -> Result<InitializeResult> {
        if let Some(config) = initial_config(&params) {
            self.state.apply_config(config).await;
        }

        Ok(InitializeResult {
            capabilities: ServerCapabilities {
                text_document_sync: Some(TextDocumentSyncCapability::Options(
                    TextDocumentSyncOptions {
                        open_close: Some(true),
                        change: Some(TextDocumentSyncKind::FULL),
                        save: Some(TextDocumentSyncSaveOptions::Supported(true)),
                        ..Default::default()
                    },
                )),
                code_action_provider: Some(CodeActionProviderCapability::Options(
                    CodeActionOptions {
                        code_action_kinds: Some(vec![CodeActionKind::QUICKFIX]),
                        work_done_progress_options: WorkDoneProgressOptions::default(),
                        resolve_provider: Some(false),
                    },
                )),
                ..Default::default()
            },
            server_info: Some(ServerInfo {
                name: "name-analyzer".to_string(),
                version: Some(env!("CARGO_PKG_VERSION").to_string()),
            }),
        })
    }

    async fn initialized(&self, _: InitializedParams) {
        self.state
            .client
            .log_message(MessageType::INFO, "Name Analyzer initialized")
            .await;
    }

    async fn shutdown(&self) -> Result<()> {
        Ok(())
    }

    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        let doc = params.text_document;
        let uri = doc.uri.clone();
        self.open(doc.uri, &doc.language_id, doc.text);
        self.state.analyze_document(&uri).await;
    }

    async fn did_change(&self, params: DidChangeTextDocumentParams) {
        let uri = params.text_document.uri;
        // Full sync: the last change holds the whole document
        let Some(change) = params.content_changes.into_iter().last() else {
            return;
        };
        match self.state.documents.get_mut(&uri) {
            Some(mut document) => document.text = change.text,
            None => return,
        }

        let state = Arc::clone(&self.state);
        let key = uri.clone();
        self.state
            .debouncer
            .schedule(uri, move || async move { state.analyze_document(&key).await });
    }

    async fn did_save(&self, params: DidSaveTextDocumentParams) {
        let uri = params.text_document.uri;
        if let Some(text) = params.text {
            if let Some(mut document) = self.state.documents.get_mut(&uri) {
                document.text = text;
            }
        }
        self.state.debouncer.remove(&uri);
        self.state.analyze_document(&uri).await;
    }

    async fn did_close(&self, params: DidCloseTextDocumentParams) {
        let uri = params.text_document.uri;
        self.state.forget(&uri);
        self.state
            .client
            .publish_diagnostics(uri, Vec::new(), None)
            .await;
    }

    async fn did_change_configuration(&self, params: DidChangeConfigurationParams) {
        match Config::from_value(settings_section(params.settings)) {
            Ok(config) => {
                tracing::info!("Configuration updated");
                self.state.apply_config(config).await;
            }
            Err(e) => {
                tracing::warn!("{}", e);
                self.state
                    .client
                    .show_message(MessageType::WARNING, e.to_string())
                    .await;
            }
        }
    }

    async fn code_action(&self, params: CodeActionParams) -> Result<Option<CodeActionResponse>> {
        let uri = params.text_document.uri;
        let Some(document) = self.state.documents.get(&uri).map(|d| d.value().clone()) else {
            return Ok(None);
        };

        let lines = Utf16Lines::new(&document.text);
        let requested: Vec<NameDiagnostic> = params
            .context
            .diagnostics
            .iter()
            .filter(|d| d.source.as_deref() == Some(DIAGNOSTIC_SOURCE))
            .map(|d| from_lsp_diagnostic(d, &lines))
            .collect();
        if requested.is_empty() {
            return Ok(None);
        }

        let session = self.state.session(&uri).await;
        let result = session
            .lock()
            .await
            .provide_code_actions(&document, &requested)
            .await;

        match result {
            Ok(fixes) if fixes.is_empty() => Ok(None),
            Ok(fixes) => Ok(Some(self.action_provider.get_actions(&uri, &lines, &fixes))),
            Err(e) => {
                self.state
                    .client
                    .show_message(MessageType::WARNING, e.to_string())
                    .await;
                Ok(None)
            }
        }
    }
}

/// Configuration from initialization options, else the workspace file
#[allow(deprecated)]
fn initial_config(params: &InitializeParams) -> Option<Config> {
    if let Some(options) = params.initialization_options.clone() {
        match Config::from_value(settings_section(options)) {
            Ok(config) => return Some(config),
            Err(e) => tracing::warn!("Ignoring initialization options: {}", e),
        }
    }

    let root = params
        .workspace_folders
        .as_ref()
        .and_then(|folders| folders.first())
        .map(|folder| &folder.uri)
        .or(params.root_uri.as_ref())?;
    Config::find_and_load(&root.to_file_path().ok()?)
}

/// Unwrap `{ "nameAnalyzer": { .. } }` payloads; pass others through
fn settings_section(settings: serde_json::Value) -> serde_json::Value {
    match settings {
        serde_json::Value::Object(mut map) if map.contains_key(SETTINGS_SECTION) => map
            .remove(SETTINGS_SECTION)
            .unwrap_or(serde_json::Value::Null),
        serde_json::Value::Null => serde_json::Value::Object(Default::default()),
        other => other,
    }
}

fn build_suggestions(config: &Config) -> Option<Arc<dyn SuggestionService>> {
    match HttpSuggestionClient::from_config(&config.suggestions)? {
        Ok(client) => Some(Arc::new(client)),
        Err(e) => {
            tracing::warn!("Suggestion service disabled: {}", e);
            None
        }
    }
}

/// Language of a document, from its extension or the client's language id
fn variant_for(path: Option<&std::path::Path>, language_id: &str) -> Option<LanguageVariant> {
    match language_id {
        "javascript" | "javascriptreact" => Some(LanguageVariant::JavaScript),
        "typescript" => Some(LanguageVariant::TypeScript),
        "typescriptreact" => Some(LanguageVariant::Tsx),
        _ => path.and_then(LanguageVariant::from_path),
    }
}

/// Column mapping between analyzer positions and LSP positions.
///
/// Analyzer columns count code points; LSP columns count UTF-16 code units.
pub(crate) struct Utf16Lines<'a> {
    lines: Vec<&'a str>,
}

impl<'a> Utf16Lines<'a> {
    pub(crate) fn new(text: &'a str) -> Self {
        Self {
            lines: text.split('\n').collect(),
        }
    }

    fn line(&self, line: usize) -> &'a str {
        line.checked_sub(1)
            .and_then(|idx| self.lines.get(idx))
            .copied()
            .unwrap_or("")
    }

    /// 1-based code point position to 0-based UTF-16 position
    pub(crate) fn to_lsp(&self, position: &NamePosition) -> Position {
        let chars = position.character.saturating_sub(1);
        let mut units = 0;
        let mut seen = 0;
        for ch in self.line(position.line).chars().take(chars) {
            units += ch.len_utf16();
            seen += 1;
        }
        // Columns past the end of the line stay one unit per column
        Position {
            line: position.line.saturating_sub(1) as u32,
            character: (units + chars - seen) as u32,
        }
    }

    /// 0-based UTF-16 position to 1-based code point position
    pub(crate) fn from_lsp(&self, position: &Position) -> NamePosition {
        let line = position.line as usize + 1;
        let target = position.character as usize;
        let mut units = 0;
        let mut chars = 0;
        for ch in self.line(line).chars() {
            if units >= target {
                break;
            }
            units += ch.len_utf16();
            chars += 1;
        }
        chars += target.saturating_sub(units);
        NamePosition::new(line, chars + 1)
    }

    pub(crate) fn to_lsp_range(&self, range: &NameRange) -> Range {
        Range {
            start: self.to_lsp(&range.start),
            end: self.to_lsp(&range.end),
        }
    }

    pub(crate) fn from_lsp_range(&self, range: &Range) -> NameRange {
        NameRange::new(self.from_lsp(&range.start), self.from_lsp(&range.end))
    }
}

/// Convert an analyzer diagnostic to an LSP diagnostic
pub(crate) fn to_lsp_diagnostic(diag: &NameDiagnostic, lines: &Utf16Lines) -> Diagnostic {
    Diagnostic {
        range: lines.to_lsp_range(&diag.range),
        severity: Some(to_lsp_severity(diag.severity)),
        code: diag
            .code
            .as_wire()
            .map(|code| NumberOrString::String(code.to_string())),
        code_description: None,
        source: Some(diag.source.clone()),
        message: diag.message.clone(),
        related_information: None,
        tags: None,
        data: None,
    }
}

/// Rebuild an analyzer diagnostic from one the client sent back
fn from_lsp_diagnostic(diag: &Diagnostic, lines: &Utf16Lines) -> NameDiagnostic {
    let code = match &diag.code {
        Some(NumberOrString::String(code)) => Some(code.as_str()),
        _ => None,
    };
    NameDiagnostic {
        range: lines.from_lsp_range(&diag.range),
        message: diag.message.clone(),
        severity: Severity::Warning,
        code: DiagnosticCode::from_wire(code),
        source: diag
            .source
            .clone()
            .unwrap_or_else(|| DIAGNOSTIC_SOURCE.to_string()),
        rule_id: String::new(),
    }
}

fn to_lsp_severity(severity: Severity) -> DiagnosticSeverity {
    match severity {
        Severity::Error => DiagnosticSeverity::ERROR,
        Severity::Warning => DiagnosticSeverity::WARNING,
        Severity::Information => DiagnosticSeverity::INFORMATION,
        Severity::Hint => DiagnosticSeverity::HINT,
    }
}

/// Run the language server
pub async fn run_server() {
    let stdin = tokio::io::stdin();
    let stdout = tokio::io::stdout();

    let (service, socket) = tower_lsp::LspService::new(NameLanguageServer::new);
    tower_lsp::Server::new(stdin, stdout, socket)
        .serve(service)
        .await;
}
