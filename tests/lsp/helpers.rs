//! Test helpers for LSP integration testing
//!
//! This module provides utilities to test LSP functionality in-memory
//! without spawning the binary or dealing with stdio protocol.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use serde_json::Value;
use tower::{Service, ServiceExt};
use tower_lsp_server::jsonrpc::Request;
use tower_lsp_server::ls_types::*;
use tower_lsp_server::{LanguageServer, LspService};

use ytt_lint_lsp::lsp::YttLintLsp;
use ytt_lint_lsp::report::Finding;
use ytt_lint_lsp::{Config, ConfigBuilder, ReconcileMode};

/// Test harness for LSP integration tests.
///
/// Wraps a `YttLintLsp` instance created via `LspService::new`. The
/// handshake goes through the service so the client is marked initialized
/// and its notifications reach the socket, which is drained into
/// `client_messages`.
pub struct TestLspServer {
    lsp: Arc<YttLintLsp>,
    service: tokio::sync::Mutex<LspService<LspWrapper>>,
    client_messages: Arc<std::sync::Mutex<Vec<Request>>>,
}

impl TestLspServer {
    /// Server with default configuration. Linting needs ytt-lint on PATH.
    pub fn new() -> Self {
        Self::build(None)
    }

    /// Server using `config` instead of discovering a config file.
    pub fn with_config(config: Config) -> Self {
        Self::build(Some(config))
    }

    /// Server running `linter` with a short debounce.
    pub fn with_linter(linter: &Path, mode: ReconcileMode) -> Self {
        Self::with_config(
            ConfigBuilder::default()
                .executable(linter)
                .schema_path("/schemas")
                .debounce_ms(20)
                .timeout_secs(10)
                .reconcile(mode)
                .build(),
        )
    }

    fn build(config: Option<Config>) -> Self {
        // Use Arc to share ownership between the closure and our return value
        let lsp_arc: Arc<std::sync::Mutex<Option<Arc<YttLintLsp>>>> =
            Arc::new(std::sync::Mutex::new(None));
        let lsp_arc_clone = Arc::clone(&lsp_arc);

        let (service, mut socket) = LspService::new(move |client| {
            let lsp = match config {
                Some(config) => YttLintLsp::with_config(client, config),
                None => YttLintLsp::new(client),
            };
            let lsp = Arc::new(lsp);
            *lsp_arc_clone.lock().unwrap() = Some(Arc::clone(&lsp));

            LspWrapper { inner: lsp }
        });

        let lsp = lsp_arc
            .lock()
            .unwrap()
            .take()
            .expect("YttLintLsp should have been initialized");

        let client_messages = Arc::new(std::sync::Mutex::new(Vec::new()));
        let received = Arc::clone(&client_messages);
        tokio::spawn(async move {
            while let Some(request) = socket.next().await {
                received.lock().unwrap().push(request);
            }
        });

        Self {
            lsp,
            service: tokio::sync::Mutex::new(service),
            client_messages,
        }
    }

    async fn call(&self, request: Request) -> Option<Value> {
        let mut service = self.service.lock().await;
        let response = service
            .ready()
            .await
            .unwrap()
            .call(request)
            .await
            .unwrap()?;
        let (_, result) = response.into_parts();
        Some(result.unwrap())
    }

    /// Simulates the `initialize` request with the given workspace folders.
    pub async fn initialize(&self, folders: &[&Path]) -> InitializeResult {
        let workspace_folders = folders
            .iter()
            .map(|path| WorkspaceFolder {
                uri: file_uri(path).parse().unwrap(),
                name: path.display().to_string(),
            })
            .collect();
        let params = InitializeParams {
            workspace_folders: Some(workspace_folders),
            ..Default::default()
        };

        let request = Request::build("initialize")
            .params(serde_json::to_value(params).unwrap())
            .id(1)
            .finish();
        let result = self.call(request).await.unwrap();
        serde_json::from_value(result).unwrap()
    }

    /// Simulates the `initialized` notification.
    pub async fn initialized(&self) {
        let request = Request::build("initialized")
            .params(serde_json::json!({}))
            .finish();
        self.call(request).await;
    }

    pub async fn shutdown(&self) {
        self.lsp.shutdown().await.unwrap();
    }

    /// Simulates the `textDocument/didOpen` notification.
    pub async fn open_document(&self, uri: &str, content: &str, language_id: &str) {
        let params = DidOpenTextDocumentParams {
            text_document: TextDocumentItem {
                uri: uri.parse().unwrap(),
                language_id: language_id.to_string(),
                version: 0,
                text: content.to_string(),
            },
        };

        self.lsp.did_open(params).await;
    }

    /// Simulates the `textDocument/didClose` notification.
    pub async fn close_document(&self, uri: &str) {
        let params = DidCloseTextDocumentParams {
            text_document: TextDocumentIdentifier {
                uri: uri.parse().unwrap(),
            },
        };

        self.lsp.did_close(params).await;
    }

    /// Simulates the `textDocument/didChange` notification with INCREMENTAL sync.
    pub async fn edit_document(&self, uri: &str, changes: Vec<TextDocumentContentChangeEvent>) {
        let params = DidChangeTextDocumentParams {
            text_document: VersionedTextDocumentIdentifier {
                uri: uri.parse().unwrap(),
                version: 1,
            },
            content_changes: changes,
        };

        self.lsp.did_change(params).await;
    }

    /// Simulates `workspace/didChangeWorkspaceFolders`.
    pub async fn change_workspace_folders(&self, added: &[&Path], removed: &[&Path]) {
        let folders = |paths: &[&Path]| {
            paths
                .iter()
                .map(|path| WorkspaceFolder {
                    uri: file_uri(path).parse().unwrap(),
                    name: path.display().to_string(),
                })
                .collect()
        };
        let params = DidChangeWorkspaceFoldersParams {
            event: WorkspaceFoldersChangeEvent {
                added: folders(added),
                removed: folders(removed),
            },
        };

        self.lsp.did_change_workspace_folders(params).await;
    }

    /// Simulates `workspace/executeCommand`.
    pub async fn execute_command(
        &self,
        command: &str,
        arguments: Vec<Value>,
    ) -> tower_lsp_server::jsonrpc::Result<Option<Value>> {
        let params = ExecuteCommandParams {
            command: command.to_string(),
            arguments,
            work_done_progress_params: WorkDoneProgressParams::default(),
        };

        self.lsp.execute_command(params).await
    }

    /// Get the current content of a document from the server's state.
    pub async fn get_document_content(&self, uri: &str) -> Option<String> {
        let doc_map = self.lsp.document_map();
        let docs = doc_map.lock().await;
        docs.get(uri).map(|state| state.text.clone())
    }

    /// Findings currently published for `uri`.
    pub async fn findings(&self, uri: &str) -> Vec<Finding> {
        let store = self.lsp.diagnostics();
        let store = store.lock().await;
        store.findings(uri).to_vec()
    }

    /// URIs that currently have findings, sorted.
    pub async fn documents_with_findings(&self) -> Vec<String> {
        let store = self.lsp.diagnostics();
        let store = store.lock().await;
        store.snapshot().into_iter().map(|(uri, _)| uri).collect()
    }

    pub async fn is_open_in_store(&self, uri: &str) -> bool {
        self.lsp.diagnostics().lock().await.is_open(uri)
    }

    pub async fn active_document(&self) -> Option<String> {
        self.lsp.active_document().await
    }

    pub async fn workspace_folders(&self) -> Vec<PathBuf> {
        self.lsp.workspace_folders().await
    }

    pub async fn runs_in_flight(&self) -> usize {
        self.lsp.runs_in_flight().await
    }

    /// `window/showMessage` notifications sent to the client so far.
    pub fn shown_messages(&self) -> Vec<ShowMessageParams> {
        self.client_messages
            .lock()
            .unwrap()
            .iter()
            .filter(|request| request.method() == "window/showMessage")
            .filter_map(|request| request.params().cloned())
            .map(|params| serde_json::from_value(params).unwrap())
            .collect()
    }

    /// Poll until at least `count` messages have been shown, failing after a
    /// few seconds.
    pub async fn wait_for_shown_messages(&self, count: usize) -> Vec<ShowMessageParams> {
        for _ in 0..500 {
            let shown = self.shown_messages();
            if shown.len() >= count {
                return shown;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("expected {count} shown messages, got {:?}", self.shown_messages());
    }

    /// Poll until `uri` has findings, failing after a few seconds.
    pub async fn wait_for_findings(&self, uri: &str) -> Vec<Finding> {
        for _ in 0..500 {
            let findings = self.findings(uri).await;
            if !findings.is_empty() {
                return findings;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("no findings published for {uri}");
    }
}

/// Wrapper that delegates all LanguageServer methods to the inner Arc<YttLintLsp>.
///
/// This is needed because LspService requires ownership of the LanguageServer impl,
/// but we also need to retain a reference for testing.
struct LspWrapper {
    inner: Arc<YttLintLsp>,
}

impl LanguageServer for LspWrapper {
    async fn initialize(
        &self,
        params: InitializeParams,
    ) -> tower_lsp_server::jsonrpc::Result<InitializeResult> {
        self.inner.initialize(params).await
    }

    async fn initialized(&self, params: InitializedParams) {
        self.inner.initialized(params).await
    }

    async fn shutdown(&self) -> tower_lsp_server::jsonrpc::Result<()> {
        self.inner.shutdown().await
    }

    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        self.inner.did_open(params).await
    }

    async fn did_change(&self, params: DidChangeTextDocumentParams) {
        self.inner.did_change(params).await
    }

    async fn did_close(&self, params: DidCloseTextDocumentParams) {
        self.inner.did_close(params).await
    }

    async fn did_change_workspace_folders(&self, params: DidChangeWorkspaceFoldersParams) {
        self.inner.did_change_workspace_folders(params).await
    }

    async fn execute_command(
        &self,
        params: ExecuteCommandParams,
    ) -> tower_lsp_server::jsonrpc::Result<Option<Value>> {
        self.inner.execute_command(params).await
    }
}

pub fn file_uri(path: &Path) -> String {
    format!("file://{}", path.display())
}

/// Write an executable `#!/bin/sh` script standing in for ytt-lint.
#[cfg(unix)]
pub fn fake_linter(dir: &Path, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join("ytt-lint");
    std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}

/// A linter reporting `expected map` on line 2 of whatever file it is given,
/// logging each invocation's argv to `calls`.
#[cfg(unix)]
pub fn reporting_linter(dir: &Path) -> PathBuf {
    let calls = dir.join("calls");
    fake_linter(
        dir,
        &format!(
            r#"echo "$@" >> "{calls}"
cat > /dev/null
src="${{2#-:}}"
printf '[{{"pos":"%s:2","msg":"expected map","code":"schema"}}]\n' "$src""#,
            calls = calls.display()
        ),
    )
}

/// Lines written to the `calls` log by `reporting_linter`.
pub fn calls(dir: &Path) -> Vec<String> {
    std::fs::read_to_string(dir.join("calls"))
        .unwrap_or_default()
        .lines()
        .map(str::to_string)
        .collect()
}

/// Helper to create a simple text change event (full document replacement).
pub fn full_document_change(text: &str) -> TextDocumentContentChangeEvent {
    TextDocumentContentChangeEvent {
        range: None,
        range_length: None,
        text: text.to_string(),
    }
}

/// Helper to create an incremental text change event.
pub fn incremental_change(
    start_line: u32,
    start_char: u32,
    end_line: u32,
    end_char: u32,
    text: &str,
) -> TextDocumentContentChangeEvent {
    TextDocumentContentChangeEvent {
        range: Some(Range {
            start: Position {
                line: start_line,
                character: start_char,
            },
            end: Position {
                line: end_line,
                character: end_char,
            },
        }),
        range_length: None,
        text: text.to_string(),
    }
}
