use std::path::PathBuf;

use serde_json::Value;
use tower_lsp_server::LanguageServer;
use tower_lsp_server::jsonrpc::Result;
use tower_lsp_server::ls_types::*;

use super::config::load_config;
use super::handlers::diagnostics::send_publish;
use super::helpers::uri_to_path;
use super::{IMPORT_SCHEMA_COMMAND, PULL_SCHEMA_COMMAND, YttLintLsp, documents, handlers};

impl LanguageServer for YttLintLsp {
    async fn initialize(&self, params: InitializeParams) -> Result<InitializeResult> {
        // Try workspace_folders first, fall back to deprecated root_uri
        let mut folders: Vec<PathBuf> = params
            .workspace_folders
            .iter()
            .flatten()
            .filter_map(|folder| uri_to_path(&folder.uri))
            .collect();
        if folders.is_empty() {
            #[allow(deprecated)]
            if let Some(root_uri) = params.root_uri
                && let Some(path) = uri_to_path(&root_uri)
            {
                folders.push(path);
            }
        }

        if !self.fixed_config {
            let config = load_config(
                &self.state.client,
                self.config_path.as_deref(),
                folders.first().map(PathBuf::as_path),
            )
            .await;
            self.scheduler.set_delay(config.debounce()).await;
            self.state
                .diagnostics
                .lock()
                .await
                .set_mode(config.reconcile);
            *self.state.config.lock().await = config;
        }
        *self.state.workspace_folders.lock().await = folders;

        Ok(InitializeResult {
            capabilities: ServerCapabilities {
                text_document_sync: Some(TextDocumentSyncCapability::Options(
                    TextDocumentSyncOptions {
                        open_close: Some(true),
                        change: Some(TextDocumentSyncKind::INCREMENTAL),
                        ..Default::default()
                    },
                )),
                execute_command_provider: Some(ExecuteCommandOptions {
                    commands: vec![
                        PULL_SCHEMA_COMMAND.to_string(),
                        IMPORT_SCHEMA_COMMAND.to_string(),
                    ],
                    ..Default::default()
                }),
                workspace: Some(WorkspaceServerCapabilities {
                    workspace_folders: Some(WorkspaceFoldersServerCapabilities {
                        supported: Some(true),
                        change_notifications: Some(OneOf::Left(true)),
                    }),
                    ..Default::default()
                }),
                ..Default::default()
            },
            server_info: Some(ServerInfo {
                name: "ytt-lint-lsp".to_string(),
                version: Some(env!("CARGO_PKG_VERSION").to_string()),
            }),
            offset_encoding: None,
        })
    }

    async fn initialized(&self, _: InitializedParams) {
        self.state
            .client
            .log_message(MessageType::INFO, "ytt-lint LSP server initialized")
            .await;

        // Surface a missing linter right away rather than on the first edit
        if let Err(e) = self.state.linter().await {
            log::error!("{}", e);
            self.state
                .client
                .show_message(MessageType::ERROR, format!("ytt-lint: {}", e))
                .await;
        }

        self.scheduler.on_activate().await;
    }

    async fn shutdown(&self) -> Result<()> {
        self.scheduler.dispose().await;
        self.state.runs.lock().await.cancel_all();

        let mut diagnostics = self.state.diagnostics.lock().await;
        for publish in diagnostics.clear() {
            send_publish(&self.state.client, publish).await;
        }
        Ok(())
    }

    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        documents::did_open(&self.state, &self.scheduler, params).await;
    }

    async fn did_change(&self, params: DidChangeTextDocumentParams) {
        documents::did_change(&self.state, &self.scheduler, params).await;
    }

    async fn did_close(&self, params: DidCloseTextDocumentParams) {
        documents::did_close(&self.state, &self.scheduler, params).await;
    }

    async fn did_change_workspace_folders(&self, params: DidChangeWorkspaceFoldersParams) {
        let mut folders = self.state.workspace_folders.lock().await;
        for removed in &params.event.removed {
            if let Some(path) = uri_to_path(&removed.uri) {
                folders.retain(|folder| *folder != path);
            }
        }
        for added in &params.event.added {
            if let Some(path) = uri_to_path(&added.uri)
                && !folders.contains(&path)
            {
                folders.push(path);
            }
        }
        log::debug!("Workspace folders: {:?}", *folders);
    }

    async fn execute_command(&self, params: ExecuteCommandParams) -> Result<Option<Value>> {
        let active = self.scheduler.active_document().await;
        handlers::commands::execute_command(&self.state, active, params).await
    }
}
