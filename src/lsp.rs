use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::{Mutex, OnceCell};
use tower_lsp_server::{Client, LspService, Server};

use crate::Config;
use crate::diagnostics::DiagnosticStore;
use crate::linter::{Linter, LinterError, RunRegistry};
use crate::scheduler::{DebounceScheduler, LintTrigger};

mod config;
mod conversions;
mod documents;
mod handlers;
mod helpers;
mod server;

/// Command pulling schemas from a Kubernetes cluster.
pub const PULL_SCHEMA_COMMAND: &str = "ytt-lint.pullSchema";
/// Command importing schemas from a file.
pub const IMPORT_SCHEMA_COMMAND: &str = "ytt-lint.importSchema";

/// An open document as mirrored from the client.
#[derive(Debug, Clone)]
pub struct DocumentState {
    pub text: String,
    pub language_id: String,
    /// File-system path for `file:` URIs
    pub path: Option<PathBuf>,
}

/// State shared between request handlers and spawned lint runs.
#[derive(Clone)]
pub(crate) struct ServerState {
    pub(crate) client: Client,
    // Use String keys since Uri doesn't implement Send
    pub(crate) document_map: Arc<Mutex<HashMap<String, DocumentState>>>,
    pub(crate) workspace_folders: Arc<Mutex<Vec<PathBuf>>>,
    pub(crate) diagnostics: Arc<Mutex<DiagnosticStore>>,
    pub(crate) runs: Arc<Mutex<RunRegistry>>,
    pub(crate) config: Arc<Mutex<Config>>,
    linter: Arc<OnceCell<Linter>>,
    next_sequence: Arc<AtomicU64>,
}

impl ServerState {
    fn new(client: Client, config: Config) -> Self {
        Self {
            client,
            document_map: Arc::new(Mutex::new(HashMap::new())),
            workspace_folders: Arc::new(Mutex::new(Vec::new())),
            diagnostics: Arc::new(Mutex::new(DiagnosticStore::new(config.reconcile))),
            runs: Arc::new(Mutex::new(RunRegistry::new())),
            config: Arc::new(Mutex::new(config)),
            linter: Arc::new(OnceCell::new()),
            next_sequence: Arc::new(AtomicU64::new(1)),
        }
    }

    pub(crate) fn next_sequence(&self) -> u64 {
        self.next_sequence.fetch_add(1, Ordering::Relaxed)
    }

    /// The session's linter, resolved on first use. Failed resolutions are
    /// retried on the next call.
    pub(crate) async fn linter(&self) -> Result<&Linter, LinterError> {
        self.linter
            .get_or_try_init(|| async {
                let config = self.config.lock().await.clone();
                Linter::from_config(&config)
            })
            .await
    }
}

pub struct YttLintLsp {
    state: ServerState,
    scheduler: DebounceScheduler,
    /// Explicit `--config` path, takes precedence over discovery
    config_path: Option<PathBuf>,
    /// Configuration given programmatically; discovery is skipped
    fixed_config: bool,
}

impl YttLintLsp {
    pub fn new(client: Client) -> Self {
        Self::build(client, Config::default(), None, false)
    }

    /// Server using `config` as-is instead of discovering a config file.
    pub fn with_config(client: Client, config: Config) -> Self {
        Self::build(client, config, None, true)
    }

    /// Server loading its configuration from `path`.
    pub fn with_config_path(client: Client, path: PathBuf) -> Self {
        Self::build(client, Config::default(), Some(path), false)
    }

    fn build(
        client: Client,
        config: Config,
        config_path: Option<PathBuf>,
        fixed_config: bool,
    ) -> Self {
        let delay = config.debounce();
        let state = ServerState::new(client, config);

        let trigger_state = state.clone();
        let trigger: LintTrigger = Arc::new(move |uri| {
            handlers::diagnostics::schedule(trigger_state.clone(), uri);
        });

        Self {
            state,
            scheduler: DebounceScheduler::new(delay, trigger),
            config_path,
            fixed_config,
        }
    }

    pub fn document_map(&self) -> Arc<Mutex<HashMap<String, DocumentState>>> {
        Arc::clone(&self.state.document_map)
    }

    pub fn diagnostics(&self) -> Arc<Mutex<DiagnosticStore>> {
        Arc::clone(&self.state.diagnostics)
    }

    pub async fn workspace_folders(&self) -> Vec<PathBuf> {
        self.state.workspace_folders.lock().await.clone()
    }

    pub async fn active_document(&self) -> Option<String> {
        self.scheduler.active_document().await
    }

    pub async fn runs_in_flight(&self) -> usize {
        self.state.runs.lock().await.len()
    }
}

pub async fn run(config_path: Option<PathBuf>) -> std::io::Result<()> {
    let stdin = tokio::io::stdin();
    let stdout = tokio::io::stdout();

    let (service, socket) = LspService::new(|client| match config_path {
        Some(path) => YttLintLsp::with_config_path(client, path),
        None => YttLintLsp::new(client),
    });
    Server::new(stdin, stdout, socket).serve(service).await;

    Ok(())
}
