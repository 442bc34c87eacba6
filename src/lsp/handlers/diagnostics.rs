use tower_lsp_server::Client;
use tower_lsp_server::ls_types::*;

use crate::diagnostics::Publish;
use crate::linter::{self, LintRequest};
use crate::lsp::ServerState;

use super::super::conversions::finding_to_diagnostic;
use super::super::helpers::root_for;

/// Start a lint run for `uri`, superseding any run still in flight for it.
pub(crate) fn schedule(state: ServerState, uri: String) {
    tokio::spawn(async move {
        let sequence = state.next_sequence();
        // Holding the registry lock keeps the new run from finishing before
        // it is registered
        let mut runs = state.runs.lock().await;
        let task = tokio::spawn(lint_and_publish(state.clone(), uri.clone(), sequence));
        runs.start(&uri, sequence, task.abort_handle());
    });
}

/// Send one reconciled publish to the client.
pub(crate) async fn send_publish(client: &Client, publish: Publish) {
    let uri: Uri = match publish.uri.parse() {
        Ok(uri) => uri,
        Err(e) => {
            log::error!("Cannot publish diagnostics for '{}': {}", publish.uri, e);
            return;
        }
    };
    let diagnostics = publish.findings.iter().map(finding_to_diagnostic).collect();
    client.publish_diagnostics(uri, diagnostics, None).await;
}

/// Run the linter on the current text of `uri` and publish the result
pub(crate) async fn lint_and_publish(state: ServerState, uri: String, sequence: u64) {
    run_once(&state, &uri, sequence).await;
    state.runs.lock().await.finish(&uri, sequence);
}

async fn run_once(state: &ServerState, uri: &str, sequence: u64) {
    let doc_state = {
        let map = state.document_map.lock().await;
        map.get(uri).cloned()
    };
    let Some(doc_state) = doc_state else {
        log::debug!("Document closed before lint run {}: {}", sequence, uri);
        return;
    };
    if !linter::is_eligible(&doc_state.language_id) {
        log::debug!("Skipping {} ({}): not linted", uri, doc_state.language_id);
        return;
    }

    let linter = match state.linter().await {
        Ok(linter) => linter,
        Err(e) => {
            log::error!("{}", e);
            state
                .client
                .show_message(MessageType::ERROR, format!("ytt-lint: {}", e))
                .await;
            return;
        }
    };

    let root_path = match &doc_state.path {
        Some(path) => {
            let folders = state.workspace_folders.lock().await;
            root_for(&folders, path)
        }
        None => None,
    };
    let source_path = doc_state
        .path
        .as_ref()
        .map(|p| p.to_string_lossy().into_owned())
        .unwrap_or_else(|| uri.to_string());

    let request = LintRequest {
        text: doc_state.text,
        source_path,
        root_path,
        document_uri: uri.to_string(),
        language_id: doc_state.language_id,
        sequence,
    };

    let parsed = match linter::lint(linter, &request).await {
        Ok(Some(parsed)) => parsed,
        Ok(None) => return,
        Err(e) if e.is_setup_error() => {
            log::error!("{}", e);
            state
                .client
                .show_message(MessageType::ERROR, format!("ytt-lint: {}", e))
                .await;
            return;
        }
        Err(e) => {
            log::warn!("Lint run {} for {} failed: {}", sequence, uri, e);
            state
                .client
                .log_message(MessageType::WARNING, format!("ytt-lint failed: {}", e))
                .await;
            return;
        }
    };

    for locationless in &parsed.locationless {
        state
            .client
            .show_message(MessageType::WARNING, locationless.user_message())
            .await;
    }
    for error in &parsed.errors {
        log::error!("Unresolvable finding for {}: {}", uri, error);
        state
            .client
            .log_message(
                MessageType::ERROR,
                format!("Internal error resolving ytt-lint finding: {}", error),
            )
            .await;
    }

    // Publishes for one run go out under the store lock
    let mut diagnostics = state.diagnostics.lock().await;
    match diagnostics.reconcile(uri, sequence, parsed.findings) {
        Ok(publishes) => {
            for publish in publishes {
                send_publish(&state.client, publish).await;
            }
        }
        Err(rejected) => {
            log::debug!("Discarding lint run {} for {}: {}", sequence, uri, rejected);
        }
    }
}
