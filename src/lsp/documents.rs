use tower_lsp_server::ls_types::*;

use super::conversions::apply_content_change;
use super::handlers::diagnostics::send_publish;
use super::helpers::uri_to_path;
use super::{DocumentState, ServerState};
use crate::scheduler::DebounceScheduler;

/// Handle textDocument/didOpen notification
pub(crate) async fn did_open(
    state: &ServerState,
    scheduler: &DebounceScheduler,
    params: DidOpenTextDocumentParams,
) {
    let uri = params.text_document.uri.to_string();
    let path = uri_to_path(&params.text_document.uri);

    state.document_map.lock().await.insert(
        uri.clone(),
        DocumentState {
            text: params.text_document.text,
            language_id: params.text_document.language_id,
            path,
        },
    );
    state.diagnostics.lock().await.open(&uri);

    log::debug!("Opened document: {}", uri);

    // A newly opened document is the one the user is looking at
    scheduler.on_focus_changed(Some(uri)).await;
}

/// Handle textDocument/didChange notification
pub(crate) async fn did_change(
    state: &ServerState,
    scheduler: &DebounceScheduler,
    params: DidChangeTextDocumentParams,
) {
    let uri = params.text_document.uri.to_string();

    // Apply incremental changes sequentially
    {
        let mut document_map = state.document_map.lock().await;
        let Some(doc_state) = document_map.get_mut(&uri) else {
            log::debug!("Change for unknown document: {}", uri);
            return;
        };
        for change in &params.content_changes {
            doc_state.text = apply_content_change(&doc_state.text, change);
        }
    }

    // Clients only send edits for the document being typed in
    if scheduler.active_document().await.as_deref() != Some(uri.as_str()) {
        scheduler.on_focus_changed(Some(uri.clone())).await;
    }
    scheduler.on_text_changed(&uri).await;
}

/// Handle textDocument/didClose notification
pub(crate) async fn did_close(
    state: &ServerState,
    scheduler: &DebounceScheduler,
    params: DidCloseTextDocumentParams,
) {
    let uri = params.text_document.uri.to_string();

    state.document_map.lock().await.remove(&uri);
    if state.runs.lock().await.cancel(&uri) {
        log::debug!("Cancelled lint run for closed document {}", uri);
    }
    scheduler.on_document_closed(&uri).await;

    // Clear diagnostics
    let mut diagnostics = state.diagnostics.lock().await;
    let publish = diagnostics.close(&uri);
    send_publish(&state.client, publish).await;
    drop(diagnostics);

    log::debug!("Closed document: {}", uri);
}
