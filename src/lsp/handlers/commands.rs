use std::path::PathBuf;

use serde_json::Value;
use tokio::sync::mpsc;
use tower_lsp_server::jsonrpc::{Error, Result};
use tower_lsp_server::ls_types::*;

use crate::lsp::{IMPORT_SCHEMA_COMMAND, PULL_SCHEMA_COMMAND, ServerState};
use crate::schema::{self, SchemaCommand};

use super::super::helpers::uri_to_path;

const NO_ACTIVE_DOCUMENT: &str = "ytt-lint can't import schema: no editor window open/active";

/// Handle workspace/executeCommand. Returns the exit code of the schema command.
pub(crate) async fn execute_command(
    state: &ServerState,
    active_document: Option<String>,
    params: ExecuteCommandParams,
) -> Result<Option<Value>> {
    let command = match params.command.as_str() {
        PULL_SCHEMA_COMMAND => pull_command(&params.arguments)?,
        IMPORT_SCHEMA_COMMAND => match import_command(&params.arguments, active_document)? {
            Some(command) => command,
            None => {
                state
                    .client
                    .show_message(MessageType::ERROR, NO_ACTIVE_DOCUMENT)
                    .await;
                return Ok(None);
            }
        },
        other => {
            return Err(Error::invalid_params(format!("Unknown command: {}", other)));
        }
    };

    let linter = match state.linter().await {
        Ok(linter) => linter,
        Err(e) => {
            state
                .client
                .show_message(MessageType::ERROR, format!("ytt-lint: {}", e))
                .await;
            return Ok(None);
        }
    };

    // Forward output while the command is still running
    let (tx, mut rx) = mpsc::unbounded_channel::<String>();
    let client = state.client.clone();
    let title = command.title();
    let forwarder = tokio::spawn(async move {
        while let Some(line) = rx.recv().await {
            client
                .log_message(MessageType::INFO, format!("[{}] {}", title, line))
                .await;
        }
    });

    let result = schema::run(linter, &command, |line| {
        let _ = tx.send(line.to_string());
    })
    .await;
    drop(tx);
    let _ = forwarder.await;

    match result {
        Ok(code) => Ok(Some(Value::from(code))),
        Err(e) => {
            state
                .client
                .show_message(MessageType::ERROR, format!("{}: {}", title, e))
                .await;
            Ok(None)
        }
    }
}

/// `[kubeconfig, context]` or `[context]` with the default kubeconfig.
fn pull_command(arguments: &[Value]) -> Result<SchemaCommand> {
    let strings = string_arguments(arguments)?;
    match strings.as_slice() {
        [context] => Ok(SchemaCommand::Pull {
            kubeconfig: schema::default_kubeconfig(),
            context: context.clone(),
        }),
        [kubeconfig, context] => Ok(SchemaCommand::Pull {
            kubeconfig: PathBuf::from(kubeconfig),
            context: context.clone(),
        }),
        _ => Err(Error::invalid_params(
            "expected arguments [kubeconfig?, context]",
        )),
    }
}

/// `[uri]`, or the focused document when no argument is given.
fn import_command(
    arguments: &[Value],
    active_document: Option<String>,
) -> Result<Option<SchemaCommand>> {
    let strings = string_arguments(arguments)?;
    let target = match strings.as_slice() {
        [] => match active_document {
            Some(uri) => uri,
            None => return Ok(None),
        },
        [uri] => uri.clone(),
        _ => return Err(Error::invalid_params("expected arguments [uri?]")),
    };

    let file = match target.parse::<Uri>().ok().and_then(|uri| uri_to_path(&uri)) {
        Some(path) => path,
        // Plain paths are accepted as well
        None => PathBuf::from(&target),
    };
    Ok(Some(SchemaCommand::Import { file }))
}

fn string_arguments(arguments: &[Value]) -> Result<Vec<String>> {
    arguments
        .iter()
        .map(|value| {
            value
                .as_str()
                .map(str::to_string)
                .ok_or_else(|| Error::invalid_params("command arguments must be strings"))
        })
        .collect()
}
