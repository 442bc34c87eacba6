use std::path::{Path, PathBuf};
use tower_lsp_server::Client;
use tower_lsp_server::ls_types::MessageType;

/// Load config for the workspace, falling back to default
///
/// An explicit path wins over discovery. Without a workspace root, discovery
/// starts from the server's working directory.
pub(crate) async fn load_config(
    client: &Client,
    explicit: Option<&Path>,
    workspace_root: Option<&Path>,
) -> crate::Config {
    let start_dir = match workspace_root {
        Some(root) => root.to_path_buf(),
        None => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
    };

    match crate::config::load(explicit, &start_dir) {
        Ok((config, path)) => {
            if let Some(p) = path {
                client
                    .log_message(
                        MessageType::INFO,
                        format!("Loaded config from {}", p.display()),
                    )
                    .await;
            }
            config
        }
        Err(e) => {
            log::warn!("Failed to load config: {}", e);
            client
                .log_message(
                    MessageType::WARNING,
                    format!("Failed to load config: {}", e),
                )
                .await;
            crate::Config::default()
        }
    }
}
