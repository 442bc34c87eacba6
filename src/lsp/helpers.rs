use std::path::{Path, PathBuf};
use tower_lsp_server::ls_types::Uri;

/// File-system path for a `file:` URI.
pub(crate) fn uri_to_path(uri: &Uri) -> Option<PathBuf> {
    uri.to_file_path().map(|p| p.into_owned())
}

/// Workspace folder containing `path`. The innermost folder wins when
/// folders are nested.
pub(crate) fn root_for(folders: &[PathBuf], path: &Path) -> Option<PathBuf> {
    folders
        .iter()
        .filter(|folder| path.starts_with(folder))
        .max_by_key(|folder| folder.components().count())
        .cloned()
}
