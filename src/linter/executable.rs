//! Locating the ytt-lint binary.

use std::io;
use std::path::{Path, PathBuf};

use super::invoker::LinterError;

/// Executable name looked up on `PATH` when none is configured.
pub const DEFAULT_EXECUTABLE: &str = "ytt-lint";

/// Resolve the linter executable.
///
/// A configured path that exists is used as-is after making sure it can be
/// executed (binaries unpacked from archives often lose their mode bits).
/// Anything else is looked up on `PATH`.
pub fn resolve(configured: Option<&Path>) -> Result<PathBuf, LinterError> {
    if let Some(path) = configured
        && path.is_file()
    {
        ensure_executable(path)?;
        log::debug!("Using configured linter: {}", path.display());
        return Ok(path.to_path_buf());
    }

    let name = configured
        .map(Path::as_os_str)
        .unwrap_or_else(|| DEFAULT_EXECUTABLE.as_ref());
    let found = which::which(name).map_err(|e| {
        LinterError::NotFound(format!("{}: {}", Path::new(name).display(), e))
    })?;

    log::debug!("Resolved linter on PATH: {}", found.display());
    Ok(found)
}

/// Add execute permission where it is missing. A no-op when already set.
#[cfg(unix)]
pub fn ensure_executable(path: &Path) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let mut permissions = std::fs::metadata(path)?.permissions();
    let mode = permissions.mode();
    if mode & 0o111 == 0o111 {
        return Ok(());
    }

    log::info!("Marking {} as executable", path.display());
    permissions.set_mode(mode | 0o111);
    std::fs::set_permissions(path, permissions)
}

#[cfg(not(unix))]
pub fn ensure_executable(_path: &Path) -> io::Result<()> {
    Ok(())
}
