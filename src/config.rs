use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::diagnostics::ReconcileMode;

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Path to the ytt-lint executable. Looked up on `PATH` when unset.
    pub executable: Option<PathBuf>,
    /// Schema directory handed to the linter via `YTT_LINT_SCHEMA_PATH`.
    pub schema_path: Option<PathBuf>,
    /// Quiet period after the last edit before the linter runs.
    pub debounce_ms: u64,
    /// Upper bound for a single linter run.
    pub timeout_secs: u64,
    /// Run the linter in pedantic mode (`-p`).
    pub pedantic: bool,
    pub reconcile: ReconcileMode,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            executable: None,
            schema_path: None,
            debounce_ms: 500,
            timeout_secs: 30,
            pedantic: false,
            reconcile: ReconcileMode::default(),
        }
    }
}

impl Config {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Schema directory to inject, defaulting to `~/.ytt-lint/schema`.
    pub fn schema_dir(&self) -> Option<PathBuf> {
        self.schema_path
            .clone()
            .or_else(|| dirs::home_dir().map(|home| home.join(".ytt-lint").join("schema")))
    }
}

#[derive(Default, Clone)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    pub fn executable(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.executable = Some(path.into());
        self
    }

    pub fn schema_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.schema_path = Some(path.into());
        self
    }

    pub fn debounce_ms(mut self, ms: u64) -> Self {
        self.config.debounce_ms = ms;
        self
    }

    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.config.timeout_secs = secs;
        self
    }

    pub fn pedantic(mut self, pedantic: bool) -> Self {
        self.config.pedantic = pedantic;
        self
    }

    pub fn reconcile(mut self, mode: ReconcileMode) -> Self {
        self.config.reconcile = mode;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}

const CANDIDATE_NAMES: &[&str] = &[".ytt-lint-lsp.toml", "ytt-lint-lsp.toml"];

fn parse_config_str(s: &str, path: &Path) -> io::Result<Config> {
    toml::from_str::<Config>(s).map_err(|e| {
        io::Error::new(
            io::ErrorKind::InvalidData,
            format!("invalid config {}: {e}", path.display()),
        )
    })
}

fn read_config(path: &Path) -> io::Result<Config> {
    log::debug!("Reading config from: {}", path.display());
    let s = fs::read_to_string(path)?;
    let mut config = parse_config_str(&s, path)?;

    // Relative paths are relative to the config file, not the server's cwd
    if let Some(dir) = path.parent() {
        config.executable = config.executable.map(|p| resolve_relative(dir, p));
        config.schema_path = config.schema_path.map(|p| resolve_relative(dir, p));
    }

    log::info!("Loaded config from: {}", path.display());
    Ok(config)
}

fn resolve_relative(dir: &Path, path: PathBuf) -> PathBuf {
    if let Ok(rest) = path.strip_prefix("~")
        && let Some(home) = dirs::home_dir()
    {
        return home.join(rest);
    }
    // Bare names like "ytt-lint" are left for PATH lookup
    if path.is_relative() && path.components().count() > 1 {
        dir.join(path)
    } else {
        path
    }
}

fn find_in_tree(start_dir: &Path) -> Option<PathBuf> {
    for dir in start_dir.ancestors() {
        for name in CANDIDATE_NAMES {
            let p = dir.join(name);
            if p.is_file() {
                return Some(p);
            }
        }
    }
    None
}

fn xdg_config_path() -> Option<PathBuf> {
    if let Ok(xdg) = env::var("XDG_CONFIG_HOME") {
        let p = Path::new(&xdg).join("ytt-lint-lsp").join("config.toml");
        if p.is_file() {
            return Some(p);
        }
    }
    if let Some(home) = dirs::home_dir() {
        let p = home.join(".config").join("ytt-lint-lsp").join("config.toml");
        if p.is_file() {
            return Some(p);
        }
    }
    None
}

/// Load configuration with precedence:
/// 1) explicit path (error if unreadable/invalid)
/// 2) walk up from start_dir: .ytt-lint-lsp.toml, ytt-lint-lsp.toml
/// 3) XDG: $XDG_CONFIG_HOME/ytt-lint-lsp/config.toml or ~/.config/ytt-lint-lsp/config.toml
/// 4) default config
pub fn load(explicit: Option<&Path>, start_dir: &Path) -> io::Result<(Config, Option<PathBuf>)> {
    if let Some(path) = explicit {
        let cfg = read_config(path)?;
        return Ok((cfg, Some(path.to_path_buf())));
    }

    if let Some(p) = find_in_tree(start_dir) {
        match read_config(&p) {
            Ok(cfg) => return Ok((cfg, Some(p))),
            Err(e) => log::warn!("Ignoring config {}: {}", p.display(), e),
        }
    }

    if let Some(p) = xdg_config_path()
        && let Ok(cfg) = read_config(&p)
    {
        return Ok((cfg, Some(p)));
    }

    log::debug!("No config file found, using defaults");
    Ok((Config::default(), None))
}
