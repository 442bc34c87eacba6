//! Spawning ytt-lint for a single document.
//!
//! The document text is piped through stdin with `-f -:<path>` so unsaved
//! buffers are linted as the user sees them while findings still name the
//! real file.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use crate::config::Config;
use crate::report::{self, RawFinding};

use super::executable;

/// Environment variable ytt-lint reads additional schemas from.
pub const SCHEMA_PATH_VAR: &str = "YTT_LINT_SCHEMA_PATH";

/// Errors that can occur when invoking the linter.
#[derive(Debug)]
pub enum LinterError {
    /// Linter executable could not be located
    NotFound(String),
    /// Linter command failed to spawn
    SpawnFailed(String),
    /// Linter exited with non-zero status without printing a report
    NonZeroExit { code: i32, stderr: String },
    /// Linter timed out
    Timeout,
    /// I/O error during communication with the linter
    IoError(std::io::Error),
    /// Failed to parse linter output
    ParseError(String),
}

impl LinterError {
    /// Whether the failure means the linter cannot run at all, which the user
    /// has to fix, as opposed to a single bad run.
    pub fn is_setup_error(&self) -> bool {
        matches!(self, Self::NotFound(_) | Self::SpawnFailed(_))
    }
}

impl std::fmt::Display for LinterError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(msg) => write!(f, "ytt-lint executable not found: {}", msg),
            Self::SpawnFailed(cmd) => write!(f, "failed to spawn linter: {}", cmd),
            Self::NonZeroExit { code, stderr } => {
                write!(f, "linter exited with code {}: {}", code, stderr)
            }
            Self::Timeout => write!(f, "linter timed out"),
            Self::IoError(e) => write!(f, "linter I/O error: {}", e),
            Self::ParseError(msg) => write!(f, "failed to parse linter output: {}", msg),
        }
    }
}

impl std::error::Error for LinterError {}

impl From<std::io::Error> for LinterError {
    fn from(e: std::io::Error) -> Self {
        Self::IoError(e)
    }
}

/// Everything one lint run needs. Built fresh for every run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LintRequest {
    pub text: String,
    /// Name passed as `-f -:<source_path>`; findings are matched against it.
    pub source_path: String,
    /// Workspace folder containing the document, passed as `--root`.
    pub root_path: Option<PathBuf>,
    pub document_uri: String,
    pub language_id: String,
    /// Monotonic run number; later runs supersede earlier ones.
    pub sequence: u64,
}

/// What a run produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// The document's language is not linted; nothing was spawned
    Ineligible,
    Report(Vec<RawFinding>),
}

/// A resolved linter, ready to run.
#[derive(Debug, Clone)]
pub struct Linter {
    executable: PathBuf,
    schema_path: Option<PathBuf>,
    timeout: Duration,
    pedantic: bool,
}

impl Linter {
    pub fn new(executable: impl Into<PathBuf>) -> Self {
        Self {
            executable: executable.into(),
            schema_path: None,
            timeout: Duration::from_secs(30),
            pedantic: false,
        }
    }

    /// Resolve the executable named by `config` and apply its settings.
    pub fn from_config(config: &Config) -> Result<Self, LinterError> {
        let executable = executable::resolve(config.executable.as_deref())?;
        Ok(Self {
            executable,
            schema_path: config.schema_dir(),
            timeout: config.timeout(),
            pedantic: config.pedantic,
        })
    }

    pub fn with_schema_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.schema_path = Some(path.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_pedantic(mut self, pedantic: bool) -> Self {
        self.pedantic = pedantic;
        self
    }

    pub fn executable(&self) -> &Path {
        &self.executable
    }

    pub fn schema_path(&self) -> Option<&Path> {
        self.schema_path.as_deref()
    }

    /// Arguments for linting `request`.
    pub fn args(&self, request: &LintRequest) -> Vec<String> {
        let mut args = vec![
            "-f".to_string(),
            format!("-:{}", request.source_path),
            "-o".to_string(),
            "json".to_string(),
        ];
        if let Some(root) = &request.root_path {
            args.push("--root".to_string());
            args.push(root.to_string_lossy().into_owned());
        }
        if self.pedantic {
            args.push("-p".to_string());
        }
        args
    }

    /// Base command with the schema environment applied on top of the inherited one.
    pub(crate) fn command(&self) -> Command {
        let mut cmd = Command::new(&self.executable);
        if let Some(schema) = &self.schema_path {
            cmd.env(SCHEMA_PATH_VAR, schema);
        }
        cmd.kill_on_drop(true);
        cmd
    }

    /// Run the linter on `request`.
    ///
    /// The child is killed if this future is dropped, so aborting the task
    /// running it cancels the process as well.
    pub async fn run(&self, request: &LintRequest) -> Result<RunOutcome, LinterError> {
        if !super::is_eligible(&request.language_id) {
            log::debug!(
                "Skipping {}: language '{}' is not linted",
                request.document_uri,
                request.language_id
            );
            return Ok(RunOutcome::Ineligible);
        }

        let args = self.args(request);
        log::debug!(
            "Invoking linter: {} {}",
            self.executable.display(),
            args.join(" ")
        );

        let mut child = self
            .command()
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                LinterError::SpawnFailed(format!("{}: {}", self.executable.display(), e))
            })?;

        let mut stdin = child.stdin.take().ok_or_else(|| {
            LinterError::IoError(std::io::Error::other("linter stdin was not captured"))
        })?;
        let text = request.text.as_bytes();

        // Feed stdin while collecting output so a large document cannot
        // deadlock against a full stdout pipe.
        let write_input = async move {
            if let Err(e) = stdin.write_all(text).await {
                // The linter may exit before reading everything
                log::debug!("Writing document to linter failed: {}", e);
            }
            drop(stdin);
        };

        let (_, output) = tokio::time::timeout(self.timeout, async {
            tokio::join!(write_input, child.wait_with_output())
        })
        .await
        .map_err(|_| LinterError::Timeout)?;
        let output = output?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);

        // ytt-lint may exit non-zero while still printing a report, so only
        // an exit without output is a failure.
        if !output.status.success() && stdout.trim().is_empty() {
            let code = output.status.code().unwrap_or(-1);
            log::warn!("Linter failed with exit code {}: {}", code, stderr.trim());
            return Err(LinterError::NonZeroExit {
                code,
                stderr: stderr.trim().to_string(),
            });
        }

        let raw = report::decode(&stdout).map_err(|e| {
            LinterError::ParseError(format!("{} (output: {})", e, truncate(stdout.trim(), 200)))
        })?;

        log::debug!(
            "Linter finished for {} with {} record(s)",
            request.source_path,
            raw.len()
        );
        Ok(RunOutcome::Report(raw))
    }
}

fn truncate(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &s[..idx]),
        None => s.to_string(),
    }
}
