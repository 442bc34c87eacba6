//! One-shot schema commands: pulling CRD schemas from a cluster and
//! importing schemas from a local file.
//!
//! Both stream the linter's stdout and stderr line by line to a sink and
//! finish with an `Exit code: <n>` line.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::sync::mpsc;

use crate::linter::{Linter, LinterError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaCommand {
    /// Pull schemas from the cluster behind `context` in `kubeconfig`
    Pull { kubeconfig: PathBuf, context: String },
    /// Derive schemas from the resources defined in `file`
    Import { file: PathBuf },
}

impl SchemaCommand {
    pub fn args(&self) -> Vec<String> {
        match self {
            Self::Pull {
                kubeconfig,
                context,
            } => vec![
                "--pull-from-k8s".to_string(),
                "--kubeconfig".to_string(),
                kubeconfig.to_string_lossy().into_owned(),
                "--context".to_string(),
                context.clone(),
            ],
            Self::Import { file } => {
                let root = file
                    .parent()
                    .filter(|parent| !parent.as_os_str().is_empty())
                    .unwrap_or_else(|| Path::new("."));
                vec![
                    "--autoimport".to_string(),
                    "-f".to_string(),
                    file.to_string_lossy().into_owned(),
                    "--root".to_string(),
                    root.to_string_lossy().into_owned(),
                ]
            }
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Self::Pull { .. } => "ytt-lint schema pull",
            Self::Import { .. } => "ytt-lint schema import",
        }
    }
}

/// The kubeconfig used when none is given: `$KUBECONFIG`, else `~/.kube/config`.
pub fn default_kubeconfig() -> PathBuf {
    if let Some(path) = std::env::var_os("KUBECONFIG").filter(|p| !p.is_empty()) {
        return PathBuf::from(path);
    }
    dirs::home_dir()
        .map(|home| home.join(".kube").join("config"))
        .unwrap_or_else(|| PathBuf::from("~/.kube/config"))
}

/// Run `command`, handing every output line to `sink`. Returns the exit code.
pub async fn run(
    linter: &Linter,
    command: &SchemaCommand,
    mut sink: impl FnMut(&str),
) -> Result<i32, LinterError> {
    let args = command.args();
    log::info!(
        "{}: {} {}",
        command.title(),
        linter.executable().display(),
        args.join(" ")
    );

    let mut cmd = match command {
        SchemaCommand::Import { .. } => linter.command(),
        SchemaCommand::Pull { .. } => {
            let mut cmd = tokio::process::Command::new(linter.executable());
            cmd.kill_on_drop(true);
            cmd
        }
    };

    let mut child = cmd
        .args(&args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| {
            LinterError::SpawnFailed(format!("{}: {}", linter.executable().display(), e))
        })?;

    let (tx, mut rx) = mpsc::unbounded_channel();
    if let Some(stdout) = child.stdout.take() {
        tokio::spawn(forward_lines(stdout, tx.clone()));
    }
    if let Some(stderr) = child.stderr.take() {
        tokio::spawn(forward_lines(stderr, tx.clone()));
    }
    drop(tx);

    while let Some(line) = rx.recv().await {
        sink(&line);
    }

    let status = child.wait().await?;
    let code = status.code().unwrap_or(-1);
    sink(&format!("Exit code: {}", code));

    if code != 0 {
        log::warn!("{} exited with code {}", command.title(), code);
    }
    Ok(code)
}

/// Forward `stream` line by line. Bytes that are not UTF-8 are replaced
/// rather than ending the stream.
async fn forward_lines(stream: impl AsyncRead + Unpin, tx: mpsc::UnboundedSender<String>) {
    let mut reader = BufReader::new(stream);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => break,
            Ok(_) => {
                let line = String::from_utf8_lossy(&buf);
                if tx.send(line.trim_end_matches(['\n', '\r']).to_string()).is_err() {
                    break;
                }
            }
            Err(e) => {
                log::debug!("Reading schema command output failed: {}", e);
                break;
            }
        }
    }
}
