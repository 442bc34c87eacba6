use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "ytt-lint-lsp")]
#[command(author, version)]
#[command(about = "A language server that runs ytt-lint on YAML and ytt documents")]
#[command(
    long_about = "ytt-lint-lsp runs the ytt-lint linter on YAML and ytt documents as you \
    edit them and publishes its findings as diagnostics. It also drives ytt-lint's schema \
    pull and import commands."
)]
#[command(after_help = "\
EXAMPLES:

    # Start the language server (usually launched by your editor)
    ytt-lint-lsp lsp

    # Lint a file once and print the findings
    ytt-lint-lsp lint config/deployment.yaml

    # Lint from stdin, failing when there are findings
    cat values.yaml | ytt-lint-lsp lint --check

    # Pull CRD schemas from a cluster
    ytt-lint-lsp pull --context prod

CONFIGURATION:

ytt-lint-lsp looks for configuration files in this order:
  1. Explicit --config path
  2. ytt-lint-lsp.toml or .ytt-lint-lsp.toml in current/parent directories
  3. ~/.config/ytt-lint-lsp/config.toml (XDG)
  4. Built-in defaults

Example .ytt-lint-lsp.toml:

    executable = \"/usr/local/bin/ytt-lint\"
    schema_path = \"~/.ytt-lint/schema\"
    debounce_ms = 500
    reconcile = \"per-document\"")]
#[command(arg_required_else_help = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to config file
    #[arg(long, global = true)]
    #[arg(help = "Path to configuration file")]
    #[arg(
        long_help = "Path to a custom configuration file. If not specified, ytt-lint-lsp will \
        search for .ytt-lint-lsp.toml or ytt-lint-lsp.toml in the current directory and its \
        parents, then fall back to ~/.config/ytt-lint-lsp/config.toml."
    )]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the Language Server Protocol server
    #[command(
        long_about = "Start the ytt-lint Language Server Protocol (LSP) server for editor \
        integration. Documents are linted after a short quiet period following each edit."
    )]
    #[command(after_help = "\
The LSP server communicates via stdin/stdout and is typically launched automatically by your \
editor's LSP client. You generally don't need to run this command manually.")]
    Lsp,
    /// Lint a YAML or ytt document once
    #[command(
        long_about = "Run ytt-lint on a single document and print its findings with resolved \
        line and column positions."
    )]
    #[command(after_help = "\
EXAMPLES:

    # Lint a file
    ytt-lint-lsp lint deployment.yaml

    # Lint a file that belongs to a ytt library
    ytt-lint-lsp lint --root config/ config/app/values.yaml

    # Check from stdin (exit code 1 on findings)
    cat deployment.yaml | ytt-lint-lsp lint --check")]
    Lint {
        /// Input file (stdin if not provided)
        #[arg(help = "Input file path")]
        file: Option<PathBuf>,

        /// Library root passed to ytt-lint
        #[arg(long)]
        #[arg(help = "Root directory of the ytt library the file belongs to")]
        root: Option<PathBuf>,

        /// Language id of the input
        #[arg(long)]
        #[arg(help = "Language id (yaml or ytt); guessed from the file extension by default")]
        language: Option<String>,

        /// Exit with code 1 if findings exist
        #[arg(long)]
        #[arg(help = "Exit with code 1 if there are findings")]
        check: bool,
    },
    /// Pull CRD schemas from a Kubernetes cluster
    #[command(
        long_about = "Run ytt-lint's schema pull against a Kubernetes cluster, streaming its \
        output. Pulled schemas are stored in ytt-lint's schema directory."
    )]
    Pull {
        /// Kubeconfig file ($KUBECONFIG or ~/.kube/config by default)
        #[arg(long)]
        kubeconfig: Option<PathBuf>,

        /// Context in the kubeconfig to pull from
        #[arg(long)]
        context: String,
    },
    /// Import schemas from the resources defined in a file
    #[command(
        long_about = "Run ytt-lint's schema auto-import on a file, streaming its output. The \
        file's directory is used as the library root."
    )]
    Import {
        /// File to import schemas from
        file: PathBuf,
    },
}
