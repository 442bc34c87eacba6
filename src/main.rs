use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use clap::Parser;

use ytt_lint_lsp::linter::{self, LintRequest, Linter};
use ytt_lint_lsp::report::ParsedReport;
use ytt_lint_lsp::schema::{self, SchemaCommand};

mod cli;
use cli::{Cli, Commands};

/// Name the linter sees for documents read from stdin.
const STDIN_SOURCE: &str = "stdin.yaml";

fn read_all(path: Option<&PathBuf>) -> io::Result<String> {
    match path {
        Some(p) => fs::read_to_string(p),
        None => {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf)?;
            Ok(buf)
        }
    }
}

fn start_dir_for(input_path: Option<&Path>) -> io::Result<PathBuf> {
    if let Some(p) = input_path {
        Ok(p.parent()
            .filter(|dir| !dir.as_os_str().is_empty())
            .unwrap_or(Path::new("."))
            .to_path_buf())
    } else {
        std::env::current_dir()
    }
}

fn load_linter(config_path: Option<&Path>, start_dir: &Path) -> io::Result<Linter> {
    let (cfg, cfg_path) = ytt_lint_lsp::config::load(config_path, start_dir)?;

    if let Some(path) = &cfg_path {
        log::debug!("Using config from: {}", path.display());
    } else {
        log::debug!("Using default config");
    }

    Linter::from_config(&cfg).map_err(io::Error::other)
}

fn main() -> io::Result<()> {
    env_logger::init();

    let cli = Cli::parse();

    match cli.command {
        #[cfg(feature = "lsp")]
        Commands::Lsp => {
            // LSP needs tokio runtime
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(async { ytt_lint_lsp::lsp::run(cli.config).await })?;
            Ok(())
        }
        #[cfg(not(feature = "lsp"))]
        Commands::Lsp => {
            eprintln!("Error: built without the lsp feature");
            std::process::exit(2);
        }
        Commands::Lint {
            file,
            root,
            language,
            check,
        } => {
            let start_dir = start_dir_for(file.as_deref())?;
            let linter = match load_linter(cli.config.as_deref(), &start_dir) {
                Ok(linter) => linter,
                Err(e) => {
                    eprintln!("Error: {}", e);
                    std::process::exit(2);
                }
            };

            let text = read_all(file.as_ref())?;
            let language_id = language
                .or_else(|| {
                    file.as_deref()
                        .and_then(linter::language_for_path)
                        .map(str::to_string)
                })
                .unwrap_or_else(|| "yaml".to_string());
            let source_path = file
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| STDIN_SOURCE.to_string());

            let request = LintRequest {
                text,
                document_uri: source_path.clone(),
                source_path,
                root_path: root,
                language_id,
                sequence: 1,
            };

            let rt = tokio::runtime::Runtime::new()?;
            let report = match rt.block_on(linter::lint(&linter, &request)) {
                Ok(Some(report)) => report,
                Ok(None) => {
                    eprintln!(
                        "Skipping {}: language '{}' is not linted",
                        request.source_path, request.language_id
                    );
                    return Ok(());
                }
                Err(e) => {
                    eprintln!("Error: {}", e);
                    std::process::exit(2);
                }
            };

            let found = print_report(&report, &request.source_path);
            if found == 0 {
                if !check {
                    println!("No issues found");
                }
                return Ok(());
            }

            if check {
                std::process::exit(1);
            }
            Ok(())
        }
        Commands::Pull {
            kubeconfig,
            context,
        } => {
            let command = SchemaCommand::Pull {
                kubeconfig: kubeconfig.unwrap_or_else(schema::default_kubeconfig),
                context,
            };
            run_schema_command(cli.config.as_deref(), command)
        }
        Commands::Import { file } => {
            let file = fs::canonicalize(&file).unwrap_or(file);
            let start_dir = start_dir_for(Some(&file))?;
            let command = SchemaCommand::Import { file };
            run_schema_with_start_dir(cli.config.as_deref(), &start_dir, command)
        }
    }
}

fn run_schema_command(config_path: Option<&Path>, command: SchemaCommand) -> io::Result<()> {
    let start_dir = std::env::current_dir()?;
    run_schema_with_start_dir(config_path, &start_dir, command)
}

fn run_schema_with_start_dir(
    config_path: Option<&Path>,
    start_dir: &Path,
    command: SchemaCommand,
) -> io::Result<()> {
    let linter = match load_linter(config_path, start_dir) {
        Ok(linter) => linter,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(2);
        }
    };

    let rt = tokio::runtime::Runtime::new()?;
    let code = rt
        .block_on(schema::run(&linter, &command, |line| println!("{}", line)))
        .map_err(io::Error::other)?;

    if code != 0 {
        std::process::exit(code);
    }
    Ok(())
}

/// Print findings, returning how many were printed.
fn print_report(report: &ParsedReport, file_name: &str) -> usize {
    for finding in &report.findings {
        let severity = "\x1b[31merror\x1b[0m"; // red
        let code = finding
            .code
            .as_ref()
            .map(|c| format!("[{}]", c))
            .unwrap_or_default();

        println!(
            "{severity}{code}: {} at {}:{}:{}",
            finding.message,
            file_name,
            finding.range.line + 1,
            finding.range.start_character + 1
        );
    }

    for locationless in &report.locationless {
        println!("\x1b[33mwarning\x1b[0m: {}", locationless.user_message()); // yellow
    }
    for error in &report.errors {
        eprintln!("internal error: {}", error);
    }

    let total = report.findings.len() + report.locationless.len();
    if total > 0 {
        println!("\nFound {} issue(s)", total);
    }
    total
}
