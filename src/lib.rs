pub mod config;
pub mod diagnostics;
pub mod linter;
pub mod position;
pub mod report;
pub mod scheduler;
pub mod schema;

#[cfg(feature = "lsp")]
pub mod lsp;

pub use config::Config;
pub use config::ConfigBuilder;
pub use diagnostics::{DiagnosticStore, ReconcileMode};
pub use linter::{LintRequest, Linter, LinterError};
pub use report::{Finding, ParsedReport};
