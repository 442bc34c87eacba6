//! Diagnostic store: the reconciled set of findings per open document.

use std::collections::{HashMap, HashSet};

use serde::Deserialize;

use crate::report::Finding;

/// How a completed run replaces previously published findings.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum ReconcileMode {
    /// Clear findings of every document, then set the linted one.
    /// Linting A erases B's markers until B is linted again.
    #[default]
    Global,
    /// Only replace the linted document's findings.
    PerDocument,
}

/// A set of findings to hand to the display layer for one document.
/// An empty `findings` clears the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Publish {
    pub uri: String,
    pub findings: Vec<Finding>,
}

/// Why a reconcile call was refused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejected {
    /// The document was closed while the run was in flight
    Closed,
    /// A newer run for the document has already been accepted
    Stale { sequence: u64, latest: u64 },
}

impl std::fmt::Display for Rejected {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Closed => write!(f, "document is not open"),
            Self::Stale { sequence, latest } => {
                write!(f, "run {} is older than accepted run {}", sequence, latest)
            }
        }
    }
}

pub struct DiagnosticStore {
    mode: ReconcileMode,
    open: HashSet<String>,
    entries: HashMap<String, Vec<Finding>>,
    accepted: HashMap<String, u64>,
}

impl DiagnosticStore {
    pub fn new(mode: ReconcileMode) -> Self {
        Self {
            mode,
            open: HashSet::new(),
            entries: HashMap::new(),
            accepted: HashMap::new(),
        }
    }

    pub fn mode(&self) -> ReconcileMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: ReconcileMode) {
        self.mode = mode;
    }

    /// Start tracking a document. Only open documents accept findings.
    pub fn open(&mut self, uri: &str) {
        self.open.insert(uri.to_string());
    }

    pub fn is_open(&self, uri: &str) -> bool {
        self.open.contains(uri)
    }

    /// Stop tracking a document, returning the publish that clears it.
    pub fn close(&mut self, uri: &str) -> Publish {
        self.open.remove(uri);
        self.entries.remove(uri);
        self.accepted.remove(uri);
        Publish {
            uri: uri.to_string(),
            findings: Vec::new(),
        }
    }

    /// Replace the findings for `uri` with the result of run `sequence`.
    ///
    /// Returns every publish the display layer needs to apply, in order.
    pub fn reconcile(
        &mut self,
        uri: &str,
        sequence: u64,
        findings: Vec<Finding>,
    ) -> Result<Vec<Publish>, Rejected> {
        if !self.open.contains(uri) {
            return Err(Rejected::Closed);
        }
        if let Some(&latest) = self.accepted.get(uri)
            && sequence < latest
        {
            return Err(Rejected::Stale { sequence, latest });
        }
        self.accepted.insert(uri.to_string(), sequence);

        let mut publishes = Vec::new();

        if self.mode == ReconcileMode::Global {
            let mut cleared: Vec<String> = self
                .entries
                .drain()
                .map(|(other, _)| other)
                .filter(|other| other != uri)
                .collect();
            cleared.sort();
            publishes.extend(cleared.into_iter().map(|other| Publish {
                uri: other,
                findings: Vec::new(),
            }));
        }

        if findings.is_empty() {
            self.entries.remove(uri);
        } else {
            self.entries.insert(uri.to_string(), findings.clone());
        }
        publishes.push(Publish {
            uri: uri.to_string(),
            findings,
        });

        Ok(publishes)
    }

    /// Currently displayed findings for a document.
    pub fn findings(&self, uri: &str) -> &[Finding] {
        self.entries.get(uri).map(Vec::as_slice).unwrap_or(&[])
    }

    /// All documents with findings, sorted by URI.
    pub fn snapshot(&self) -> Vec<(String, Vec<Finding>)> {
        let mut entries: Vec<(String, Vec<Finding>)> = self
            .entries
            .iter()
            .map(|(uri, findings)| (uri.clone(), findings.clone()))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        entries
    }

    /// Drop everything, returning clearing publishes for documents that had findings.
    pub fn clear(&mut self) -> Vec<Publish> {
        let mut uris: Vec<String> = self.entries.drain().map(|(uri, _)| uri).collect();
        uris.sort();
        self.open.clear();
        self.accepted.clear();
        uris.into_iter()
            .map(|uri| Publish {
                uri,
                findings: Vec::new(),
            })
            .collect()
    }
}
