//! In-flight lint runs, at most one per document.

use std::collections::HashMap;

use tokio::task::AbortHandle;

struct InFlight {
    sequence: u64,
    handle: AbortHandle,
}

/// Tracks the task running the linter for each document.
///
/// Starting a run for a document aborts the previous one. Aborting drops the
/// run's future, and with it the child process (`kill_on_drop`).
#[derive(Default)]
pub struct RunRegistry {
    runs: HashMap<String, InFlight>,
}

impl RunRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register run `sequence` for `uri`, aborting any older run.
    pub fn start(&mut self, uri: &str, sequence: u64, handle: AbortHandle) {
        if let Some(previous) = self.runs.insert(uri.to_string(), InFlight { sequence, handle }) {
            log::debug!(
                "Run {} for {} superseded by run {}",
                previous.sequence,
                uri,
                sequence
            );
            previous.handle.abort();
        }
    }

    /// Forget run `sequence` once it completed. Newer runs are left alone.
    pub fn finish(&mut self, uri: &str, sequence: u64) {
        if self
            .runs
            .get(uri)
            .is_some_and(|run| run.sequence == sequence)
        {
            self.runs.remove(uri);
        }
    }

    /// Abort the run for `uri`, if any.
    pub fn cancel(&mut self, uri: &str) -> bool {
        match self.runs.remove(uri) {
            Some(run) => {
                run.handle.abort();
                true
            }
            None => false,
        }
    }

    pub fn cancel_all(&mut self) {
        for (_, run) in self.runs.drain() {
            run.handle.abort();
        }
    }

    pub fn in_flight(&self, uri: &str) -> Option<u64> {
        self.runs.get(uri).map(|run| run.sequence)
    }

    pub fn len(&self) -> usize {
        self.runs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }
}
