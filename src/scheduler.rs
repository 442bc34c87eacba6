//! Debounced lint scheduling for the focused document.
//!
//! There is a single timer slot for the whole session, tied to the focused
//! document. Every activation, focus change or edit of the focused document
//! re-arms it; when it finally fires, the trigger runs for whichever document
//! is focused at that moment.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;

/// Default quiet period before linting.
pub const DEFAULT_DELAY: Duration = Duration::from_millis(500);

/// Callback invoked with the focused document's URI when the timer fires.
pub type LintTrigger = Arc<dyn Fn(String) + Send + Sync>;

#[derive(Default)]
struct Session {
    active: Option<String>,
    pending: Option<JoinHandle<()>>,
}

impl Session {
    fn cancel_pending(&mut self) {
        if let Some(pending) = self.pending.take() {
            pending.abort();
        }
    }
}

pub struct DebounceScheduler {
    session: Arc<Mutex<Session>>,
    delay: Mutex<Duration>,
    trigger: LintTrigger,
}

impl DebounceScheduler {
    pub fn new(delay: Duration, trigger: LintTrigger) -> Self {
        Self {
            session: Arc::new(Mutex::new(Session::default())),
            delay: Mutex::new(delay),
            trigger,
        }
    }

    pub async fn set_delay(&self, delay: Duration) {
        *self.delay.lock().await = delay;
    }

    pub async fn delay(&self) -> Duration {
        *self.delay.lock().await
    }

    pub async fn on_activate(&self) {
        let mut session = self.session.lock().await;
        self.arm(&mut session).await;
    }

    /// The editor focused `document`, or nothing.
    pub async fn on_focus_changed(&self, document: Option<String>) {
        let mut session = self.session.lock().await;
        session.active = document;
        self.arm(&mut session).await;
    }

    /// `document` was edited. Ignored unless it is the focused document.
    pub async fn on_text_changed(&self, document: &str) {
        let mut session = self.session.lock().await;
        if session.active.as_deref() != Some(document) {
            return;
        }
        self.arm(&mut session).await;
    }

    /// `document` was closed. Drops focus and the pending run if it was focused.
    pub async fn on_document_closed(&self, document: &str) {
        let mut session = self.session.lock().await;
        if session.active.as_deref() == Some(document) {
            session.active = None;
            session.cancel_pending();
        }
    }

    pub async fn active_document(&self) -> Option<String> {
        self.session.lock().await.active.clone()
    }

    pub async fn has_pending(&self) -> bool {
        self.session
            .lock()
            .await
            .pending
            .as_ref()
            .is_some_and(|pending| !pending.is_finished())
    }

    /// Cancel the pending timer and forget the focused document.
    pub async fn dispose(&self) {
        let mut session = self.session.lock().await;
        session.cancel_pending();
        session.active = None;
    }

    async fn arm(&self, session: &mut Session) {
        session.cancel_pending();

        let delay = *self.delay.lock().await;
        let shared = Arc::clone(&self.session);
        let trigger = Arc::clone(&self.trigger);

        session.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let active = shared.lock().await.active.clone();
            match active {
                Some(uri) => {
                    log::debug!("Debounce elapsed, linting {}", uri);
                    trigger(uri);
                }
                None => log::debug!("Debounce elapsed with no focused document"),
            }
        }));
    }
}
