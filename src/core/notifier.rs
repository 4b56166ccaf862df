use async_trait::async_trait;
use std::sync::Mutex;

/// Severity of a user-facing notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Success,
    Info,
    Warning,
    Error,
}

/// A blocking yes/no question shown before destructive actions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Confirmation {
    pub title: String,
    pub confirm_label: String,
    pub cancel_label: String,
}

/// Toast, alert and confirm primitives injected into the controllers.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Transient, non-blocking message.
    fn toast(&self, level: Level, message: &str);

    /// Message that stays until dismissed.
    fn alert(&self, level: Level, title: &str, detail: Option<&str>);

    /// Resolves to `true` only when the user explicitly agrees.
    async fn confirm(&self, confirmation: &Confirmation) -> bool;
}

/// One notification captured by [`RecordingNotifier`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Toast(Level, String),
    Alert(Level, String, Option<String>),
    Confirm(String),
}

/// Notifier that records everything and answers confirmations with a fixed
/// reply. Used by headless callers and tests.
#[derive(Debug)]
pub struct RecordingNotifier {
    answer: bool,
    notices: Mutex<Vec<Notice>>,
}

impl RecordingNotifier {
    pub fn new(answer: bool) -> Self {
        Self {
            answer,
            notices: Mutex::new(Vec::new()),
        }
    }

    pub fn notices(&self) -> Vec<Notice> {
        self.notices
            .lock()
            .map(|n| n.clone())
            .unwrap_or_default()
    }

    pub fn count(&self, pred: impl Fn(&Notice) -> bool) -> usize {
        self.notices().iter().filter(|n| pred(n)).count()
    }

    fn record(&self, notice: Notice) {
        if let Ok(mut notices) = self.notices.lock() {
            notices.push(notice);
        }
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    fn toast(&self, level: Level, message: &str) {
        self.record(Notice::Toast(level, message.to_string()));
    }

    fn alert(&self, level: Level, title: &str, detail: Option<&str>) {
        self.record(Notice::Alert(
            level,
            title.to_string(),
            detail.map(str::to_string),
        ));
    }

    async fn confirm(&self, confirmation: &Confirmation) -> bool {
        self.record(Notice::Confirm(confirmation.title.clone()));
        self.answer
    }
}
