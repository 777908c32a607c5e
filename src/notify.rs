//! User-facing notifications ("toasts") emitted by a [`crate::session::Session`].
//!
//! Inject an [`Arc<dyn NotificationSink>`] when building a session to receive
//! every user-visible outcome: a successful upload, a rejected entry, a
//! finished export. The library never prints; the host decides whether a
//! notification becomes a terminal line, a desktop toast or a log record.
//!
//! # Example
//!
//! ```rust
//! use mentoring_report::{Notification, NotificationSink, Session};
//! use std::sync::{Arc, Mutex};
//!
//! #[derive(Default)]
//! struct Collect(Mutex<Vec<Notification>>);
//!
//! impl NotificationSink for Collect {
//!     fn notify(&self, n: &Notification) {
//!         self.0.lock().unwrap().push(n.clone());
//!     }
//! }
//!
//! let sink = Arc::new(Collect::default());
//! let _session = Session::builder().sink(sink.clone()).build();
//! ```

use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Success,
    Warning,
    Error,
}

impl Severity {
    /// Toast title for this severity.
    pub fn title(self) -> &'static str {
        match self {
            Severity::Success => "Success",
            Severity::Warning => "Warning",
            Severity::Error => "Error",
        }
    }
}

/// One toast: a title, a one-line description and a severity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub title: String,
    pub description: String,
    pub severity: Severity,
}

impl Notification {
    pub fn new(severity: Severity, description: impl Into<String>) -> Self {
        Self {
            title: severity.title().to_string(),
            description: description.into(),
            severity,
        }
    }

    pub fn success(description: impl Into<String>) -> Self {
        Self::new(Severity::Success, description)
    }

    pub fn warning(description: impl Into<String>) -> Self {
        Self::new(Severity::Warning, description)
    }

    pub fn error(description: impl Into<String>) -> Self {
        Self::new(Severity::Error, description)
    }
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.title, self.description)
    }
}

/// Receives notifications from a session.
///
/// Implementations must be `Send + Sync`; a session may be moved across
/// tasks. The default method drops the notification.
pub trait NotificationSink: Send + Sync {
    fn notify(&self, notification: &Notification) {
        let _ = notification;
    }
}

/// Discards everything. The default when no sink is configured.
pub struct NoopSink;

impl NotificationSink for NoopSink {}

/// Forwards notifications to `tracing` at a level matching the severity.
pub struct TracingSink;

impl NotificationSink for TracingSink {
    fn notify(&self, n: &Notification) {
        match n.severity {
            Severity::Success => info!(target: "mentoring_report::notify", "{}", n),
            Severity::Warning => warn!(target: "mentoring_report::notify", "{}", n),
            Severity::Error => error!(target: "mentoring_report::notify", "{}", n),
        }
    }
}

/// Shared handle stored by [`crate::session::Session`].
pub type SharedSink = Arc<dyn NotificationSink>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recording(Mutex<Vec<Notification>>);

    impl NotificationSink for Recording {
        fn notify(&self, n: &Notification) {
            self.0.lock().unwrap().push(n.clone());
        }
    }

    #[test]
    fn titles_follow_severity() {
        assert_eq!(Notification::success("ok").title, "Success");
        assert_eq!(Notification::warning("hm").title, "Warning");
        assert_eq!(Notification::error("no").title, "Error");
    }

    #[test]
    fn sink_is_object_safe_and_shareable() {
        let rec = Arc::new(Recording::default());
        let sink: SharedSink = rec.clone();
        sink.notify(&Notification::success("File uploaded successfully!"));
        let seen = rec.0.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].to_string(), "Success: File uploaded successfully!");
    }

    #[test]
    fn noop_and_tracing_sinks_accept_everything() {
        NoopSink.notify(&Notification::error("x"));
        TracingSink.notify(&Notification::warning("y"));
    }
}
