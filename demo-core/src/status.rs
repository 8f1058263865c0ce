use std::time::Duration;

use blackbox_explorer::ExportFormat;
use instant::Instant;

/// Outcome of a user action, surfaced in the status bar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Exported { file: String },
    ExportFailed { format: ExportFormat, reason: String },
    SessionSwitched { name: &'static str },
}

impl Notice {
    /// How long the notice stays up. Failures linger so they get read.
    pub fn lifetime(&self) -> Duration {
        match self {
            Notice::SessionSwitched { .. } => Duration::from_secs(2),
            Notice::Exported { .. } => Duration::from_secs(4),
            Notice::ExportFailed { .. } => Duration::from_secs(8),
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Notice::ExportFailed { .. })
    }

    pub fn text(&self) -> String {
        match self {
            Notice::Exported { file } => format!("Saved {file}"),
            Notice::ExportFailed { format, reason } => {
                format!("{} failed: {reason}", format.label())
            }
            Notice::SessionSwitched { name } => format!("Viewing {name}"),
        }
    }
}

/// Holds the latest [`Notice`]; posting replaces whatever is shown.
#[derive(Debug, Default)]
pub struct NoticeBoard {
    current: Option<(Notice, Instant)>,
}

impl NoticeBoard {
    pub fn post(&mut self, notice: Notice, now: Instant) {
        self.current = Some((notice, now));
    }

    /// The posted notice, unless its lifetime has run out by `now`.
    pub fn active(&self, now: Instant) -> Option<&Notice> {
        let (notice, posted_at) = self.current.as_ref()?;
        let age = now.saturating_duration_since(*posted_at);
        (age < notice.lifetime()).then_some(notice)
    }
}
