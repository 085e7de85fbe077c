use std::fmt;
use std::time::{Duration, Instant};

/// Default auto-dismiss window for notices.
pub const DEFAULT_NOTICE_TTL: Duration = Duration::from_secs(3);

/// Identifier for a published notice.
pub type NoticeId = u64;

/// Severity of a notice.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Severity {
    Success,
    Info,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => write!(f, "success"),
            Self::Info => write!(f, "info"),
            Self::Warning => write!(f, "warning"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// A transient user-facing notice.
#[derive(Clone, Debug, PartialEq)]
pub struct Notice {
    pub id: NoticeId,
    pub message: String,
    pub severity: Severity,
    /// Auto-dismiss window; `None` keeps the notice until dismissed.
    pub ttl: Option<Duration>,
    published_at: Instant,
}

impl Notice {
    fn expired_at(&self, now: Instant) -> bool {
        match self.ttl {
            Some(ttl) => now.saturating_duration_since(self.published_at) >= ttl,
            None => false,
        }
    }
}

/// Publish/dismiss store for transient notices.
///
/// There is no background timer: expired notices are swept whenever the
/// active set is read.
#[derive(Debug, Default)]
pub struct NoticeCenter {
    notices: Vec<Notice>,
    next_id: NoticeId,
}

impl NoticeCenter {
    /// Create an empty center.
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish a notice with the default auto-dismiss window.
    pub fn publish(&mut self, message: impl Into<String>, severity: Severity) -> NoticeId {
        self.publish_with_ttl(message, severity, Some(DEFAULT_NOTICE_TTL))
    }

    /// Publish a notice with an explicit auto-dismiss window.
    pub fn publish_with_ttl(
        &mut self,
        message: impl Into<String>,
        severity: Severity,
        ttl: Option<Duration>,
    ) -> NoticeId {
        self.next_id += 1;
        let id = self.next_id;
        self.notices.push(Notice {
            id,
            message: message.into(),
            severity,
            ttl,
            published_at: Instant::now(),
        });
        id
    }

    /// Dismiss a notice by id. Returns `false` if the id is not live.
    pub fn dismiss(&mut self, id: NoticeId) -> bool {
        let before = self.notices.len();
        self.notices.retain(|n| n.id != id);
        self.notices.len() != before
    }

    /// Dismiss every notice.
    pub fn clear(&mut self) {
        self.notices.clear();
    }

    /// The live notices in publication order, sweeping expired ones first.
    pub fn active(&mut self) -> &[Notice] {
        let now = Instant::now();
        self.notices.retain(|n| !n.expired_at(now));
        &self.notices
    }
}
