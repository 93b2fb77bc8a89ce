//! Single-slot status line with severity and auto-expiry.

use std::time::{Duration, Instant};

/// Default lifetime of success and info messages.
pub const DEFAULT_TTL: Duration = Duration::from_secs(5);

/// Severity of a status message.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StatusKind {
    Success,
    Error,
    Info,
}

impl StatusKind {
    /// Glyph shown in front of the message.
    pub fn icon(self) -> &'static str {
        match self {
            StatusKind::Success => "✅",
            StatusKind::Error => "❌",
            StatusKind::Info => "ℹ️",
        }
    }
}

/// The message currently on display.
#[derive(Clone, Debug)]
pub struct Status {
    pub kind: StatusKind,
    pub message: String,
    /// `None` for errors, which stay until replaced.
    expires_at: Option<Instant>,
}

/// Holds at most one status; the last `show` wins.
#[derive(Debug)]
pub struct Notifier {
    ttl: Duration,
    current: Option<Status>,
}

impl Notifier {
    pub fn new(ttl: Duration) -> Self {
        Self { ttl, current: None }
    }

    /// Replace whatever is displayed with a new message.
    pub fn show(&mut self, kind: StatusKind, message: impl Into<String>, now: Instant) {
        let message = message.into();
        match kind {
            StatusKind::Error => tracing::warn!("status error: {message}"),
            _ => tracing::info!("status: {message}"),
        }
        let expires_at = match kind {
            StatusKind::Error => None,
            StatusKind::Success | StatusKind::Info => Some(now + self.ttl),
        };
        self.current = Some(Status {
            kind,
            message,
            expires_at,
        });
    }

    /// Drop the current message once its deadline has passed.
    pub fn expire(&mut self, now: Instant) {
        if let Some(deadline) = self.current.as_ref().and_then(|s| s.expires_at)
            && now >= deadline
        {
            self.current = None;
        }
    }

    pub fn current(&self) -> Option<&Status> {
        self.current.as_ref()
    }
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_and_info_expire_after_ttl() {
        let t0 = Instant::now();
        let mut n = Notifier::default();

        n.show(StatusKind::Success, "done", t0);
        n.expire(t0 + Duration::from_millis(4999));
        assert_eq!(n.current().map(|s| s.message.as_str()), Some("done"));
        n.expire(t0 + DEFAULT_TTL);
        assert!(n.current().is_none());

        n.show(StatusKind::Info, "fyi", t0);
        n.expire(t0 + Duration::from_secs(6));
        assert!(n.current().is_none());
    }

    #[test]
    fn errors_persist_until_replaced() {
        let t0 = Instant::now();
        let mut n = Notifier::default();

        n.show(StatusKind::Error, "boom", t0);
        n.expire(t0 + Duration::from_secs(3600));
        assert_eq!(n.current().map(|s| s.kind), Some(StatusKind::Error));

        n.show(StatusKind::Info, "next", t0);
        assert_eq!(n.current().map(|s| s.message.as_str()), Some("next"));
    }

    #[test]
    fn last_write_wins_and_resets_deadline() {
        let t0 = Instant::now();
        let mut n = Notifier::default();

        n.show(StatusKind::Success, "first", t0);
        n.show(StatusKind::Info, "second", t0 + Duration::from_secs(4));
        // The first deadline would have passed; the second has not.
        n.expire(t0 + Duration::from_secs(6));
        assert_eq!(n.current().map(|s| s.message.as_str()), Some("second"));
    }

    #[test]
    fn icons_are_fixed_per_kind() {
        assert_eq!(StatusKind::Success.icon(), "✅");
        assert_eq!(StatusKind::Error.icon(), "❌");
        assert_eq!(StatusKind::Info.icon(), "ℹ️");
    }
}
