//! Transient notifications (toasts)

use std::time::{Duration, Instant};

use tracing::debug;

pub const DEFAULT_TOAST_DURATION: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastLevel {
    Success,
    Error,
    Info,
    Warning,
}

impl ToastLevel {
    pub fn label(&self) -> &'static str {
        match self {
            ToastLevel::Success => "OK",
            ToastLevel::Error => "ERROR",
            ToastLevel::Info => "INFO",
            ToastLevel::Warning => "WARN",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Toast {
    pub level: ToastLevel,
    pub message: String,
    pub created: Instant,
}

impl Toast {
    pub fn is_expired(&self, now: Instant, duration: Duration) -> bool {
        now.duration_since(self.created) >= duration
    }
}

/// Queue of toasts; each disappears after `duration`
#[derive(Debug, Clone)]
pub struct Notifier {
    toasts: Vec<Toast>,
    duration: Duration,
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new(DEFAULT_TOAST_DURATION)
    }
}

impl Notifier {
    pub fn new(duration: Duration) -> Self {
        Self {
            toasts: Vec::new(),
            duration,
        }
    }

    pub fn show(&mut self, level: ToastLevel, message: impl Into<String>) {
        let message = message.into();
        debug!("toast [{}] {}", level.label(), message);
        self.toasts.push(Toast {
            level,
            message,
            created: Instant::now(),
        });
    }

    pub fn success(&mut self, message: impl Into<String>) {
        self.show(ToastLevel::Success, message);
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.show(ToastLevel::Error, message);
    }

    pub fn info(&mut self, message: impl Into<String>) {
        self.show(ToastLevel::Info, message);
    }

    pub fn warning(&mut self, message: impl Into<String>) {
        self.show(ToastLevel::Warning, message);
    }

    /// Drop toasts older than the display duration
    pub fn prune(&mut self, now: Instant) {
        let duration = self.duration;
        self.toasts.retain(|t| !t.is_expired(now, duration));
    }

    pub fn toasts(&self) -> &[Toast] {
        &self.toasts
    }

    /// Remove and return every queued toast
    pub fn drain(&mut self) -> Vec<Toast> {
        std::mem::take(&mut self.toasts)
    }

    pub fn last(&self) -> Option<&Toast> {
        self.toasts.last()
    }

    pub fn is_empty(&self) -> bool {
        self.toasts.is_empty()
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn set_duration(&mut self, duration: Duration) {
        self.duration = duration;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toasts_expire() {
        let mut notifier = Notifier::new(Duration::from_millis(100));
        notifier.success("Kendaraan dihapus");
        notifier.error("Gagal menghapus data uji");
        assert_eq!(notifier.toasts().len(), 2);
        assert_eq!(notifier.last().map(|t| t.level), Some(ToastLevel::Error));

        let created = notifier.toasts()[0].created;
        notifier.prune(created + Duration::from_millis(50));
        assert_eq!(notifier.toasts().len(), 2);
        notifier.prune(created + Duration::from_secs(1));
        assert!(notifier.is_empty());
    }

    #[test]
    fn test_drain_empties_queue() {
        let mut notifier = Notifier::default();
        notifier.info("Memuat data");
        let drained = notifier.drain();
        assert_eq!(drained.len(), 1);
        assert_eq!(drained[0].message, "Memuat data");
        assert!(notifier.is_empty());
        assert_eq!(notifier.duration(), DEFAULT_TOAST_DURATION);
    }
}
