use std::io::Write;

use tuxseo_core::{Notification, Severity};
use tuxseo_logging::{tux_info, tux_warn};

use super::render;

/// Non-blocking user feedback channel.
pub trait Notifier: Send {
    fn notify(&self, notification: &Notification);
}

/// Writes notifications to stdout, as text or as HTML fragments.
pub struct TerminalNotifier {
    html: bool,
}

impl TerminalNotifier {
    pub fn new(html: bool) -> Self {
        Self { html }
    }
}

impl Notifier for TerminalNotifier {
    fn notify(&self, notification: &Notification) {
        match notification.severity {
            Severity::Success => tux_info!("notify: {}", notification.text),
            Severity::Error => tux_warn!("notify: {}", notification.text),
        }
        let line = if self.html {
            render::notification(notification)
        } else {
            let marker = match notification.severity {
                Severity::Success => "ok",
                Severity::Error => "error",
            };
            format!("[{marker}] {}", notification.text)
        };
        let _ = writeln!(std::io::stdout().lock(), "{line}");
    }
}

impl<N: Notifier + Sync> Notifier for std::sync::Arc<N> {
    fn notify(&self, notification: &Notification) {
        (**self).notify(notification);
    }
}

/// Keeps notifications in memory.
#[cfg(test)]
#[derive(Default)]
pub struct RecordingNotifier {
    seen: std::sync::Mutex<Vec<Notification>>,
}

#[cfg(test)]
impl RecordingNotifier {
    pub fn take(&self) -> Vec<Notification> {
        self.seen
            .lock()
            .map(|mut seen| std::mem::take(&mut *seen))
            .unwrap_or_default()
    }
}

#[cfg(test)]
impl Notifier for RecordingNotifier {
    fn notify(&self, notification: &Notification) {
        if let Ok(mut seen) = self.seen.lock() {
            seen.push(notification.clone());
        }
    }
}
