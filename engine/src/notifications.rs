//! User-facing error notifications.
//!
//! The coordinator reports rejections through [`NotificationSink`]. It is
//! fire-and-forget: nothing the sink does flows back into the form.

use std::collections::VecDeque;

use signin_types::display_message;

const MAX_HISTORY: usize = 32;

/// Displays user-facing error messages.
pub trait NotificationSink {
    fn show_error(&mut self, title: Option<&str>, message: &str);
}

/// One displayed error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    title: Option<String>,
    message: String,
}

impl Notification {
    #[must_use]
    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// `title: message`, or just the message when untitled.
    #[must_use]
    pub fn format(&self) -> String {
        match &self.title {
            Some(title) => format!("{title}: {}", self.message),
            None => self.message.clone(),
        }
    }
}

/// In-memory sink backing the terminal UI.
///
/// Keeps a bounded history (oldest dropped first) and tracks whether the most
/// recent entry is still on screen.
#[derive(Debug, Default)]
pub struct MessageCenter {
    history: VecDeque<Notification>,
    visible: bool,
}

impl MessageCenter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The most recent notification, while it has not been dismissed.
    #[must_use]
    pub fn visible(&self) -> Option<&Notification> {
        if self.visible {
            self.history.back()
        } else {
            None
        }
    }

    #[must_use]
    pub fn latest(&self) -> Option<&Notification> {
        self.history.back()
    }

    /// Hide the current notification without forgetting it.
    pub fn dismiss(&mut self) {
        self.visible = false;
    }

    /// Take all recorded notifications, oldest first.
    pub fn take(&mut self) -> Vec<Notification> {
        self.visible = false;
        self.history.drain(..).collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.history.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }
}

impl NotificationSink for MessageCenter {
    fn show_error(&mut self, title: Option<&str>, message: &str) {
        let message = display_message(message);
        if message.is_empty() {
            return;
        }
        let title = title.map(display_message).filter(|t| !t.is_empty());
        tracing::warn!(title = title.as_deref(), "{message}");

        if self.history.len() == MAX_HISTORY {
            self.history.pop_front();
        }
        self.history.push_back(Notification { title, message });
        self.visible = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn show_error_records_and_shows() {
        let mut center = MessageCenter::new();
        assert!(center.is_empty());
        assert!(center.visible().is_none());

        center.show_error(None, "Invalid credentials");
        let shown = center.visible().unwrap();
        assert_eq!(shown.message(), "Invalid credentials");
        assert_eq!(shown.title(), None);
        assert_eq!(shown.format(), "Invalid credentials");
    }

    #[test]
    fn titled_notification_format() {
        let mut center = MessageCenter::new();
        center.show_error(Some("Sign in failed"), "Account locked");
        assert_eq!(
            center.latest().unwrap().format(),
            "Sign in failed: Account locked"
        );
    }

    #[test]
    fn repeated_messages_are_kept() {
        let mut center = MessageCenter::new();
        center.show_error(None, "Invalid credentials");
        center.show_error(None, "Invalid credentials");
        assert_eq!(center.len(), 2);
    }

    #[test]
    fn dismiss_hides_but_keeps_history() {
        let mut center = MessageCenter::new();
        center.show_error(None, "nope");
        center.dismiss();
        assert!(center.visible().is_none());
        assert_eq!(center.latest().unwrap().message(), "nope");
    }

    #[test]
    fn messages_are_sanitized() {
        let mut center = MessageCenter::new();
        center.show_error(Some("\x1b[1mTitle\x1b[0m"), "bad\x1b[2J\nthing");
        let latest = center.latest().unwrap();
        assert_eq!(latest.title(), Some("Title"));
        assert_eq!(latest.message(), "bad thing");
    }

    #[test]
    fn blank_messages_ignored() {
        let mut center = MessageCenter::new();
        center.show_error(None, " \x1b[0m ");
        assert!(center.is_empty());
    }

    #[test]
    fn history_is_bounded() {
        let mut center = MessageCenter::new();
        for i in 0..(MAX_HISTORY + 5) {
            center.show_error(None, &format!("error {i}"));
        }
        assert_eq!(center.len(), MAX_HISTORY);
        let all = center.take();
        assert_eq!(all[0].message(), "error 5");
        assert!(center.is_empty());
    }
}
