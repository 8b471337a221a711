// Notifications - error reporting from the engine back to the UI

use std::time::{SystemTime, UNIX_EPOCH};

/// Severity of a notification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Info,
    Warning,
    Error,
}

/// Which subsystem raised the notification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationCategory {
    Audio,
    Sampler,
    Project,
    Generic,
}

/// A timestamped message for the control thread to display or log.
#[derive(Debug, Clone)]
pub struct Notification {
    pub level: NotificationLevel,
    pub category: NotificationCategory,
    pub message: String,
    /// Unix timestamp in milliseconds
    pub timestamp: u64,
}

impl Notification {
    pub fn new(level: NotificationLevel, category: NotificationCategory, message: String) -> Self {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64;

        Self {
            level,
            category,
            message,
            timestamp,
        }
    }

    pub fn info(category: NotificationCategory, message: String) -> Self {
        Self::new(NotificationLevel::Info, category, message)
    }

    pub fn warning(category: NotificationCategory, message: String) -> Self {
        Self::new(NotificationLevel::Warning, category, message)
    }

    pub fn error(category: NotificationCategory, message: String) -> Self {
        Self::new(NotificationLevel::Error, category, message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notification_helpers() {
        let info = Notification::info(NotificationCategory::Audio, "connected".to_string());
        let warning = Notification::warning(NotificationCategory::Sampler, "dropped".to_string());
        let error = Notification::error(NotificationCategory::Generic, "boom".to_string());

        assert_eq!(info.level, NotificationLevel::Info);
        assert_eq!(warning.level, NotificationLevel::Warning);
        assert_eq!(error.level, NotificationLevel::Error);
        assert_eq!(error.category, NotificationCategory::Generic);
        assert!(info.timestamp > 0);
    }
}
