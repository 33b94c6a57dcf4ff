//! User-visible notices for timer and task actions.
//! Desktop notifications are only sent on macOS.

use crate::domain::format_hms;
use crate::error::BillableError;

#[cfg(target_os = "macos")]
use std::process::Command;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Destructive,
}

/// A short message shown after an action
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub title: String,
    pub description: String,
}

impl Notice {
    pub fn success(title: &str, description: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Success,
            title: title.to_string(),
            description: description.into(),
        }
    }

    pub fn destructive(title: &str, description: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Destructive,
            title: title.to_string(),
            description: description.into(),
        }
    }

    pub fn timer_started() -> Self {
        Self::success("Timer Started", "Task timer has been started")
    }

    pub fn timer_stopped(session_seconds: u64) -> Self {
        Self::success("Timer Stopped", format!("Session time: {}", format_hms(session_seconds)))
    }

    pub fn entry_added() -> Self {
        Self::success("Success", "Time entry added successfully")
    }

    /// Failure notice for `action` ("start timer", "add time entry", ...)
    pub fn failed(action: &str, err: &BillableError) -> Self {
        match err {
            BillableError::InvalidInput(reason) => Self::destructive("Invalid Input", reason.clone()),
            BillableError::SessionExpired => Self::destructive("Signed Out", err.to_string()),
            _ => Self::destructive("Error", format!("Failed to {}: {}", action, err)),
        }
    }

    pub fn is_error(&self) -> bool {
        self.kind == NoticeKind::Destructive
    }

    pub fn line(&self) -> String {
        format!("{}: {}", self.title, self.description)
    }
}

/// Send a desktop notification when a session is stopped
pub fn notify_timer_stopped(task_name: &str, session_seconds: u64) {
    #[cfg(target_os = "macos")]
    {
        let script = format!(
            r#"display notification "{} ({})" with title "billable - Timer Stopped""#,
            task_name.replace('"', "\\\""),
            format_hms(session_seconds)
        );

        let _ = Command::new("osascript")
            .arg("-e")
            .arg(&script)
            .output();
    }

    #[cfg(not(target_os = "macos"))]
    {
        let _ = (task_name, session_seconds);
    }
}
