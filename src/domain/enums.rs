use serde::{Deserialize, Serialize};

/// Workflow status of a task, independent of whether its timer is running
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TaskStatus {
    #[default]
    #[serde(rename = "pending")]
    Pending,
    #[serde(rename = "in-progress")]
    InProgress,
    #[serde(rename = "done")]
    Done,
}

impl TaskStatus {
    /// Parse status from its stored form ("pending", "in-progress", "done")
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag.trim() {
            "pending" => Some(Self::Pending),
            "in-progress" => Some(Self::InProgress),
            "done" => Some(Self::Done),
            _ => None,
        }
    }

    /// Convert status to its stored form
    pub fn to_tag(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in-progress",
            Self::Done => "done",
        }
    }

    /// Human-readable label for lists and reports
    pub fn label(&self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::InProgress => "In progress",
            Self::Done => "Done",
        }
    }

    /// All statuses in workflow order
    pub fn all() -> &'static [TaskStatus] {
        &[TaskStatus::Pending, TaskStatus::InProgress, TaskStatus::Done]
    }
}

/// Timer state of a task, derived from `is_timer_running`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerState {
    Stopped,
    Running,
}

impl TimerState {
    pub fn to_tag(&self) -> &'static str {
        match self {
            Self::Stopped => "STOPPED",
            Self::Running => "RUNNING",
        }
    }
}

/// Subscription plan of the signed-in freelancer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Plan {
    #[default]
    Free,
    Paid,
}

impl Plan {
    pub fn label(&self) -> &'static str {
        match self {
            Plan::Free => "free",
            Plan::Paid => "paid",
        }
    }
}

/// UI mode for the terminal view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiMode {
    Normal,
    ConfirmQuit, // Shown when quitting with a timer still running
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_status_from_tag() {
        assert_eq!(TaskStatus::from_tag("pending"), Some(TaskStatus::Pending));
        assert_eq!(TaskStatus::from_tag("in-progress"), Some(TaskStatus::InProgress));
        assert_eq!(TaskStatus::from_tag(" done "), Some(TaskStatus::Done));
        assert_eq!(TaskStatus::from_tag("in_progress"), None);
        assert_eq!(TaskStatus::from_tag("DONE"), None);
    }

    #[test]
    fn test_task_status_tags_round_trip() {
        for status in TaskStatus::all() {
            assert_eq!(TaskStatus::from_tag(status.to_tag()), Some(*status));
        }
    }

    #[test]
    fn test_task_status_serializes_with_hyphen() {
        let json = serde_json::to_string(&TaskStatus::InProgress).unwrap();
        assert_eq!(json, "\"in-progress\"");
        let parsed: TaskStatus = serde_json::from_str("\"pending\"").unwrap();
        assert_eq!(parsed, TaskStatus::Pending);
    }

    #[test]
    fn test_plan_serde() {
        assert_eq!(serde_json::to_string(&Plan::Paid).unwrap(), "\"paid\"");
        assert_eq!(Plan::default(), Plan::Free);
    }
}
