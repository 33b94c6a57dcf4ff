use super::enums::{TaskStatus, TimerState};
use crate::error::{BillableError, BillableResult};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

/// A user-declared block of time not measured by the timer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManualTimeEntry {
    pub date: NaiveDate,
    pub hours: u32,
    pub minutes: u32,
    #[serde(default)]
    pub description: String,
}

impl ManualTimeEntry {
    pub fn new(date: NaiveDate, hours: u32, minutes: u32, description: impl Into<String>) -> Self {
        Self {
            date,
            hours,
            minutes,
            description: description.into(),
        }
    }

    /// Duration of this entry in seconds
    pub fn seconds(&self) -> u64 {
        u64::from(self.hours) * 3600 + u64::from(self.minutes) * 60
    }
}

/// A unit of billable work belonging to a project
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: Uuid,
    pub name: String,
    pub project: String,
    #[serde(default)]
    pub status: TaskStatus,
    #[serde(default)]
    pub assigned_to: Option<String>,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    /// Accumulated seconds from stopped sessions and manual entries
    #[serde(default)]
    pub time_spent: u64,
    #[serde(default)]
    pub is_timer_running: bool,
    /// Start of the current session; set only while the timer runs
    #[serde(default)]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub manual_time_entries: Vec<ManualTimeEntry>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<ManualTimeEntry>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<ManualTimeEntry>>::deserialize(deserializer)?.unwrap_or_default())
}

impl Task {
    pub fn new(name: impl Into<String>, project: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            project: project.into(),
            status: TaskStatus::Pending,
            assigned_to: None,
            due_date: None,
            time_spent: 0,
            is_timer_running: false,
            start_time: None,
            end_time: None,
            manual_time_entries: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn timer_state(&self) -> TimerState {
        if self.is_timer_running {
            TimerState::Running
        } else {
            TimerState::Stopped
        }
    }

    /// Seconds contributed by manual entries
    pub fn manual_seconds(&self) -> u64 {
        self.manual_time_entries.iter().map(ManualTimeEntry::seconds).sum()
    }

    /// Short id used on the command line
    pub fn short_id(&self) -> String {
        self.id.simple().to_string()[..8].to_string()
    }

    /// Whether `is_timer_running` and `start_time` agree
    pub fn timer_fields_consistent(&self) -> bool {
        self.is_timer_running == self.start_time.is_some()
    }
}

/// Field updates written to the store; `None` leaves a field untouched
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskPatch {
    pub name: Option<String>,
    pub project: Option<String>,
    pub status: Option<TaskStatus>,
    pub assigned_to: Option<Option<String>>,
    pub due_date: Option<Option<NaiveDate>>,
    pub time_spent: Option<u64>,
    pub is_timer_running: Option<bool>,
    pub start_time: Option<Option<DateTime<Utc>>>,
    pub end_time: Option<Option<DateTime<Utc>>>,
    pub manual_time_entries: Option<Vec<ManualTimeEntry>>,
}

impl TaskPatch {
    /// Apply the patch to a task record. `updated_at` is left to the caller.
    pub fn apply_to(&self, task: &mut Task) {
        if let Some(name) = &self.name {
            task.name = name.clone();
        }
        if let Some(project) = &self.project {
            task.project = project.clone();
        }
        if let Some(status) = self.status {
            task.status = status;
        }
        if let Some(assigned_to) = &self.assigned_to {
            task.assigned_to = assigned_to.clone();
        }
        if let Some(due_date) = self.due_date {
            task.due_date = due_date;
        }
        if let Some(time_spent) = self.time_spent {
            task.time_spent = time_spent;
        }
        if let Some(running) = self.is_timer_running {
            task.is_timer_running = running;
        }
        if let Some(start_time) = self.start_time {
            task.start_time = start_time;
        }
        if let Some(end_time) = self.end_time {
            task.end_time = end_time;
        }
        if let Some(entries) = &self.manual_time_entries {
            task.manual_time_entries = entries.clone();
        }
    }
}

/// Raw task form input, validated before anything reaches the store
#[derive(Debug, Clone, Default)]
pub struct TaskDraft {
    pub name: String,
    pub project: String,
    pub status: String,
    pub assigned_to: String,
    pub due_date: String,
}

/// Task fields that passed validation
#[derive(Debug, Clone, PartialEq)]
pub struct ValidTaskFields {
    pub name: String,
    pub project: String,
    pub status: TaskStatus,
    pub assigned_to: Option<String>,
    pub due_date: Option<NaiveDate>,
}

impl TaskDraft {
    pub fn validate(&self) -> BillableResult<ValidTaskFields> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(BillableError::InvalidInput("task name is required".to_string()));
        }

        let project = self.project.trim();
        if project.is_empty() {
            return Err(BillableError::InvalidInput("project is required".to_string()));
        }

        let status = if self.status.trim().is_empty() {
            TaskStatus::Pending
        } else {
            TaskStatus::from_tag(&self.status).ok_or_else(|| {
                let expected: Vec<&str> = TaskStatus::all().iter().map(|s| s.to_tag()).collect();
                BillableError::InvalidInput(format!(
                    "unknown status '{}' (expected one of: {})",
                    self.status.trim(),
                    expected.join(", ")
                ))
            })?
        };

        let assigned_to = match self.assigned_to.trim() {
            "" => None,
            who => Some(who.to_string()),
        };

        let due_date = match self.due_date.trim() {
            "" => None,
            raw => Some(NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| {
                BillableError::InvalidInput(format!("invalid due date '{}', use YYYY-MM-DD", raw))
            })?),
        };

        Ok(ValidTaskFields {
            name: name.to_string(),
            project: project.to_string(),
            status,
            assigned_to,
            due_date,
        })
    }

    /// Build a fresh task record from the draft
    pub fn into_task(self) -> BillableResult<Task> {
        let fields = self.validate()?;
        let mut task = Task::new(fields.name, fields.project);
        task.status = fields.status;
        task.assigned_to = fields.assigned_to;
        task.due_date = fields.due_date;
        Ok(task)
    }

    /// Build an edit patch for an existing task. Timer fields are never touched.
    pub fn into_patch(self) -> BillableResult<TaskPatch> {
        let fields = self.validate()?;
        Ok(TaskPatch {
            name: Some(fields.name),
            project: Some(fields.project),
            status: Some(fields.status),
            assigned_to: Some(fields.assigned_to),
            due_date: Some(fields.due_date),
            ..TaskPatch::default()
        })
    }
}
