//! Task timer state machine.
//!
//! A timer is either stopped or running. Operations never touch the store:
//! each one checks its precondition against a task snapshot and returns the
//! [`TaskPatch`] that has to be written for the transition to take effect.

use super::enums::{TaskStatus, TimerState};
use super::task::{ManualTimeEntry, Task, TaskPatch};
use crate::error::{BillableError, BillableResult};
use chrono::{DateTime, Utc};

/// Timer view of a task: persisted seconds plus the running session, if any.
///
/// `is_timer_running` decides the state. A running task without a start time
/// has an unknown session length and counts as 0 elapsed seconds; a stopped
/// task's leftover start time is ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timer {
    pub accumulated: u64,
    pub running: bool,
    pub session_start: Option<DateTime<Utc>>,
}

impl Timer {
    pub fn from_task(task: &Task) -> Self {
        let session_start = if task.is_timer_running { task.start_time } else { None };
        Self {
            accumulated: task.time_spent,
            running: task.is_timer_running,
            session_start,
        }
    }

    pub fn state(&self) -> TimerState {
        if self.running {
            TimerState::Running
        } else {
            TimerState::Stopped
        }
    }

    /// Whole seconds of the running session (0 when stopped or clock went back)
    pub fn session_elapsed(&self, now: DateTime<Utc>) -> u64 {
        match self.session_start {
            Some(start) => now.signed_duration_since(start).num_seconds().max(0) as u64,
            None => 0,
        }
    }

    /// Value shown to the user; never persisted
    pub fn display_seconds(&self, now: DateTime<Utc>) -> u64 {
        self.accumulated.saturating_add(self.session_elapsed(now))
    }
}

/// Result of stopping a timer
#[derive(Debug, Clone, PartialEq)]
pub struct StopOutcome {
    pub patch: TaskPatch,
    pub session_seconds: u64,
}

/// Begin a session. Pending tasks move to in-progress; a stale start time
/// left on a stopped task is overwritten.
pub fn plan_start(task: &Task, now: DateTime<Utc>) -> BillableResult<TaskPatch> {
    if Timer::from_task(task).state() == TimerState::Running {
        return Err(BillableError::AlreadyRunning);
    }

    let status = match task.status {
        TaskStatus::Pending => TaskStatus::InProgress,
        other => other,
    };

    Ok(TaskPatch {
        is_timer_running: Some(true),
        start_time: Some(Some(now)),
        status: Some(status),
        ..TaskPatch::default()
    })
}

/// End the running session and fold its duration into `time_spent`.
/// A running task with no recorded start time stops with 0 elapsed seconds.
pub fn plan_stop(task: &Task, now: DateTime<Utc>) -> BillableResult<StopOutcome> {
    let timer = Timer::from_task(task);
    if timer.state() != TimerState::Running {
        return Err(BillableError::NotRunning);
    }

    let session_seconds = timer.session_elapsed(now);
    Ok(StopOutcome {
        patch: TaskPatch {
            is_timer_running: Some(false),
            time_spent: Some(task.time_spent.saturating_add(session_seconds)),
            start_time: Some(None),
            end_time: Some(Some(now)),
            ..TaskPatch::default()
        },
        session_seconds,
    })
}

/// Append a manual entry and add its duration; running state is untouched
pub fn plan_manual_entry(task: &Task, entry: ManualTimeEntry) -> BillableResult<TaskPatch> {
    let seconds = entry.seconds();
    if seconds == 0 {
        return Err(BillableError::InvalidInput(
            "time entry must be longer than zero".to_string(),
        ));
    }

    let mut entries = task.manual_time_entries.clone();
    entries.push(entry);

    Ok(TaskPatch {
        manual_time_entries: Some(entries),
        time_spent: Some(task.time_spent.saturating_add(seconds)),
        ..TaskPatch::default()
    })
}
