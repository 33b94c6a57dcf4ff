use crate::domain::{Task, TaskStatus, Timer};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

/// Statistics for one project
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProjectStats {
    pub task_count: usize,
    pub pending_count: usize,
    pub in_progress_count: usize,
    pub done_count: usize,
    pub running_count: usize,
    /// Persisted seconds plus any running session
    pub tracked_seconds: u64,
    pub manual_seconds: u64,
    pub manual_entry_count: usize,
}

impl ProjectStats {
    /// Share of done tasks, 0 for an empty project
    pub fn progress_percent(&self) -> f64 {
        if self.task_count == 0 {
            return 0.0;
        }
        self.done_count as f64 / self.task_count as f64 * 100.0
    }
}

/// Statistics across all tasks
#[derive(Debug, Default, PartialEq)]
pub struct GlobalStats {
    pub total_tasks: usize,
    pub project_count: usize,
    pub done_count: usize,
    pub running_count: usize,
    pub tracked_seconds: u64,
    pub manual_seconds: u64,
    pub overdue_count: usize,
}

/// Group tasks by project and compute per-project statistics
pub fn calculate_project_stats(tasks: &[Task], now: DateTime<Utc>) -> BTreeMap<String, ProjectStats> {
    let mut projects: BTreeMap<String, ProjectStats> = BTreeMap::new();

    for task in tasks {
        let stats = projects.entry(task.project.clone()).or_default();
        stats.task_count += 1;
        match task.status {
            TaskStatus::Pending => stats.pending_count += 1,
            TaskStatus::InProgress => stats.in_progress_count += 1,
            TaskStatus::Done => stats.done_count += 1,
        }
        if task.is_timer_running {
            stats.running_count += 1;
        }
        stats.tracked_seconds += Timer::from_task(task).display_seconds(now);
        stats.manual_seconds += task.manual_seconds();
        stats.manual_entry_count += task.manual_time_entries.len();
    }

    projects
}

/// Calculate global statistics; overdue means past due date and not done
pub fn calculate_global_stats(tasks: &[Task], now: DateTime<Utc>) -> GlobalStats {
    let projects = calculate_project_stats(tasks, now);
    let today = now.date_naive();

    GlobalStats {
        total_tasks: tasks.len(),
        project_count: projects.len(),
        done_count: projects.values().map(|p| p.done_count).sum(),
        running_count: projects.values().map(|p| p.running_count).sum(),
        tracked_seconds: projects.values().map(|p| p.tracked_seconds).sum(),
        manual_seconds: projects.values().map(|p| p.manual_seconds).sum(),
        overdue_count: tasks
            .iter()
            .filter(|t| t.status != TaskStatus::Done)
            .filter(|t| t.due_date.is_some_and(|due| due < today))
            .count(),
    }
}
