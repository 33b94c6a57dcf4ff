//! Applies timer operations through a task store.
//!
//! The tracker keeps the last task records read from (or written to) the
//! store. A transition is adopted locally only after the store accepted the
//! write; on failure the cached record is left exactly as it was.

use crate::domain::{
    plan_manual_entry, plan_start, plan_stop, ManualTimeEntry, Session, Task, TaskDraft, TaskPatch,
    Timer,
};
use crate::error::{BillableError, BillableResult};
use crate::persistence::TaskStore;
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Source of the current time
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Result of a stopped session
#[derive(Debug, Clone)]
pub struct StopReport {
    pub task: Task,
    pub session_seconds: u64,
}

pub struct Tracker<S: TaskStore, C: Clock = SystemClock> {
    store: S,
    clock: C,
    tasks: Vec<Task>,
}

impl<S: TaskStore> Tracker<S, SystemClock> {
    pub fn new(store: S) -> Self {
        Self::with_clock(store, SystemClock)
    }
}

impl<S: TaskStore, C: Clock> Tracker<S, C> {
    pub fn with_clock(store: S, clock: C) -> Self {
        Self {
            store,
            clock,
            tasks: Vec::new(),
        }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Tasks as last seen, in store order
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn task(&self, id: Uuid) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    /// Reload every task from the store
    pub fn refresh(&mut self) -> BillableResult<()> {
        self.tasks = self.store.list()?;
        for task in self.tasks.iter().filter(|t| !t.timer_fields_consistent()) {
            tracing::warn!(task = %task.id, "timer fields disagree: is_timer_running={} start_time={:?}",
                task.is_timer_running, task.start_time);
        }
        Ok(())
    }

    /// Live display value for a task
    pub fn display_seconds(&self, id: Uuid) -> Option<u64> {
        let now = self.now();
        self.task(id).map(|t| Timer::from_task(t).display_seconds(now))
    }

    pub fn start(&mut self, session: &Session, id: Uuid) -> BillableResult<Task> {
        let now = self.now();
        session.ensure_active(now)?;

        let current = self.current(id)?;
        let patch = plan_start(&current, now)?;
        let task = self.write(id, &patch)?;
        tracing::info!(task = %id, user = %session.identity, "timer started");
        Ok(task)
    }

    pub fn stop(&mut self, session: &Session, id: Uuid) -> BillableResult<StopReport> {
        let now = self.now();
        session.ensure_active(now)?;

        let current = self.current(id)?;
        let outcome = plan_stop(&current, now)?;
        let task = self.write(id, &outcome.patch)?;
        tracing::info!(task = %id, seconds = outcome.session_seconds, "timer stopped");
        Ok(StopReport {
            task,
            session_seconds: outcome.session_seconds,
        })
    }

    /// Start a stopped timer or stop a running one
    pub fn toggle(&mut self, session: &Session, id: Uuid) -> BillableResult<Option<StopReport>> {
        session.ensure_active(self.now())?;

        let current = self.current(id)?;
        if current.is_timer_running {
            self.stop(session, id).map(Some)
        } else {
            self.start(session, id).map(|_| None)
        }
    }

    pub fn add_manual_entry(
        &mut self,
        session: &Session,
        id: Uuid,
        entry: ManualTimeEntry,
    ) -> BillableResult<Task> {
        session.ensure_active(self.now())?;

        // Zero-length entries never reach the store; plan_manual_entry checks again
        let seconds = entry.seconds();
        if seconds == 0 {
            return Err(BillableError::InvalidInput(
                "time entry must be longer than zero".to_string(),
            ));
        }

        let current = self.current(id)?;
        let patch = plan_manual_entry(&current, entry)?;
        let task = self.write(id, &patch)?;
        tracing::info!(task = %id, seconds, "manual time entry added");
        Ok(task)
    }

    pub fn create_task(&mut self, session: &Session, draft: TaskDraft) -> BillableResult<Task> {
        session.ensure_active(self.now())?;
        let task = draft.into_task()?;
        let task = self.store.insert(task).map_err(|e| {
            tracing::warn!(error = %e, "failed to create task");
            BillableError::RemoteWrite(e)
        })?;
        self.tasks.push(task.clone());
        Ok(task)
    }

    pub fn edit_task(&mut self, session: &Session, id: Uuid, draft: TaskDraft) -> BillableResult<Task> {
        session.ensure_active(self.now())?;
        let patch = draft.into_patch()?;
        self.write(id, &patch)
    }

    pub fn delete_task(&mut self, session: &Session, id: Uuid) -> BillableResult<()> {
        session.ensure_active(self.now())?;
        self.store.delete(id).map_err(|e| {
            tracing::warn!(task = %id, error = %e, "failed to delete task");
            BillableError::RemoteWrite(e)
        })?;
        self.tasks.retain(|t| t.id != id);
        Ok(())
    }

    /// Fresh copy of a task from the store, flagging changes made elsewhere
    fn current(&mut self, id: Uuid) -> BillableResult<Task> {
        let stored = self.store.get(id)?;
        match self.tasks.iter_mut().find(|t| t.id == id) {
            Some(cached) => {
                if cached.is_timer_running != stored.is_timer_running
                    || cached.time_spent != stored.time_spent
                {
                    tracing::warn!(task = %id, "task was changed by another writer, using stored version");
                    *cached = stored.clone();
                }
            }
            None => self.tasks.push(stored.clone()),
        }
        Ok(stored)
    }

    fn write(&mut self, id: Uuid, patch: &TaskPatch) -> BillableResult<Task> {
        let updated = self.store.update(id, patch).map_err(|e| {
            tracing::warn!(task = %id, error = %e, "task write failed, keeping previous state");
            BillableError::RemoteWrite(e)
        })?;

        match self.tasks.iter_mut().find(|t| t.id == id) {
            Some(cached) => *cached = updated.clone(),
            None => self.tasks.push(updated.clone()),
        }
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Plan, TaskStatus};
    use crate::persistence::store::MemoryStore;
    use chrono::{Duration, NaiveDate, TimeZone};
    use pretty_assertions::assert_eq;
    use std::cell::Cell;
    use std::rc::Rc;

    #[derive(Clone)]
    struct ManualClock(Rc<Cell<DateTime<Utc>>>);

    impl ManualClock {
        fn advance(&self, seconds: i64) {
            self.0.set(self.0.get() + Duration::seconds(seconds));
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> DateTime<Utc> {
            self.0.get()
        }
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap()
    }

    fn session() -> Session {
        Session::open("ana", Plan::Paid, t0(), Duration::hours(8))
    }

    fn tracker_with(task: Task) -> (Tracker<MemoryStore, ManualClock>, ManualClock) {
        let clock = ManualClock(Rc::new(Cell::new(t0())));
        let mut tracker = Tracker::with_clock(MemoryStore::with_tasks(vec![task]), clock.clone());
        tracker.refresh().unwrap();
        (tracker, clock)
    }

    fn task_with(seconds: u64) -> Task {
        let mut task = Task::new("Logo", "Acme");
        task.time_spent = seconds;
        task
    }

    #[test]
    fn test_scenario_through_store() {
        let task = task_with(3600);
        let id = task.id;
        let (mut tracker, clock) = tracker_with(task);

        let started = tracker.start(&session(), id).unwrap();
        assert!(started.is_timer_running);
        assert_eq!(started.status, TaskStatus::InProgress);

        clock.advance(10);
        assert_eq!(tracker.display_seconds(id), Some(3610));

        clock.advance(55);
        let report = tracker.stop(&session(), id).unwrap();
        assert_eq!(report.session_seconds, 65);
        assert_eq!(report.task.time_spent, 3665);
        assert!(!report.task.is_timer_running);
        assert_eq!(tracker.store().get(id).unwrap().time_spent, 3665);
    }

    #[test]
    fn test_start_twice_rejected_without_write() {
        let task = task_with(0);
        let id = task.id;
        let (mut tracker, clock) = tracker_with(task);

        tracker.start(&session(), id).unwrap();
        let writes = tracker.store().writes;
        clock.advance(30);

        assert!(matches!(tracker.start(&session(), id), Err(BillableError::AlreadyRunning)));
        assert_eq!(tracker.store().writes, writes);
        assert_eq!(tracker.task(id).unwrap().start_time, Some(t0()));
    }

    #[test]
    fn test_failed_write_keeps_previous_state() {
        let task = task_with(120);
        let id = task.id;
        let (mut tracker, _clock) = tracker_with(task.clone());

        tracker.store.fail_writes = true;
        let result = tracker.start(&session(), id);

        assert!(matches!(result, Err(BillableError::RemoteWrite(_))));
        assert_eq!(tracker.task(id), Some(&task));
        assert_eq!(tracker.display_seconds(id), Some(120));
    }

    #[test]
    fn test_failed_stop_keeps_running_display() {
        let task = task_with(0);
        let id = task.id;
        let (mut tracker, clock) = tracker_with(task);
        tracker.start(&session(), id).unwrap();

        clock.advance(40);
        tracker.store.fail_writes = true;
        assert!(matches!(tracker.stop(&session(), id), Err(BillableError::RemoteWrite(_))));

        let cached = tracker.task(id).unwrap();
        assert!(cached.is_timer_running);
        assert_eq!(cached.time_spent, 0);
        assert_eq!(tracker.display_seconds(id), Some(40));
    }

    #[test]
    fn test_manual_entry_through_store() {
        let task = task_with(0);
        let id = task.id;
        let (mut tracker, _clock) = tracker_with(task);
        let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();

        let updated = tracker
            .add_manual_entry(&session(), id, ManualTimeEntry::new(date, 1, 30, "x"))
            .unwrap();
        assert_eq!(updated.time_spent, 5400);
        assert_eq!(updated.manual_time_entries.len(), 1);
    }

    #[test]
    fn test_zero_manual_entry_never_reaches_store() {
        let task = task_with(50);
        let id = task.id;
        let (mut tracker, _clock) = tracker_with(task);
        let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();

        let result = tracker.add_manual_entry(&session(), id, ManualTimeEntry::new(date, 0, 0, ""));
        assert!(matches!(result, Err(BillableError::InvalidInput(_))));
        assert_eq!(tracker.store().writes, 0);
        assert_eq!(tracker.task(id).unwrap().time_spent, 50);
    }

    #[test]
    fn test_expired_session_rejected_before_store() {
        let task = task_with(0);
        let id = task.id;
        let (mut tracker, clock) = tracker_with(task);

        clock.advance(9 * 3600);
        assert!(matches!(tracker.start(&session(), id), Err(BillableError::SessionExpired)));
        assert_eq!(tracker.store().writes, 0);
    }

    #[test]
    fn test_expired_session_rejected_before_toggle_reads_store() {
        let clock = ManualClock(Rc::new(Cell::new(t0())));
        let mut tracker = Tracker::with_clock(MemoryStore::default(), clock.clone());

        clock.advance(9 * 3600);
        let result = tracker.toggle(&session(), Uuid::nil());
        assert!(matches!(result, Err(BillableError::SessionExpired)));
        assert_eq!(tracker.store().writes, 0);
    }

    #[test]
    fn test_inconsistent_records_can_be_stopped_and_restarted() {
        let mut flagged = task_with(300);
        flagged.is_timer_running = true;
        flagged.start_time = None;
        let mut stale = task_with(60);
        stale.start_time = Some(t0() - Duration::hours(2));
        let (flagged_id, stale_id) = (flagged.id, stale.id);

        let clock = ManualClock(Rc::new(Cell::new(t0())));
        let store = MemoryStore::with_tasks(vec![flagged, stale]);
        let mut tracker = Tracker::with_clock(store, clock.clone());
        tracker.refresh().unwrap();

        let report = tracker.toggle(&session(), flagged_id).unwrap().unwrap();
        assert_eq!(report.session_seconds, 0);
        assert_eq!(report.task.time_spent, 300);
        assert!(report.task.timer_fields_consistent());

        assert!(tracker.toggle(&session(), stale_id).unwrap().is_none());
        clock.advance(15);
        let report = tracker.stop(&session(), stale_id).unwrap();
        assert_eq!(report.session_seconds, 15);
        assert_eq!(report.task.time_spent, 75);
    }

    #[test]
    fn test_toggle_starts_then_stops() {
        let task = task_with(0);
        let id = task.id;
        let (mut tracker, clock) = tracker_with(task);

        assert!(tracker.toggle(&session(), id).unwrap().is_none());
        clock.advance(5);
        let report = tracker.toggle(&session(), id).unwrap().unwrap();
        assert_eq!(report.session_seconds, 5);
    }

    #[test]
    fn test_other_writer_change_is_picked_up() {
        let task = task_with(0);
        let id = task.id;
        let (mut tracker, clock) = tracker_with(task);

        // Another viewer started the timer directly in the store
        let patch = plan_start(&tracker.store().get(id).unwrap(), t0()).unwrap();
        tracker.store.update(id, &patch).unwrap();
        assert!(!tracker.task(id).unwrap().is_timer_running);

        clock.advance(20);
        assert!(matches!(tracker.start(&session(), id), Err(BillableError::AlreadyRunning)));
        assert!(tracker.task(id).unwrap().is_timer_running);
        assert_eq!(tracker.stop(&session(), id).unwrap().session_seconds, 20);
    }

    #[test]
    fn test_create_edit_delete() {
        let clock = ManualClock(Rc::new(Cell::new(t0())));
        let mut tracker = Tracker::with_clock(MemoryStore::default(), clock);

        let draft = TaskDraft {
            name: "Logo".to_string(),
            project: "Acme".to_string(),
            ..TaskDraft::default()
        };
        let task = tracker.create_task(&session(), draft).unwrap();
        assert_eq!(tracker.tasks().len(), 1);

        let edit = TaskDraft {
            name: "Logo v2".to_string(),
            project: "Acme".to_string(),
            status: "done".to_string(),
            ..TaskDraft::default()
        };
        let edited = tracker.edit_task(&session(), task.id, edit).unwrap();
        assert_eq!(edited.name, "Logo v2");
        assert_eq!(edited.status, TaskStatus::Done);

        tracker.delete_task(&session(), task.id).unwrap();
        assert!(tracker.tasks().is_empty());
    }

    #[test]
    fn test_failed_create_is_remote_write() {
        let clock = ManualClock(Rc::new(Cell::new(t0())));
        let mut store = MemoryStore::default();
        store.fail_writes = true;
        let mut tracker = Tracker::with_clock(store, clock);

        let draft = TaskDraft {
            name: "Logo".to_string(),
            project: "Acme".to_string(),
            ..TaskDraft::default()
        };
        assert!(matches!(tracker.create_task(&session(), draft), Err(BillableError::RemoteWrite(_))));
        assert!(tracker.tasks().is_empty());
    }
}
