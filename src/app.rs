use crate::domain::{Session, Task, UiMode};
use crate::notifications::{self, Notice};
use crate::persistence::{JsonFileStore, TaskStore};
use crate::ticker::Ticker;
use crate::tracker::Tracker;
use std::time::Instant;

/// Terminal view state
pub struct AppState<S: TaskStore = JsonFileStore> {
    pub tracker: Tracker<S>,
    pub session: Session,
    pub selected_index: usize,
    pub ui_mode: UiMode,
    /// Latest success or failure message, shown in the status bar
    pub notice: Option<Notice>,
    pub ticker: Ticker,
    pub use_emoji: bool,
    pub desktop_notifications: bool,
}

impl<S: TaskStore> AppState<S> {
    pub fn new(tracker: Tracker<S>, session: Session, ticker: Ticker) -> Self {
        Self {
            tracker,
            session,
            selected_index: 0,
            ui_mode: UiMode::Normal,
            notice: None,
            ticker,
            use_emoji: true,
            desktop_notifications: false,
        }
    }

    pub fn tasks(&self) -> &[Task] {
        self.tracker.tasks()
    }

    pub fn selected_task(&self) -> Option<&Task> {
        self.tasks().get(self.selected_index)
    }

    pub fn move_selection_up(&mut self) {
        self.selected_index = self.selected_index.saturating_sub(1);
    }

    pub fn move_selection_down(&mut self) {
        if self.selected_index + 1 < self.tasks().len() {
            self.selected_index += 1;
        }
    }

    fn clamp_selection(&mut self) {
        let len = self.tasks().len();
        if len == 0 {
            self.selected_index = 0;
        } else if self.selected_index >= len {
            self.selected_index = len - 1;
        }
    }

    /// Reload tasks from the store; on failure the current list stays on screen
    pub fn reload(&mut self) {
        match self.tracker.refresh() {
            Ok(()) => self.clamp_selection(),
            Err(e) => self.notice = Some(Notice::failed("load tasks", &e)),
        }
    }

    /// Start or stop the selected task's timer
    pub fn toggle_selected(&mut self) {
        let Some(task) = self.selected_task() else {
            return;
        };
        let (id, name, running) = (task.id, task.name.clone(), task.is_timer_running);

        let action = if running { "stop timer" } else { "start timer" };
        self.notice = Some(match self.tracker.toggle(&self.session, id) {
            Ok(Some(report)) => {
                if self.desktop_notifications {
                    notifications::notify_timer_stopped(&name, report.session_seconds);
                }
                Notice::timer_stopped(report.session_seconds)
            }
            Ok(None) => Notice::timer_started(),
            Err(e) => Notice::failed(action, &e),
        });
    }

    pub fn has_running_timers(&self) -> bool {
        self.tasks().iter().any(|t| t.is_timer_running)
    }

    /// Stop every running timer; returns how many were stopped
    pub fn stop_all_running(&mut self) -> usize {
        let running: Vec<_> = self
            .tasks()
            .iter()
            .filter(|t| t.is_timer_running)
            .map(|t| t.id)
            .collect();

        let mut stopped = 0;
        for id in running {
            match self.tracker.stop(&self.session, id) {
                Ok(_) => stopped += 1,
                Err(e) => self.notice = Some(Notice::failed("stop timer", &e)),
            }
        }
        stopped
    }

    /// Quit request: asks for confirmation while timers are running
    pub fn request_quit(&mut self) -> bool {
        if self.has_running_timers() {
            self.ui_mode = UiMode::ConfirmQuit;
            false
        } else {
            true
        }
    }

    /// Whether the live display needs a refresh; marks the tick when it does
    pub fn on_tick(&mut self, now: Instant) -> bool {
        if self.ticker.is_due(now) {
            self.ticker.mark(now);
            true
        } else {
            false
        }
    }

    /// Leave the view: no refresh is scheduled after this
    pub fn close(&mut self) {
        self.ticker.cancel();
    }
}
