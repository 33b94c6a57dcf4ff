use crate::app::AppState;
use crate::domain::UiMode;
use crate::persistence::TaskStore;
use crossterm::event::{KeyCode, KeyEvent};

/// Handle keyboard input events; returns true when the view should close
pub fn handle_key<S: TaskStore>(app: &mut AppState<S>, key: KeyEvent) -> bool {
    match app.ui_mode {
        UiMode::Normal => handle_normal_mode(app, key),
        UiMode::ConfirmQuit => handle_confirm_quit_mode(app, key),
    }
}

/// Handle keys in normal mode
fn handle_normal_mode<S: TaskStore>(app: &mut AppState<S>, key: KeyEvent) -> bool {
    match key.code {
        KeyCode::Up | KeyCode::Char('k') => {
            app.move_selection_up();
            false
        }
        KeyCode::Down | KeyCode::Char('j') => {
            app.move_selection_down();
            false
        }
        KeyCode::Enter | KeyCode::Char(' ') => {
            app.toggle_selected();
            false
        }
        KeyCode::Char('r') => {
            app.reload();
            false
        }
        KeyCode::Char('q') | KeyCode::Esc => app.request_quit(),
        _ => false,
    }
}

/// Handle keys while confirming quit with running timers
fn handle_confirm_quit_mode<S: TaskStore>(app: &mut AppState<S>, key: KeyEvent) -> bool {
    match key.code {
        // Leave timers running; they keep counting in the store
        KeyCode::Char('q') => true,
        KeyCode::Char('s') => {
            app.stop_all_running();
            app.ui_mode = UiMode::Normal;
            !app.has_running_timers()
        }
        KeyCode::Esc => {
            app.ui_mode = UiMode::Normal;
            false
        }
        _ => false,
    }
}
