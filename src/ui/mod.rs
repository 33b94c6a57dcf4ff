pub mod details_pane;
pub mod keybindings;
pub mod layout;
pub mod list_pane;
pub mod modal;
pub mod styles;

use crate::app::AppState;
use crate::persistence::TaskStore;
use details_pane::render_details_pane;
use keybindings::{render_keybindings, render_status};
use layout::create_layout;
use list_pane::render_list_pane;
use modal::render_confirm_quit_modal;
use ratatui::Frame;

/// Main render function - draws the entire UI
pub fn render<S: TaskStore>(f: &mut Frame, app: &AppState<S>) {
    let size = f.size();
    let layout = create_layout(size);

    render_keybindings(f, layout.keybindings_area);
    render_list_pane(f, app, layout.list_area);
    render_details_pane(f, app, layout.details_area);
    render_status(f, app.notice.as_ref(), layout.status_area);

    render_confirm_quit_modal(f, app, size);
}
