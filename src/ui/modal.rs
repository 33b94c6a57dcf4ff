use crate::app::AppState;
use crate::domain::UiMode;
use crate::persistence::TaskStore;
use crate::ui::{
    layout::create_modal_area,
    styles::{modal_bg_style, modal_title_style},
};
use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

/// Render the quit confirmation shown while timers are running
pub fn render_confirm_quit_modal<S: TaskStore>(f: &mut Frame, app: &AppState<S>, area: Rect) {
    if app.ui_mode != UiMode::ConfirmQuit {
        return;
    }

    let modal_area = create_modal_area(area);
    f.render_widget(Clear, modal_area);

    let running = app.tasks().iter().filter(|t| t.is_timer_running).count();
    let lines = vec![
        Line::raw(""),
        Line::raw(format!("  {} timer(s) still running.", running)),
        Line::raw("  Running timers keep counting after you leave."),
        Line::raw(""),
        Line::from(vec![
            Span::styled("  [s]", modal_title_style()),
            Span::raw(" Stop all and quit  "),
            Span::styled("[q]", modal_title_style()),
            Span::raw(" Quit  "),
            Span::styled("[Esc]", modal_title_style()),
            Span::raw(" Back"),
        ]),
    ];

    let paragraph = Paragraph::new(lines)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(Span::styled(" Timers Running ", modal_title_style()))
                .style(modal_bg_style()),
        )
        .wrap(Wrap { trim: false });

    f.render_widget(paragraph, modal_area);
}
