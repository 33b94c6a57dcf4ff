use crate::app::AppState;
use crate::domain::{format_duration, format_hms, Timer};
use crate::persistence::TaskStore;
use crate::ui::styles::{border_style, default_style, running_style, title_style};
use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

/// Render the details pane for the selected task
pub fn render_details_pane<S: TaskStore>(f: &mut Frame, app: &AppState<S>, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style())
        .title(Span::styled(" Details ", title_style()));

    let Some(task) = app.selected_task() else {
        f.render_widget(Paragraph::new("No task selected").block(block), area);
        return;
    };

    let now = app.tracker.now();
    let timer = Timer::from_task(task);
    let mut lines = Vec::new();

    lines.push(Line::from(vec![
        Span::styled("Task:    ", title_style()),
        Span::raw(task.name.clone()),
    ]));
    lines.push(Line::from(vec![
        Span::styled("Project: ", title_style()),
        Span::raw(task.project.clone()),
    ]));
    lines.push(Line::from(vec![
        Span::styled("Status:  ", title_style()),
        Span::raw(task.status.label()),
    ]));
    if let Some(who) = &task.assigned_to {
        lines.push(Line::from(vec![
            Span::styled("Owner:   ", title_style()),
            Span::raw(who.clone()),
        ]));
    }
    if let Some(due) = task.due_date {
        lines.push(Line::from(vec![
            Span::styled("Due:     ", title_style()),
            Span::raw(due.to_string()),
        ]));
    }
    lines.push(Line::raw(""));

    let time_style = if task.is_timer_running { running_style() } else { default_style() };
    lines.push(Line::from(vec![
        Span::styled("Time:    ", title_style()),
        Span::styled(format_hms(timer.display_seconds(now)), time_style),
    ]));
    if task.is_timer_running {
        lines.push(Line::from(vec![
            Span::styled("Session: ", title_style()),
            Span::styled(format_hms(timer.session_elapsed(now)), running_style()),
        ]));
    }

    if !task.manual_time_entries.is_empty() {
        lines.push(Line::raw(""));
        lines.push(Line::from(Span::styled("Manual entries:", title_style())));
        for entry in &task.manual_time_entries {
            let mut text = format!("  {} {}", entry.date, format_duration(entry.seconds()));
            if !entry.description.is_empty() {
                text.push_str(&format!(" - {}", entry.description));
            }
            lines.push(Line::raw(text));
        }
    }

    let paragraph = Paragraph::new(lines).block(block).wrap(Wrap { trim: false });
    f.render_widget(paragraph, area);
}
