use crate::app::AppState;
use crate::domain::{compute_totals, format_hms, status_badge, Session, Task, TaskStatus, Timer};
use crate::persistence::TaskStore;
use crate::ui::styles::{
    border_style, default_style, done_style, idle_style, project_style, running_style,
    selected_style, title_style,
};
use chrono::{DateTime, Utc};
use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem},
    Frame,
};

/// Render the task list with live timer values
pub fn render_list_pane<S: TaskStore>(f: &mut Frame, app: &AppState<S>, area: Rect) {
    let now = app.tracker.now();

    let items: Vec<ListItem> = app
        .tasks()
        .iter()
        .enumerate()
        .map(|(idx, task)| {
            let line = create_task_line(task, now, app.use_emoji);
            let style = if idx == app.selected_index {
                selected_style()
            } else {
                default_style()
            };
            ListItem::new(line).style(style)
        })
        .collect();

    let title = list_title(compute_totals(app.tasks(), now), &app.session);

    let list = List::new(items).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(border_style())
            .title(Span::styled(title, title_style())),
    );

    f.render_widget(list, area);
}

fn list_title(total_seconds: u64, session: &Session) -> String {
    format!(
        " Tasks | {} tracked | {} ({}) ",
        format_hms(total_seconds),
        session.identity,
        session.plan.label()
    )
}

/// Create a single line for a task
/// Format: ⏱ 01:02:03  Write proposal  [Acme] (In progress • RUNNING)
fn create_task_line(task: &Task, now: DateTime<Utc>, use_emoji: bool) -> Line<'static> {
    let mut spans = Vec::new();
    let running = task.is_timer_running;

    let clock = if use_emoji { "⏱" } else { ">" };
    let marker = if running { clock } else { " " };
    let time_style = if running { running_style() } else { default_style() };
    spans.push(Span::raw(format!("{} ", marker)));
    spans.push(Span::styled(
        format_hms(Timer::from_task(task).display_seconds(now)),
        time_style,
    ));
    spans.push(Span::raw("  ".to_string()));

    spans.push(Span::raw(task.name.clone()));
    spans.push(Span::raw(" ".to_string()));
    spans.push(Span::styled(format!("[{}]", task.project), project_style()));
    spans.push(Span::raw(" ".to_string()));

    let badge_style = if running {
        running_style()
    } else if task.status == TaskStatus::Done {
        done_style()
    } else {
        idle_style()
    };
    spans.push(Span::styled(status_badge(task), badge_style));

    Line::from(spans)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    #[test]
    fn test_create_task_line() {
        let task = Task::new("Test task", "Acme");
        let line = create_task_line(&task, Utc::now(), true);

        let line_str = format!("{:?}", line);
        assert!(line_str.contains("Test task"));
        assert!(line_str.contains("[Acme]"));
        assert!(line_str.contains("00:00:00"));
    }

    #[test]
    fn test_running_line_shows_live_value() {
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();
        let mut task = Task::new("Logo", "Acme");
        task.time_spent = 3600;
        task.is_timer_running = true;
        task.start_time = Some(now - Duration::seconds(10));

        let line_str = format!("{:?}", create_task_line(&task, now, false));
        assert!(line_str.contains("01:00:10"));
        assert!(line_str.contains("RUNNING"));
    }

    #[test]
    fn test_list_title_uses_plain_separators() {
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();
        let session = Session::open("ana", crate::domain::Plan::Paid, now, Duration::hours(1));

        assert_eq!(list_title(3665, &session), " Tasks | 01:01:05 tracked | ana (paid) ");
    }
}
