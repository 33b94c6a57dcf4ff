use super::enums::TimerState;
use super::task::Task;
use super::timer::Timer;
use chrono::{DateTime, Utc};

/// Format seconds as "HH:MM:SS" (hours grow past two digits when needed)
pub fn format_hms(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;
    format!("{:02}:{:02}:{:02}", hours, minutes, secs)
}

/// Format seconds as "Xh Ym" (omits 0 values)
pub fn format_duration(seconds: u64) -> String {
    let total_minutes = seconds / 60;
    let hours = total_minutes / 60;
    let minutes = total_minutes % 60;

    if hours > 0 && minutes > 0 {
        format!("{}h {}m", hours, minutes)
    } else if hours > 0 {
        format!("{}h", hours)
    } else {
        format!("{}m", minutes)
    }
}

/// Sum of live display values across tasks
pub fn compute_totals(tasks: &[Task], now: DateTime<Utc>) -> u64 {
    tasks
        .iter()
        .map(|task| Timer::from_task(task).display_seconds(now))
        .sum()
}

/// Get status badge text
pub fn status_badge(task: &Task) -> String {
    match task.timer_state() {
        TimerState::Running => format!("({} • {})", task.status.label(), TimerState::Running.to_tag()),
        TimerState::Stopped => format!("({})", task.status.label()),
    }
}

/// Choose progress glyph based on the percentage of done tasks
pub fn progress_glyph(percent: f64, use_emoji: bool) -> &'static str {
    if use_emoji {
        if percent < 50.0 {
            "🌱"
        } else if percent < 80.0 {
            "🌿"
        } else {
            "🌳"
        }
    } else if percent < 50.0 {
        "*"
    } else if percent < 80.0 {
        "+"
    } else {
        "#"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    #[test]
    fn test_format_hms() {
        assert_eq!(format_hms(0), "00:00:00");
        assert_eq!(format_hms(65), "00:01:05");
        assert_eq!(format_hms(3665), "01:01:05");
        assert_eq!(format_hms(360_000), "100:00:00");
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(5400), "1h 30m");
        assert_eq!(format_duration(7200), "2h");
        assert_eq!(format_duration(2700), "45m");
        assert_eq!(format_duration(59), "0m");
    }

    #[test]
    fn test_compute_totals_includes_running_session() {
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();
        let mut running = Task::new("a", "p");
        running.time_spent = 100;
        running.is_timer_running = true;
        running.start_time = Some(now - Duration::seconds(20));
        let mut stopped = Task::new("b", "p");
        stopped.time_spent = 30;

        assert_eq!(compute_totals(&[running, stopped], now), 150);
    }

    #[test]
    fn test_status_badge() {
        let mut task = Task::new("a", "p");
        assert_eq!(status_badge(&task), "(Pending)");
        task.is_timer_running = true;
        task.start_time = Some(Utc::now());
        assert_eq!(status_badge(&task), "(Pending • RUNNING)");
    }

    #[test]
    fn test_progress_glyph() {
        assert_eq!(progress_glyph(10.0, false), "*");
        assert_eq!(progress_glyph(50.0, false), "+");
        assert_eq!(progress_glyph(100.0, true), "🌳");
    }
}
