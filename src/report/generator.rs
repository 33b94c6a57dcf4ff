use crate::domain::{format_duration, format_hms, progress_glyph, Expense, Invoice, Task, Timer};
use crate::persistence::{atomic_write, report_file};
use crate::report::stats::{calculate_global_stats, calculate_project_stats};
use anyhow::Result;
use chrono::{DateTime, NaiveDate, Utc};
use std::path::{Path, PathBuf};

/// Format percentage with 1 decimal place
fn format_percent(value: f64) -> String {
    format!("{:.1}%", value)
}

/// Render the markdown project report
pub fn render_report(tasks: &[Task], now: DateTime<Utc>) -> String {
    let global = calculate_global_stats(tasks, now);
    let projects = calculate_project_stats(tasks, now);

    let mut report = String::new();
    report.push_str(&format!("# Project Report - {}\n\n", now.date_naive()));

    report.push_str("## Summary\n\n");
    report.push_str(&format!(
        "- **Projects:** {}\n- **Tasks:** {} ({} done, {} running)\n",
        global.project_count, global.total_tasks, global.done_count, global.running_count
    ));
    report.push_str(&format!(
        "- **Tracked Time:** {} (manual: {})\n",
        format_duration(global.tracked_seconds),
        format_duration(global.manual_seconds)
    ));
    if global.overdue_count > 0 {
        report.push_str(&format!("- **Overdue Tasks:** {}\n", global.overdue_count));
    }
    report.push('\n');

    for (project, stats) in &projects {
        let progress = stats.progress_percent();
        report.push_str(&format!("## {} {}\n\n", progress_glyph(progress, false), project));
        report.push_str(&format!(
            "- **Progress:** {} ({}/{} done, {} in progress, {} pending)\n",
            format_percent(progress),
            stats.done_count,
            stats.task_count,
            stats.in_progress_count,
            stats.pending_count
        ));
        report.push_str(&format!(
            "- **Tracked:** {} ({} manual entries)\n\n",
            format_duration(stats.tracked_seconds),
            stats.manual_entry_count
        ));

        let mut project_tasks: Vec<&Task> = tasks.iter().filter(|t| &t.project == project).collect();
        project_tasks.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        for task in project_tasks {
            let seconds = Timer::from_task(task).display_seconds(now);
            let running = if task.is_timer_running { " ⏱" } else { "" };
            report.push_str(&format!(
                "- [{}] {} - {}{}\n",
                task.status.to_tag(),
                task.name,
                format_hms(seconds),
                running
            ));
        }
        report.push('\n');
    }

    report
}

/// Render an invoice for the terminal
pub fn render_invoice(invoice: &Invoice, currency: &str) -> String {
    let mut out = String::new();
    out.push_str(&format!("Invoice {} ({})\n", invoice.invoice_number, invoice.status.to_tag()));
    out.push_str(&format!("Project: {}\n", invoice.project));
    out.push_str(&format!("Date:    {}\n", invoice.invoice_date));
    if let Some(due) = invoice.due_date {
        out.push_str(&format!("Due:     {}\n", due));
    }
    if invoice.hours_worked > 0.0 || invoice.hourly_rate > 0.0 {
        out.push_str(&format!(
            "Hours:   {:.2}h x {:.2} {}\n",
            invoice.hours_worked, invoice.hourly_rate, currency
        ));
    }
    out.push_str(&format!("Total:   {:.2} {}\n", invoice.total_amount, currency));
    if let Some(notes) = &invoice.notes {
        out.push_str(&format!("Notes:   {}\n", notes));
    }
    out
}

/// Expenses as CSV (Date, Name, Category, Amount, Notes), every cell quoted
pub fn render_expenses_csv(expenses: &[Expense]) -> Result<String> {
    let mut wtr = csv::WriterBuilder::new()
        .quote_style(csv::QuoteStyle::Always)
        .from_writer(Vec::new());

    wtr.write_record(["Date", "Name", "Category", "Amount", "Notes"])?;
    for expense in expenses {
        wtr.write_record([
            expense.expense_date.format("%Y-%m-%d").to_string(),
            expense.name.clone(),
            expense.category.label().to_string(),
            format!("{:.2}", expense.amount),
            expense.notes.clone().unwrap_or_default(),
        ])?;
    }

    let bytes = wtr
        .into_inner()
        .map_err(|e| anyhow::anyhow!("Failed to finish CSV output: {}", e.error()))?;
    Ok(String::from_utf8(bytes)?)
}

/// Write the expense CSV to `output`, or to expenses-YYYY-MM-DD.csv in the data directory
pub fn export_expenses(
    data_dir: &Path,
    expenses: &[Expense],
    today: NaiveDate,
    output: Option<PathBuf>,
) -> Result<PathBuf> {
    let csv = render_expenses_csv(expenses)?;
    let path = output.unwrap_or_else(|| data_dir.join(format!("expenses-{}.csv", today.format("%Y-%m-%d"))));
    atomic_write(&path, &csv)?;
    Ok(path)
}

/// Write the report to `output`, or to report-YYYY-MM-DD.md in the data directory
pub fn generate_report(
    data_dir: &Path,
    tasks: &[Task],
    now: DateTime<Utc>,
    output: Option<PathBuf>,
) -> Result<PathBuf> {
    let report = render_report(tasks, now);
    let path = output.unwrap_or_else(|| report_file(data_dir, now.date_naive()));
    atomic_write(&path, &report)?;
    Ok(path)
}
