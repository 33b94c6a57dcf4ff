mod app;
mod billing;
mod domain;
mod error;
mod input;
mod notifications;
mod persistence;
mod report;
mod ticker;
mod tracker;
mod ui;

use anyhow::{Context, Result};
use app::AppState;
use billing::{Billing, InvoiceRequest};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use domain::{
    format_duration, format_hms, invoice_totals, totals_by_category, ExpenseCategory, ExpenseDraft,
    InvoiceKind, InvoiceStatus, ManualTimeEntry, Session, TaskDraft, Timer,
};
use notifications::Notice;
use persistence::{
    config_file, ensure_data_dir, init_local_data_dir, load_config, resolve_id, save_config,
    tasks_file, AppConfig, JsonFileStore, TaskStore,
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io;
use std::path::PathBuf;
use ticker::{tick_duration, Ticker};
use tracker::Tracker;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "billable")]
#[command(about = "Task timers, manual time entries and invoice totals for freelancers", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a local .billable directory in the current directory
    Init,
    /// Create a task
    Add {
        name: String,
        #[arg(short, long)]
        project: String,
        /// pending, in-progress or done
        #[arg(short, long, default_value = "")]
        status: String,
        #[arg(short, long, default_value = "")]
        assignee: String,
        /// Due date (YYYY-MM-DD)
        #[arg(short, long, default_value = "")]
        due: String,
    },
    /// Edit a task's details; omitted options keep their current value
    Edit {
        id: String,
        #[arg(short, long)]
        name: Option<String>,
        #[arg(short, long)]
        project: Option<String>,
        #[arg(short, long)]
        status: Option<String>,
        /// Assignee; pass an empty string to clear
        #[arg(short, long)]
        assignee: Option<String>,
        /// Due date (YYYY-MM-DD); pass an empty string to clear
        #[arg(short, long)]
        due: Option<String>,
    },
    /// List tasks with their current time
    List {
        #[arg(short, long)]
        project: Option<String>,
    },
    /// Start a task's timer
    Start { id: String },
    /// Stop a task's timer
    Stop { id: String },
    /// Show a task's timer
    Status { id: String },
    /// Add a manual time entry to a task
    Log {
        id: String,
        #[arg(long, default_value_t = 0)]
        hours: u32,
        #[arg(long, default_value_t = 0)]
        minutes: u32,
        /// Date of the work (YYYY-MM-DD). Defaults to today.
        #[arg(short, long)]
        date: Option<String>,
        #[arg(short = 'm', long, default_value = "")]
        description: String,
    },
    /// List a task's manual time entries
    Entries { id: String },
    /// Delete a task
    Delete { id: String },
    /// Issue an invoice for a project's tracked hours or a fixed amount
    Invoice {
        project: String,
        /// Hourly rate; defaults to default_hourly_rate from config.json
        #[arg(long, conflicts_with = "fixed")]
        rate: Option<f64>,
        /// Fixed amount instead of hours x rate
        #[arg(long)]
        fixed: Option<f64>,
        /// Payment due date (YYYY-MM-DD)
        #[arg(short, long)]
        due: Option<String>,
        #[arg(short, long)]
        notes: Option<String>,
        /// Invoice number. Defaults to INV-YYYYMMDD-<next>
        #[arg(long)]
        number: Option<String>,
        /// Show the invoice without saving it
        #[arg(long)]
        preview: bool,
    },
    /// List saved invoices
    Invoices {
        /// paid or unpaid
        #[arg(short, long)]
        status: Option<String>,
    },
    /// Mark an invoice as paid
    Paid { invoice: String },
    /// Mark an invoice as unpaid
    Unpaid { invoice: String },
    /// List unpaid invoices past their due date
    Overdue,
    /// Record that a payment reminder was sent for an overdue invoice
    Remind { invoice: String },
    /// Log a business expense
    Expense {
        name: String,
        #[arg(short, long)]
        amount: String,
        /// Software, Travel, Equipment, Marketing, Education, Utilities, Office Supplies or Other
        #[arg(short, long)]
        category: String,
        /// Date of the expense (YYYY-MM-DD). Defaults to today.
        #[arg(short, long, default_value = "")]
        date: String,
        #[arg(short, long, default_value = "")]
        notes: String,
    },
    /// List expenses with totals per category
    Expenses {
        #[arg(short, long)]
        category: Option<String>,
    },
    /// Edit an expense; omitted options keep their current value
    EditExpense {
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(short, long)]
        amount: Option<String>,
        #[arg(short, long)]
        category: Option<String>,
        #[arg(short, long)]
        date: Option<String>,
        /// Notes; pass an empty string to clear
        #[arg(short, long)]
        notes: Option<String>,
    },
    /// Delete an expense
    DeleteExpense { id: String },
    /// Export expenses to CSV
    ExportExpenses {
        /// Output file path. Defaults to <data dir>/expenses-YYYY-MM-DD.csv
        #[arg(short, long)]
        output: Option<String>,
    },
    /// Generate a markdown project report
    Report {
        /// Output file path. Defaults to <data dir>/report-YYYY-MM-DD.md
        #[arg(short, long)]
        output: Option<String>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("BILLABLE_LOG").unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Init) => init(),
        None => {
            let (tracker, session, config, data_dir) = open_workspace()?;
            run_tui(tracker, session, &config, &data_dir)
        }
        Some(command) => {
            let (mut tracker, session, config, data_dir) = open_workspace()?;
            run_command(command, &mut tracker, &session, &config, &data_dir)
        }
    }
}

fn init() -> Result<()> {
    let data_dir = init_local_data_dir()?;
    save_config(config_file(&data_dir), &AppConfig::default())?;
    println!("Initialized billable directory: {}", data_dir.display());
    println!();
    println!("Tasks in this directory tree are now stored locally.");
    Ok(())
}

/// Load config and tasks from the data directory and open the user session
fn open_workspace() -> Result<(Tracker<JsonFileStore>, Session, AppConfig, PathBuf)> {
    let data_dir = ensure_data_dir()?;
    let config = load_config(config_file(&data_dir))?;
    let store = JsonFileStore::new(tasks_file(&data_dir));
    tracing::debug!(path = %store.path().display(), "opening task store");
    let mut tracker = Tracker::new(store);
    tracker.refresh().context("Failed to load tasks")?;
    let session = config.open_session(tracker.now());
    tracing::debug!(dir = %data_dir.display(), user = %session.identity, "session opened");
    Ok((tracker, session, config, data_dir))
}

fn run_command(
    command: Commands,
    tracker: &mut Tracker<JsonFileStore>,
    session: &Session,
    config: &AppConfig,
    data_dir: &std::path::Path,
) -> Result<()> {
    match command {
        Commands::Init => init()?,
        Commands::Add { name, project, status, assignee, due } => {
            let draft = TaskDraft {
                name,
                project,
                status,
                assigned_to: assignee,
                due_date: due,
            };
            let task = tracker
                .create_task(session, draft)
                .map_err(|e| report_failure("create task", e))?;
            println!("Created {} {} [{}]", task.short_id(), task.name, task.project);
        }
        Commands::Edit { id, name, project, status, assignee, due } => {
            let id = resolve_id(tracker.store(), &id)?;
            let current = tracker.store().get(id)?;
            let draft = TaskDraft {
                name: name.unwrap_or(current.name),
                project: project.unwrap_or(current.project),
                status: status.unwrap_or_else(|| current.status.to_tag().to_string()),
                assigned_to: assignee.or(current.assigned_to).unwrap_or_default(),
                due_date: due
                    .or_else(|| current.due_date.map(|d| d.format("%Y-%m-%d").to_string()))
                    .unwrap_or_default(),
            };
            let task = tracker
                .edit_task(session, id, draft)
                .map_err(|e| report_failure("update task", e))?;
            println!("Updated {} {} [{}]", task.short_id(), task.name, task.project);
        }
        Commands::List { project } => {
            let now = tracker.now();
            let mut shown = 0;
            for task in tracker.tasks() {
                if project.as_deref().is_some_and(|p| p != task.project) {
                    continue;
                }
                let running = if task.is_timer_running { " (running)" } else { "" };
                println!(
                    "{}  {}  {:<12} {} [{}]{}",
                    task.short_id(),
                    format_hms(Timer::from_task(task).display_seconds(now)),
                    task.status.to_tag(),
                    task.name,
                    task.project,
                    running
                );
                shown += 1;
            }
            if shown == 0 {
                println!("No tasks.");
            }
        }
        Commands::Start { id } => {
            let id = resolve_id(tracker.store(), &id)?;
            tracker
                .start(session, id)
                .map_err(|e| report_failure("start timer", e))?;
            print_notice(&Notice::timer_started());
        }
        Commands::Stop { id } => {
            let id = resolve_id(tracker.store(), &id)?;
            let report = tracker
                .stop(session, id)
                .map_err(|e| report_failure("stop timer", e))?;
            if config.desktop_notifications {
                notifications::notify_timer_stopped(&report.task.name, report.session_seconds);
            }
            print_notice(&Notice::timer_stopped(report.session_seconds));
        }
        Commands::Status { id } => {
            let id = resolve_id(tracker.store(), &id)?;
            let task = tracker.store().get(id)?;
            let timer = Timer::from_task(&task);
            let now = tracker.now();
            let shown = tracker.display_seconds(id).unwrap_or(task.time_spent);
            println!("{} [{}] {}", task.name, task.project, task.status.label());
            println!("Timer:   {}", task.timer_state().to_tag());
            println!("Time:    {}", format_hms(shown));
            if task.is_timer_running {
                println!("Session: {}", format_hms(timer.session_elapsed(now)));
            }
        }
        Commands::Log { id, hours, minutes, date, description } => {
            let date = match date {
                Some(raw) => parse_date(&raw)?,
                None => chrono::Local::now().date_naive(),
            };
            let id = resolve_id(tracker.store(), &id)?;
            let entry = ManualTimeEntry::new(date, hours, minutes, description);
            tracker
                .add_manual_entry(session, id, entry)
                .map_err(|e| report_failure("add time entry", e))?;
            print_notice(&Notice::entry_added());
        }
        Commands::Entries { id } => {
            let id = resolve_id(tracker.store(), &id)?;
            let task = tracker.store().get(id)?;
            if task.manual_time_entries.is_empty() {
                println!("No manual entries for {}.", task.name);
            }
            for entry in &task.manual_time_entries {
                println!("{}  {:>7}  {}", entry.date, format_duration(entry.seconds()), entry.description);
            }
        }
        Commands::Delete { id } => {
            let id = resolve_id(tracker.store(), &id)?;
            tracker
                .delete_task(session, id)
                .map_err(|e| report_failure("delete task", e))?;
            println!("Task deleted");
        }
        Commands::Invoice { project, rate, fixed, due, notes, number, preview } => {
            let kind = match (fixed, rate.or(config.default_hourly_rate)) {
                (Some(amount), _) => InvoiceKind::Fixed { amount },
                (None, Some(rate)) => InvoiceKind::Hourly { rate },
                (None, None) => anyhow::bail!("Rate or amount is required (--rate or --fixed)"),
            };
            let due_date = due.as_deref().map(parse_date).transpose()?;
            let request = InvoiceRequest {
                project,
                kind,
                due_date,
                notes,
                number,
            };

            let mut billing = Billing::open(data_dir);
            let invoice = if preview {
                billing.preview_invoice(tracker.tasks(), request)?
            } else {
                billing
                    .issue_invoice(session, tracker.tasks(), request)
                    .map_err(|e| report_failure("create invoice", e))?
            };
            print!("{}", report::render_invoice(&invoice, &config.currency));
            if !preview {
                print_notice(&Notice::success("Success", "Invoice created successfully"));
            }
        }
        Commands::Invoices { status } => {
            let filter = match status.as_deref() {
                Some(tag) => Some(
                    InvoiceStatus::from_tag(tag)
                        .ok_or_else(|| anyhow::anyhow!("Unknown status '{}', use paid or unpaid", tag))?,
                ),
                None => None,
            };
            let invoices: Vec<_> = Billing::open(data_dir)
                .invoices()?
                .into_iter()
                .filter(|inv| filter.map_or(true, |s| inv.status == s))
                .collect();
            if invoices.is_empty() {
                println!("No invoices.");
            }
            for inv in &invoices {
                let due = inv.due_date.map(|d| format!("  due {}", d)).unwrap_or_default();
                println!(
                    "{:<18} {}  {:<7} {:>10.2} {}  [{}]{}",
                    inv.invoice_number,
                    inv.invoice_date,
                    inv.status.to_tag(),
                    inv.total_amount,
                    config.currency,
                    inv.project,
                    due
                );
            }
            let totals = invoice_totals(&invoices);
            println!(
                "Paid: {:.2} {cur}  Unpaid: {:.2} {cur}",
                totals.paid,
                totals.unpaid,
                cur = config.currency
            );
        }
        Commands::Paid { invoice } => {
            set_invoice_status(data_dir, session, &invoice, InvoiceStatus::Paid)?;
        }
        Commands::Unpaid { invoice } => {
            set_invoice_status(data_dir, session, &invoice, InvoiceStatus::Unpaid)?;
        }
        Commands::Overdue => {
            let overdue = Billing::open(data_dir).overdue()?;
            if overdue.is_empty() {
                println!("No overdue invoices - you're all caught up!");
            }
            for (inv, days) in &overdue {
                let reminded = inv
                    .reminder_sent_at
                    .map(|at| format!("  reminded {}", at.date_naive()))
                    .unwrap_or_default();
                println!(
                    "{:<18} {:>4} {} overdue  {:>10.2} {}  [{}]{}",
                    inv.invoice_number,
                    days,
                    if *days == 1 { "day " } else { "days" },
                    inv.total_amount,
                    config.currency,
                    inv.project,
                    reminded
                );
            }
        }
        Commands::Remind { invoice } => {
            let mut billing = Billing::open(data_dir);
            let id = billing.resolve_invoice(&invoice)?;
            let invoice = billing
                .record_reminder(session, id)
                .map_err(|e| report_failure("send reminder", e))?;
            print_notice(&Notice::success(
                "Reminder Sent",
                format!("Reminder sent for invoice #{}", invoice.invoice_number),
            ));
        }
        Commands::Expense { name, amount, category, date, notes } => {
            let draft = ExpenseDraft {
                name,
                amount,
                expense_date: date,
                category,
                notes,
            };
            let expense = Billing::open(data_dir)
                .log_expense(session, draft)
                .map_err(|e| report_failure("save expense", e))?;
            println!(
                "Logged {} {} {:.2} {} ({})",
                &expense.id.simple().to_string()[..8],
                expense.name,
                expense.amount,
                config.currency,
                expense.category.label()
            );
        }
        Commands::Expenses { category } => {
            let filter = match category.as_deref() {
                Some(tag) => Some(
                    ExpenseCategory::from_tag(tag)
                        .ok_or_else(|| anyhow::anyhow!("Unknown category '{}'", tag))?,
                ),
                None => None,
            };
            let expenses: Vec<_> = Billing::open(data_dir)
                .expenses()?
                .into_iter()
                .filter(|e| filter.map_or(true, |c| e.category == c))
                .collect();
            if expenses.is_empty() {
                println!("No expenses.");
            }
            for expense in &expenses {
                let notes = expense.notes.as_deref().map(|n| format!("  {}", n)).unwrap_or_default();
                println!(
                    "{}  {}  {:<15} {:>10.2}  {}{}",
                    &expense.id.simple().to_string()[..8],
                    expense.expense_date,
                    expense.category.label(),
                    expense.amount,
                    expense.name,
                    notes
                );
            }
            let totals = totals_by_category(&expenses);
            for (category, total) in &totals {
                println!("{:<15} {:>10.2} {}", category.label(), total, config.currency);
            }
            println!("Total: {:.2} {}", totals.values().sum::<f64>(), config.currency);
        }
        Commands::EditExpense { id, name, amount, category, date, notes } => {
            let mut billing = Billing::open(data_dir);
            let id = billing.resolve_expense(&id)?;
            let current = billing.expense(id)?;
            let draft = ExpenseDraft {
                name: name.unwrap_or(current.name),
                amount: amount.unwrap_or_else(|| current.amount.to_string()),
                expense_date: date.unwrap_or_else(|| current.expense_date.format("%Y-%m-%d").to_string()),
                category: category.unwrap_or_else(|| current.category.label().to_string()),
                notes: notes.or(current.notes).unwrap_or_default(),
            };
            billing
                .edit_expense(session, id, draft)
                .map_err(|e| report_failure("update expense", e))?;
            print_notice(&Notice::success("Expense updated", "The expense has been updated successfully."));
        }
        Commands::DeleteExpense { id } => {
            let mut billing = Billing::open(data_dir);
            let id = billing.resolve_expense(&id)?;
            billing
                .delete_expense(session, id)
                .map_err(|e| report_failure("delete expense", e))?;
            print_notice(&Notice::success("Expense deleted", "The expense has been deleted successfully."));
        }
        Commands::ExportExpenses { output } => {
            let billing = Billing::open(data_dir);
            let expenses = billing.expenses()?;
            let path = report::export_expenses(data_dir, &expenses, billing.today(), output.map(PathBuf::from))?;
            println!("Exported {} expenses to {}", expenses.len(), path.display());
        }
        Commands::Report { output } => {
            let output = output.map(PathBuf::from);
            let path = report::generate_report(data_dir, tracker.tasks(), tracker.now(), output)?;
            println!("Report generated: {}", path.display());
        }
    }
    Ok(())
}

fn parse_date(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|e| anyhow::anyhow!("Invalid date format. Use YYYY-MM-DD: {}", e))
}

fn set_invoice_status(
    data_dir: &std::path::Path,
    session: &Session,
    key: &str,
    status: InvoiceStatus,
) -> Result<()> {
    let mut billing = Billing::open(data_dir);
    let id = billing.resolve_invoice(key)?;
    let invoice = billing
        .set_invoice_status(session, id, status)
        .map_err(|e| report_failure("update invoice status", e))?;
    print_notice(&Notice::success(
        "Success",
        format!("Invoice {} marked as {}", invoice.invoice_number, status.to_tag()),
    ));
    Ok(())
}

/// Print the failure notice and hand the error back for the exit status
fn report_failure(action: &str, err: error::BillableError) -> anyhow::Error {
    print_notice(&Notice::failed(action, &err));
    anyhow::Error::new(err)
}

fn print_notice(notice: &Notice) {
    if notice.is_error() {
        eprintln!("{}", notice.line());
    } else {
        println!("{}", notice.line());
    }
}

fn run_tui(
    tracker: Tracker<JsonFileStore>,
    session: Session,
    config: &AppConfig,
    data_dir: &std::path::Path,
) -> Result<()> {
    let ticker = Ticker::new(tick_duration(config.tick_ms));
    let mut app = AppState::new(tracker, session, ticker);
    app.desktop_notifications = config.desktop_notifications;
    app.use_emoji = config.use_emoji;
    match Billing::open(data_dir).overdue() {
        Ok(overdue) if !overdue.is_empty() => {
            app.notice = Some(Notice::destructive(
                "Overdue invoices",
                format!("{} unpaid past due, run `billable overdue`", overdue.len()),
            ));
        }
        Ok(_) => {}
        Err(e) => tracing::warn!(error = %e, "could not check overdue invoices"),
    }

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(&mut terminal, &mut app);

    // Restore terminal
    app.close();
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = &result {
        tracing::error!(error = %err, "terminal view failed");
    }
    result
}

fn run_app<S: TaskStore>(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut AppState<S>,
) -> Result<()> {
    let mut dirty = true;

    loop {
        if app.on_tick(std::time::Instant::now()) {
            dirty = true;
        }

        if dirty {
            terminal.draw(|f| ui::render(f, app))?;
            dirty = false;
        }

        // Wait for input until the next display refresh is due
        let timeout = app.ticker.until_due(std::time::Instant::now());
        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                // Only process key press events (ignore key release)
                if key.kind == KeyEventKind::Press {
                    if input::handle_key(app, key) {
                        return Ok(());
                    }
                    dirty = true;
                }
            }
        }
    }
}
