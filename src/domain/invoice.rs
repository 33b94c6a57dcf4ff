use super::task::Task;
use crate::error::{BillableError, BillableResult};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// How an invoice total is derived
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InvoiceKind {
    Hourly { rate: f64 },
    Fixed { amount: f64 },
}

/// Computed invoice figures for one project
#[derive(Debug, Clone, PartialEq)]
pub struct InvoiceDraft {
    pub number: String,
    pub project: String,
    pub invoice_date: NaiveDate,
    pub hours_worked: f64,
    pub hourly_rate: f64,
    pub total_amount: f64,
}

/// Payment state of a saved invoice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvoiceStatus {
    #[default]
    Unpaid,
    Paid,
}

impl InvoiceStatus {
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag.trim() {
            "unpaid" => Some(Self::Unpaid),
            "paid" => Some(Self::Paid),
            _ => None,
        }
    }

    pub fn to_tag(&self) -> &'static str {
        match self {
            Self::Unpaid => "unpaid",
            Self::Paid => "paid",
        }
    }
}

/// An issued invoice as kept in invoices.json
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invoice {
    pub id: Uuid,
    pub invoice_number: String,
    pub project: String,
    pub invoice_date: NaiveDate,
    pub hours_worked: f64,
    pub hourly_rate: f64,
    pub total_amount: f64,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub status: InvoiceStatus,
    #[serde(default)]
    pub reminder_sent_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Invoice {
    /// Turn computed figures into an unpaid invoice record
    pub fn issue(
        draft: InvoiceDraft,
        due_date: Option<NaiveDate>,
        notes: Option<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            invoice_number: draft.number,
            project: draft.project,
            invoice_date: draft.invoice_date,
            hours_worked: draft.hours_worked,
            hourly_rate: draft.hourly_rate,
            total_amount: draft.total_amount,
            due_date,
            notes: notes.filter(|n| !n.trim().is_empty()),
            status: InvoiceStatus::Unpaid,
            reminder_sent_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Whole days past the due date, for unpaid invoices only
    pub fn days_overdue(&self, today: NaiveDate) -> Option<i64> {
        if self.status == InvoiceStatus::Paid {
            return None;
        }
        let due = self.due_date?;
        let days = today.signed_duration_since(due).num_days();
        (days > 0).then_some(days)
    }
}

/// Unpaid invoices past their due date, most overdue first
pub fn overdue_invoices(invoices: &[Invoice], today: NaiveDate) -> Vec<(&Invoice, i64)> {
    let mut overdue: Vec<(&Invoice, i64)> = invoices
        .iter()
        .filter_map(|inv| inv.days_overdue(today).map(|days| (inv, days)))
        .collect();
    overdue.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.invoice_number.cmp(&b.0.invoice_number)));
    overdue
}

/// Next free sequence number for invoices dated `date`
pub fn next_sequence(invoices: &[Invoice], date: NaiveDate) -> u32 {
    let prefix = format!("INV-{}-", date.format("%Y%m%d"));
    invoices
        .iter()
        .filter_map(|inv| inv.invoice_number.strip_prefix(&prefix))
        .filter_map(|seq| seq.parse::<u32>().ok())
        .max()
        .map_or(1, |last| last + 1)
}

/// Paid and outstanding amounts across invoices
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct InvoiceTotals {
    pub paid: f64,
    pub unpaid: f64,
}

pub fn invoice_totals(invoices: &[Invoice]) -> InvoiceTotals {
    invoices.iter().fold(InvoiceTotals::default(), |mut totals, inv| {
        match inv.status {
            InvoiceStatus::Paid => totals.paid += inv.total_amount,
            InvoiceStatus::Unpaid => totals.unpaid += inv.total_amount,
        }
        totals
    })
}

/// Hours tracked on the given tasks, rounded to two decimals
pub fn hours_worked<'a>(tasks: impl IntoIterator<Item = &'a Task>) -> f64 {
    let seconds: u64 = tasks.into_iter().map(|t| t.time_spent).sum();
    round2(seconds as f64 / 3600.0)
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Invoice number for the `sequence`-th invoice of a day
pub fn invoice_number(date: NaiveDate, sequence: u32) -> String {
    format!("INV-{}-{}", date.format("%Y%m%d"), sequence)
}

/// Build invoice figures for a project from its tasks
pub fn build_invoice(
    project: &str,
    tasks: &[Task],
    kind: InvoiceKind,
    invoice_date: NaiveDate,
    sequence: u32,
) -> BillableResult<InvoiceDraft> {
    let project_tasks = tasks.iter().filter(|t| t.project == project);
    let tracked_hours = hours_worked(project_tasks);

    let (hours, rate, total) = match kind {
        InvoiceKind::Hourly { rate } => {
            check_amount("hourly rate", rate)?;
            (tracked_hours, rate, round2(tracked_hours * rate))
        }
        InvoiceKind::Fixed { amount } => {
            check_amount("fixed amount", amount)?;
            (0.0, 0.0, round2(amount))
        }
    };

    Ok(InvoiceDraft {
        number: invoice_number(invoice_date, sequence),
        project: project.to_string(),
        invoice_date,
        hours_worked: hours,
        hourly_rate: rate,
        total_amount: total,
    })
}

fn check_amount(what: &str, value: f64) -> BillableResult<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(BillableError::InvalidInput(format!(
            "{} must be a non-negative number",
            what
        )));
    }
    Ok(())
}
