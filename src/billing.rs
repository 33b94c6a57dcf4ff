//! Saved invoices and expenses.
//!
//! Every write checks the session first and maps a failed save to
//! `RemoteWrite`, the same contract the task tracker follows.

use crate::domain::{
    build_invoice, next_sequence, overdue_invoices, Expense, ExpenseDraft, Invoice, InvoiceKind,
    InvoiceStatus, Session, Task,
};
use crate::error::{BillableError, BillableResult, StoreError};
use crate::persistence::{expenses_file, invoices_file, match_id_prefix, RecordFile};
use crate::tracker::{Clock, SystemClock};
use chrono::{Local, NaiveDate};
use std::path::Path;
use uuid::Uuid;

/// What to bill and how
#[derive(Debug, Clone)]
pub struct InvoiceRequest {
    pub project: String,
    pub kind: InvoiceKind,
    pub due_date: Option<NaiveDate>,
    pub notes: Option<String>,
    /// Explicit invoice number; the next free INV-YYYYMMDD-<n> when absent
    pub number: Option<String>,
}

pub struct Billing<C: Clock = SystemClock> {
    invoices: RecordFile<Invoice>,
    expenses: RecordFile<Expense>,
    clock: C,
}

impl Billing<SystemClock> {
    pub fn open(data_dir: &Path) -> Self {
        let invoices = RecordFile::new(invoices_file(data_dir));
        let expenses = RecordFile::new(expenses_file(data_dir));
        tracing::debug!(
            invoices = %invoices.path().display(),
            expenses = %expenses.path().display(),
            "opening billing records"
        );
        Self::with_clock(invoices, expenses, SystemClock)
    }
}

impl<C: Clock> Billing<C> {
    pub fn with_clock(invoices: RecordFile<Invoice>, expenses: RecordFile<Expense>, clock: C) -> Self {
        Self {
            invoices,
            expenses,
            clock,
        }
    }

    /// Local calendar date, used for invoice dates and due checks
    pub fn today(&self) -> NaiveDate {
        self.clock.now().with_timezone(&Local).date_naive()
    }

    /// Invoice as it would be issued now, without saving it
    pub fn preview_invoice(&self, tasks: &[Task], request: InvoiceRequest) -> BillableResult<Invoice> {
        let today = self.today();
        let existing = self.invoices.list()?;
        let mut draft = build_invoice(
            &request.project,
            tasks,
            request.kind,
            today,
            next_sequence(&existing, today),
        )?;

        if let Some(number) = request.number {
            let number = number.trim().to_string();
            if number.is_empty() {
                return Err(BillableError::InvalidInput("invoice number is required".to_string()));
            }
            draft.number = number;
        }
        if existing.iter().any(|inv| inv.invoice_number == draft.number) {
            return Err(BillableError::InvalidInput(format!(
                "invoice {} already exists",
                draft.number
            )));
        }

        Ok(Invoice::issue(draft, request.due_date, request.notes, self.clock.now()))
    }

    pub fn issue_invoice(
        &mut self,
        session: &Session,
        tasks: &[Task],
        request: InvoiceRequest,
    ) -> BillableResult<Invoice> {
        session.ensure_active(self.clock.now())?;

        let invoice = self.preview_invoice(tasks, request)?;
        let invoice = self.invoices.insert(invoice).map_err(|e| {
            tracing::warn!(error = %e, "failed to save invoice");
            BillableError::RemoteWrite(e)
        })?;
        tracing::info!(number = %invoice.invoice_number, total = invoice.total_amount, "invoice issued");
        Ok(invoice)
    }

    /// All invoices, newest first
    pub fn invoices(&self) -> BillableResult<Vec<Invoice>> {
        let mut invoices = self.invoices.list()?;
        invoices.sort_by(|a, b| {
            b.invoice_date
                .cmp(&a.invoice_date)
                .then_with(|| b.invoice_number.cmp(&a.invoice_number))
        });
        Ok(invoices)
    }

    /// Find an invoice by its number or by an id prefix
    pub fn resolve_invoice(&self, key: &str) -> BillableResult<Uuid> {
        let invoices = self.invoices.list()?;
        if let Some(inv) = invoices.iter().find(|inv| inv.invoice_number == key.trim()) {
            return Ok(inv.id);
        }
        match_id_prefix(invoices.iter().map(|inv| inv.id), key, "invoice")
    }

    pub fn set_invoice_status(
        &mut self,
        session: &Session,
        id: Uuid,
        status: InvoiceStatus,
    ) -> BillableResult<Invoice> {
        session.ensure_active(self.clock.now())?;
        let invoice = self
            .invoices
            .update(id, |inv| inv.status = status)
            .map_err(|e| write_failed("invoice", id, e))?;
        tracing::info!(number = %invoice.invoice_number, status = status.to_tag(), "invoice status changed");
        Ok(invoice)
    }

    /// Unpaid invoices past due, most overdue first
    pub fn overdue(&self) -> BillableResult<Vec<(Invoice, i64)>> {
        let invoices = self.invoices.list()?;
        Ok(overdue_invoices(&invoices, self.today())
            .into_iter()
            .map(|(inv, days)| (inv.clone(), days))
            .collect())
    }

    /// Record that a payment reminder went out for an overdue invoice
    pub fn record_reminder(&mut self, session: &Session, id: Uuid) -> BillableResult<Invoice> {
        let now = self.clock.now();
        session.ensure_active(now)?;

        let invoice = self.invoices.get(id)?;
        if invoice.days_overdue(self.today()).is_none() {
            return Err(BillableError::InvalidInput(format!(
                "invoice {} is not overdue",
                invoice.invoice_number
            )));
        }
        self.invoices
            .update(id, |inv| inv.reminder_sent_at = Some(now))
            .map_err(|e| write_failed("invoice", id, e))
    }

    pub fn log_expense(&mut self, session: &Session, draft: ExpenseDraft) -> BillableResult<Expense> {
        let now = self.clock.now();
        session.ensure_active(now)?;

        let expense = draft.into_expense(self.today(), now)?;
        let expense = self.expenses.insert(expense).map_err(|e| {
            tracing::warn!(error = %e, "failed to save expense");
            BillableError::RemoteWrite(e)
        })?;
        tracing::info!(expense = %expense.id, amount = expense.amount, "expense logged");
        Ok(expense)
    }

    pub fn edit_expense(
        &mut self,
        session: &Session,
        id: Uuid,
        draft: ExpenseDraft,
    ) -> BillableResult<Expense> {
        session.ensure_active(self.clock.now())?;
        let fields = draft.validate(self.today())?;
        self.expenses
            .update(id, |expense| fields.apply_to(expense))
            .map_err(|e| write_failed("expense", id, e))
    }

    pub fn delete_expense(&mut self, session: &Session, id: Uuid) -> BillableResult<()> {
        session.ensure_active(self.clock.now())?;
        self.expenses
            .delete(id)
            .map_err(|e| write_failed("expense", id, e))
    }

    /// All expenses, most recent first
    pub fn expenses(&self) -> BillableResult<Vec<Expense>> {
        let mut expenses = self.expenses.list()?;
        expenses.sort_by(|a, b| {
            b.expense_date
                .cmp(&a.expense_date)
                .then_with(|| b.created_at.cmp(&a.created_at))
        });
        Ok(expenses)
    }

    pub fn expense(&self, id: Uuid) -> BillableResult<Expense> {
        Ok(self.expenses.get(id)?)
    }

    pub fn resolve_expense(&self, prefix: &str) -> BillableResult<Uuid> {
        let ids = self.expenses.list()?.into_iter().map(|e| e.id);
        match_id_prefix(ids, prefix, "expense")
    }
}

fn write_failed(what: &str, id: Uuid, e: StoreError) -> BillableError {
    match e {
        StoreError::NotFound(_) => BillableError::Store(e),
        e => {
            tracing::warn!(record = %id, error = %e, "failed to save {}", what);
            BillableError::RemoteWrite(e)
        }
    }
}
