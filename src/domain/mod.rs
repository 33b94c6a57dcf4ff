pub mod enums;
pub mod expense;
pub mod invoice;
pub mod session;
pub mod task;
pub mod timer;
pub mod views;

pub use enums::{Plan, TaskStatus, UiMode};
pub use expense::{totals_by_category, Expense, ExpenseCategory, ExpenseDraft};
pub use invoice::{
    build_invoice, invoice_totals, next_sequence, overdue_invoices, Invoice, InvoiceKind,
    InvoiceStatus,
};
pub use session::Session;
pub use task::{ManualTimeEntry, Task, TaskDraft, TaskPatch};
pub use timer::{plan_manual_entry, plan_start, plan_stop, Timer};
pub use views::{compute_totals, format_duration, format_hms, progress_glyph, status_badge};
