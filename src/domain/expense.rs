use crate::error::{BillableError, BillableResult};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Bookkeeping category of an expense
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ExpenseCategory {
    Software,
    Travel,
    Equipment,
    Marketing,
    Education,
    Utilities,
    #[serde(rename = "Office Supplies")]
    OfficeSupplies,
    Other,
}

impl ExpenseCategory {
    /// Parse a category name; case, spaces and hyphens are not significant
    pub fn from_tag(tag: &str) -> Option<Self> {
        let wanted: String = tag
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '-' && *c != '_')
            .collect::<String>()
            .to_lowercase();
        Self::all()
            .iter()
            .copied()
            .find(|c| c.label().replace(' ', "").to_lowercase() == wanted)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Software => "Software",
            Self::Travel => "Travel",
            Self::Equipment => "Equipment",
            Self::Marketing => "Marketing",
            Self::Education => "Education",
            Self::Utilities => "Utilities",
            Self::OfficeSupplies => "Office Supplies",
            Self::Other => "Other",
        }
    }

    pub fn all() -> &'static [ExpenseCategory] {
        &[
            Self::Software,
            Self::Travel,
            Self::Equipment,
            Self::Marketing,
            Self::Education,
            Self::Utilities,
            Self::OfficeSupplies,
            Self::Other,
        ]
    }
}

/// A business expense as kept in expenses.json
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    pub id: Uuid,
    pub name: String,
    pub amount: f64,
    pub expense_date: NaiveDate,
    pub category: ExpenseCategory,
    #[serde(default)]
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Raw expense form input
#[derive(Debug, Clone, Default)]
pub struct ExpenseDraft {
    pub name: String,
    pub amount: String,
    /// YYYY-MM-DD; empty means today
    pub expense_date: String,
    pub category: String,
    pub notes: String,
}

/// Expense fields that passed validation
#[derive(Debug, Clone, PartialEq)]
pub struct ValidExpenseFields {
    pub name: String,
    pub amount: f64,
    pub expense_date: NaiveDate,
    pub category: ExpenseCategory,
    pub notes: Option<String>,
}

impl ExpenseDraft {
    pub fn validate(&self, today: NaiveDate) -> BillableResult<ValidExpenseFields> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(BillableError::InvalidInput("expense name is required".to_string()));
        }

        let amount: f64 = self.amount.trim().parse().map_err(|_| {
            BillableError::InvalidInput(format!("invalid amount '{}'", self.amount.trim()))
        })?;
        if !amount.is_finite() || amount <= 0.0 {
            return Err(BillableError::InvalidInput("amount must be greater than zero".to_string()));
        }

        let category = ExpenseCategory::from_tag(&self.category).ok_or_else(|| {
            let expected: Vec<&str> = ExpenseCategory::all().iter().map(|c| c.label()).collect();
            BillableError::InvalidInput(format!(
                "unknown category '{}' (expected one of: {})",
                self.category.trim(),
                expected.join(", ")
            ))
        })?;

        let expense_date = match self.expense_date.trim() {
            "" => today,
            raw => NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| {
                BillableError::InvalidInput(format!("invalid expense date '{}', use YYYY-MM-DD", raw))
            })?,
        };

        let notes = match self.notes.trim() {
            "" => None,
            text => Some(text.to_string()),
        };

        Ok(ValidExpenseFields {
            name: name.to_string(),
            amount,
            expense_date,
            category,
            notes,
        })
    }

    pub fn into_expense(self, today: NaiveDate, now: DateTime<Utc>) -> BillableResult<Expense> {
        let fields = self.validate(today)?;
        Ok(Expense {
            id: Uuid::new_v4(),
            name: fields.name,
            amount: fields.amount,
            expense_date: fields.expense_date,
            category: fields.category,
            notes: fields.notes,
            created_at: now,
            updated_at: now,
        })
    }
}

impl ValidExpenseFields {
    /// Overwrite the editable fields of an existing expense
    pub fn apply_to(self, expense: &mut Expense) {
        expense.name = self.name;
        expense.amount = self.amount;
        expense.expense_date = self.expense_date;
        expense.category = self.category;
        expense.notes = self.notes;
    }
}

/// Sum of expense amounts per category
pub fn totals_by_category(expenses: &[Expense]) -> BTreeMap<ExpenseCategory, f64> {
    let mut totals = BTreeMap::new();
    for expense in expenses {
        *totals.entry(expense.category).or_insert(0.0) += expense.amount;
    }
    totals
}
