use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::{Cents, Transaction, TransactionKind};

/// Running totals shown above the transaction list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Totals {
    pub total_income: Cents,
    pub total_expense: Cents,
}

impl Totals {
    pub fn balance(&self) -> Cents {
        self.total_income - self.total_expense
    }
}

/// Expense distribution by category, largest first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpenseReport {
    pub categories: Vec<CategorySummary>,
    pub total: Cents,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategorySummary {
    pub category: String,
    pub total: Cents,
    pub count: i64,
    /// Share of all expenses, 0.0 to 100.0
    pub percentage: f64,
}

impl ExpenseReport {
    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }
}

/// One row of the flat export: everything except the id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportRecord {
    pub date: NaiveDate,
    pub kind: TransactionKind,
    pub category: String,
    pub amount_cents: Cents,
    pub description: Option<String>,
}

impl From<Transaction> for ExportRecord {
    fn from(tx: Transaction) -> Self {
        Self {
            date: tx.date,
            kind: tx.kind,
            category: tx.category,
            amount_cents: tx.amount_cents,
            description: tx.description,
        }
    }
}
