use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::Cents;

/// Row id assigned by the store. AUTOINCREMENT guarantees ids are never reused.
pub type TransactionId = i64;

/// Date layout used both in the `date` column and in exports.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Categories offered by the entry form. Any other label is accepted too.
pub const SUGGESTED_CATEGORIES: &[&str] = &[
    "Food",
    "Transport",
    "Bills",
    "Shopping",
    "Salary",
    "Investment",
    "Entertainment",
    "Other",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransactionKind {
    Income,
    Expense,
}

impl TransactionKind {
    /// The stored representation, also used in the `Type` export column.
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Income => "Income",
            TransactionKind::Expense => "Expense",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "income" => Some(TransactionKind::Income),
            "expense" => Some(TransactionKind::Expense),
            _ => None,
        }
    }
}

impl std::fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A recorded income or expense. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TransactionId,
    pub date: NaiveDate,
    pub kind: TransactionKind,
    pub category: String,
    /// Always positive
    pub amount_cents: Cents,
    pub description: Option<String>,
}

/// The fields a caller supplies to record a transaction. The id is assigned on insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTransaction {
    pub date: NaiveDate,
    pub kind: TransactionKind,
    pub category: String,
    pub amount_cents: Cents,
    pub description: Option<String>,
}

impl NewTransaction {
    pub fn new(
        date: NaiveDate,
        kind: TransactionKind,
        category: impl Into<String>,
        amount_cents: Cents,
    ) -> Self {
        Self {
            date,
            kind,
            category: category.into(),
            amount_cents,
            description: None,
        }
    }

    /// Blank descriptions are treated as absent.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        let description = description.into();
        self.description = if description.trim().is_empty() {
            None
        } else {
            Some(description)
        };
        self
    }

    pub fn has_valid_amount(&self) -> bool {
        self.amount_cents > 0
    }

    pub fn into_transaction(self, id: TransactionId) -> Transaction {
        Transaction {
            id,
            date: self.date,
            kind: self.kind,
            category: self.category,
            amount_cents: self.amount_cents,
            description: self.description,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, DATE_FORMAT).unwrap()
    }

    #[test]
    fn test_kind_roundtrip() {
        for kind in [TransactionKind::Income, TransactionKind::Expense] {
            assert_eq!(TransactionKind::from_str(kind.as_str()), Some(kind));
        }
        assert_eq!(
            TransactionKind::from_str(" EXPENSE "),
            Some(TransactionKind::Expense)
        );
        assert_eq!(TransactionKind::from_str("transfer"), None);
    }

    #[test]
    fn test_blank_description_is_none() {
        let tx = NewTransaction::new(date("2024-03-01"), TransactionKind::Expense, "Food", 500)
            .with_description("   ");
        assert_eq!(tx.description, None);

        let tx = tx.with_description("Lunch");
        assert_eq!(tx.description.as_deref(), Some("Lunch"));
    }

    #[test]
    fn test_amount_validity() {
        let d = date("2024-03-01");
        assert!(NewTransaction::new(d, TransactionKind::Income, "Salary", 1).has_valid_amount());
        assert!(!NewTransaction::new(d, TransactionKind::Income, "Salary", 0).has_valid_amount());
        assert!(!NewTransaction::new(d, TransactionKind::Expense, "Food", -10).has_valid_amount());
    }

    #[test]
    fn test_into_transaction_keeps_fields() {
        let tx = NewTransaction::new(date("2024-03-01"), TransactionKind::Expense, "Bills", 12000)
            .with_description("Electricity")
            .into_transaction(7);
        assert_eq!(tx.id, 7);
        assert_eq!(tx.category, "Bills");
        assert_eq!(tx.amount_cents, 12000);
        assert_eq!(tx.description.as_deref(), Some("Electricity"));
    }
}
