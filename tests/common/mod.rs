// Allow dead_code because these helpers are used across different test files
// which are compiled separately
#![allow(dead_code)]

use anyhow::Result;
use chrono::NaiveDate;
use fintrack::application::LedgerStore;
use fintrack::domain::{NewTransaction, TransactionId, TransactionKind};
use tempfile::TempDir;

/// Helper to create a test store with a temporary database
pub async fn test_store() -> Result<(LedgerStore, TempDir)> {
    let temp_dir = TempDir::new()?;
    let db_path = temp_dir.path().join("finance.db");
    let store = LedgerStore::open(&db_path).await?;
    Ok((store, temp_dir))
}

/// Helper to parse a date string into NaiveDate
pub fn parse_date(date_str: &str) -> NaiveDate {
    NaiveDate::parse_from_str(date_str, "%Y-%m-%d").unwrap()
}

pub async fn add_income(
    store: &LedgerStore,
    date: &str,
    category: &str,
    cents: i64,
) -> Result<TransactionId> {
    let tx = NewTransaction::new(parse_date(date), TransactionKind::Income, category, cents);
    Ok(store.add(tx).await?)
}

pub async fn add_expense(
    store: &LedgerStore,
    date: &str,
    category: &str,
    cents: i64,
) -> Result<TransactionId> {
    let tx = NewTransaction::new(parse_date(date), TransactionKind::Expense, category, cents);
    Ok(store.add(tx).await?)
}
