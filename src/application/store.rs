use std::collections::BTreeMap;
use std::path::Path;

use chrono::NaiveDate;
use tracing::{debug, info, warn};

use crate::domain::{format_cents, Cents, NewTransaction, Transaction, TransactionId, TransactionKind};
use crate::storage::Repository;

use super::{AppError, CategorySummary, ExpenseReport, ExportRecord, Totals};

/// Filter for listing transactions. Unset fields match everything.
#[derive(Debug, Clone, Default)]
pub struct TransactionFilter {
    pub kind: Option<TransactionKind>,
    pub category: Option<String>,
    /// Inclusive lower bound
    pub from_date: Option<NaiveDate>,
    /// Inclusive upper bound
    pub to_date: Option<NaiveDate>,
    pub limit: Option<usize>,
}

enum Backend {
    Ready(Repository),
    Unavailable(String),
}

/// Owns the transaction records and derives summaries from them.
///
/// Built once at startup and handed by reference to front-ends. A store
/// whose database failed to open stays usable as a value, but every
/// operation on it returns [`AppError::StorageUnavailable`].
pub struct LedgerStore {
    backend: Backend,
}

impl LedgerStore {
    pub fn new(repo: Repository) -> Self {
        Self {
            backend: Backend::Ready(repo),
        }
    }

    /// A store with no backing database.
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self {
            backend: Backend::Unavailable(reason.into()),
        }
    }

    /// Open (creating if needed) the database at `path` and ensure the schema exists.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, AppError> {
        let path = path.as_ref();
        let repo = Repository::init(path)
            .await
            .map_err(|e| AppError::StorageUnavailable(format!("{:#}", e)))?;
        info!(path = %path.display(), "ledger database opened");
        Ok(Self::new(repo))
    }

    /// Like [`LedgerStore::open`], but falls back to a degraded store.
    /// The startup error is returned alongside so the caller can report it once.
    pub async fn open_degraded(path: impl AsRef<Path>) -> (Self, Option<AppError>) {
        match Self::open(path.as_ref()).await {
            Ok(store) => (store, None),
            Err(e) => {
                warn!(error = %e, "continuing without storage");
                (Self::unavailable(e.to_string()), Some(e))
            }
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self.backend, Backend::Ready(_))
    }

    fn repo(&self) -> Result<&Repository, AppError> {
        match &self.backend {
            Backend::Ready(repo) => Ok(repo),
            Backend::Unavailable(reason) => Err(AppError::StorageUnavailable(reason.clone())),
        }
    }

    /// Release the database connection.
    pub async fn close(self) {
        if let Backend::Ready(repo) = self.backend {
            repo.close().await;
            debug!("ledger database closed");
        }
    }

    // ========================
    // Writes
    // ========================

    /// Record a new transaction and return its id.
    pub async fn add(&self, tx: NewTransaction) -> Result<TransactionId, AppError> {
        if !tx.has_valid_amount() {
            return Err(AppError::InvalidAmount(format!(
                "amount must be positive, got {}",
                format_cents(tx.amount_cents)
            )));
        }

        let id = self
            .repo()?
            .insert_transaction(&tx)
            .await
            .map_err(AppError::PersistenceFailure)?;

        info!(
            id,
            kind = %tx.kind,
            category = %tx.category,
            amount = %format_cents(tx.amount_cents),
            "transaction added"
        );
        Ok(id)
    }

    /// Delete a transaction. Returns whether a record was removed; an unknown id is a no-op.
    pub async fn delete(&self, id: TransactionId) -> Result<bool, AppError> {
        let removed = self
            .repo()?
            .delete_transaction(id)
            .await
            .map_err(AppError::PersistenceFailure)?;

        if removed > 0 {
            info!(id, "transaction deleted");
        } else {
            debug!(id, "delete ignored, no such transaction");
        }
        Ok(removed > 0)
    }

    // ========================
    // Reads
    // ========================

    pub async fn get(&self, id: TransactionId) -> Result<Option<Transaction>, AppError> {
        Ok(self.repo()?.get_transaction(id).await?)
    }

    pub async fn count(&self) -> Result<i64, AppError> {
        Ok(self.repo()?.count_transactions().await?)
    }

    /// All transactions, newest date first. Same-day records are newest id first.
    pub async fn list_all(&self) -> Result<Vec<Transaction>, AppError> {
        let transactions = self.repo()?.list_transactions().await?;
        debug!(count = transactions.len(), "listed transactions");
        Ok(transactions)
    }

    /// Transactions matching `filter`, in the same order as [`LedgerStore::list_all`].
    pub async fn list_filtered(
        &self,
        filter: &TransactionFilter,
    ) -> Result<Vec<Transaction>, AppError> {
        let transactions = self
            .repo()?
            .list_transactions_filtered(
                filter.kind,
                filter.category.as_deref(),
                filter.from_date,
                filter.to_date,
                filter.limit,
            )
            .await?;
        debug!(count = transactions.len(), ?filter, "listed filtered transactions");
        Ok(transactions)
    }

    pub async fn summarize_totals(&self) -> Result<Totals, AppError> {
        let (total_income, total_expense) = self.repo()?.sum_by_kind().await?;
        Ok(Totals {
            total_income,
            total_expense,
        })
    }

    /// Summed expense amount per category. Income records are ignored.
    pub async fn summarize_expense_by_category(
        &self,
    ) -> Result<BTreeMap<String, Cents>, AppError> {
        let aggregates = self.repo()?.sum_expenses_by_category().await?;
        Ok(aggregates
            .into_iter()
            .map(|agg| (agg.category, agg.total))
            .collect())
    }

    /// Expense breakdown with shares, for the chart view.
    pub async fn expense_report(&self) -> Result<ExpenseReport, AppError> {
        let aggregates = self.repo()?.sum_expenses_by_category().await?;
        let total: Cents = aggregates.iter().map(|agg| agg.total).sum();

        let categories = aggregates
            .into_iter()
            .map(|agg| CategorySummary {
                percentage: if total > 0 {
                    agg.total as f64 / total as f64 * 100.0
                } else {
                    0.0
                },
                category: agg.category,
                total: agg.total,
                count: agg.count,
            })
            .collect();

        Ok(ExpenseReport { categories, total })
    }

    /// Every record, oldest date first, ready for serialization.
    pub async fn export_all(&self) -> Result<Vec<ExportRecord>, AppError> {
        let transactions = self.repo()?.list_transactions_ascending().await?;
        Ok(transactions.into_iter().map(ExportRecord::from).collect())
    }
}
