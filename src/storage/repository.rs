use std::path::Path;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, SqlitePool};
use tracing::info;

use crate::domain::{
    cents_to_real, real_to_cents, Cents, NewTransaction, Transaction, TransactionId,
    TransactionKind, DATE_FORMAT,
};

use super::MIGRATION_001_INITIAL;

const SELECT_COLUMNS: &str = "SELECT id, date, kind, category, amount, description FROM transactions";

/// Stored amounts are REAL; aggregate on rounded cents so sums stay exact.
const AMOUNT_CENTS_SQL: &str = "CAST(ROUND(amount * 100) AS INTEGER)";

/// Per-category expense aggregate computed in SQL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryAggregate {
    pub category: String,
    pub total: Cents,
    pub count: i64,
}

/// Repository for persisting and querying transactions.
///
/// Holds a pool capped at one connection that never idles out, so the
/// database file stays exclusively open until [`Repository::close`] or drop.
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Connect to the SQLite file at `path`, creating it when `create_if_missing` is set.
    pub async fn connect(path: &Path, create_if_missing: bool) -> Result<Self> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(create_if_missing);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .with_context(|| format!("Failed to open database {}", path.display()))?;

        Ok(Self::new(pool))
    }

    /// Create the schema if it does not exist yet, and bring a desktop-app
    /// database up to the current layout.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::raw_sql(MIGRATION_001_INITIAL)
            .execute(&self.pool)
            .await
            .context("Failed to run migration 001")?;
        self.upgrade_legacy_schema().await
    }

    /// Files written by the desktop app name the kind column `type`.
    /// Rename it in place; the stored values are already `Income`/`Expense`.
    async fn upgrade_legacy_schema(&self) -> Result<()> {
        let columns: Vec<String> =
            sqlx::query_scalar("SELECT name FROM pragma_table_info('transactions')")
                .fetch_all(&self.pool)
                .await
                .context("Failed to inspect transactions table")?;

        let has = |name: &str| columns.iter().any(|c| c.eq_ignore_ascii_case(name));
        if has("type") && !has("kind") {
            sqlx::query("ALTER TABLE transactions RENAME COLUMN type TO kind")
                .execute(&self.pool)
                .await
                .context("Failed to rename legacy column type to kind")?;
            info!("renamed legacy transactions.type column to kind");
        }
        Ok(())
    }

    /// Connect (creating the file) and migrate.
    pub async fn init(path: &Path) -> Result<Self> {
        let repo = Self::connect(path, true).await?;
        repo.migrate().await?;
        Ok(repo)
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }

    /// Insert a transaction and return the id SQLite assigned to it.
    pub async fn insert_transaction(&self, tx: &NewTransaction) -> Result<TransactionId> {
        let result = sqlx::query(
            r#"
            INSERT INTO transactions (date, kind, category, amount, description)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(tx.date.format(DATE_FORMAT).to_string())
        .bind(tx.kind.as_str())
        .bind(&tx.category)
        .bind(cents_to_real(tx.amount_cents))
        .bind(&tx.description)
        .execute(&self.pool)
        .await
        .context("Failed to insert transaction")?;

        Ok(result.last_insert_rowid())
    }

    /// Delete a transaction, returning the number of rows removed (0 or 1).
    pub async fn delete_transaction(&self, id: TransactionId) -> Result<u64> {
        let result = sqlx::query("DELETE FROM transactions WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to delete transaction")?;
        Ok(result.rows_affected())
    }

    pub async fn get_transaction(&self, id: TransactionId) -> Result<Option<Transaction>> {
        let row = sqlx::query(&format!("{SELECT_COLUMNS} WHERE id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch transaction")?;

        row.as_ref().map(Self::row_to_transaction).transpose()
    }

    pub async fn count_transactions(&self) -> Result<i64> {
        let row = sqlx::query("SELECT COUNT(*) as count FROM transactions")
            .fetch_one(&self.pool)
            .await
            .context("Failed to count transactions")?;
        Ok(row.get("count"))
    }

    /// All transactions, newest date first, ties broken by newest id.
    pub async fn list_transactions(&self) -> Result<Vec<Transaction>> {
        self.list_transactions_filtered(None, None, None, None, None)
            .await
    }

    /// All transactions, oldest date first, ties broken by oldest id.
    pub async fn list_transactions_ascending(&self) -> Result<Vec<Transaction>> {
        let rows = sqlx::query(&format!("{SELECT_COLUMNS} ORDER BY date ASC, id ASC"))
            .fetch_all(&self.pool)
            .await
            .context("Failed to list transactions for export")?;

        rows.iter().map(Self::row_to_transaction).collect()
    }

    /// List transactions with optional filters, newest first.
    /// Both date bounds are inclusive.
    pub async fn list_transactions_filtered(
        &self,
        kind: Option<TransactionKind>,
        category: Option<&str>,
        from_date: Option<NaiveDate>,
        to_date: Option<NaiveDate>,
        limit: Option<usize>,
    ) -> Result<Vec<Transaction>> {
        let mut query = format!("{SELECT_COLUMNS} WHERE 1=1");

        let from_date_str = from_date.map(|d| d.format(DATE_FORMAT).to_string());
        let to_date_str = to_date.map(|d| d.format(DATE_FORMAT).to_string());

        if kind.is_some() {
            query.push_str(" AND kind = ?");
        }
        if category.is_some() {
            query.push_str(" AND category = ?");
        }
        if from_date.is_some() {
            query.push_str(" AND date >= ?");
        }
        if to_date.is_some() {
            query.push_str(" AND date <= ?");
        }

        query.push_str(" ORDER BY date DESC, id DESC");

        if let Some(lim) = limit {
            query.push_str(&format!(" LIMIT {}", lim));
        }

        let mut sql_query = sqlx::query(&query);

        if let Some(k) = kind {
            sql_query = sql_query.bind(k.as_str());
        }
        if let Some(cat) = category {
            sql_query = sql_query.bind(cat);
        }
        if let Some(ref fd) = from_date_str {
            sql_query = sql_query.bind(fd);
        }
        if let Some(ref td) = to_date_str {
            sql_query = sql_query.bind(td);
        }

        let rows = sql_query
            .fetch_all(&self.pool)
            .await
            .context("Failed to list transactions")?;

        rows.iter().map(Self::row_to_transaction).collect()
    }

    /// Sum of income and expense amounts, each 0 when no records of that kind exist.
    pub async fn sum_by_kind(&self) -> Result<(Cents, Cents)> {
        let row = sqlx::query(&format!(
            r#"
            SELECT
                COALESCE(SUM(CASE WHEN kind = ? THEN {AMOUNT_CENTS_SQL} ELSE 0 END), 0) as income,
                COALESCE(SUM(CASE WHEN kind = ? THEN {AMOUNT_CENTS_SQL} ELSE 0 END), 0) as expense
            FROM transactions
            "#
        ))
        .bind(TransactionKind::Income.as_str())
        .bind(TransactionKind::Expense.as_str())
        .fetch_one(&self.pool)
        .await
        .context("Failed to sum transactions by kind")?;

        Ok((row.get("income"), row.get("expense")))
    }

    /// Expense totals grouped by category, largest first.
    pub async fn sum_expenses_by_category(&self) -> Result<Vec<CategoryAggregate>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT category, SUM({AMOUNT_CENTS_SQL}) as total, COUNT(*) as count
            FROM transactions
            WHERE kind = ?
            GROUP BY category
            ORDER BY total DESC, category ASC
            "#
        ))
        .bind(TransactionKind::Expense.as_str())
        .fetch_all(&self.pool)
        .await
        .context("Failed to sum expenses by category")?;

        Ok(rows
            .iter()
            .map(|row| CategoryAggregate {
                category: row.get("category"),
                total: row.get("total"),
                count: row.get("count"),
            })
            .collect())
    }

    fn row_to_transaction(row: &SqliteRow) -> Result<Transaction> {
        let date_str: String = row.get("date");
        let kind_str: String = row.get("kind");
        let amount: f64 = row.get("amount");
        let description: Option<String> = row.get("description");

        Ok(Transaction {
            id: row.get("id"),
            date: NaiveDate::parse_from_str(&date_str, DATE_FORMAT)
                .with_context(|| format!("Invalid transaction date: {}", date_str))?,
            kind: TransactionKind::from_str(&kind_str)
                .ok_or_else(|| anyhow::anyhow!("Invalid transaction kind: {}", kind_str))?,
            category: row.get("category"),
            amount_cents: real_to_cents(amount),
            description: description.filter(|d| !d.is_empty()),
        })
    }
}
