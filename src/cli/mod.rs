mod shell;
mod style;

use std::io;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};

use crate::application::{AppError, LedgerStore, TransactionFilter};
use crate::domain::{
    parse_cents, NewTransaction, ParseCentsError, TransactionId, TransactionKind, DATE_FORMAT, SUGGESTED_CATEGORIES,
};
use crate::io::{CsvStyle, ExportFormat, Exporter};

pub use style::Style;

/// Fintrack - Personal income and expense tracker
#[derive(Parser)]
#[command(name = "fintrack")]
#[command(about = "Record income and expenses, summarize totals, and export them to CSV")]
#[command(version)]
pub struct Cli {
    /// Database file path
    #[arg(short, long, env = "FINTRACK_DB", default_value = "finance.db")]
    pub database: PathBuf,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// How amounts are displayed
    #[arg(long, value_enum, default_value_t = Style::Plain, global = true)]
    pub style: Style,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Record a transaction
    Add {
        /// Amount (e.g., "50.00" or "50"), must be positive
        amount: String,

        /// Transaction type: income or expense
        #[arg(short = 't', long = "type", default_value = "expense")]
        kind: String,

        /// Category (Food, Transport, Bills, Shopping, Salary, Investment, Entertainment, Other, or any label)
        #[arg(short, long, default_value = "Other")]
        category: String,

        /// Date of the transaction (YYYY-MM-DD, defaults to today)
        #[arg(long)]
        date: Option<String>,

        /// Optional note
        #[arg(short, long)]
        description: Option<String>,
    },

    /// Delete a transaction by id
    Delete {
        /// Transaction id as shown by `list`
        id: TransactionId,
    },

    /// List transactions, newest first
    List {
        /// Filter by type: income or expense
        #[arg(short = 't', long = "type")]
        kind: Option<String>,

        /// Filter by category
        #[arg(short, long)]
        category: Option<String>,

        /// Earliest date to include (YYYY-MM-DD)
        #[arg(long)]
        from: Option<String>,

        /// Latest date to include (YYYY-MM-DD)
        #[arg(long)]
        to: Option<String>,

        /// Maximum number of transactions to show
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Show total income, total expenses and balance
    Summary,

    /// Chart expenses by category
    Chart,

    /// Export all transactions, oldest first
    Export {
        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Format: csv, json
        #[arg(short, long, default_value = "csv")]
        format: String,

        /// Write CSV fields without quoting (legacy layout)
        #[arg(long)]
        verbatim: bool,
    },

    /// List the suggested categories
    Categories,

    /// Interactive session reading commands from stdin
    Shell,
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        match self.command {
            Commands::Shell => {
                let (store, startup_error) = LedgerStore::open_degraded(&self.database).await;
                if let Some(e) = startup_error {
                    eprintln!("Error: {}", e);
                    eprintln!("Continuing without storage; commands will fail until restart.");
                }
                let result = shell::run(&store, self.style).await;
                store.close().await;
                result
            }
            command => {
                let store = LedgerStore::open(&self.database).await?;
                let result = execute(&store, command, self.style).await;
                store.close().await;
                result
            }
        }
    }
}

/// Run one command against an open store.
pub async fn execute(store: &LedgerStore, command: Commands, style: Style) -> Result<()> {
    match command {
        Commands::Add {
            amount,
            kind,
            category,
            date,
            description,
        } => {
            let amount_cents = match parse_cents(&amount) {
                Ok(cents) => cents,
                Err(e @ ParseCentsError::TooPrecise(_)) => return Err(e.into()),
                Err(e) => return Err(AppError::InvalidAmount(e.to_string()).into()),
            };
            let kind = parse_kind(&kind)?;
            let date = match date {
                Some(date_str) => parse_date(&date_str)?,
                None => Local::now().date_naive(),
            };

            let mut tx = NewTransaction::new(date, kind, category, amount_cents);
            if let Some(desc) = description {
                tx = tx.with_description(desc);
            }

            let id = store.add(tx.clone()).await?;
            println!(
                "Recorded {} #{}: {} {} on {}",
                tx.kind.as_str().to_lowercase(),
                id,
                style.format_amount(tx.amount_cents),
                tx.category,
                tx.date.format(DATE_FORMAT)
            );
        }

        Commands::Delete { id } => {
            if store.delete(id).await? {
                println!("Deleted transaction #{}", id);
            } else {
                println!("No transaction #{}, nothing deleted", id);
            }
        }

        Commands::List {
            kind,
            category,
            from,
            to,
            limit,
        } => {
            let filter = TransactionFilter {
                kind: kind.as_deref().map(parse_kind).transpose()?,
                category,
                from_date: from.as_deref().map(parse_date).transpose()?,
                to_date: to.as_deref().map(parse_date).transpose()?,
                limit,
            };
            run_list_command(store, &filter, style).await?;
        }

        Commands::Summary => {
            let totals = store.summarize_totals().await?;
            println!("Income:   {:>20}", style.format_amount(totals.total_income));
            println!("Expenses: {:>20}", style.format_amount(totals.total_expense));
            println!("{}", "-".repeat(30));
            println!("Balance:  {:>20}", style.format_amount(totals.balance()));
        }

        Commands::Chart => run_chart_command(store, style).await?,

        Commands::Export {
            output,
            format,
            verbatim,
        } => run_export_command(store, output, &format, verbatim).await?,

        Commands::Categories => {
            for category in SUGGESTED_CATEGORIES {
                println!("{}", category);
            }
        }

        Commands::Shell => bail!("Already in a shell session"),
    }

    Ok(())
}

async fn run_list_command(
    store: &LedgerStore,
    filter: &TransactionFilter,
    style: Style,
) -> Result<()> {
    let transactions = store.list_filtered(filter).await?;

    if transactions.is_empty() {
        println!("No transactions found.");
        return Ok(());
    }

    println!(
        "{:>6} {:<12} {:<8} {:<14} {:>18} DESCRIPTION",
        "ID", "DATE", "TYPE", "CATEGORY", "AMOUNT"
    );
    println!("{}", "-".repeat(80));

    for tx in &transactions {
        println!(
            "{:>6} {:<12} {:<8} {:<14} {:>18} {}",
            tx.id,
            tx.date.format(DATE_FORMAT),
            tx.kind.as_str(),
            truncate(&tx.category, 14),
            style.format_amount(tx.amount_cents),
            truncate(tx.description.as_deref().unwrap_or(""), 30)
        );
    }
    Ok(())
}

const CHART_WIDTH: usize = 40;

async fn run_chart_command(store: &LedgerStore, style: Style) -> Result<()> {
    let report = store.expense_report().await?;

    if report.is_empty() {
        println!("No expenses recorded.");
        return Ok(());
    }

    println!("Expenses by category");
    println!();
    for category in &report.categories {
        let bar_len = ((category.percentage / 100.0) * CHART_WIDTH as f64).round() as usize;
        println!(
            "{:<14} {:>18} {:>6.1}% {}",
            truncate(&category.category, 14),
            style.format_amount(category.total),
            category.percentage,
            "#".repeat(bar_len.max(1))
        );
    }
    println!("{}", "-".repeat(80));
    println!("{:<14} {:>18}", "Total", style.format_amount(report.total));
    Ok(())
}

async fn run_export_command(
    store: &LedgerStore,
    output: Option<PathBuf>,
    format: &str,
    verbatim: bool,
) -> Result<()> {
    let format = ExportFormat::from_str(format)
        .with_context(|| format!("Unknown export format '{}'. Use csv or json", format))?;
    let exporter = Exporter::new(store);
    let style = if verbatim {
        CsvStyle::Verbatim
    } else {
        CsvStyle::Quoted
    };

    match output {
        Some(path) => {
            let count = exporter.export_to_file(&path, format, style).await?;
            println!(
                "Exported {} transactions to {} as {}",
                count,
                path.display(),
                format.as_str()
            );
        }
        None => {
            let writer = io::stdout().lock();
            match format {
                ExportFormat::Csv => {
                    exporter.export_csv(writer, style).await?;
                }
                ExportFormat::Json => {
                    exporter.export_json(writer).await?;
                }
            }
        }
    }
    Ok(())
}

fn parse_kind(s: &str) -> Result<TransactionKind> {
    TransactionKind::from_str(s)
        .with_context(|| format!("Invalid type '{}'. Use income or expense", s))
}

fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), DATE_FORMAT)
        .with_context(|| format!("Invalid date format '{}'. Use YYYY-MM-DD", s))
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
