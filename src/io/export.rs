use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::application::{ExportRecord, LedgerStore};
use crate::domain::{cents_to_real, format_cents, DATE_FORMAT};

pub const CSV_HEADER: [&str; 5] = ["Date", "Type", "Category", "Amount", "Description"];

/// How CSV fields are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CsvStyle {
    /// Fields containing a comma, quote or line break are quoted.
    #[default]
    Quoted,
    /// Fields joined with bare commas, no escaping, amounts in their raw stored
    /// form (`50`, `12.5`). Same bytes as the desktop app's export, but a comma
    /// in a field shifts the columns.
    Verbatim,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Json,
}

impl ExportFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "csv" => Some(ExportFormat::Csv),
            "json" => Some(ExportFormat::Json),
            _ => None,
        }
    }
}

/// Full ledger dump for JSON export
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    pub version: String,
    pub exported_at: DateTime<Utc>,
    pub transactions: Vec<ExportRecord>,
}

/// Exporter for writing the ledger to flat files
pub struct Exporter<'a> {
    store: &'a LedgerStore,
}

impl<'a> Exporter<'a> {
    pub fn new(store: &'a LedgerStore) -> Self {
        Self { store }
    }

    /// Export all transactions as CSV, oldest first. Returns the number of rows written.
    pub async fn export_csv<W: Write>(&self, writer: W, style: CsvStyle) -> Result<usize> {
        let records = self.store.export_all().await?;
        write_csv(&records, writer, style)
    }

    /// Export all transactions as a pretty-printed JSON snapshot.
    pub async fn export_json<W: Write>(&self, writer: W) -> Result<LedgerSnapshot> {
        let snapshot = snapshot(self.store.export_all().await?);
        write_json(&snapshot, writer)?;
        Ok(snapshot)
    }

    /// Export all transactions to `path`. Returns the number of records written.
    ///
    /// Records are read before the file is created, so a failed read leaves an
    /// existing file at `path` untouched.
    pub async fn export_to_file(
        &self,
        path: &Path,
        format: ExportFormat,
        style: CsvStyle,
    ) -> Result<usize> {
        let records = self.store.export_all().await?;

        let file = File::create(path)
            .with_context(|| format!("Failed to create {}", path.display()))?;
        let writer = BufWriter::new(file);

        match format {
            ExportFormat::Csv => write_csv(&records, writer, style),
            ExportFormat::Json => {
                let count = records.len();
                write_json(&snapshot(records), writer)?;
                Ok(count)
            }
        }
    }
}

fn snapshot(transactions: Vec<ExportRecord>) -> LedgerSnapshot {
    LedgerSnapshot {
        version: env!("CARGO_PKG_VERSION").to_string(),
        exported_at: Utc::now(),
        transactions,
    }
}

/// Write `snapshot` as pretty-printed JSON followed by a newline.
pub fn write_json<W: Write>(snapshot: &LedgerSnapshot, mut writer: W) -> Result<()> {
    let json = serde_json::to_string_pretty(snapshot)?;
    writer.write_all(json.as_bytes())?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}

fn record_fields(record: &ExportRecord, style: CsvStyle) -> [String; 5] {
    let amount = match style {
        CsvStyle::Quoted => format_cents(record.amount_cents),
        CsvStyle::Verbatim => cents_to_real(record.amount_cents).to_string(),
    };
    [
        record.date.format(DATE_FORMAT).to_string(),
        record.kind.as_str().to_string(),
        record.category.clone(),
        amount,
        record.description.clone().unwrap_or_default(),
    ]
}

/// Write `records` as CSV with the `Date,Type,Category,Amount,Description` header.
pub fn write_csv<W: Write>(records: &[ExportRecord], mut writer: W, style: CsvStyle) -> Result<usize> {
    match style {
        CsvStyle::Quoted => {
            let mut csv_writer = csv::WriterBuilder::new()
                .terminator(csv::Terminator::Any(b'\n'))
                .from_writer(writer);
            csv_writer.write_record(CSV_HEADER)?;
            for record in records {
                csv_writer.write_record(record_fields(record, style))?;
            }
            csv_writer.flush()?;
        }
        CsvStyle::Verbatim => {
            writeln!(writer, "{}", CSV_HEADER.join(","))?;
            for record in records {
                writeln!(writer, "{}", record_fields(record, style).join(","))?;
            }
            writer.flush()?;
        }
    }

    Ok(records.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::TransactionKind;
    use chrono::NaiveDate;

    fn record(date: &str, kind: TransactionKind, category: &str, cents: i64, desc: Option<&str>) -> ExportRecord {
        ExportRecord {
            date: NaiveDate::parse_from_str(date, DATE_FORMAT).unwrap(),
            kind,
            category: category.to_string(),
            amount_cents: cents,
            description: desc.map(String::from),
        }
    }

    fn render(records: &[ExportRecord], style: CsvStyle) -> String {
        let mut out = Vec::new();
        let count = write_csv(records, &mut out, style).unwrap();
        assert_eq!(count, records.len());
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_header_only_when_empty() {
        assert_eq!(render(&[], CsvStyle::Quoted), "Date,Type,Category,Amount,Description\n");
        assert_eq!(render(&[], CsvStyle::Verbatim), "Date,Type,Category,Amount,Description\n");
    }

    #[test]
    fn test_quoted_amounts_have_two_decimals() {
        let records = vec![
            record("2024-01-05", TransactionKind::Income, "Salary", 500000, Some("January pay")),
            record("2024-01-06", TransactionKind::Expense, "Food", 1250, None),
        ];
        let expected = "Date,Type,Category,Amount,Description\n\
                        2024-01-05,Income,Salary,5000.00,January pay\n\
                        2024-01-06,Expense,Food,12.50,\n";
        assert_eq!(render(&records, CsvStyle::Quoted), expected);
    }

    #[test]
    fn test_verbatim_amounts_match_stored_real() {
        let records = vec![
            record("2024-01-05", TransactionKind::Income, "Salary", 500000, Some("January pay")),
            record("2024-01-06", TransactionKind::Expense, "Food", 1250, None),
            record("2024-01-07", TransactionKind::Expense, "Food", 1234, None),
            record("2024-01-08", TransactionKind::Expense, "Other", 5, None),
        ];
        let expected = "Date,Type,Category,Amount,Description\n\
                        2024-01-05,Income,Salary,5000,January pay\n\
                        2024-01-06,Expense,Food,12.5,\n\
                        2024-01-07,Expense,Food,12.34,\n\
                        2024-01-08,Expense,Other,0.05,\n";
        assert_eq!(render(&records, CsvStyle::Verbatim), expected);
    }

    #[test]
    fn test_export_format_from_str() {
        assert_eq!(ExportFormat::from_str("csv"), Some(ExportFormat::Csv));
        assert_eq!(ExportFormat::from_str(" JSON "), Some(ExportFormat::Json));
        assert_eq!(ExportFormat::from_str("xml"), None);
    }

    #[test]
    fn test_quoted_escapes_commas_and_quotes() {
        let records = vec![record(
            "2024-02-01",
            TransactionKind::Expense,
            "Food",
            300,
            Some("coffee, \"large\""),
        )];
        let out = render(&records, CsvStyle::Quoted);
        assert!(out.ends_with("2024-02-01,Expense,Food,3.00,\"coffee, \"\"large\"\"\"\n"));

        let mut reader = csv::Reader::from_reader(out.as_bytes());
        let row = reader.records().next().unwrap().unwrap();
        assert_eq!(row.len(), 5);
        assert_eq!(&row[4], "coffee, \"large\"");
    }

    #[test]
    fn test_verbatim_does_not_escape() {
        let records = vec![record("2024-02-01", TransactionKind::Expense, "Food", 300, Some("coffee, cake"))];
        let out = render(&records, CsvStyle::Verbatim);
        assert!(out.ends_with("2024-02-01,Expense,Food,3,coffee, cake\n"));
    }
}
