//! Transaction exports.
//!
//! CSV uses the columns `Date,Title,Category,Amount,Type`. Quoting follows
//! RFC 4180: a field containing a comma, quote or line break is wrapped in
//! quotes and embedded quotes are doubled. JSON bundles the transactions with
//! the derived reports and the latest saved tax calculation.

use std::io::Write;

use chrono::{DateTime, NaiveDate, Utc};
use pockets_core::reports::{CategoryTotal, Summary, expense_by_category, summarize};
use pockets_core::{SavedTaxCalculation, Transaction};
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

pub const CSV_HEADER: [&str; 5] = ["Date", "Title", "Category", "Amount", "Type"];

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("CSV write error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON serialisation error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Write `transactions` as CSV in the order given.
pub fn write_transactions_csv<W: Write>(
    writer: W,
    transactions: &[Transaction],
) -> Result<(), ExportError> {
    let mut csv_writer = csv::WriterBuilder::new()
        .quote_style(csv::QuoteStyle::Necessary)
        .from_writer(writer);

    csv_writer.write_record(CSV_HEADER)?;
    for tx in transactions {
        csv_writer.write_record([
            tx.date.format("%Y-%m-%d").to_string(),
            tx.title.clone(),
            tx.category.clone(),
            tx.amount.to_string(),
            tx.kind.as_str().to_string(),
        ])?;
    }
    csv_writer.flush()?;

    debug!(rows = transactions.len(), "wrote transactions csv");
    Ok(())
}

pub fn transactions_to_csv(transactions: &[Transaction]) -> Result<String, ExportError> {
    let mut buffer = Vec::new();
    write_transactions_csv(&mut buffer, transactions)?;
    // the csv writer only emits what it was given, which is valid UTF-8
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}

/// Everything a JSON export carries.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportBundle {
    pub summary: Summary,
    pub transactions: Vec<Transaction>,
    pub expense_by_category: Vec<CategoryTotal>,
    pub tax_data: Option<SavedTaxCalculation>,
    pub exported_at: DateTime<Utc>,
}

impl ExportBundle {
    pub fn new(
        transactions: Vec<Transaction>,
        tax_data: Option<SavedTaxCalculation>,
        exported_at: DateTime<Utc>,
    ) -> Self {
        Self {
            summary: summarize(&transactions),
            expense_by_category: expense_by_category(&transactions),
            transactions,
            tax_data,
            exported_at,
        }
    }

    pub fn to_json(&self) -> Result<String, ExportError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn write_json<W: Write>(
        &self,
        writer: W,
    ) -> Result<(), ExportError> {
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }
}

/// `pockets-export-YYYY-MM-DD.<extension>`
pub fn export_file_name(
    extension: &str,
    date: NaiveDate,
) -> String {
    format!("pockets-export-{}.{extension}", date.format("%Y-%m-%d"))
}
