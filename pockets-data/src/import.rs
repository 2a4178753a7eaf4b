//! CSV import of transactions.
//!
//! Reads the export layout back into drafts owned by one user. Headers are
//! matched by name, so column order does not matter.
//!
//! | Column     | Required | Notes                         |
//! |------------|----------|-------------------------------|
//! | `Date`     | yes      | `YYYY-MM-DD`                  |
//! | `Title`    | yes      | must not be blank             |
//! | `Category` | yes      | blank becomes `Other`         |
//! | `Amount`   | yes      | positive decimal              |
//! | `Type`     | yes      | `income` or `expense`         |

use std::path::Path;
use std::str::FromStr;

use chrono::NaiveDate;
use pockets_core::{NewTransaction, TransactionType, UserId};
use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Deserialize)]
struct CsvRow {
    #[serde(rename = "Date")]
    date: String,
    #[serde(rename = "Title")]
    title: String,
    #[serde(rename = "Category")]
    category: String,
    /// Kept as text so the decimal is parsed exactly, scale included.
    #[serde(rename = "Amount")]
    amount: String,
    #[serde(rename = "Type")]
    kind: String,
}

/// Row numbers are 1-based and count data rows only.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("CSV parse error: {0}")]
    Parse(#[from] csv::Error),

    #[error("invalid date '{value}' on row {row}, expected YYYY-MM-DD")]
    InvalidDate { value: String, row: usize },

    #[error("unrecognised type '{value}' on row {row}, expected income or expense")]
    InvalidType { value: String, row: usize },

    #[error("invalid amount '{value}' on row {row}")]
    InvalidAmount { value: String, row: usize },

    #[error("amount must be greater than zero on row {row}")]
    NonPositiveAmount { row: usize },

    #[error("missing title on row {row}")]
    MissingTitle { row: usize },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

fn convert_row(
    row: CsvRow,
    row_number: usize,
    user_id: UserId,
) -> Result<NewTransaction, ImportError> {
    let date = NaiveDate::parse_from_str(&row.date, "%Y-%m-%d").map_err(|_| {
        ImportError::InvalidDate {
            value: row.date.clone(),
            row: row_number,
        }
    })?;
    let kind = TransactionType::parse(&row.kind).ok_or_else(|| ImportError::InvalidType {
        value: row.kind.clone(),
        row: row_number,
    })?;
    let amount = Decimal::from_str(&row.amount).map_err(|_| ImportError::InvalidAmount {
        value: row.amount.clone(),
        row: row_number,
    })?;
    if amount <= Decimal::ZERO {
        return Err(ImportError::NonPositiveAmount { row: row_number });
    }
    if row.title.is_empty() {
        return Err(ImportError::MissingTitle { row: row_number });
    }
    let category = if row.category.is_empty() {
        "Other".to_string()
    } else {
        row.category
    };

    Ok(NewTransaction {
        user_id,
        kind,
        title: row.title,
        amount,
        category,
        date,
        payment_method: None,
    })
}

/// Parse CSV text into drafts for `user_id`, in file order.
pub fn load_from_str(
    input: &str,
    user_id: UserId,
) -> Result<Vec<NewTransaction>, ImportError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .flexible(false)
        .from_reader(input.as_bytes());

    reader
        .deserialize::<CsvRow>()
        .enumerate()
        .map(|(idx, result)| convert_row(result?, idx + 1, user_id))
        .collect()
}

pub fn load_from_file(
    path: &Path,
    user_id: UserId,
) -> Result<Vec<NewTransaction>, ImportError> {
    let contents = std::fs::read_to_string(path)?;
    load_from_str(&contents, user_id)
}
