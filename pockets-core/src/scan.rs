//! Receipt scanning capability.
//!
//! The application depends only on [`ReceiptScanner`]; concrete scanners
//! (a mock with canned data, a plain-text parser) live in `pockets-app`.

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// What the scanner is given.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanInput {
    /// Raw bytes of an image or PDF.
    Image(Vec<u8>),
    /// Receipt text, e.g. from a copy/paste or an e-mail.
    Text(String),
}

/// Fields recovered from a receipt. `date` is absent when none was found.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanResult {
    pub title: String,
    pub amount: Decimal,
    pub category: String,
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ScanError {
    #[error("scanner does not accept {0} input")]
    UnsupportedInput(&'static str),

    #[error("receipt is empty")]
    Empty,

    #[error("no total amount found on receipt")]
    NoTotal,

    #[error("invalid amount '{0}' on receipt")]
    InvalidAmount(String),
}

impl ScanInput {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Image(_) => "image",
            Self::Text(_) => "text",
        }
    }
}

#[async_trait]
pub trait ReceiptScanner: Send + Sync {
    async fn scan(
        &self,
        input: ScanInput,
    ) -> Result<ScanResult, ScanError>;
}
