//! Receipt scanners.
//!
//! [`MockReceiptScanner`] waits and returns canned data, standing in for an
//! OCR service. [`TextReceiptScanner`] reads receipts that are already text.

use std::sync::LazyLock;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{Local, NaiveDate};
use pockets_core::scan::{ReceiptScanner, ScanError, ScanInput, ScanResult};
use regex::Regex;
use rust_decimal::Decimal;
use tracing::debug;

use crate::utils::parse_decimal;

pub const OTHER_CATEGORY: &str = "Other";

/// Returns the same result for every input after `delay`.
///
/// Dropping the returned future cancels the scan.
#[derive(Debug, Clone)]
pub struct MockReceiptScanner {
    delay: Duration,
    result: ScanResult,
}

impl MockReceiptScanner {
    pub fn new(
        delay: Duration,
        result: ScanResult,
    ) -> Self {
        Self { delay, result }
    }

    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay,
            ..Self::default()
        }
    }
}

impl Default for MockReceiptScanner {
    fn default() -> Self {
        Self {
            delay: Duration::from_millis(1500),
            result: ScanResult {
                title: "Grocery Store".to_string(),
                amount: Decimal::new(124_750, 2),
                category: "Food".to_string(),
                date: Some(Local::now().date_naive()),
            },
        }
    }
}

#[async_trait]
impl ReceiptScanner for MockReceiptScanner {
    async fn scan(
        &self,
        input: ScanInput,
    ) -> Result<ScanResult, ScanError> {
        debug!(input = input.kind(), delay_ms = self.delay.as_millis() as u64, "mock scan");
        tokio::time::sleep(self.delay).await;
        Ok(self.result.clone())
    }
}

static TOTAL_LINE: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"(?im)^\s*(?:grand\s+)?total\b[^0-9\n]*([0-9][0-9,]*(?:\.[0-9]{1,2})?)").ok()
});
static ISO_DATE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"\b(\d{4})-(\d{2})-(\d{2})\b").ok());
static DMY_DATE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"\b(\d{2})/(\d{2})/(\d{4})\b").ok());

/// Merchant keywords per category, checked in order.
const CATEGORY_KEYWORDS: &[(&str, &[&str])] = &[
    (
        "Food",
        &[
            "restaurant", "cafe", "coffee", "pizza", "burger", "bakery", "grocery",
            "supermarket", "mart", "kitchen", "food",
        ],
    ),
    (
        "Transport",
        &["uber", "ola", "taxi", "cab", "fuel", "petrol", "metro", "railway"],
    ),
    (
        "Health",
        &["pharmacy", "chemist", "hospital", "clinic", "medical"],
    ),
    (
        "Utilities",
        &["electricity", "water", "gas", "broadband", "internet", "recharge"],
    ),
    (
        "Entertainment",
        &["cinema", "movie", "theatre", "pvr", "concert"],
    ),
    ("Shopping", &["mall", "fashion", "store", "shop", "electronics"]),
];

/// Plain-text receipt parser.
///
/// * title: first non-empty line
/// * amount: the last `TOTAL` / `GRAND TOTAL` line
/// * date: first `YYYY-MM-DD` or `DD/MM/YYYY`, if any
/// * category: from keywords in the title, else `Other`
#[derive(Debug, Clone, Copy, Default)]
pub struct TextReceiptScanner;

impl TextReceiptScanner {
    pub fn parse(text: &str) -> Result<ScanResult, ScanError> {
        let title = text
            .lines()
            .map(str::trim)
            .find(|line| !line.is_empty())
            .ok_or(ScanError::Empty)?
            .to_string();

        let raw_total = TOTAL_LINE
            .as_ref()
            .and_then(|re| re.captures_iter(text).last())
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str())
            .ok_or(ScanError::NoTotal)?;
        let amount =
            parse_decimal(raw_total).map_err(|_| ScanError::InvalidAmount(raw_total.to_string()))?;
        if amount <= Decimal::ZERO {
            return Err(ScanError::InvalidAmount(raw_total.to_string()));
        }

        Ok(ScanResult {
            category: categorize(&title).to_string(),
            title,
            amount,
            date: find_date(text),
        })
    }
}

#[async_trait]
impl ReceiptScanner for TextReceiptScanner {
    async fn scan(
        &self,
        input: ScanInput,
    ) -> Result<ScanResult, ScanError> {
        match input {
            ScanInput::Text(text) => {
                let result = Self::parse(&text)?;
                debug!(title = %result.title, amount = %result.amount, "parsed receipt");
                Ok(result)
            }
            other => Err(ScanError::UnsupportedInput(other.kind())),
        }
    }
}

fn categorize(title: &str) -> &'static str {
    let lower = title.to_lowercase();
    CATEGORY_KEYWORDS
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| lower.contains(k)))
        .map_or(OTHER_CATEGORY, |(category, _)| category)
}

fn find_date(text: &str) -> Option<NaiveDate> {
    let ymd = |y: &str, m: &str, d: &str| {
        NaiveDate::from_ymd_opt(y.parse().ok()?, m.parse().ok()?, d.parse().ok()?)
    };

    let iso = ISO_DATE.as_ref().and_then(|re| {
        re.captures_iter(text)
            .find_map(|c| ymd(&c[1], &c[2], &c[3]))
    });
    iso.or_else(|| {
        DMY_DATE.as_ref().and_then(|re| {
            re.captures_iter(text)
                .find_map(|c| ymd(&c[3], &c[2], &c[1]))
        })
    })
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    const RECEIPT: &str = "
        Fresh Mart Supermarket
        12 MG Road, Bengaluru
        Date: 14/02/2025

        Milk 2 x 30.00        60.00
        Bread                 45.00
        SUBTOTAL             105.00
        GST                    5.25
        TOTAL            Rs 1,110.25
    ";

    #[test]
    fn parses_full_receipt() {
        let result = TextReceiptScanner::parse(RECEIPT).expect("receipt parses");

        assert_eq!(
            result,
            ScanResult {
                title: "Fresh Mart Supermarket".to_string(),
                amount: dec!(1110.25),
                category: "Food".to_string(),
                date: NaiveDate::from_ymd_opt(2025, 2, 14),
            }
        );
    }

    #[test]
    fn grand_total_wins_over_earlier_total() {
        let text = "City Pharmacy\nTotal: 90.00\nDiscount 10.00\nGrand Total: 80.00\n";

        let result = TextReceiptScanner::parse(text).unwrap();

        assert_eq!(result.amount, dec!(80.00));
        assert_eq!(result.category, "Health");
    }

    #[test]
    fn iso_date_and_unknown_category() {
        let text = "ACME Widgets\n2025-01-31\nTOTAL 99\n";

        let result = TextReceiptScanner::parse(text).unwrap();

        assert_eq!(result.date, NaiveDate::from_ymd_opt(2025, 1, 31));
        assert_eq!(result.category, OTHER_CATEGORY);
    }

    #[test]
    fn invalid_calendar_date_is_ignored() {
        let text = "Metro Card Recharge\n31/02/2025\nTOTAL 200\n";

        let result = TextReceiptScanner::parse(text).unwrap();

        assert_eq!(result.date, None);
        assert_eq!(result.category, "Transport");
    }

    #[test]
    fn missing_total_is_an_error() {
        let text = "Corner Cafe\nCoffee 120.00\n";

        assert_eq!(TextReceiptScanner::parse(text), Err(ScanError::NoTotal));
    }

    #[test]
    fn blank_receipt_is_empty() {
        assert_eq!(TextReceiptScanner::parse(" \n\n "), Err(ScanError::Empty));
    }

    #[test]
    fn zero_total_is_invalid() {
        let text = "Free Sample\nTOTAL 0.00\n";

        assert_eq!(
            TextReceiptScanner::parse(text),
            Err(ScanError::InvalidAmount("0.00".to_string()))
        );
    }

    #[tokio::test]
    async fn text_scanner_rejects_images() {
        let result = TextReceiptScanner.scan(ScanInput::Image(vec![0xFF, 0xD8])).await;

        assert_eq!(result, Err(ScanError::UnsupportedInput("image")));
    }

    #[tokio::test(start_paused = true)]
    async fn mock_scanner_waits_then_returns_canned_result() {
        let scanner = MockReceiptScanner::with_delay(Duration::from_secs(2));
        let started = tokio::time::Instant::now();

        let result = scanner
            .scan(ScanInput::Image(Vec::new()))
            .await
            .expect("mock never fails");

        assert!(started.elapsed() >= Duration::from_secs(2));
        assert_eq!(result.title, "Grocery Store");
        assert_eq!(result.amount, dec!(1247.50));
    }

    #[tokio::test(start_paused = true)]
    async fn mock_scan_can_be_cancelled() {
        let scanner = MockReceiptScanner::with_delay(Duration::from_secs(60));

        let outcome = tokio::time::timeout(
            Duration::from_secs(1),
            scanner.scan(ScanInput::Text(String::new())),
        )
        .await;

        assert!(outcome.is_err(), "scan should still be pending");
    }
}
