//! Raw form input and its validation.
//!
//! Forms keep every field as the string the user typed. `validate` parses
//! them once, collecting one message per bad field, and either returns the
//! typed value or [`AppError::Validation`] with all messages.

use std::str::FromStr;

use chrono::{Local, NaiveDate};
use pockets_core::scan::ScanResult;
use pockets_core::{Deductions, NewTransaction, Regime, TransactionType, UserId};
use rust_decimal::Decimal;

use crate::error::AppError;
use crate::utils::parse_decimal;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Form state for a new transaction.
#[derive(Debug, Clone, Default)]
pub struct TransactionForm {
    pub title: String,
    pub amount: String,
    pub category: String,
    pub date: String,
    pub kind: String,
    pub payment_method: String,

    pub errors: Vec<String>,
}

impl TransactionForm {
    /// Empty expense dated today.
    pub fn new() -> Self {
        Self {
            date: Local::now().date_naive().format(DATE_FORMAT).to_string(),
            kind: TransactionType::Expense.as_str().to_string(),
            ..Default::default()
        }
    }

    /// Expense pre-filled from a scanned receipt. A receipt without a date
    /// keeps today's date.
    pub fn from_scan(scan: &ScanResult) -> Self {
        let mut form = Self::new();
        form.title = scan.title.clone();
        form.amount = scan.amount.to_string();
        form.category = scan.category.clone();
        if let Some(date) = scan.date {
            form.date = date.format(DATE_FORMAT).to_string();
        }
        form
    }

    pub fn validate(
        &mut self,
        user_id: UserId,
    ) -> Result<NewTransaction, AppError> {
        self.errors.clear();

        let title = self.required_text("Title", &self.title.clone());
        let amount = self.parse_amount("Amount", &self.amount.clone());
        let category = self.required_text("Category", &self.category.clone());
        let date = self.parse_date("Date", &self.date.clone());
        let kind = self.parse_kind(&self.kind.clone());
        let payment_method = Some(self.payment_method.trim())
            .filter(|s| !s.is_empty())
            .map(str::to_string);

        match (title, amount, category, date, kind) {
            (Some(title), Some(amount), Some(category), Some(date), Some(kind))
                if self.errors.is_empty() =>
            {
                Ok(NewTransaction {
                    user_id,
                    kind,
                    title,
                    amount,
                    category,
                    date,
                    payment_method,
                })
            }
            _ => Err(AppError::Validation(self.errors.clone())),
        }
    }

    fn required_text(
        &mut self,
        field: &str,
        value: &str,
    ) -> Option<String> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            self.errors.push(format!("{field} is required"));
            return None;
        }
        Some(trimmed.to_string())
    }

    fn parse_amount(
        &mut self,
        field: &str,
        value: &str,
    ) -> Option<Decimal> {
        if value.trim().is_empty() {
            self.errors.push(format!("{field} is required"));
            return None;
        }
        match parse_decimal(value) {
            Ok(v) if v > Decimal::ZERO => Some(v),
            Ok(_) => {
                self.errors.push(format!("{field} must be greater than zero"));
                None
            }
            Err(_) => {
                self.errors.push(format!("{field} must be a valid number"));
                None
            }
        }
    }

    fn parse_date(
        &mut self,
        field: &str,
        value: &str,
    ) -> Option<NaiveDate> {
        if value.trim().is_empty() {
            self.errors.push(format!("{field} is required"));
            return None;
        }
        match NaiveDate::parse_from_str(value.trim(), DATE_FORMAT) {
            Ok(date) => Some(date),
            Err(_) => {
                self.errors
                    .push(format!("{field} must be a date like 2025-03-31"));
                None
            }
        }
    }

    fn parse_kind(
        &mut self,
        value: &str,
    ) -> Option<TransactionType> {
        let kind = TransactionType::parse(value);
        if kind.is_none() {
            self.errors
                .push("Type must be income or expense".to_string());
        }
        kind
    }
}

/// Form state for the tax estimator.
///
/// `deductions` holds `(id, amount)` pairs as typed; blank amounts are
/// skipped. Deductions are accepted whatever the regime but only the old
/// regime uses them.
#[derive(Debug, Clone)]
pub struct TaxForm {
    pub income: String,
    pub regime: String,
    pub deductions: Vec<(String, String)>,

    pub errors: Vec<String>,
}

/// Validated tax form input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaxInput {
    pub income: Decimal,
    pub regime: Regime,
    pub deductions: Deductions,
}

impl Default for TaxForm {
    fn default() -> Self {
        Self {
            income: String::new(),
            regime: Regime::New.as_str().to_string(),
            deductions: Vec::new(),
            errors: Vec::new(),
        }
    }
}

impl TaxForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn validate(&mut self) -> Result<TaxInput, AppError> {
        self.errors.clear();

        let income = self.parse_income();
        let regime = self.parse_required::<RegimeArg>("Regime", &self.regime.clone());

        let mut deductions = Deductions::new();
        for (id, amount) in self.deductions.clone() {
            if id.is_empty() {
                self.errors.push("Deduction id is required".to_string());
                continue;
            }
            if amount.trim().is_empty() {
                continue;
            }
            match parse_decimal(&amount) {
                Ok(v) if v >= Decimal::ZERO => {
                    *deductions.entry(id.to_ascii_lowercase()).or_default() += v;
                }
                Ok(_) => self
                    .errors
                    .push(format!("Deduction {id} must not be negative")),
                Err(_) => self
                    .errors
                    .push(format!("Deduction {id} must be a valid number")),
            }
        }

        match (income, regime) {
            (Some(income), Some(RegimeArg(regime))) if self.errors.is_empty() => Ok(TaxInput {
                income,
                regime,
                deductions,
            }),
            _ => Err(AppError::Validation(self.errors.clone())),
        }
    }

    fn parse_income(&mut self) -> Option<Decimal> {
        if self.income.trim().is_empty() {
            self.errors.push("Income is required".to_string());
            return None;
        }
        match parse_decimal(&self.income) {
            Ok(v) if v >= Decimal::ZERO => Some(v),
            Ok(_) => {
                self.errors.push("Income must not be negative".to_string());
                None
            }
            Err(_) => {
                self.errors.push("Income must be a valid number".to_string());
                None
            }
        }
    }

    fn parse_required<T: FromStr>(
        &mut self,
        field: &str,
        value: &str,
    ) -> Option<T> {
        if value.trim().is_empty() {
            self.errors.push(format!("{field} is required"));
            return None;
        }
        match value.trim().parse() {
            Ok(v) => Some(v),
            Err(_) => {
                self.errors.push(format!("{field} is invalid"));
                None
            }
        }
    }
}

/// Split `id=amount` as typed on the command line.
pub fn parse_deduction_arg(arg: &str) -> Result<(String, String), String> {
    match arg.split_once('=') {
        Some((id, amount)) if !id.trim().is_empty() => {
            Ok((id.trim().to_string(), amount.trim().to_string()))
        }
        _ => Err(format!("deduction '{arg}' must look like id=amount")),
    }
}

struct RegimeArg(Regime);

impl FromStr for RegimeArg {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Regime::parse(s).map(RegimeArg).ok_or(())
    }
}
