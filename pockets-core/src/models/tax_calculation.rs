use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{Regime, UserId};

/// Output of one calculator run. Never stored on its own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaxCalculationResult {
    pub taxable_income: Decimal,
    pub tax: Decimal,
    /// Percentage of gross income, two decimal places.
    pub effective_rate: Decimal,
    pub in_hand: Decimal,
}

/// The latest calculation a user saved. One row per user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedTaxCalculation {
    pub user_id: UserId,
    pub regime: Regime,
    pub income: Decimal,
    pub taxable_income: Decimal,
    pub tax: Decimal,
    pub effective_rate: Decimal,
    pub in_hand: Decimal,
    pub created_at: DateTime<Utc>,
}

impl SavedTaxCalculation {
    pub fn result(&self) -> TaxCalculationResult {
        TaxCalculationResult {
            taxable_income: self.taxable_income,
            tax: self.tax,
            effective_rate: self.effective_rate,
            in_hand: self.in_hand,
        }
    }
}
