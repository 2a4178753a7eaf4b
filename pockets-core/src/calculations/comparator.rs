//! Old vs. new regime comparison.

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::calculations::TaxCalculator;
use crate::models::{Deductions, Regime, TaxCalculationResult};

/// Which regime the savings figure favours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SavingsDirection {
    OldSaves,
    NewSaves,
    Equal,
}

impl fmt::Display for SavingsDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::OldSaves => "old regime saves",
            Self::NewSaves => "new regime saves",
            Self::Equal => "both regimes cost the same",
        })
    }
}

/// Both regime results for one income, plus the recommendation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegimeComparison {
    pub income: Decimal,
    pub old: TaxCalculationResult,
    pub new: TaxCalculationResult,
    pub better_regime: Regime,
    pub savings: Decimal,
    pub direction: SavingsDirection,
}

impl RegimeComparison {
    pub fn result_for(
        &self,
        regime: Regime,
    ) -> &TaxCalculationResult {
        match regime {
            Regime::Old => &self.old,
            Regime::New => &self.new,
        }
    }
}

/// Runs both regimes; deductions only reach the old one.
///
/// The old regime wins only when strictly cheaper, so ties go to new.
pub fn compare_regimes(
    calculator: &TaxCalculator<'_>,
    income: Decimal,
    deductions: &Deductions,
) -> RegimeComparison {
    let old = calculator.calculate(income, Regime::Old, deductions);
    let new = calculator.calculate(income, Regime::New, &Deductions::new());

    let better_regime = if old.tax < new.tax {
        Regime::Old
    } else {
        Regime::New
    };
    let direction = match old.tax.cmp(&new.tax) {
        std::cmp::Ordering::Less => SavingsDirection::OldSaves,
        std::cmp::Ordering::Greater => SavingsDirection::NewSaves,
        std::cmp::Ordering::Equal => SavingsDirection::Equal,
    };
    let savings = (old.tax - new.tax).abs();

    RegimeComparison {
        income,
        old,
        new,
        better_regime,
        savings,
        direction,
    }
}
