//! Progressive (marginal) tax over a slab table.
//!
//! # Steps
//!
//! | Step | Description |
//! |------|-------------|
//! | 1    | Taxable income: `max(0, income - Σ deductions)` (old), gross income (new) |
//! | 2    | Slab tax: each slab taxes only the portion of income inside `[min, max)` |
//! | 3    | Cess: `tax = slab tax × (1 + cess rate)` |
//! | 4    | Effective rate: `tax / income × 100`, zero when income is not positive |
//! | 5    | In-hand: `income - tax` |
//!
//! # Example
//!
//! ```
//! use rust_decimal_macros::dec;
//! use pockets_core::calculations::TaxCalculator;
//! use pockets_core::{Deductions, Regime, TaxRegimeTable};
//!
//! let table = TaxRegimeTable::builtin();
//! let calculator = TaxCalculator::new(&table);
//!
//! let result = calculator.calculate(dec!(1200000), Regime::New, &Deductions::new());
//!
//! assert_eq!(result.taxable_income, dec!(1200000));
//! assert_eq!(result.tax, dec!(93600));
//! assert_eq!(result.effective_rate, dec!(7.8));
//! assert_eq!(result.in_hand, dec!(1106400));
//! ```

use rust_decimal::Decimal;
use tracing::debug;

use crate::calculations::common::percent_of;
use crate::models::{Deductions, Regime, TaxCalculationResult, TaxRegimeTable, total_deductions};

/// Calculator bound to one slab table.
#[derive(Debug, Clone, Copy)]
pub struct TaxCalculator<'a> {
    table: &'a TaxRegimeTable,
}

impl<'a> TaxCalculator<'a> {
    pub fn new(table: &'a TaxRegimeTable) -> Self {
        Self { table }
    }

    /// Runs every step for one regime.
    ///
    /// Deductions are ignored under [`Regime::New`]. Income at or below zero
    /// yields zero tax and a zero effective rate.
    pub fn calculate(
        &self,
        income: Decimal,
        regime: Regime,
        deductions: &Deductions,
    ) -> TaxCalculationResult {
        let taxable_income = self.taxable_income(income, regime, deductions);
        let slab_tax = self.slab_tax(taxable_income, regime);
        let tax = self.apply_cess(slab_tax);
        let effective_rate = percent_of(tax, income);
        let in_hand = income - tax;

        debug!(
            %regime,
            %income,
            %taxable_income,
            %slab_tax,
            %tax,
            "calculated tax"
        );

        TaxCalculationResult {
            taxable_income,
            tax,
            effective_rate,
            in_hand,
        }
    }

    /// Income left after regime-eligible deductions, never negative.
    pub fn taxable_income(
        &self,
        income: Decimal,
        regime: Regime,
        deductions: &Deductions,
    ) -> Decimal {
        let income = income.max(Decimal::ZERO);
        if regime.allows_deductions() {
            (income - total_deductions(deductions)).max(Decimal::ZERO)
        } else {
            income
        }
    }

    /// Tax before cess: each slab taxes the portion of income inside it.
    pub fn slab_tax(
        &self,
        taxable_income: Decimal,
        regime: Regime,
    ) -> Decimal {
        if taxable_income <= Decimal::ZERO {
            return Decimal::ZERO;
        }

        self.table
            .slabs(regime)
            .iter()
            .map(|slab| slab.portion_of(taxable_income) * slab.rate)
            .sum()
    }

    pub fn apply_cess(
        &self,
        slab_tax: Decimal,
    ) -> Decimal {
        slab_tax * (Decimal::ONE + self.table.cess_rate())
    }
}
