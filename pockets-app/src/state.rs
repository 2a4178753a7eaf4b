//! Tax form state.
//!
//! Holds what the user has typed so far and the comparison derived from it.
//! Every setter recomputes both regimes so the comparison is never stale.

use pockets_core::calculations::{RegimeComparison, TaxCalculator, compare_regimes};
use pockets_core::{Deduction, Deductions, Regime, TaxCalculationResult, TaxRegimeTable};
use rust_decimal::Decimal;

#[derive(Debug, Clone)]
pub struct TaxFormState {
    table: TaxRegimeTable,
    income: Decimal,
    deductions: Deductions,
    selected_regime: Regime,
    comparison: RegimeComparison,
}

impl TaxFormState {
    pub fn new(table: TaxRegimeTable) -> Self {
        let deductions = Deductions::new();
        let comparison = compare_regimes(&TaxCalculator::new(&table), Decimal::ZERO, &deductions);
        Self {
            table,
            income: Decimal::ZERO,
            deductions,
            selected_regime: Regime::New,
            comparison,
        }
    }

    pub fn income(&self) -> Decimal {
        self.income
    }

    pub fn deductions(&self) -> &Deductions {
        &self.deductions
    }

    pub fn selected_regime(&self) -> Regime {
        self.selected_regime
    }

    pub fn comparison(&self) -> &RegimeComparison {
        &self.comparison
    }

    /// Result for the regime the user picked.
    pub fn selected_result(&self) -> &TaxCalculationResult {
        self.comparison.result_for(self.selected_regime)
    }

    pub fn set_income(
        &mut self,
        income: Decimal,
    ) {
        self.income = income;
        self.recompute();
    }

    /// A zero amount removes the deduction.
    pub fn set_deduction(
        &mut self,
        id: &str,
        amount: Decimal,
    ) {
        if amount.is_zero() {
            self.deductions.remove(id);
        } else {
            self.deductions.insert(id.to_string(), amount);
        }
        self.recompute();
    }

    pub fn set_deductions(
        &mut self,
        deductions: Deductions,
    ) {
        self.deductions = deductions;
        self.recompute();
    }

    pub fn select_regime(
        &mut self,
        regime: Regime,
    ) {
        self.selected_regime = regime;
    }

    /// Pick the regime the comparison recommends.
    pub fn select_recommended(&mut self) {
        self.selected_regime = self.comparison.better_regime;
    }

    pub fn reset(&mut self) {
        self.income = Decimal::ZERO;
        self.deductions.clear();
        self.selected_regime = Regime::New;
        self.recompute();
    }

    /// One message per deduction above its advisory cap.
    pub fn cap_warnings(&self) -> Vec<String> {
        cap_warnings(&self.deductions)
    }

    fn recompute(&mut self) {
        let calculator = TaxCalculator::new(&self.table);
        self.comparison = compare_regimes(&calculator, self.income, &self.deductions);
    }
}

/// Warnings for catalogue deductions whose amount exceeds the cap.
/// Unknown ids carry no cap and never warn.
pub fn cap_warnings(deductions: &Deductions) -> Vec<String> {
    deductions
        .iter()
        .filter_map(|(id, amount)| {
            let deduction = Deduction::find(id)?;
            let cap = deduction.cap?;
            deduction.exceeds_cap(*amount).then(|| {
                format!(
                    "{} of {} exceeds the {} limit of {}",
                    deduction.name, amount, deduction.id, cap
                )
            })
        })
        .collect()
}
