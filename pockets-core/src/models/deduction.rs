use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::Serialize;

/// Deduction amounts keyed by deduction id.
pub type Deductions = BTreeMap<String, Decimal>;

/// A deduction the old regime recognises.
///
/// Caps are advisory: the calculator never clamps to them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Deduction {
    pub id: &'static str,
    pub name: &'static str,
    pub cap: Option<Decimal>,
}

const CATALOG: &[(&str, &str, Option<i64>)] = &[
    ("80c", "Section 80C (PPF, ELSS, life insurance)", Some(150_000)),
    ("80d", "Section 80D (health insurance)", Some(25_000)),
    ("80ccd_1b", "Section 80CCD(1B) (NPS)", Some(50_000)),
    ("24b", "Section 24(b) (home loan interest)", Some(200_000)),
    ("hra", "House rent allowance", None),
    ("80e", "Section 80E (education loan interest)", None),
    ("80tta", "Section 80TTA (savings interest)", Some(10_000)),
];

impl Deduction {
    /// Every deduction known to the application, in display order.
    pub fn catalog() -> Vec<Deduction> {
        CATALOG
            .iter()
            .map(|(id, name, cap)| Deduction {
                id,
                name,
                cap: cap.map(Decimal::from),
            })
            .collect()
    }

    pub fn find(id: &str) -> Option<Deduction> {
        Self::catalog().into_iter().find(|d| d.id == id)
    }

    /// True when `amount` is above this deduction's cap.
    pub fn exceeds_cap(
        &self,
        amount: Decimal,
    ) -> bool {
        self.cap.is_some_and(|cap| amount > cap)
    }
}

/// Sum of every deduction amount.
pub fn total_deductions(deductions: &Deductions) -> Decimal {
    deductions.values().copied().sum()
}
