//! Tax calculations for the old and new regimes.
//!
//! [`TaxCalculator`] walks a [`crate::TaxRegimeTable`] for one regime;
//! [`compare_regimes`] runs it for both and picks the cheaper one.

pub mod common;
pub mod comparator;
pub mod tax;

pub use comparator::{RegimeComparison, SavingsDirection, compare_regimes};
pub use tax::TaxCalculator;
