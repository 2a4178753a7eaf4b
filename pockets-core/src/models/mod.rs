mod budget;
mod deduction;
mod regime;
mod tax_calculation;
mod tax_slab;
mod transaction;
mod user;

pub use budget::{BudgetCategory, NewBudgetCategory};
pub use deduction::{Deduction, Deductions, total_deductions};
pub use regime::Regime;
pub use tax_calculation::{SavedTaxCalculation, TaxCalculationResult};
pub use tax_slab::{SlabTableError, TaxRegimeTable, TaxSlab};
pub use transaction::{NewTransaction, Transaction, TransactionType};
pub use user::UserId;
