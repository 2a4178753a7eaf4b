use async_trait::async_trait;
use rust_decimal::Decimal;
use thiserror::Error;

use crate::models::{
    BudgetCategory, NewBudgetCategory, NewTransaction, Regime, SavedTaxCalculation,
    TaxCalculationResult, Transaction, UserId,
};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RepositoryError {
    #[error("Record not found")]
    NotFound,

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

/// Storage for everything a user owns. Every method is scoped by `user_id`;
/// rows belonging to another user behave as if they did not exist.
#[async_trait]
pub trait PocketsRepository: Send + Sync {
    // Tax calculations (one row per user)
    async fn save_latest_calculation(
        &self,
        user_id: UserId,
        result: &TaxCalculationResult,
        regime: Regime,
        income: Decimal,
    ) -> Result<SavedTaxCalculation, RepositoryError>;

    async fn get_latest_calculation(
        &self,
        user_id: UserId,
    ) -> Result<Option<SavedTaxCalculation>, RepositoryError>;

    // Transactions
    async fn create_transaction(
        &self,
        transaction: NewTransaction,
    ) -> Result<Transaction, RepositoryError>;

    /// Store every transaction or none of them. Returned in input order.
    async fn create_transactions(
        &self,
        transactions: Vec<NewTransaction>,
    ) -> Result<Vec<Transaction>, RepositoryError>;

    async fn list_transactions(&self, user_id: UserId)
    -> Result<Vec<Transaction>, RepositoryError>;

    async fn delete_transaction(
        &self,
        user_id: UserId,
        id: i64,
    ) -> Result<(), RepositoryError>;

    // Budget categories
    async fn create_budget_category(
        &self,
        category: NewBudgetCategory,
    ) -> Result<BudgetCategory, RepositoryError>;

    async fn list_budget_categories(
        &self,
        user_id: UserId,
    ) -> Result<Vec<BudgetCategory>, RepositoryError>;

    async fn update_budget_allocation(
        &self,
        user_id: UserId,
        id: i64,
        allocated: Decimal,
    ) -> Result<BudgetCategory, RepositoryError>;

    async fn delete_budget_category(
        &self,
        user_id: UserId,
        id: i64,
    ) -> Result<(), RepositoryError>;
}
