//! Application service.
//!
//! [`Pockets`] ties the repository, the slab table and the signed-in
//! [`Session`] together. Every operation touching user data checks the
//! session first.

use chrono::{DateTime, NaiveDate, Utc};
use pockets_core::calculations::{RegimeComparison, TaxCalculator, compare_regimes};
use pockets_core::db::{RepositoryFactory, RepositoryRegistry};
use pockets_core::reports::{self, BudgetStatus, CategoryTotal, MonthlyTotals, Summary};
use pockets_core::scan::{ReceiptScanner, ScanInput};
use pockets_core::{
    BudgetCategory, Deductions, NewBudgetCategory, PocketsRepository, Regime,
    SavedTaxCalculation, TaxCalculationResult, TaxRegimeTable, Transaction, UserId,
};
use pockets_data::{ExportBundle, transactions_to_csv};
use pockets_db_sqlite::SqliteRepositoryFactory;
use rust_decimal::Decimal;
use tracing::{debug, info, warn};

use crate::config::AppConfig;
use crate::error::AppError;
use crate::forms::TransactionForm;
use crate::state::{TaxFormState, cap_warnings};

/// Registry with every backend compiled into this binary.
pub fn build_registry() -> RepositoryRegistry {
    let mut registry = RepositoryRegistry::new();
    let sqlite: Box<dyn RepositoryFactory> = Box::new(SqliteRepositoryFactory);
    registry.register(sqlite);
    registry
}

/// Who is using the application. Anonymous until signed in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Session {
    user: Option<UserId>,
}

impl Session {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn signed_in(user: UserId) -> Self {
        Self { user: Some(user) }
    }

    pub fn sign_in(
        &mut self,
        user: UserId,
    ) {
        self.user = Some(user);
    }

    pub fn sign_out(&mut self) {
        self.user = None;
    }

    pub fn user_id(&self) -> Option<UserId> {
        self.user
    }

    pub fn require_user(&self) -> Result<UserId, AppError> {
        self.user.ok_or(AppError::NotAuthenticated)
    }
}

pub struct Pockets {
    repo: Box<dyn PocketsRepository>,
    table: TaxRegimeTable,
    session: Session,
}

impl Pockets {
    pub fn new(
        repo: Box<dyn PocketsRepository>,
        table: TaxRegimeTable,
        session: Session,
    ) -> Self {
        Self {
            repo,
            table,
            session,
        }
    }

    /// Open the configured backend and slab table.
    pub async fn connect(
        config: &AppConfig,
        session: Session,
    ) -> Result<Self, AppError> {
        let table = config.slab_table()?;
        debug!(backend = %config.database.backend, "connecting");
        let repo = build_registry().create(&config.database).await?;
        Ok(Self::new(repo, table, session))
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    pub fn table(&self) -> &TaxRegimeTable {
        &self.table
    }

    /// Fresh form state over this application's slab table.
    pub fn tax_form_state(&self) -> TaxFormState {
        TaxFormState::new(self.table.clone())
    }

    // ── tax ─────────────────────────────────────────────────────────────

    pub fn calculate(
        &self,
        income: Decimal,
        regime: Regime,
        deductions: &Deductions,
    ) -> TaxCalculationResult {
        warn_on_caps(deductions);
        let result = TaxCalculator::new(&self.table).calculate(income, regime, deductions);
        debug!(%income, regime = %regime, tax = %result.tax, "calculated");
        result
    }

    pub fn compare(
        &self,
        income: Decimal,
        deductions: &Deductions,
    ) -> RegimeComparison {
        warn_on_caps(deductions);
        compare_regimes(&TaxCalculator::new(&self.table), income, deductions)
    }

    /// Calculate and store as the user's latest calculation.
    pub async fn save_calculation(
        &self,
        income: Decimal,
        regime: Regime,
        deductions: &Deductions,
    ) -> Result<SavedTaxCalculation, AppError> {
        let user_id = self.session.require_user()?;
        let result = self.calculate(income, regime, deductions);
        let saved = self
            .repo
            .save_latest_calculation(user_id, &result, regime, income)
            .await?;
        info!(user = %user_id, regime = %regime, tax = %saved.tax, "saved calculation");
        Ok(saved)
    }

    pub async fn latest_calculation(&self) -> Result<Option<SavedTaxCalculation>, AppError> {
        let user_id = self.session.require_user()?;
        Ok(self.repo.get_latest_calculation(user_id).await?)
    }

    // ── transactions ────────────────────────────────────────────────────

    /// Validate the form and store the transaction. Field messages stay on
    /// the form when validation fails.
    pub async fn add_transaction(
        &self,
        form: &mut TransactionForm,
    ) -> Result<Transaction, AppError> {
        let user_id = self.session.require_user()?;
        let draft = form.validate(user_id)?;
        let tx = self.repo.create_transaction(draft).await?;
        info!(id = tx.id, kind = %tx.kind, amount = %tx.amount, "added transaction");
        Ok(tx)
    }

    pub async fn transactions(&self) -> Result<Vec<Transaction>, AppError> {
        let user_id = self.session.require_user()?;
        Ok(self.repo.list_transactions(user_id).await?)
    }

    pub async fn delete_transaction(
        &self,
        id: i64,
    ) -> Result<(), AppError> {
        let user_id = self.session.require_user()?;
        self.repo.delete_transaction(user_id, id).await?;
        info!(id, "deleted transaction");
        Ok(())
    }

    /// Import CSV rows in one database transaction. Nothing is stored when
    /// any row is invalid or the write fails part way.
    pub async fn import_transactions(
        &self,
        csv: &str,
    ) -> Result<Vec<Transaction>, AppError> {
        let user_id = self.session.require_user()?;
        let drafts = pockets_data::load_from_str(csv, user_id)?;

        let imported = self.repo.create_transactions(drafts).await?;
        info!(count = imported.len(), "imported transactions");
        Ok(imported)
    }

    // ── budgets ─────────────────────────────────────────────────────────

    pub async fn add_budget_category(
        &self,
        name: &str,
        allocated: Decimal,
    ) -> Result<BudgetCategory, AppError> {
        let user_id = self.session.require_user()?;

        let name = name.trim();
        let mut errors = Vec::new();
        if name.is_empty() {
            errors.push("Category name is required".to_string());
        }
        if allocated < Decimal::ZERO {
            errors.push("Allocation cannot be negative".to_string());
        }
        if !errors.is_empty() {
            return Err(AppError::Validation(errors));
        }

        let category = self
            .repo
            .create_budget_category(NewBudgetCategory {
                user_id,
                name: name.to_string(),
                allocated,
            })
            .await?;
        info!(id = category.id, name = %category.name, "added budget category");
        Ok(category)
    }

    pub async fn set_budget_allocation(
        &self,
        id: i64,
        allocated: Decimal,
    ) -> Result<BudgetCategory, AppError> {
        let user_id = self.session.require_user()?;
        if allocated < Decimal::ZERO {
            return Err(AppError::validation("Allocation cannot be negative"));
        }
        Ok(self
            .repo
            .update_budget_allocation(user_id, id, allocated)
            .await?)
    }

    pub async fn budget_categories(&self) -> Result<Vec<BudgetCategory>, AppError> {
        let user_id = self.session.require_user()?;
        Ok(self.repo.list_budget_categories(user_id).await?)
    }

    pub async fn remove_budget_category(
        &self,
        id: i64,
    ) -> Result<(), AppError> {
        let user_id = self.session.require_user()?;
        self.repo.delete_budget_category(user_id, id).await?;
        info!(id, "removed budget category");
        Ok(())
    }

    /// Budget usage for the calendar month containing `month_of`.
    pub async fn budget_status(
        &self,
        month_of: NaiveDate,
    ) -> Result<BudgetStatus, AppError> {
        let categories = self.budget_categories().await?;
        let transactions = self.transactions().await?;
        Ok(reports::budget_status(&categories, &transactions, month_of))
    }

    // ── reports ─────────────────────────────────────────────────────────

    pub async fn summary(&self) -> Result<Summary, AppError> {
        Ok(reports::summarize(&self.transactions().await?))
    }

    pub async fn category_breakdown(&self) -> Result<Vec<CategoryTotal>, AppError> {
        Ok(reports::expense_by_category(&self.transactions().await?))
    }

    pub async fn monthly_trend(&self) -> Result<Vec<MonthlyTotals>, AppError> {
        Ok(reports::monthly_trend(&self.transactions().await?))
    }

    // ── export ──────────────────────────────────────────────────────────

    pub async fn export_csv(&self) -> Result<String, AppError> {
        let transactions = self.transactions().await?;
        Ok(transactions_to_csv(&transactions)?)
    }

    pub async fn export_bundle(
        &self,
        exported_at: DateTime<Utc>,
    ) -> Result<ExportBundle, AppError> {
        let transactions = self.transactions().await?;
        let tax_data = self.latest_calculation().await?;
        Ok(ExportBundle::new(transactions, tax_data, exported_at))
    }

    pub async fn export_json(
        &self,
        exported_at: DateTime<Utc>,
    ) -> Result<String, AppError> {
        Ok(self.export_bundle(exported_at).await?.to_json()?)
    }

    // ── scanning ────────────────────────────────────────────────────────

    /// Scan a receipt into a pre-filled expense form. Nothing is stored.
    pub async fn scan_receipt(
        &self,
        scanner: &dyn ReceiptScanner,
        input: ScanInput,
    ) -> Result<TransactionForm, AppError> {
        self.session.require_user()?;
        let kind = input.kind();
        let scan = scanner.scan(input).await?;
        debug!(input = kind, title = %scan.title, amount = %scan.amount, "scanned receipt");
        Ok(TransactionForm::from_scan(&scan))
    }
}

fn warn_on_caps(deductions: &Deductions) {
    for message in cap_warnings(deductions) {
        warn!("{message}");
    }
}
