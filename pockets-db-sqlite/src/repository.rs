use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use pockets_core::{
    BudgetCategory, NewBudgetCategory, NewTransaction, PocketsRepository, Regime,
    RepositoryError, SavedTaxCalculation, TaxCalculationResult, Transaction, TransactionType,
    UserId,
};
use rust_decimal::Decimal;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::{Decode, Executor, Row, Sqlite, Type};
use tracing::{debug, info};

use crate::decimal::{decimal_to_sql, get_decimal};

const TRANSACTION_COLUMNS: &str =
    "id, user_id, type, title, amount, category, date, payment_method, created_at";
const BUDGET_COLUMNS: &str = "id, user_id, name, allocated, created_at";
const CALCULATION_COLUMNS: &str =
    "user_id, regime, income, taxable_income, tax, effective_rate, in_hand, created_at";

pub struct SqliteRepository {
    pool: SqlitePool,
}

impl SqliteRepository {
    /// Connect to `database_url`, creating the file when missing.
    ///
    /// Accepts `sqlite:path`, a bare path, or `:memory:`. An in-memory
    /// database lives on a single pooled connection so every query sees
    /// the same schema.
    pub async fn new(database_url: &str) -> Result<Self, RepositoryError> {
        let in_memory = is_in_memory(database_url);
        let options = SqliteConnectOptions::from_str(database_url)
            .map_err(|e| RepositoryError::Configuration(format!("{database_url}: {e}")))?
            .create_if_missing(true)
            .foreign_keys(true);

        let mut pool_options = SqlitePoolOptions::new();
        if in_memory {
            pool_options = pool_options
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None);
        }

        let pool = pool_options
            .connect_with(options)
            .await
            .map_err(|e| RepositoryError::Connection(e.to_string()))?;

        debug!(database_url, in_memory, "connected to sqlite");
        Ok(Self { pool })
    }

    pub async fn run_migrations(&self) -> Result<(), RepositoryError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| RepositoryError::Database(format!("Failed to run migrations: {e}")))?;
        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn get_transaction(
        &self,
        user_id: UserId,
        id: i64,
    ) -> Result<Transaction, RepositoryError> {
        let row = sqlx::query(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM transactions WHERE id = ? AND user_id = ?"
        ))
        .bind(id)
        .bind(user_id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?
        .ok_or(RepositoryError::NotFound)?;

        row_to_transaction(&row)
    }

    async fn get_budget_category(
        &self,
        user_id: UserId,
        id: i64,
    ) -> Result<BudgetCategory, RepositoryError> {
        let row = sqlx::query(&format!(
            "SELECT {BUDGET_COLUMNS} FROM budget_categories WHERE id = ? AND user_id = ?"
        ))
        .bind(id)
        .bind(user_id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?
        .ok_or(RepositoryError::NotFound)?;

        row_to_budget_category(&row)
    }
}

/// Insert one row and return its id.
async fn insert_transaction<'e, E>(
    executor: E,
    transaction: &NewTransaction,
    created_at: DateTime<Utc>,
) -> Result<i64, RepositoryError>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query(
        "INSERT INTO transactions (
            user_id, type, title, amount, category, date, payment_method, created_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(transaction.user_id.to_string())
    .bind(transaction.kind.as_str())
    .bind(&transaction.title)
    .bind(decimal_to_sql(transaction.amount))
    .bind(&transaction.category)
    .bind(transaction.date)
    .bind(&transaction.payment_method)
    .bind(created_at)
    .execute(executor)
    .await
    .map_err(db_error)?;

    Ok(result.last_insert_rowid())
}

fn is_in_memory(database_url: &str) -> bool {
    let trimmed = database_url.trim_start_matches("sqlite:");
    trimmed == ":memory:" || trimmed.contains("mode=memory")
}

fn db_error(e: sqlx::Error) -> RepositoryError {
    RepositoryError::Database(e.to_string())
}

fn column<'r, T>(
    row: &'r SqliteRow,
    name: &str,
) -> Result<T, RepositoryError>
where
    T: Decode<'r, Sqlite> + Type<Sqlite>,
{
    row.try_get(name)
        .map_err(|e| RepositoryError::Database(format!("Failed to get {name}: {e}")))
}

fn user_column(row: &SqliteRow) -> Result<UserId, RepositoryError> {
    let raw: String = column(row, "user_id")?;
    raw.parse()
        .map_err(|e| RepositoryError::Database(format!("Invalid user_id '{raw}': {e}")))
}

fn row_to_transaction(row: &SqliteRow) -> Result<Transaction, RepositoryError> {
    let kind: String = column(row, "type")?;
    Ok(Transaction {
        id: column(row, "id")?,
        user_id: user_column(row)?,
        kind: TransactionType::parse(&kind).ok_or_else(|| {
            RepositoryError::Database(format!("Invalid transaction type: {kind}"))
        })?,
        title: column(row, "title")?,
        amount: get_decimal(row, "amount")?,
        category: column(row, "category")?,
        date: column::<NaiveDate>(row, "date")?,
        payment_method: column(row, "payment_method")?,
        created_at: column::<DateTime<Utc>>(row, "created_at")?,
    })
}

fn row_to_budget_category(row: &SqliteRow) -> Result<BudgetCategory, RepositoryError> {
    Ok(BudgetCategory {
        id: column(row, "id")?,
        user_id: user_column(row)?,
        name: column(row, "name")?,
        allocated: get_decimal(row, "allocated")?,
        created_at: column::<DateTime<Utc>>(row, "created_at")?,
    })
}

fn row_to_calculation(row: &SqliteRow) -> Result<SavedTaxCalculation, RepositoryError> {
    let regime: String = column(row, "regime")?;
    Ok(SavedTaxCalculation {
        user_id: user_column(row)?,
        regime: Regime::parse(&regime)
            .ok_or_else(|| RepositoryError::Database(format!("Invalid regime: {regime}")))?,
        income: get_decimal(row, "income")?,
        taxable_income: get_decimal(row, "taxable_income")?,
        tax: get_decimal(row, "tax")?,
        effective_rate: get_decimal(row, "effective_rate")?,
        in_hand: get_decimal(row, "in_hand")?,
        created_at: column::<DateTime<Utc>>(row, "created_at")?,
    })
}

#[async_trait]
impl PocketsRepository for SqliteRepository {
    async fn save_latest_calculation(
        &self,
        user_id: UserId,
        result: &TaxCalculationResult,
        regime: Regime,
        income: Decimal,
    ) -> Result<SavedTaxCalculation, RepositoryError> {
        sqlx::query(
            "INSERT INTO tax_calculations (
                user_id, regime, income, taxable_income, tax, effective_rate, in_hand, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT (user_id) DO UPDATE SET
                regime = excluded.regime,
                income = excluded.income,
                taxable_income = excluded.taxable_income,
                tax = excluded.tax,
                effective_rate = excluded.effective_rate,
                in_hand = excluded.in_hand,
                created_at = excluded.created_at",
        )
        .bind(user_id.to_string())
        .bind(regime.as_str())
        .bind(decimal_to_sql(income))
        .bind(decimal_to_sql(result.taxable_income))
        .bind(decimal_to_sql(result.tax))
        .bind(decimal_to_sql(result.effective_rate))
        .bind(decimal_to_sql(result.in_hand))
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(db_error)?;

        info!(%user_id, %regime, tax = %result.tax, "saved tax calculation");

        self.get_latest_calculation(user_id)
            .await?
            .ok_or(RepositoryError::NotFound)
    }

    async fn get_latest_calculation(
        &self,
        user_id: UserId,
    ) -> Result<Option<SavedTaxCalculation>, RepositoryError> {
        let row = sqlx::query(&format!(
            "SELECT {CALCULATION_COLUMNS} FROM tax_calculations WHERE user_id = ?"
        ))
        .bind(user_id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?;

        row.as_ref().map(row_to_calculation).transpose()
    }

    async fn create_transaction(
        &self,
        transaction: NewTransaction,
    ) -> Result<Transaction, RepositoryError> {
        let id = insert_transaction(&self.pool, &transaction, Utc::now()).await?;
        debug!(id, user_id = %transaction.user_id, "created transaction");
        self.get_transaction(transaction.user_id, id).await
    }

    async fn create_transactions(
        &self,
        transactions: Vec<NewTransaction>,
    ) -> Result<Vec<Transaction>, RepositoryError> {
        let created_at = Utc::now();
        let mut tx = self.pool.begin().await.map_err(db_error)?;

        let mut ids = Vec::with_capacity(transactions.len());
        for transaction in &transactions {
            ids.push(insert_transaction(&mut *tx, transaction, created_at).await?);
        }
        tx.commit().await.map_err(db_error)?;
        info!(count = ids.len(), "created transactions");

        let mut created = Vec::with_capacity(ids.len());
        for (transaction, id) in transactions.iter().zip(ids) {
            created.push(self.get_transaction(transaction.user_id, id).await?);
        }
        Ok(created)
    }

    async fn list_transactions(
        &self,
        user_id: UserId,
    ) -> Result<Vec<Transaction>, RepositoryError> {
        let rows = sqlx::query(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM transactions
             WHERE user_id = ?
             ORDER BY date DESC, id DESC"
        ))
        .bind(user_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;

        rows.iter().map(row_to_transaction).collect()
    }

    async fn delete_transaction(
        &self,
        user_id: UserId,
        id: i64,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM transactions WHERE id = ? AND user_id = ?")
            .bind(id)
            .bind(user_id.to_string())
            .execute(&self.pool)
            .await
            .map_err(db_error)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    async fn create_budget_category(
        &self,
        category: NewBudgetCategory,
    ) -> Result<BudgetCategory, RepositoryError> {
        let result = sqlx::query(
            "INSERT INTO budget_categories (user_id, name, allocated, created_at)
             VALUES (?, ?, ?, ?)",
        )
        .bind(category.user_id.to_string())
        .bind(&category.name)
        .bind(decimal_to_sql(category.allocated))
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|e| match e.as_database_error() {
            Some(db) if db.is_unique_violation() => RepositoryError::Conflict(format!(
                "budget category '{}' already exists",
                category.name
            )),
            _ => db_error(e),
        })?;

        self.get_budget_category(category.user_id, result.last_insert_rowid())
            .await
    }

    async fn list_budget_categories(
        &self,
        user_id: UserId,
    ) -> Result<Vec<BudgetCategory>, RepositoryError> {
        let rows = sqlx::query(&format!(
            "SELECT {BUDGET_COLUMNS} FROM budget_categories
             WHERE user_id = ?
             ORDER BY name COLLATE NOCASE"
        ))
        .bind(user_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;

        rows.iter().map(row_to_budget_category).collect()
    }

    async fn update_budget_allocation(
        &self,
        user_id: UserId,
        id: i64,
        allocated: Decimal,
    ) -> Result<BudgetCategory, RepositoryError> {
        let result =
            sqlx::query("UPDATE budget_categories SET allocated = ? WHERE id = ? AND user_id = ?")
                .bind(decimal_to_sql(allocated))
                .bind(id)
                .bind(user_id.to_string())
                .execute(&self.pool)
                .await
                .map_err(db_error)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        self.get_budget_category(user_id, id).await
    }

    async fn delete_budget_category(
        &self,
        user_id: UserId,
        id: i64,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM budget_categories WHERE id = ? AND user_id = ?")
            .bind(id)
            .bind(user_id.to_string())
            .execute(&self.pool)
            .await
            .map_err(db_error)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    async fn setup_test_db() -> SqliteRepository {
        let repo = SqliteRepository::new(":memory:")
            .await
            .expect("Failed to create in-memory database");
        repo.run_migrations()
            .await
            .expect("Failed to run migrations");
        repo
    }

    fn new_transaction(
        user_id: UserId,
        kind: TransactionType,
        title: &str,
        amount: Decimal,
        date: (i32, u32, u32),
    ) -> NewTransaction {
        NewTransaction {
            user_id,
            kind,
            title: title.to_string(),
            amount,
            category: "Food".to_string(),
            date: NaiveDate::from_ymd_opt(date.0, date.1, date.2).unwrap(),
            payment_method: None,
        }
    }

    fn result(
        taxable_income: Decimal,
        tax: Decimal,
        effective_rate: Decimal,
        in_hand: Decimal,
    ) -> TaxCalculationResult {
        TaxCalculationResult {
            taxable_income,
            tax,
            effective_rate,
            in_hand,
        }
    }

    // =========================================================================
    // tax calculations
    // =========================================================================

    #[tokio::test]
    async fn test_get_latest_calculation_empty() {
        let repo = setup_test_db().await;

        let saved = repo
            .get_latest_calculation(UserId::new())
            .await
            .expect("Lookup should succeed");

        assert_eq!(saved, None);
    }

    #[tokio::test]
    async fn test_save_then_get_round_trip() {
        let repo = setup_test_db().await;
        let user = UserId::new();
        let calc = result(dec!(1200000), dec!(93600), dec!(7.80), dec!(1106400));

        let saved = repo
            .save_latest_calculation(user, &calc, Regime::New, dec!(1200000))
            .await
            .expect("Should save calculation");
        let fetched = repo
            .get_latest_calculation(user)
            .await
            .expect("Should fetch calculation")
            .expect("Calculation should exist");

        assert_eq!(fetched, saved);
        assert_eq!(fetched.user_id, user);
        assert_eq!(fetched.regime, Regime::New);
        assert_eq!(fetched.income, dec!(1200000));
        assert_eq!(fetched.result(), calc);
    }

    #[tokio::test]
    async fn test_second_save_overwrites() {
        let repo = setup_test_db().await;
        let user = UserId::new();

        repo.save_latest_calculation(
            user,
            &result(dec!(1200000), dec!(93600), dec!(7.80), dec!(1106400)),
            Regime::New,
            dec!(1200000),
        )
        .await
        .expect("First save");
        repo.save_latest_calculation(
            user,
            &result(dec!(800000), dec!(75400), dec!(7.54), dec!(924600)),
            Regime::Old,
            dec!(1000000),
        )
        .await
        .expect("Second save");

        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM tax_calculations WHERE user_id = ?")
                .bind(user.to_string())
                .fetch_one(repo.pool())
                .await
                .expect("Count rows");
        let fetched = repo.get_latest_calculation(user).await.unwrap().unwrap();

        assert_eq!(count, 1);
        assert_eq!(fetched.regime, Regime::Old);
        assert_eq!(fetched.tax, dec!(75400));
        assert_eq!(fetched.income, dec!(1000000));
    }

    #[tokio::test]
    async fn test_calculations_are_per_user() {
        let repo = setup_test_db().await;
        let alice = UserId::new();
        let bob = UserId::new();

        repo.save_latest_calculation(
            alice,
            &result(dec!(0), dec!(0), dec!(0), dec!(0)),
            Regime::New,
            dec!(0),
        )
        .await
        .unwrap();

        assert!(repo.get_latest_calculation(bob).await.unwrap().is_none());
    }

    // =========================================================================
    // transactions
    // =========================================================================

    #[tokio::test]
    async fn test_create_and_list_transactions() {
        let repo = setup_test_db().await;
        let user = UserId::new();

        let mut coffee = new_transaction(
            user,
            TransactionType::Expense,
            "Coffee, large",
            dec!(120.50),
            (2025, 3, 1),
        );
        coffee.payment_method = Some("UPI".to_string());
        let created = repo
            .create_transaction(coffee)
            .await
            .expect("Should create transaction");
        repo.create_transaction(new_transaction(
            user,
            TransactionType::Income,
            "Salary",
            dec!(50000),
            (2025, 3, 31),
        ))
        .await
        .expect("Should create transaction");

        assert_eq!(created.title, "Coffee, large");
        assert_eq!(created.amount, dec!(120.50));
        assert_eq!(created.payment_method.as_deref(), Some("UPI"));
        assert_eq!(created.kind, TransactionType::Expense);

        let listed = repo.list_transactions(user).await.expect("Should list");

        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].title, "Salary"); // newest date first
        assert_eq!(listed[1], created);
    }

    #[tokio::test]
    async fn test_list_transactions_is_scoped_to_user() {
        let repo = setup_test_db().await;
        let alice = UserId::new();
        let bob = UserId::new();

        repo.create_transaction(new_transaction(
            alice,
            TransactionType::Expense,
            "Lunch",
            dec!(300),
            (2025, 1, 1),
        ))
        .await
        .unwrap();

        assert!(repo.list_transactions(bob).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_transaction() {
        let repo = setup_test_db().await;
        let user = UserId::new();
        let created = repo
            .create_transaction(new_transaction(
                user,
                TransactionType::Expense,
                "Taxi",
                dec!(250),
                (2025, 1, 2),
            ))
            .await
            .unwrap();

        repo.delete_transaction(user, created.id)
            .await
            .expect("Should delete");

        assert!(repo.list_transactions(user).await.unwrap().is_empty());
        assert_eq!(
            repo.delete_transaction(user, created.id).await,
            Err(RepositoryError::NotFound)
        );
    }

    #[tokio::test]
    async fn test_delete_transaction_of_other_user_is_not_found() {
        let repo = setup_test_db().await;
        let owner = UserId::new();
        let created = repo
            .create_transaction(new_transaction(
                owner,
                TransactionType::Expense,
                "Movie",
                dec!(400),
                (2025, 1, 3),
            ))
            .await
            .unwrap();

        let result = repo.delete_transaction(UserId::new(), created.id).await;

        assert_eq!(result, Err(RepositoryError::NotFound));
        assert_eq!(repo.list_transactions(owner).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_create_transactions_in_input_order() {
        let repo = setup_test_db().await;
        let user = UserId::new();

        let created = repo
            .create_transactions(vec![
                new_transaction(user, TransactionType::Income, "Salary", dec!(50000), (2025, 3, 1)),
                new_transaction(user, TransactionType::Expense, "Tea", dec!(900.50), (2025, 3, 2)),
            ])
            .await
            .expect("Should create batch");

        assert_eq!(created.len(), 2);
        assert_eq!(created[0].title, "Salary");
        assert_eq!(created[1].amount.to_string(), "900.50");
        assert_eq!(repo.list_transactions(user).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_create_transactions_rolls_back_on_failure() {
        let repo = setup_test_db().await;
        let user = UserId::new();
        sqlx::query(
            "CREATE TRIGGER reject_refunds BEFORE INSERT ON transactions
             WHEN NEW.title = 'Refund'
             BEGIN SELECT RAISE(ABORT, 'refunds not accepted'); END",
        )
        .execute(repo.pool())
        .await
        .expect("Failed to create trigger");

        let result = repo
            .create_transactions(vec![
                new_transaction(user, TransactionType::Expense, "Lunch", dec!(300), (2025, 1, 1)),
                new_transaction(user, TransactionType::Expense, "Refund", dec!(300), (2025, 1, 2)),
            ])
            .await;

        assert!(matches!(result, Err(RepositoryError::Database(_))), "{result:?}");
        assert!(repo.list_transactions(user).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_transactions_empty_batch() {
        let repo = setup_test_db().await;

        let created = repo.create_transactions(Vec::new()).await.expect("Should succeed");

        assert!(created.is_empty());
    }

    #[tokio::test]
    async fn test_reads_legacy_numeric_amounts() {
        let repo = setup_test_db().await;
        let user = UserId::new();

        sqlx::query(
            "INSERT INTO transactions (user_id, type, title, amount, category, date, created_at)
             VALUES (?, 'expense', 'Old row', 99.5, 'Misc', '2024-12-31', '2024-12-31T10:00:00Z')",
        )
        .bind(user.to_string())
        .execute(repo.pool())
        .await
        .expect("Failed to insert legacy row");

        let listed = repo.list_transactions(user).await.expect("Should list");

        assert_eq!(listed[0].amount, dec!(99.5));
    }

    // =========================================================================
    // budget categories
    // =========================================================================

    #[tokio::test]
    async fn test_create_and_list_budget_categories() {
        let repo = setup_test_db().await;
        let user = UserId::new();

        for (name, allocated) in [("Rent", dec!(15000)), ("food", dec!(6000))] {
            repo.create_budget_category(NewBudgetCategory {
                user_id: user,
                name: name.to_string(),
                allocated,
            })
            .await
            .expect("Should create category");
        }

        let categories = repo.list_budget_categories(user).await.unwrap();

        let names: Vec<_> = categories.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["food", "Rent"]);
        assert_eq!(categories[1].allocated, dec!(15000));
    }

    #[tokio::test]
    async fn test_duplicate_budget_category_conflicts() {
        let repo = setup_test_db().await;
        let user = UserId::new();
        let category = |name: &str| NewBudgetCategory {
            user_id: user,
            name: name.to_string(),
            allocated: dec!(100),
        };

        repo.create_budget_category(category("Travel")).await.unwrap();
        let result = repo.create_budget_category(category("travel")).await;

        assert!(matches!(result, Err(RepositoryError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_same_category_name_for_different_users() {
        let repo = setup_test_db().await;

        for _ in 0..2 {
            repo.create_budget_category(NewBudgetCategory {
                user_id: UserId::new(),
                name: "Food".to_string(),
                allocated: dec!(100),
            })
            .await
            .expect("Names are unique per user only");
        }
    }

    #[tokio::test]
    async fn test_update_budget_allocation() {
        let repo = setup_test_db().await;
        let user = UserId::new();
        let created = repo
            .create_budget_category(NewBudgetCategory {
                user_id: user,
                name: "Food".to_string(),
                allocated: dec!(5000),
            })
            .await
            .unwrap();

        let updated = repo
            .update_budget_allocation(user, created.id, dec!(7500.25))
            .await
            .expect("Should update");

        assert_eq!(updated.allocated, dec!(7500.25));
        assert_eq!(updated.name, "Food");
        assert_eq!(
            repo.update_budget_allocation(UserId::new(), created.id, dec!(1))
                .await,
            Err(RepositoryError::NotFound)
        );
    }

    #[tokio::test]
    async fn test_delete_budget_category() {
        let repo = setup_test_db().await;
        let user = UserId::new();
        let created = repo
            .create_budget_category(NewBudgetCategory {
                user_id: user,
                name: "Gifts".to_string(),
                allocated: dec!(1000),
            })
            .await
            .unwrap();

        repo.delete_budget_category(user, created.id).await.unwrap();

        assert!(repo.list_budget_categories(user).await.unwrap().is_empty());
        assert_eq!(
            repo.delete_budget_category(user, created.id).await,
            Err(RepositoryError::NotFound)
        );
    }

    // =========================================================================
    // connections
    // =========================================================================

    #[tokio::test]
    async fn test_file_database_persists_across_connections() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let path = dir.path().join("pockets.db");
        let url = format!("sqlite:{}", path.display());
        let user = UserId::new();

        {
            let repo = SqliteRepository::new(&url).await.expect("Should open file");
            repo.run_migrations().await.unwrap();
            repo.save_latest_calculation(
                user,
                &result(dec!(800000), dec!(75400), dec!(7.54), dec!(924600)),
                Regime::Old,
                dec!(1000000),
            )
            .await
            .unwrap();
            repo.pool().close().await;
        }

        let reopened = SqliteRepository::new(&url).await.expect("Should reopen");
        reopened.run_migrations().await.unwrap();

        let fetched = reopened.get_latest_calculation(user).await.unwrap();
        assert_eq!(fetched.map(|c| c.tax), Some(dec!(75400)));
    }

    #[test]
    fn test_is_in_memory() {
        assert!(is_in_memory(":memory:"));
        assert!(is_in_memory("sqlite::memory:"));
        assert!(is_in_memory("sqlite:file:pockets?mode=memory&cache=shared"));
        assert!(!is_in_memory("sqlite:pockets.db"));
    }
}
