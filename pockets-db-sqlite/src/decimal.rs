//! Decimal column handling.
//!
//! Amounts are written as TEXT. Reads also accept INTEGER and REAL so that
//! rows written by older clients (which stored plain numbers) still load;
//! this is the one place an amount is converted into a [`Decimal`].

use pockets_core::RepositoryError;
use rust_decimal::Decimal;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, TypeInfo, ValueRef};

/// Get a decimal from a TEXT, INTEGER or REAL column.
pub fn get_decimal(
    row: &SqliteRow,
    column: &str,
) -> Result<Decimal, RepositoryError> {
    let value_ref = row
        .try_get_raw(column)
        .map_err(|e| RepositoryError::Database(format!("Column '{}' not found: {}", column, e)))?;

    if value_ref.is_null() {
        return Err(RepositoryError::Database(format!(
            "Column '{}' is NULL",
            column
        )));
    }

    let type_name = value_ref.type_info().name().to_string();
    match type_name.as_str() {
        "TEXT" => {
            let text: String = row.try_get(column).map_err(|e| {
                RepositoryError::Database(format!("Failed to get TEXT from '{}': {}", column, e))
            })?;
            text.trim().parse::<Decimal>().map_err(|e| {
                RepositoryError::Database(format!(
                    "Failed to parse decimal '{}' in '{}': {}",
                    text, column, e
                ))
            })
        }
        "INTEGER" => {
            let val: i64 = row.try_get(column).map_err(|e| {
                RepositoryError::Database(format!(
                    "Failed to get INTEGER from '{}': {}",
                    column, e
                ))
            })?;
            Ok(Decimal::from(val))
        }
        "REAL" => {
            let val: f64 = row.try_get(column).map_err(|e| {
                RepositoryError::Database(format!("Failed to get REAL from '{}': {}", column, e))
            })?;
            Decimal::try_from(val).map_err(|e| {
                RepositoryError::Database(format!("Failed to convert {} to Decimal: {}", val, e))
            })
        }
        other => Err(RepositoryError::Database(format!(
            "Unexpected type '{}' for column '{}'",
            other, column
        ))),
    }
}

/// Storage form of a decimal. Keeps the scale, so `10.50` stays `10.50`.
pub fn decimal_to_sql(d: Decimal) -> String {
    d.to_string()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;
    use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};

    use super::*;

    async fn setup_test_db() -> SqlitePool {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .expect("Failed to create in-memory database");

        sqlx::query(
            "CREATE TABLE amounts (
                id INTEGER PRIMARY KEY,
                value
            )",
        )
        .execute(&pool)
        .await
        .expect("Failed to create test table");

        pool
    }

    async fn fetch(
        pool: &SqlitePool,
        literal: &str,
    ) -> SqliteRow {
        sqlx::query("DELETE FROM amounts")
            .execute(pool)
            .await
            .expect("Failed to clear table");
        sqlx::query(&format!("INSERT INTO amounts (id, value) VALUES (1, {literal})"))
            .execute(pool)
            .await
            .expect("Failed to insert test data");
        sqlx::query("SELECT value FROM amounts WHERE id = 1")
            .fetch_one(pool)
            .await
            .expect("Failed to fetch row")
    }

    #[tokio::test]
    async fn test_get_decimal_from_text_keeps_precision() {
        let pool = setup_test_db().await;
        let row = fetch(&pool, "'1106400.0000000001'").await;

        assert_eq!(get_decimal(&row, "value"), Ok(dec!(1106400.0000000001)));
    }

    #[tokio::test]
    async fn test_get_decimal_from_integer() {
        let pool = setup_test_db().await;
        let row = fetch(&pool, "93600").await;

        assert_eq!(get_decimal(&row, "value"), Ok(dec!(93600)));
    }

    #[tokio::test]
    async fn test_get_decimal_from_real() {
        let pool = setup_test_db().await;
        let row = fetch(&pool, "123.45").await;

        assert_eq!(get_decimal(&row, "value"), Ok(dec!(123.45)));
    }

    #[tokio::test]
    async fn test_get_decimal_rejects_non_numeric_text() {
        let pool = setup_test_db().await;
        let row = fetch(&pool, "'twelve'").await;

        assert!(matches!(
            get_decimal(&row, "value"),
            Err(RepositoryError::Database(_))
        ));
    }

    #[tokio::test]
    async fn test_get_decimal_rejects_null() {
        let pool = setup_test_db().await;
        let row = fetch(&pool, "NULL").await;

        assert!(get_decimal(&row, "value").is_err());
    }

    #[tokio::test]
    async fn test_get_decimal_missing_column() {
        let pool = setup_test_db().await;
        let row = fetch(&pool, "1").await;

        assert!(get_decimal(&row, "nope").is_err());
    }

    #[test]
    fn test_decimal_to_sql_keeps_scale() {
        assert_eq!(decimal_to_sql(dec!(10.50)), "10.50");
        assert_eq!(decimal_to_sql(dec!(-3)), "-3");
    }
}
