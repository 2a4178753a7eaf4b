use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::UserId;

/// A named pocket of money set aside each month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetCategory {
    pub id: i64,
    pub user_id: UserId,
    pub name: String,
    pub allocated: Decimal,
    pub created_at: DateTime<Utc>,
}

/// For creating new budget categories (no id or timestamps)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBudgetCategory {
    pub user_id: UserId,
    pub name: String,
    pub allocated: Decimal,
}
