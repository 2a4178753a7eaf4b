//! Chart-ready aggregations over a user's transactions.
//!
//! Everything here is pure: callers fetch transactions from the repository
//! and hand over a slice.

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::calculations::common::percent_of;
use crate::models::{BudgetCategory, Transaction};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub total_income: Decimal,
    pub total_expense: Decimal,
    pub balance: Decimal,
    /// Share of income not spent, as a percentage. Zero without income.
    pub savings_rate: Decimal,
    pub transaction_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryTotal {
    pub category: String,
    pub total: Decimal,
    /// Percentage of all expenses.
    pub share: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyTotals {
    /// `YYYY-MM`
    pub month: String,
    pub income: Decimal,
    pub expense: Decimal,
    pub net: Decimal,
}

/// Spending against one budget category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetLine {
    pub category: BudgetCategory,
    pub spent: Decimal,
    pub remaining: Decimal,
    pub percent_used: Decimal,
    pub over_budget: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetStatus {
    pub lines: Vec<BudgetLine>,
    pub total_allocated: Decimal,
    pub total_spent: Decimal,
    pub income: Decimal,
    /// Income not assigned to any category. Negative when over-allocated.
    pub unallocated: Decimal,
}

pub fn summarize(transactions: &[Transaction]) -> Summary {
    let (total_income, total_expense) =
        transactions
            .iter()
            .fold((Decimal::ZERO, Decimal::ZERO), |(income, expense), tx| {
                if tx.is_income() {
                    (income + tx.amount, expense)
                } else {
                    (income, expense + tx.amount)
                }
            });
    let balance = total_income - total_expense;

    Summary {
        total_income,
        total_expense,
        balance,
        savings_rate: percent_of(balance, total_income),
        transaction_count: transactions.len(),
    }
}

/// Expense totals per category, largest first (ties by name).
///
/// Category names match case-insensitively, as in [`budget_status`]; a
/// group is labelled with the first spelling seen.
pub fn expense_by_category(transactions: &[Transaction]) -> Vec<CategoryTotal> {
    let mut totals: BTreeMap<String, (&str, Decimal)> = BTreeMap::new();
    for tx in transactions.iter().filter(|tx| tx.is_expense()) {
        totals
            .entry(tx.category.to_lowercase())
            .or_insert((tx.category.as_str(), Decimal::ZERO))
            .1 += tx.amount;
    }
    let grand_total: Decimal = totals.values().map(|(_, total)| *total).sum();

    let mut rows: Vec<CategoryTotal> = totals
        .into_values()
        .map(|(category, total)| CategoryTotal {
            category: category.to_string(),
            total,
            share: percent_of(total, grand_total),
        })
        .collect();
    // BTreeMap order already sorts names; a stable sort keeps it for ties
    rows.sort_by(|a, b| b.total.cmp(&a.total));
    rows
}

/// Income, expense and net per calendar month, oldest first.
pub fn monthly_trend(transactions: &[Transaction]) -> Vec<MonthlyTotals> {
    let mut months: BTreeMap<(i32, u32), (Decimal, Decimal)> = BTreeMap::new();
    for tx in transactions {
        let entry = months
            .entry((tx.date.year(), tx.date.month()))
            .or_default();
        if tx.is_income() {
            entry.0 += tx.amount;
        } else {
            entry.1 += tx.amount;
        }
    }

    months
        .into_iter()
        .map(|((year, month), (income, expense))| MonthlyTotals {
            month: format!("{year:04}-{month:02}"),
            income,
            expense,
            net: income - expense,
        })
        .collect()
}

/// Transactions dated within the given calendar month.
pub fn filter_month(
    transactions: &[Transaction],
    year: i32,
    month: u32,
) -> Vec<Transaction> {
    transactions
        .iter()
        .filter(|tx| tx.date.year() == year && tx.date.month() == month)
        .cloned()
        .collect()
}

/// Compare each budget category with the expenses recorded against it.
///
/// Category names match case-insensitively. Only transactions inside the
/// month containing `month_of` count.
pub fn budget_status(
    categories: &[BudgetCategory],
    transactions: &[Transaction],
    month_of: NaiveDate,
) -> BudgetStatus {
    let in_month = filter_month(transactions, month_of.year(), month_of.month());

    let mut spent_by_category: BTreeMap<String, Decimal> = BTreeMap::new();
    let mut income = Decimal::ZERO;
    for tx in &in_month {
        if tx.is_income() {
            income += tx.amount;
        } else {
            *spent_by_category
                .entry(tx.category.to_lowercase())
                .or_default() += tx.amount;
        }
    }

    let lines: Vec<BudgetLine> = categories
        .iter()
        .map(|category| {
            let spent = spent_by_category
                .get(&category.name.to_lowercase())
                .copied()
                .unwrap_or_default();
            BudgetLine {
                category: category.clone(),
                spent,
                remaining: category.allocated - spent,
                percent_used: percent_of(spent, category.allocated),
                over_budget: spent > category.allocated,
            }
        })
        .collect();

    let total_allocated: Decimal = categories.iter().map(|c| c.allocated).sum();
    let total_spent: Decimal = lines.iter().map(|l| l.spent).sum();

    BudgetStatus {
        lines,
        total_allocated,
        total_spent,
        income,
        unallocated: income - total_allocated,
    }
}
