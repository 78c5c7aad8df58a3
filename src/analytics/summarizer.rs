//! Deterministic transaction summaries
//!
//! Answers the canned queries without touching the model.

use super::table;
use crate::models::Transaction;
use chrono::{Datelike, NaiveDate};

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MonthlySummary {
    pub income: f64,
    pub expenses: f64,
    pub subscriptions: f64,
}

impl MonthlySummary {
    pub fn net(&self) -> f64 {
        self.income - self.expenses
    }
}

/// `$15.99`, `-$3.50`
pub fn format_currency(amount: f64) -> String {
    if amount < 0.0 {
        format!("-${:.2}", amount.abs())
    } else {
        format!("${:.2}", amount)
    }
}

/// Subscription charges (category SUBSCRIPTION, negative amount)
pub fn subscriptions(transactions: &[Transaction]) -> impl Iterator<Item = &Transaction> {
    transactions
        .iter()
        .filter(|t| t.is_subscription() && t.amount < 0.0)
}

pub fn subscriptions_table(transactions: &[Transaction]) -> String {
    let mut rows = vec![vec![
        "Service".to_string(),
        "Amount".to_string(),
        "Last Charged".to_string(),
        "Account".to_string(),
    ]];

    rows.extend(subscriptions(transactions).map(|s| {
        vec![
            s.description.clone(),
            format_currency(s.amount.abs()),
            s.date.to_string(),
            s.account_type.clone(),
        ]
    }));

    table::render(&rows)
}

/// Totals over transactions in the same calendar month as `today`
pub fn monthly_summary(transactions: &[Transaction], today: NaiveDate) -> MonthlySummary {
    transactions
        .iter()
        .filter(|t| t.date.year() == today.year() && t.date.month() == today.month())
        .fold(MonthlySummary::default(), |mut summary, t| {
            if t.amount > 0.0 {
                summary.income += t.amount;
            } else {
                summary.expenses += t.amount.abs();
                if t.is_subscription() {
                    summary.subscriptions += t.amount.abs();
                }
            }
            summary
        })
}

pub fn monthly_summary_table(transactions: &[Transaction], today: NaiveDate) -> String {
    let summary = monthly_summary(transactions, today);

    let rows = [
        ("Category", "Amount".to_string()),
        ("Total Income", format_currency(summary.income)),
        ("Total Expenses", format_currency(summary.expenses)),
        ("Subscription Expenses", format_currency(summary.subscriptions)),
        ("Net", format_currency(summary.net())),
    ]
    .into_iter()
    .map(|(label, value)| vec![label.to_string(), value])
    .collect::<Vec<_>>();

    table::render(&rows)
}
