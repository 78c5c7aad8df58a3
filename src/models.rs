//! Core data models for the financial query agent

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Category tag used by recurring subscription charges
pub const SUBSCRIPTION_CATEGORY: &str = "SUBSCRIPTION";

//
// ================= Accounts =================
//

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub date: NaiveDate,
    pub description: String,
    /// Negative for expenses
    pub amount: f64,
    pub category: String,
    /// Empty until tagged by the account provider
    #[serde(default)]
    pub account_type: String,
}

impl Transaction {
    pub fn is_subscription(&self) -> bool {
        self.category == SUBSCRIPTION_CATEGORY
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: String,
    #[serde(rename = "type")]
    pub account_type: String,
    pub balance: f64,
    pub transactions: Vec<Transaction>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AccountSummary {
    #[serde(rename = "type")]
    pub account_type: String,
    pub balance: f64,
    pub transaction_count: usize,
}

impl From<&Account> for AccountSummary {
    fn from(account: &Account) -> Self {
        Self {
            account_type: account.account_type.clone(),
            balance: account.balance,
            transaction_count: account.transactions.len(),
        }
    }
}

//
// ================= Snapshot =================
//

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DateRange {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotSummary {
    pub total_balance: f64,
    pub total_transactions: usize,
    pub date_range: DateRange,
}

/// Read-only bundle of account data handed to the router per request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinancialSnapshot {
    pub transactions: Vec<Transaction>,
    pub accounts: Vec<AccountSummary>,
    pub summary: SnapshotSummary,
}

impl FinancialSnapshot {
    pub fn assemble(accounts: &[Account], transactions: Vec<Transaction>) -> Self {
        let date_range = DateRange {
            start: transactions.iter().map(|t| t.date).min(),
            end: transactions.iter().map(|t| t.date).max(),
        };

        let summary = SnapshotSummary {
            total_balance: accounts.iter().map(|a| a.balance).sum(),
            total_transactions: transactions.len(),
            date_range,
        };

        Self {
            transactions,
            accounts: accounts.iter().map(AccountSummary::from).collect(),
            summary,
        }
    }
}

//
// ================= Daemon =================
//

/// One entry of the daemon's model listing
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ModelDescriptor {
    pub name: String,
    #[serde(default)]
    pub model: Option<String>,
}

impl ModelDescriptor {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            model: None,
        }
    }
}

/// Non-empty model name; the only way into `ConnectionState::Ready`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelName(String);

impl ModelName {
    pub fn new(name: impl Into<String>) -> Option<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            None
        } else {
            Some(Self(name))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ModelName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionState {
    Uninitialized,
    Verifying,
    Ready(ModelName),
    Unreachable,
}

impl ConnectionState {
    pub fn model(&self) -> Option<&ModelName> {
        match self {
            ConnectionState::Ready(model) => Some(model),
            _ => None,
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionState::Uninitialized => write!(f, "uninitialized"),
            ConnectionState::Verifying => write!(f, "verifying"),
            ConnectionState::Ready(model) => write!(f, "ready ({})", model),
            ConnectionState::Unreachable => write!(f, "unreachable"),
        }
    }
}

//
// ================= Query Result =================
//

pub const APOLOGY: &str = "I apologize, but I encountered an error while processing your request. \
Please make sure Ollama is running and try again.";

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct QueryResult {
    pub text: String,
    #[serde(skip)]
    pub failed: bool,
}

impl QueryResult {
    pub fn answered(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            failed: false,
        }
    }

    pub fn apology() -> Self {
        Self {
            text: APOLOGY.to_string(),
            failed: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tx(date: &str, amount: f64, category: &str) -> Transaction {
        Transaction {
            date: date.parse().unwrap(),
            description: "test".to_string(),
            amount,
            category: category.to_string(),
            account_type: "CHECKING".to_string(),
        }
    }

    #[test]
    fn test_model_name_rejects_blank() {
        assert!(ModelName::new("").is_none());
        assert!(ModelName::new("   ").is_none());
        assert_eq!(ModelName::new("llama3:latest").unwrap().as_str(), "llama3:latest");
    }

    #[test]
    fn test_snapshot_summary() {
        let account = Account {
            id: "a1".to_string(),
            account_type: "CHECKING".to_string(),
            balance: 120.5,
            transactions: vec![tx("2024-03-15", -10.0, "FOOD"), tx("2024-03-01", 50.0, "INCOME")],
        };
        let snapshot = FinancialSnapshot::assemble(
            std::slice::from_ref(&account),
            account.transactions.clone(),
        );

        assert_eq!(snapshot.summary.total_transactions, 2);
        assert_eq!(snapshot.summary.total_balance, 120.5);
        assert_eq!(snapshot.summary.date_range.start, NaiveDate::from_ymd_opt(2024, 3, 1));
        assert_eq!(snapshot.summary.date_range.end, NaiveDate::from_ymd_opt(2024, 3, 15));
        assert_eq!(snapshot.accounts[0].transaction_count, 2);
    }

    #[test]
    fn test_transaction_wire_format() {
        let json = serde_json::to_value(tx("2024-03-15", -15.99, "SUBSCRIPTION")).unwrap();
        assert_eq!(json["date"], "2024-03-15");
        assert_eq!(json["accountType"], "CHECKING");
    }

    #[test]
    fn test_empty_snapshot_has_open_date_range() {
        let snapshot = FinancialSnapshot::assemble(&[], vec![]);
        assert_eq!(snapshot.summary.date_range, DateRange::default());
    }
}
