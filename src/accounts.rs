//! Account data provider
//!
//! Read-only access to accounts and their transactions.
//! Currently backed by seeded in-memory data.

use crate::models::{Account, FinancialSnapshot, Transaction};
use crate::Result;
use chrono::NaiveDate;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Trait for account data access
#[async_trait::async_trait]
pub trait AccountProvider: Send + Sync {
    async fn get_accounts(&self) -> Result<Vec<Account>>;
    /// Transactions of one account; empty for unknown ids
    async fn get_transactions(&self, account_id: &str) -> Result<Vec<Transaction>>;
    /// Every transaction, tagged with its account type
    async fn get_all_transactions(&self) -> Result<Vec<Transaction>>;

    async fn snapshot(&self) -> Result<FinancialSnapshot> {
        let transactions = self.get_all_transactions().await?;
        let accounts = self.get_accounts().await?;
        Ok(FinancialSnapshot::assemble(&accounts, transactions))
    }
}

/// In-memory account store for development
pub struct InMemoryAccountService {
    accounts: Arc<RwLock<Vec<Account>>>,
}

impl InMemoryAccountService {
    pub fn new(accounts: Vec<Account>) -> Self {
        Self {
            accounts: Arc::new(RwLock::new(accounts)),
        }
    }

    /// Checking and savings accounts with a handful of March 2024 entries
    pub fn seeded() -> Self {
        Self::new(vec![
            Account {
                id: "check123".to_string(),
                account_type: "CHECKING".to_string(),
                balance: 5000.0,
                transactions: vec![
                    seed_tx((2024, 3, 15), "Netflix Subscription", -15.99, "SUBSCRIPTION"),
                    seed_tx((2024, 3, 14), "YouTube Premium", -11.99, "SUBSCRIPTION"),
                    seed_tx((2024, 3, 13), "Salary Deposit", 3000.0, "INCOME"),
                ],
            },
            Account {
                id: "save456".to_string(),
                account_type: "SAVINGS".to_string(),
                balance: 10000.0,
                transactions: vec![seed_tx((2024, 3, 10), "Interest Credit", 5.5, "INTEREST")],
            },
        ])
    }
}

impl Default for InMemoryAccountService {
    fn default() -> Self {
        Self::seeded()
    }
}

fn seed_tx(ymd: (i32, u32, u32), description: &str, amount: f64, category: &str) -> Transaction {
    Transaction {
        date: NaiveDate::from_ymd_opt(ymd.0, ymd.1, ymd.2).unwrap_or_default(),
        description: description.to_string(),
        amount,
        category: category.to_string(),
        account_type: String::new(),
    }
}

#[async_trait::async_trait]
impl AccountProvider for InMemoryAccountService {
    async fn get_accounts(&self) -> Result<Vec<Account>> {
        Ok(self.accounts.read().await.clone())
    }

    async fn get_transactions(&self, account_id: &str) -> Result<Vec<Transaction>> {
        let accounts = self.accounts.read().await;

        Ok(accounts
            .iter()
            .find(|account| account.id == account_id)
            .map(|account| account.transactions.clone())
            .unwrap_or_default())
    }

    async fn get_all_transactions(&self) -> Result<Vec<Transaction>> {
        let accounts = self.accounts.read().await;

        Ok(accounts
            .iter()
            .flat_map(|account| {
                account.transactions.iter().map(move |t| Transaction {
                    account_type: account.account_type.clone(),
                    ..t.clone()
                })
            })
            .collect())
    }
}
