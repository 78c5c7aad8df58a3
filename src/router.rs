//! Query Router
//!
//! Routes a user query to one of:
//! - Subscriptions: canned table of recurring charges
//! - Monthly summary: canned income/expense totals for the current month
//! - Analysis: free-form question answered by the model

use crate::analytics::{monthly_summary_table, subscriptions_table};
use crate::inference::Generator;
use crate::models::{FinancialSnapshot, QueryResult};
use chrono::{Local, NaiveDate};
use std::sync::Arc;
use tracing::{error, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryRoute {
    Subscriptions,
    MonthlySummary,
    Analysis,
}

impl QueryRoute {
    pub fn classify(query: &str) -> Self {
        let query = query.to_lowercase();

        if query.contains("subscription") {
            QueryRoute::Subscriptions
        } else if query.contains("monthly summary") {
            QueryRoute::MonthlySummary
        } else {
            QueryRoute::Analysis
        }
    }
}

pub struct QueryRouter {
    generator: Arc<dyn Generator>,
}

impl QueryRouter {
    pub fn new(generator: Arc<dyn Generator>) -> Self {
        Self { generator }
    }

    /// Route against today's local date
    pub async fn handle(&self, query: &str, snapshot: &FinancialSnapshot) -> QueryResult {
        self.handle_on(query, snapshot, Local::now().date_naive())
            .await
    }

    /// Route with an explicit "today"; never returns an error
    pub async fn handle_on(
        &self,
        query: &str,
        snapshot: &FinancialSnapshot,
        today: NaiveDate,
    ) -> QueryResult {
        let route = QueryRoute::classify(query);
        info!(?route, "Routing query");

        match route {
            QueryRoute::Subscriptions => {
                QueryResult::answered(subscriptions_table(&snapshot.transactions))
            }
            QueryRoute::MonthlySummary => {
                QueryResult::answered(monthly_summary_table(&snapshot.transactions, today))
            }
            QueryRoute::Analysis => match self.generator.generate(query, snapshot).await {
                Ok(answer) => QueryResult::answered(answer),
                Err(e) => {
                    error!(error = %e, "Error processing query");
                    QueryResult::apology()
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AgentError;
    use crate::models::{Transaction, APOLOGY};
    use crate::Result;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct ScriptedGenerator {
        reply: Option<String>,
        calls: AtomicUsize,
    }

    #[async_trait::async_trait]
    impl Generator for ScriptedGenerator {
        async fn generate(&self, query: &str, _snapshot: &FinancialSnapshot) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.reply
                .clone()
                .map(|reply| format!("{} -> {}", query, reply))
                .ok_or_else(|| AgentError::NoModelSelected("pull a model".to_string()))
        }
    }

    fn router(reply: Option<&str>) -> (QueryRouter, Arc<ScriptedGenerator>) {
        let generator = Arc::new(ScriptedGenerator {
            reply: reply.map(str::to_string),
            calls: AtomicUsize::new(0),
        });
        (QueryRouter::new(generator.clone()), generator)
    }

    fn snapshot() -> FinancialSnapshot {
        let tx = |date: &str, description: &str, amount: f64, category: &str| Transaction {
            date: date.parse().unwrap(),
            description: description.to_string(),
            amount,
            category: category.to_string(),
            account_type: "CHECKING".to_string(),
        };
        FinancialSnapshot::assemble(
            &[],
            vec![
                tx("2024-03-15", "Netflix Subscription", -15.99, "SUBSCRIPTION"),
                tx("2024-03-13", "Salary Deposit", 3000.0, "INCOME"),
            ],
        )
    }

    fn march() -> NaiveDate {
        "2024-03-20".parse().unwrap()
    }

    #[test]
    fn test_classification() {
        assert_eq!(QueryRoute::classify("Show my SUBSCRIPTIONS"), QueryRoute::Subscriptions);
        assert_eq!(QueryRoute::classify("monthly summary please"), QueryRoute::MonthlySummary);
        assert_eq!(
            QueryRoute::classify("subscription monthly summary"),
            QueryRoute::Subscriptions
        );
        assert_eq!(QueryRoute::classify("how much did I earn?"), QueryRoute::Analysis);
        assert_eq!(QueryRoute::classify("monthly report"), QueryRoute::Analysis);
    }

    #[tokio::test]
    async fn test_subscriptions_skip_the_model() {
        let (router, generator) = router(Some("unused"));
        let result = router
            .handle_on("What subscriptions do I have?", &snapshot(), march())
            .await;

        assert!(!result.failed);
        assert!(result.text.contains("$15.99"));
        assert!(!result.text.contains("Salary"));
        assert_eq!(generator.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_monthly_summary_uses_given_month() {
        let (router, generator) = router(Some("unused"));

        let march_result = router.handle_on("Monthly Summary", &snapshot(), march()).await;
        assert!(march_result.text.contains("$3000.00"));

        let april = "2024-04-01".parse().unwrap();
        let april_result = router.handle_on("monthly summary", &snapshot(), april).await;
        assert!(!april_result.text.contains("$3000.00"));
        assert_eq!(generator.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_other_queries_go_to_the_model() {
        let (router, generator) = router(Some("looks healthy"));
        let result = router.handle_on("How am I doing?", &snapshot(), march()).await;

        assert_eq!(result, QueryResult::answered("How am I doing? -> looks healthy"));
        assert_eq!(generator.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_model_failure_becomes_apology() {
        let (router, _) = router(None);
        let result = router.handle("How am I doing?", &snapshot()).await;

        assert!(result.failed);
        assert_eq!(result.text, APOLOGY);
    }
}
