//! Prompt assembly and response cleanup for financial analysis

use crate::models::FinancialSnapshot;
use crate::Result;

const PREAMBLE: &str = r#"You are a financial analysis AI assistant. Your task is to analyze financial data and provide clear, structured responses.

Instructions:
1. When showing financial data, use markdown tables
2. For currency values, always show 2 decimal places
3. Provide brief explanations with your analysis
4. Focus on the specific user query"#;

const TRANSACTION_FIELDS: &str = r#"Transaction Fields:
- date: Transaction date
- description: Transaction description
- amount: Transaction amount (negative for expenses)
- category: Transaction category
- accountType: Type of account"#;

/// Build the single composed prompt sent to the daemon
pub fn build_analysis_prompt(query: &str, snapshot: &FinancialSnapshot) -> Result<String> {
    let account_listing = snapshot
        .accounts
        .iter()
        .map(|account| {
            format!(
                "- {}: {} transactions",
                account.account_type.to_uppercase(),
                account.transaction_count
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    let data = serde_json::to_string_pretty(snapshot)?;

    Ok(format!(
        "{}\n\nAvailable Account Types and Data:\n{}\n\n{}\n\nUser Question: {}\n\nAvailable Data:\n{}\n\nPlease analyze the data and respond to the user's question.",
        PREAMBLE, account_listing, TRANSACTION_FIELDS, query, data
    ))
}

/// Trim and drop fenced-code delimiters (```markdown and bare ```)
pub fn clean_response(raw: &str) -> String {
    let without_markdown = strip_fence(raw.trim(), "```markdown");
    strip_fence(&without_markdown, "```").trim().to_string()
}

/// Remove every occurrence of `fence` together with one trailing newline
fn strip_fence(text: &str, fence: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(idx) = rest.find(fence) {
        out.push_str(&rest[..idx]);
        rest = &rest[idx + fence.len()..];
        rest = rest.strip_prefix('\n').unwrap_or(rest);
    }

    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Account, Transaction};

    fn snapshot() -> FinancialSnapshot {
        let tx = Transaction {
            date: "2024-03-15".parse().unwrap(),
            description: "Netflix Subscription".to_string(),
            amount: -15.99,
            category: "SUBSCRIPTION".to_string(),
            account_type: "checking".to_string(),
        };
        let account = Account {
            id: "check123".to_string(),
            account_type: "checking".to_string(),
            balance: 5000.0,
            transactions: vec![tx.clone()],
        };
        FinancialSnapshot::assemble(&[account], vec![tx])
    }

    #[test]
    fn test_prompt_sections() {
        let prompt = build_analysis_prompt("How much did I spend?", &snapshot()).unwrap();

        assert!(prompt.starts_with("You are a financial analysis AI assistant."));
        assert!(prompt.contains("- CHECKING: 1 transactions"));
        assert!(prompt.contains("- accountType: Type of account"));
        assert!(prompt.contains("User Question: How much did I spend?"));
        assert!(prompt.contains("\"description\": \"Netflix Subscription\""));
        assert!(prompt.contains("\"totalTransactions\": 1"));
    }

    #[test]
    fn test_clean_markdown_fence() {
        assert_eq!(clean_response("```markdown\nHello```"), "Hello");
    }

    #[test]
    fn test_clean_bare_fences_and_whitespace() {
        let raw = "  \n```\n| a | b |\n|---|---|\n```\n\nDone.  ";
        assert_eq!(clean_response(raw), "| a | b |\n|---|---|\n\nDone.");
    }

    #[test]
    fn test_clean_leaves_plain_text_alone() {
        let raw = "Your balance is $5000.00.\nNo fences here.";
        assert_eq!(clean_response(raw), raw);
    }
}
