//! Canned analytics
//!
//! Table rendering plus the subscription and monthly summaries served
//! without a model round-trip.

pub mod summarizer;
pub mod table;

pub use summarizer::{
    format_currency, monthly_summary, monthly_summary_table, subscriptions_table, MonthlySummary,
};
