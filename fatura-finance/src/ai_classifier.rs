//! Batch classification through a chat-completion model.
//!
//! One request per statement: every transaction becomes one line of the
//! user message, and the model answers one `"<icon> <label>"` line per
//! transaction, matched back by position. Any failure degrades to the
//! default category for the whole batch.

use anyhow::Result;
use async_trait::async_trait;
use fatura_core::{Category, CategoryLabel, Transaction};
use fatura_ingest::ParsedTransaction;
use tracing::{debug, warn};

pub const SYSTEM_PROMPT: &str = "You are a transaction categorizer. You will receive multiple transactions and should categorize each one.

For each transaction, respond with the category icon and label on a new line, in the same order as the transactions. For example:
\"🍽️ Alimentação\"
If unsure about any transaction, use \"💳 Outros\".";

/// A remote chat model taking a system instruction and one user message.
#[async_trait]
pub trait ChatCompletion: Send + Sync {
    async fn complete(&self, system: &str, user: &str) -> Result<String>;
}

/// One line per transaction: name and amount.
pub fn build_batch(txns: &[ParsedTransaction]) -> String {
    txns.iter()
        .map(|t| format!("Transaction: \"{}\" - Amount: R$ {:.2}", t.name, t.amount))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Resolve one response line, e.g. `🍔 iFood` or `"🍽️ Alimentação"`.
/// The icon is not trusted; the label selects the interned category.
fn parse_line(line: &str) -> Option<&'static Category> {
    let line = line.trim().trim_matches(|c: char| c == '"' || c == '\'').trim();
    let (_icon, label) = line.split_once(char::is_whitespace)?;
    let label: CategoryLabel = label.parse().ok()?;
    Some(label.category())
}

/// Map a response back onto `count` transactions by line position.
/// Missing or unrecognized lines take the default category.
pub fn parse_response(response: &str, count: usize) -> Vec<&'static Category> {
    let mut lines = response.trim().lines();
    (0..count)
        .map(|_| {
            lines
                .next()
                .and_then(parse_line)
                .unwrap_or_else(Category::default_category)
        })
        .collect()
}

fn with_categories(
    txns: Vec<ParsedTransaction>,
    categories: impl IntoIterator<Item = &'static Category>,
) -> Vec<Transaction> {
    txns.into_iter()
        .zip(categories)
        .map(|(t, category)| Transaction {
            date: t.date,
            name: t.name,
            amount: t.amount,
            category,
        })
        .collect()
}

pub struct AiClassifier {
    client: Box<dyn ChatCompletion>,
}

impl AiClassifier {
    pub fn new(client: Box<dyn ChatCompletion>) -> Self {
        Self { client }
    }

    /// Classify the whole batch with a single remote call. Never fails.
    pub async fn classify_all(&self, txns: Vec<ParsedTransaction>) -> Vec<Transaction> {
        if txns.is_empty() {
            return Vec::new();
        }

        let batch = build_batch(&txns);
        let categories = match self.client.complete(SYSTEM_PROMPT, &batch).await {
            Ok(response) => {
                debug!(%response, "AI classification response");
                parse_response(&response, txns.len())
            }
            Err(e) => {
                warn!(error = %e, count = txns.len(), "AI classification failed; using default category");
                vec![Category::default_category(); txns.len()]
            }
        };

        with_categories(txns, categories)
    }
}
