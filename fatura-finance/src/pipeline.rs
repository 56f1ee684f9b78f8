//! End-to-end statement processing:
//! Reading → ParsingPages → Classifying → Done.
//!
//! Only an unreadable or undecodable file fails the pipeline. Pages without
//! a transaction table, malformed rows and AI failures all degrade to
//! best-effort output.

use anyhow::{Context, Result};
use chrono::{Datelike, Local};
use fatura_core::{Category, StatementResult, Transaction};
use fatura_ingest::{
    extract_total, PageSource, ParsedTransaction, PdfDocument, SkipStats, StatementParser,
    TextFragment,
};
use std::fmt;
use std::path::Path;
use tracing::{debug, info, warn};

use crate::ai_classifier::{AiClassifier, ChatCompletion};
use crate::category_rules::{EngineOptions, RuleEngine};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Reading,
    ParsingPages,
    Classifying,
    Done,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Stage::Reading => "reading",
            Stage::ParsingPages => "parsing-pages",
            Stage::Classifying => "classifying",
            Stage::Done => "done",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineOptions {
    /// Classify through the chat model instead of the rule engine.
    pub use_ai: bool,
    /// Year stamped on `DD MMM` rows (default: current local year).
    pub year: Option<i32>,
    pub engine: EngineOptions,
}

/// Pipeline output plus parse accounting.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineOutcome {
    pub result: StatementResult,
    pub skipped: SkipStats,
    pub pages: usize,
    pub pages_with_table: usize,
}

pub struct StatementPipeline {
    parser: StatementParser,
    engine: RuleEngine,
    ai: Option<AiClassifier>,
    options: PipelineOptions,
}

impl StatementPipeline {
    pub fn new(engine: RuleEngine, options: PipelineOptions) -> Result<Self> {
        let year = options.year.unwrap_or_else(|| Local::now().year());
        Ok(Self {
            parser: StatementParser::new(year)?,
            engine,
            ai: None,
            options,
        })
    }

    /// Built-in rule catalog with the engine options from `options`.
    pub fn with_default_rules(options: PipelineOptions) -> Result<Self> {
        Self::new(RuleEngine::with_default_catalog(options.engine)?, options)
    }

    pub fn with_chat_client(mut self, client: Box<dyn ChatCompletion>) -> Self {
        self.ai = Some(AiClassifier::new(client));
        self
    }

    pub fn year(&self) -> i32 {
        self.parser.year()
    }

    /// Read a statement PDF from disk and process it.
    pub async fn run_file(&self, path: impl AsRef<Path>) -> Result<PipelineOutcome> {
        let path = path.as_ref();
        info!(stage = %Stage::Reading, path = %path.display());
        let bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("read {}", path.display()))?;

        let doc = PdfDocument::from_bytes(bytes);
        let pages = tokio::task::spawn_blocking(move || doc.pages())
            .await
            .context("PDF decoding task")?
            .with_context(|| format!("extract text from {}", path.display()))?;

        Ok(self.run_pages(&pages).await)
    }

    /// Process any fragment source (already-extracted pages, another extractor).
    pub async fn run_source(&self, source: &impl PageSource) -> Result<PipelineOutcome> {
        let pages = source.pages()?;
        Ok(self.run_pages(&pages).await)
    }

    /// Parse pages strictly in order, then classify the concatenated drafts once.
    pub async fn run_pages(&self, pages: &[Vec<TextFragment>]) -> PipelineOutcome {
        info!(stage = %Stage::ParsingPages, pages = pages.len(), year = self.year());

        let mut total = 0.0;
        let mut drafts: Vec<ParsedTransaction> = Vec::new();
        let mut skipped = SkipStats::default();
        let mut pages_with_table = 0;

        for (i, fragments) in pages.iter().enumerate() {
            if i == 0 {
                match extract_total(fragments) {
                    Some(t) => total = t,
                    None => debug!("no statement total on page 1"),
                }
            }

            let page = self.parser.parse_page(fragments);
            if page.has_table {
                pages_with_table += 1;
            }
            debug!(
                page = i + 1,
                has_table = page.has_table,
                transactions = page.transactions.len(),
                skipped = ?page.skipped,
                "parsed page"
            );
            drafts.extend(page.transactions);
            skipped += page.skipped;
        }

        if !skipped.is_empty() {
            info!(?skipped, "dropped fragments while parsing");
        }

        info!(stage = %Stage::Classifying, transactions = drafts.len(), use_ai = self.options.use_ai);
        let transactions = self.classify(drafts).await;

        info!(stage = %Stage::Done, total, transactions = transactions.len());
        PipelineOutcome {
            result: StatementResult { total, transactions },
            skipped,
            pages: pages.len(),
            pages_with_table,
        }
    }

    async fn classify(&self, drafts: Vec<ParsedTransaction>) -> Vec<Transaction> {
        if !self.options.use_ai {
            return self.engine.classify_all(drafts);
        }
        match &self.ai {
            Some(ai) => ai.classify_all(drafts).await,
            None => {
                warn!("AI classification requested without a chat client; using default category");
                drafts
                    .into_iter()
                    .map(|t| Transaction {
                        date: t.date,
                        name: t.name,
                        amount: t.amount,
                        category: Category::default_category(),
                    })
                    .collect()
            }
        }
    }
}
