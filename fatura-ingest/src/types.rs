use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::ops::AddAssign;

/// One piece of text emitted by the PDF text extractor. Only the order is
/// trusted; no coordinates or font data are carried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextFragment {
    /// Position in the page's emission order.
    pub index: usize,
    pub text: String,
}

impl TextFragment {
    /// Number a page's strings in emission order.
    pub fn sequence<I, S>(items: I) -> Vec<TextFragment>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        items
            .into_iter()
            .enumerate()
            .map(|(index, text)| TextFragment {
                index,
                text: text.into(),
            })
            .collect()
    }
}

/// A transaction being assembled by the parser.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransactionDraft {
    pub date: Option<NaiveDate>,
    pub name: Option<String>,
    pub amount: Option<f64>,
}

impl TransactionDraft {
    pub fn is_complete(&self) -> bool {
        self.date.is_some() && self.name.is_some() && self.amount.is_some()
    }

    /// Space-join a fragment onto the merchant name.
    pub fn push_name(&mut self, text: &str) {
        match self.name.as_mut() {
            Some(name) => {
                name.push(' ');
                name.push_str(text);
            }
            None => self.name = Some(text.to_string()),
        }
    }

    /// Finalize, or `None` if any field is still missing.
    pub fn finish(self) -> Option<ParsedTransaction> {
        Some(ParsedTransaction {
            date: self.date?,
            name: self.name?,
            amount: self.amount?,
        })
    }
}

/// A complete `(date, name, amount)` triple, not yet categorized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedTransaction {
    pub date: NaiveDate,
    pub name: String,
    /// Signed as printed: negative = charge, positive = credit.
    pub amount: f64,
}

/// What the parser dropped instead of emitting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SkipStats {
    /// Fragments containing "Estorno".
    pub reversals: usize,
    /// Drafts with a date that were superseded or ended the page incomplete.
    pub discarded_drafts: usize,
    /// Fragments shaped like an amount whose number did not parse.
    pub unparsed_amounts: usize,
    /// `DD MMM` fragments with an unknown month or impossible day.
    pub invalid_dates: usize,
    /// Fragments that arrived with no dated draft open.
    pub orphan_fragments: usize,
}

impl SkipStats {
    pub fn is_empty(&self) -> bool {
        *self == SkipStats::default()
    }
}

impl AddAssign for SkipStats {
    fn add_assign(&mut self, rhs: Self) {
        self.reversals += rhs.reversals;
        self.discarded_drafts += rhs.discarded_drafts;
        self.unparsed_amounts += rhs.unparsed_amounts;
        self.invalid_dates += rhs.invalid_dates;
        self.orphan_fragments += rhs.orphan_fragments;
    }
}

/// Output of parsing one page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageParse {
    /// Whether the page carried a transaction table header at all.
    pub has_table: bool,
    pub transactions: Vec<ParsedTransaction>,
    pub skipped: SkipStats,
}
