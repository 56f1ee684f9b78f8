//! Nubank credit-card statement parser (fragment stream)
//!
//! Expected fragments after PDF-to-text, in emission order:
//!   ... "O pagamento mínimo é no valor de"  "R$ 1.500,00" ...       (page 1)
//!   "TRANSAÇÕES"  <3 column headers>
//!   "05 MAR"  "PADARIA"  "SAO JOSE"  "-R$ 12,00"
//!   "06 MAR"  "NETFLIX.COM"  "-R$ 39,90"
//!
//! Rows only carry `DD MMM`, so the caller supplies the statement year.

use anyhow::Result;
use chrono::NaiveDate;
use regex::Regex;
use tracing::debug;

use crate::types::{PageParse, TextFragment, TransactionDraft};

/// Page-1 phrase immediately preceding the printed statement total.
pub const TOTAL_ANCHOR: &str = "no valor de";
/// Fragment that opens the transaction table.
pub const TABLE_HEADER: &str = "TRANSAÇÕES";
/// Rows start this many fragments after the header (header + column titles).
const TABLE_OFFSET: usize = 4;
const REVERSAL_MARKER: &str = "Estorno";

fn month_number(abbr: &str) -> Option<u32> {
    let month = match abbr {
        "JAN" => 1,
        "FEV" => 2,
        "MAR" => 3,
        "ABR" => 4,
        "MAI" => 5,
        "JUN" => 6,
        "JUL" => 7,
        "AGO" => 8,
        "SET" => 9,
        "OUT" => 10,
        "NOV" => 11,
        "DEZ" => 12,
        _ => return None,
    };
    Some(month)
}

/// Parse a statement-formatted amount: `"-R$ 1.234,56"` → `-1234.56`,
/// `"R$ 9,90"` → `9.9`, `"1.500,00"` → `1500.0`.
///
/// `.` is the thousands separator and `,` the decimal separator.
pub fn parse_brl_amount(text: &str) -> Option<f64> {
    let text = text.trim();
    let (negative, rest) = match text.strip_prefix('-') {
        Some(rest) => (true, rest.trim_start()),
        None => (false, text),
    };
    let digits = rest.strip_prefix("R$").unwrap_or(rest).trim();
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit() || c == '.' || c == ',') {
        return None;
    }

    let value: f64 = digits.replace('.', "").replacen(',', ".", 1).parse().ok()?;
    Some(if negative { -value } else { value })
}

/// Locate the printed total: the fragment right after the one containing
/// [`TOTAL_ANCHOR`]. `None` when the anchor or a parseable amount is missing.
pub fn extract_total(fragments: &[TextFragment]) -> Option<f64> {
    let anchor = fragments
        .iter()
        .position(|f| f.text.contains(TOTAL_ANCHOR))?;
    let amount = fragments.get(anchor + 1)?;
    parse_brl_amount(&amount.text)
}

/// Recovers `(date, name, amount)` triples from a page's fragment stream.
#[derive(Debug, Clone)]
pub struct StatementParser {
    year: i32,
    date_re: Regex,
    amount_re: Regex,
}

impl StatementParser {
    pub fn new(year: i32) -> Result<Self> {
        Ok(Self {
            year,
            date_re: Regex::new(r"^(?P<day>\d{2})\s+(?P<month>[A-Z]{3})$")?,
            amount_re: Regex::new(r"^-?R\$\s*\d+(?:[.,]\d+)*$")?,
        })
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    /// `29 FEV` in a non-leap statement year lands on the closest earlier
    /// leap year; only an unknown month or a day the month never has fails.
    fn parse_date(&self, day: &str, month: &str) -> Option<NaiveDate> {
        let month = month_number(month)?;
        let day: u32 = day.parse().ok()?;
        (0..4).find_map(|back| NaiveDate::from_ymd_opt(self.year - back, month, day))
    }

    /// Parse one page. Pages without the [`TABLE_HEADER`] fragment yield an
    /// empty result with `has_table == false`. Incomplete drafts are dropped
    /// and counted in `skipped`, never surfaced as errors.
    pub fn parse_page(&self, fragments: &[TextFragment]) -> PageParse {
        let Some(header) = fragments.iter().position(|f| f.text == TABLE_HEADER) else {
            return PageParse::default();
        };

        let mut page = PageParse {
            has_table: true,
            ..PageParse::default()
        };
        let mut draft = TransactionDraft::default();

        for fragment in fragments.iter().skip(header + TABLE_OFFSET) {
            let text = fragment.text.trim();
            if text.is_empty() {
                continue;
            }

            if text.contains(REVERSAL_MARKER) {
                page.skipped.reversals += 1;
                continue;
            }

            if let Some(caps) = self.date_re.captures(text) {
                let previous = std::mem::take(&mut draft);
                if previous.date.is_some() {
                    match previous.finish() {
                        Some(txn) => page.transactions.push(txn),
                        None => page.skipped.discarded_drafts += 1,
                    }
                }

                match self.parse_date(&caps["day"], &caps["month"]) {
                    Some(date) => draft.date = Some(date),
                    None => {
                        debug!(fragment = fragment.index, text, "unrecognized row date");
                        page.skipped.invalid_dates += 1;
                    }
                }
                continue;
            }

            if draft.date.is_none() {
                page.skipped.orphan_fragments += 1;
                continue;
            }

            if self.amount_re.is_match(text) {
                match parse_brl_amount(text) {
                    Some(amount) => {
                        draft.amount = Some(amount);
                        if draft.name.is_some() {
                            if let Some(txn) = std::mem::take(&mut draft).finish() {
                                page.transactions.push(txn);
                            }
                        }
                    }
                    None => {
                        debug!(fragment = fragment.index, text, "unparseable amount");
                        page.skipped.unparsed_amounts += 1;
                    }
                }
                continue;
            }

            if draft.amount.is_none() {
                draft.push_name(text);
            } else {
                page.skipped.orphan_fragments += 1;
            }
        }

        if draft.is_complete() {
            page.transactions.extend(draft.finish());
        } else if draft.date.is_some() {
            page.skipped.discarded_drafts += 1;
        }

        page
    }
}
