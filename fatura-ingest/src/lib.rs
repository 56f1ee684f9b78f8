//! fatura-ingest: statement PDF text extraction and the fragment-stream parser.

pub mod types;
pub mod parsers;
pub mod pdf;

pub use types::{PageParse, ParsedTransaction, SkipStats, TextFragment, TransactionDraft};
pub use parsers::nubank::{StatementParser, extract_total, parse_brl_amount};
pub use pdf::{PageSource, PdfDocument};
