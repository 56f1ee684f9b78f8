//! fatura-core: category table and finalized transaction types

pub mod category;
pub mod transaction;

pub use category::{Category, CategoryLabel, UnknownLabel};
pub use transaction::{CategoryTotal, DailyTotal, StatementResult, Transaction, DATE_FORMAT};
