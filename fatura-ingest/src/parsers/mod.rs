//! Bank-specific statement parsers.

pub mod nubank;
