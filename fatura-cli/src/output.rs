use anyhow::{Context, Result};
use clap::ValueEnum;
use fatura_core::{StatementResult, Transaction, DATE_FORMAT};
use fatura_finance::PipelineOutcome;
use serde::Serialize;
use std::io::Write;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Format {
    Table,
    Json,
    Csv,
}

/// Flat CSV row; the category is spread into columns.
#[derive(Debug, Serialize, PartialEq)]
struct CsvRow<'a> {
    date: String,
    name: &'a str,
    amount: String,
    category: &'static str,
    icon: &'static str,
    color: &'static str,
}

impl<'a> From<&'a Transaction> for CsvRow<'a> {
    fn from(t: &'a Transaction) -> Self {
        Self {
            date: t.date_string(),
            name: &t.name,
            amount: format!("{:.2}", t.amount),
            category: t.category.label.as_str(),
            icon: t.category.icon,
            color: t.category.color,
        }
    }
}

pub fn write_csv<W: Write>(result: &StatementResult, out: W) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(out);
    for t in &result.transactions {
        wtr.serialize(CsvRow::from(t)).context("write csv row")?;
    }
    wtr.flush().context("flush csv")?;
    Ok(())
}

pub fn print_json(result: &StatementResult) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(result)?);
    Ok(())
}

pub fn print_table(outcome: &PipelineOutcome) {
    let result = &outcome.result;
    println!(
        "Statement total: R$ {:.2} | {} transactions (sum R$ {:.2}) | {} of {} pages with a transaction table\n",
        result.total,
        result.transactions.len(),
        result.transactions_sum(),
        outcome.pages_with_table,
        outcome.pages,
    );

    println!("{:<10}  {:>10}  {:<18}  NAME", "DATE", "AMOUNT", "CATEGORY");
    for t in &result.transactions {
        println!(
            "{:<10}  {:>10.2}  {:<18}  {}",
            t.date_string(),
            t.amount,
            t.category.to_string(),
            t.name
        );
    }

    let totals = result.category_totals();
    if !totals.is_empty() {
        println!("\nBy category:");
        for c in totals {
            println!("  {:<18} {:>4}  R$ {:>10.2}", c.category.to_string(), c.count, c.amount);
        }
    }

    let days = result.daily_totals();
    if !days.is_empty() {
        println!("\nBy day:");
        for d in days {
            println!(
                "  {}  R$ {:>10.2}  running R$ {:>10.2}",
                d.date.format(DATE_FORMAT),
                d.amount,
                d.running_total
            );
        }
    }

    let s = outcome.skipped;
    if !s.is_empty() {
        println!(
            "\nSkipped: {} reversals, {} incomplete rows, {} bad amounts, {} bad dates, {} stray fragments",
            s.reversals, s.discarded_drafts, s.unparsed_amounts, s.invalid_dates, s.orphan_fragments
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use fatura_core::CategoryLabel;

    #[test]
    fn test_csv_has_header_and_flat_category() {
        let result = StatementResult {
            total: 23.5,
            transactions: vec![Transaction {
                date: NaiveDate::from_ymd_opt(2025, 3, 5).unwrap(),
                name: "UBER, TRIP".to_string(),
                amount: -23.5,
                category: CategoryLabel::Transporte.category(),
            }],
        };
        let mut buf = Vec::new();
        write_csv(&result, &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("date,name,amount,category,icon,color"));
        assert_eq!(lines.next(), Some("05/03/2025,\"UBER, TRIP\",-23.50,Transporte,🚗,#3B82F6"));
    }
}
