//! Finalized statement records: the only values that outlive a parse.

use chrono::NaiveDate;
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;

use crate::category::Category;

/// Statement dates are printed `DD/MM/YYYY`.
pub const DATE_FORMAT: &str = "%d/%m/%Y";

fn serialize_date<S: Serializer>(date: &NaiveDate, s: S) -> Result<S::Ok, S::Error> {
    s.collect_str(&date.format(DATE_FORMAT))
}

/// A categorized purchase line from a card statement.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Transaction {
    #[serde(serialize_with = "serialize_date")]
    pub date: NaiveDate,
    pub name: String,
    /// Signed as printed on the statement: negative = charge, positive = credit.
    pub amount: f64,
    pub category: &'static Category,
}

impl Transaction {
    pub fn date_string(&self) -> String {
        self.date.format(DATE_FORMAT).to_string()
    }
}

/// Terminal artifact of a statement parse.
#[derive(Debug, Clone, PartialEq, Serialize, Default)]
pub struct StatementResult {
    /// Printed statement total, or 0 when the anchor was never found.
    pub total: f64,
    pub transactions: Vec<Transaction>,
}

/// Per-category rollup used by summaries.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryTotal {
    pub category: &'static Category,
    pub count: usize,
    /// Sum of absolute amounts: credits add to their category like charges.
    pub amount: f64,
}

/// Per-day rollup with the running total up to and including that day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyTotal {
    #[serde(serialize_with = "serialize_date")]
    pub date: NaiveDate,
    /// Signed net of the day's transactions.
    pub amount: f64,
    pub running_total: f64,
}

impl StatementResult {
    /// Sum of transaction amounts (signed).
    pub fn transactions_sum(&self) -> f64 {
        self.transactions.iter().map(|t| t.amount).sum()
    }

    /// Totals grouped by category, largest spend first.
    /// Categories appear at most once; ties keep first-seen order.
    pub fn category_totals(&self) -> Vec<CategoryTotal> {
        let mut totals: Vec<CategoryTotal> = Vec::new();
        for t in &self.transactions {
            match totals.iter_mut().find(|c| std::ptr::eq(c.category, t.category)) {
                Some(c) => {
                    c.count += 1;
                    c.amount += t.amount.abs();
                }
                None => totals.push(CategoryTotal {
                    category: t.category,
                    count: 1,
                    amount: t.amount.abs(),
                }),
            }
        }
        totals.sort_by(|a, b| b.amount.total_cmp(&a.amount));
        totals
    }

    /// Net amount per calendar day in date order, with a running total.
    pub fn daily_totals(&self) -> Vec<DailyTotal> {
        let mut by_day: BTreeMap<NaiveDate, f64> = BTreeMap::new();
        for t in &self.transactions {
            *by_day.entry(t.date).or_default() += t.amount;
        }

        let mut running_total = 0.0;
        by_day
            .into_iter()
            .map(|(date, amount)| {
                running_total += amount;
                DailyTotal { date, amount, running_total }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::category::CategoryLabel;

    fn txn(day: u32, name: &str, amount: f64, label: CategoryLabel) -> Transaction {
        Transaction {
            date: NaiveDate::from_ymd_opt(2025, 3, day).unwrap(),
            name: name.to_string(),
            amount,
            category: label.category(),
        }
    }

    #[test]
    fn test_date_serializes_day_first() {
        let t = txn(5, "UBER", -23.5, CategoryLabel::Transporte);
        let v = serde_json::to_value(&t).unwrap();
        assert_eq!(v["date"], "05/03/2025");
        assert_eq!(v["category"]["label"], "Transporte");
        assert_eq!(t.date_string(), "05/03/2025");
    }

    #[test]
    fn test_category_totals_groups_and_orders() {
        let result = StatementResult {
            total: 120.0,
            transactions: vec![
                txn(1, "UBER", -20.0, CategoryLabel::Transporte),
                txn(2, "NETFLIX.COM", -39.9, CategoryLabel::Streaming),
                txn(3, "99 POP", -25.0, CategoryLabel::Transporte),
            ],
        };
        let totals = result.category_totals();
        assert_eq!(totals.len(), 2);
        assert_eq!(totals[0].category.label, CategoryLabel::Transporte);
        assert_eq!(totals[0].count, 2);
        assert!((totals[0].amount - 45.0).abs() < 1e-9);
        assert_eq!(totals[1].category.label, CategoryLabel::Streaming);
        assert!((result.transactions_sum() + 84.9).abs() < 1e-9);
    }

    #[test]
    fn test_credit_adds_to_its_category_spend() {
        let result = StatementResult {
            total: 0.0,
            transactions: vec![
                txn(1, "MERCADO", -100.0, CategoryLabel::Mercado),
                txn(2, "MERCADO", 30.0, CategoryLabel::Mercado),
                txn(3, "UBER", -120.0, CategoryLabel::Transporte),
            ],
        };
        let totals = result.category_totals();
        assert_eq!(totals[0].category.label, CategoryLabel::Mercado);
        assert_eq!(totals[0].count, 2);
        assert!((totals[0].amount - 130.0).abs() < 1e-9);
        assert!((totals[1].amount - 120.0).abs() < 1e-9);
    }

    #[test]
    fn test_daily_totals_sorted_with_running_total() {
        let result = StatementResult {
            total: 0.0,
            transactions: vec![
                txn(6, "NETFLIX.COM", -40.0, CategoryLabel::Streaming),
                txn(5, "UBER", -20.0, CategoryLabel::Transporte),
                txn(6, "ESTACIONAMENTO", -10.0, CategoryLabel::Transporte),
            ],
        };
        let days = result.daily_totals();
        assert_eq!(days.len(), 2);
        assert_eq!(days[0].date, NaiveDate::from_ymd_opt(2025, 3, 5).unwrap());
        assert_eq!(days[0].amount, -20.0);
        assert_eq!(days[0].running_total, -20.0);
        assert_eq!(days[1].amount, -50.0);
        assert_eq!(days[1].running_total, -70.0);

        let v = serde_json::to_value(&days[1]).unwrap();
        assert_eq!(v["date"], "06/03/2025");
    }
}
