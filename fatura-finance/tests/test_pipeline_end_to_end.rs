use anyhow::{bail, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use fatura_core::{Category, CategoryLabel};
use fatura_finance::{ChatCompletion, PipelineOptions, StatementPipeline};
use fatura_ingest::TextFragment;
use std::path::PathBuf;

fn page(items: &[&str]) -> Vec<TextFragment> {
    TextFragment::sequence(items.iter().copied())
}

fn options(use_ai: bool) -> PipelineOptions {
    PipelineOptions {
        use_ai,
        year: Some(2025),
        ..PipelineOptions::default()
    }
}

fn single_page_statement() -> Vec<Vec<TextFragment>> {
    vec![page(&[
        "Olá, Maria. Esta é a sua fatura de março",
        "O pagamento mínimo é no valor de",
        "R$ 1.500,00",
        "TRANSAÇÕES",
        "DATA",
        "DESCRIÇÃO",
        "VALOR",
        "05 MAR",
        "UBER",
        "-R$ 23,50",
        "06 MAR",
        "NETFLIX.COM",
        "-R$ 39,90",
    ])]
}

struct Unreachable;

#[async_trait]
impl ChatCompletion for Unreachable {
    async fn complete(&self, _system: &str, _user: &str) -> Result<String> {
        bail!("dns error: failed to lookup address")
    }
}

struct Scripted(&'static str);

#[async_trait]
impl ChatCompletion for Scripted {
    async fn complete(&self, _system: &str, user: &str) -> Result<String> {
        assert_eq!(user.lines().count(), 2);
        Ok(self.0.to_string())
    }
}

#[tokio::test]
async fn test_single_page_statement() {
    let pipeline = StatementPipeline::with_default_rules(options(false)).unwrap();
    let out = pipeline.run_pages(&single_page_statement()).await;

    assert_eq!(out.result.total, 1500.0);
    assert_eq!(out.pages, 1);
    assert_eq!(out.pages_with_table, 1);

    let txns = &out.result.transactions;
    assert_eq!(txns.len(), 2);
    assert_eq!(txns[0].date, NaiveDate::from_ymd_opt(2025, 3, 5).unwrap());
    assert_eq!(txns[0].date_string(), "05/03/2025");
    assert_eq!(txns[0].name, "UBER");
    assert_eq!(txns[0].amount, -23.5);
    assert_eq!(txns[0].category.label, CategoryLabel::Transporte);
    assert_eq!(txns[1].name, "NETFLIX.COM");
    assert_eq!(txns[1].amount, -39.9);
    assert_eq!(txns[1].category.label, CategoryLabel::Streaming);
}

fn fixture_pdf() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .unwrap()
        .join("fatura-ingest/tests/fixtures/statement.pdf")
}

#[tokio::test]
async fn test_statement_pdf_end_to_end() {
    let pipeline = StatementPipeline::with_default_rules(options(false)).unwrap();
    let out = pipeline.run_file(fixture_pdf()).await.unwrap();

    assert_eq!(out.result.total, 1500.0);
    assert_eq!(out.pages, 2);
    assert_eq!(out.pages_with_table, 1);

    let txns = &out.result.transactions;
    assert_eq!(txns.len(), 2);
    assert_eq!(txns[0].date_string(), "05/03/2025");
    assert_eq!(txns[0].name, "UBER");
    assert_eq!(txns[0].amount, -23.5);
    assert_eq!(txns[0].category.label, CategoryLabel::Transporte);
    assert_eq!(txns[1].date_string(), "06/03/2025");
    assert_eq!(txns[1].name, "NETFLIX.COM");
    assert_eq!(txns[1].amount, -39.9);
    assert_eq!(txns[1].category.label, CategoryLabel::Streaming);
    assert!(out.skipped.is_empty());
}

#[tokio::test]
async fn test_pages_concatenate_in_order_and_total_comes_from_page_one() {
    let pages = vec![
        page(&["Resumo", "no valor de", "R$ 980,10"]),
        page(&["TRANSAÇÕES", "x", "x", "x", "01 ABR", "IFD*RESTAURANTE X", "-R$ 52,00"]),
        page(&["Limite disponível", "no valor de", "R$ 5.000,00"]),
        page(&["TRANSAÇÕES", "x", "x", "x", "03 ABR", "XYZ9281ZZ", "-R$ 1,00", "Estorno"]),
    ];
    let pipeline = StatementPipeline::with_default_rules(options(false)).unwrap();
    let out = pipeline.run_pages(&pages).await;

    assert_eq!(out.result.total, 980.1);
    assert_eq!(out.pages, 4);
    assert_eq!(out.pages_with_table, 2);
    let names: Vec<_> = out.result.transactions.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, ["IFD*RESTAURANTE X", "XYZ9281ZZ"]);
    assert_eq!(out.result.transactions[0].category.label, CategoryLabel::IFood);
    assert!(out.result.transactions[1].category.is_default());
    assert_eq!(out.skipped.reversals, 1);
}

#[tokio::test]
async fn test_missing_anchor_and_table_is_not_an_error() {
    let pipeline = StatementPipeline::with_default_rules(options(false)).unwrap();
    let out = pipeline.run_pages(&[page(&["Capa", "Nada aqui"])]).await;
    assert_eq!(out.result.total, 0.0);
    assert!(out.result.transactions.is_empty());
    assert_eq!(out.pages_with_table, 0);
}

#[tokio::test]
async fn test_ai_failure_degrades_to_default_category() {
    let pipeline = StatementPipeline::with_default_rules(options(true))
        .unwrap()
        .with_chat_client(Box::new(Unreachable));
    let out = pipeline.run_pages(&single_page_statement()).await;

    assert_eq!(out.result.total, 1500.0);
    assert_eq!(out.result.transactions.len(), 2);
    assert!(out
        .result
        .transactions
        .iter()
        .all(|t| t.category == Category::default_category()));
}

#[tokio::test]
async fn test_ai_strategy_replaces_rules_for_whole_batch() {
    let pipeline = StatementPipeline::with_default_rules(options(true))
        .unwrap()
        .with_chat_client(Box::new(Scripted("🍿 Entretenimento\n📺 Streaming")));
    let out = pipeline.run_pages(&single_page_statement()).await;

    assert_eq!(out.result.transactions[0].category.label, CategoryLabel::Entretenimento);
    assert_eq!(out.result.transactions[1].category.label, CategoryLabel::Streaming);
}

#[tokio::test]
async fn test_ai_without_client_uses_default_category() {
    let pipeline = StatementPipeline::with_default_rules(options(true)).unwrap();
    let out = pipeline.run_pages(&single_page_statement()).await;
    assert!(out.result.transactions.iter().all(|t| t.category.is_default()));
}

#[tokio::test]
async fn test_run_source_accepts_extracted_pages() {
    let pipeline = StatementPipeline::with_default_rules(options(false)).unwrap();
    let out = pipeline.run_source(&single_page_statement()).await.unwrap();
    assert_eq!(out.result.transactions.len(), 2);
}

#[tokio::test]
async fn test_unreadable_file_is_the_only_failure() {
    let pipeline = StatementPipeline::with_default_rules(options(false)).unwrap();
    let err = pipeline
        .run_file("/definitely/not/here/fatura.pdf")
        .await
        .unwrap_err();
    assert!(err.to_string().contains("fatura.pdf"));
}
