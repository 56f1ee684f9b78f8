use fatura_ingest::{extract_total, PageSource, PdfDocument, StatementParser};
use std::path::PathBuf;

fn statement_pdf() -> PdfDocument {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/statement.pdf");
    PdfDocument::from_bytes(std::fs::read(path).unwrap())
}

#[test]
fn test_each_text_run_is_one_fragment() {
    let pages = statement_pdf().pages().unwrap();
    assert_eq!(pages.len(), 2);

    let texts: Vec<&str> = pages[0].iter().map(|f| f.text.as_str()).collect();
    assert_eq!(
        texts,
        [
            "Olá, cliente",
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
        ]
    );
    assert_eq!(pages[1][0].text, "Central de atendimento");
}

#[test]
fn test_fixture_rows_and_total_parse() {
    let pages = statement_pdf().pages().unwrap();
    assert_eq!(extract_total(&pages[0]), Some(1500.0));

    let parser = StatementParser::new(2025).unwrap();
    let first = parser.parse_page(&pages[0]);
    assert_eq!(first.transactions.len(), 2);
    assert_eq!(first.transactions[0].name, "UBER");
    assert_eq!(first.transactions[1].amount, -39.9);
    assert!(first.skipped.is_empty());

    let second = parser.parse_page(&pages[1]);
    assert!(!second.has_table);
}
