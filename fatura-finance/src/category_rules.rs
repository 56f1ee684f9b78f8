//! Deterministic, score-based category rules for statement descriptions.
//!
//! Each rule scores a lower-cased transaction name:
//! - +2 per keyword contained in the name
//! - +4 per merchant pattern matching the name
//! - +1 per amount range containing |amount| (only with `score_amount_ranges`)
//!
//! The highest score wins; ties go to the rule defined first. Nothing above
//! zero means the default "Outros" category.

use anyhow::{Context, Result};
use fatura_core::{Category, CategoryLabel, Transaction};
use fatura_ingest::ParsedTransaction;
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const KEYWORD_WEIGHT: u32 = 2;
pub const MERCHANT_WEIGHT: u32 = 4;
pub const AMOUNT_WEIGHT: u32 = 1;

/// Inclusive amount bounds; a missing bound is open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AmountRange {
    #[serde(default)]
    pub min: Option<f64>,
    #[serde(default)]
    pub max: Option<f64>,
}

impl AmountRange {
    pub fn contains(&self, amount: f64) -> bool {
        self.min.is_none_or(|min| amount >= min) && self.max.is_none_or(|max| amount <= max)
    }
}

/// One entry of the rule catalog. Icon and color come from the label's
/// interned [`Category`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationRule {
    pub label: CategoryLabel,
    pub keywords: Vec<String>,
    #[serde(default)]
    pub merchant_patterns: Vec<String>,
    #[serde(default)]
    pub amount_ranges: Vec<AmountRange>,
}

impl ClassificationRule {
    pub fn new(label: CategoryLabel, keywords: &[&str], merchant_patterns: &[&str]) -> Self {
        Self {
            label,
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
            merchant_patterns: merchant_patterns.iter().map(|p| p.to_string()).collect(),
            amount_ranges: Vec::new(),
        }
    }

    pub fn with_amount_range(mut self, min: Option<f64>, max: Option<f64>) -> Self {
        self.amount_ranges.push(AmountRange { min, max });
        self
    }
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    #[serde(rename = "rule", default)]
    rules: Vec<ClassificationRule>,
}

/// Parse a TOML catalog made of `[[rule]]` tables, in priority order.
pub fn parse_catalog(toml_src: &str) -> Result<Vec<ClassificationRule>> {
    let file: CatalogFile = toml::from_str(toml_src).context("parse rule catalog")?;
    Ok(file.rules)
}

pub fn load_catalog(path: impl AsRef<Path>) -> Result<Vec<ClassificationRule>> {
    let path = path.as_ref();
    let src = std::fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    parse_catalog(&src).with_context(|| format!("in {}", path.display()))
}

/// Built-in catalog. Order matters: earlier rules win ties, so the narrow
/// iFood rule sits before the broad food rule.
pub fn default_catalog() -> Vec<ClassificationRule> {
    use CategoryLabel::*;

    vec![
        ClassificationRule::new(IFood, &["ifd", "ifood"], &[r"^ifd\*", r"ifood"]),
        ClassificationRule::new(
            Alimentacao,
            &[
                "hambur", "restaurante", "food", "pizza", "lanche", "burger", "cafeteria",
                "padaria", "acai", "sorvete", "doceria", "confeitaria", "bar", "pub",
                "choperia", "delivery", "cozinha", "aconchego da praca", "jeronimo", "madero",
                "arlindo umbelino", "exoticus", "godo", "gennaro", "popeyes", "xico da carne",
            ],
            &[
                r"food", r"burger", r"rest(aurante)?", r"bar\s+e", r"delivery", r"lanches",
                r"cozinha", r"jeronimo", r"madero", r"arlindo\s+umbelino", r"exoticus",
            ],
        ),
        ClassificationRule::new(
            Mercado,
            &[
                "mercado", "super", "sup", "hiper", "atacado", "atacadista", "hortifruti",
                "sacolao", "feira", "carrefour", "pao de acucar", "extra", "dia", "assai",
                "sams", "makro", "comercio", "comercio de alimentos", "supermercado", "bh",
                "epa", "daki", "supernosso", "verdemar", "panificadora", "pao", "paes",
            ],
            &[
                r"^sup(er)?", r"^hiper", r"market", r"comercio", r"comercio\s+de\s+alimentos",
                r"supermercado", r"bh", r"epa", r"daki", r"supernosso", r"verdemar",
                r"panificadora", r"paes",
            ],
        ),
        ClassificationRule::new(
            Transporte,
            &[
                "uber", "taxi", "99", "cabify", "transporte", "mobilidade", "corrida",
                "transfer", "estacionamento",
            ],
            &[r"^uber", r"^99\s", r"taxi", r"transfer"],
        )
        .with_amount_range(Some(10.0), Some(100.0)),
        ClassificationRule::new(
            Gasolina,
            &["gasolina", "posto", "combustivel", "cristiano machado"],
            &[
                r"^posto", r"gasolina", r"combustivel", r"posto\s+gasolina",
                r"posto\s+combustivel", r"posto\s+gas",
            ],
        ),
        ClassificationRule::new(
            Streaming,
            &[
                "netflix", "prime", "disney", "hbo", "paramount", "youtube", "streaming",
                "play", "now", "apple tv",
            ],
            &[r"netflix", r"prime\s*video", r"disney\+", r"hbo", r"youtube"],
        )
        .with_amount_range(Some(15.0), Some(60.0)),
        ClassificationRule::new(
            Musica,
            &["spotify", "apple music", "deezer", "tidal", "youtube music", "pandora"],
            &[r"spotify", r"apple\s*music", r"deezer", r"tidal"],
        )
        .with_amount_range(Some(8.0), Some(30.0)),
        ClassificationRule::new(
            Assinaturas,
            &[
                "play", "now", "apple tv", "bill", "recurrence", "subscription", "clubewine",
                "cursor, ai", "clube wine", "contabilizei tecnologi", "contorno do corpo",
            ],
            &[
                r"bill", r"recurrence", r"subscription", r"clubewine", r"cursor, ai",
                r"contabilizei\s+tecnologi", r"contorno\s+do\s+corpo",
            ],
        )
        .with_amount_range(Some(8.0), Some(30.0)),
        ClassificationRule::new(
            Farmacia,
            &[
                "farmacia", "drogaria", "medicamento", "remedio", "manipulacao", "droga",
                "raia", "pacheco", "nissei", "panvel",
            ],
            &[r"^farm(acia)?", r"^drog(aria)?", r"remedios", r"manipul"],
        ),
        ClassificationRule::new(
            Saude,
            &[
                "hospital", "clinica", "medico", "consulta", "exame", "laboratorio",
                "dentista", "ortodontia", "psico", "terapia", "fisio",
            ],
            &[r"hosp(ital)?", r"clin(ica)?", r"lab(oratorio)?", r"dr\.", r"dra\."],
        )
        .with_amount_range(Some(100.0), Some(1000.0)),
        ClassificationRule::new(
            Utilidades,
            &[
                "energia", "luz", "agua", "gas", "telefone", "internet", "tv", "celular",
                "conta", "fatura", "servico",
            ],
            &[r"energia", r"telecom", r"net", r"vivo", r"claro", r"tim", r"oi"],
        )
        .with_amount_range(Some(50.0), Some(500.0)),
        ClassificationRule::new(
            Compras,
            &[
                "shopping", "loja", "store", "magazine", "americanas", "renner", "riachuelo",
                "marisa", "cea", "casas bahia", "ponto frio", "parcela", "ml", "mercadolivre",
                "mp", "mercado livre", "mercado pago", "estetica", "enxovais", "boulevard",
                "patio savassi", "diamond mall", "bh shop", "pernambucanas",
            ],
            &[
                r"shop(ping)?", r"store", r"loja", r"magazine", r"parcela", r"americanas",
                r"renner", r"riachuelo", r"marisa", r"cea", r"casas\s+bahia", r"ponto\s+frio",
                r"mercadolivre", r"ml", r"mp", r"estetica", r"enxovais", r"boulevard",
                r"patio\s+savassi", r"diamond\s+mall", r"bh\s+shop",
            ],
        ),
        ClassificationRule::new(
            Hospedagens,
            &["hotel", "pousada", "hostel", "airbnb", "booking", "chale", "chale hotel", "chale hotel & spa"],
            &[
                r"^hotel", r"pousada", r"hostel", r"airbnb", r"booking", r"chale",
                r"chale\s+hotel", r"chale\s+hotel\s+&", r"chale\s+hotel\s+&\s+spa", r"parcela",
            ],
        )
        .with_amount_range(Some(200.0), None),
        ClassificationRule::new(
            Viagens,
            &["viagem", "passagem", "aerea", "voo", "decolar", "cvc", "latam", "gol", "azul"],
            &[
                r"booking", r"decolar", r"cvc", r"latam", r"gol", r"azul", r"voo", r"passagem",
                r"aerea", r"viagem", r"parcela",
            ],
        )
        .with_amount_range(Some(200.0), None),
        ClassificationRule::new(
            Bares,
            &[
                "bar", "pub", "choperia", "delivery", "mercado nov", "zig", "mascate",
                "distribuidora", "garrafa", "vinho", "cerveja", "chopp", "zé delivery",
            ],
            &[
                r"bar", r"pub", r"choperia", r"delivery", r"mercado\s+nov", r"zig", r"mascate",
                r"espeto", r"distribuidora", r"garrafa", r"vinho", r"cerveja", r"chopp",
                r"ze\s+delivery",
            ],
        ),
        ClassificationRule::new(
            Pet,
            &[
                "petz", "vet", "petshop", "pet", "cachorro", "gato", "cavalo", "peixe",
                "passarinho", "coelho", "roedor", "reptil", "aves", "anfibio",
            ],
            &[r"petz", r"petshop", r"cachorro", r"gato", r"cavalo", r"racao", r"ração", r"areia"],
        ),
        ClassificationRule::new(
            Entretenimento,
            &["cinemark", "cinema", "filme", "filmes"],
            &[r"cinemark", r"cinema", r"filme", r"filmes"],
        ),
    ]
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EngineOptions {
    /// Add [`AMOUNT_WEIGHT`] per matching amount range. Off by default.
    pub score_amount_ranges: bool,
}

#[derive(Debug, Clone)]
struct CompiledRule {
    label: CategoryLabel,
    keywords: Vec<String>,
    patterns: Vec<Regex>,
    amount_ranges: Vec<AmountRange>,
}

/// The winning rule for a description.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuleMatch {
    /// Position in the catalog.
    pub rule_index: usize,
    pub label: CategoryLabel,
    pub score: u32,
}

impl RuleMatch {
    pub fn category(&self) -> &'static Category {
        self.label.category()
    }
}

/// A catalog with its patterns compiled once. Classification is a pure
/// function of `(name, amount)` and the catalog.
#[derive(Debug, Clone)]
pub struct RuleEngine {
    rules: Vec<CompiledRule>,
    options: EngineOptions,
}

impl RuleEngine {
    pub fn new(catalog: &[ClassificationRule], options: EngineOptions) -> Result<Self> {
        let mut rules = Vec::with_capacity(catalog.len());
        for rule in catalog {
            let mut keywords: Vec<String> = Vec::new();
            for keyword in &rule.keywords {
                let keyword = keyword.to_lowercase();
                if !keyword.is_empty() && !keywords.contains(&keyword) {
                    keywords.push(keyword);
                }
            }

            let patterns = rule
                .merchant_patterns
                .iter()
                .map(|p| {
                    RegexBuilder::new(p)
                        .case_insensitive(true)
                        .build()
                        .with_context(|| format!("rule {}: invalid merchant pattern {p:?}", rule.label))
                })
                .collect::<Result<Vec<_>>>()?;

            rules.push(CompiledRule {
                label: rule.label,
                keywords,
                patterns,
                amount_ranges: rule.amount_ranges.clone(),
            });
        }

        Ok(Self { rules, options })
    }

    pub fn with_default_catalog(options: EngineOptions) -> Result<Self> {
        Self::new(&default_catalog(), options)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    fn score(&self, rule: &CompiledRule, name: &str, amount: f64) -> u32 {
        let mut score = 0;
        for keyword in &rule.keywords {
            if name.contains(keyword.as_str()) {
                score += KEYWORD_WEIGHT;
            }
        }
        for pattern in &rule.patterns {
            if pattern.is_match(name) {
                score += MERCHANT_WEIGHT;
            }
        }
        if self.options.score_amount_ranges {
            let magnitude = amount.abs();
            for range in &rule.amount_ranges {
                if range.contains(magnitude) {
                    score += AMOUNT_WEIGHT;
                }
            }
        }
        score
    }

    /// Highest-scoring rule, or `None` when every rule scores zero.
    pub fn best_match(&self, name: &str, amount: f64) -> Option<RuleMatch> {
        let name = name.to_lowercase();
        let mut best: Option<RuleMatch> = None;
        for (rule_index, rule) in self.rules.iter().enumerate() {
            let score = self.score(rule, &name, amount);
            // strictly greater: earlier rules keep ties
            if score > best.map_or(0, |b| b.score) {
                best = Some(RuleMatch {
                    rule_index,
                    label: rule.label,
                    score,
                });
            }
        }
        best
    }

    pub fn classify(&self, name: &str, amount: f64) -> &'static Category {
        self.best_match(name, amount)
            .map_or_else(Category::default_category, |m| m.category())
    }

    pub fn classify_all(&self, txns: Vec<ParsedTransaction>) -> Vec<Transaction> {
        txns.into_iter()
            .map(|t| {
                let category = self.classify(&t.name, t.amount);
                Transaction {
                    date: t.date,
                    name: t.name,
                    amount: t.amount,
                    category,
                }
            })
            .collect()
    }
}
