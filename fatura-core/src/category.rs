//! Spending categories: a closed label set and the interned category table
//! (label → icon, display color) shared by every classified transaction.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Category labels, serialized by their display string.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum CategoryLabel {
    #[serde(rename = "iFood")]
    IFood,
    #[serde(rename = "Alimentação")]
    Alimentacao,
    #[serde(rename = "Mercado")]
    Mercado,
    #[serde(rename = "Transporte")]
    Transporte,
    #[serde(rename = "Entretenimento")]
    Entretenimento,
    #[serde(rename = "Saúde")]
    Saude,
    #[serde(rename = "Compras")]
    Compras,
    #[serde(rename = "Serviços")]
    Servicos,
    #[serde(rename = "Tecnologia")]
    Tecnologia,
    #[serde(rename = "Viagens")]
    Viagens,
    #[serde(rename = "Hospedagens")]
    Hospedagens,
    #[serde(rename = "Moradia")]
    Moradia,
    #[serde(rename = "Utilidades")]
    Utilidades,
    #[serde(rename = "Streaming")]
    Streaming,
    #[serde(rename = "Música")]
    Musica,
    #[serde(rename = "Farmácia")]
    Farmacia,
    #[serde(rename = "Educação")]
    Educacao,
    #[serde(rename = "Outros")]
    Outros,
    #[serde(rename = "Gasolina")]
    Gasolina,
    #[serde(rename = "Assinaturas")]
    Assinaturas,
    #[serde(rename = "Bares")]
    Bares,
    #[serde(rename = "Eventos")]
    Eventos,
    #[serde(rename = "Pet")]
    Pet,
}

impl CategoryLabel {
    pub const ALL: [CategoryLabel; 23] = [
        CategoryLabel::IFood,
        CategoryLabel::Alimentacao,
        CategoryLabel::Mercado,
        CategoryLabel::Transporte,
        CategoryLabel::Entretenimento,
        CategoryLabel::Saude,
        CategoryLabel::Compras,
        CategoryLabel::Servicos,
        CategoryLabel::Tecnologia,
        CategoryLabel::Viagens,
        CategoryLabel::Hospedagens,
        CategoryLabel::Moradia,
        CategoryLabel::Utilidades,
        CategoryLabel::Streaming,
        CategoryLabel::Musica,
        CategoryLabel::Farmacia,
        CategoryLabel::Educacao,
        CategoryLabel::Outros,
        CategoryLabel::Gasolina,
        CategoryLabel::Assinaturas,
        CategoryLabel::Bares,
        CategoryLabel::Eventos,
        CategoryLabel::Pet,
    ];

    /// Display string, as printed on reports and expected back from the AI.
    pub fn as_str(&self) -> &'static str {
        match self {
            CategoryLabel::IFood => "iFood",
            CategoryLabel::Alimentacao => "Alimentação",
            CategoryLabel::Mercado => "Mercado",
            CategoryLabel::Transporte => "Transporte",
            CategoryLabel::Entretenimento => "Entretenimento",
            CategoryLabel::Saude => "Saúde",
            CategoryLabel::Compras => "Compras",
            CategoryLabel::Servicos => "Serviços",
            CategoryLabel::Tecnologia => "Tecnologia",
            CategoryLabel::Viagens => "Viagens",
            CategoryLabel::Hospedagens => "Hospedagens",
            CategoryLabel::Moradia => "Moradia",
            CategoryLabel::Utilidades => "Utilidades",
            CategoryLabel::Streaming => "Streaming",
            CategoryLabel::Musica => "Música",
            CategoryLabel::Farmacia => "Farmácia",
            CategoryLabel::Educacao => "Educação",
            CategoryLabel::Outros => "Outros",
            CategoryLabel::Gasolina => "Gasolina",
            CategoryLabel::Assinaturas => "Assinaturas",
            CategoryLabel::Bares => "Bares",
            CategoryLabel::Eventos => "Eventos",
            CategoryLabel::Pet => "Pet",
        }
    }

    /// The interned category for this label.
    pub fn category(&self) -> &'static Category {
        Category::for_label(*self)
    }
}

impl fmt::Display for CategoryLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error for a label string outside the closed set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownLabel(pub String);

impl fmt::Display for UnknownLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown category label: {:?}", self.0)
    }
}

impl std::error::Error for UnknownLabel {}

impl FromStr for CategoryLabel {
    type Err = UnknownLabel;

    /// Case-insensitive, and tolerant of missing diacritics
    /// ("alimentacao" and "SAÚDE" both resolve).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = fold(s.trim());
        CategoryLabel::ALL
            .iter()
            .copied()
            .find(|label| fold(label.as_str()) == wanted)
            .ok_or_else(|| UnknownLabel(s.to_string()))
    }
}

fn fold(s: &str) -> String {
    s.chars()
        .flat_map(char::to_lowercase)
        .map(|c| match c {
            'á' | 'à' | 'â' | 'ã' | 'ä' => 'a',
            'é' | 'è' | 'ê' | 'ë' => 'e',
            'í' | 'ì' | 'î' | 'ï' => 'i',
            'ó' | 'ò' | 'ô' | 'õ' | 'ö' => 'o',
            'ú' | 'ù' | 'û' | 'ü' => 'u',
            'ç' => 'c',
            other => other,
        })
        .collect()
}

/// A display category. Only ever obtained from the static table, so two
/// transactions with the same label share the same entry.
#[derive(Debug, PartialEq, Eq, Serialize)]
pub struct Category {
    pub icon: &'static str,
    pub label: CategoryLabel,
    pub color: &'static str,
}

const fn entry(icon: &'static str, label: CategoryLabel, color: &'static str) -> Category {
    Category { icon, label, color }
}

// Indexed by `CategoryLabel as usize`; order must follow the enum.
static CATEGORIES: [Category; 23] = [
    entry("🛵", CategoryLabel::IFood, "#4ADE80"),
    entry("🍽️", CategoryLabel::Alimentacao, "#22C55E"),
    entry("🛒", CategoryLabel::Mercado, "#16A34A"),
    entry("🚗", CategoryLabel::Transporte, "#3B82F6"),
    entry("🎥", CategoryLabel::Entretenimento, "#A855F7"),
    entry("🏥", CategoryLabel::Saude, "#EC4899"),
    entry("🛍️", CategoryLabel::Compras, "#F97316"),
    entry("🔧", CategoryLabel::Servicos, "#EA580C"),
    entry("💻", CategoryLabel::Tecnologia, "#4F46E5"),
    entry("✈️", CategoryLabel::Viagens, "#2563EB"),
    entry("🏨", CategoryLabel::Hospedagens, "#6AA0F6"),
    entry("🏠", CategoryLabel::Moradia, "#14B8A6"),
    entry("⚡", CategoryLabel::Utilidades, "#0D9488"),
    entry("📺", CategoryLabel::Streaming, "#9333EA"),
    entry("🎵", CategoryLabel::Musica, "#8B5CF6"),
    entry("💊", CategoryLabel::Farmacia, "#F43F5E"),
    entry("📚", CategoryLabel::Educacao, "#6366F1"),
    entry("💳", CategoryLabel::Outros, "#64748B"),
    entry("⛽️", CategoryLabel::Gasolina, "#EABA0C"),
    entry("🔐", CategoryLabel::Assinaturas, "#977CD5"),
    entry("🍺", CategoryLabel::Bares, "#227B77"),
    entry("🎟️", CategoryLabel::Eventos, "#52CAC4"),
    entry("🐈", CategoryLabel::Pet, "#70CBC3"),
];

impl Category {
    pub fn for_label(label: CategoryLabel) -> &'static Category {
        &CATEGORIES[label as usize]
    }

    /// Fallback when nothing scores, or when AI classification fails.
    pub fn default_category() -> &'static Category {
        Category::for_label(CategoryLabel::Outros)
    }

    pub fn is_default(&self) -> bool {
        self.label == CategoryLabel::Outros
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.icon, self.label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_follows_enum_order() {
        for label in CategoryLabel::ALL {
            assert_eq!(Category::for_label(label).label, label);
        }
    }

    #[test]
    fn test_default_category_is_outros() {
        let d = Category::default_category();
        assert_eq!(d.icon, "💳");
        assert_eq!(d.label, CategoryLabel::Outros);
        assert_eq!(d.color, "#64748B");
        assert!(d.is_default());
    }

    #[test]
    fn test_interned_entries_are_shared() {
        let a = CategoryLabel::Streaming.category();
        let b = Category::for_label(CategoryLabel::Streaming);
        assert!(std::ptr::eq(a, b));
    }

    #[test]
    fn test_label_from_str_is_lenient() {
        assert_eq!("Alimentação".parse(), Ok(CategoryLabel::Alimentacao));
        assert_eq!("alimentacao".parse(), Ok(CategoryLabel::Alimentacao));
        assert_eq!(" SAÚDE ".parse(), Ok(CategoryLabel::Saude));
        assert_eq!("ifood".parse(), Ok(CategoryLabel::IFood));
        assert!("Cripto".parse::<CategoryLabel>().is_err());
        assert!("".parse::<CategoryLabel>().is_err());
    }

    #[test]
    fn test_serializes_display_strings() {
        let json = serde_json::to_string(CategoryLabel::Farmacia.category()).unwrap();
        assert_eq!(json, r##"{"icon":"💊","label":"Farmácia","color":"#F43F5E"}"##);
    }
}
