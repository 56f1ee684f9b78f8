//! fatura-finance: rule catalog, AI classification adapter, and the statement pipeline

pub mod ai_classifier;
pub mod category_rules;
pub mod pipeline;

pub use ai_classifier::{AiClassifier, ChatCompletion};
pub use category_rules::{ClassificationRule, EngineOptions, RuleEngine, RuleMatch, default_catalog};
pub use pipeline::{PipelineOptions, PipelineOutcome, Stage, StatementPipeline};
