use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use fatura_finance::category_rules::{default_catalog, load_catalog, EngineOptions, RuleEngine};
use fatura_finance::{PipelineOptions, StatementPipeline};
use std::path::{Path, PathBuf};
use tracing::warn;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod config;
mod llm;
mod output;
mod state;

use output::Format;

#[derive(Parser, Debug)]
#[command(name = "fatura", version, about = "Credit-card statement parser and categorizer")]
struct Cli {
    /// Debug logging (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Parse a statement PDF and categorize its transactions
    Parse {
        /// Statement PDF
        pdf: PathBuf,

        /// Categorize with the configured chat model instead of the rules
        #[arg(long)]
        ai: bool,

        /// Year for `DD MMM` rows (default: current year)
        #[arg(long)]
        year: Option<i32>,

        /// TOML rule catalog replacing the built-in rules
        #[arg(long)]
        rules: Option<PathBuf>,

        /// Also score rules by amount range
        #[arg(long)]
        amount_ranges: bool,

        #[arg(long, value_enum, default_value_t = Format::Table)]
        format: Format,
    },

    /// Show which rule a description matches
    Classify {
        /// Transaction description, e.g. "IFD*RESTAURANTE X"
        name: String,

        #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
        amount: f64,

        #[arg(long)]
        rules: Option<PathBuf>,

        #[arg(long)]
        amount_ranges: bool,
    },

    /// Manage ~/.fatura/config.toml
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Write a default config if none exists
    Init,
    /// Print the effective config
    Show,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // RUST_LOG > --verbose > info
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr).compact())
        .init();

    match cli.command {
        Command::Parse {
            pdf,
            ai,
            year,
            rules,
            amount_ranges,
            format,
        } => {
            if !pdf.exists() {
                bail!("PDF not found: {}", pdf.display());
            }

            let cfg = config::load_config()?;
            let options = PipelineOptions {
                use_ai: ai || cfg.classifier.use_ai,
                year,
                engine: EngineOptions {
                    score_amount_ranges: amount_ranges || cfg.classifier.score_amount_ranges,
                },
            };
            let rules = rules.or(cfg.classifier.rules_file.clone());
            let engine = build_engine(rules.as_deref(), options.engine)?;

            let mut pipeline = StatementPipeline::new(engine, options)?;
            if options.use_ai {
                let llm = llm::LlmConfig::from_section(&cfg.llm)?;
                pipeline = pipeline.with_chat_client(Box::new(llm::ChatClient::new(llm)));
            }

            let outcome = pipeline.run_file(&pdf).await?;

            match format {
                Format::Table => output::print_table(&outcome),
                Format::Json => output::print_json(&outcome.result)?,
                Format::Csv => output::write_csv(&outcome.result, std::io::stdout().lock())?,
            }
        }

        Command::Classify {
            name,
            amount,
            rules,
            amount_ranges,
        } => {
            let cfg = config::load_config()?;
            let engine = build_engine(
                rules.or(cfg.classifier.rules_file).as_deref(),
                EngineOptions {
                    score_amount_ranges: amount_ranges || cfg.classifier.score_amount_ranges,
                },
            )?;
            match engine.best_match(&name, amount) {
                Some(m) => println!("{} (rule #{}, score {})", m.category(), m.rule_index + 1, m.score),
                None => println!(
                    "{} (none of {} rules matched)",
                    engine.classify(&name, amount),
                    engine.len()
                ),
            }
        }

        Command::Config { command } => match command {
            ConfigCommand::Init => config::init_config()?,
            ConfigCommand::Show => config::show_config()?,
        },
    }

    Ok(())
}

fn build_engine(rules: Option<&Path>, options: EngineOptions) -> Result<RuleEngine> {
    let catalog = match rules {
        Some(path) => load_catalog(path)?,
        None => default_catalog(),
    };
    let engine = RuleEngine::new(&catalog, options)?;
    if engine.is_empty() {
        warn!("rule catalog is empty; every transaction will be Outros");
    }
    Ok(engine)
}
