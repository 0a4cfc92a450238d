//! Node Check CLI
//!
//! Compares node documents and validates them against reference definitions.
//! Results are printed as JSON.

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use node_compliance::config::OutputFormat;
use node_compliance::{CheckerConfig, ComplianceValidator, ParsedNodeDefinition, StructuralDiffer};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "node-check")]
#[command(about = "Compare and validate automation node definitions")]
struct Cli {
    /// Configuration file layered over the default locations
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Report structural differences between two JSON documents
    Compare {
        /// Local node document
        local: PathBuf,
        /// Spec node document
        spec: PathBuf,
    },

    /// Validate a node document against a reference definition
    Validate {
        /// Node document to validate
        node: PathBuf,
        /// Reference definition (JSON)
        reference: PathBuf,
    },
}

#[derive(Serialize)]
struct ComparisonOutput<'a> {
    #[serde(flatten)]
    comparison: &'a node_compliance::NodeComparison,
    similarity_score: u8,
}

fn main() {
    let cli = Cli::parse();

    let config = match CheckerConfig::load_from(cli.config.as_deref().and_then(|p| p.to_str())) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(2);
        }
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log.level.as_deref().unwrap_or("warn")));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match run(cli.command, &config) {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(2);
        }
    }
}

/// Returns whether the check passed
fn run(command: Commands, config: &CheckerConfig) -> anyhow::Result<bool> {
    match command {
        Commands::Compare { local, spec } => {
            let local_text = std::fs::read_to_string(&local)
                .with_context(|| format!("reading {}", local.display()))?;
            let spec_text = std::fs::read_to_string(&spec)
                .with_context(|| format!("reading {}", spec.display()))?;

            let comparison = StructuralDiffer::from_config(&config.diff)
                .compare_str(&local_text, &spec_text)?;

            print_json(
                &ComparisonOutput {
                    comparison: &comparison,
                    similarity_score: comparison.similarity_score(),
                },
                config.output.format,
            )?;
            Ok(comparison.identical)
        }

        Commands::Validate { node, reference: reference_path } => {
            let node_text = std::fs::read_to_string(&node)
                .with_context(|| format!("reading {}", node.display()))?;
            let reference_text = std::fs::read_to_string(&reference_path)
                .with_context(|| format!("reading {}", reference_path.display()))?;
            let reference = ParsedNodeDefinition::from_json_str(&reference_text)
                .with_context(|| format!("parsing reference definition {}", reference_path.display()))?;

            let result = ComplianceValidator::new().validate_str(&node_text, &reference);

            print_json(&result, config.output.format)?;
            Ok(result.is_valid)
        }
    }
}

fn print_json<T: Serialize>(value: &T, format: OutputFormat) -> anyhow::Result<()> {
    let text = match format {
        OutputFormat::Pretty => serde_json::to_string_pretty(value)?,
        OutputFormat::Compact => serde_json::to_string(value)?,
    };
    println!("{}", text);
    Ok(())
}
