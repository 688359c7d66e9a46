use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

use aesthetics_extractor::{
    config::{CompiledProfile, Configuration},
    core::{AestheticTable, TableBuilder},
    knowledge_graph::{GraphFormat, OntologyGraph},
    utils::{TableFormat, TableSerializer},
};

#[derive(Parser)]
#[command(
    name = "aesthetics_extractor",
    about = "Extract a flat aesthetics dataset from an RDF ontology",
    long_about = None,
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the aesthetics table from an ontology and write it to disk
    Extract {
        /// Ontology file (Turtle or N-Triples)
        input: PathBuf,

        /// Output table path
        #[arg(short, long, default_value = "aesthetics_dataset.csv")]
        output: PathBuf,

        /// Output format (inferred from the output extension when omitted)
        #[arg(short, long, value_enum)]
        format: Option<TableFormatArg>,

        /// Extraction rules file (YAML or JSON); built-in rules when omitted
        #[arg(short, long)]
        rules: Option<PathBuf>,

        /// RDF syntax of the input (inferred from the extension when omitted)
        #[arg(long, value_enum)]
        input_format: Option<GraphFormatArg>,

        /// Base IRI for relative IRIs in Turtle input
        #[arg(long)]
        base_iri: Option<String>,

        /// Do not print the table preview
        #[arg(short, long)]
        quiet: bool,
    },

    /// Show graph statistics and the number of target individuals
    Stats {
        /// Ontology file (Turtle or N-Triples)
        input: PathBuf,

        /// Extraction rules file (YAML or JSON)
        #[arg(short, long)]
        rules: Option<PathBuf>,

        /// RDF syntax of the input
        #[arg(long, value_enum)]
        input_format: Option<GraphFormatArg>,

        /// Base IRI for relative IRIs in Turtle input
        #[arg(long)]
        base_iri: Option<String>,
    },

    /// Validate an extraction rules file
    Validate {
        /// Extraction rules file path
        #[arg(short, long)]
        rules: PathBuf,
    },

    /// Write the built-in rule set as an editable rules file
    GenerateRules {
        /// Output path for the rules file
        #[arg(short, long)]
        output: PathBuf,

        /// Rules file format (yaml or json)
        #[arg(short, long, default_value = "yaml")]
        format: ConfigFormat,
    },
}

#[derive(clap::ValueEnum, Clone, Copy)]
enum TableFormatArg {
    Csv,
    Tsv,
    Json,
}

impl From<TableFormatArg> for TableFormat {
    fn from(format: TableFormatArg) -> Self {
        match format {
            TableFormatArg::Csv => Self::Csv,
            TableFormatArg::Tsv => Self::Tsv,
            TableFormatArg::Json => Self::Json,
        }
    }
}

#[derive(clap::ValueEnum, Clone, Copy)]
enum GraphFormatArg {
    Turtle,
    NTriples,
}

impl From<GraphFormatArg> for GraphFormat {
    fn from(format: GraphFormatArg) -> Self {
        match format {
            GraphFormatArg::Turtle => Self::Turtle,
            GraphFormatArg::NTriples => Self::NTriples,
        }
    }
}

#[derive(clap::ValueEnum, Clone)]
enum ConfigFormat {
    Yaml,
    Json,
}

const PREVIEW_CELL_WIDTH: usize = 28;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let log_level = if cli.debug {
        tracing::Level::DEBUG
    } else if cli.verbose {
        tracing::Level::INFO
    } else {
        tracing::Level::WARN
    };

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(false)
        .init();

    match cli.command {
        Commands::Extract {
            input,
            output,
            format,
            rules,
            input_format,
            base_iri,
            quiet,
        } => extract_command(
            input,
            output,
            format,
            rules,
            input_format,
            base_iri,
            quiet,
        ),
        Commands::Stats {
            input,
            rules,
            input_format,
            base_iri,
        } => stats_command(input, rules, input_format, base_iri),
        Commands::Validate { rules } => validate_command(rules),
        Commands::GenerateRules { output, format } => generate_rules_command(output, format),
    }
}

fn load_profile(rules: Option<&Path>) -> Result<CompiledProfile> {
    let config = match rules {
        Some(path) => Configuration::from_file(path)
            .with_context(|| format!("Failed to load rules file: {}", path.display()))?,
        None => Configuration::canonical(),
    };

    let profile = config.compile().context("Invalid extraction rules")?;
    info!("Using rule set '{}' ({} rules)", profile.name, profile.rules.len());
    Ok(profile)
}

fn load_graph(
    input: &Path,
    input_format: Option<GraphFormatArg>,
    base_iri: Option<&str>,
) -> Result<OntologyGraph> {
    let format = match input_format {
        Some(format) => format.into(),
        None => GraphFormat::from_path(input)?,
    };

    OntologyGraph::load_with_base(input, format, base_iri)
        .with_context(|| format!("Failed to load ontology: {}", input.display()))
}

fn extract_command(
    input: PathBuf,
    output: PathBuf,
    format: Option<TableFormatArg>,
    rules: Option<PathBuf>,
    input_format: Option<GraphFormatArg>,
    base_iri: Option<String>,
    quiet: bool,
) -> Result<()> {
    println!("{}", "Starting aesthetics extraction...".bright_blue().bold());

    // Rules are checked before the ontology is touched
    let profile = load_profile(rules.as_deref())?;
    let graph = load_graph(&input, input_format, base_iri.as_deref())?;

    println!(" Ontology: {}", input.display().to_string().bright_green());
    println!(" Triples: {}", graph.len());
    println!(" Rules: {} ({})", profile.rules.len(), profile.name);

    let table = TableBuilder::new(&graph, &profile).build();
    if table.is_empty() {
        warn!(
            " No individuals of {} found in {}",
            profile.target_class,
            input.display()
        );
    }

    if !quiet {
        display_table(&table);
    }

    let output_format = format
        .map(TableFormat::from)
        .unwrap_or_else(|| TableFormat::from_path(&output));

    TableSerializer::new()
        .write_to_path(&table, &output, output_format)
        .with_context(|| format!("Failed to write table: {}", output.display()))?;

    println!("\n{}", " Extraction Summary".bright_green().bold());
    println!(" Rows: {}", table.len().to_string().bright_cyan());
    println!(" Columns: {}", table.columns.len().to_string().bright_cyan());
    println!(" Processing time: {:.3}s", table.processing_time_seconds);
    println!(
        " Table written to: {} ({})",
        output.display().to_string().bright_green(),
        output_format
    );

    Ok(())
}

fn stats_command(
    input: PathBuf,
    rules: Option<PathBuf>,
    input_format: Option<GraphFormatArg>,
    base_iri: Option<String>,
) -> Result<()> {
    println!("{}", " Ontology Statistics".bright_blue().bold());

    let profile = load_profile(rules.as_deref())?;
    let graph = load_graph(&input, input_format, base_iri.as_deref())?;

    println!("{}", graph.statistics());

    let individuals = graph.individuals_of(&profile.target_class);
    println!(
        " Individuals of {}: {}",
        profile.vocabulary.compact(&profile.target_class).bright_yellow(),
        individuals.len().to_string().bright_cyan()
    );

    Ok(())
}

fn validate_command(rules: PathBuf) -> Result<()> {
    println!("{}", " Validating extraction rules...".bright_blue().bold());

    let config = match Configuration::from_file(&rules) {
        Ok(config) => config,
        Err(e) => {
            error!(" Failed to load rules: {}", e);
            return Err(e.into());
        }
    };

    match config.compile() {
        Ok(profile) => {
            println!(" Rules are valid!");
            println!(" Name: {}", config.name.bright_green());
            println!(" Version: {}", config.version);
            println!(" Namespace: {}", profile.vocabulary.namespace());
            for (prefix, namespace) in profile.vocabulary.prefixes() {
                println!("   {}: {}", prefix.bright_yellow(), namespace);
            }
            println!(" Target class: {}", profile.target_class);
            println!(" Columns: {}", profile.columns().join(", "));
            Ok(())
        }
        Err(e) => {
            error!(" Rules validation failed: {}", e);
            Err(e.into())
        }
    }
}

fn generate_rules_command(output_path: PathBuf, format: ConfigFormat) -> Result<()> {
    println!("{}", " Generating rules file...".bright_blue().bold());

    let config = Configuration::canonical();

    let content = match format {
        ConfigFormat::Yaml => config.to_yaml()?,
        ConfigFormat::Json => config.to_json()?,
    };

    std::fs::write(&output_path, content)
        .with_context(|| format!("Failed to write rules file: {}", output_path.display()))?;

    println!(
        " Rules file generated at: {}",
        output_path.display().to_string().bright_green()
    );
    println!(" Edit the file and pass it to `extract --rules`");

    Ok(())
}

fn display_table(table: &AestheticTable) {
    println!("\n{}", " Table Preview:".bright_yellow().bold());

    let header: Vec<String> = table
        .columns
        .iter()
        .map(|column| truncate_cell(column, PREVIEW_CELL_WIDTH))
        .collect();
    println!("{}", header.join(" | ").bright_cyan());
    println!("{}", "─".repeat(header.len() * (PREVIEW_CELL_WIDTH / 2)));

    for row in &table.rows {
        let values: Vec<String> = row
            .cells
            .iter()
            .map(|cell| truncate_cell(cell, PREVIEW_CELL_WIDTH))
            .collect();
        println!("{}", values.join(" | "));
    }
}

fn truncate_cell(value: &str, width: usize) -> String {
    if value.chars().count() <= width {
        value.to_string()
    } else {
        let truncated: String = value.chars().take(width.saturating_sub(1)).collect();
        format!("{}…", truncated)
    }
}
