//! Command-line front end for CVL Index
//!
//! Usage: cvl-index <index|batch|normalize> [options]

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use cvl_index::pipeline::{self, ContractSpecPair};
use cvl_index::IndexerConfig;
use std::path::PathBuf;

// CLI modules live in src/bin/cli/
mod cli;

#[derive(Parser)]
#[command(name = "cvl-index")]
#[command(about = "Index CVL rules and invariants against Solidity functions", long_about = None)]
struct Cli {
    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Index a single contract/spec pair
    Index {
        /// Solidity contract file
        contract: PathBuf,

        /// CVL spec file
        spec: PathBuf,

        /// Output directory (overrides the config file)
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// YAML config file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Print the records instead of writing the artifact
        #[arg(long)]
        stdout: bool,
    },

    /// Index every contract/spec pair in a directory
    Batch {
        /// Directory holding <name>.sol / <name>.spec pairs
        #[arg(long)]
        input_dir: Option<PathBuf>,

        /// Output directory
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// Number of parallel jobs
        #[arg(short, long)]
        jobs: Option<usize>,

        /// YAML config file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Only pairs whose name matches (supports * wildcard)
        #[arg(long)]
        name: Option<String>,

        /// Report format
        #[arg(long, default_value = "human")]
        format: OutputFormat,
    },

    /// Print a Solidity snippet normalized the way records are embedded
    Normalize {
        /// File holding the snippet
        file: PathBuf,
    },
}

#[derive(Clone, Copy, Debug)]
enum OutputFormat {
    Human,
    Json,
    Markdown,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "human" => Ok(OutputFormat::Human),
            "json" => Ok(OutputFormat::Json),
            "markdown" => Ok(OutputFormat::Markdown),
            _ => Err(format!("Unknown format: {}. Expected: human, json, markdown", s)),
        }
    }
}

fn main() {
    let cli = Cli::parse();

    setup_logging(cli.verbose);

    let result = match cli.command {
        Commands::Index {
            contract,
            spec,
            output_dir,
            config,
            stdout,
        } => handle_index(contract, spec, output_dir, config, stdout),
        Commands::Batch {
            input_dir,
            output_dir,
            jobs,
            config,
            name,
            format,
        } => handle_batch(input_dir, output_dir, jobs, config, name, format),
        Commands::Normalize { file } => handle_normalize(file),
    };

    let exit_code = match result {
        Ok(()) => 0,
        Err(e) => {
            log::error!("{:#}", e);
            1
        }
    };

    std::process::exit(exit_code);
}

fn setup_logging(verbose: bool) {
    let level = if verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    env_logger::Builder::new().filter_level(level).init();
}

fn handle_index(
    contract: PathBuf,
    spec: PathBuf,
    output_dir: Option<PathBuf>,
    config: Option<PathBuf>,
    stdout: bool,
) -> Result<()> {
    let config = IndexerConfig::load(config.as_deref())?.with_overrides(None, output_dir, None);
    let pair = ContractSpecPair::new(contract, spec);

    if stdout {
        let records = pipeline::index_pair(&pair)?;
        println!("{}", serde_json::to_string_pretty(&records)?);
        return Ok(());
    }

    let summary = pipeline::process_pair(&pair, &config.output_directory)
        .with_context(|| format!("indexing {} failed", pair.name))?;
    println!(
        "{}: {} records, {} properties -> {}",
        summary.name,
        summary.records,
        summary.properties,
        summary.output.display()
    );
    Ok(())
}

fn handle_batch(
    input_dir: Option<PathBuf>,
    output_dir: Option<PathBuf>,
    jobs: Option<usize>,
    config: Option<PathBuf>,
    name: Option<String>,
    format: OutputFormat,
) -> Result<()> {
    let config = IndexerConfig::load(config.as_deref())?.with_overrides(input_dir, output_dir, jobs);

    let report = pipeline::run_batch_filtered(&config, |pair| {
        cli::filters::matches_pair(pair, name.as_deref())
    })?;

    let output = match format {
        OutputFormat::Human => cli::output::format_report_human(&report),
        OutputFormat::Json => cli::output::format_report_json(&report)?,
        OutputFormat::Markdown => cli::output::format_report_markdown(&report),
    };
    print!("{}", output);

    // Individual pair failures are reported, not fatal
    Ok(())
}

fn handle_normalize(file: PathBuf) -> Result<()> {
    let snippet = std::fs::read_to_string(&file)
        .with_context(|| format!("cannot read {}", file.display()))?;
    println!("{}", cvl_index::normalize::normalize_code(&snippet)?);
    Ok(())
}
