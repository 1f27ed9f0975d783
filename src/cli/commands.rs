//! CLI command definitions for labforge.

use anyhow::Context;
use clap::Parser;
use serde::Serialize;
use tracing::info;

use crate::analysis;
use crate::catalog;
use crate::config::LabConfig;
use crate::facade::LabFacade;
use crate::generator::{GenerationRequest, SampleSynthesizer};
use crate::persist::{GenerationReport, Persister};

/// Synthetic scientific dataset generator with blob and warehouse persistence.
#[derive(Parser)]
#[command(name = "labforge")]
#[command(about = "Generate and inspect synthetic scientific datasets")]
#[command(version)]
pub struct Cli {
    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short, long, default_value = "info", global = true)]
    pub log_level: String,
}

/// Available CLI subcommands.
#[derive(clap::Subcommand)]
pub enum Commands {
    /// Generate a synthetic dataset and persist it to the configured sinks.
    #[command(alias = "gen")]
    Generate(GenerateArgs),

    /// List stored dataset documents in the blob bucket.
    ListDatasets(ListDatasetsArgs),

    /// List tables in the configured warehouse dataset.
    ListTables,

    /// Show schema and row count for a table.
    TableInfo(TableInfoArgs),

    /// Execute a SQL query and print up to 100 result rows.
    Query(QueryArgs),

    /// Load a stored dataset and print per-group summary statistics.
    Summarize(SummarizeArgs),

    /// List the known domain presets.
    Domains,
}

/// Arguments for `labforge generate`.
#[derive(Parser, Debug)]
pub struct GenerateArgs {
    /// Domain preset: proteomics, genomics, clinical_trial, environmental,
    /// or behavioral. Unknown tags fall back to proteomics.
    #[arg(short, long, default_value = "proteomics")]
    pub domain: String,

    /// Samples to generate per group.
    #[arg(short = 'n', long, default_value = "50")]
    pub samples_per_group: usize,

    /// Number of experimental groups.
    #[arg(short, long, default_value = "2")]
    pub groups: usize,

    /// Disable Gaussian measurement noise.
    #[arg(long)]
    pub no_noise: bool,

    /// RNG seed for reproducible generation; random when omitted.
    #[arg(long)]
    pub seed: Option<u64>,
}

/// Arguments for `labforge list-datasets`.
#[derive(Parser, Debug)]
pub struct ListDatasetsArgs {
    /// Bucket to list instead of the configured one.
    #[arg(long)]
    pub bucket: Option<String>,
}

/// Arguments for `labforge table-info`.
#[derive(Parser, Debug)]
pub struct TableInfoArgs {
    /// Bare table name, or a fully-qualified project.dataset.table path.
    pub table: String,
}

/// Arguments for `labforge query`.
#[derive(Parser, Debug)]
pub struct QueryArgs {
    /// The SQL query to execute.
    pub sql: String,
}

/// Arguments for `labforge summarize`.
#[derive(Parser, Debug)]
pub struct SummarizeArgs {
    /// gs://bucket/key URI of a stored dataset document.
    pub gcs_path: String,
}

/// Parses command-line arguments.
pub fn parse_cli() -> Cli {
    Cli::parse()
}

/// Runs the command described by a parsed [`Cli`].
pub async fn run_with_cli(cli: Cli) -> anyhow::Result<()> {
    let config = LabConfig::from_env().context("loading configuration from environment")?;

    match cli.command {
        Commands::Generate(args) => generate(config, args).await,
        Commands::ListDatasets(args) => {
            let config = match args.bucket {
                Some(bucket) => config.with_bucket(bucket),
                None => config,
            };
            let facade = LabFacade::from_config(config);
            print_json(&facade.list_datasets().await?)
        }
        Commands::ListTables => {
            let facade = LabFacade::from_config(config);
            print_json(&facade.list_tables().await?)
        }
        Commands::TableInfo(args) => {
            let facade = LabFacade::from_config(config);
            print_json(&facade.table_info(&args.table).await?)
        }
        Commands::Query(args) => {
            let facade = LabFacade::from_config(config);
            print_json(&facade.execute_sql(&args.sql).await?)
        }
        Commands::Summarize(args) => {
            let facade = LabFacade::from_config(config);
            let envelope = facade.load_dataset(&args.gcs_path).await?;
            print_json(&analysis::summarize(&envelope.dataset))
        }
        Commands::Domains => print_json(&catalog::known_domains()),
    }
}

async fn generate(config: LabConfig, args: GenerateArgs) -> anyhow::Result<()> {
    let seed = args.seed.unwrap_or_else(rand::random);
    info!(
        domain = %args.domain,
        samples_per_group = args.samples_per_group,
        groups = args.groups,
        seed,
        "generating dataset"
    );

    let request = GenerationRequest::new(&args.domain)
        .with_samples_per_group(args.samples_per_group)
        .with_groups(args.groups)
        .with_noise(!args.no_noise);

    let dataset = SampleSynthesizer::new(seed).generate(&request)?;
    let outcome = Persister::from_config(&config).persist(&dataset).await;

    print_json(&GenerationReport::new(dataset, &outcome))
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
