use std::process::ExitCode;

use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use ncov_ingest::config::{ConfigLoader, ProviderPaths};
use ncov_ingest::domain::Provider;
use ncov_ingest::error::IngestError;
use ncov_ingest::fetch::FileFetcher;
use ncov_ingest::fs_util;
use ncov_ingest::hierarchy::LocationHierarchy;
use ncov_ingest::lookups::Lookups;
use ncov_ingest::output::JsonOutput;
use ncov_ingest::pipeline::{Curator, Pipeline};

#[derive(Parser)]
#[command(name = "ncov-ingest")]
#[command(about = "Curate GISAID and GenBank SARS-CoV-2 metadata into one canonical table")]
#[command(version, author)]
struct Cli {
    /// JSON config file (defaults to ncov-ingest.json when present)
    #[arg(long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Transform one provider's raw NDJSON into metadata and sequences")]
    Transform(TransformArgs),
    #[command(about = "Derive a location hierarchy from a metadata table")]
    Hierarchy(HierarchyArgs),
}

#[derive(Args)]
struct TransformArgs {
    #[arg(long, value_enum)]
    provider: Provider,

    #[arg(long)]
    input: Option<String>,

    #[arg(long)]
    annotations: Option<String>,

    #[arg(long)]
    location_hierarchy: Option<String>,

    /// Directory for metadata.tsv, sequences.fasta and the side table
    #[arg(long)]
    output_dir: Option<String>,

    #[arg(long)]
    output_metadata: Option<String>,

    #[arg(long)]
    output_fasta: Option<String>,

    /// GISAID additional info or GenBank problem records
    #[arg(long)]
    output_side_table: Option<String>,

    /// Also write the hierarchy derived from the curated table here
    #[arg(long)]
    hierarchy_out: Option<String>,
}

#[derive(Args)]
struct HierarchyArgs {
    metadata: String,

    #[arg(long)]
    output: String,
}

fn main() -> ExitCode {
    if let Err(report) = run() {
        eprintln!("{report:?}");
        if let Some(error) = report.downcast_ref::<IngestError>() {
            return ExitCode::from(map_exit_code(error));
        }
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn map_exit_code(error: &IngestError) -> u8 {
    match error {
        IngestError::UnparseableLocation { .. } => 2,
        IngestError::InputRead(_)
        | IngestError::InputParse { .. }
        | IngestError::AnnotationRead(_)
        | IngestError::AnnotationParse { .. }
        | IngestError::HierarchyRead(_)
        | IngestError::HierarchyParse { .. } => 3,
        _ => 1,
    }
}

fn run() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Transform(args) => run_transform(args, cli.config.as_deref()),
        Commands::Hierarchy(args) => run_hierarchy(args),
    }
}

fn run_transform(args: TransformArgs, config: Option<&str>) -> miette::Result<()> {
    let resolved = ConfigLoader::resolve(config)?;
    let paths = override_paths(resolved.provider(args.provider), &args);
    let location_hierarchy = args
        .location_hierarchy
        .map(Utf8PathBuf::from)
        .unwrap_or(resolved.location_hierarchy);

    let fetcher = FileFetcher::new(paths.input.clone());
    let curator = Curator::new(args.provider, Lookups::builtin())?;
    let mut pipeline = Pipeline::new(fetcher, curator, paths, location_hierarchy);
    if let Some(path) = args.hierarchy_out {
        pipeline = pipeline.with_hierarchy_output(Utf8PathBuf::from(path));
    }

    let summary = pipeline.run()?;
    JsonOutput::print_summary(&summary).map_err(|err| IngestError::Output(err.to_string()))?;
    Ok(())
}

fn override_paths(defaults: ProviderPaths, args: &TransformArgs) -> ProviderPaths {
    let mut paths = match &args.output_dir {
        Some(dir) => ProviderPaths::with_output_dir(
            defaults.provider,
            defaults.input.clone(),
            defaults.annotations.clone(),
            Utf8PathBuf::from(dir),
        ),
        None => defaults,
    };
    if let Some(input) = &args.input {
        paths.input = Utf8PathBuf::from(input);
    }
    if let Some(annotations) = &args.annotations {
        paths.annotations = Utf8PathBuf::from(annotations);
    }
    if let Some(metadata) = &args.output_metadata {
        paths.metadata = Utf8PathBuf::from(metadata);
    }
    if let Some(fasta) = &args.output_fasta {
        paths.sequences = Utf8PathBuf::from(fasta);
    }
    if let Some(side_table) = &args.output_side_table {
        paths.side_table = Utf8PathBuf::from(side_table);
    }
    paths
}

fn run_hierarchy(args: HierarchyArgs) -> miette::Result<()> {
    let metadata = Utf8PathBuf::from(args.metadata);
    let reader = fs_util::open_reader(&metadata)
        .map_err(|err| IngestError::InputRead(format!("{metadata}: {err}")))?;
    let hierarchy = LocationHierarchy::from_metadata(reader)?;
    let output = Utf8PathBuf::from(args.output);
    fs_util::write_atomic(&output, |out| hierarchy.write_tsv(out))?;
    tracing::info!(places = hierarchy.places().len(), output = %output, "hierarchy written");
    Ok(())
}
