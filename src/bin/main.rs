//! IDR / RO-Crate conversion CLI
//!
//! Command-line tool for converting IDR study files to RO-Crates and back,
//! batch conversion, Turtle merging and ontology subset extraction.

use std::fs;
use std::io::{self, IsTerminal};
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use tracing::{info, warn};

use idr_rocrate::batch::{run_batch, BatchObserver, BatchOptions, BatchReport};
use idr_rocrate::id::crate_filename;
use idr_rocrate::logging::{init_logging, LogConfig, LogFormat};
use idr_rocrate::rdf::{
    extract_subset, load_rdf_file, merge_files, source_triples, MergeSource, SubsetTarget,
};
use idr_rocrate::{
    to_json_string, ConvertError, DecodeOptions, IdrDecoder, IdrEncoder, RoCrateDecoder,
    RoCrateEncoder,
};

#[derive(Parser)]
#[command(name = "idr-rocrate")]
#[command(about = "Convert IDR study metadata to and from RO-Crate")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Adjust log verbosity (-v for info, -vv for debug, -q for errors only)
    #[command(flatten)]
    verbosity: Verbosity<WarnLevel>,

    /// Log output format
    #[arg(long = "log-format", value_enum, default_value = "pretty", global = true)]
    log_format: LogFormatArg,
}

#[derive(Clone, Copy, ValueEnum)]
enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert an IDR study file to an RO-Crate
    ToCrate(ToCrateArgs),
    /// Convert an RO-Crate back to an IDR study file
    ToIdr(ToIdrArgs),
    /// Convert every matching study file under a directory
    Batch(BatchArgs),
    /// Merge crates and RDF files into one Turtle file
    Merge(MergeArgs),
    /// Extract the hierarchy subset of an ontology used by a merged graph
    Extract(ExtractArgs),
}

#[derive(Args)]
struct ToCrateArgs {
    /// IDR study file (tab-delimited)
    input: PathBuf,

    /// Output file or directory (default: <accession>-ro-crate-metadata.json)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Character encoding of the input (default: utf-8)
    #[arg(long)]
    encoding: Option<String>,

    /// Pretty-print JSON output
    #[arg(long)]
    pretty: bool,
}

#[derive(Args)]
struct ToIdrArgs {
    /// RO-Crate directory or metadata file
    input: PathBuf,

    /// Output file
    #[arg(short, long, default_value = "idr-metadata.txt")]
    output: PathBuf,

    /// Character encoding of the input (default: utf-8)
    #[arg(long)]
    encoding: Option<String>,
}

#[derive(Args)]
struct BatchArgs {
    /// Directory searched recursively for study files
    #[arg(long, default_value = ".")]
    input_dir: PathBuf,

    /// Directory receiving the generated crates
    #[arg(long, default_value = "ro-crates")]
    output_dir: PathBuf,

    /// File name pattern of study files
    #[arg(long, default_value = "idr*-study.txt")]
    pattern: String,

    /// Don't write an index crate over the generated crates
    #[arg(long)]
    no_index_crate: bool,

    /// Merge all generated crates into this Turtle file
    #[arg(long, value_name = "PATH")]
    ttl_out: Option<PathBuf>,

    /// Character encoding of the inputs (default: utf-8)
    #[arg(long)]
    encoding: Option<String>,

    /// Write compact JSON
    #[arg(long)]
    compact: bool,
}

#[derive(Args)]
struct MergeArgs {
    /// Crates (directories or metadata files) and RDF files to merge
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Output Turtle file
    #[arg(short, long)]
    output: PathBuf,
}

#[derive(Args)]
struct ExtractArgs {
    /// Merged graph (Turtle or any merge input)
    #[arg(long)]
    merged: PathBuf,

    /// Full ontology file
    #[arg(long)]
    ontology: PathBuf,

    /// Ontology the subset is cut from
    #[arg(long, value_enum)]
    target: TargetArg,

    /// Output Turtle file
    #[arg(short, long)]
    output: PathBuf,
}

#[derive(Clone, Copy, ValueEnum)]
enum TargetArg {
    Fbbi,
    Ncbitaxon,
}

/// Resolve the crate output path; a directory receives the default file name
fn crate_output_path(output: Option<&Path>, accession: Option<&str>) -> PathBuf {
    let file_name = crate_filename(accession);
    match output {
        Some(path) if path.is_dir() => path.join(file_name),
        Some(path) => path.to_path_buf(),
        None => PathBuf::from(file_name),
    }
}

fn write_output(path: &Path, content: &str) -> Result<(), ConvertError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, content)?;
    Ok(())
}

fn run_to_crate(args: ToCrateArgs) -> Result<(), ConvertError> {
    let decoder = IdrDecoder::new(DecodeOptions {
        encoding: args.encoding,
    });
    let study = decoder.decode_path(&args.input)?;
    let result = RoCrateEncoder.encode_with_warnings(&study);
    for warning in &result.warnings {
        warn!("{}", warning);
    }

    let output = crate_output_path(args.output.as_deref(), study.accession());
    write_output(&output, &to_json_string(&result.document, args.pretty)?)?;
    eprintln!(
        "Wrote {} ({} entities, {} defined terms, {} warnings)",
        output.display(),
        result.stats.entities,
        result.stats.defined_terms,
        result.warnings.len()
    );
    Ok(())
}

fn run_to_idr(args: ToIdrArgs) -> Result<(), ConvertError> {
    let decoder = RoCrateDecoder::new(DecodeOptions {
        encoding: args.encoding,
    });
    let study = decoder.decode_path(&args.input)?;
    write_output(&args.output, &IdrEncoder.encode(&study))?;
    eprintln!(
        "Wrote {} ({} fields, {} sections)",
        args.output.display(),
        study.root.len(),
        study.sections.len()
    );
    Ok(())
}

/// Progress bar over batch inputs, hidden when stderr is not a terminal
struct ProgressObserver {
    bar: ProgressBar,
}

impl ProgressObserver {
    fn new() -> Self {
        let bar = ProgressBar::hidden();
        if io::stderr().is_terminal() {
            bar.set_draw_target(ProgressDrawTarget::stderr());
        }
        let style = ProgressStyle::with_template("{spinner:.dim} [{bar:25}] {pos}/{len}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=>-");
        bar.set_style(style);
        Self { bar }
    }
}

impl BatchObserver for ProgressObserver {
    fn started(&self, total: usize) {
        self.bar.set_length(total as u64);
    }

    fn converted(&self, input: &Path, _ok: bool) {
        if let Some(name) = input.file_name() {
            self.bar.set_message(name.to_string_lossy().into_owned());
        }
        self.bar.inc(1);
    }

    fn finished(&self, _report: &BatchReport) {
        self.bar.finish_and_clear();
    }
}

fn run_batch_command(args: BatchArgs) -> Result<bool, ConvertError> {
    let options = BatchOptions {
        input_dir: args.input_dir,
        output_dir: args.output_dir,
        pattern: args.pattern,
        index_crate: !args.no_index_crate,
        ttl_out: args.ttl_out,
        encoding: args.encoding,
        pretty: !args.compact,
    };
    let report = run_batch(&options, &ProgressObserver::new())?;

    for failure in &report.failed {
        eprintln!("Failed: {}: {}", failure.input.display(), failure.error);
    }
    eprintln!(
        "Converted {} of {} files ({} failed, {} warnings)",
        report.succeeded.len(),
        report.succeeded.len() + report.failed.len(),
        report.failed.len(),
        report.warning_count()
    );
    if let Some(path) = &report.index_path {
        eprintln!("Wrote index crate to {}", path.display());
    }
    if let Some(path) = &report.ttl_path {
        eprintln!("Wrote merged Turtle to {}", path.display());
    }
    Ok(report.is_success())
}

fn run_merge(args: MergeArgs) -> Result<(), ConvertError> {
    let store = merge_files(&args.inputs, &args.output)?;
    eprintln!(
        "Merged {} inputs into {} ({} triples)",
        args.inputs.len(),
        args.output.display(),
        store.len()
    );
    Ok(())
}

fn run_extract(args: ExtractArgs) -> Result<(), ConvertError> {
    let target = match args.target {
        TargetArg::Fbbi => SubsetTarget::fbbi(),
        TargetArg::Ncbitaxon => SubsetTarget::ncbitaxon(),
    };
    let merged = source_triples(&MergeSource::new(&args.merged))?;
    let ontology = load_rdf_file(&args.ontology)?;
    info!(
        merged = merged.len(),
        ontology = ontology.len(),
        "Loaded graphs"
    );

    let result = extract_subset(&merged, &ontology, &target);
    result.store.save_turtle(&args.output)?;
    eprintln!(
        "Wrote {} terms to {} ({} not found in ontology)",
        result.selected.len(),
        args.output.display(),
        result.unresolved.len()
    );
    Ok(())
}

fn log_config_from_cli(cli: &Cli) -> LogConfig {
    let format = match cli.log_format {
        LogFormatArg::Pretty => LogFormat::Pretty,
        LogFormatArg::Compact => LogFormat::Compact,
        LogFormatArg::Json => LogFormat::Json,
    };
    LogConfig {
        use_env_filter: !cli.verbosity.is_present(),
        ..LogConfig::default()
    }
    .with_level_filter(cli.verbosity.tracing_level_filter())
    .with_format(format)
    .with_ansi(io::stderr().is_terminal())
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = init_logging(&log_config_from_cli(&cli)) {
        eprintln!("Error: failed to initialize logging: {}", e);
        std::process::exit(1);
    }

    let result = match cli.command {
        Commands::ToCrate(args) => run_to_crate(args).map(|_| true),
        Commands::ToIdr(args) => run_to_idr(args).map(|_| true),
        Commands::Batch(args) => run_batch_command(args),
        Commands::Merge(args) => run_merge(args).map(|_| true),
        Commands::Extract(args) => run_extract(args).map(|_| true),
    };

    match result {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}
