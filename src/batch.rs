//! Batch conversion of a directory tree of IDR study files
//!
//! Each input is converted on its own; a failure is recorded and the run
//! moves on. Afterwards an index crate and a merged Turtle file can be
//! written over everything that succeeded.

use std::fs;
use std::path::{Path, PathBuf};

use glob::Pattern;
use serde::Serialize;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::encode::{to_json_string, RoCrateEncoder};
use crate::error::{ConvertError, Result, Warning};
use crate::id::crate_filename;
use crate::idr::{DecodeOptions, IdrDecoder};
use crate::index::{build_index_crate, IndexEntry};
use crate::rdf::merge_files;
use crate::vocab::METADATA_DESCRIPTOR_ID;

/// Options for a batch run
#[derive(Debug, Clone)]
pub struct BatchOptions {
    /// Directory searched recursively for inputs
    pub input_dir: PathBuf,
    /// Directory receiving one subdirectory per converted study
    pub output_dir: PathBuf,
    /// File name glob inputs must match
    pub pattern: String,
    /// Write `ro-crate-metadata.json` listing every generated crate
    pub index_crate: bool,
    /// Merge the generated crates into this Turtle file
    pub ttl_out: Option<PathBuf>,
    pub encoding: Option<String>,
    pub pretty: bool,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("."),
            output_dir: PathBuf::from("ro-crates"),
            pattern: "idr*-study.txt".to_string(),
            index_crate: true,
            ttl_out: None,
            encoding: None,
            pretty: true,
        }
    }
}

/// A converted input
#[derive(Debug, Clone, Serialize)]
pub struct BatchItem {
    pub input: PathBuf,
    pub output: PathBuf,
    pub accession: Option<String>,
    pub warnings: Vec<Warning>,
}

/// An input whose conversion failed
#[derive(Debug, Clone, Serialize)]
pub struct BatchFailure {
    pub input: PathBuf,
    pub error: String,
}

/// Summary of a batch run
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchReport {
    pub succeeded: Vec<BatchItem>,
    pub failed: Vec<BatchFailure>,
    pub index_path: Option<PathBuf>,
    pub ttl_path: Option<PathBuf>,
}

impl BatchReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn warning_count(&self) -> usize {
        self.succeeded.iter().map(|i| i.warnings.len()).sum()
    }
}

/// Progress callbacks for a batch run
pub trait BatchObserver {
    /// Called once with the number of discovered inputs
    fn started(&self, _total: usize) {}

    /// Called after each input, successful or not
    fn converted(&self, _input: &Path, _ok: bool) {}

    fn finished(&self, _report: &BatchReport) {}
}

/// An observer that ignores every event
pub struct NoOpObserver;

impl BatchObserver for NoOpObserver {}

/// Recursively find files whose name matches `pattern`, sorted by path
///
/// Symlinks are not followed. Entries below `dir` that cannot be read are
/// logged and skipped; only an unreadable `dir` itself is an error.
pub fn discover_inputs(dir: &Path, pattern: &str) -> Result<Vec<PathBuf>> {
    let pattern = Pattern::new(pattern)?;
    let mut found = Vec::new();
    for entry in WalkDir::new(dir).follow_links(false) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) if e.depth() == 0 => {
                return Err(ConvertError::LoadError {
                    path: dir.display().to_string(),
                    reason: e.to_string(),
                })
            }
            Err(e) => {
                warn!(path = ?e.path(), error = %e, "Skipping unreadable entry");
                continue;
            }
        };
        if entry.file_type().is_file()
            && entry
                .file_name()
                .to_str()
                .is_some_and(|n| pattern.matches(n))
        {
            found.push(entry.into_path());
        }
    }
    found.sort();
    debug!(dir = %dir.display(), pattern = %pattern, count = found.len(), "Discovered inputs");
    Ok(found)
}

/// Output directory for an input: `<output_dir>/<file stem>`
fn crate_dir_for(input: &Path, output_dir: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("study");
    output_dir.join(stem)
}

/// Convert one IDR file into `<output_dir>/<stem>/<accession>-ro-crate-metadata.json`
pub fn convert_file(input: &Path, options: &BatchOptions) -> Result<BatchItem> {
    let decoder = IdrDecoder::new(DecodeOptions {
        encoding: options.encoding.clone(),
    });
    let study = decoder.decode_path(input)?;
    let encoded = RoCrateEncoder.encode_with_warnings(&study);

    let accession = study.accession().map(String::from);
    let crate_dir = crate_dir_for(input, &options.output_dir);
    fs::create_dir_all(&crate_dir)?;
    let output = crate_dir.join(crate_filename(accession.as_deref()));
    fs::write(&output, to_json_string(&encoded.document, options.pretty)?)?;

    for warning in &encoded.warnings {
        warn!(input = %input.display(), "{}", warning);
    }
    debug!(
        input = %input.display(),
        output = %output.display(),
        entities = encoded.stats.entities,
        "Converted study"
    );
    Ok(BatchItem {
        input: input.to_path_buf(),
        output,
        accession,
        warnings: encoded.warnings,
    })
}

fn index_entry(item: &BatchItem, output_dir: &Path) -> Result<IndexEntry> {
    let content = fs::read_to_string(&item.output)?;
    let doc = serde_json::from_str(&content)?;
    let dir = item
        .output
        .parent()
        .and_then(|p| p.strip_prefix(output_dir).ok())
        .map(|p| p.to_string_lossy().replace('\\', "/"))
        .unwrap_or_default();
    let file = item
        .output
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    IndexEntry::from_crate(&dir, &file, &doc)
}

/// Run a batch conversion
///
/// Per-file failures end up in the report. Errors from the index crate or
/// the Turtle merge abort the run.
pub fn run_batch(options: &BatchOptions, observer: &dyn BatchObserver) -> Result<BatchReport> {
    let inputs = discover_inputs(&options.input_dir, &options.pattern)?;
    info!(
        inputs = inputs.len(),
        input_dir = %options.input_dir.display(),
        output_dir = %options.output_dir.display(),
        "Starting batch conversion"
    );
    observer.started(inputs.len());

    let mut report = BatchReport::default();
    for input in &inputs {
        match convert_file(input, options) {
            Ok(item) => {
                observer.converted(input, true);
                report.succeeded.push(item);
            }
            Err(e) => {
                warn!(input = %input.display(), error = %e, "Conversion failed");
                observer.converted(input, false);
                report.failed.push(BatchFailure {
                    input: input.clone(),
                    error: e.to_string(),
                });
            }
        }
    }

    if options.index_crate && !report.succeeded.is_empty() {
        let entries = report
            .succeeded
            .iter()
            .map(|item| index_entry(item, &options.output_dir))
            .collect::<Result<Vec<_>>>()?;
        let path = options.output_dir.join(METADATA_DESCRIPTOR_ID);
        fs::write(&path, to_json_string(&build_index_crate(&entries), options.pretty)?)?;
        info!(path = %path.display(), crates = entries.len(), "Wrote index crate");
        report.index_path = Some(path);
    }

    if let Some(ttl_out) = &options.ttl_out {
        let mut sources: Vec<PathBuf> = report.index_path.iter().cloned().collect();
        sources.extend(report.succeeded.iter().map(|item| item.output.clone()));
        let store = merge_files(&sources, ttl_out)?;
        info!(path = %ttl_out.display(), triples = store.len(), "Wrote merged Turtle");
        report.ttl_path = Some(ttl_out.clone());
    }

    info!(
        succeeded = report.succeeded.len(),
        failed = report.failed.len(),
        warnings = report.warning_count(),
        "Batch conversion finished"
    );
    observer.finished(&report);
    Ok(report)
}
