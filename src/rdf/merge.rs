//! Merging crates and RDF files into one triple store

use std::path::{Path, PathBuf};

use tracing::{debug, info};
use url::Url;

use crate::error::{ConvertError, Result};
use crate::loader::{input_kind, load_crate, InputKind};

use super::convert::crate_to_triples;
use super::store::{load_rdf_file, TripleStore};

/// One merge input; `base` overrides the crate's file URL
#[derive(Debug, Clone)]
pub struct MergeSource {
    pub path: PathBuf,
    pub base: Option<Url>,
}

impl MergeSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            base: None,
        }
    }

    pub fn with_base(mut self, base: Url) -> Self {
        self.base = Some(base);
        self
    }
}

impl From<PathBuf> for MergeSource {
    fn from(path: PathBuf) -> Self {
        Self::new(path)
    }
}

impl From<&Path> for MergeSource {
    fn from(path: &Path) -> Self {
        Self::new(path)
    }
}

/// Triples of a single input
pub fn source_triples(source: &MergeSource) -> Result<TripleStore> {
    match input_kind(&source.path) {
        Some(InputKind::Crate) => {
            let loaded = load_crate(&source.path, source.base.as_ref())?;
            let triples = crate_to_triples(&loaded.document, &loaded.base).map_err(|e| {
                ConvertError::LoadError {
                    path: loaded.path.display().to_string(),
                    reason: e.to_string(),
                }
            })?;
            Ok(triples.into_iter().collect())
        }
        Some(InputKind::Rdf(_)) => load_rdf_file(&source.path),
        None => Err(ConvertError::LoadError {
            path: source.path.display().to_string(),
            reason: "Unrecognized input format".to_string(),
        }),
    }
}

/// Union the triples of every input
///
/// Any input that fails to load aborts the merge.
pub fn merge_sources<I, S>(sources: I) -> Result<TripleStore>
where
    I: IntoIterator<Item = S>,
    S: Into<MergeSource>,
{
    let mut store = TripleStore::new();
    let mut count = 0usize;
    for source in sources {
        let source = source.into();
        let triples = source_triples(&source)?;
        debug!(path = %source.path.display(), triples = triples.len(), "Merging input");
        store.extend(triples);
        count += 1;
    }
    info!(inputs = count, triples = store.len(), "Merged inputs");
    Ok(store)
}

/// Merge files and write the result as Turtle
pub fn merge_files(inputs: &[PathBuf], output: &Path) -> Result<TripleStore> {
    let store = merge_sources(inputs.iter().cloned())?;
    store.save_turtle(output)?;
    Ok(store)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vocab::crate_context;
    use serde_json::json;
    use std::fs;

    fn write_crate(dir: &Path, name: &str) -> PathBuf {
        let crate_dir = dir.join(name);
        fs::create_dir_all(&crate_dir).unwrap();
        let doc = json!({
            "@context": crate_context(),
            "@graph": [
                {"@id": "ro-crate-metadata.json", "@type": "CreativeWork", "about": {"@id": "./"}},
                {"@id": "./", "@type": "Dataset", "name": name, "hasPart": [{"@id": "./dataset1"}]},
                {"@id": "./dataset1", "@type": "Dataset"}
            ]
        });
        let path = crate_dir.join("ro-crate-metadata.json");
        fs::write(&path, serde_json::to_string_pretty(&doc).unwrap()).unwrap();
        path
    }

    #[test]
    fn test_merge_keeps_crates_apart() {
        let dir = tempfile::tempdir().unwrap();
        let a = write_crate(dir.path(), "a");
        let b = write_crate(dir.path(), "b");

        let store = merge_sources(vec![a, b]).unwrap();
        let datasets: Vec<String> = store
            .iter()
            .filter(|t| t.object.to_string() == "<http://schema.org/Dataset>")
            .map(|t| t.subject.to_string())
            .filter(|s| s.ends_with("dataset1>"))
            .collect();
        assert_eq!(datasets.len(), 2);
        assert!(datasets.iter().any(|s| s.ends_with("/a/dataset1>")));
        assert!(datasets.iter().any(|s| s.ends_with("/b/dataset1>")));
    }

    #[test]
    fn test_merge_deduplicates_repeated_input() {
        let dir = tempfile::tempdir().unwrap();
        let a = write_crate(dir.path(), "a");

        let once = merge_sources(vec![a.clone()]).unwrap();
        let twice = merge_sources(vec![a.clone(), a]).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_merge_crate_and_turtle() {
        let dir = tempfile::tempdir().unwrap();
        let a = write_crate(dir.path(), "a");
        let ttl = dir.path().join("extra.ttl");
        fs::write(
            &ttl,
            "<http://purl.obolibrary.org/obo/NCBITaxon_9606> <http://www.w3.org/2000/01/rdf-schema#label> \"Homo sapiens\" .\n",
        )
        .unwrap();
        let out = dir.path().join("merged").join("all.ttl");

        let store = merge_files(&[a, ttl], &out).unwrap();
        let text = fs::read_to_string(&out).unwrap();
        assert!(text.contains("Homo sapiens"));
        assert!(store.len() > 1);
    }

    #[test]
    fn test_explicit_base() {
        let dir = tempfile::tempdir().unwrap();
        let a = write_crate(dir.path(), "a");
        let base = Url::parse("https://example.org/crates/a/ro-crate-metadata.json").unwrap();

        let store = source_triples(&MergeSource::new(a).with_base(base)).unwrap();
        assert!(store
            .iter()
            .any(|t| t.subject.to_string() == "<https://example.org/crates/a/dataset1>"));
    }

    #[test]
    fn test_unknown_extension_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        fs::write(&path, "hello").unwrap();
        assert!(matches!(
            merge_sources(vec![path]),
            Err(ConvertError::LoadError { .. })
        ));
    }
}
