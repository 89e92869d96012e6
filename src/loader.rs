//! Loading crates and RDF files from disk

use std::fs;
use std::path::{Path, PathBuf};

use oxrdfio::RdfFormat;
use serde_json::Value;
use url::Url;

use crate::error::{ConvertError, Result};
use crate::vocab::METADATA_DESCRIPTOR_ID;

/// What an input file holds, judged by its extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    /// RO-Crate JSON-LD metadata
    Crate,
    /// Any other RDF serialization
    Rdf(RdfFormat),
}

/// Classify an input path. Directories are crates.
pub fn input_kind(path: &Path) -> Option<InputKind> {
    if path.is_dir() {
        return Some(InputKind::Crate);
    }
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "json" | "jsonld" => Some(InputKind::Crate),
        "ttl" => Some(InputKind::Rdf(RdfFormat::Turtle)),
        "nt" => Some(InputKind::Rdf(RdfFormat::NTriples)),
        "nq" => Some(InputKind::Rdf(RdfFormat::NQuads)),
        "rdf" | "owl" | "xml" => Some(InputKind::Rdf(RdfFormat::RdfXml)),
        _ => None,
    }
}

/// Find the metadata file in a crate directory
///
/// `ro-crate-metadata.json` wins; otherwise the first `*-ro-crate-metadata.json`
/// in name order.
pub fn find_metadata_file(dir: &Path) -> Result<PathBuf> {
    let standard = dir.join(METADATA_DESCRIPTOR_ID);
    if standard.exists() {
        return Ok(standard);
    }

    let suffix = format!("-{}", METADATA_DESCRIPTOR_ID);
    let mut candidates: Vec<PathBuf> = fs::read_dir(dir)
        .map_err(|e| ConvertError::LoadError {
            path: dir.display().to_string(),
            reason: e.to_string(),
        })?
        .flatten()
        .map(|entry| entry.path())
        .filter(|p| {
            p.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.ends_with(&suffix))
        })
        .collect();
    candidates.sort();

    candidates
        .into_iter()
        .next()
        .ok_or_else(|| ConvertError::LoadError {
            path: dir.display().to_string(),
            reason: "No ro-crate-metadata.json found".to_string(),
        })
}

/// Resolve a crate path (directory or metadata file) to its metadata file
pub fn metadata_path(path: &Path) -> Result<PathBuf> {
    if path.is_dir() {
        find_metadata_file(path)
    } else if path.is_file() {
        Ok(path.to_path_buf())
    } else {
        Err(ConvertError::LoadError {
            path: path.display().to_string(),
            reason: "No such file or directory".to_string(),
        })
    }
}

/// `file://` URL of a local path
pub fn file_url(path: &Path) -> Result<Url> {
    let absolute = fs::canonicalize(path)?;
    Url::from_file_path(&absolute)
        .map_err(|_| ConvertError::InvalidIri(absolute.display().to_string()))
}

/// A crate document together with the base its relative @ids resolve against
#[derive(Debug, Clone)]
pub struct LoadedCrate {
    pub path: PathBuf,
    pub base: Url,
    pub document: Value,
}

/// Load a crate from a directory or metadata file
///
/// Without an explicit base, the metadata file's own `file://` URL is used.
pub fn load_crate(path: &Path, base: Option<&Url>) -> Result<LoadedCrate> {
    let metadata = metadata_path(path)?;
    let content = fs::read_to_string(&metadata).map_err(|e| ConvertError::LoadError {
        path: metadata.display().to_string(),
        reason: e.to_string(),
    })?;
    let document: Value = serde_json::from_str(&content).map_err(|e| ConvertError::LoadError {
        path: metadata.display().to_string(),
        reason: e.to_string(),
    })?;
    let base = match base {
        Some(base) => base.clone(),
        None => file_url(&metadata)?,
    };
    Ok(LoadedCrate {
        path: metadata,
        base,
        document,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_kind_by_extension() {
        assert_eq!(
            input_kind(Path::new("idr-studies.ttl")),
            Some(InputKind::Rdf(RdfFormat::Turtle))
        );
        assert_eq!(
            input_kind(Path::new("fbbi.owl")),
            Some(InputKind::Rdf(RdfFormat::RdfXml))
        );
        assert_eq!(
            input_kind(Path::new("idr0001-ro-crate-metadata.json")),
            Some(InputKind::Crate)
        );
        assert_eq!(input_kind(Path::new("notes.txt")), None);
    }

    #[test]
    fn test_find_metadata_file_prefers_standard_name() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("idr0001-ro-crate-metadata.json"), "{}").unwrap();
        assert_eq!(
            find_metadata_file(dir.path()).unwrap(),
            dir.path().join("idr0001-ro-crate-metadata.json")
        );

        fs::write(dir.path().join("ro-crate-metadata.json"), "{}").unwrap();
        assert_eq!(
            find_metadata_file(dir.path()).unwrap(),
            dir.path().join("ro-crate-metadata.json")
        );
    }

    #[test]
    fn test_find_metadata_file_missing() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            find_metadata_file(dir.path()),
            Err(ConvertError::LoadError { .. })
        ));
    }

    #[test]
    fn test_load_crate_uses_file_base() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ro-crate-metadata.json");
        fs::write(&path, r#"{"@graph": []}"#).unwrap();

        let loaded = load_crate(dir.path(), None).unwrap();
        assert_eq!(loaded.base.scheme(), "file");
        assert!(loaded.base.path().ends_with("/ro-crate-metadata.json"));

        let explicit = Url::parse("https://example.org/crates/a/ro-crate-metadata.json").unwrap();
        let loaded = load_crate(&path, Some(&explicit)).unwrap();
        assert_eq!(loaded.base, explicit);
    }
}
