//! Error types for IDR / RO-Crate conversion

use std::fmt;

use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConvertError {
    #[error("Failed to decode input as {encoding}: {reason}")]
    Encoding { encoding: String, reason: String },

    #[error("Unknown character encoding '{0}'")]
    UnknownEncoding(String),

    #[error("Entity '{from}' references '{id}', which is not in @graph")]
    DanglingReference { from: String, id: String },

    #[error("Invalid crate structure: {0}")]
    InvalidCrate(String),

    #[error("Missing root entity in crate")]
    MissingRootEntity,

    #[error("Failed to load {path}: {reason}")]
    LoadError { path: String, reason: String },

    #[error("RDF error: {0}")]
    Rdf(String),

    #[error("Invalid file name pattern: {0}")]
    Pattern(#[from] glob::PatternError),

    #[error("Invalid IRI '{0}'")]
    InvalidIri(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Conditions that are recovered from locally and reported alongside a result
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Warning {
    /// An ontology-backed field value that is not a recognizable accession.
    /// The field is emitted as a plain property instead.
    UnresolvedAccession { field: String, value: String },
    /// A referenced term missing from the supplied ontology file
    UnresolvedOntologyTerm { term: String },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::UnresolvedAccession { field, value } => {
                write!(f, "Unresolved accession '{}' in field '{}'", value, field)
            }
            Warning::UnresolvedOntologyTerm { term } => {
                write!(f, "Term '{}' not found in ontology", term)
            }
        }
    }
}

pub type Result<T, E = ConvertError> = std::result::Result<T, E>;
