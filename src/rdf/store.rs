//! Deduplicated triple sets and their (de)serialization

use std::collections::HashSet;
use std::fs;
use std::io::Write;
use std::path::Path;

use oxrdf::Triple;
use oxrdfio::{RdfFormat, RdfParser, RdfSerializer};
use tracing::debug;

use crate::error::{ConvertError, Result};
use crate::loader::{file_url, input_kind, InputKind};

use super::namespaces::COMMON_PREFIXES;

/// A set of triples. Inserting a triple twice keeps one copy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TripleStore {
    triples: HashSet<Triple>,
}

impl TripleStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a triple, returning false when it was already present
    pub fn insert(&mut self, triple: Triple) -> bool {
        self.triples.insert(triple)
    }

    pub fn contains(&self, triple: &Triple) -> bool {
        self.triples.contains(triple)
    }

    pub fn len(&self) -> usize {
        self.triples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triples.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Triple> {
        self.triples.iter()
    }

    /// Triples ordered by their N-Triples form
    pub fn sorted(&self) -> Vec<&Triple> {
        let mut triples: Vec<&Triple> = self.triples.iter().collect();
        triples.sort_by_cached_key(|t| t.to_string());
        triples
    }

    /// Write the store as Turtle with the given prefixes
    ///
    /// Triples are written in sorted order so equal stores produce equal bytes.
    pub fn write_turtle<W: Write>(&self, writer: W, prefixes: &[(&str, &str)]) -> Result<W> {
        let mut serializer = RdfSerializer::from_format(RdfFormat::Turtle);
        for (name, iri) in prefixes {
            serializer = serializer
                .with_prefix(*name, *iri)
                .map_err(|e| ConvertError::Rdf(format!("Invalid prefix '{}': {}", name, e)))?;
        }
        let mut serializer = serializer.for_writer(writer);
        for triple in self.sorted() {
            serializer
                .serialize_triple(triple)
                .map_err(|e| ConvertError::Rdf(e.to_string()))?;
        }
        serializer
            .finish()
            .map_err(|e| ConvertError::Rdf(e.to_string()))
    }

    /// Turtle text using the common prefixes
    pub fn to_turtle(&self) -> Result<String> {
        let buffer = self.write_turtle(Vec::new(), COMMON_PREFIXES)?;
        String::from_utf8(buffer)
            .map_err(|e| ConvertError::Rdf(format!("Invalid UTF-8 in output: {}", e)))
    }

    /// Write Turtle to a file, creating parent directories
    pub fn save_turtle(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, self.to_turtle()?)?;
        debug!(path = %path.display(), triples = self.len(), "Wrote Turtle");
        Ok(())
    }
}

impl Extend<Triple> for TripleStore {
    fn extend<I: IntoIterator<Item = Triple>>(&mut self, iter: I) {
        self.triples.extend(iter);
    }
}

impl FromIterator<Triple> for TripleStore {
    fn from_iter<I: IntoIterator<Item = Triple>>(iter: I) -> Self {
        Self {
            triples: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for TripleStore {
    type Item = Triple;
    type IntoIter = std::collections::hash_set::IntoIter<Triple>;

    fn into_iter(self) -> Self::IntoIter {
        self.triples.into_iter()
    }
}

/// Parse RDF bytes into triples; named graphs are flattened into one
pub fn parse_rdf(input: &[u8], format: RdfFormat, base: Option<&str>) -> Result<Vec<Triple>> {
    let mut parser = RdfParser::from_format(format);
    if let Some(base_iri) = base {
        parser = parser
            .with_base_iri(base_iri)
            .map_err(|e| ConvertError::Rdf(format!("Invalid base IRI: {}", e)))?;
    }

    let quads = parser
        .for_reader(input)
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| ConvertError::Rdf(format!("Failed to parse RDF: {}", e)))?;

    Ok(quads
        .into_iter()
        .map(|q| Triple {
            subject: q.subject,
            predicate: q.predicate,
            object: q.object,
        })
        .collect())
}

/// Load an RDF file, picking the format from its extension
///
/// Relative IRIs resolve against the file's own URL.
pub fn load_rdf_file(path: &Path) -> Result<TripleStore> {
    let Some(InputKind::Rdf(format)) = input_kind(path) else {
        return Err(ConvertError::LoadError {
            path: path.display().to_string(),
            reason: "Unrecognized RDF file extension".to_string(),
        });
    };
    let bytes = fs::read(path).map_err(|e| ConvertError::LoadError {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;
    let base = file_url(path)?;
    let triples = parse_rdf(&bytes, format, Some(base.as_str())).map_err(|e| {
        ConvertError::LoadError {
            path: path.display().to_string(),
            reason: e.to_string(),
        }
    })?;
    debug!(path = %path.display(), triples = triples.len(), "Loaded RDF");
    Ok(triples.into_iter().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use oxrdf::{Literal, NamedNode};

    fn triple(s: &str, p: &str, o: &str) -> Triple {
        Triple::new(
            NamedNode::new_unchecked(s),
            NamedNode::new_unchecked(p),
            Literal::new_simple_literal(o),
        )
    }

    #[test]
    fn test_insert_deduplicates() {
        let mut store = TripleStore::new();
        let t = triple("http://example.org/a", "http://schema.org/name", "A");
        assert!(store.insert(t.clone()));
        assert!(!store.insert(t));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_turtle_is_deterministic() {
        let a: TripleStore = vec![
            triple("http://example.org/b", "http://schema.org/name", "B"),
            triple("http://example.org/a", "http://schema.org/name", "A"),
        ]
        .into_iter()
        .collect();
        let b: TripleStore = vec![
            triple("http://example.org/a", "http://schema.org/name", "A"),
            triple("http://example.org/b", "http://schema.org/name", "B"),
        ]
        .into_iter()
        .collect();

        let ttl = a.to_turtle().unwrap();
        assert_eq!(ttl, b.to_turtle().unwrap());
        assert!(ttl.contains("@prefix schema: <http://schema.org/>"));
        assert!(ttl.find("example.org/a").unwrap() < ttl.find("example.org/b").unwrap());
    }

    #[test]
    fn test_parse_turtle_round_trip() {
        let store: TripleStore = vec![triple(
            "http://purl.obolibrary.org/obo/FBbi_00000246",
            "http://www.w3.org/2000/01/rdf-schema#label",
            "fluorescence microscopy",
        )]
        .into_iter()
        .collect();
        let ttl = store.to_turtle().unwrap();
        let parsed: TripleStore = parse_rdf(ttl.as_bytes(), RdfFormat::Turtle, None)
            .unwrap()
            .into_iter()
            .collect();
        assert_eq!(parsed, store);
    }

    #[test]
    fn test_parse_error() {
        let result = parse_rdf(b"<a> <b> .", RdfFormat::Turtle, None);
        assert!(matches!(result, Err(ConvertError::Rdf(_))));
    }

    #[test]
    fn test_load_rdf_file_relative_iris() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("extra.ttl");
        fs::write(&path, "<#thing> <http://schema.org/name> \"Thing\" .\n").unwrap();

        let store = load_rdf_file(&path).unwrap();
        let t = store.iter().next().unwrap();
        assert!(t.subject.to_string().starts_with("<file://"));
        assert!(t.subject.to_string().ends_with("extra.ttl#thing>"));
    }
}
