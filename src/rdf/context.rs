//! Term resolution for crate JSON-LD
//!
//! Only the slice of JSON-LD context processing that IDR crates use:
//! remote RO-Crate context references are replaced by a built-in table,
//! inline objects add terms, prefixes, `@list` containers and `@id` coercion.

use std::collections::{HashMap, HashSet};

use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::error::{ConvertError, Result};
use crate::vocab::{CITE_AS, DCTERMS_NS, ROCRATE_PROFILE_PREFIX, SCHEMA_NS};

use super::namespaces;

/// Term and prefix mappings in effect for one crate document
#[derive(Debug, Clone)]
pub struct ResolvedContext {
    /// Short term to full IRI ("conformsTo" -> dcterms:conformsTo)
    pub terms: HashMap<String, String>,
    /// Prefix to namespace ("schema" -> "http://schema.org/")
    pub prefixes: HashMap<String, String>,
    /// Default namespace for unmapped terms
    pub vocab: Option<String>,
    /// Base that relative @ids resolve against
    pub base: Url,
    /// Terms whose array values form an ordered list
    pub list_terms: HashSet<String>,
    /// Terms whose string values are IRIs
    pub id_terms: HashSet<String>,
}

/// Checks for an RFC 3986 scheme followed by a colon
pub(crate) fn is_absolute_iri(term: &str) -> bool {
    let Some(colon_pos) = term.find(':') else {
        return false;
    };
    let mut chars = term[..colon_pos].chars();
    let Some(first) = chars.next() else {
        return false;
    };
    first.is_ascii_alphabetic()
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '+' || c == '-' || c == '.')
}

impl ResolvedContext {
    /// Empty context with only a base
    pub fn new(base: Url) -> Self {
        Self {
            terms: HashMap::new(),
            prefixes: HashMap::new(),
            vocab: None,
            base,
            list_terms: HashSet::new(),
            id_terms: HashSet::new(),
        }
    }

    /// Resolve the `@context` of a crate document
    pub fn from_document(doc: &Value, base: Url) -> Result<Self> {
        let mut ctx = Self::new(base);
        match doc.get("@context") {
            Some(context) => ctx.apply(context)?,
            None => debug!("Crate has no @context, using RO-Crate defaults"),
        }
        if ctx.vocab.is_none() {
            ctx.apply_rocrate_defaults();
        }
        Ok(ctx)
    }

    fn apply(&mut self, context: &Value) -> Result<()> {
        match context {
            Value::String(url) => {
                if url.starts_with(ROCRATE_PROFILE_PREFIX) {
                    self.apply_rocrate_defaults();
                } else {
                    debug!(context = %url, "Skipping unknown remote context");
                }
            }
            Value::Array(items) => {
                for item in items {
                    self.apply(item)?;
                }
            }
            Value::Object(obj) => {
                // Prefixes first so compact IRIs in term definitions expand
                for (key, value) in obj {
                    if let Some(ns) = value.as_str() {
                        if !key.starts_with('@') && (ns.ends_with('/') || ns.ends_with('#')) {
                            self.prefixes.insert(key.clone(), ns.to_string());
                        }
                    }
                }
                for (key, value) in obj {
                    self.apply_definition(key, value)?;
                }
            }
            Value::Null => {}
            other => {
                return Err(ConvertError::InvalidCrate(format!(
                    "Unsupported @context entry: {}",
                    other
                )))
            }
        }
        Ok(())
    }

    fn apply_definition(&mut self, key: &str, value: &Value) -> Result<()> {
        match (key, value) {
            ("@vocab", Value::String(v)) => self.vocab = Some(v.clone()),
            ("@base", Value::String(b)) => {
                self.base = self
                    .base
                    .join(b)
                    .map_err(|_| ConvertError::InvalidIri(b.clone()))?;
            }
            (_, Value::String(iri)) => {
                let iri = self.expand_compact(iri);
                self.terms.insert(key.to_string(), iri);
            }
            (_, Value::Object(def)) => {
                if let Some(iri) = def.get("@id").and_then(|v| v.as_str()) {
                    let iri = self.expand_compact(iri);
                    self.terms.insert(key.to_string(), iri);
                }
                if def.get("@container").and_then(|v| v.as_str()) == Some("@list") {
                    self.list_terms.insert(key.to_string());
                }
                if def.get("@type").and_then(|v| v.as_str()) == Some("@id") {
                    self.id_terms.insert(key.to_string());
                }
            }
            _ => debug!(term = %key, "Ignoring context definition"),
        }
        Ok(())
    }

    /// Mappings of the published RO-Crate context that IDR crates rely on
    fn apply_rocrate_defaults(&mut self) {
        self.vocab.get_or_insert_with(|| SCHEMA_NS.to_string());
        self.terms
            .entry("conformsTo".to_string())
            .or_insert_with(|| format!("{}conformsTo", DCTERMS_NS));
        self.terms
            .entry("cite-as".to_string())
            .or_insert_with(|| CITE_AS.to_string());
        for (prefix, ns) in namespaces::COMMON_PREFIXES {
            self.prefixes
                .entry(prefix.to_string())
                .or_insert_with(|| ns.to_string());
        }
    }

    fn expand_compact(&self, value: &str) -> String {
        if let Some((prefix, local)) = value.split_once(':') {
            if let Some(ns) = self.prefixes.get(prefix) {
                return format!("{}{}", ns, local);
            }
        }
        value.to_string()
    }

    /// Expand a property key or type name to an IRI
    ///
    /// Resolution order: term table, known prefix, absolute IRI, @vocab.
    /// Returns `None` when nothing applies.
    pub fn expand_term(&self, term: &str) -> Option<String> {
        if let Some(iri) = self.terms.get(term) {
            return Some(iri.clone());
        }
        if let Some((prefix, local)) = term.split_once(':') {
            if let Some(ns) = self.prefixes.get(prefix) {
                return Some(format!("{}{}", ns, local));
            }
        }
        if is_absolute_iri(term) {
            return Some(term.to_string());
        }
        self.vocab.as_ref().map(|vocab| format!("{}{}", vocab, term))
    }

    /// Expand an @id value
    ///
    /// Compact IRIs with a known prefix expand, absolute IRIs stay, and
    /// everything else resolves against the base.
    pub fn expand_id(&self, id: &str) -> Result<String> {
        if let Some((prefix, local)) = id.split_once(':') {
            if !local.starts_with("//") {
                if let Some(ns) = self.prefixes.get(prefix) {
                    return Ok(format!("{}{}", ns, local));
                }
            }
        }
        if is_absolute_iri(id) {
            return Ok(id.to_string());
        }
        self.base
            .join(id)
            .map(String::from)
            .map_err(|_| ConvertError::InvalidIri(id.to_string()))
    }

    pub fn is_list(&self, term: &str) -> bool {
        self.list_terms.contains(term)
    }

    pub fn is_id_coerced(&self, term: &str) -> bool {
        self.id_terms.contains(term)
    }
}
