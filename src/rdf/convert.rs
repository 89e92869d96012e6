//! Crate JSON-LD to RDF triples

use oxrdf::{BlankNode, Literal, NamedNode, NamedOrBlankNode, Term, Triple};
use serde_json::Value;
use sha2::{Digest, Sha256};
use tracing::{debug, warn};
use url::Url;

use crate::collect::{extract_types, graph_of};
use crate::error::{ConvertError, Result};

use super::context::ResolvedContext;
use super::namespaces::{RDF_FIRST, RDF_NIL, RDF_REST, RDF_TYPE, XSD_BOOLEAN, XSD_DOUBLE, XSD_INTEGER};

/// Convert every entity of a crate's @graph into triples
///
/// Relative @ids resolve against `base`, so two crates that both use
/// `./dataset1` produce distinct subjects when their bases differ.
pub fn crate_to_triples(doc: &Value, base: &Url) -> Result<Vec<Triple>> {
    let ctx = ResolvedContext::from_document(doc, base.clone())?;
    let mut triples = Vec::new();
    for entity in graph_of(doc)? {
        entity_to_triples(entity, &ctx, &mut triples)?;
    }
    debug!(base = %base, triples = triples.len(), "Converted crate to triples");
    Ok(triples)
}

fn named_node(iri: String) -> Result<NamedNode> {
    NamedNode::new(iri.as_str()).map_err(|_| ConvertError::InvalidIri(iri))
}

fn entity_to_triples(entity: &Value, ctx: &ResolvedContext, triples: &mut Vec<Triple>) -> Result<()> {
    let Some(obj) = entity.as_object() else {
        return Err(ConvertError::InvalidCrate(
            "@graph entries must be objects".to_string(),
        ));
    };
    let Some(id) = obj.get("@id").and_then(|v| v.as_str()) else {
        debug!("Skipping entity without @id");
        return Ok(());
    };
    let subject: NamedOrBlankNode = match id.strip_prefix("_:") {
        Some(label) => BlankNode::new(label)
            .map_err(|_| ConvertError::InvalidIri(id.to_string()))?
            .into(),
        None => named_node(ctx.expand_id(id)?)?.into(),
    };

    let rdf_type = NamedNode::new_unchecked(RDF_TYPE);
    for t in extract_types(entity) {
        match ctx.expand_term(&t).map(named_node) {
            Some(Ok(class)) => triples.push(Triple::new(subject.clone(), rdf_type.clone(), class)),
            _ => warn!(entity = %id, r#type = %t, "Skipping unexpandable type"),
        }
    }

    for (key, value) in obj {
        if key.starts_with('@') {
            continue;
        }
        let predicate = match ctx.expand_term(key).map(named_node) {
            Some(Ok(predicate)) => predicate,
            Some(Err(_)) => {
                warn!(entity = %id, property = %key, "Skipping property with invalid IRI");
                continue;
            }
            None => {
                debug!(entity = %id, property = %key, "Skipping property with no IRI mapping");
                continue;
            }
        };

        if ctx.is_list(key) {
            let items = match value {
                Value::Object(o) => o.get("@list").cloned().unwrap_or(Value::Null),
                other => other.clone(),
            };
            let items: Vec<&Value> = match &items {
                Value::Array(arr) => arr.iter().collect(),
                Value::Null => vec![],
                single => vec![single],
            };
            let mut objects = Vec::with_capacity(items.len());
            for item in items {
                objects.extend(value_to_terms(item, key, ctx)?);
            }
            let head = list_to_triples(&subject, &predicate, objects, triples);
            triples.push(Triple::new(subject.clone(), predicate, head));
            continue;
        }

        for object in value_to_terms(value, key, ctx)? {
            triples.push(Triple::new(subject.clone(), predicate.clone(), object));
        }
    }
    Ok(())
}

/// Convert a property value to RDF terms
///
/// Nulls and values that cannot be expressed are dropped.
fn value_to_terms(value: &Value, key: &str, ctx: &ResolvedContext) -> Result<Vec<Term>> {
    let term = match value {
        Value::Null => return Ok(vec![]),
        Value::Array(items) => {
            let mut terms = Vec::new();
            for item in items {
                terms.extend(value_to_terms(item, key, ctx)?);
            }
            return Ok(terms);
        }
        Value::String(s) if ctx.is_id_coerced(key) => named_node(ctx.expand_id(s)?)?.into(),
        Value::String(s) => Literal::new_simple_literal(s).into(),
        Value::Bool(b) => {
            Literal::new_typed_literal(b.to_string(), NamedNode::new_unchecked(XSD_BOOLEAN)).into()
        }
        Value::Number(n) if n.is_f64() => {
            Literal::new_typed_literal(n.to_string(), NamedNode::new_unchecked(XSD_DOUBLE)).into()
        }
        Value::Number(n) => {
            Literal::new_typed_literal(n.to_string(), NamedNode::new_unchecked(XSD_INTEGER)).into()
        }
        Value::Object(obj) => {
            if let Some(id) = obj.get("@id").and_then(|v| v.as_str()) {
                named_node(ctx.expand_id(id)?)?.into()
            } else if let Some(literal) = obj.get("@value") {
                let text = match literal {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                if let Some(lang) = obj.get("@language").and_then(|v| v.as_str()) {
                    Literal::new_language_tagged_literal(text, lang)
                        .map_err(|e| ConvertError::Rdf(format!("Invalid language tag: {}", e)))?
                        .into()
                } else if let Some(datatype) = obj.get("@type").and_then(|v| v.as_str()) {
                    let datatype = ctx
                        .expand_term(datatype)
                        .ok_or_else(|| ConvertError::InvalidIri(datatype.to_string()))?;
                    Literal::new_typed_literal(text, named_node(datatype)?).into()
                } else {
                    Literal::new_simple_literal(text).into()
                }
            } else {
                debug!(property = %key, "Skipping embedded object without @id or @value");
                return Ok(vec![]);
            }
        }
    };
    Ok(vec![term])
}

/// Build an rdf:List and return its head
///
/// Hex prefix of the SHA-256 of a list's subject and predicate
fn list_owner_digest(subject: &NamedOrBlankNode, predicate: &NamedNode) -> String {
    let mut hasher = Sha256::new();
    hasher.update(subject.to_string().as_bytes());
    hasher.update([0u8]);
    hasher.update(predicate.as_str().as_bytes());
    hex::encode(&hasher.finalize()[..8])
}

/// List nodes get labels derived from the owning subject, predicate and
/// position so repeated conversions of the same crate yield the same triples
/// and lists of different crates never share nodes.
fn list_to_triples(
    subject: &NamedOrBlankNode,
    predicate: &NamedNode,
    items: Vec<Term>,
    triples: &mut Vec<Triple>,
) -> Term {
    let first = NamedNode::new_unchecked(RDF_FIRST);
    let rest = NamedNode::new_unchecked(RDF_REST);
    let mut next: Term = NamedNode::new_unchecked(RDF_NIL).into();
    let owner = list_owner_digest(subject, predicate);
    for (position, item) in items.into_iter().enumerate().rev() {
        let node = BlankNode::new_unchecked(format!("l{owner}-{position}"));
        triples.push(Triple::new(node.clone(), first.clone(), item));
        triples.push(Triple::new(node.clone(), rest.clone(), next));
        next = node.into();
    }
    next
}
