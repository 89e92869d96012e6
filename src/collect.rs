//! Entity lookup over an RO-Crate @graph
//!
//! Indexes a crate's graph by @id, locates the root dataset and checks
//! that every @id reference resolves to an entity in the same graph.

use serde_json::Value;
use std::collections::{BTreeSet, HashMap};

use crate::error::{ConvertError, Result};
use crate::id::is_metadata_file_id;
use crate::vocab::ROOT_ENTITY_ID;

/// A crate's entities keyed by @id, with graph order kept
#[derive(Debug)]
pub struct EntityIndex<'a> {
    entities: HashMap<&'a str, &'a Value>,
    order: Vec<&'a str>,
}

impl<'a> EntityIndex<'a> {
    /// Index a graph. Entities without a string @id are skipped.
    pub fn new(graph: &'a [Value]) -> Self {
        let mut entities = HashMap::new();
        let mut order = Vec::new();
        for entity in graph {
            if let Some(id) = extract_id(entity) {
                if entities.insert(id, entity).is_none() {
                    order.push(id);
                }
            }
        }
        Self { entities, order }
    }

    pub fn get(&self, id: &str) -> Option<&'a Value> {
        self.entities.get(id).copied()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Entities in graph order
    pub fn iter(&self) -> impl Iterator<Item = &'a Value> + '_ {
        self.order.iter().filter_map(|id| self.get(id))
    }

    /// Resolve a reference (`{"@id": ...}` or a bare string) to its entity
    ///
    /// `from` names the referring entity for the error message.
    pub fn resolve(&self, reference: &Value, from: &str) -> Result<&'a Value> {
        let id = reference_id(reference).ok_or_else(|| {
            ConvertError::InvalidCrate(format!("'{}' holds a non-reference value", from))
        })?;
        self.get(id).ok_or_else(|| ConvertError::DanglingReference {
            from: from.to_string(),
            id: id.to_string(),
        })
    }

    /// Check that no entity references an @id missing from the graph
    pub fn check_references(&self) -> Result<()> {
        for id in &self.order {
            if let Some(entity) = self.get(id) {
                for referenced in get_referenced_ids(entity) {
                    if !self.entities.contains_key(referenced.as_str()) {
                        return Err(ConvertError::DanglingReference {
                            from: id.to_string(),
                            id: referenced,
                        });
                    }
                }
            }
        }
        Ok(())
    }

    /// Locate the root dataset: the descriptor's `about`, else "./"
    pub fn find_root(&self) -> Option<&'a Value> {
        let from_descriptor = self
            .iter()
            .find(|e| is_metadata_descriptor(e))
            .and_then(|d| d.get("about"))
            .and_then(reference_id)
            .and_then(|id| self.get(id));
        from_descriptor.or_else(|| self.get(ROOT_ENTITY_ID))
    }
}

/// Borrow the @graph array of a crate document
pub fn graph_of(doc: &Value) -> Result<&[Value]> {
    match doc.get("@graph") {
        Some(Value::Array(graph)) => Ok(graph),
        Some(_) => Err(ConvertError::InvalidCrate(
            "@graph must be an array".to_string(),
        )),
        None => Err(ConvertError::InvalidCrate("missing @graph".to_string())),
    }
}

/// Extract @id from an entity
pub fn extract_id(entity: &Value) -> Option<&str> {
    entity.get("@id").and_then(|v| v.as_str())
}

/// The @id of a reference value: `{"@id": "..."}`
pub fn reference_id(value: &Value) -> Option<&str> {
    match value {
        Value::Object(obj) => obj.get("@id").and_then(|v| v.as_str()),
        _ => None,
    }
}

/// View a single value or an array as a slice of values
pub fn as_list(value: Option<&Value>) -> Vec<&Value> {
    match value {
        None | Some(Value::Null) => vec![],
        Some(Value::Array(arr)) => arr.iter().collect(),
        Some(v) => vec![v],
    }
}

/// Type names of an entity; `@type` may be a string or an array
pub fn extract_types(entity: &Value) -> Vec<String> {
    as_list(entity.get("@type"))
        .into_iter()
        .filter_map(Value::as_str)
        .map(String::from)
        .collect()
}

pub fn has_type(entity: &Value, type_name: &str) -> bool {
    as_list(entity.get("@type"))
        .into_iter()
        .any(|t| t.as_str() == Some(type_name))
}

/// The metadata descriptor: a metadata file id pointing `about` the root
pub fn is_metadata_descriptor(entity: &Value) -> bool {
    extract_id(entity).is_some_and(is_metadata_file_id) && entity.get("about").is_some()
}

/// Every @id an entity points at
///
/// Only bare references (`{"@id": ...}` with no other keys) count, at any
/// depth. `conformsTo` names profiles outside the crate and is not walked.
pub fn get_referenced_ids(entity: &Value) -> BTreeSet<String> {
    let mut ids = BTreeSet::new();
    let Some(obj) = entity.as_object() else {
        return ids;
    };
    let mut pending: Vec<&Value> = obj
        .iter()
        .filter(|(key, _)| !matches!(key.as_str(), "@id" | "@type" | "@context" | "conformsTo"))
        .map(|(_, value)| value)
        .collect();
    while let Some(value) = pending.pop() {
        match value {
            Value::Array(items) => pending.extend(items),
            Value::Object(inner) => match reference_id(value) {
                Some(id) if inner.len() == 1 => {
                    ids.insert(id.to_string());
                }
                _ => pending.extend(
                    inner
                        .iter()
                        .filter(|(key, _)| !matches!(key.as_str(), "@id" | "@type"))
                        .map(|(_, v)| v),
                ),
            },
            _ => {}
        }
    }
    ids
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_graph() -> Vec<Value> {
        vec![
            json!({
                "@id": "ro-crate-metadata.json",
                "@type": "CreativeWork",
                "conformsTo": {"@id": "https://w3id.org/ro/crate/1.2"},
                "about": {"@id": "https://idr.openmicroscopy.org/study/idr0001/"}
            }),
            json!({
                "@id": "https://idr.openmicroscopy.org/study/idr0001/",
                "@type": "Dataset",
                "hasPart": [{"@id": "#screen-1"}]
            }),
            json!({"@id": "#screen-1", "@type": "Dataset"}),
        ]
    }

    #[test]
    fn test_types_single_or_array() {
        let term = json!({"@type": "DefinedTerm"});
        assert_eq!(extract_types(&term), vec!["DefinedTerm"]);

        let person = json!({"@type": ["Person", "Contributor"]});
        assert!(has_type(&person, "Contributor"));
        assert!(!has_type(&person, "Dataset"));
        assert!(extract_types(&json!({"name": "untyped"})).is_empty());
    }

    #[test]
    fn test_find_root_via_descriptor() {
        let graph = sample_graph();
        let index = EntityIndex::new(&graph);
        let root = index.find_root().unwrap();
        assert_eq!(
            extract_id(root),
            Some("https://idr.openmicroscopy.org/study/idr0001/")
        );
    }

    #[test]
    fn test_find_root_fallback() {
        let graph = vec![json!({"@id": "./", "@type": "Dataset"})];
        let index = EntityIndex::new(&graph);
        assert_eq!(extract_id(index.find_root().unwrap()), Some("./"));
    }

    #[test]
    fn test_check_references_ok() {
        let graph = sample_graph();
        assert!(EntityIndex::new(&graph).check_references().is_ok());
    }

    #[test]
    fn test_check_references_dangling() {
        let mut graph = sample_graph();
        graph.pop();
        let err = EntityIndex::new(&graph).check_references().unwrap_err();
        match err {
            ConvertError::DanglingReference { id, .. } => assert_eq!(id, "#screen-1"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_resolve_reference() {
        let graph = sample_graph();
        let index = EntityIndex::new(&graph);
        let entity = index.resolve(&json!({"@id": "#screen-1"}), "root").unwrap();
        assert!(has_type(entity, "Dataset"));
        assert!(matches!(
            index.resolve(&json!({"@id": "#nope"}), "root"),
            Err(ConvertError::DanglingReference { .. })
        ));
    }

    #[test]
    fn test_referenced_ids_of_screen() {
        let screen = json!({
            "@id": "#screen-1",
            "@type": "Dataset",
            "conformsTo": {"@id": "https://w3id.org/ro/crate/1.2"},
            "screenImagingMethodTerm": {"@id": "http://purl.obolibrary.org/obo/FBbi_00000246"},
            "additionalProperty": [
                {"@id": "#screen-1-property-1"},
                {"@id": "#screen-1-property-2"}
            ],
            "fieldOrder": {"@list": ["Screen Number"]}
        });

        let refs = get_referenced_ids(&screen);
        let expected: Vec<&str> = vec![
            "#screen-1-property-1",
            "#screen-1-property-2",
            "http://purl.obolibrary.org/obo/FBbi_00000246",
        ];
        assert_eq!(refs.iter().map(String::as_str).collect::<Vec<_>>(), expected);
    }

    #[test]
    fn test_descriptor_needs_about() {
        let descriptor = json!({"@id": "ro-crate-metadata.json", "about": {"@id": "./"}});
        assert!(is_metadata_descriptor(&descriptor));

        // Index crates list per-study metadata files without `about`
        let listed = json!({
            "@id": "idr0001-study/idr0001-ro-crate-metadata.json",
            "@type": "CreativeWork"
        });
        assert!(!is_metadata_descriptor(&listed));
    }

    #[test]
    fn test_graph_of_rejects_non_array() {
        let doc = json!({"@graph": {"@id": "./"}});
        assert!(matches!(graph_of(&doc), Err(ConvertError::InvalidCrate(_))));
    }
}
