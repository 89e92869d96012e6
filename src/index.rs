//! Index crate over a directory of generated study crates
//!
//! The index is itself an RO-Crate whose root lists every study crate as a
//! `Dataset` part, each linked to its metadata file through `subjectOf`.

use serde_json::{json, Map, Value};

use crate::collect::{graph_of, EntityIndex};
use crate::error::{ConvertError, Result};
use crate::vocab::{METADATA_DESCRIPTOR_ID, ROCRATE_CONTEXT, ROCRATE_PROFILE, ROOT_ENTITY_ID};

pub const INDEX_NAME: &str = "IDR study RO-Crates";
pub const INDEX_DESCRIPTION: &str = "Index of RO-Crates generated from IDR study metadata.";

/// Generic RO-Crate conformance for listed crates
const ROCRATE_CONFORMANCE: &str = "https://w3id.org/ro/crate";

/// One generated crate as seen from the index
#[derive(Debug, Clone, PartialEq)]
pub struct IndexEntry {
    /// Crate directory relative to the index, with a trailing slash
    pub dir: String,
    /// Metadata file name inside `dir`
    pub metadata_file: String,
    pub name: Option<Value>,
    pub description: Option<Value>,
    /// Root @id of the study, when it is an http(s) URL
    pub identifier: Option<String>,
}

impl IndexEntry {
    /// Read the listing fields from a crate document's root entity
    pub fn from_crate(dir: &str, metadata_file: &str, doc: &Value) -> Result<Self> {
        let graph = graph_of(doc)?;
        let index = EntityIndex::new(graph);
        let root = index.find_root().ok_or(ConvertError::MissingRootEntity)?;
        let root_id = root.get("@id").and_then(|v| v.as_str()).unwrap_or_default();

        let mut dir = dir.trim_end_matches('/').to_string();
        dir.push('/');
        Ok(Self {
            dir,
            metadata_file: metadata_file.to_string(),
            name: root.get("name").cloned(),
            description: root.get("description").cloned(),
            identifier: (root_id.starts_with("http://") || root_id.starts_with("https://"))
                .then(|| root_id.to_string()),
        })
    }

    /// @id of the metadata file entity
    pub fn metadata_id(&self) -> String {
        format!("{}{}", self.dir, self.metadata_file)
    }

    fn to_dataset(&self) -> Value {
        let mut entity = Map::new();
        entity.insert("@id".to_string(), json!(self.dir));
        entity.insert("@type".to_string(), json!("Dataset"));
        entity.insert("conformsTo".to_string(), json!({"@id": ROCRATE_CONFORMANCE}));
        entity.insert("subjectOf".to_string(), json!({"@id": self.metadata_id()}));
        if let Some(name) = &self.name {
            entity.insert("name".to_string(), name.clone());
        }
        if let Some(description) = &self.description {
            entity.insert("description".to_string(), description.clone());
        }
        if let Some(identifier) = &self.identifier {
            entity.insert("identifier".to_string(), json!(identifier));
        }
        Value::Object(entity)
    }

    fn to_metadata_file(&self) -> Value {
        json!({
            "@id": self.metadata_id(),
            "@type": "CreativeWork",
            "encodingFormat": "application/ld+json"
        })
    }
}

/// Build the index crate document
///
/// Entries appear in the order given.
pub fn build_index_crate(entries: &[IndexEntry]) -> Value {
    let parts: Vec<Value> = entries.iter().map(|e| json!({"@id": e.dir})).collect();

    let mut graph = vec![
        json!({
            "@id": METADATA_DESCRIPTOR_ID,
            "@type": "CreativeWork",
            "conformsTo": {"@id": ROCRATE_PROFILE},
            "about": {"@id": ROOT_ENTITY_ID}
        }),
        json!({
            "@id": ROOT_ENTITY_ID,
            "@type": "Dataset",
            "name": INDEX_NAME,
            "description": INDEX_DESCRIPTION,
            "hasPart": parts
        }),
    ];
    for entry in entries {
        graph.push(entry.to_dataset());
        graph.push(entry.to_metadata_file());
    }

    json!({
        "@context": ROCRATE_CONTEXT,
        "@graph": graph
    })
}
