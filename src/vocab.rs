//! Vocabulary definitions for IDR RO-Crates
//!
//! Fixed IRIs used by the encoder, the decoder and the RDF stage, plus the
//! small context extension that names the IDR-specific dataset properties.

use serde_json::{Map, Value};

use crate::classify::ontology_fields;

/// RO-Crate 1.2 JSON-LD context
pub const ROCRATE_CONTEXT: &str = "https://w3id.org/ro/crate/1.2/context";

/// Profile URI the metadata descriptor conforms to
pub const ROCRATE_PROFILE: &str = "https://w3id.org/ro/crate/1.2";

/// RO-Crate conformsTo URL prefix (to detect crate references)
pub const ROCRATE_PROFILE_PREFIX: &str = "https://w3id.org/ro/crate/";

/// Standard metadata descriptor filename
pub const METADATA_DESCRIPTOR_ID: &str = "ro-crate-metadata.json";

/// Detached root entity ID
pub const ROOT_ENTITY_ID: &str = "./";

/// Base for study root identifiers: `<base><accession>/`
pub const IDR_STUDY_BASE: &str = "https://idr.openmicroscopy.org/study/";

/// Namespace for IDR-specific crate terms
pub const IDR_TERMS_NS: &str = "https://idr.openmicroscopy.org/rocrate/terms#";

/// Ordered list of the source field keys of a dataset
pub const FIELD_ORDER: &str = "https://idr.openmicroscopy.org/rocrate/terms#fieldOrder";

/// Short form of fieldOrder
pub const FIELD_ORDER_SHORT: &str = "fieldOrder";

pub const SCHEMA_NS: &str = "http://schema.org/";

pub const DCTERMS_NS: &str = "http://purl.org/dc/terms/";

pub const CITE_AS: &str = "https://www.w3.org/ns/iana/link-relations/relation#cite-as";

/// identifiers.org registry entry used as propertyID for DOIs
pub const DOI_REGISTRY: &str = "https://registry.identifiers.org/registry/doi";

pub const DOI_RESOLVER: &str = "https://doi.org/";

pub const PUBMED_BASE: &str = "https://pubmed.ncbi.nlm.nih.gov/";

pub const PMC_BASE: &str = "https://www.ncbi.nlm.nih.gov/pmc/articles/";

/// Canonical thumbnail endpoint: `<base><image id>/?`
pub const THUMBNAIL_BASE: &str = "https://idr.openmicroscopy.org/webgateway/render_thumbnail/";

/// Context extension for the IDR dataset properties
///
/// Every ontology-backed field gets a short term mapped onto the schema.org
/// property it specializes. `cite-as` is the IANA link relation and
/// `fieldOrder` is an ordered list.
pub fn context_extension() -> Value {
    let mut ext = Map::new();
    for field in ontology_fields() {
        ext.insert(
            field.property.to_string(),
            Value::String(format!("{}{}", SCHEMA_NS, field.schema_term)),
        );
    }
    ext.insert("cite-as".to_string(), Value::String(CITE_AS.to_string()));
    ext.insert(
        FIELD_ORDER_SHORT.to_string(),
        serde_json::json!({
            "@id": FIELD_ORDER,
            "@container": "@list"
        }),
    );
    Value::Object(ext)
}

/// The full `@context` of an encoded crate
pub fn crate_context() -> Value {
    Value::Array(vec![
        Value::String(ROCRATE_CONTEXT.to_string()),
        context_extension(),
    ])
}
