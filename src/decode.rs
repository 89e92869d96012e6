//! RO-Crate decoder
//!
//! Reads a crate produced by [`RoCrateEncoder`](crate::encode::RoCrateEncoder)
//! back into a [`Study`]. The whole graph is checked for dangling references
//! before anything is decoded, so a broken document never yields a partial
//! study.

use std::collections::HashMap;
use std::path::Path;

use serde_json::Value;
use tracing::debug;

use crate::classify::{ontology_fields, STUDY_DATA_DOI_KEY, STUDY_DOI_KEY};
use crate::collect::{as_list, extract_id, graph_of, has_type, reference_id, EntityIndex};
use crate::error::{ConvertError, Result};
use crate::id::parse_section_id;
use crate::idr::{decode_bytes, DecodeOptions};
use crate::model::{FieldValue, Record, Section, SectionKind, Study};
use crate::vocab::{FIELD_ORDER, FIELD_ORDER_SHORT};

/// Decoder from RO-Crate JSON-LD to the record model
#[derive(Debug, Clone, Default)]
pub struct RoCrateDecoder {
    options: DecodeOptions,
}

impl RoCrateDecoder {
    pub fn new(options: DecodeOptions) -> Self {
        Self { options }
    }

    pub fn decode_path(&self, path: &Path) -> Result<Study> {
        let bytes = std::fs::read(path)?;
        let text = decode_bytes(&bytes, self.options.encoding.as_deref())?;
        self.decode_str(&text)
    }

    pub fn decode_str(&self, text: &str) -> Result<Study> {
        let doc: Value = serde_json::from_str(text)?;
        self.decode_value(&doc)
    }

    pub fn decode_value(&self, doc: &Value) -> Result<Study> {
        let graph = graph_of(doc)?;
        let index = EntityIndex::new(graph);
        index.check_references()?;

        let root = index.find_root().ok_or(ConvertError::MissingRootEntity)?;
        let root_id = extract_id(root).unwrap_or_default();

        let mut study = Study {
            root: decode_dataset(root, &index)?,
            ..Study::default()
        };

        let mut counters: HashMap<SectionKind, usize> = HashMap::new();
        for part in as_list(root.get("hasPart")) {
            let entity = index.resolve(part, root_id)?;
            if !has_type(entity, "Dataset") {
                continue;
            }
            let record = decode_dataset(entity, &index)?;
            let id = extract_id(entity).unwrap_or_default();
            let from_id = parse_section_id(id);

            let Some(kind) = from_id.map(|(kind, _)| kind).or_else(|| marker_kind(&record)) else {
                debug!(id = %id, "Skipping part that is not a screen or experiment");
                continue;
            };

            let counter = counters.entry(kind).or_insert(0);
            *counter += 1;
            let ordinal = position(entity)
                .or(from_id.map(|(_, n)| n))
                .unwrap_or(*counter);

            study.sections.push(Section {
                kind,
                index: ordinal,
                record,
            });
        }

        Ok(study)
    }
}

/// Section kind from the marker row a record carries
fn marker_kind(record: &Record) -> Option<SectionKind> {
    [SectionKind::Screen, SectionKind::Experiment]
        .into_iter()
        .find(|kind| record.contains_key(kind.marker_key()))
}

fn position(entity: &Value) -> Option<usize> {
    match entity.get("position")? {
        Value::Number(n) => n.as_u64().map(|n| n as usize),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Rebuild the record of one dataset entity
fn decode_dataset(entity: &Value, index: &EntityIndex<'_>) -> Result<Record> {
    let from = extract_id(entity).unwrap_or_default();
    let mut found: Vec<(String, FieldValue)> = Vec::new();

    for property in as_list(entity.get("additionalProperty")) {
        let property = follow(property, index, from)?;
        let Some(name) = property.get("name").and_then(Value::as_str) else {
            continue;
        };
        found.push((name.to_string(), field_value(property.get("value"))));
    }

    for field in ontology_fields() {
        if let Some(value) = entity.get(field.property) {
            let codes = collect_strings(value, index, from, term_code)?;
            found.push((field.key.to_string(), codes));
        }
    }

    if let Some(value) = entity.get("citation") {
        let dois = collect_strings(value, index, from, |e| first_string(e.get("identifier")))?;
        found.push((STUDY_DOI_KEY.to_string(), dois));
    }

    if let Some(value) = entity.get("cite-as") {
        let dois = collect_strings(value, index, from, |e| first_string(e.get("value")))?;
        found.push((STUDY_DATA_DOI_KEY.to_string(), dois));
    }

    let order = entity
        .get(FIELD_ORDER_SHORT)
        .or_else(|| entity.get(FIELD_ORDER))
        .map(field_order)
        .unwrap_or_default();

    let mut record = Record::new();
    for key in order {
        if let Some(pos) = found.iter().position(|(k, _)| *k == key) {
            let (key, value) = found.remove(pos);
            record.insert(key, value);
        }
    }
    for (key, value) in found {
        record.insert(key, value);
    }
    Ok(record)
}

/// Resolve a bare reference; inline entities are used as they are
fn follow<'a>(value: &'a Value, index: &EntityIndex<'a>, from: &str) -> Result<&'a Value> {
    match value {
        Value::Object(obj) if obj.len() == 1 && reference_id(value).is_some() => {
            index.resolve(value, from)
        }
        _ => Ok(value),
    }
}

/// Read one string per referenced entity, keeping the scalar/array shape
fn collect_strings(
    value: &Value,
    index: &EntityIndex<'_>,
    from: &str,
    read: impl Fn(&Value) -> Option<String>,
) -> Result<FieldValue> {
    let mut out = Vec::new();
    for item in as_list(Some(value)) {
        let text = match item {
            Value::String(s) => Some(s.clone()),
            other => read(follow(other, index, from)?),
        };
        if let Some(text) = text {
            out.push(text);
        }
    }
    Ok(match value {
        Value::Array(_) => FieldValue::Multi(out),
        _ => FieldValue::from_values(out),
    })
}

/// The accession as written, falling back to the canonical code
fn term_code(term: &Value) -> Option<String> {
    first_string(term.get("identifier"))
        .or_else(|| first_string(term.get("termCode")))
        .or_else(|| extract_id(term).map(String::from))
}

fn first_string(value: Option<&Value>) -> Option<String> {
    as_list(value)
        .into_iter()
        .find_map(|v| v.as_str().map(String::from))
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// `value` of a PropertyValue: absent → no values, string → scalar,
/// array → list
fn field_value(value: Option<&Value>) -> FieldValue {
    match value {
        None | Some(Value::Null) => FieldValue::empty(),
        Some(Value::Array(items)) => FieldValue::Multi(items.iter().map(scalar_text).collect()),
        Some(other) => FieldValue::Scalar(scalar_text(other)),
    }
}

/// Keys listed in `fieldOrder`, accepting a plain array or an `@list` object
fn field_order(value: &Value) -> Vec<String> {
    let items = match value {
        Value::Object(obj) => as_list(obj.get("@list")),
        other => as_list(Some(other)),
    };
    items
        .into_iter()
        .filter_map(|v| v.as_str().map(String::from))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encode::RoCrateEncoder;
    use crate::idr::{IdrDecoder, IdrEncoder};
    use serde_json::json;

    const STUDY: &str = "Comment[IDR Study Accession]\tidr0001\n\
Study Title\tA genome-wide screen\n\
Study Type\thigh content screen\n\
Study Type Term Accession\tEFO_0007550\n\
Study DOI\t10.1000/xyz\n\
Study Data DOI\t10.1000/abc\n\
Study Organism Term Accession\tNCBITaxon_9606\tNCBITaxon_10090\n\
Study Key Words\n\
Screen Number\t1\n\
Screen Imaging Method Term Accession\tFBbi_00000246\n\
Experiment Number\t1\n\
Experiment Description\tLive imaging\n\
Screen Number\t2\n\
Comment[IDR Screen Name]\tidr0001-screenB\n";

    #[test]
    fn test_roundtrip_through_crate() {
        let study = IdrDecoder::default().decode_str(STUDY);
        let doc = RoCrateEncoder.encode(&study);
        let decoded = RoCrateDecoder::default().decode_value(&doc).unwrap();

        assert_eq!(decoded, study);
        assert_eq!(IdrEncoder.encode(&decoded), STUDY);
    }

    #[test]
    fn test_reencode_is_identical() {
        let study = IdrDecoder::default().decode_str(STUDY);
        let doc = RoCrateEncoder.encode(&study);
        let decoded = RoCrateDecoder::default().decode_value(&doc).unwrap();
        assert_eq!(RoCrateEncoder.encode(&decoded), doc);
    }

    #[test]
    fn test_dangling_reference_is_fatal() {
        let doc = json!({
            "@graph": [
                {"@id": "ro-crate-metadata.json", "about": {"@id": "./"}},
                {"@id": "./", "@type": "Dataset", "additionalProperty": [{"@id": "#missing"}]}
            ]
        });
        let err = RoCrateDecoder::default().decode_value(&doc).unwrap_err();
        match err {
            ConvertError::DanglingReference { from, id } => {
                assert_eq!(from, "./");
                assert_eq!(id, "#missing");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_missing_root() {
        let doc = json!({"@graph": [{"@id": "#x", "@type": "Thing"}]});
        assert!(matches!(
            RoCrateDecoder::default().decode_value(&doc),
            Err(ConvertError::MissingRootEntity)
        ));
    }

    #[test]
    fn test_graph_must_be_array() {
        let doc = json!({"@graph": "nope"});
        assert!(matches!(
            RoCrateDecoder::default().decode_value(&doc),
            Err(ConvertError::InvalidCrate(_))
        ));
    }

    #[test]
    fn test_unknown_types_ignored_and_discovery_order() {
        let doc = json!({
            "@graph": [
                {"@id": "./", "@type": "Dataset",
                 "additionalProperty": [
                    {"@id": "#p1"},
                    {"@type": "PropertyValue", "name": "Study Description", "value": "inline"}
                 ],
                 "studyType": {"@id": "http://www.ebi.ac.uk/efo/EFO_0007550"},
                 "mentions": {"@id": "#widget"},
                 "hasPart": [{"@id": "#widget"}, {"@id": "#part"}]},
                {"@id": "#p1", "@type": "PropertyValue", "name": "Study Title", "value": ["a", "b"]},
                {"@id": "http://www.ebi.ac.uk/efo/EFO_0007550", "@type": "DefinedTerm",
                 "termCode": "EFO_0007550"},
                {"@id": "#widget", "@type": "SoftwareApplication"},
                {"@id": "#part", "@type": "Dataset",
                 "additionalProperty": {"@id": "#p2"}},
                {"@id": "#p2", "@type": "PropertyValue", "name": "Experiment Number", "value": "7"}
            ]
        });
        let study = RoCrateDecoder::default().decode_value(&doc).unwrap();

        let keys: Vec<&str> = study.root.keys().collect();
        assert_eq!(keys, vec!["Study Title", "Study Description", "Study Type"]);
        assert_eq!(study.root.values("Study Title"), vec!["a", "b"]);
        assert_eq!(study.root.first_value("Study Type"), Some("EFO_0007550"));

        assert_eq!(study.sections.len(), 1);
        assert_eq!(study.sections[0].kind, SectionKind::Experiment);
        assert_eq!(study.sections[0].index, 1);
    }

    #[test]
    fn test_section_index_from_position() {
        let doc = json!({
            "@graph": [
                {"@id": "./", "@type": "Dataset", "hasPart": [{"@id": "#screen-3"}]},
                {"@id": "#screen-3", "@type": "Dataset", "position": 3}
            ]
        });
        let study = RoCrateDecoder::default().decode_value(&doc).unwrap();
        assert_eq!(study.sections[0].kind, SectionKind::Screen);
        assert_eq!(study.sections[0].index, 3);
    }

    #[test]
    fn test_decode_str_rejects_bad_json() {
        assert!(matches!(
            RoCrateDecoder::default().decode_str("{not json"),
            Err(ConvertError::Json(_))
        ));
    }
}
