//! RO-Crate encoder
//!
//! Renders a [`Study`] as an RO-Crate 1.2 JSON-LD document. Every field of
//! every record is carried in a way the decoder can invert:
//!
//! - ontology fields as `DefinedTerm` references on a dataset property
//! - `Study DOI` as `citation` → `ScholarlyArticle`, which also links the
//!   PubMed and PMC records
//! - `Study Data DOI` as `identifier` + `cite-as` → `PropertyValue`
//! - everything else as `additionalProperty` → `PropertyValue`
//!
//! The key order of each dataset is kept in `fieldOrder`. On top of
//! that the root and section datasets get descriptive properties (name,
//! authors, license, thumbnails) that are derived from the fields and never
//! read back.

use std::sync::OnceLock;

use regex::Regex;
use serde_json::{json, Map, Value};
use tracing::{debug, warn};

use crate::classify::{
    classify, ontology_field, parse_accession, FieldKind, TermRef, PMC_ID_KEY, PUBMED_ID_KEY,
};
use crate::collect::has_type;
use crate::error::{Result, Warning};
use crate::id::{
    data_doi_id, normalize_doi, normalize_url, orcid_id, property_id, root_id, section_id,
};
use crate::merge::GraphBuilder;
use crate::model::{Field, FieldValue, Record, Section, SectionKind, Study};
use crate::vocab::{
    crate_context, DOI_REGISTRY, FIELD_ORDER_SHORT, METADATA_DESCRIPTOR_ID, PMC_BASE, PUBMED_BASE,
    ROCRATE_PROFILE, THUMBNAIL_BASE,
};

/// Scope name of the root dataset's minted ids
pub const STUDY_SCOPE: &str = "study";

/// Result of encoding one study
#[derive(Debug, Clone)]
pub struct EncodeResult {
    /// The JSON-LD document (`@context` + `@graph`)
    pub document: Value,
    /// Recovered problems, in field order
    pub warnings: Vec<Warning>,
    pub stats: EncodeStats,
}

/// Statistics about an encoded crate
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EncodeStats {
    pub entities: usize,
    pub defined_terms: usize,
    pub property_values: usize,
    pub sections: usize,
}

/// Encoder from the record model to RO-Crate JSON-LD
#[derive(Debug, Clone, Copy, Default)]
pub struct RoCrateEncoder;

impl RoCrateEncoder {
    pub fn encode(&self, study: &Study) -> Value {
        self.encode_with_warnings(study).document
    }

    pub fn encode_with_warnings(&self, study: &Study) -> EncodeResult {
        let accession = study.accession();
        let root_id = root_id(accession);
        let mut state = EncodeState::default();

        let mut root = state.encode_record(&study.root, STUDY_SCOPE);
        root.insert("@id".to_string(), Value::String(root_id.clone()));
        root.insert("@type".to_string(), Value::String("Dataset".to_string()));
        enrich_root(&mut root, study, &mut state.children);

        let mut sections = Vec::with_capacity(study.sections.len());
        let mut has_part = Vec::with_capacity(study.sections.len());
        for section in &study.sections {
            let id = section_id(section.kind, section.index);
            let mut entity = state.encode_record(&section.record, &section.scope());
            entity.insert("@id".to_string(), Value::String(id.clone()));
            entity.insert("@type".to_string(), Value::String("Dataset".to_string()));
            entity.insert("position".to_string(), json!(section.index));
            enrich_section(&mut entity, section);
            has_part.push(json!({ "@id": id }));
            sections.push(Value::Object(entity));
        }
        if !has_part.is_empty() {
            root.insert("hasPart".to_string(), Value::Array(has_part));
        }

        let mut graph = GraphBuilder::new();
        graph.add(json!({
            "@id": METADATA_DESCRIPTOR_ID,
            "@type": "CreativeWork",
            "conformsTo": { "@id": ROCRATE_PROFILE },
            "about": { "@id": root_id }
        }));
        graph.add(Value::Object(root));
        for entity in sections {
            graph.add(entity);
        }
        for entity in state.children.build() {
            graph.add(entity);
        }
        let graph = graph.build();

        let stats = EncodeStats {
            entities: graph.len(),
            defined_terms: graph.iter().filter(|e| has_type(e, "DefinedTerm")).count(),
            property_values: graph.iter().filter(|e| has_type(e, "PropertyValue")).count(),
            sections: study.sections.len(),
        };
        debug!(
            accession = accession.unwrap_or(""),
            entities = stats.entities,
            terms = stats.defined_terms,
            "Encoded study"
        );

        EncodeResult {
            document: json!({
                "@context": crate_context(),
                "@graph": graph
            }),
            warnings: state.warnings,
            stats,
        }
    }
}

/// Serialize a crate document
pub fn to_json_string(document: &Value, pretty: bool) -> Result<String> {
    if pretty {
        Ok(serde_json::to_string_pretty(document)?)
    } else {
        Ok(serde_json::to_string(document)?)
    }
}

/// Entities referenced from datasets, plus warnings collected on the way
#[derive(Default)]
struct EncodeState {
    children: GraphBuilder,
    warnings: Vec<Warning>,
}

impl EncodeState {
    /// Encode one record into the properties of its dataset entity
    fn encode_record(&mut self, record: &Record, scope: &str) -> Map<String, Value> {
        let mut entity = Map::new();
        let mut properties = Vec::new();
        let mut field_order = Vec::with_capacity(record.len());

        for field in record {
            field_order.push(Value::String(field.key.clone()));

            let carried = match classify(&field.key) {
                FieldKind::Ontology => match self.encode_terms(field, record) {
                    Some((property, value)) => {
                        entity.insert(property.to_string(), value);
                        true
                    }
                    None => false,
                },
                FieldKind::PublicationDoi => {
                    match self.encode_citations(field, record) {
                        Some(value) => {
                            entity.insert("citation".to_string(), value);
                            true
                        }
                        None => false,
                    }
                }
                FieldKind::DatasetDoi => match self.encode_data_dois(field, scope) {
                    Some(value) => {
                        entity.insert("cite-as".to_string(), value.clone());
                        entity.insert("identifier".to_string(), value);
                        true
                    }
                    None => false,
                },
                FieldKind::SectionMarker(_) | FieldKind::Generic => false,
            };

            if !carried {
                let id = property_id(scope, properties.len() + 1);
                let mut property = json!({
                    "@id": id,
                    "@type": "PropertyValue",
                    "name": field.key
                });
                match &field.value {
                    FieldValue::Scalar(v) => property["value"] = json!(v),
                    FieldValue::Multi(vs) if !vs.is_empty() => property["value"] = json!(vs),
                    FieldValue::Multi(_) => {}
                }
                self.children.add(property);
                properties.push(json!({ "@id": id }));
            }
        }

        if !properties.is_empty() {
            entity.insert("additionalProperty".to_string(), Value::Array(properties));
        }
        if !field_order.is_empty() {
            entity.insert(FIELD_ORDER_SHORT.to_string(), Value::Array(field_order));
        }
        entity
    }

    /// DefinedTerm references for an ontology field
    ///
    /// `None` when the field must degrade to a plain property: no values, or
    /// any value that is not a known accession.
    fn encode_terms(&mut self, field: &Field, record: &Record) -> Option<(&'static str, Value)> {
        let field_spec = ontology_field(&field.key)?;
        let values = field.value.values();
        if values.is_empty() {
            return None;
        }

        let terms: Vec<Option<TermRef>> = values.iter().map(|v| parse_accession(v)).collect();
        if terms.iter().any(Option::is_none) {
            for (value, term) in values.iter().zip(&terms) {
                if term.is_none() && !value.trim().is_empty() {
                    warn!(
                        field = %field.key,
                        value = %value,
                        "Unresolved accession, keeping field as a plain property"
                    );
                    self.warnings.push(Warning::UnresolvedAccession {
                        field: field.key.clone(),
                        value: value.to_string(),
                    });
                }
            }
            return None;
        }

        let labels = field_spec.label_key.map(|k| record.values(k)).unwrap_or_default();
        let mut refs = Vec::with_capacity(values.len());
        for (i, (written, term)) in values.iter().zip(terms.into_iter().flatten()).enumerate() {
            let name = labels
                .get(i)
                .map(|l| l.trim())
                .filter(|l| !l.is_empty() && parse_accession(l).is_none())
                .unwrap_or(term.code.as_str())
                .to_string();
            self.add_term(&term, written.trim(), name);
            refs.push(json!({ "@id": term.iri }));
        }

        Some((field_spec.property, shape_refs(&field.value, refs)))
    }

    /// `identifier` keeps the accession as written in the study file;
    /// `termCode` is its canonical `PREFIX_CODE` form
    fn add_term(&mut self, term: &TermRef, written: &str, name: String) {
        self.children.add(json!({
            "@id": term.iri,
            "@type": "DefinedTerm",
            "name": name,
            "termCode": term.code,
            "identifier": written,
            "inDefinedTermSet": { "@id": term.source.term_set }
        }));
        self.children.add(json!({
            "@id": term.source.term_set,
            "@type": "DefinedTermSet",
            "name": term.source.name,
            "url": term.source.term_set
        }));
    }

    /// One ScholarlyArticle per DOI. The first also carries the study's
    /// PubMed and PMC identifiers.
    fn encode_citations(&mut self, field: &Field, record: &Record) -> Option<Value> {
        let values = non_blank_values(&field.value)?;
        let title = record.first_value("Study Publication Title");
        let mut refs = Vec::with_capacity(values.len());
        for (i, value) in values.into_iter().enumerate() {
            let doi_url = normalize_doi(value);
            let mut identifiers = vec![json!(value)];
            if i == 0 {
                identifiers.extend(publication_identifiers(record).into_iter().map(Value::from));
            }
            let mut article = json!({
                "@id": doi_url,
                "@type": "ScholarlyArticle",
                "identifier": single_or_array(identifiers),
                "url": doi_url
            });
            if let Some(title) = title {
                article["name"] = json!(title);
            }
            self.children.add(article);
            refs.push(json!({ "@id": doi_url }));
        }
        Some(shape_refs(&field.value, refs))
    }

    fn encode_data_dois(&mut self, field: &Field, scope: &str) -> Option<Value> {
        let values = non_blank_values(&field.value)?;
        let mut refs = Vec::with_capacity(values.len());
        for (i, value) in values.into_iter().enumerate() {
            let id = data_doi_id(scope, i + 1);
            self.children.add(json!({
                "@id": id,
                "@type": "PropertyValue",
                "propertyID": DOI_REGISTRY,
                "value": value,
                "url": normalize_doi(value)
            }));
            refs.push(json!({ "@id": id }));
        }
        Some(shape_refs(&field.value, refs))
    }
}

/// PubMed and PMC links for a study's publication
fn publication_identifiers(record: &Record) -> Vec<String> {
    let lookup = |key: &str| {
        record
            .first_value(key)
            .map(str::trim)
            .filter(|v| !v.is_empty())
    };
    let mut identifiers = Vec::new();
    if let Some(pubmed) = lookup(PUBMED_ID_KEY) {
        identifiers.push(format!("{PUBMED_BASE}{pubmed}/"));
    }
    if let Some(pmc) = lookup(PMC_ID_KEY) {
        identifiers.push(format!("{PMC_BASE}{pmc}/"));
    }
    identifiers
}

/// Shape references after the field they came from: one reference for a
/// scalar, an array otherwise
fn shape_refs(value: &FieldValue, mut refs: Vec<Value>) -> Value {
    match value {
        FieldValue::Scalar(_) if refs.len() == 1 => refs.remove(0),
        _ => Value::Array(refs),
    }
}

/// All values, or `None` if the field is empty or has a blank value
fn non_blank_values(value: &FieldValue) -> Option<Vec<&str>> {
    let values = value.values();
    if values.is_empty() || values.iter().any(|v| v.trim().is_empty()) {
        None
    } else {
        Some(values)
    }
}

/// A single value as itself, several as an array, none as `None`
fn single_or_array(values: impl IntoIterator<Item = Value>) -> Option<Value> {
    let mut values: Vec<Value> = values.into_iter().collect();
    match values.len() {
        0 => None,
        1 => Some(values.remove(0)),
        _ => Some(Value::Array(values)),
    }
}

fn enrich_root(root: &mut Map<String, Value>, study: &Study, children: &mut GraphBuilder) {
    let record = &study.root;
    let mut set = |key: &str, value: Option<&str>| {
        if let Some(value) = value {
            root.insert(key.to_string(), json!(value));
        }
    };
    set("name", record.first_value("Study Title"));
    set("description", record.first_value("Study Description"));
    set("datePublished", record.first_value("Study Public Release Date"));
    set("copyrightHolder", record.first_value("Study Copyright"));
    set("creditText", record.first_value("Study Author List"));

    let keywords: Vec<&str> = record
        .values("Study Key Words")
        .into_iter()
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .collect();
    if !keywords.is_empty() {
        root.insert("keywords".to_string(), json!(keywords.join(", ")));
    }

    if let Some(url) = record.first_value("Study External URL") {
        root.insert("url".to_string(), json!(normalize_url(url)));
    }

    let license_name = record.first_value("Study License");
    let license_url = record.first_value("Study License URL");
    if license_name.is_some() || license_url.is_some() {
        let license_id = license_url
            .map(normalize_url)
            .unwrap_or_else(|| "#license".to_string());
        let mut license = json!({
            "@id": license_id,
            "@type": "CreativeWork",
            "name": license_name.unwrap_or(license_id.as_str())
        });
        if license_url.is_some() {
            license["url"] = json!(license_id);
        }
        children.add(license);
        root.insert("license".to_string(), json!({ "@id": license_id }));
    }

    let people = parse_people(record);
    if !people.is_empty() {
        let refs: Vec<Value> = people
            .iter()
            .filter_map(|p| p.get("@id").cloned())
            .map(|id| json!({ "@id": id }))
            .collect();
        root.insert("author".to_string(), Value::Array(refs));
        for person in people {
            children.add(person);
        }
    }

    // Accession first, then any dataset DOI references
    let mut identifiers = Vec::new();
    if let Some(accession) = study.accession() {
        identifiers.push(json!(accession));
    }
    match root.remove("identifier") {
        Some(Value::Array(refs)) => identifiers.extend(refs),
        Some(other) => identifiers.push(other),
        None => {}
    }
    if let Some(value) = single_or_array(identifiers) {
        root.insert("identifier".to_string(), value);
    }

    let thumbnails = thumbnail_urls(study);
    if !thumbnails.is_empty() {
        root.insert("thumbnailUrl".to_string(), json!(thumbnails));
    }
}

fn enrich_section(entity: &mut Map<String, Value>, section: &Section) {
    let record = &section.record;
    let (name_key, description_key) = match section.kind {
        SectionKind::Screen => ("Comment[IDR Screen Name]", "Screen Description"),
        SectionKind::Experiment => ("Comment[IDR Experiment Name]", "Experiment Description"),
    };
    let name = match record.first_value(name_key) {
        Some(name) => name.to_string(),
        None => {
            let number = record
                .first_value(section.kind.marker_key())
                .map(String::from)
                .unwrap_or_else(|| section.index.to_string());
            format!("{} {}", section.kind, number)
        }
    };
    entity.insert("name".to_string(), json!(name));
    if let Some(description) = record.first_value(description_key) {
        entity.insert("description".to_string(), json!(description));
    }
}

/// Person entities from the parallel `Study Person *` columns
fn parse_people(record: &Record) -> Vec<Value> {
    let last_names = record.values("Study Person Last Name");
    let first_names = record.values("Study Person First Name");
    let emails = record.values("Study Person Email");
    let addresses = record.values("Study Person Address");
    let orcids = record.values("Study Person ORCID");

    let count = [&last_names, &first_names, &emails, &addresses, &orcids]
        .iter()
        .map(|column| column.len())
        .max()
        .unwrap_or(0);
    fn cell<'a>(column: &[&'a str], i: usize) -> &'a str {
        column.get(i).map(|v| v.trim()).unwrap_or("")
    }

    let mut people = Vec::new();
    for i in 0..count {
        let last_name = cell(&last_names, i);
        let first_name = cell(&first_names, i);
        let email = cell(&emails, i);
        let address = cell(&addresses, i);
        let orcid = cell(&orcids, i);
        if [last_name, first_name, email, address, orcid]
            .iter()
            .all(|v| v.is_empty())
        {
            continue;
        }

        let id = if orcid.is_empty() {
            format!("#person-{}", i + 1)
        } else {
            orcid_id(orcid)
        };
        let full_name = [first_name, last_name]
            .iter()
            .filter(|v| !v.is_empty())
            .copied()
            .collect::<Vec<_>>()
            .join(" ");

        let mut person = Map::new();
        person.insert("@id".to_string(), json!(id));
        person.insert("@type".to_string(), json!("Person"));
        person.insert(
            "name".to_string(),
            json!(if full_name.is_empty() { id.clone() } else { full_name }),
        );
        for (key, value) in [
            ("givenName", first_name),
            ("familyName", last_name),
            ("email", email),
            ("address", address),
        ] {
            if !value.is_empty() {
                person.insert(key.to_string(), json!(value));
            }
        }
        people.push(Value::Object(person));
    }
    people
}

fn image_id_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?:img_detail/|show=image-|render_thumbnail/)(\d+)").unwrap()
    })
}

/// Canonical thumbnail URLs for the example images of every record
///
/// Links that do not name a single image (wells, plates) are skipped.
pub fn thumbnail_urls(study: &Study) -> Vec<String> {
    let records = std::iter::once(&study.root).chain(study.sections.iter().map(|s| &s.record));
    let mut urls: Vec<String> = Vec::new();
    for record in records {
        for field in record.iter().filter(|f| f.key.ends_with("Example Images")) {
            for value in field.value.values() {
                let Some(caps) = image_id_regex().captures(value) else {
                    continue;
                };
                let url = format!("{}{}/?", THUMBNAIL_BASE, &caps[1]);
                if !urls.contains(&url) {
                    urls.push(url);
                }
            }
        }
    }
    urls
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collect::{graph_of, EntityIndex};
    use crate::decode::RoCrateDecoder;
    use crate::idr::IdrDecoder;

    fn encode_text(text: &str) -> EncodeResult {
        let study = IdrDecoder::default().decode_str(text);
        RoCrateEncoder.encode_with_warnings(&study)
    }

    fn entity<'a>(doc: &'a Value, id: &str) -> &'a Value {
        doc["@graph"]
            .as_array()
            .unwrap()
            .iter()
            .find(|e| e["@id"] == id)
            .unwrap_or_else(|| panic!("no entity {id}"))
    }

    const ROOT: &str = "https://idr.openmicroscopy.org/study/idr0001/";

    #[test]
    fn test_study_type_defined_term() {
        let result = encode_text("Comment[IDR Study Accession]\tidr0001\nStudy Type\tEFO_0007550\n");
        let doc = &result.document;

        let root = entity(doc, ROOT);
        assert_eq!(root["studyType"], json!({"@id": "http://www.ebi.ac.uk/efo/EFO_0007550"}));

        let term = entity(doc, "http://www.ebi.ac.uk/efo/EFO_0007550");
        assert_eq!(term["@type"], "DefinedTerm");
        assert_eq!(term["termCode"], "EFO_0007550");
        assert_eq!(term["identifier"], "EFO_0007550");
        assert_eq!(term["inDefinedTermSet"], json!({"@id": "http://www.ebi.ac.uk/efo/"}));

        let set = entity(doc, "http://www.ebi.ac.uk/efo/");
        assert_eq!(set["@type"], "DefinedTermSet");
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_root_id_and_descriptor() {
        let doc = encode_text("Comment[IDR Study Accession]\tidr0001\n").document;
        let descriptor = entity(&doc, "ro-crate-metadata.json");
        assert_eq!(descriptor["about"], json!({"@id": ROOT}));
        assert_eq!(
            descriptor["conformsTo"],
            json!({"@id": "https://w3id.org/ro/crate/1.2"})
        );
        assert_eq!(entity(&doc, ROOT)["identifier"], "idr0001");
    }

    #[test]
    fn test_root_without_accession_is_detached() {
        let doc = encode_text("Study Title\tUntitled\n").document;
        let descriptor = entity(&doc, "ro-crate-metadata.json");
        assert_eq!(descriptor["about"], json!({"@id": "./"}));
        assert_eq!(entity(&doc, "./")["name"], "Untitled");
    }

    #[test]
    fn test_study_doi_uses_citation() {
        let doc = encode_text("Comment[IDR Study Accession]\tidr0001\nStudy DOI\t10.1000/xyz\n").document;
        let root = entity(&doc, ROOT);
        assert_eq!(root["citation"], json!({"@id": "https://doi.org/10.1000/xyz"}));
        assert_eq!(root["identifier"], "idr0001");

        let article = entity(&doc, "https://doi.org/10.1000/xyz");
        assert_eq!(article["@type"], "ScholarlyArticle");
        assert_eq!(article["identifier"], "10.1000/xyz");
    }

    #[test]
    fn test_publication_carries_pubmed_and_pmc() {
        let text = "Comment[IDR Study Accession]\tidr0001\n\
                    Study PubMed ID\t26537509\n\
                    Study PMC ID\tPMC4632357\n\
                    Study DOI\t10.1000/xyz\n";
        let doc = encode_text(text).document;
        let article = entity(&doc, "https://doi.org/10.1000/xyz");
        assert_eq!(
            article["identifier"],
            json!([
                "10.1000/xyz",
                "https://pubmed.ncbi.nlm.nih.gov/26537509/",
                "https://www.ncbi.nlm.nih.gov/pmc/articles/PMC4632357/"
            ])
        );

        let study = RoCrateDecoder::default().decode_value(&doc).unwrap();
        assert_eq!(study.root.first_value("Study DOI"), Some("10.1000/xyz"));
        assert_eq!(study.root.first_value("Study PubMed ID"), Some("26537509"));
        assert_eq!(study.root.first_value("Study PMC ID"), Some("PMC4632357"));
    }

    #[test]
    fn test_data_doi_uses_identifier_and_cite_as() {
        let doc =
            encode_text("Comment[IDR Study Accession]\tidr0001\nStudy Data DOI\t10.1000/abc\n").document;
        let root = entity(&doc, ROOT);
        let reference = json!({"@id": "#study-data-doi-1"});
        assert_eq!(root["cite-as"], reference);
        assert_eq!(root["identifier"], json!(["idr0001", reference]));

        let doi = entity(&doc, "#study-data-doi-1");
        assert_eq!(doi["value"], "10.1000/abc");
        assert_eq!(doi["url"], "https://doi.org/10.1000/abc");
        assert_eq!(doi["propertyID"], DOI_REGISTRY);
    }

    #[test]
    fn test_unresolved_accession_degrades() {
        let result = encode_text("Study Type\thigh content screen\n");
        assert_eq!(
            result.warnings,
            vec![Warning::UnresolvedAccession {
                field: "Study Type".to_string(),
                value: "high content screen".to_string(),
            }]
        );
        let root = entity(&result.document, "./");
        assert!(root.get("studyType").is_none());
        let property = entity(&result.document, "#study-property-1");
        assert_eq!(property["name"], "Study Type");
        assert_eq!(property["value"], "high content screen");
    }

    #[test]
    fn test_companion_label_and_multi_values() {
        let text = "Study Organism\tHomo sapiens\tMus musculus\n\
Study Organism Term Accession\tNCBITaxon_9606\tNCBITaxon_10090\n";
        let doc = encode_text(text).document;
        let root = entity(&doc, "./");
        assert_eq!(
            root["studyOrganismTerm"],
            json!([
                {"@id": "http://purl.obolibrary.org/obo/NCBITaxon_9606"},
                {"@id": "http://purl.obolibrary.org/obo/NCBITaxon_10090"}
            ])
        );
        let mouse = entity(&doc, "http://purl.obolibrary.org/obo/NCBITaxon_10090");
        assert_eq!(mouse["name"], "Mus musculus");
    }

    #[test]
    fn test_sections_and_field_order() {
        let text = "Comment[IDR Study Accession]\tidr0001\n\
Study Title\tT\n\
Screen Number\t1\n\
Comment[IDR Screen Name]\tidr0001-screenA\n\
Experiment Number\t1\n\
Experiment Description\tLive imaging\n";
        let doc = encode_text(text).document;
        let root = entity(&doc, ROOT);
        assert_eq!(
            root["hasPart"],
            json!([{"@id": "#screen-1"}, {"@id": "#experiment-1"}])
        );
        assert_eq!(
            root["fieldOrder"],
            json!(["Comment[IDR Study Accession]", "Study Title"])
        );

        let screen = entity(&doc, "#screen-1");
        assert_eq!(screen["position"], 1);
        assert_eq!(screen["name"], "idr0001-screenA");
        let experiment = entity(&doc, "#experiment-1");
        assert_eq!(experiment["name"], "Experiment 1");
        assert_eq!(experiment["description"], "Live imaging");
    }

    #[test]
    fn test_no_dangling_references() {
        let text = "Comment[IDR Study Accession]\tidr0001\n\
Study License\tCC BY 4.0\n\
Study License URL\thttps://creativecommons.org/licenses/by/4.0/\n\
Study Person Last Name\tDoe\tRoe\n\
Study Person First Name\tJane\tRichard\n\
Study Person ORCID\t0000-0002-1825-0097\n\
Study DOI\t10.1000/xyz\n\
Study Data DOI\t10.1000/abc\n\
Study Type Term Accession\tEFO_0007550\n\
Screen Number\t1\n\
Screen Imaging Method Term Accession\tFBbi_00000246\n";
        let doc = encode_text(text).document;
        let graph = graph_of(&doc).unwrap();
        EntityIndex::new(graph).check_references().unwrap();

        let root = entity(&doc, ROOT);
        assert_eq!(
            root["author"],
            json!([{"@id": "https://orcid.org/0000-0002-1825-0097"}, {"@id": "#person-2"}])
        );
        assert_eq!(entity(&doc, "#person-2")["name"], "Richard Roe");
    }

    #[test]
    fn test_encoding_is_deterministic() {
        let study = IdrDecoder::default().decode_str(
            "Comment[IDR Study Accession]\tidr0001\nStudy Type\tEFO_0007550\nScreen Number\t1\n",
        );
        let a = to_json_string(&RoCrateEncoder.encode(&study), true).unwrap();
        let b = to_json_string(&RoCrateEncoder.encode(&study), true).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_repeated_term_emitted_once() {
        let text = "Screen Number\t1\nScreen Imaging Method\tFBbi_00000246\n\
Screen Number\t2\nScreen Imaging Method\tFBbi_00000246\n";
        let doc = encode_text(text).document;
        let count = doc["@graph"]
            .as_array()
            .unwrap()
            .iter()
            .filter(|e| e["@id"] == "http://purl.obolibrary.org/obo/FBbi_00000246")
            .count();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_thumbnail_urls() {
        let text = "Comment[IDR Study Accession]\tidr9999\n\
Screen Number\t1\n\
Screen Example Images\thttps://idr.openmicroscopy.org/webclient/?show=well-592362\thttps://idr.openmicroscopy.org/webclient/img_detail/1239777/\n\
Experiment Number\t1\n\
Experiment Example Images\thttps://idr.openmicroscopy.org/webclient/?show=image-3125701\thttp://idr.openmicroscopy.org/webclient/img_detail/3125701/\n";
        let doc = encode_text(text).document;
        let root = entity(&doc, "https://idr.openmicroscopy.org/study/idr9999/");
        assert_eq!(
            root["thumbnailUrl"],
            json!([
                "https://idr.openmicroscopy.org/webgateway/render_thumbnail/1239777/?",
                "https://idr.openmicroscopy.org/webgateway/render_thumbnail/3125701/?"
            ])
        );
    }

    #[test]
    fn test_empty_field_is_property_without_value() {
        let doc = encode_text("Study Key Words\nStudy Type\n").document;
        let first = entity(&doc, "#study-property-1");
        assert_eq!(first["name"], "Study Key Words");
        assert!(first.get("value").is_none());
        assert_eq!(entity(&doc, "#study-property-2")["name"], "Study Type");
    }
}
