//! Field classification for IDR metadata keys
//!
//! Maps raw IDR field names to the way they are represented in a crate,
//! and resolves ontology accessions against a fixed table of term sources.

use std::collections::HashMap;
use std::sync::OnceLock;

use regex::Regex;

use crate::model::SectionKind;

/// How a field is carried in the crate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Values are ontology accessions, emitted as DefinedTerm references
    Ontology,
    /// Publication DOI, emitted via `citation`
    PublicationDoi,
    /// Dataset DOI, emitted via `identifier` and `cite-as`
    DatasetDoi,
    /// Opens a screen or experiment section
    SectionMarker(SectionKind),
    /// Anything else, emitted as a PropertyValue
    Generic,
}

pub const STUDY_DOI_KEY: &str = "Study DOI";
pub const STUDY_DATA_DOI_KEY: &str = "Study Data DOI";
pub const PUBMED_ID_KEY: &str = "Study PubMed ID";
pub const PMC_ID_KEY: &str = "Study PMC ID";

/// An ontology-backed field and the dataset property that carries it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OntologyField {
    pub key: &'static str,
    /// Short JSON-LD term on the dataset entity
    pub property: &'static str,
    /// schema.org property the short term expands to
    pub schema_term: &'static str,
    /// Companion field holding human-readable labels for these accessions
    pub label_key: Option<&'static str>,
}

const ONTOLOGY_FIELDS: &[OntologyField] = &[
    OntologyField {
        key: "Study Type",
        property: "studyType",
        schema_term: "additionalType",
        label_key: None,
    },
    OntologyField {
        key: "Study Type Term Accession",
        property: "studyTypeTerm",
        schema_term: "additionalType",
        label_key: Some("Study Type"),
    },
    OntologyField {
        key: "Study Organism",
        property: "studyOrganism",
        schema_term: "about",
        label_key: None,
    },
    OntologyField {
        key: "Study Organism Term Accession",
        property: "studyOrganismTerm",
        schema_term: "about",
        label_key: Some("Study Organism"),
    },
    OntologyField {
        key: "Screen Imaging Method",
        property: "screenImagingMethod",
        schema_term: "measurementTechnique",
        label_key: None,
    },
    OntologyField {
        key: "Screen Imaging Method Term Accession",
        property: "screenImagingMethodTerm",
        schema_term: "measurementTechnique",
        label_key: Some("Screen Imaging Method"),
    },
    OntologyField {
        key: "Screen Technology Type",
        property: "screenTechnologyType",
        schema_term: "additionalType",
        label_key: None,
    },
    OntologyField {
        key: "Screen Technology Type Term Accession",
        property: "screenTechnologyTypeTerm",
        schema_term: "additionalType",
        label_key: Some("Screen Technology Type"),
    },
    OntologyField {
        key: "Screen Type",
        property: "screenType",
        schema_term: "category",
        label_key: None,
    },
    OntologyField {
        key: "Screen Type Term Accession",
        property: "screenTypeTerm",
        schema_term: "category",
        label_key: Some("Screen Type"),
    },
    OntologyField {
        key: "Experiment Imaging Method",
        property: "experimentImagingMethod",
        schema_term: "measurementTechnique",
        label_key: None,
    },
    OntologyField {
        key: "Experiment Imaging Method Term Accession",
        property: "experimentImagingMethodTerm",
        schema_term: "measurementTechnique",
        label_key: Some("Experiment Imaging Method"),
    },
];

/// All ontology-backed fields, in table order
pub fn ontology_fields() -> &'static [OntologyField] {
    ONTOLOGY_FIELDS
}

pub fn ontology_field(key: &str) -> Option<&'static OntologyField> {
    ONTOLOGY_FIELDS.iter().find(|f| f.key == key)
}

fn field_table() -> &'static HashMap<&'static str, FieldKind> {
    static TABLE: OnceLock<HashMap<&'static str, FieldKind>> = OnceLock::new();
    TABLE.get_or_init(|| {
        let mut table: HashMap<&'static str, FieldKind> = ONTOLOGY_FIELDS
            .iter()
            .map(|f| (f.key, FieldKind::Ontology))
            .collect();
        table.insert(STUDY_DOI_KEY, FieldKind::PublicationDoi);
        table.insert(STUDY_DATA_DOI_KEY, FieldKind::DatasetDoi);
        for kind in [SectionKind::Screen, SectionKind::Experiment] {
            table.insert(kind.marker_key(), FieldKind::SectionMarker(kind));
        }
        table
    })
}

/// Classify a raw IDR key. Unknown keys are `Generic`.
pub fn classify(key: &str) -> FieldKind {
    field_table()
        .get(key)
        .copied()
        .unwrap_or(FieldKind::Generic)
}

/// An ontology that accessions can resolve against
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TermSource {
    /// Canonical accession prefix, e.g. `FBbi`
    pub prefix: &'static str,
    pub name: &'static str,
    /// Namespace that term IRIs are minted in
    pub term_namespace: &'static str,
    /// @id of the DefinedTermSet entity
    pub term_set: &'static str,
}

const OBO: &str = "http://purl.obolibrary.org/obo/";

const TERM_SOURCES: &[TermSource] = &[
    TermSource {
        prefix: "EFO",
        name: "Experimental Factor Ontology",
        term_namespace: "http://www.ebi.ac.uk/efo/",
        term_set: "http://www.ebi.ac.uk/efo/",
    },
    TermSource {
        prefix: "FBbi",
        name: "Biological Imaging Methods Ontology",
        term_namespace: OBO,
        term_set: "https://www.ebi.ac.uk/ols4/ontologies/fbbi",
    },
    TermSource {
        prefix: "NCBITaxon",
        name: "NCBI organismal classification",
        term_namespace: OBO,
        term_set: "https://www.ebi.ac.uk/ols4/ontologies/ncbitaxon",
    },
    TermSource {
        prefix: "CMPO",
        name: "Cellular Microscopy Phenotype Ontology",
        term_namespace: OBO,
        term_set: "https://www.ebi.ac.uk/ols4/ontologies/cmpo",
    },
    TermSource {
        prefix: "OBI",
        name: "Ontology for Biomedical Investigations",
        term_namespace: OBO,
        term_set: "https://www.ebi.ac.uk/ols4/ontologies/obi",
    },
    TermSource {
        prefix: "GO",
        name: "Gene Ontology",
        term_namespace: OBO,
        term_set: "https://www.ebi.ac.uk/ols4/ontologies/go",
    },
    TermSource {
        prefix: "CL",
        name: "Cell Ontology",
        term_namespace: OBO,
        term_set: "https://www.ebi.ac.uk/ols4/ontologies/cl",
    },
    TermSource {
        prefix: "UBERON",
        name: "Uberon multi-species anatomy ontology",
        term_namespace: OBO,
        term_set: "https://www.ebi.ac.uk/ols4/ontologies/uberon",
    },
    TermSource {
        prefix: "PATO",
        name: "Phenotype And Trait Ontology",
        term_namespace: OBO,
        term_set: "https://www.ebi.ac.uk/ols4/ontologies/pato",
    },
    TermSource {
        prefix: "CHEBI",
        name: "Chemical Entities of Biological Interest",
        term_namespace: OBO,
        term_set: "https://www.ebi.ac.uk/ols4/ontologies/chebi",
    },
    TermSource {
        prefix: "BAO",
        name: "BioAssay Ontology",
        term_namespace: OBO,
        term_set: "https://www.ebi.ac.uk/ols4/ontologies/bao",
    },
];

/// Look up a term source by accession prefix (case-insensitive)
pub fn term_source(prefix: &str) -> Option<&'static TermSource> {
    TERM_SOURCES
        .iter()
        .find(|s| s.prefix.eq_ignore_ascii_case(prefix))
}

/// A resolved ontology accession
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TermRef {
    /// Normalized `PREFIX_CODE` form, used as termCode
    pub code: String,
    /// Term IRI, used as the DefinedTerm @id
    pub iri: String,
    pub source: &'static TermSource,
}

fn compact_accession_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^([A-Za-z][A-Za-z0-9]*)[_:]([A-Za-z0-9]+)$").unwrap())
}

/// Parse an accession (`EFO_0007550`, `EFO:0007550` or a term URI)
///
/// Returns `None` when the value has another shape or the prefix is not a
/// known term source.
pub fn parse_accession(value: &str) -> Option<TermRef> {
    let value = value.trim();
    let compact = if value.starts_with("http://") || value.starts_with("https://") {
        let trimmed = value.trim_end_matches('/');
        let cut = trimmed.rfind(['/', '#'])?;
        &trimmed[cut + 1..]
    } else {
        value
    };

    let caps = compact_accession_regex().captures(compact)?;
    let source = term_source(&caps[1])?;
    let code = format!("{}_{}", source.prefix, &caps[2]);
    Some(TermRef {
        iri: format!("{}{}", source.term_namespace, code),
        code,
        source,
    })
}
