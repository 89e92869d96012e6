//! Ontology hierarchy subsets
//!
//! Starting from the ontology terms a merged store references, walk parent
//! edges upward through the full ontology and keep only the terms touched.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use oxrdf::{Literal, NamedNode, NamedOrBlankNode, Term, Triple};
use tracing::{info, warn};

use crate::error::Warning;

use super::namespaces::{
    DWC_SCIENTIFIC_NAME, DWC_TAXON, OBO_NS, OWL_CLASS, RDFS_LABEL, RDFS_SUBCLASS_OF, RDF_TYPE,
    SKOS_BROADER,
};
use super::store::TripleStore;

/// Which ontology a subset is cut from and how its terms are typed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubsetTarget {
    pub name: &'static str,
    /// IRI prefixes that mark a referenced term as belonging to this ontology
    pub term_prefixes: Vec<String>,
    /// Class given to every emitted term
    pub class: &'static str,
    /// Extra predicate carrying the label, besides rdfs:label
    pub name_predicate: Option<&'static str>,
}

impl SubsetTarget {
    /// Biological imaging methods
    pub fn fbbi() -> Self {
        Self {
            name: "fbbi",
            term_prefixes: vec![format!("{}FBbi_", OBO_NS), format!("{}FBBI_", OBO_NS)],
            class: OWL_CLASS,
            name_predicate: None,
        }
    }

    /// NCBI organismal taxonomy
    pub fn ncbitaxon() -> Self {
        Self {
            name: "ncbitaxon",
            term_prefixes: vec![format!("{}NCBITaxon_", OBO_NS)],
            class: DWC_TAXON,
            name_predicate: Some(DWC_SCIENTIFIC_NAME),
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "fbbi" => Some(Self::fbbi()),
            "ncbitaxon" => Some(Self::ncbitaxon()),
            _ => None,
        }
    }

    pub fn matches(&self, iri: &str) -> bool {
        self.term_prefixes.iter().any(|p| iri.starts_with(p.as_str()))
    }
}

/// Outcome of an extraction
#[derive(Debug, Clone, Default)]
pub struct SubsetResult {
    pub store: TripleStore,
    /// Terms emitted, seeds and their ancestors
    pub selected: BTreeSet<String>,
    /// Referenced terms the ontology does not define
    pub unresolved: BTreeSet<String>,
    pub warnings: Vec<Warning>,
}

#[derive(Debug, Default)]
struct Label {
    english: Option<String>,
    plain: Option<String>,
    other: Option<String>,
}

impl Label {
    fn offer(&mut self, literal: &Literal) {
        let slot = match literal.language() {
            Some(lang) if lang.eq_ignore_ascii_case("en") || lang.starts_with("en-") => {
                &mut self.english
            }
            Some(_) => &mut self.other,
            None => &mut self.plain,
        };
        slot.get_or_insert_with(|| literal.value().to_string());
    }

    fn best(&self) -> Option<&str> {
        self.english
            .as_deref()
            .or(self.plain.as_deref())
            .or(self.other.as_deref())
    }
}

/// Parent edges and labels of an ontology, keyed by term IRI
#[derive(Debug, Default)]
struct OntologyIndex {
    defined: BTreeSet<String>,
    parents: HashMap<String, BTreeSet<String>>,
    labels: HashMap<String, Label>,
    /// Lowercased IRI to defined IRI, for prefix case variants
    folded: HashMap<String, String>,
}

impl OntologyIndex {
    fn build(ontology: &TripleStore) -> Self {
        let mut index = Self::default();
        for triple in ontology.iter() {
            let NamedOrBlankNode::NamedNode(subject) = &triple.subject else {
                continue;
            };
            let subject = subject.as_str();
            index.defined.insert(subject.to_string());

            match (triple.predicate.as_str(), &triple.object) {
                (RDFS_SUBCLASS_OF | SKOS_BROADER, Term::NamedNode(parent)) => {
                    index
                        .parents
                        .entry(subject.to_string())
                        .or_default()
                        .insert(parent.as_str().to_string());
                }
                (RDFS_LABEL, Term::Literal(literal)) => {
                    index
                        .labels
                        .entry(subject.to_string())
                        .or_default()
                        .offer(literal);
                }
                _ => {}
            }
        }
        index.folded = index
            .defined
            .iter()
            .map(|iri| (iri.to_lowercase(), iri.clone()))
            .collect();
        index
    }

    fn lookup(&self, iri: &str) -> Option<&str> {
        if let Some(found) = self.defined.get(iri) {
            return Some(found.as_str());
        }
        self.folded.get(&iri.to_lowercase()).map(String::as_str)
    }
}

/// Ontology terms of the target that appear anywhere in the store
pub fn referenced_terms(store: &TripleStore, target: &SubsetTarget) -> BTreeSet<String> {
    let mut seeds = BTreeSet::new();
    for triple in store.iter() {
        if let NamedOrBlankNode::NamedNode(node) = &triple.subject {
            if target.matches(node.as_str()) {
                seeds.insert(node.as_str().to_string());
            }
        }
        if let Term::NamedNode(node) = &triple.object {
            if target.matches(node.as_str()) {
                seeds.insert(node.as_str().to_string());
            }
        }
    }
    seeds
}

/// Cut the hierarchy subset of `ontology` reachable from the terms `merged` uses
///
/// Referenced terms missing from the ontology are reported and skipped. The
/// walk follows parents only while they are defined in the ontology.
pub fn extract_subset(
    merged: &TripleStore,
    ontology: &TripleStore,
    target: &SubsetTarget,
) -> SubsetResult {
    let index = OntologyIndex::build(ontology);
    let seeds = referenced_terms(merged, target);

    let mut result = SubsetResult::default();
    let mut stack: Vec<String> = Vec::new();
    for seed in &seeds {
        match index.lookup(seed) {
            Some(found) => stack.push(found.to_string()),
            None => {
                warn!(term = %seed, ontology = target.name, "Term not found in ontology, skipping");
                result.warnings.push(Warning::UnresolvedOntologyTerm { term: seed.clone() });
                result.unresolved.insert(seed.clone());
            }
        }
    }

    while let Some(term) = stack.pop() {
        if !result.selected.insert(term.clone()) {
            continue;
        }
        if let Some(parents) = index.parents.get(&term) {
            for parent in parents {
                if index.defined.contains(parent) && !result.selected.contains(parent) {
                    stack.push(parent.clone());
                }
            }
        }
    }

    let edges: BTreeMap<&String, Vec<&String>> = result
        .selected
        .iter()
        .map(|term| {
            let parents = index
                .parents
                .get(term)
                .map(|ps| ps.iter().filter(|p| result.selected.contains(*p)).collect())
                .unwrap_or_default();
            (term, parents)
        })
        .collect();

    let rdf_type = NamedNode::new_unchecked(RDF_TYPE);
    let class = NamedNode::new_unchecked(target.class);
    let label_predicate = NamedNode::new_unchecked(RDFS_LABEL);
    let subclass_of = NamedNode::new_unchecked(RDFS_SUBCLASS_OF);
    let mut store = TripleStore::new();
    for (term, parents) in edges {
        let subject = NamedNode::new_unchecked(term.as_str());
        store.insert(Triple::new(subject.clone(), rdf_type.clone(), class.clone()));
        if let Some(label) = index.labels.get(term).and_then(Label::best) {
            store.insert(Triple::new(
                subject.clone(),
                label_predicate.clone(),
                Literal::new_simple_literal(label),
            ));
            if let Some(name_predicate) = target.name_predicate {
                store.insert(Triple::new(
                    subject.clone(),
                    NamedNode::new_unchecked(name_predicate),
                    Literal::new_simple_literal(label),
                ));
            }
        }
        for parent in parents {
            store.insert(Triple::new(
                subject.clone(),
                subclass_of.clone(),
                NamedNode::new_unchecked(parent.as_str()),
            ));
        }
    }

    info!(
        ontology = target.name,
        referenced = seeds.len(),
        selected = result.selected.len(),
        unresolved = result.unresolved.len(),
        triples = store.len(),
        "Extracted ontology subset"
    );
    result.store = store;
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rdf::store::parse_rdf;
    use oxrdfio::RdfFormat;

    const ONTOLOGY: &str = r#"
@prefix obo: <http://purl.obolibrary.org/obo/> .
@prefix rdfs: <http://www.w3.org/2000/01/rdf-schema#> .
@prefix owl: <http://www.w3.org/2002/07/owl#> .
@prefix skos: <http://www.w3.org/2004/02/skos/core#> .

obo:FBbi_00000001 a owl:Class ; rdfs:label "imaging method"@en .
obo:FBbi_00000222 a owl:Class ; rdfs:label "microscopy"@en ;
    rdfs:subClassOf obo:FBbi_00000001 .
obo:FBbi_00000246 a owl:Class ;
    rdfs:label "fluorescence microscopy"@en , "microscopie de fluorescence"@fr ;
    rdfs:subClassOf obo:FBbi_00000222 , [ a owl:Restriction ] .
obo:FBbi_00000399 a owl:Class ; rdfs:label "unrelated"@en .

obo:NCBITaxon_1 rdfs:label "root" .
obo:NCBITaxon_9605 rdfs:label "Homo" ; skos:broader obo:NCBITaxon_1 .
obo:NCBITaxon_9606 rdfs:label "Homo sapiens" ;
    rdfs:subClassOf obo:NCBITaxon_9605 , obo:NCBITaxon_0000 .
"#;

    const MERGED: &str = r#"
<https://idr.openmicroscopy.org/study/idr0001/> <http://schema.org/measurementTechnique> <http://purl.obolibrary.org/obo/FBbi_00000246> .
<https://idr.openmicroscopy.org/study/idr0001/> <http://schema.org/about> <http://purl.obolibrary.org/obo/NCBITaxon_9606> .
<https://idr.openmicroscopy.org/study/idr0002/> <http://schema.org/measurementTechnique> <http://purl.obolibrary.org/obo/FBbi_99999999> .
"#;

    fn store(text: &str) -> TripleStore {
        parse_rdf(text.as_bytes(), RdfFormat::Turtle, None)
            .unwrap()
            .into_iter()
            .collect()
    }

    fn has(store: &TripleStore, s: &str, p: &str, o: &str) -> bool {
        store.iter().any(|t| {
            t.subject.to_string() == s && t.predicate.as_str() == p && t.object.to_string() == o
        })
    }

    #[test]
    fn test_fbbi_closure() {
        let result = extract_subset(&store(MERGED), &store(ONTOLOGY), &SubsetTarget::fbbi());

        let selected: Vec<&str> = result.selected.iter().map(String::as_str).collect();
        assert_eq!(
            selected,
            vec![
                "http://purl.obolibrary.org/obo/FBbi_00000001",
                "http://purl.obolibrary.org/obo/FBbi_00000222",
                "http://purl.obolibrary.org/obo/FBbi_00000246",
            ]
        );

        let fm = "<http://purl.obolibrary.org/obo/FBbi_00000246>";
        assert!(has(&result.store, fm, RDF_TYPE, &format!("<{}>", OWL_CLASS)));
        assert!(has(&result.store, fm, RDFS_LABEL, "\"fluorescence microscopy\""));
        assert!(has(
            &result.store,
            fm,
            RDFS_SUBCLASS_OF,
            "<http://purl.obolibrary.org/obo/FBbi_00000222>"
        ));
        // Blank-node restriction is not a parent
        assert_eq!(
            result
                .store
                .iter()
                .filter(|t| t.predicate.as_str() == RDFS_SUBCLASS_OF)
                .count(),
            2
        );
    }

    #[test]
    fn test_missing_term_is_skipped() {
        let result = extract_subset(&store(MERGED), &store(ONTOLOGY), &SubsetTarget::fbbi());

        let missing = "http://purl.obolibrary.org/obo/FBbi_99999999";
        assert!(result.unresolved.contains(missing));
        assert!(!result.selected.contains(missing));
        assert!(!result
            .store
            .iter()
            .any(|t| t.subject.to_string().contains("FBbi_99999999")));
        assert_eq!(
            result.warnings,
            vec![Warning::UnresolvedOntologyTerm {
                term: missing.to_string()
            }]
        );
    }

    #[test]
    fn test_ncbitaxon_subset() {
        let result = extract_subset(&store(MERGED), &store(ONTOLOGY), &SubsetTarget::ncbitaxon());

        assert_eq!(result.selected.len(), 3);
        assert!(result.unresolved.is_empty());
        let human = "<http://purl.obolibrary.org/obo/NCBITaxon_9606>";
        assert!(has(&result.store, human, RDF_TYPE, &format!("<{}>", DWC_TAXON)));
        assert!(has(&result.store, human, DWC_SCIENTIFIC_NAME, "\"Homo sapiens\""));
        // Parent absent from the ontology is not walked or linked
        assert!(!result
            .store
            .iter()
            .any(|t| t.object.to_string().contains("NCBITaxon_0000")));
        assert!(has(
            &result.store,
            "<http://purl.obolibrary.org/obo/NCBITaxon_9605>",
            RDFS_SUBCLASS_OF,
            "<http://purl.obolibrary.org/obo/NCBITaxon_1>"
        ));
    }

    #[test]
    fn test_prefix_case_variant_resolves() {
        let merged = store(
            "<https://idr.openmicroscopy.org/study/idr0003/> <http://schema.org/measurementTechnique> <http://purl.obolibrary.org/obo/FBBI_00000001> .",
        );
        let result = extract_subset(&merged, &store(ONTOLOGY), &SubsetTarget::fbbi());
        assert!(result.unresolved.is_empty());
        assert!(result
            .selected
            .contains("http://purl.obolibrary.org/obo/FBbi_00000001"));
    }

    #[test]
    fn test_target_from_name() {
        assert_eq!(SubsetTarget::from_name("FBbi"), Some(SubsetTarget::fbbi()));
        assert_eq!(SubsetTarget::from_name("ncbitaxon"), Some(SubsetTarget::ncbitaxon()));
        assert_eq!(SubsetTarget::from_name("efo"), None);
    }
}
