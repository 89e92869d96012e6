//! RDF support: crate to triples, merging, and ontology subsets
//!
//! Crates are turned into triples with their relative identifiers resolved
//! against each crate's own location, so many crates can be merged into one
//! deduplicated store and written as Turtle.
//!
//! # Example
//!
//! ```ignore
//! use idr_rocrate::rdf::{extract_subset, load_rdf_file, merge_sources, SubsetTarget};
//!
//! let merged = merge_sources(vec!["ro-crates/idr0001", "ro-crates/idr0002"])?;
//! let ontology = load_rdf_file("fbbi.ttl".as_ref())?;
//! let subset = extract_subset(&merged, &ontology, &SubsetTarget::fbbi());
//! subset.store.save_turtle("fbbi-subset.ttl".as_ref())?;
//! ```

pub mod context;
pub mod convert;
pub mod merge;
pub mod namespaces;
pub mod store;
pub mod subset;

pub use context::ResolvedContext;
pub use convert::crate_to_triples;
pub use merge::{merge_files, merge_sources, source_triples, MergeSource};
pub use store::{load_rdf_file, parse_rdf, TripleStore};
pub use subset::{extract_subset, referenced_terms, SubsetResult, SubsetTarget};
