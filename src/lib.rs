//! IDR study metadata and RO-Crate conversion library
//!
//! This library converts between the tab-delimited study files of the Image
//! Data Resource (IDR) and RO-Crate 1.2 JSON-LD, merges crates into one RDF
//! graph, and cuts ontology hierarchy subsets for the terms those crates use.
//!
//! # Overview
//!
//! Conversion runs through a shared record model ([`Study`]):
//!
//! 1. [`IdrDecoder`] parses study text into ordered fields and sections
//! 2. [`RoCrateEncoder`] maps fields to crate entities: ontology fields become
//!    `DefinedTerm`s, DOIs become citations and `cite-as` links, everything
//!    else becomes a `PropertyValue`
//! 3. [`RoCrateDecoder`] reads a crate back into the same model, and
//!    [`IdrEncoder`] renders it as study text again
//!
//! Crates carry a `fieldOrder` list so field order survives the round trip.
//!
//! # Vocabulary
//!
//! The crate context extends RO-Crate with short terms for the IDR ontology
//! fields (`studyType`, `studyOrganism`, ...) mapped onto schema.org, plus
//! `fieldOrder` in the IDR terms namespace.
//!
//! # Usage
//!
//! ## Study text to crate
//!
//! ```ignore
//! use idr_rocrate::{IdrDecoder, RoCrateEncoder, to_json_string};
//!
//! let study = IdrDecoder::default().decode_path("idr0001-study.txt".as_ref())?;
//! let result = RoCrateEncoder.encode_with_warnings(&study);
//! println!("{}", to_json_string(&result.document, true)?);
//! ```
//!
//! ## Crate back to study text
//!
//! ```ignore
//! use idr_rocrate::{IdrEncoder, RoCrateDecoder};
//!
//! let study = RoCrateDecoder::default().decode_path("idr0001-ro-crate-metadata.json".as_ref())?;
//! let text = IdrEncoder.encode(&study);
//! ```
//!
//! ## Batch conversion, merge and subsets
//!
//! ```ignore
//! use idr_rocrate::batch::{run_batch, BatchOptions, NoOpObserver};
//! use idr_rocrate::rdf::{extract_subset, load_rdf_file, merge_sources, SubsetTarget};
//!
//! let report = run_batch(&BatchOptions::default(), &NoOpObserver)?;
//! let merged = merge_sources(report.succeeded.iter().map(|i| i.output.clone()))?;
//! let fbbi = load_rdf_file("fbbi.ttl".as_ref())?;
//! let subset = extract_subset(&merged, &fbbi, &SubsetTarget::fbbi());
//! ```

pub mod batch;
pub mod classify;
pub mod collect;
pub mod decode;
pub mod encode;
pub mod error;
pub mod id;
pub mod idr;
pub mod index;
pub mod loader;
pub mod logging;
pub mod merge;
pub mod model;
pub mod rdf;
pub mod vocab;

// Re-export main types for convenience
pub use crate::batch::{run_batch, BatchOptions, BatchReport};
pub use crate::decode::RoCrateDecoder;
pub use crate::encode::{to_json_string, EncodeResult, RoCrateEncoder};
pub use crate::error::{ConvertError, Warning};
pub use crate::idr::{DecodeOptions, IdrDecoder, IdrEncoder};
pub use crate::index::{build_index_crate, IndexEntry};
pub use crate::model::{Field, FieldValue, Record, Section, SectionKind, Study};
pub use crate::vocab::{crate_context, FIELD_ORDER, IDR_TERMS_NS, ROCRATE_CONTEXT, ROCRATE_PROFILE};
