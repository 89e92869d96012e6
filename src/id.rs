//! Identifier construction and classification for IDR crates
//!
//! Builds the @ids the encoder mints (root, sections, properties, people,
//! DOIs) and recognizes metadata file ids in crates read back.

use crate::model::SectionKind;
use crate::vocab::{DOI_RESOLVER, IDR_STUDY_BASE, METADATA_DESCRIPTOR_ID, ROOT_ENTITY_ID};

/// Whether an @id names a crate metadata file (`ro-crate-metadata.json`,
/// `idr0001-ro-crate-metadata.json`, ...) rather than a remote resource
pub fn is_metadata_file_id(id: &str) -> bool {
    !id.contains("://") && id.ends_with(METADATA_DESCRIPTOR_ID)
}

/// Root dataset @id: the IDR study URL, or the detached placeholder
pub fn root_id(accession: Option<&str>) -> String {
    match accession.map(str::trim).filter(|a| !a.is_empty()) {
        Some(accession) => format!("{}{}/", IDR_STUDY_BASE, accession),
        None => ROOT_ENTITY_ID.to_string(),
    }
}

/// Metadata file name for a study
pub fn crate_filename(accession: Option<&str>) -> String {
    match accession.map(str::trim).filter(|a| !a.is_empty()) {
        Some(accession) => format!("{}-{}", accession, METADATA_DESCRIPTOR_ID),
        None => METADATA_DESCRIPTOR_ID.to_string(),
    }
}

pub fn section_id(kind: SectionKind, index: usize) -> String {
    format!("#{}-{}", kind.slug(), index)
}

/// Parse a section @id (`#screen-2`) back into kind and index
pub fn parse_section_id(id: &str) -> Option<(SectionKind, usize)> {
    let rest = id.strip_prefix('#')?;
    let (slug, index) = rest.rsplit_once('-')?;
    Some((SectionKind::from_slug(slug)?, index.parse().ok()?))
}

/// PropertyValue @id for the n-th generic field of a scope
pub fn property_id(scope: &str, n: usize) -> String {
    format!("#{}-property-{}", scope, n)
}

/// PropertyValue @id for the n-th dataset DOI of a scope
pub fn data_doi_id(scope: &str, n: usize) -> String {
    format!("#{}-data-doi-{}", scope, n)
}

/// Normalize a DOI to its `https://doi.org/` URL
pub fn normalize_doi(value: &str) -> String {
    let value = value.trim();
    let value = value.strip_prefix("doi:").unwrap_or(value).trim();
    if value.is_empty() {
        return String::new();
    }
    for prefix in ["http://dx.doi.org/", "https://dx.doi.org/", "http://doi.org/"] {
        if let Some(rest) = value.strip_prefix(prefix) {
            return format!("{}{}", DOI_RESOLVER, rest);
        }
    }
    if value.starts_with("http://") || value.starts_with("https://") {
        return value.to_string();
    }
    format!("{}{}", DOI_RESOLVER, value)
}

/// Prefix scheme-less URLs with `http://`
pub fn normalize_url(value: &str) -> String {
    let value = value.trim();
    if value.is_empty() || value.contains("://") {
        return value.to_string();
    }
    format!("http://{}", value)
}

pub fn orcid_id(orcid: &str) -> String {
    let orcid = orcid.trim();
    if orcid.contains("orcid.org") {
        orcid.to_string()
    } else {
        format!("https://orcid.org/{}", orcid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metadata_file_ids() {
        assert!(is_metadata_file_id("ro-crate-metadata.json"));
        assert!(is_metadata_file_id("idr0001-ro-crate-metadata.json"));
        assert!(!is_metadata_file_id("./"));
        assert!(!is_metadata_file_id("#screen-1"));
        assert!(!is_metadata_file_id(
            "https://example.org/crates/ro-crate-metadata.json"
        ));
    }

    #[test]
    fn test_root_id() {
        assert_eq!(
            root_id(Some("idr0001")),
            "https://idr.openmicroscopy.org/study/idr0001/"
        );
        assert_eq!(root_id(None), "./");
        assert_eq!(root_id(Some("  ")), "./");
    }

    #[test]
    fn test_crate_filename() {
        assert_eq!(
            crate_filename(Some("idr0001")),
            "idr0001-ro-crate-metadata.json"
        );
        assert_eq!(crate_filename(None), "ro-crate-metadata.json");
    }

    #[test]
    fn test_section_ids() {
        assert_eq!(section_id(SectionKind::Screen, 2), "#screen-2");
        assert_eq!(
            parse_section_id("#experiment-3"),
            Some((SectionKind::Experiment, 3))
        );
        assert_eq!(parse_section_id("#study-property-1"), None);
        assert_eq!(parse_section_id("screen-1"), None);
    }

    #[test]
    fn test_normalize_doi() {
        assert_eq!(normalize_doi("10.1000/xyz"), "https://doi.org/10.1000/xyz");
        assert_eq!(normalize_doi("doi:10.1000/xyz"), "https://doi.org/10.1000/xyz");
        assert_eq!(
            normalize_doi("http://dx.doi.org/10.1000/xyz"),
            "https://doi.org/10.1000/xyz"
        );
        assert_eq!(
            normalize_doi("https://doi.org/10.17867/10000101"),
            "https://doi.org/10.17867/10000101"
        );
    }

    #[test]
    fn test_normalize_url_and_orcid() {
        assert_eq!(normalize_url("example.org/x"), "http://example.org/x");
        assert_eq!(normalize_url("https://example.org"), "https://example.org");
        assert_eq!(
            orcid_id("0000-0002-1825-0097"),
            "https://orcid.org/0000-0002-1825-0097"
        );
    }
}
