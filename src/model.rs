//! Record model shared by the IDR and RO-Crate codecs
//!
//! A [`Study`] is an explicit tree: one root [`Record`] plus the screen and
//! experiment [`Section`]s that follow it. Both directions of the conversion
//! build and consume this same tree.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Value of one metadata field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Scalar(String),
    Multi(Vec<String>),
}

impl FieldValue {
    /// Build a value from a row's cells; exactly one cell gives `Scalar`
    pub fn from_values(mut values: Vec<String>) -> Self {
        if values.len() == 1 {
            FieldValue::Scalar(values.remove(0))
        } else {
            FieldValue::Multi(values)
        }
    }

    pub fn empty() -> Self {
        FieldValue::Multi(Vec::new())
    }

    pub fn values(&self) -> Vec<&str> {
        match self {
            FieldValue::Scalar(v) => vec![v.as_str()],
            FieldValue::Multi(vs) => vs.iter().map(String::as_str).collect(),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            FieldValue::Scalar(_) => 1,
            FieldValue::Multi(vs) => vs.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// First value that is not blank, trimmed
    pub fn first_non_empty(&self) -> Option<&str> {
        self.values()
            .into_iter()
            .map(str::trim)
            .find(|v| !v.is_empty())
    }
}

/// One key/value entry of a record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    pub key: String,
    pub value: FieldValue,
}

/// Ordered, key-unique list of fields
///
/// Re-inserting a key keeps its first position and replaces the value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    fields: Vec<Field>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a field, returning the value it replaced
    pub fn insert(&mut self, key: impl Into<String>, value: FieldValue) -> Option<FieldValue> {
        let key = key.into();
        match self.fields.iter_mut().find(|f| f.key == key) {
            Some(existing) => Some(std::mem::replace(&mut existing.value, value)),
            None => {
                self.fields.push(Field { key, value });
                None
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.fields.iter().find(|f| f.key == key).map(|f| &f.value)
    }

    /// First non-blank value of a field
    pub fn first_value(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(FieldValue::first_non_empty)
    }

    /// All values of a field, empty when the key is absent
    pub fn values(&self, key: &str) -> Vec<&str> {
        self.get(key).map(FieldValue::values).unwrap_or_default()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Field> {
        self.fields.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.key.as_str())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<'a> IntoIterator for &'a Record {
    type Item = &'a Field;
    type IntoIter = std::slice::Iter<'a, Field>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.iter()
    }
}

/// Kind of a study section, named after the row that opens it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SectionKind {
    Screen,
    Experiment,
}

impl SectionKind {
    /// The IDR key whose row opens a section of this kind
    pub fn marker_key(self) -> &'static str {
        match self {
            SectionKind::Screen => "Screen Number",
            SectionKind::Experiment => "Experiment Number",
        }
    }

    /// Lowercase slug used in fragment identifiers
    pub fn slug(self) -> &'static str {
        match self {
            SectionKind::Screen => "screen",
            SectionKind::Experiment => "experiment",
        }
    }

    pub fn from_slug(slug: &str) -> Option<Self> {
        match slug {
            "screen" => Some(SectionKind::Screen),
            "experiment" => Some(SectionKind::Experiment),
            _ => None,
        }
    }
}

impl fmt::Display for SectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SectionKind::Screen => write!(f, "Screen"),
            SectionKind::Experiment => write!(f, "Experiment"),
        }
    }
}

/// A screen or experiment block
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub kind: SectionKind,
    /// 1-based ordinal among sections of the same kind
    pub index: usize,
    pub record: Record,
}

impl Section {
    /// Scope name used for fragment identifiers, e.g. `screen-2`
    pub fn scope(&self) -> String {
        format!("{}-{}", self.kind.slug(), self.index)
    }
}

/// Root study fields plus its sections, in document order
///
/// A study parsed from text keeps that text in `source_text`, so writing it
/// back out reproduces the file exactly (blank lines, comments, trailing
/// tabs). Equality compares fields and sections only.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Study {
    pub root: Record,
    pub sections: Vec<Section>,
    #[serde(skip)]
    pub source_text: Option<String>,
}

impl PartialEq for Study {
    fn eq(&self, other: &Self) -> bool {
        self.root == other.root && self.sections == other.sections
    }
}

impl Eq for Study {}

impl Study {
    pub const ACCESSION_KEY: &'static str = "Comment[IDR Study Accession]";

    /// The study accession (e.g. `idr0001`), if present
    pub fn accession(&self) -> Option<&str> {
        self.root.first_value(Self::ACCESSION_KEY)
    }

    /// Drop the retained source text, e.g. after editing fields
    pub fn clear_source_text(&mut self) {
        self.source_text = None;
    }

    /// Sections of one kind, in order
    pub fn sections_of(&self, kind: SectionKind) -> impl Iterator<Item = &Section> {
        self.sections.iter().filter(move |s| s.kind == kind)
    }

    /// Open a new section of `kind`, numbered after the existing ones
    pub fn push_section(&mut self, kind: SectionKind) -> &mut Section {
        let index = self.sections_of(kind).count() + 1;
        self.sections.push(Section {
            kind,
            index,
            record: Record::new(),
        });
        let last = self.sections.len() - 1;
        &mut self.sections[last]
    }
}
