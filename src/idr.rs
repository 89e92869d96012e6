//! IDR tab-delimited metadata codec
//!
//! Text layout is one field per line, `Key<TAB>Value[<TAB>Value...]`. Lines
//! without a tab fall back to splitting on runs of two or more spaces.
//! Keys starting with `#` are template hints and are skipped.
//!
//! Parsed studies keep their source text, and [`IdrEncoder::encode`] writes
//! it back unchanged. Studies built any other way are rendered from their
//! fields.

use std::path::Path;
use std::sync::OnceLock;

use encoding_rs::Encoding;
use regex::Regex;
use tracing::debug;

use crate::classify::{classify, FieldKind};
use crate::error::{ConvertError, Result};
use crate::model::{FieldValue, Record, Study};

/// Options for decoding IDR text
#[derive(Debug, Clone, Default)]
pub struct DecodeOptions {
    /// WHATWG encoding label; UTF-8 when unset
    pub encoding: Option<String>,
}

/// Decode raw bytes to text with an optional encoding override
pub fn decode_bytes(bytes: &[u8], encoding: Option<&str>) -> Result<String> {
    let label = encoding.unwrap_or("utf-8");
    let encoding = Encoding::for_label(label.trim().as_bytes())
        .ok_or_else(|| ConvertError::UnknownEncoding(label.to_string()))?;

    let (text, had_errors) = encoding.decode_with_bom_removal(bytes);
    if had_errors {
        return Err(ConvertError::Encoding {
            encoding: encoding.name().to_string(),
            reason: "input contains byte sequences that are not valid in this encoding"
                .to_string(),
        });
    }
    Ok(text.into_owned())
}

fn multi_space() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s{2,}").unwrap())
}

/// Parser for IDR study text
#[derive(Debug, Clone, Default)]
pub struct IdrDecoder {
    options: DecodeOptions,
}

impl IdrDecoder {
    pub fn new(options: DecodeOptions) -> Self {
        Self { options }
    }

    pub fn with_encoding(encoding: impl Into<String>) -> Self {
        Self::new(DecodeOptions {
            encoding: Some(encoding.into()),
        })
    }

    pub fn decode_path(&self, path: &Path) -> Result<Study> {
        let bytes = std::fs::read(path)?;
        self.decode_bytes(&bytes)
    }

    pub fn decode_bytes(&self, bytes: &[u8]) -> Result<Study> {
        let text = decode_bytes(bytes, self.options.encoding.as_deref())?;
        Ok(self.decode_str(&text))
    }

    /// Parse already-decoded text. Never fails: unparseable lines become
    /// keys with no values.
    pub fn decode_str(&self, text: &str) -> Study {
        let text = text.strip_prefix('\u{feff}').unwrap_or(text);
        let mut study = Study {
            source_text: Some(text.to_string()),
            ..Study::default()
        };
        let mut in_section = false;

        for (line_no, line) in text.lines().enumerate() {
            let Some((key, values)) = split_line(line) else {
                continue;
            };
            if key.is_empty() {
                debug!(line = line_no + 1, values = values.len(), "Line has no key, dropping it");
                continue;
            }

            if let FieldKind::SectionMarker(kind) = classify(&key) {
                if values.iter().any(|v| !v.is_empty()) {
                    study.push_section(kind);
                    in_section = true;
                }
            }

            let record: &mut Record = if in_section {
                match study.sections.last_mut() {
                    Some(section) => &mut section.record,
                    None => &mut study.root,
                }
            } else {
                &mut study.root
            };

            if record
                .insert(key.clone(), FieldValue::from_values(values))
                .is_some()
            {
                debug!(key = %key, line = line_no + 1, "Duplicate key, keeping last value");
            }
        }

        study
    }
}

/// Split one line into key and cleaned values. `None` for lines to skip.
fn split_line(line: &str) -> Option<(String, Vec<String>)> {
    let stripped = line.trim();
    if stripped.is_empty() || stripped.starts_with('#') {
        return None;
    }

    let parts: Vec<&str> = if line.contains('\t') {
        line.split('\t').collect()
    } else {
        multi_space().split(stripped).collect()
    };

    let key = parts[0].trim().to_string();
    let mut values: Vec<String> = parts[1..].iter().map(|p| clean_value(p)).collect();
    while values.last().is_some_and(String::is_empty) {
        values.pop();
    }
    Some((key, values))
}

/// Trim a cell; template hints (`# ...`) become empty
fn clean_value(value: &str) -> String {
    let stripped = value.trim();
    if stripped.starts_with('#') {
        String::new()
    } else {
        stripped.to_string()
    }
}

/// Renderer for IDR study text
#[derive(Debug, Clone, Copy, Default)]
pub struct IdrEncoder;

impl IdrEncoder {
    /// The study's source text when it has one, else its rendered fields
    pub fn encode(&self, study: &Study) -> String {
        match &study.source_text {
            Some(text) => text.clone(),
            None => self.encode_fields(study),
        }
    }

    /// Render fields and sections as `key<TAB>values` lines
    ///
    /// Comments, blank lines and trailing empty cells of a parsed file are
    /// not part of the record model and do not come back.
    pub fn encode_fields(&self, study: &Study) -> String {
        let mut lines = Vec::new();
        push_record(&mut lines, &study.root);
        for section in &study.sections {
            push_record(&mut lines, &section.record);
        }

        if lines.is_empty() {
            return String::new();
        }
        let mut out = lines.join("\n");
        out.push('\n');
        out
    }
}

fn push_record(lines: &mut Vec<String>, record: &Record) {
    for field in record {
        let values = field.value.values();
        if values.is_empty() {
            lines.push(field.key.clone());
        } else {
            lines.push(format!("{}\t{}", field.key, values.join("\t")));
        }
    }
}
