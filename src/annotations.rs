use std::collections::BTreeMap;
use std::io::Read;

use camino::Utf8Path;
use tracing::{debug, warn};

use crate::domain::{Field, MIN_SEQUENCE_LENGTH, Provider, Record};
use crate::error::IngestError;
use crate::fs_util;

/// A single manual correction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Override {
    pub field: Field,
    pub value: String,
}

/// Manual corrections grouped by match key, in file order.
#[derive(Debug, Clone, Default)]
pub struct Annotations {
    by_key: BTreeMap<String, Vec<Override>>,
}

/// Column positions of `(key, field, value)` in a provider's annotation file.
#[derive(Debug, Clone, Copy)]
struct Layout {
    key: usize,
    field: usize,
    value: usize,
}

impl Layout {
    fn for_provider(provider: Provider) -> Self {
        match provider {
            Provider::Genbank => Layout {
                key: 0,
                field: 1,
                value: 2,
            },
            // leading strain column is for human readers only
            Provider::Gisaid => Layout {
                key: 1,
                field: 2,
                value: 3,
            },
        }
    }
}

impl Annotations {
    /// Loads `path`, or returns an empty set when the file does not exist.
    pub fn load(path: &Utf8Path, provider: Provider) -> Result<Self, IngestError> {
        if !path.as_std_path().exists() {
            warn!(path = %path, "annotations file not found; no corrections applied");
            return Ok(Self::default());
        }
        let reader = fs_util::open_reader(path)
            .map_err(|_| IngestError::AnnotationRead(path.as_std_path().to_path_buf()))?;
        Self::from_reader(reader, provider)
    }

    pub fn from_reader<R: Read>(reader: R, provider: Provider) -> Result<Self, IngestError> {
        let layout = Layout::for_provider(provider);
        let mut csv_reader = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .has_headers(false)
            .flexible(true)
            .quoting(false)
            .comment(Some(b'#'))
            .from_reader(reader);

        let mut annotations = Self::default();
        for row in csv_reader.records() {
            let row = row.map_err(|err| IngestError::AnnotationParse {
                line: err.position().map(|pos| pos.line() as usize).unwrap_or(0),
                message: err.to_string(),
            })?;
            let line = row.position().map(|pos| pos.line() as usize).unwrap_or(0);
            if row.iter().all(|cell| cell.trim().is_empty()) {
                continue;
            }
            if row.len() <= layout.value {
                return Err(IngestError::AnnotationParse {
                    line,
                    message: format!(
                        "expected at least {} tab-separated columns, found {}",
                        layout.value + 1,
                        row.len()
                    ),
                });
            }
            let key = row[layout.key].trim();
            if key.is_empty() {
                return Err(IngestError::AnnotationParse {
                    line,
                    message: "empty match key".to_string(),
                });
            }
            let field = row[layout.field]
                .parse::<Field>()
                .map_err(|err| IngestError::AnnotationParse {
                    line,
                    message: err.to_string(),
                })?;
            let value = strip_inline_comment(&row[layout.value]);
            if field == Field::Length {
                match value.parse::<u64>() {
                    Ok(length) if length >= MIN_SEQUENCE_LENGTH => {}
                    Ok(length) => {
                        return Err(IngestError::AnnotationParse {
                            line,
                            message: format!(
                                "length {length} is below the minimum of {MIN_SEQUENCE_LENGTH}"
                            ),
                        });
                    }
                    Err(_) => {
                        return Err(IngestError::AnnotationParse {
                            line,
                            message: format!("length must be a whole number, got {value:?}"),
                        });
                    }
                }
            }
            annotations.insert(key, field, value);
        }
        Ok(annotations)
    }

    pub fn insert(&mut self, key: &str, field: Field, value: &str) {
        self.by_key.entry(key.to_string()).or_default().push(Override {
            field,
            value: value.to_string(),
        });
    }

    pub fn len(&self) -> usize {
        self.by_key.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.by_key.is_empty()
    }

    pub fn overrides_for(&self, key: &str) -> &[Override] {
        self.by_key.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Joins records to corrections on the provider accession and overwrites
    /// every matching record. Later rows for the same field win. Returns the
    /// number of field updates made.
    pub fn apply(&self, records: &mut [Record], provider: Provider) -> Result<usize, IngestError> {
        let mut applied = 0usize;
        let mut matched_keys = 0usize;
        for record in records.iter_mut() {
            let overrides = self.overrides_for(record.accession(provider));
            if overrides.is_empty() {
                continue;
            }
            matched_keys += 1;
            for item in overrides {
                record.set(item.field, &item.value)?;
                applied += 1;
            }
        }
        debug!(
            provider = %provider,
            keys = self.by_key.len(),
            matched_records = matched_keys,
            applied,
            "annotations applied"
        );
        Ok(applied)
    }
}

/// Drops an inline `#` comment and surrounding whitespace.
fn strip_inline_comment(value: &str) -> &str {
    match value.split_once('#') {
        Some((head, _)) => head.trim(),
        None => value.trim(),
    }
}
