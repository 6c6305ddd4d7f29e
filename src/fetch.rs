use std::io::{BufRead, BufReader, Read};

use camino::{Utf8Path, Utf8PathBuf};
use serde_json::Value;

use crate::error::IngestError;
use crate::fs_util;
use crate::mapper::RawRecord;

/// Source of one provider's raw records as an NDJSON stream.
pub trait RecordFetcher: Send + Sync {
    fn fetch(&self) -> Result<Box<dyn Read>, IngestError>;
}

/// Reads an NDJSON dump already on disk; `.gz` files are decompressed.
#[derive(Debug, Clone)]
pub struct FileFetcher {
    path: Utf8PathBuf,
}

impl FileFetcher {
    pub fn new(path: impl Into<Utf8PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Utf8Path {
        &self.path
    }
}

impl RecordFetcher for FileFetcher {
    fn fetch(&self) -> Result<Box<dyn Read>, IngestError> {
        fs_util::open_reader(&self.path)
            .map_err(|err| IngestError::InputRead(format!("{}: {err}", self.path)))
    }
}

/// Decodes one JSON object per line. Blank lines are skipped; anything that
/// is not a JSON object aborts with the offending line number.
pub fn read_ndjson<R: Read>(reader: R) -> Result<Vec<RawRecord>, IngestError> {
    let mut records = Vec::new();
    for (idx, line) in BufReader::new(reader).lines().enumerate() {
        let line_no = idx + 1;
        let line = line.map_err(|err| IngestError::InputRead(err.to_string()))?;
        if line.trim().is_empty() {
            continue;
        }
        let value: Value = serde_json::from_str(&line).map_err(|err| IngestError::InputParse {
            line: line_no,
            message: err.to_string(),
        })?;
        match value {
            Value::Object(map) => records.push(map),
            other => {
                return Err(IngestError::InputParse {
                    line: line_no,
                    message: format!("expected a JSON object, found {}", json_kind(&other)),
                });
            }
        }
    }
    Ok(records)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn reads_objects_and_skips_blank_lines() {
        let input = "{\"strain\": \"A/1/2020\"}\n\n{\"strain\": \"B/2/2020\"}\n";
        let records = read_ndjson(input.as_bytes()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1]["strain"], "B/2/2020");
    }

    #[test]
    fn reports_bad_line() {
        let input = "{\"strain\": \"A/1/2020\"}\n[1, 2]\n";
        let err = read_ndjson(input.as_bytes()).unwrap_err();
        assert_matches!(err, IngestError::InputParse { line: 2, .. });

        let err = read_ndjson("{not json".as_bytes()).unwrap_err();
        assert_matches!(err, IngestError::InputParse { line: 1, .. });
    }
}
