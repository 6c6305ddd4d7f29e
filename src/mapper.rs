use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde_json::{Map, Value};
use unicode_normalization::UnicodeNormalization;

use crate::domain::{Field, MIN_SEQUENCE_LENGTH, Provider, Record, SEGMENT, SENTINEL, VIRUS};
use crate::error::IngestError;

/// Raw provider record as decoded from one NDJSON line.
pub type RawRecord = Map<String, Value>;

/// Provider field names (first present wins) and the canonical column each
/// one feeds.
const GISAID_FIELDS: &[(&[&str], Field)] = &[
    (&["covv_virus_name"], Field::Strain),
    (&["covv_accession_id"], Field::GisaidEpiIsl),
    (&["covv_collection_date"], Field::Date),
    (&["covv_subm_date"], Field::DateSubmitted),
    (&["covv_location"], Field::Location),
    (&["covv_host"], Field::Host),
    (&["covv_orig_lab"], Field::OriginatingLab),
    (&["covv_subm_lab"], Field::SubmittingLab),
    (&["covv_authors"], Field::Authors),
    (&["covv_patient_age"], Field::Age),
    (&["covv_gender"], Field::Sex),
    (&["covv_lineage"], Field::PangolinLineage),
    (&["covv_clade"], Field::GisaidClade),
    (&["covv_add_host_info"], Field::AdditionalHostInfo),
    (&["covv_add_location"], Field::AdditionalLocationInfo),
];

const GENBANK_FIELDS: &[(&[&str], Field)] = &[
    (&["genbank_accession", "accession"], Field::GenbankAccession),
    (&["strain"], Field::Strain),
    (&["collected"], Field::Date),
    (&["submitted"], Field::DateSubmitted),
    (&["location"], Field::Location),
    (&["host"], Field::Host),
    (&["authors"], Field::Authors),
    (&["title"], Field::Title),
    (&["paper_url"], Field::PaperUrl),
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%d-%b-%Y"];

/// Renames provider fields to canonical columns and drops short sequences.
#[derive(Debug, Clone, Copy)]
pub struct FieldMapper {
    provider: Provider,
}

impl FieldMapper {
    pub fn new(provider: Provider) -> Self {
        Self { provider }
    }

    fn fields(&self) -> &'static [(&'static [&'static str], Field)] {
        match self.provider {
            Provider::Gisaid => GISAID_FIELDS,
            Provider::Genbank => GENBANK_FIELDS,
        }
    }

    /// Maps one raw record. The raw location text is left in
    /// `Record::location` for the geographic parser.
    pub fn map(&self, raw: &RawRecord) -> Result<Record, IngestError> {
        let mut record = Record::default();
        for (names, field) in self.fields() {
            let value = names
                .iter()
                .find_map(|name| raw.get(*name).and_then(value_text))
                .unwrap_or_default();
            let value = match field {
                Field::Date | Field::DateSubmitted => normalize_date(&value),
                _ => value,
            };
            record.set(*field, &value)?;
        }

        record.sequence = raw
            .get("sequence")
            .and_then(value_text)
            .map(|seq| seq.split_whitespace().collect::<String>())
            .unwrap_or_default();
        record.length = raw
            .get("length")
            .and_then(value_length)
            .unwrap_or(record.sequence.len() as u64);
        Ok(record)
    }

    /// Maps every raw record, silently dropping those whose sequence is
    /// shorter than [`MIN_SEQUENCE_LENGTH`]. Returns the kept records and the
    /// number dropped.
    pub fn map_all(&self, raw: &[RawRecord]) -> Result<(Vec<Record>, usize), IngestError> {
        let mapped = raw
            .iter()
            .map(|item| self.map(item))
            .collect::<Result<Vec<_>, IngestError>>()?;
        let before = mapped.len();
        let kept = mapped
            .into_iter()
            .filter(|record| record.length >= MIN_SEQUENCE_LENGTH)
            .collect::<Vec<_>>();
        let dropped = before - kept.len();
        Ok((kept, dropped))
    }
}

/// Fills the columns every record of a provider carries regardless of input.
pub fn add_hardcoded_metadata(record: &mut Record, provider: Provider) {
    record.virus = VIRUS.to_string();
    record.segment = SEGMENT.to_string();
    match provider {
        Provider::Gisaid => {
            record.genbank_accession = SENTINEL.to_string();
            record.url = "https://www.gisaid.org".to_string();
        }
        Provider::Genbank => {
            record.gisaid_epi_isl = SENTINEL.to_string();
            record.url = format!(
                "https://www.ncbi.nlm.nih.gov/nuccore/{}",
                record.genbank_accession
            );
        }
    }
}

/// NFC-normalized, trimmed text of a JSON scalar. Null becomes `None`.
fn value_text(value: &Value) -> Option<String> {
    let text = match value {
        Value::Null => return None,
        Value::String(text) => text.clone(),
        Value::Number(number) => number.to_string(),
        Value::Bool(flag) => flag.to_string(),
        other => other.to_string(),
    };
    Some(text.nfc().collect::<String>().trim().to_string())
}

fn value_length(value: &Value) -> Option<u64> {
    match value {
        Value::Number(number) => number
            .as_u64()
            .or_else(|| number.as_f64().filter(|n| *n >= 0.0).map(|n| n as u64)),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

/// Full dates become `YYYY-MM-DD`; partial or malformed dates are kept as
/// trimmed text.
pub fn normalize_date(raw: &str) -> String {
    let raw = raw.trim();
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(raw, format) {
            return date.format("%Y-%m-%d").to_string();
        }
    }
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(raw) {
        return timestamp.date_naive().format("%Y-%m-%d").to_string();
    }
    if let Ok(timestamp) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S") {
        return timestamp.date().format("%Y-%m-%d").to_string();
    }
    raw.to_string()
}
