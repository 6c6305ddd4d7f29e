use regex::Regex;

use crate::domain::Record;
use crate::error::IngestError;

/// Reference genome name with no provider-style structure.
pub const REFERENCE_STRAIN: &str = "Wuhan-Hu-1/2019";

const STRAIN_STRUCTURE: &str = r"^([^/]+/)?[^/]+/[^/]+/\d{4}$";

/// Detects GenBank records that cannot be safely placed.
#[derive(Debug, Clone)]
pub struct ProblemFilter {
    strain_structure: Regex,
}

impl ProblemFilter {
    pub fn new() -> Result<Self, IngestError> {
        let strain_structure = Regex::new(STRAIN_STRUCTURE)
            .map_err(|err| IngestError::InvalidPattern(err.to_string()))?;
        Ok(Self { strain_structure })
    }

    pub fn is_problem(&self, record: &Record) -> bool {
        if record.region.is_empty() || record.country.is_empty() {
            return true;
        }
        record.strain != REFERENCE_STRAIN && !self.strain_structure.is_match(&record.strain)
    }

    /// Splits `records` into `(clean, problems)`, keeping relative order.
    pub fn partition(&self, records: Vec<Record>) -> (Vec<Record>, Vec<Record>) {
        records
            .into_iter()
            .partition(|record| !self.is_problem(record))
    }
}
