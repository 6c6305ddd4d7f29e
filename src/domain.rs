use std::fmt;
use std::str::FromStr;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::IngestError;

/// Marker for a scalar value that is legitimately unknown.
pub const SENTINEL: &str = "?";

/// Sequences shorter than this are not trusted as genome assemblies.
pub const MIN_SEQUENCE_LENGTH: u64 = 15_000;

pub const VIRUS: &str = "ncov";
pub const SEGMENT: &str = "genome";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Gisaid,
    Genbank,
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Gisaid => "gisaid",
            Provider::Genbank => "genbank",
        }
    }

    /// Column holding this provider's own record identifier.
    pub fn accession_field(&self) -> Field {
        match self {
            Provider::Gisaid => Field::GisaidEpiIsl,
            Provider::Genbank => Field::GenbankAccession,
        }
    }

    pub fn side_table_name(&self) -> &'static str {
        match self {
            Provider::Gisaid => "additional_info.tsv",
            Provider::Genbank => "problem_data.tsv",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Provider {
    type Err = IngestError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "gisaid" => Ok(Provider::Gisaid),
            "genbank" => Ok(Provider::Genbank),
            _ => Err(IngestError::InvalidProvider(value.to_string())),
        }
    }
}

/// Canonical metadata columns. `sequence` is deliberately absent: it only
/// ever reaches the FASTA output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Field {
    Strain,
    Virus,
    GisaidEpiIsl,
    GenbankAccession,
    Date,
    Region,
    Country,
    Division,
    Location,
    RegionExposure,
    CountryExposure,
    DivisionExposure,
    Segment,
    Length,
    Host,
    Age,
    Sex,
    PangolinLineage,
    GisaidClade,
    OriginatingLab,
    SubmittingLab,
    Authors,
    Url,
    Title,
    PaperUrl,
    DateSubmitted,
    AdditionalHostInfo,
    AdditionalLocationInfo,
}

pub const METADATA_COLUMNS: [Field; 26] = [
    Field::Strain,
    Field::Virus,
    Field::GisaidEpiIsl,
    Field::GenbankAccession,
    Field::Date,
    Field::Region,
    Field::Country,
    Field::Division,
    Field::Location,
    Field::RegionExposure,
    Field::CountryExposure,
    Field::DivisionExposure,
    Field::Segment,
    Field::Length,
    Field::Host,
    Field::Age,
    Field::Sex,
    Field::PangolinLineage,
    Field::GisaidClade,
    Field::OriginatingLab,
    Field::SubmittingLab,
    Field::Authors,
    Field::Url,
    Field::Title,
    Field::PaperUrl,
    Field::DateSubmitted,
];

pub const GISAID_ADDITIONAL_INFO_COLUMNS: [Field; 4] = [
    Field::GisaidEpiIsl,
    Field::Strain,
    Field::AdditionalHostInfo,
    Field::AdditionalLocationInfo,
];

pub const GENBANK_PROBLEM_COLUMNS: [Field; 5] = [
    Field::GenbankAccession,
    Field::Strain,
    Field::Region,
    Field::Country,
    Field::Url,
];

impl Field {
    pub fn as_str(&self) -> &'static str {
        match self {
            Field::Strain => "strain",
            Field::Virus => "virus",
            Field::GisaidEpiIsl => "gisaid_epi_isl",
            Field::GenbankAccession => "genbank_accession",
            Field::Date => "date",
            Field::Region => "region",
            Field::Country => "country",
            Field::Division => "division",
            Field::Location => "location",
            Field::RegionExposure => "region_exposure",
            Field::CountryExposure => "country_exposure",
            Field::DivisionExposure => "division_exposure",
            Field::Segment => "segment",
            Field::Length => "length",
            Field::Host => "host",
            Field::Age => "age",
            Field::Sex => "sex",
            Field::PangolinLineage => "pangolin_lineage",
            Field::GisaidClade => "GISAID_clade",
            Field::OriginatingLab => "originating_lab",
            Field::SubmittingLab => "submitting_lab",
            Field::Authors => "authors",
            Field::Url => "url",
            Field::Title => "title",
            Field::PaperUrl => "paper_url",
            Field::DateSubmitted => "date_submitted",
            Field::AdditionalHostInfo => "additional_host_info",
            Field::AdditionalLocationInfo => "additional_location_info",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Field {
    type Err = IngestError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        METADATA_COLUMNS
            .iter()
            .chain([Field::AdditionalHostInfo, Field::AdditionalLocationInfo].iter())
            .find(|field| field.as_str().eq_ignore_ascii_case(trimmed))
            .copied()
            .ok_or_else(|| IngestError::UnknownField(value.to_string()))
    }
}

/// One row of canonical metadata.
///
/// Text fields use the empty string for "missing". `sequence` is transient and
/// is only written to FASTA.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Record {
    pub strain: String,
    pub virus: String,
    pub gisaid_epi_isl: String,
    pub genbank_accession: String,
    pub date: String,
    pub region: String,
    pub country: String,
    pub division: String,
    pub location: String,
    pub region_exposure: String,
    pub country_exposure: String,
    pub division_exposure: String,
    pub segment: String,
    pub length: u64,
    pub host: String,
    pub age: String,
    pub sex: String,
    pub pangolin_lineage: String,
    pub gisaid_clade: String,
    pub originating_lab: String,
    pub submitting_lab: String,
    pub authors: String,
    pub url: String,
    pub title: String,
    pub paper_url: String,
    pub date_submitted: String,
    pub additional_host_info: String,
    pub additional_location_info: String,
    pub sequence: String,
}

impl Record {
    /// Text value of `field`; `length` is rendered in decimal.
    pub fn get(&self, field: Field) -> String {
        match field {
            Field::Length => self.length.to_string(),
            other => self.text(other).map(str::to_string).unwrap_or_default(),
        }
    }

    pub fn set(&mut self, field: Field, value: &str) -> Result<(), IngestError> {
        if field == Field::Length {
            self.length = value
                .trim()
                .parse()
                .map_err(|_| IngestError::InvalidFieldValue {
                    field: field.to_string(),
                    value: value.to_string(),
                })?;
            return Ok(());
        }
        if let Some(slot) = self.text_mut(field) {
            *slot = value.to_string();
        }
        Ok(())
    }

    pub fn accession(&self, provider: Provider) -> &str {
        match provider {
            Provider::Gisaid => &self.gisaid_epi_isl,
            Provider::Genbank => &self.genbank_accession,
        }
    }

    /// Identifier used in diagnostics: the accession, then the strain.
    pub fn describe(&self, provider: Provider) -> String {
        let accession = self.accession(provider);
        match (accession.is_empty(), self.strain.is_empty()) {
            (false, false) => format!("{accession} ({})", self.strain),
            (false, true) => accession.to_string(),
            (true, false) => self.strain.clone(),
            (true, true) => "<unidentified>".to_string(),
        }
    }

    fn text(&self, field: Field) -> Option<&str> {
        let value = match field {
            Field::Strain => &self.strain,
            Field::Virus => &self.virus,
            Field::GisaidEpiIsl => &self.gisaid_epi_isl,
            Field::GenbankAccession => &self.genbank_accession,
            Field::Date => &self.date,
            Field::Region => &self.region,
            Field::Country => &self.country,
            Field::Division => &self.division,
            Field::Location => &self.location,
            Field::RegionExposure => &self.region_exposure,
            Field::CountryExposure => &self.country_exposure,
            Field::DivisionExposure => &self.division_exposure,
            Field::Segment => &self.segment,
            Field::Length => return None,
            Field::Host => &self.host,
            Field::Age => &self.age,
            Field::Sex => &self.sex,
            Field::PangolinLineage => &self.pangolin_lineage,
            Field::GisaidClade => &self.gisaid_clade,
            Field::OriginatingLab => &self.originating_lab,
            Field::SubmittingLab => &self.submitting_lab,
            Field::Authors => &self.authors,
            Field::Url => &self.url,
            Field::Title => &self.title,
            Field::PaperUrl => &self.paper_url,
            Field::DateSubmitted => &self.date_submitted,
            Field::AdditionalHostInfo => &self.additional_host_info,
            Field::AdditionalLocationInfo => &self.additional_location_info,
        };
        Some(value)
    }

    fn text_mut(&mut self, field: Field) -> Option<&mut String> {
        let value = match field {
            Field::Strain => &mut self.strain,
            Field::Virus => &mut self.virus,
            Field::GisaidEpiIsl => &mut self.gisaid_epi_isl,
            Field::GenbankAccession => &mut self.genbank_accession,
            Field::Date => &mut self.date,
            Field::Region => &mut self.region,
            Field::Country => &mut self.country,
            Field::Division => &mut self.division,
            Field::Location => &mut self.location,
            Field::RegionExposure => &mut self.region_exposure,
            Field::CountryExposure => &mut self.country_exposure,
            Field::DivisionExposure => &mut self.division_exposure,
            Field::Segment => &mut self.segment,
            Field::Length => return None,
            Field::Host => &mut self.host,
            Field::Age => &mut self.age,
            Field::Sex => &mut self.sex,
            Field::PangolinLineage => &mut self.pangolin_lineage,
            Field::GisaidClade => &mut self.gisaid_clade,
            Field::OriginatingLab => &mut self.originating_lab,
            Field::SubmittingLab => &mut self.submitting_lab,
            Field::Authors => &mut self.authors,
            Field::Url => &mut self.url,
            Field::Title => &mut self.title,
            Field::PaperUrl => &mut self.paper_url,
            Field::DateSubmitted => &mut self.date_submitted,
            Field::AdditionalHostInfo => &mut self.additional_host_info,
            Field::AdditionalLocationInfo => &mut self.additional_location_info,
        };
        Some(value)
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn parse_provider() {
        assert_eq!("GenBank".parse::<Provider>().unwrap(), Provider::Genbank);
        assert_eq!(" gisaid ".parse::<Provider>().unwrap(), Provider::Gisaid);
        let err = "ena".parse::<Provider>().unwrap_err();
        assert_matches!(err, IngestError::InvalidProvider(_));
    }

    #[test]
    fn parse_field_names() {
        assert_eq!("GISAID_clade".parse::<Field>().unwrap(), Field::GisaidClade);
        assert_eq!("Division".parse::<Field>().unwrap(), Field::Division);
        assert_eq!(
            "additional_location_info".parse::<Field>().unwrap(),
            Field::AdditionalLocationInfo
        );
        let err = "sequence".parse::<Field>().unwrap_err();
        assert_matches!(err, IngestError::UnknownField(_));
    }

    #[test]
    fn metadata_columns_exclude_sequence() {
        assert!(METADATA_COLUMNS.iter().all(|f| f.as_str() != "sequence"));
    }

    #[test]
    fn set_and_get_by_field() {
        let mut record = Record::default();
        record.set(Field::Division, "Washington").unwrap();
        record.set(Field::Length, "29903").unwrap();
        assert_eq!(record.get(Field::Division), "Washington");
        assert_eq!(record.length, 29903);

        let err = record.set(Field::Length, "long").unwrap_err();
        assert_matches!(err, IngestError::InvalidFieldValue { .. });
        assert_eq!(record.length, 29903);
    }
}
