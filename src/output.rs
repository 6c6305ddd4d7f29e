use std::io::{self, Write};

use camino::Utf8Path;
use serde::Serialize;

use crate::domain::{Field, METADATA_COLUMNS, Record, SENTINEL};
use crate::error::IngestError;
use crate::fs_util;
use crate::pipeline::RunSummary;

/// Writes `records` as a tab-delimited table of `columns`, substituting
/// `missing` for empty values.
pub fn write_table(
    records: &[Record],
    columns: &[Field],
    missing: &str,
    out: &mut dyn Write,
) -> io::Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(b'\t')
        .from_writer(out);
    writer.write_record(columns.iter().map(Field::as_str))?;
    for record in records {
        writer.write_record(columns.iter().map(|field| {
            let value = record.get(*field);
            if value.is_empty() {
                missing.to_string()
            } else {
                value
            }
        }))?;
    }
    writer.flush()
}

/// Canonical metadata table; missing values are empty.
pub fn write_metadata(records: &[Record], out: &mut dyn Write) -> io::Result<()> {
    write_table(records, &METADATA_COLUMNS, "", out)
}

/// One `>strain` entry per record, in table order.
pub fn write_fasta(records: &[Record], out: &mut dyn Write) -> io::Result<()> {
    for record in records {
        writeln!(out, ">{}", record.strain)?;
        writeln!(out, "{}", record.sequence)?;
    }
    Ok(())
}

pub fn write_metadata_file(records: &[Record], path: &Utf8Path) -> Result<(), IngestError> {
    fs_util::write_atomic(path, |out| write_metadata(records, out))
}

pub fn write_fasta_file(records: &[Record], path: &Utf8Path) -> Result<(), IngestError> {
    fs_util::write_atomic(path, |out| write_fasta(records, out))
}

/// Auxiliary tables use the sentinel for missing values unless told
/// otherwise.
pub fn write_side_table_file(
    records: &[Record],
    columns: &[Field],
    missing_as_sentinel: bool,
    path: &Utf8Path,
) -> Result<(), IngestError> {
    let missing = if missing_as_sentinel { SENTINEL } else { "" };
    fs_util::write_atomic(path, |out| write_table(records, columns, missing, out))
}

pub struct JsonOutput;

impl JsonOutput {
    pub fn print_summary(summary: &RunSummary) -> io::Result<()> {
        Self::print_json(summary)
    }

    fn print_json<T: Serialize>(value: &T) -> io::Result<()> {
        let json = serde_json::to_string_pretty(value).map_err(io::Error::other)?;
        let mut stdout = io::stdout();
        stdout.write_all(json.as_bytes())?;
        stdout.write_all(b"\n")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::GISAID_ADDITIONAL_INFO_COLUMNS;

    fn sample() -> Record {
        Record {
            strain: "USA/CA-CDC-02982/2020".to_string(),
            gisaid_epi_isl: "EPI_ISL_1".to_string(),
            length: 29903,
            sequence: "ACGT".to_string(),
            ..Record::default()
        }
    }

    #[test]
    fn metadata_has_no_sequence_column() {
        let mut out = Vec::new();
        write_metadata(&[sample()], &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let header = text.lines().next().unwrap();
        assert!(header.starts_with("strain\tvirus\tgisaid_epi_isl\tgenbank_accession\tdate\t"));
        assert!(!header.split('\t').any(|column| column == "sequence"));
        assert!(!text.contains("ACGT"));
        assert!(text.lines().nth(1).unwrap().contains("\t29903\t"));
    }

    #[test]
    fn fasta_entries() {
        let mut out = Vec::new();
        write_fasta(&[sample()], &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), ">USA/CA-CDC-02982/2020\nACGT\n");
    }

    #[test]
    fn side_table_uses_sentinel() {
        let mut out = Vec::new();
        write_table(&[sample()], &GISAID_ADDITIONAL_INFO_COLUMNS, SENTINEL, &mut out).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "gisaid_epi_isl\tstrain\tadditional_host_info\tadditional_location_info\n\
             EPI_ISL_1\tUSA/CA-CDC-02982/2020\t?\t?\n"
        );
    }
}
