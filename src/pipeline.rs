use camino::Utf8PathBuf;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::annotations::Annotations;
use crate::config::ProviderPaths;
use crate::dedup::deduplicate;
use crate::demographics::DemographicNormalizer;
use crate::domain::{GENBANK_PROBLEM_COLUMNS, GISAID_ADDITIONAL_INFO_COLUMNS, Provider, Record};
use crate::error::IngestError;
use crate::fetch::{RecordFetcher, read_ndjson};
use crate::fs_util;
use crate::geography::{GeoParser, LocationGrammar};
use crate::hierarchy::{LocationHierarchy, fill_default_geo};
use crate::lookups::Lookups;
use crate::mapper::{FieldMapper, RawRecord, add_hardcoded_metadata};
use crate::output;
use crate::problems::ProblemFilter;
use crate::strain::StrainNormalizer;

#[derive(Debug, Clone, Default, Serialize)]
pub struct CurationStats {
    pub records_read: usize,
    pub short_sequences_dropped: usize,
    pub annotations_applied: usize,
    pub geo_levels_filled: usize,
    pub duplicates_dropped: usize,
    pub unnamed_records_dropped: usize,
    pub problem_records: usize,
    pub records_kept: usize,
}

/// Result of curating one provider's records in memory.
#[derive(Debug, Clone)]
pub struct Curated {
    pub metadata: Vec<Record>,
    /// Records routed away from the main table (GenBank only).
    pub problems: Vec<Record>,
    pub stats: CurationStats,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub provider: String,
    #[serde(flatten)]
    pub stats: CurationStats,
    pub metadata_path: String,
    pub sequences_path: String,
    pub side_table_path: String,
    pub hierarchy_path: Option<String>,
}

/// The per-provider normalization and reconciliation engine.
pub struct Curator {
    provider: Provider,
    lookups: Lookups,
    strain: StrainNormalizer,
    demographics: DemographicNormalizer,
    problems: ProblemFilter,
}

impl Curator {
    pub fn new(provider: Provider, lookups: Lookups) -> Result<Self, IngestError> {
        let demographics = DemographicNormalizer::new(&lookups)?;
        Ok(Self {
            provider,
            lookups,
            strain: StrainNormalizer::new()?,
            demographics,
            problems: ProblemFilter::new()?,
        })
    }

    pub fn provider(&self) -> Provider {
        self.provider
    }

    /// Row-local normalization: strain, geography and demographic text. Fails
    /// only when the location text fits no known layout.
    pub fn normalize(&self, record: &mut Record) -> Result<(), IngestError> {
        record.strain = self.strain.normalize(&record.strain, &record.title);

        let geo = GeoParser::new(LocationGrammar::for_provider(self.provider), &self.lookups);
        geo.apply(record, self.provider)?;

        record.authors = self.demographics.authors(&record.authors);
        record.originating_lab = self.demographics.lab(&record.originating_lab);
        record.submitting_lab = self.demographics.lab(&record.submitting_lab);
        record.age = self.demographics.age(&record.age);
        record.sex = self.demographics.sex(&record.sex);
        Ok(())
    }

    /// Runs every stage after fetching: mapping, normalization, hardcoded
    /// columns, annotation overlay, geographic defaults, de-duplication and,
    /// for GenBank, the problem-record split.
    pub fn curate(
        &self,
        raw: &[RawRecord],
        annotations: &Annotations,
        hierarchy: &LocationHierarchy,
    ) -> Result<Curated, IngestError> {
        let provider = self.provider;
        let mut stats = CurationStats {
            records_read: raw.len(),
            ..CurationStats::default()
        };

        let (mut records, short) = FieldMapper::new(provider).map_all(raw)?;
        stats.short_sequences_dropped = short;
        debug!(provider = %provider, kept = records.len(), dropped = short, "fields mapped");

        for record in records.iter_mut() {
            self.normalize(record)?;
            add_hardcoded_metadata(record, provider);
        }

        stats.annotations_applied = annotations.apply(&mut records, provider)?;
        stats.geo_levels_filled = fill_default_geo(&mut records, hierarchy);

        let (records, duplicates) = deduplicate(records, provider);
        stats.duplicates_dropped = duplicates;

        // GenBank routes unnamed records to the problem table; GISAID has no
        // such table, so they are dropped
        let (metadata, problems) = match provider {
            Provider::Genbank => self.problems.partition(records),
            Provider::Gisaid => {
                let (named, unnamed): (Vec<_>, Vec<_>) = records
                    .into_iter()
                    .partition(|record| !record.strain.is_empty());
                stats.unnamed_records_dropped = unnamed.len();
                if !unnamed.is_empty() {
                    warn!(
                        provider = %provider,
                        dropped = unnamed.len(),
                        "records without a strain name dropped"
                    );
                }
                (named, Vec::new())
            }
        };
        stats.problem_records = problems.len();
        stats.records_kept = metadata.len();

        info!(
            provider = %provider,
            read = stats.records_read,
            short = stats.short_sequences_dropped,
            annotations = stats.annotations_applied,
            duplicates = stats.duplicates_dropped,
            unnamed = stats.unnamed_records_dropped,
            problems = stats.problem_records,
            kept = stats.records_kept,
            "curation complete"
        );
        Ok(Curated {
            metadata,
            problems,
            stats,
        })
    }
}

/// One provider run from fetch to written outputs.
pub struct Pipeline<F: RecordFetcher> {
    fetcher: F,
    curator: Curator,
    paths: ProviderPaths,
    location_hierarchy: Utf8PathBuf,
    hierarchy_output: Option<Utf8PathBuf>,
}

impl<F: RecordFetcher> Pipeline<F> {
    pub fn new(
        fetcher: F,
        curator: Curator,
        paths: ProviderPaths,
        location_hierarchy: Utf8PathBuf,
    ) -> Self {
        Self {
            fetcher,
            curator,
            paths,
            location_hierarchy,
            hierarchy_output: None,
        }
    }

    /// Also write the hierarchy derived from the curated table to `path`.
    pub fn with_hierarchy_output(mut self, path: Utf8PathBuf) -> Self {
        self.hierarchy_output = Some(path);
        self
    }

    pub fn run(&self) -> Result<RunSummary, IngestError> {
        let provider = self.curator.provider();
        info!(provider = %provider, "reading input records");
        let raw = read_ndjson(self.fetcher.fetch()?)?;

        let annotations = Annotations::load(&self.paths.annotations, provider)?;
        let hierarchy = LocationHierarchy::load(&self.location_hierarchy)?;
        debug!(
            annotations = annotations.len(),
            places = hierarchy.places().len(),
            "reference data loaded"
        );

        let curated = self.curator.curate(&raw, &annotations, &hierarchy)?;
        self.write_outputs(&curated)?;

        Ok(RunSummary {
            provider: provider.to_string(),
            stats: curated.stats,
            metadata_path: self.paths.metadata.to_string(),
            sequences_path: self.paths.sequences.to_string(),
            side_table_path: self.paths.side_table.to_string(),
            hierarchy_path: self.hierarchy_output.as_ref().map(|path| path.to_string()),
        })
    }

    fn write_outputs(&self, curated: &Curated) -> Result<(), IngestError> {
        output::write_metadata_file(&curated.metadata, &self.paths.metadata)?;
        output::write_fasta_file(&curated.metadata, &self.paths.sequences)?;
        match self.curator.provider() {
            Provider::Gisaid => output::write_side_table_file(
                &curated.metadata,
                &GISAID_ADDITIONAL_INFO_COLUMNS,
                true,
                &self.paths.side_table,
            )?,
            Provider::Genbank => output::write_side_table_file(
                &curated.problems,
                &GENBANK_PROBLEM_COLUMNS,
                false,
                &self.paths.side_table,
            )?,
        }
        if let Some(path) = &self.hierarchy_output {
            let derived = LocationHierarchy::from_records(&curated.metadata);
            fs_util::write_atomic(path, |out| derived.write_tsv(out))?;
        }
        info!(
            metadata = %self.paths.metadata,
            sequences = %self.paths.sequences,
            side_table = %self.paths.side_table,
            "outputs written"
        );
        Ok(())
    }
}
