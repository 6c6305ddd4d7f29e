use std::collections::{BTreeSet, HashMap};
use std::io::{Read, Write};

use camino::Utf8Path;
use tracing::{debug, warn};

use crate::domain::Record;
use crate::error::IngestError;
use crate::fs_util;

const LEVELS: usize = 4;
const HEADER: [&str; LEVELS] = ["region", "country", "division", "location"];

/// One accepted `(region, country, division, location)` combination. Blank
/// levels are empty strings.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Place {
    pub levels: [String; LEVELS],
}

impl Place {
    pub fn new(region: &str, country: &str, division: &str, location: &str) -> Self {
        Self {
            levels: [
                region.trim().to_string(),
                country.trim().to_string(),
                division.trim().to_string(),
                location.trim().to_string(),
            ],
        }
    }

    fn of_record(record: &Record) -> Self {
        Self::new(
            &record.region,
            &record.country,
            &record.division,
            &record.location,
        )
    }

    fn is_blank(&self) -> bool {
        self.levels.iter().all(String::is_empty)
    }
}

/// Previously accepted geography, maintained by curators between runs.
#[derive(Debug, Clone, Default)]
pub struct LocationHierarchy {
    places: Vec<Place>,
    by_country: HashMap<String, Vec<usize>>,
}

impl LocationHierarchy {
    pub fn new(places: Vec<Place>) -> Self {
        let mut by_country = HashMap::<String, Vec<usize>>::new();
        for (idx, place) in places.iter().enumerate() {
            if !place.levels[1].is_empty() {
                by_country
                    .entry(place.levels[1].to_lowercase())
                    .or_default()
                    .push(idx);
            }
        }
        Self { places, by_country }
    }

    /// Loads `path`, or returns an empty table when the file does not exist.
    pub fn load(path: &Utf8Path) -> Result<Self, IngestError> {
        if !path.as_std_path().exists() {
            warn!(path = %path, "location hierarchy not found; geographic defaults limited");
            return Ok(Self::default());
        }
        let reader = fs_util::open_reader(path)
            .map_err(|_| IngestError::HierarchyRead(path.as_std_path().to_path_buf()))?;
        Self::from_reader(reader)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, IngestError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .has_headers(false)
            .flexible(true)
            .quoting(false)
            .comment(Some(b'#'))
            .from_reader(reader);

        let mut places = Vec::new();
        for (idx, row) in csv_reader.records().enumerate() {
            let row = row.map_err(|err| IngestError::HierarchyParse {
                line: idx + 1,
                message: err.to_string(),
            })?;
            if row.len() > LEVELS {
                return Err(IngestError::HierarchyParse {
                    line: row.position().map(|pos| pos.line() as usize).unwrap_or(idx + 1),
                    message: format!("expected at most {LEVELS} columns, found {}", row.len()),
                });
            }
            let cell = |i: usize| row.get(i).unwrap_or("");
            if idx == 0 && cell(0).trim().eq_ignore_ascii_case(HEADER[0]) {
                continue;
            }
            let place = Place::new(cell(0), cell(1), cell(2), cell(3));
            if !place.is_blank() {
                places.push(place);
            }
        }
        debug!(places = places.len(), "location hierarchy loaded");
        Ok(Self::new(places))
    }

    /// Sorted, de-duplicated places seen in `records`, including the
    /// combinations formed by the exposure columns.
    pub fn from_records(records: &[Record]) -> Self {
        let mut places = BTreeSet::new();
        for record in records {
            let place = Place::of_record(record);
            if !place.is_blank() {
                places.insert(place);
            }
            let exposure = Place::new(
                &record.region_exposure,
                &record.country_exposure,
                &record.division_exposure,
                "",
            );
            if !exposure.is_blank() {
                places.insert(exposure);
            }
        }
        Self::new(places.into_iter().collect())
    }

    /// Reads the geographic columns of a metadata table and derives its
    /// hierarchy.
    pub fn from_metadata<R: Read>(reader: R) -> Result<Self, IngestError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);
        let headers = csv_reader
            .headers()
            .map_err(|err| IngestError::InputRead(err.to_string()))?
            .clone();
        let column = |name: &str| headers.iter().position(|header| header == name);
        let columns = [
            "region",
            "country",
            "division",
            "location",
            "region_exposure",
            "country_exposure",
            "division_exposure",
        ]
        .map(column);

        let mut records = Vec::new();
        for row in csv_reader.records() {
            let row = row.map_err(|err| IngestError::InputParse {
                line: err.position().map(|pos| pos.line() as usize).unwrap_or(0),
                message: err.to_string(),
            })?;
            let cell = |i: usize| {
                columns[i]
                    .and_then(|col| row.get(col))
                    .unwrap_or("")
                    .to_string()
            };
            records.push(Record {
                region: cell(0),
                country: cell(1),
                division: cell(2),
                location: cell(3),
                region_exposure: cell(4),
                country_exposure: cell(5),
                division_exposure: cell(6),
                ..Record::default()
            });
        }
        Ok(Self::from_records(&records))
    }

    pub fn places(&self) -> &[Place] {
        &self.places
    }

    pub fn write_tsv(&self, out: &mut dyn Write) -> std::io::Result<()> {
        let mut writer = csv::WriterBuilder::new()
            .delimiter(b'\t')
            .quote_style(csv::QuoteStyle::Never)
            .from_writer(out);
        writer.write_record(HEADER)?;
        for place in &self.places {
            writer.write_record(&place.levels)?;
        }
        writer.flush()
    }

    /// Fills blank levels of `record` from previously accepted places.
    ///
    /// Levels are filled top-down. For each blank level the places agreeing
    /// with every known level are collected. While none agree, the most
    /// specific known level below the target is dropped; known levels above
    /// it are never dropped. The level is filled only when those places name
    /// exactly one value for it. Returns the number of levels filled.
    pub fn fill(&self, record: &mut Record) -> usize {
        let mut levels = Place::of_record(record).levels;
        if levels.iter().all(String::is_empty) {
            return 0;
        }
        let mut filled = 0;
        for target in 0..LEVELS {
            if !levels[target].is_empty() {
                continue;
            }
            if let Some(value) = self.unambiguous_value(&levels, target) {
                levels[target] = value;
                filled += 1;
            }
        }
        if filled > 0 {
            let [region, country, division, location] = levels;
            record.region = region;
            record.country = country;
            record.division = division;
            record.location = location;
        }
        filled
    }

    fn unambiguous_value(&self, known: &[String; LEVELS], target: usize) -> Option<String> {
        let mut anchors = (0..LEVELS)
            .filter(|&level| level != target && !known[level].is_empty())
            .collect::<Vec<_>>();
        while !anchors.is_empty() {
            let matching = self
                .candidates(known, &anchors)
                .filter(|place| {
                    anchors
                        .iter()
                        .all(|&level| place.levels[level].eq_ignore_ascii_case(&known[level]))
                })
                .collect::<Vec<_>>();
            if !matching.is_empty() {
                let values = matching
                    .iter()
                    .map(|place| place.levels[target].as_str())
                    .filter(|value| !value.is_empty())
                    .collect::<BTreeSet<_>>();
                return match values.len() {
                    1 => values.into_iter().next().map(str::to_string),
                    _ => None,
                };
            }
            // levels above the target are never relaxed
            if anchors.last().is_some_and(|&deepest| deepest < target) {
                return None;
            }
            anchors.pop();
        }
        None
    }

    fn candidates<'a>(
        &'a self,
        known: &[String; LEVELS],
        anchors: &[usize],
    ) -> Box<dyn Iterator<Item = &'a Place> + 'a> {
        if anchors.contains(&1) {
            let indices = self
                .by_country
                .get(&known[1].to_lowercase())
                .map(Vec::as_slice)
                .unwrap_or(&[]);
            Box::new(indices.iter().map(move |&idx| &self.places[idx]))
        } else {
            Box::new(self.places.iter())
        }
    }
}

/// Backfills geography after parsing and annotation.
///
/// Only blank fields are touched, so values set by annotations are never
/// replaced. After hierarchy lookups a blank division takes the country, and
/// blank exposure columns take their home-level counterpart.
pub fn fill_default_geo(records: &mut [Record], hierarchy: &LocationHierarchy) -> usize {
    let mut filled = 0;
    for record in records.iter_mut() {
        filled += hierarchy.fill(record);
        if record.division.is_empty() {
            record.division = record.country.clone();
        }
        if record.region_exposure.is_empty() {
            record.region_exposure = record.region.clone();
        }
        if record.country_exposure.is_empty() {
            record.country_exposure = record.country.clone();
        }
        if record.division_exposure.is_empty() {
            record.division_exposure = record.division.clone();
        }
    }
    filled
}

#[cfg(test)]
mod tests {
    use super::*;

    const TABLE: &str = "\
region\tcountry\tdivision\tlocation
North America\tUSA\tWashington\tKing County
North America\tUSA\tWashington\tSnohomish County
North America\tUSA\tCalifornia\tSan Diego
Europe\tLuxembourg\tLuxembourg
Asia\tChina\tHubei\tWuhan
Asia\tChina\tGuangdong
";

    fn hierarchy() -> LocationHierarchy {
        LocationHierarchy::from_reader(TABLE.as_bytes()).unwrap()
    }

    fn record(region: &str, country: &str, division: &str, location: &str) -> Record {
        Record {
            region: region.to_string(),
            country: country.to_string(),
            division: division.to_string(),
            location: location.to_string(),
            ..Record::default()
        }
    }

    #[test]
    fn skips_header_row() {
        assert_eq!(hierarchy().places().len(), 6);
    }

    #[test]
    fn fills_region_and_unambiguous_division() {
        let table = hierarchy();
        let mut lux = record("", "Luxembourg", "", "");
        assert_eq!(table.fill(&mut lux), 2);
        assert_eq!(lux.region, "Europe");
        assert_eq!(lux.division, "Luxembourg");

        let mut usa = record("", "USA", "", "");
        assert_eq!(table.fill(&mut usa), 1);
        assert_eq!(usa.region, "North America");
        assert_eq!(usa.division, "");
    }

    #[test]
    fn unknown_location_still_yields_region() {
        let table = hierarchy();
        let mut rec = record("", "USA", "Washington", "Yakima County");
        table.fill(&mut rec);
        assert_eq!(rec.region, "North America");
        assert_eq!(rec.location, "Yakima County");
    }

    #[test]
    fn known_location_identifies_division() {
        let table = hierarchy();
        let mut rec = record("", "China", "", "Wuhan");
        table.fill(&mut rec);
        assert_eq!(rec.region, "Asia");
        assert_eq!(rec.division, "Hubei");
    }

    #[test]
    fn unknown_country_gets_no_foreign_geography() {
        let table = hierarchy();
        let mut france = record("Europe", "France", "", "");
        assert_eq!(table.fill(&mut france), 0);
        assert_eq!(france.division, "");
        assert_eq!(france.location, "");

        let mut canada = record("North America", "Canada", "", "");
        assert_eq!(table.fill(&mut canada), 0);
        assert_eq!(canada.division, "");
        assert_eq!(canada.location, "");
    }

    #[test]
    fn unknown_division_gets_no_location() {
        let table = hierarchy();
        let mut oregon = record("North America", "USA", "Oregon", "");
        assert_eq!(table.fill(&mut oregon), 0);
        assert_eq!(oregon.location, "");

        let mut zhejiang = record("", "China", "Zhejiang", "");
        assert_eq!(table.fill(&mut zhejiang), 1);
        assert_eq!(zhejiang.region, "Asia");
        assert_eq!(zhejiang.location, "");
    }

    #[test]
    fn defaults_never_replace_existing_values() {
        let table = hierarchy();
        let mut records = vec![record("Oceania", "Luxembourg", "", "")];
        records[0].division_exposure = "Hubei".to_string();
        fill_default_geo(&mut records, &table);
        assert_eq!(records[0].region, "Oceania");
        assert_eq!(records[0].division, "Luxembourg");
        assert_eq!(records[0].region_exposure, "Oceania");
        assert_eq!(records[0].division_exposure, "Hubei");
    }

    #[test]
    fn division_falls_back_to_country() {
        let table = LocationHierarchy::default();
        let mut records = vec![record("", "Peru", "", "")];
        fill_default_geo(&mut records, &table);
        assert_eq!(records[0].division, "Peru");
        assert_eq!(records[0].country_exposure, "Peru");
    }

    #[test]
    fn derives_hierarchy_from_records() {
        let mut first = record("Asia", "China", "Hubei", "Wuhan");
        first.region_exposure = "Asia".to_string();
        first.country_exposure = "China".to_string();
        first.division_exposure = "Hubei".to_string();
        let second = record("Asia", "China", "Hubei", "Wuhan");
        let derived = LocationHierarchy::from_records(&[second, first]);
        assert_eq!(
            derived.places(),
            &[
                Place::new("Asia", "China", "Hubei", ""),
                Place::new("Asia", "China", "Hubei", "Wuhan"),
            ]
        );
    }
}
