use std::fs;

use camino::Utf8PathBuf;

use ncov_ingest::domain::Record;
use ncov_ingest::fs_util;
use ncov_ingest::hierarchy::{LocationHierarchy, Place, fill_default_geo};

const METADATA: &str = "strain\tregion\tcountry\tdivision\tlocation\tregion_exposure\tcountry_exposure\tdivision_exposure
A/1/2020\tEurope\tItaly\tLombardy\tMilan\tEurope\tItaly\tLombardy
A/2/2020\tEurope\tItaly\tLombardy\tMilan\tAsia\tChina\tHubei
A/3/2020\tEurope\tItaly\tLombardy\tMilan\tEurope\tItaly\tLombardy
";

#[test]
fn derives_sorted_unique_places_from_metadata() {
    let hierarchy = LocationHierarchy::from_metadata(METADATA.as_bytes()).unwrap();
    assert_eq!(
        hierarchy.places(),
        &[
            Place::new("Asia", "China", "Hubei", ""),
            Place::new("Europe", "Italy", "Lombardy", ""),
            Place::new("Europe", "Italy", "Lombardy", "Milan"),
        ]
    );
}

#[test]
fn derived_hierarchy_round_trips_through_disk() {
    let dir = tempfile::tempdir().unwrap();
    let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
    let path = root.join("location_hierarchy.tsv");

    let derived = LocationHierarchy::from_metadata(METADATA.as_bytes()).unwrap();
    fs_util::write_atomic(&path, |out| derived.write_tsv(out)).unwrap();
    assert!(
        fs::read_to_string(&path)
            .unwrap()
            .starts_with("region\tcountry\tdivision\tlocation\n")
    );

    let loaded = LocationHierarchy::load(&path).unwrap();
    assert_eq!(loaded.places(), derived.places());
}

#[test]
fn fills_only_unambiguous_levels() {
    let hierarchy = LocationHierarchy::new(vec![
        Place::new("Europe", "Italy", "Lombardy", "Milan"),
        Place::new("Europe", "Italy", "Veneto", "Venice"),
        Place::new("Oceania", "Australia", "Victoria", ""),
    ]);
    let mut records = vec![
        Record {
            country: "Italy".to_string(),
            division: "Lombardy".to_string(),
            ..Record::default()
        },
        Record {
            country: "Australia".to_string(),
            ..Record::default()
        },
        Record {
            country: "Italy".to_string(),
            ..Record::default()
        },
        Record {
            country: "Peru".to_string(),
            ..Record::default()
        },
    ];
    fill_default_geo(&mut records, &hierarchy);

    assert_eq!(records[0].region, "Europe");
    assert_eq!(records[0].location, "Milan");

    assert_eq!(records[1].region, "Oceania");
    assert_eq!(records[1].division, "Victoria");

    // two candidate divisions: left to the country-level default
    assert_eq!(records[2].region, "Europe");
    assert_eq!(records[2].division, "Italy");
    assert_eq!(records[2].location, "");

    assert_eq!(records[3].region, "");
    assert_eq!(records[3].division, "Peru");
    assert_eq!(records[3].country_exposure, "Peru");
    assert_eq!(records[3].division_exposure, "Peru");
}

#[test]
fn unknown_country_keeps_its_own_defaults() {
    let hierarchy = LocationHierarchy::new(vec![
        Place::new("North America", "USA", "Washington", "King County"),
        Place::new("Europe", "Luxembourg", "Luxembourg", ""),
    ]);
    let mut records = vec![
        Record {
            region: "Europe".to_string(),
            country: "France".to_string(),
            ..Record::default()
        },
        Record {
            region: "North America".to_string(),
            country: "Canada".to_string(),
            ..Record::default()
        },
        Record {
            region: "North America".to_string(),
            country: "USA".to_string(),
            division: "Oregon".to_string(),
            ..Record::default()
        },
    ];
    assert_eq!(fill_default_geo(&mut records, &hierarchy), 0);

    assert_eq!(records[0].division, "France");
    assert_eq!(records[0].location, "");
    assert_eq!(records[1].division, "Canada");
    assert_eq!(records[1].location, "");
    assert_eq!(records[2].division, "Oregon");
    assert_eq!(records[2].location, "");
}
