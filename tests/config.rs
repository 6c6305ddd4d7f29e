use std::fs;

use assert_matches::assert_matches;
use camino::Utf8PathBuf;

use ncov_ingest::config::{Config, ConfigLoader, ProviderEntry, ProviderPaths};
use ncov_ingest::domain::Provider;
use ncov_ingest::error::IngestError;

#[test]
fn resolves_shorthand_and_detailed_entries() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ncov-ingest.json");
    fs::write(
        &path,
        r#"{
            "schema_version": 1,
            "location_hierarchy": "reference/hierarchy.tsv",
            "providers": [
                "gisaid",
                {
                    "provider": "GenBank",
                    "input": "dumps/genbank.ndjson.gz",
                    "output_dir": "results/genbank"
                }
            ]
        }"#,
    )
    .unwrap();

    let resolved = ConfigLoader::resolve(path.to_str()).unwrap();
    assert_eq!(resolved.schema_version, 1);
    assert_eq!(
        resolved.location_hierarchy,
        Utf8PathBuf::from("reference/hierarchy.tsv")
    );
    assert_eq!(resolved.providers.len(), 2);
    assert_eq!(
        resolved.provider(Provider::Gisaid),
        ProviderPaths::defaults(Provider::Gisaid)
    );

    let genbank = resolved.provider(Provider::Genbank);
    assert_eq!(genbank.input, Utf8PathBuf::from("dumps/genbank.ndjson.gz"));
    assert_eq!(
        genbank.annotations,
        Utf8PathBuf::from("source-data/genbank_annotations.tsv")
    );
    assert_eq!(
        genbank.metadata,
        Utf8PathBuf::from("results/genbank/metadata.tsv")
    );
    assert_eq!(
        genbank.side_table,
        Utf8PathBuf::from("results/genbank/problem_data.tsv")
    );
}

#[test]
fn unconfigured_provider_uses_defaults() {
    let resolved = ConfigLoader::resolve_config(Config::default()).unwrap();
    let gisaid = resolved.provider(Provider::Gisaid);
    assert_eq!(gisaid.input, Utf8PathBuf::from("data/gisaid.ndjson"));
    assert_eq!(
        gisaid.sequences,
        Utf8PathBuf::from("data/gisaid/sequences.fasta")
    );
    assert_eq!(
        gisaid.side_table,
        Utf8PathBuf::from("data/gisaid/additional_info.tsv")
    );
}

#[test]
fn rejects_unknown_provider() {
    let config = Config {
        providers: vec![ProviderEntry::Shorthand("ena".to_string())],
        ..Config::default()
    };
    let err = ConfigLoader::resolve_config(config).unwrap_err();
    assert_matches!(err, IngestError::InvalidProvider(name) if name == "ena");
}

#[test]
fn explicit_config_must_exist() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing.json");
    let err = ConfigLoader::resolve(path.to_str()).unwrap_err();
    assert_matches!(err, IngestError::ConfigRead(_));
}

#[test]
fn invalid_json_is_a_parse_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ncov-ingest.json");
    fs::write(&path, "{ \"providers\": [").unwrap();
    let err = ConfigLoader::resolve(path.to_str()).unwrap_err();
    assert_matches!(err, IngestError::ConfigParse(_));
}
