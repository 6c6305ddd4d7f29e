use std::fs;
use std::path::PathBuf;

use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};

use crate::domain::Provider;
use crate::error::IngestError;

pub const DEFAULT_CONFIG_FILE: &str = "ncov-ingest.json";
pub const DEFAULT_LOCATION_HIERARCHY: &str = "source-data/location_hierarchy.tsv";

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub schema_version: Option<u32>,
    #[serde(default)]
    pub location_hierarchy: Option<String>,
    #[serde(default)]
    pub providers: Vec<ProviderEntry>,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(untagged)]
pub enum ProviderEntry {
    Shorthand(String),
    Detailed(ProviderEntryObject),
}

#[derive(Debug, Deserialize, Serialize)]
pub struct ProviderEntryObject {
    pub provider: String,
    #[serde(default)]
    pub input: Option<String>,
    #[serde(default)]
    pub annotations: Option<String>,
    #[serde(default)]
    pub output_dir: Option<String>,
}

/// Every path one provider run reads or writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderPaths {
    pub provider: Provider,
    pub input: Utf8PathBuf,
    pub annotations: Utf8PathBuf,
    pub metadata: Utf8PathBuf,
    pub sequences: Utf8PathBuf,
    /// Auxiliary table for GISAID, problem records for GenBank.
    pub side_table: Utf8PathBuf,
}

impl ProviderPaths {
    pub fn defaults(provider: Provider) -> Self {
        Self::with_output_dir(
            provider,
            Utf8PathBuf::from(format!("data/{provider}.ndjson")),
            Utf8PathBuf::from(format!("source-data/{provider}_annotations.tsv")),
            Utf8PathBuf::from(format!("data/{provider}")),
        )
    }

    pub fn with_output_dir(
        provider: Provider,
        input: Utf8PathBuf,
        annotations: Utf8PathBuf,
        output_dir: Utf8PathBuf,
    ) -> Self {
        Self {
            provider,
            input,
            annotations,
            metadata: output_dir.join("metadata.tsv"),
            sequences: output_dir.join("sequences.fasta"),
            side_table: output_dir.join(provider.side_table_name()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub schema_version: u32,
    pub location_hierarchy: Utf8PathBuf,
    pub providers: Vec<ProviderPaths>,
}

impl ResolvedConfig {
    pub fn provider(&self, provider: Provider) -> ProviderPaths {
        self.providers
            .iter()
            .find(|paths| paths.provider == provider)
            .cloned()
            .unwrap_or_else(|| ProviderPaths::defaults(provider))
    }
}

pub struct ConfigLoader;

impl ConfigLoader {
    /// Loads `path`, or `ncov-ingest.json` when no path is given. A missing
    /// default file yields the built-in defaults.
    pub fn resolve(path: Option<&str>) -> Result<ResolvedConfig, IngestError> {
        let config_path = match path {
            Some(path) => PathBuf::from(path),
            None => PathBuf::from(DEFAULT_CONFIG_FILE),
        };

        if path.is_none() && !config_path.exists() {
            return Self::resolve_config(Config::default());
        }

        let content = fs::read_to_string(&config_path)
            .map_err(|_| IngestError::ConfigRead(config_path.clone()))?;
        let config: Config = serde_json::from_str(&content)
            .map_err(|err| IngestError::ConfigParse(err.to_string()))?;

        Self::resolve_config(config)
    }

    pub fn resolve_config(config: Config) -> Result<ResolvedConfig, IngestError> {
        let schema_version = config.schema_version.unwrap_or(1);
        let location_hierarchy = Utf8PathBuf::from(
            config
                .location_hierarchy
                .unwrap_or_else(|| DEFAULT_LOCATION_HIERARCHY.to_string()),
        );

        let providers = config
            .providers
            .into_iter()
            .map(|entry| match entry {
                ProviderEntry::Shorthand(value) => Ok(ProviderPaths::defaults(value.parse()?)),
                ProviderEntry::Detailed(obj) => {
                    let provider: Provider = obj.provider.parse()?;
                    let defaults = ProviderPaths::defaults(provider);
                    Ok(ProviderPaths::with_output_dir(
                        provider,
                        obj.input.map(Utf8PathBuf::from).unwrap_or(defaults.input),
                        obj.annotations
                            .map(Utf8PathBuf::from)
                            .unwrap_or(defaults.annotations),
                        obj.output_dir
                            .map(Utf8PathBuf::from)
                            .unwrap_or_else(|| Utf8PathBuf::from(format!("data/{provider}"))),
                    ))
                }
            })
            .collect::<Result<Vec<_>, IngestError>>()?;

        Ok(ResolvedConfig {
            schema_version,
            location_hierarchy,
            providers,
        })
    }
}
