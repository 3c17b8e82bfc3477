// Configuration for the FIRDS DLTINS ETL run //

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{Error, Result};

pub const SEARCH_URL: &str = "https://registers.esma.europa.eu/solr/esma_registers_firds_files/select?q=*&fq=publication_date:%5B2021-01-17T00:00:00Z+TO+2021-01-19T23:59:59Z%5D&wt=xml&indent=true&start=0&rows=100";
pub const TARGET_FILE_TYPE: &str = "DLTINS";
pub const ARCHIVE_NAME: &str = "DLTINS.zip";
pub const DOCUMENT_PATTERN: &str = "DLTINS";
pub const DOCUMENT_EXTENSION: &str = ".xml";
pub const OUTPUT_NAME: &str = "steeleye.csv";
pub const OUTPUT_BUCKET: &str = "mybucket";
pub const OUTPUT_KEY: &str = "steeleye.csv";

pub const FIELD_PREFIX: &str = "FinInstrmGnlAttrbts";
pub const FIELDS: [&str; 6] = ["Id", "FullNm", "ClssfctnTp", "NtnlCcy", "CmmdtyDerivInd", "Issr"];
// sits directly under TermntdRcrd, the rest under TermntdRcrd/FinInstrmGnlAttrbts
pub const ISSUER_FIELD: &str = "Issr";

pub const DEFAULT_SCHEMA_VERSION: &str = "auth.036.001.02";

/// Namespace URIs for one revision of the DLTINS reference-data report.
///
/// `head` binds the business application header envelope (`BizData/Pyld`),
/// `auth` binds the report document and every instrument element inside it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchemaVersion {
    pub name: &'static str,
    pub head: &'static str,
    pub auth: &'static str,
}

/// Known report revisions. Adding a revision is a new row here.
pub const SCHEMA_VERSIONS: &[SchemaVersion] = &[SchemaVersion {
    name: "auth.036.001.02",
    head: "urn:iso:std:iso:20022:tech:xsd:head.003.001.01",
    auth: "urn:iso:std:iso:20022:tech:xsd:auth.036.001.02",
}];

pub fn schema_version(name: &str) -> Result<&'static SchemaVersion> {
    SCHEMA_VERSIONS
        .iter()
        .find(|v| v.name == name)
        .ok_or_else(|| Error::Config(format!("unknown schema version {name:?}")))
}

/// Settings for one pipeline run. Every field falls back to the constants above,
/// so a TOML file only needs to name what it changes.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub search_url: String,
    pub work_dir: PathBuf,
    pub file_type: String,
    pub archive_name: String,
    pub document_pattern: String,
    pub document_extension: String,
    pub output_name: String,
    pub bucket: String,
    pub key: String,
    pub schema_version: String,
    /// No timeout unless set; a stalled server blocks the run.
    pub http_timeout_secs: Option<u64>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            search_url: SEARCH_URL.to_string(),
            work_dir: PathBuf::from("."),
            file_type: TARGET_FILE_TYPE.to_string(),
            archive_name: ARCHIVE_NAME.to_string(),
            document_pattern: DOCUMENT_PATTERN.to_string(),
            document_extension: DOCUMENT_EXTENSION.to_string(),
            output_name: OUTPUT_NAME.to_string(),
            bucket: OUTPUT_BUCKET.to_string(),
            key: OUTPUT_KEY.to_string(),
            schema_version: DEFAULT_SCHEMA_VERSION.to_string(),
            http_timeout_secs: None,
        }
    }
}

impl PipelineConfig {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| Error::Config(e.to_string()))
    }

    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    pub fn schema(&self) -> Result<&'static SchemaVersion> {
        schema_version(&self.schema_version)
    }

    pub fn http_timeout(&self) -> Option<Duration> {
        self.http_timeout_secs.map(Duration::from_secs)
    }

    pub fn archive_path(&self) -> PathBuf {
        self.work_dir.join(&self.archive_name)
    }

    pub fn output_path(&self) -> PathBuf {
        self.work_dir.join(&self.output_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_constants() {
        let config = PipelineConfig::default();
        assert_eq!(config.file_type, "DLTINS");
        assert_eq!(config.bucket, "mybucket");
        assert_eq!(config.key, "steeleye.csv");
        assert_eq!(config.http_timeout(), None);
        assert_eq!(config.archive_path(), PathBuf::from("./DLTINS.zip"));
        assert_eq!(config.output_path(), PathBuf::from("./steeleye.csv"));
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = PipelineConfig::from_toml_str(
            r#"
            bucket = "reference-data"
            work_dir = "/tmp/firds"
            http_timeout_secs = 120
            "#,
        )
        .unwrap();

        assert_eq!(config.bucket, "reference-data");
        assert_eq!(config.work_dir, PathBuf::from("/tmp/firds"));
        assert_eq!(config.http_timeout(), Some(Duration::from_secs(120)));
        assert_eq!(config.key, OUTPUT_KEY);
        assert_eq!(config.search_url, SEARCH_URL);
    }

    #[test]
    fn test_bad_toml_is_config_error() {
        let err = PipelineConfig::from_toml_str("bucket = [").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_schema_lookup() {
        let schema = schema_version(DEFAULT_SCHEMA_VERSION).unwrap();
        assert!(schema.head.ends_with("head.003.001.01"));
        assert!(schema.auth.ends_with("auth.036.001.02"));

        let err = schema_version("auth.999.001.01").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
