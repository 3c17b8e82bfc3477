use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

use firds_etl::{DirectoryStore, ObjectStore, PipelineConfig, PipelineContext, S3ObjectStore, TracingLogger};

#[derive(Parser)]
#[command(name = "firds-etl", about = "Download the FIRDS DLTINS file, flatten it to CSV and upload it")]
struct Cli {
    /// TOML file with pipeline settings; flags below override it.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Search endpoint returning the file list as XML.
    #[arg(long)]
    search_url: Option<String>,

    /// Directory for the archive, the unpacked files and the CSV.
    #[arg(long)]
    work_dir: Option<PathBuf>,

    #[arg(long)]
    bucket: Option<String>,

    #[arg(long)]
    key: Option<String>,

    /// Reference-data schema revision, e.g. auth.036.001.02.
    #[arg(long)]
    schema_version: Option<String>,

    /// HTTP timeout in seconds. Unset means wait indefinitely.
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Copy the CSV under this directory instead of uploading to S3.
    #[arg(long)]
    store_dir: Option<PathBuf>,
}

impl Cli {
    fn pipeline_config(&self) -> Result<PipelineConfig> {
        let mut config = match &self.config {
            Some(path) => PipelineConfig::from_toml_file(path)?,
            None => PipelineConfig::default(),
        };

        if let Some(url) = &self.search_url {
            config.search_url = url.clone();
        }
        if let Some(dir) = &self.work_dir {
            config.work_dir = dir.clone();
        }
        if let Some(bucket) = &self.bucket {
            config.bucket = bucket.clone();
        }
        if let Some(key) = &self.key {
            config.key = key.clone();
        }
        if let Some(version) = &self.schema_version {
            config.schema_version = version.clone();
        }
        if self.timeout_secs.is_some() {
            config.http_timeout_secs = self.timeout_secs;
        }
        Ok(config)
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let start_time = Instant::now();
    let cli = Cli::parse();
    let config = cli.pipeline_config()?;

    let store: Box<dyn ObjectStore> = match &cli.store_dir {
        Some(dir) => Box::new(DirectoryStore::new(dir.clone())),
        None => Box::new(S3ObjectStore::from_env()?),
    };

    let logger = TracingLogger;
    let ctx = PipelineContext::new(&config, &logger, store.as_ref())?;
    let summary = firds_etl::run(&ctx)?;

    tracing::info!(
        rows = summary.rows,
        output = %summary.output.display(),
        "Processing completed in: {:?}",
        start_time.elapsed()
    );
    Ok(())
}
