//! Runs the stages in order: fetch the search result, pick the download link,
//! fetch and unpack the archive, flatten the instrument records, write the CSV
//! and upload it. The first failing stage ends the run.

use reqwest::blocking::Client;
use std::fs;
use std::path::{Path, PathBuf};

use crate::archive;
use crate::aws::ObjectStore;
use crate::config::{PipelineConfig, SchemaVersion};
use crate::csvwriter;
use crate::error::{Error, Result};
use crate::fetcher;
use crate::logger::{logged, PipelineLogger};
use crate::models::OutputTable;
use crate::parser;
use crate::search;

/// Everything a run needs, passed explicitly to each stage.
pub struct PipelineContext<'a> {
    pub config: &'a PipelineConfig,
    pub schema: &'static SchemaVersion,
    pub http: Client,
    pub logger: &'a dyn PipelineLogger,
    pub store: &'a dyn ObjectStore,
}

impl<'a> PipelineContext<'a> {
    pub fn new(config: &'a PipelineConfig, logger: &'a dyn PipelineLogger, store: &'a dyn ObjectStore) -> Result<Self> {
        let schema = logged(logger, config.schema())?;
        let http = fetcher::make_http_client(config.http_timeout())?;
        Ok(Self {
            config,
            schema,
            http,
            logger,
            store,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub download_link: String,
    pub document: PathBuf,
    pub rows: usize,
    pub output: PathBuf,
}

pub fn run(ctx: &PipelineContext) -> Result<RunSummary> {
    let config = ctx.config;

    let search_xml = fetcher::fetch_search_result(&ctx.http, ctx.logger, &config.search_url)?;
    let download_link = search::extract_download_link(ctx.logger, &search_xml, &config.file_type)?;

    archive::download_and_extract(
        &ctx.http,
        ctx.logger,
        &download_link,
        &config.archive_path(),
        &config.work_dir,
    )?;

    let document = logged(
        ctx.logger,
        locate_document(&config.work_dir, &config.document_pattern, &config.document_extension),
    )?;
    let rows = logged(ctx.logger, parser::parse_file(&document, ctx.schema))?;
    ctx.logger.info(&format!("Extracted {} instrument records from {}", rows.len(), document.display()));

    let table = OutputTable::from_rows(rows);
    let output = config.output_path();
    let written = csvwriter::write_table(&table, &output)?;
    ctx.logger.info("CSV Formed Successfully");

    ctx.store.upload_file(&output, &config.bucket, &config.key)?;
    ctx.logger.info(&format!("Uploaded {} to {}/{}", output.display(), config.bucket, config.key));

    Ok(RunSummary {
        download_link,
        document,
        rows: written,
        output,
    })
}

/// First file in directory-listing order whose name contains `pattern` and
/// ends with `extension`. Listing order is whatever the filesystem returns, so
/// several candidates make the pick arbitrary.
pub fn locate_document(dir: &Path, pattern: &str, extension: &str) -> Result<PathBuf> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if name.ends_with(extension) && name.contains(pattern) && entry.file_type()?.is_file() {
            return Ok(entry.path());
        }
    }

    Err(Error::DocumentNotFound {
        dir: dir.to_path_buf(),
        pattern: pattern.to_string(),
        extension: extension.to_string(),
    })
}
