//! Pulls the ESMA FIRDS `DLTINS` delta file and turns its terminated
//! instrument records into a CSV for upload to object storage.
//!
//! Each stage is a plain function of its inputs; [`pipeline::run`] threads
//! them together through a [`pipeline::PipelineContext`].

pub mod archive;
pub mod aws;
pub mod config;
pub mod csvwriter;
pub mod error;
pub mod fetcher;
pub mod logger;
pub mod models;
pub mod parser;
pub mod pipeline;
pub mod search;

pub use aws::{DirectoryStore, ObjectStore, S3ObjectStore};
pub use config::PipelineConfig;
pub use error::{Error, Result};
pub use logger::{PipelineLogger, TracingLogger};
pub use models::{ExtractedRow, OutputTable};
pub use pipeline::{run, PipelineContext, RunSummary};
